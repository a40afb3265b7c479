//! Group trip REST endpoints
//!
//! Seat bookings debit trip capacity at creation time and credit it
//! back on cancellation, both inside the engine's transaction. Trip
//! lifecycle changes are manager territory.

use axum::{
    Extension, Json, Router,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{patch, post},
};
use chrono::{DateTime, Utc};
use dockline_core::models::{Actor, GroupTrip, GroupTripBooking, TripBookingStatus, TripStatus};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::engine::StatusEngine;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::routes::bookings::UpdateStatusRequest;

/// Create group trip booking request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTripBookingRequest {
    pub group_trip_id: Uuid,
    /// Adult seats, charged at full price
    #[schema(example = 2)]
    pub adult_count: i32,
    /// Child seats
    #[schema(example = 1)]
    pub child_count: i32,
    /// Contact name for guest checkout
    pub guest_name: Option<String>,
    /// Contact phone for guest checkout
    pub guest_phone: Option<String>,
}

/// Group trip booking response
#[derive(Debug, Serialize, ToSchema)]
pub struct TripBookingResponse {
    pub id: Uuid,
    pub group_trip_id: Uuid,
    pub user_id: Option<Uuid>,
    pub adult_count: i32,
    pub child_count: i32,
    pub status: TripBookingStatus,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupTripBooking> for TripBookingResponse {
    fn from(booking: GroupTripBooking) -> Self {
        Self {
            id: booking.id,
            group_trip_id: booking.group_trip_id,
            user_id: booking.user_id,
            adult_count: booking.adult_count,
            child_count: booking.child_count,
            status: booking.status,
            guest_name: booking.guest_name,
            guest_phone: booking.guest_phone,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// Group trip response
#[derive(Debug, Serialize, ToSchema)]
pub struct TripResponse {
    pub id: Uuid,
    pub boat_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub available_seats: i32,
    pub price_per_seat: i64,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupTrip> for TripResponse {
    fn from(trip: GroupTrip) -> Self {
        Self {
            id: trip.id,
            boat_id: trip.boat_id,
            start_time: trip.start_time,
            end_time: trip.end_time,
            available_seats: trip.available_seats,
            price_per_seat: trip.price_per_seat,
            status: trip.status,
            created_at: trip.created_at,
            updated_at: trip.updated_at,
        }
    }
}

/// Book seats on a group trip
#[utoipa::path(
    post,
    path = "/group-trip-bookings",
    request_body = CreateTripBookingRequest,
    responses(
        (status = 201, description = "Seats booked and confirmed", body = Envelope<TripBookingResponse>),
        (status = 400, description = "Invalid party composition"),
        (status = 404, description = "Trip not found"),
        (status = 409, description = "Not enough seats, or the trip is not open for booking")
    ),
    tag = "trips"
)]
async fn create_trip_booking(
    State(pool): State<PgPool>,
    Json(req): Json<CreateTripBookingRequest>,
) -> Result<Response, ApiError> {
    let booking = StatusEngine::new(pool)
        .create_trip_booking(
            req.group_trip_id,
            None,
            req.adult_count,
            req.child_count,
            req.guest_name,
            req.guest_phone,
        )
        .await?;

    let response = TripBookingResponse::from(booking);
    Ok((StatusCode::CREATED, Json(Envelope::ok(response))).into_response())
}

/// Update group trip booking status
#[utoipa::path(
    patch,
    path = "/group-trip-bookings/{id}/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated, or already held", body = Envelope<TripBookingResponse>),
        (status = 400, description = "Unknown status value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not manage this booking"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    params(
        ("id" = Uuid, Path, description = "Group trip booking ID")
    ),
    tag = "trips",
    security(
        ("bearer_auth" = [])
    )
)]
async fn update_trip_booking_status(
    State(pool): State<PgPool>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Envelope<TripBookingResponse>>, ApiError> {
    let requested: TripBookingStatus = req.status.parse()?;

    let outcome = StatusEngine::new(pool)
        .transition_trip_booking(booking_id, requested, &actor)
        .await?;

    let response = TripBookingResponse::from(outcome.record);
    Ok(Json(Envelope::transition(response, outcome.changed)))
}

/// Update group trip status
#[utoipa::path(
    patch,
    path = "/group-trips/{id}/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated, or already held", body = Envelope<TripResponse>),
        (status = 400, description = "Unknown status value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not manage this trip's boat"),
        (status = 404, description = "Trip not found"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    params(
        ("id" = Uuid, Path, description = "Group trip ID")
    ),
    tag = "trips",
    security(
        ("bearer_auth" = [])
    )
)]
async fn update_trip_status(
    State(pool): State<PgPool>,
    Extension(actor): Extension<Actor>,
    Path(trip_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Envelope<TripResponse>>, ApiError> {
    let requested: TripStatus = req.status.parse()?;

    let outcome = StatusEngine::new(pool)
        .transition_trip(trip_id, requested, &actor)
        .await?;

    let response = TripResponse::from(outcome.record);
    Ok(Json(Envelope::transition(response, outcome.changed)))
}

/// Public trip booking creation routes
pub fn public_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    PgPool: FromRef<S>,
{
    Router::new().route("/group-trip-bookings", post(create_trip_booking))
}

/// Authenticated trip management routes
pub fn protected_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    PgPool: FromRef<S>,
{
    Router::new()
        .route(
            "/group-trip-bookings/{id}/status",
            patch(update_trip_booking_status),
        )
        .route("/group-trips/{id}/status", patch(update_trip_status))
}
