//! Individual booking REST endpoints
//!
//! Creation is public (guest checkout), status management requires a
//! bearer token. The deep-link endpoint accepts the action vocabulary
//! used by Telegram inline buttons so one link format serves both
//! booking kinds.

use axum::{
    Extension, Json, Router,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use dockline_core::callback::{BookingAction, BookingKind};
use dockline_core::models::{Actor, Booking, BookingStatus};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::engine::StatusEngine;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::routes::trips::TripBookingResponse;

/// Create booking request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub boat_id: Uuid,
    /// Charter window start
    pub start_time: DateTime<Utc>,
    /// Charter window end, must be after the start
    pub end_time: DateTime<Utc>,
    /// Total price in minor currency units
    #[schema(example = 25000)]
    pub price: i64,
    /// Contact name for guest checkout
    #[schema(example = "Jordan Lee")]
    pub guest_name: Option<String>,
    /// Contact phone for guest checkout
    pub guest_phone: Option<String>,
}

/// Status update request shared by all booking endpoints
///
/// The status arrives as a plain string and is parsed against the
/// target vocabulary, so an unknown value is a 400 rather than a
/// deserialization failure.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "confirmed")]
    pub status: String,
}

/// Deep link query carried by Telegram notification links
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct TelegramActionQuery {
    /// One of confirm, cancel, complete
    pub action: String,
    /// One of regular, group_trip
    #[serde(rename = "type")]
    pub kind: String,
}

/// Booking response
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    pub id: Uuid,
    pub boat_id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: BookingStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: i64,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            boat_id: booking.boat_id,
            user_id: booking.user_id,
            status: booking.status,
            start_time: booking.start_time,
            end_time: booking.end_time,
            price: booking.price,
            guest_name: booking.guest_name,
            guest_phone: booking.guest_phone,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// Create a new booking
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created in pending status", body = Envelope<BookingResponse>),
        (status = 400, description = "Invalid booking data"),
        (status = 404, description = "Boat not found")
    ),
    tag = "bookings"
)]
async fn create_booking(
    State(pool): State<PgPool>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Response, ApiError> {
    let booking = StatusEngine::new(pool)
        .create_booking(
            req.boat_id,
            None,
            req.start_time,
            req.end_time,
            req.price,
            req.guest_name,
            req.guest_phone,
        )
        .await?;

    let response = BookingResponse::from(booking);
    Ok((StatusCode::CREATED, Json(Envelope::ok(response))).into_response())
}

/// Update booking status
#[utoipa::path(
    patch,
    path = "/bookings/{id}/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated, or already held", body = Envelope<BookingResponse>),
        (status = 400, description = "Unknown status value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not manage this booking"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    tag = "bookings",
    security(
        ("bearer_auth" = [])
    )
)]
async fn update_booking_status(
    State(pool): State<PgPool>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Envelope<BookingResponse>>, ApiError> {
    let requested: BookingStatus = req.status.parse()?;

    let outcome = StatusEngine::new(pool)
        .transition_booking(booking_id, requested, &actor)
        .await?;

    let response = BookingResponse::from(outcome.record);
    Ok(Json(Envelope::transition(response, outcome.changed)))
}

/// Apply a Telegram deep link action to a booking
#[utoipa::path(
    get,
    path = "/bookings/{id}/telegram-action",
    params(
        ("id" = Uuid, Path, description = "Booking ID"),
        TelegramActionQuery
    ),
    responses(
        (status = 200, description = "Action applied, or already in effect"),
        (status = 400, description = "Unknown action or booking kind"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not manage this booking"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    tag = "bookings",
    security(
        ("bearer_auth" = [])
    )
)]
async fn telegram_action(
    State(pool): State<PgPool>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
    Query(query): Query<TelegramActionQuery>,
) -> Result<Response, ApiError> {
    let action: BookingAction = query.action.parse()?;
    let kind: BookingKind = query.kind.parse()?;
    let engine = StatusEngine::new(pool);

    match kind {
        BookingKind::Regular => {
            let requested = action.booking_target().ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Action {action} does not apply to individual bookings"
                ))
            })?;
            let outcome = engine
                .transition_booking(booking_id, requested, &actor)
                .await?;
            let response = BookingResponse::from(outcome.record);
            Ok(Json(Envelope::transition(response, outcome.changed)).into_response())
        }
        BookingKind::GroupTrip => {
            let requested = action.trip_booking_target().ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Action {action} does not apply to group trip bookings"
                ))
            })?;
            let outcome = engine
                .transition_trip_booking(booking_id, requested, &actor)
                .await?;
            let response = TripBookingResponse::from(outcome.record);
            Ok(Json(Envelope::transition(response, outcome.changed)).into_response())
        }
    }
}

/// Public booking creation routes
pub fn public_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    PgPool: FromRef<S>,
{
    Router::new().route("/bookings", post(create_booking))
}

/// Authenticated booking management routes
pub fn protected_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    PgPool: FromRef<S>,
{
    Router::new()
        .route("/bookings/{id}/status", patch(update_booking_status))
        .route("/bookings/{id}/telegram-action", get(telegram_action))
}
