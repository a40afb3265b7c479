//! Group trip and trip booking repository for database operations
//!
//! Seat arithmetic lives here as single atomic UPDATEs. Application code
//! never reads a seat count and writes it back.

use crate::error::ApiError;
use dockline_core::CharterError;
use dockline_core::models::{GroupTrip, GroupTripBooking, TripBookingStatus, TripStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Get group trip by ID
pub async fn get_trip(pool: &PgPool, trip_id: Uuid) -> Result<GroupTrip, ApiError> {
    let trip = sqlx::query_as::<_, GroupTrip>("SELECT * FROM group_trips WHERE id = $1")
        .bind(trip_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Group trip not found: {}", trip_id)))?;

    Ok(trip)
}

/// Get group trip by ID inside a transaction
pub async fn get_trip_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    trip_id: Uuid,
) -> Result<GroupTrip, ApiError> {
    let trip = sqlx::query_as::<_, GroupTrip>("SELECT * FROM group_trips WHERE id = $1")
        .bind(trip_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Group trip not found: {}", trip_id)))?;

    Ok(trip)
}

/// Get trip booking by ID
pub async fn get_trip_booking(
    pool: &PgPool,
    booking_id: Uuid,
) -> Result<GroupTripBooking, ApiError> {
    let booking =
        sqlx::query_as::<_, GroupTripBooking>("SELECT * FROM group_trip_bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Trip booking not found: {}", booking_id))
            })?;

    Ok(booking)
}

/// Get trip booking by ID inside a transaction
pub async fn get_trip_booking_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
) -> Result<GroupTripBooking, ApiError> {
    let booking =
        sqlx::query_as::<_, GroupTripBooking>("SELECT * FROM group_trip_bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Trip booking not found: {}", booking_id))
            })?;

    Ok(booking)
}

/// Insert a new trip booking in `confirmed` status
///
/// Seats must already be debited via [`debit_seats_tx`] in the same
/// transaction.
pub async fn insert_trip_booking_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    trip_id: Uuid,
    user_id: Option<Uuid>,
    adult_count: i32,
    child_count: i32,
    guest_name: Option<String>,
    guest_phone: Option<String>,
) -> Result<GroupTripBooking, ApiError> {
    if adult_count < 0 || child_count < 0 {
        return Err(ApiError::BadRequest(
            "Party counts must not be negative".to_string(),
        ));
    }

    if adult_count + child_count == 0 {
        return Err(ApiError::BadRequest(
            "Trip bookings require at least one participant".to_string(),
        ));
    }

    // Guest bookings carry their own contact details
    if user_id.is_none() && (guest_name.is_none() || guest_phone.is_none()) {
        return Err(ApiError::BadRequest(
            "Guest bookings require guest_name and guest_phone".to_string(),
        ));
    }

    let booking = sqlx::query_as::<_, GroupTripBooking>(
        r#"
        INSERT INTO group_trip_bookings (
            group_trip_id, user_id, adult_count, child_count, status,
            guest_name, guest_phone
        )
        VALUES ($1, $2, $3, $4, 'confirmed'::trip_booking_status, $5, $6)
        RETURNING *
        "#,
    )
    .bind(trip_id)
    .bind(user_id)
    .bind(adult_count)
    .bind(child_count)
    .bind(&guest_name)
    .bind(&guest_phone)
    .fetch_one(&mut **tx)
    .await?;

    Ok(booking)
}

/// Atomically take `seats` from a trip, flipping it to `full` when the
/// last seat goes
///
/// Only `scheduled` trips with enough seats match; anything else leaves
/// the row untouched and is classified from a fresh read.
pub async fn debit_seats_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    trip_id: Uuid,
    seats: i32,
) -> Result<GroupTrip, ApiError> {
    let updated = sqlx::query_as::<_, GroupTrip>(
        r#"
        UPDATE group_trips
        SET available_seats = available_seats - $2,
            status = CASE
                WHEN available_seats - $2 = 0 THEN 'full'::trip_status
                ELSE 'scheduled'::trip_status
            END,
            updated_at = NOW()
        WHERE id = $1
          AND status = 'scheduled'::trip_status
          AND available_seats >= $2
        RETURNING *
        "#,
    )
    .bind(trip_id)
    .bind(seats)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(trip) = updated {
        return Ok(trip);
    }

    let trip = sqlx::query_as::<_, GroupTrip>("SELECT * FROM group_trips WHERE id = $1")
        .bind(trip_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(CharterError::TripNotFound(trip_id))?;

    match trip.status {
        TripStatus::Scheduled | TripStatus::Full => Err(CharterError::NotEnoughSeats {
            requested: seats,
            available: trip.available_seats,
        }
        .into()),
        other => Err(ApiError::Conflict(format!("Trip is {}", other))),
    }
}

/// Atomically return `seats` to a trip
///
/// A `full` trip becomes bookable again; in-progress and finished trips
/// keep their status, only the seat count moves.
pub async fn credit_seats_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    trip_id: Uuid,
    seats: i32,
) -> Result<GroupTrip, ApiError> {
    let trip = sqlx::query_as::<_, GroupTrip>(
        r#"
        UPDATE group_trips
        SET available_seats = available_seats + $2,
            status = CASE
                WHEN status = 'full'::trip_status THEN 'scheduled'::trip_status
                ELSE status
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(trip_id)
    .bind(seats)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(CharterError::TripNotFound(trip_id))?;

    Ok(trip)
}

/// Conditionally move a trip booking from `expected` to `new_status`
pub async fn transition_trip_booking_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
    expected: TripBookingStatus,
    new_status: TripBookingStatus,
) -> Result<Option<GroupTripBooking>, ApiError> {
    let booking = sqlx::query_as::<_, GroupTripBooking>(
        r#"
        UPDATE group_trip_bookings
        SET status = $3, updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING *
        "#,
    )
    .bind(booking_id)
    .bind(expected)
    .bind(new_status)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(booking)
}

/// Conditionally move a trip from `expected` to `new_status`
pub async fn transition_trip_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    trip_id: Uuid,
    expected: TripStatus,
    new_status: TripStatus,
) -> Result<Option<GroupTrip>, ApiError> {
    let trip = sqlx::query_as::<_, GroupTrip>(
        r#"
        UPDATE group_trips
        SET status = $3, updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING *
        "#,
    )
    .bind(trip_id)
    .bind(expected)
    .bind(new_status)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(trip)
}
