//! Booking repository for database operations

use crate::error::ApiError;
use chrono::{DateTime, Utc};
use dockline_core::models::{Booking, BookingStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Get booking by ID
pub async fn get_booking(pool: &PgPool, booking_id: Uuid) -> Result<Booking, ApiError> {
    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
        .bind(booking_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking not found: {}", booking_id)))?;

    Ok(booking)
}

/// Get booking by ID inside a transaction
pub async fn get_booking_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
) -> Result<Booking, ApiError> {
    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking not found: {}", booking_id)))?;

    Ok(booking)
}

/// Insert a new booking in `pending` status
#[allow(clippy::too_many_arguments)]
pub async fn insert_booking_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    boat_id: Uuid,
    user_id: Option<Uuid>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    price: i64,
    guest_name: Option<String>,
    guest_phone: Option<String>,
) -> Result<Booking, ApiError> {
    // Validate time range
    if end_time <= start_time {
        return Err(ApiError::BadRequest(
            "Booking end time must be after start time".to_string(),
        ));
    }

    if price < 0 {
        return Err(ApiError::BadRequest(
            "Booking price must not be negative".to_string(),
        ));
    }

    // Guest bookings carry their own contact details
    if user_id.is_none() && (guest_name.is_none() || guest_phone.is_none()) {
        return Err(ApiError::BadRequest(
            "Guest bookings require guest_name and guest_phone".to_string(),
        ));
    }

    let booking = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings (
            boat_id, user_id, status, start_time, end_time, price,
            guest_name, guest_phone
        )
        VALUES ($1, $2, 'pending'::booking_status, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(boat_id)
    .bind(user_id)
    .bind(start_time)
    .bind(end_time)
    .bind(price)
    .bind(&guest_name)
    .bind(&guest_phone)
    .fetch_one(&mut **tx)
    .await?;

    Ok(booking)
}

/// Conditionally move a booking from `expected` to `new_status`
///
/// The status predicate makes concurrent conflicting transitions pick
/// exactly one winner. `None` means the row exists but its status no
/// longer matches, so the caller lost the race.
pub async fn transition_booking_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
    expected: BookingStatus,
    new_status: BookingStatus,
) -> Result<Option<Booking>, ApiError> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        UPDATE bookings
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
