//! Database repository modules

pub mod boats;
pub mod bookings;
pub mod outbox;
pub mod profiles;
pub mod trips;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use chrono::{Duration, Utc};
    use dockline_core::models::{BookingStatus, TripStatus};
    use sqlx::PgPool;
    use uuid::Uuid;

    async fn setup_boat(pool: &PgPool) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO boats (name, capacity, price_per_hour) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind("Test Boat")
        .bind(8)
        .bind(120_00i64)
        .fetch_one(pool)
        .await
        .expect("Failed to create boat")
    }

    async fn setup_trip(pool: &PgPool, boat_id: Uuid, seats: i32) -> Uuid {
        let start = Utc::now() + Duration::days(3);
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO group_trips (boat_id, start_time, end_time, available_seats, price_per_seat)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(boat_id)
        .bind(start)
        .bind(start + Duration::hours(3))
        .bind(seats)
        .bind(45_00i64)
        .fetch_one(pool)
        .await
        .expect("Failed to create trip")
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_seat_arithmetic_flow(pool: PgPool) {
        let boat_id = setup_boat(&pool).await;
        let trip_id = setup_trip(&pool, boat_id, 3).await;

        // Debit below capacity keeps the trip bookable
        let mut tx = pool.begin().await.expect("begin");
        let trip = trips::debit_seats_tx(&mut tx, trip_id, 2)
            .await
            .expect("debit 2");
        tx.commit().await.expect("commit");
        assert_eq!(trip.available_seats, 1);
        assert_eq!(trip.status, TripStatus::Scheduled);

        // Taking the last seat flips the trip to full
        let mut tx = pool.begin().await.expect("begin");
        let trip = trips::debit_seats_tx(&mut tx, trip_id, 1)
            .await
            .expect("debit last seat");
        tx.commit().await.expect("commit");
        assert_eq!(trip.available_seats, 0);
        assert_eq!(trip.status, TripStatus::Full);

        // Over-debit is rejected and the row is untouched
        let mut tx = pool.begin().await.expect("begin");
        let err = trips::debit_seats_tx(&mut tx, trip_id, 1)
            .await
            .expect_err("over-debit must fail");
        tx.rollback().await.expect("rollback");
        assert!(matches!(err, ApiError::Conflict(_)));

        let trip = trips::get_trip(&pool, trip_id).await.expect("reread");
        assert_eq!(trip.available_seats, 0);
        assert_eq!(trip.status, TripStatus::Full);

        // Credit restores seats and the scheduled status
        let mut tx = pool.begin().await.expect("begin");
        let trip = trips::credit_seats_tx(&mut tx, trip_id, 2)
            .await
            .expect("credit 2");
        tx.commit().await.expect("commit");
        assert_eq!(trip.available_seats, 2);
        assert_eq!(trip.status, TripStatus::Scheduled);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_guarded_booking_transition(pool: PgPool) {
        let boat_id = setup_boat(&pool).await;

        let start = Utc::now() + Duration::days(2);
        let mut tx = pool.begin().await.expect("begin");
        let booking = bookings::insert_booking_tx(
            &mut tx,
            boat_id,
            None,
            start,
            start + Duration::hours(4),
            200_00,
            Some("Guest".to_string()),
            Some("+100000".to_string()),
        )
        .await
        .expect("insert booking");
        tx.commit().await.expect("commit");
        assert_eq!(booking.status, BookingStatus::Pending);

        // First conditional update wins
        let mut tx = pool.begin().await.expect("begin");
        let won = bookings::transition_booking_tx(
            &mut tx,
            booking.id,
            BookingStatus::Pending,
            BookingStatus::Confirmed,
        )
        .await
        .expect("transition");
        tx.commit().await.expect("commit");
        assert_eq!(won.expect("winner").status, BookingStatus::Confirmed);

        // Second update against the stale expected status matches nothing
        let mut tx = pool.begin().await.expect("begin");
        let lost = bookings::transition_booking_tx(
            &mut tx,
            booking.id,
            BookingStatus::Pending,
            BookingStatus::Cancelled,
        )
        .await
        .expect("transition");
        tx.rollback().await.expect("rollback");
        assert!(lost.is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_guest_booking_requires_contact(pool: PgPool) {
        let boat_id = setup_boat(&pool).await;
        let start = Utc::now() + Duration::days(1);

        let mut tx = pool.begin().await.expect("begin");
        let err = bookings::insert_booking_tx(
            &mut tx,
            boat_id,
            None,
            start,
            start + Duration::hours(2),
            90_00,
            None,
            None,
        )
        .await
        .expect_err("guest booking without contact must fail");
        tx.rollback().await.expect("rollback");

        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
