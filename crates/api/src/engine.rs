//! Booking status engine
//!
//! The transactional core every ingress adapter funnels into. One call,
//! one transaction: load, authorize, check legality, guarded update,
//! seat arithmetic where cancellation frees seats, outbox insert, commit.
//! The engine keeps no state between calls; the database is the only
//! source of truth.

use sqlx::PgPool;
use uuid::Uuid;

use dockline_core::CharterError;
use dockline_core::format::{BookingDigest, TripBookingDigest, TripDigest};
use dockline_core::models::{
    Actor, Booking, BookingStatus, GroupTrip, GroupTripBooking, TripBookingStatus, TripStatus,
    message_types,
};
use dockline_core::status;

use crate::db::{boats, bookings, outbox, profiles, trips};
use crate::error::ApiError;

/// Result of a transition request
///
/// `changed: false` means the record already carried the requested
/// status. That is a success, not an error: nothing was written and no
/// notification job was enqueued.
///
/// The digest snapshots the record as of this call. On a real change it
/// is the exact payload enqueued for the notifier; on a no-op it has no
/// previous status and no changed-by attribution, so adapters can still
/// render the record's current card.
#[derive(Debug)]
pub struct TransitionOutcome<T, D> {
    pub record: T,
    pub changed: bool,
    pub digest: D,
}

/// Transactional orchestration layer over the booking state machines
#[derive(Clone)]
pub struct StatusEngine {
    pool: PgPool,
}

impl StatusEngine {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a single-slot booking in `pending` status and enqueue the
    /// manager-facing request notification
    #[allow(clippy::too_many_arguments)]
    pub async fn create_booking(
        &self,
        boat_id: Uuid,
        user_id: Option<Uuid>,
        start_time: chrono::DateTime<chrono::Utc>,
        end_time: chrono::DateTime<chrono::Utc>,
        price: i64,
        guest_name: Option<String>,
        guest_phone: Option<String>,
    ) -> Result<Booking, ApiError> {
        let mut tx = self.pool.begin().await?;

        let boat = boats::get_boat_tx(&mut tx, boat_id).await?;
        let booking = bookings::insert_booking_tx(
            &mut tx, boat_id, user_id, start_time, end_time, price, guest_name, guest_phone,
        )
        .await?;

        let (client_name, client_phone) = resolve_client_tx(
            &mut tx,
            booking.user_id,
            booking.guest_name.as_deref(),
            booking.guest_phone.as_deref(),
        )
        .await?;

        let digest = BookingDigest {
            booking_id: booking.id,
            boat_id: boat.id,
            boat_name: boat.name,
            user_id: booking.user_id,
            status: booking.status,
            previous_status: None,
            start_time: booking.start_time,
            end_time: booking.end_time,
            price: booking.price,
            client_name,
            client_phone,
            changed_by: None,
        };
        enqueue_digest_tx(&mut tx, message_types::BOOKING_CREATED, &digest).await?;

        tx.commit().await?;

        tracing::info!(booking_id = %booking.id, boat_id = %boat_id, "booking created");
        Ok(booking)
    }

    /// Create a group trip booking, debiting seats atomically
    ///
    /// The booking is `confirmed` immediately; there is no pending phase
    /// for group trips. A failed seat debit rolls the insert back.
    pub async fn create_trip_booking(
        &self,
        trip_id: Uuid,
        user_id: Option<Uuid>,
        adult_count: i32,
        child_count: i32,
        guest_name: Option<String>,
        guest_phone: Option<String>,
    ) -> Result<GroupTripBooking, ApiError> {
        let mut tx = self.pool.begin().await?;

        let trip = trips::get_trip_tx(&mut tx, trip_id).await?;
        let boat = boats::get_boat_tx(&mut tx, trip.boat_id).await?;

        let booking = trips::insert_trip_booking_tx(
            &mut tx, trip_id, user_id, adult_count, child_count, guest_name, guest_phone,
        )
        .await?;
        trips::debit_seats_tx(&mut tx, trip_id, booking.seat_count()).await?;

        let (client_name, client_phone) = resolve_client_tx(
            &mut tx,
            booking.user_id,
            booking.guest_name.as_deref(),
            booking.guest_phone.as_deref(),
        )
        .await?;

        let digest = TripBookingDigest {
            booking_id: booking.id,
            trip_id,
            boat_id: boat.id,
            boat_name: boat.name,
            user_id: booking.user_id,
            status: booking.status,
            previous_status: None,
            start_time: trip.start_time,
            end_time: trip.end_time,
            adult_count: booking.adult_count,
            child_count: booking.child_count,
            price_per_seat: trip.price_per_seat,
            client_name,
            client_phone,
            changed_by: None,
        };
        enqueue_digest_tx(&mut tx, message_types::TRIP_BOOKING_CREATED, &digest).await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            trip_id = %trip_id,
            seats = booking.seat_count(),
            "trip booking created"
        );
        Ok(booking)
    }

    /// Move a single-slot booking to `requested` on behalf of `actor`
    pub async fn transition_booking(
        &self,
        booking_id: Uuid,
        requested: BookingStatus,
        actor: &Actor,
    ) -> Result<TransitionOutcome<Booking, BookingDigest>, ApiError> {
        let mut tx = self.pool.begin().await?;

        let booking = bookings::get_booking_tx(&mut tx, booking_id).await?;
        let boat = boats::get_boat_tx(&mut tx, booking.boat_id).await?;
        authorize_tx(&mut tx, actor, boat.id, booking.user_id).await?;

        let (client_name, client_phone) = resolve_client_tx(
            &mut tx,
            booking.user_id,
            booking.guest_name.as_deref(),
            booking.guest_phone.as_deref(),
        )
        .await?;

        if booking.status == requested {
            tx.rollback().await?;
            tracing::info!(booking_id = %booking_id, status = %requested, "booking already in requested status");
            let digest = BookingDigest {
                booking_id: booking.id,
                boat_id: boat.id,
                boat_name: boat.name,
                user_id: booking.user_id,
                status: booking.status,
                previous_status: None,
                start_time: booking.start_time,
                end_time: booking.end_time,
                price: booking.price,
                client_name,
                client_phone,
                changed_by: None,
            };
            return Ok(TransitionOutcome {
                record: booking,
                changed: false,
                digest,
            });
        }

        if !status::booking_transition_allowed(booking.status, requested) {
            return Err(CharterError::IllegalTransition {
                from: booking.status.to_string(),
                to: requested.to_string(),
            }
            .into());
        }

        let updated = bookings::transition_booking_tx(&mut tx, booking_id, booking.status, requested)
            .await?
            .ok_or(CharterError::ConcurrentUpdate {
                expected: booking.status.to_string(),
            })?;

        let digest = BookingDigest {
            booking_id: updated.id,
            boat_id: boat.id,
            boat_name: boat.name,
            user_id: updated.user_id,
            status: updated.status,
            previous_status: Some(booking.status),
            start_time: updated.start_time,
            end_time: updated.end_time,
            price: updated.price,
            client_name,
            client_phone,
            changed_by: Some(actor.display_name.clone()),
        };
        enqueue_digest_tx(&mut tx, message_types::BOOKING_STATUS, &digest).await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking_id,
            from = %booking.status,
            to = %requested,
            actor = %actor.profile_id,
            "booking status changed"
        );
        Ok(TransitionOutcome {
            record: updated,
            changed: true,
            digest,
        })
    }

    /// Move a group trip booking to `requested` on behalf of `actor`
    ///
    /// Cancellation credits the party's seats back to the parent trip in
    /// the same transaction.
    pub async fn transition_trip_booking(
        &self,
        booking_id: Uuid,
        requested: TripBookingStatus,
        actor: &Actor,
    ) -> Result<TransitionOutcome<GroupTripBooking, TripBookingDigest>, ApiError> {
        let mut tx = self.pool.begin().await?;

        let booking = trips::get_trip_booking_tx(&mut tx, booking_id).await?;
        let trip = trips::get_trip_tx(&mut tx, booking.group_trip_id).await?;
        let boat = boats::get_boat_tx(&mut tx, trip.boat_id).await?;
        authorize_tx(&mut tx, actor, boat.id, booking.user_id).await?;

        let (client_name, client_phone) = resolve_client_tx(
            &mut tx,
            booking.user_id,
            booking.guest_name.as_deref(),
            booking.guest_phone.as_deref(),
        )
        .await?;

        if booking.status == requested {
            tx.rollback().await?;
            tracing::info!(booking_id = %booking_id, status = %requested, "trip booking already in requested status");
            let digest = TripBookingDigest {
                booking_id: booking.id,
                trip_id: trip.id,
                boat_id: boat.id,
                boat_name: boat.name,
                user_id: booking.user_id,
                status: booking.status,
                previous_status: None,
                start_time: trip.start_time,
                end_time: trip.end_time,
                adult_count: booking.adult_count,
                child_count: booking.child_count,
                price_per_seat: trip.price_per_seat,
                client_name,
                client_phone,
                changed_by: None,
            };
            return Ok(TransitionOutcome {
                record: booking,
                changed: false,
                digest,
            });
        }

        if !status::trip_booking_transition_allowed(booking.status, requested) {
            return Err(CharterError::IllegalTransition {
                from: booking.status.to_string(),
                to: requested.to_string(),
            }
            .into());
        }

        let updated =
            trips::transition_trip_booking_tx(&mut tx, booking_id, booking.status, requested)
                .await?
                .ok_or(CharterError::ConcurrentUpdate {
                    expected: booking.status.to_string(),
                })?;

        if requested == TripBookingStatus::Cancelled {
            trips::credit_seats_tx(&mut tx, trip.id, updated.seat_count()).await?;
        }

        let digest = TripBookingDigest {
            booking_id: updated.id,
            trip_id: trip.id,
            boat_id: boat.id,
            boat_name: boat.name,
            user_id: updated.user_id,
            status: updated.status,
            previous_status: Some(booking.status),
            start_time: trip.start_time,
            end_time: trip.end_time,
            adult_count: updated.adult_count,
            child_count: updated.child_count,
            price_per_seat: trip.price_per_seat,
            client_name,
            client_phone,
            changed_by: Some(actor.display_name.clone()),
        };
        enqueue_digest_tx(&mut tx, message_types::TRIP_BOOKING_STATUS, &digest).await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking_id,
            from = %booking.status,
            to = %requested,
            actor = %actor.profile_id,
            "trip booking status changed"
        );
        Ok(TransitionOutcome {
            record: updated,
            changed: true,
            digest,
        })
    }

    /// Move a group trip itself to `requested` on behalf of `actor`
    ///
    /// Managers and admins only. Bookings on the trip are not cascaded.
    pub async fn transition_trip(
        &self,
        trip_id: Uuid,
        requested: TripStatus,
        actor: &Actor,
    ) -> Result<TransitionOutcome<GroupTrip, TripDigest>, ApiError> {
        let mut tx = self.pool.begin().await?;

        let trip = trips::get_trip_tx(&mut tx, trip_id).await?;
        let boat = boats::get_boat_tx(&mut tx, trip.boat_id).await?;
        authorize_tx(&mut tx, actor, boat.id, None).await?;

        if trip.status == requested {
            tx.rollback().await?;
            tracing::info!(trip_id = %trip_id, status = %requested, "trip already in requested status");
            let digest = TripDigest {
                trip_id: trip.id,
                boat_id: boat.id,
                boat_name: boat.name,
                status: trip.status,
                previous_status: None,
                start_time: trip.start_time,
                end_time: trip.end_time,
                available_seats: trip.available_seats,
                changed_by: None,
            };
            return Ok(TransitionOutcome {
                record: trip,
                changed: false,
                digest,
            });
        }

        if !status::trip_transition_allowed(trip.status, requested) {
            return Err(CharterError::IllegalTransition {
                from: trip.status.to_string(),
                to: requested.to_string(),
            }
            .into());
        }

        let updated = trips::transition_trip_tx(&mut tx, trip_id, trip.status, requested)
            .await?
            .ok_or(CharterError::ConcurrentUpdate {
                expected: trip.status.to_string(),
            })?;

        let digest = TripDigest {
            trip_id: updated.id,
            boat_id: boat.id,
            boat_name: boat.name,
            status: updated.status,
            previous_status: Some(trip.status),
            start_time: updated.start_time,
            end_time: updated.end_time,
            available_seats: updated.available_seats,
            changed_by: Some(actor.display_name.clone()),
        };
        enqueue_digest_tx(&mut tx, message_types::TRIP_STATUS, &digest).await?;

        tx.commit().await?;

        tracing::info!(
            trip_id = %trip_id,
            from = %trip.status,
            to = %requested,
            actor = %actor.profile_id,
            "trip status changed"
        );
        Ok(TransitionOutcome {
            record: updated,
            changed: true,
            digest,
        })
    }
}

/// Authorize `actor` for a status change on a boat's booking
///
/// Admins pass, the booking's owner passes, registered managers of the
/// boat pass. The manager check always hits the database.
async fn authorize_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    actor: &Actor,
    boat_id: Uuid,
    owner_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if actor.is_admin() {
        return Ok(());
    }
    if owner_id.is_some_and(|id| id == actor.profile_id) {
        return Ok(());
    }
    if boats::is_boat_manager_tx(tx, boat_id, actor.profile_id).await? {
        return Ok(());
    }
    Err(CharterError::PermissionDenied.into())
}

/// Resolve the client-facing name and phone for a booking
async fn resolve_client_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Option<Uuid>,
    guest_name: Option<&str>,
    guest_phone: Option<&str>,
) -> Result<(String, Option<String>), ApiError> {
    if let Some(name) = guest_name {
        return Ok((name.to_string(), guest_phone.map(String::from)));
    }
    if let Some(user_id) = user_id {
        let profile = profiles::get_profile_tx(tx, user_id).await?;
        return Ok((profile.display_name, profile.phone));
    }
    Ok(("Guest".to_string(), None))
}

async fn enqueue_digest_tx<T: serde::Serialize>(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    message_type: &str,
    digest: &T,
) -> Result<(), ApiError> {
    let payload = serde_json::to_value(digest)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize digest: {}", e)))?;
    outbox::enqueue_tx(tx, message_type, &payload).await?;
    Ok(())
}
