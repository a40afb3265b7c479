//! Status transition rules
//!
//! Every adapter funnels into the same legality checks, so the REST API,
//! the Telegram webhook and the deep-link endpoint cannot disagree about
//! which moves the state machine accepts. A request that names the current
//! status again is not a transition; callers detect that case before
//! consulting these functions.

use crate::models::{BookingStatus, TripBookingStatus, TripStatus};

/// Whether an individual booking may move from `from` to `to`.
///
/// Pending bookings can be confirmed or cancelled, confirmed bookings can
/// only be cancelled. Nothing ever re-enters pending and cancelled is
/// terminal.
pub const fn booking_transition_allowed(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::{Cancelled, Confirmed, Pending};
    matches!(
        (from, to),
        (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled)
    )
}

/// Whether a group trip booking may move from `from` to `to`.
///
/// Seat bookings start out confirmed and can be cancelled (seats return to
/// the trip) or completed after the trip ran. Cancelled and completed are
/// terminal.
pub const fn trip_booking_transition_allowed(from: TripBookingStatus, to: TripBookingStatus) -> bool {
    use TripBookingStatus::{Cancelled, Completed, Confirmed};
    matches!((from, to), (Confirmed, Cancelled) | (Confirmed, Completed))
}

/// Whether a group trip itself may move from `from` to `to`.
///
/// Scheduled and full trips behave identically here: full is just
/// scheduled with zero seats left. The scheduled/full flip itself is not
/// requestable, it falls out of seat arithmetic via [`bookable_status`].
pub const fn trip_transition_allowed(from: TripStatus, to: TripStatus) -> bool {
    use TripStatus::{Cancelled, Completed, Full, InProgress, Scheduled};
    matches!(
        (from, to),
        (Scheduled | Full, InProgress | Completed | Cancelled) | (InProgress, Completed | Cancelled)
    )
}

/// Recompute the bookable flavour of a trip status after seat arithmetic.
///
/// Only scheduled and full react to the seat count. A trip that is in
/// progress, completed or cancelled keeps its status no matter what a
/// late seat credit does to the counter.
pub const fn bookable_status(current: TripStatus, available_seats: i32) -> TripStatus {
    match current {
        TripStatus::Scheduled | TripStatus::Full => {
            if available_seats <= 0 {
                TripStatus::Full
            } else {
                TripStatus::Scheduled
            }
        }
        other => other,
    }
}
