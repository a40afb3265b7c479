//! Notification message formatting
//!
//! The digest types are the snapshots the engine stores in outbox
//! payloads at transition time. Rendering works off the digest alone, so
//! a booking that changes again before the notifier catches up still
//! produces a message describing the transition that enqueued it.
//!
//! All messages are Telegram HTML, rendered in the charter's local
//! timezone, and capped at [`TELEGRAM_MESSAGE_LIMIT`] characters.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BookingStatus, TripBookingStatus, TripStatus};

/// Telegram's hard limit on message text, in characters
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Snapshot of an individual booking taken at transition time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDigest {
    pub booking_id: Uuid,
    pub boat_id: Uuid,
    pub boat_name: String,
    pub user_id: Option<Uuid>,
    pub status: BookingStatus,
    pub previous_status: Option<BookingStatus>, // None for freshly created bookings
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: i64, // minor currency units
    pub client_name: String,
    pub client_phone: Option<String>,
    pub changed_by: Option<String>,
}

/// Snapshot of a group trip booking taken at transition time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripBookingDigest {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub boat_id: Uuid,
    pub boat_name: String,
    pub user_id: Option<Uuid>,
    pub status: TripBookingStatus,
    pub previous_status: Option<TripBookingStatus>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub adult_count: i32,
    pub child_count: i32,
    pub price_per_seat: i64, // minor currency units
    pub client_name: String,
    pub client_phone: Option<String>,
    pub changed_by: Option<String>,
}

impl TripBookingDigest {
    /// Price for the whole party
    pub const fn total_price(&self) -> i64 {
        self.price_per_seat * (self.adult_count + self.child_count) as i64
    }
}

/// Snapshot of a group trip taken at transition time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripDigest {
    pub trip_id: Uuid,
    pub boat_id: Uuid,
    pub boat_name: String,
    pub status: TripStatus,
    pub previous_status: Option<TripStatus>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub available_seats: i32,
    pub changed_by: Option<String>,
}

/// Manager-facing prompt for a freshly created pending booking
pub fn booking_requested(digest: &BookingDigest, tz: Tz) -> String {
    let mut text = format!(
        "🚤 <b>New Booking Request</b>\n\n\
         ⛵ {}\n\
         {}\n\
         👤 {}\n",
        escape(&digest.boat_name),
        window_lines(digest.start_time, digest.end_time, tz),
        escape(&digest.client_name),
    );
    if let Some(phone) = &digest.client_phone {
        text.push_str(&format!("📞 {}\n", escape(phone)));
    }
    text.push_str(&format!(
        "💰 {}\n\n🆔 <code>{}</code>\n\nConfirm or cancel below.",
        format_price(digest.price),
        digest.booking_id
    ));
    truncate_message(text)
}

/// Status change notice for an individual booking
pub fn booking_status_changed(digest: &BookingDigest, tz: Tz) -> String {
    let headline = match digest.status {
        BookingStatus::Pending => "🕐 <b>Booking Pending</b>",
        BookingStatus::Confirmed => "✅ <b>Booking Confirmed</b>",
        BookingStatus::Cancelled => "❌ <b>Booking Cancelled</b>",
    };
    let mut text = format!(
        "{}\n\n\
         ⛵ {}\n\
         {}\n\
         👤 {}\n\
         💰 {}\n",
        headline,
        escape(&digest.boat_name),
        window_lines(digest.start_time, digest.end_time, tz),
        escape(&digest.client_name),
        format_price(digest.price),
    );
    if let Some(previous) = digest.previous_status {
        text.push_str(&format!("📌 Status: {} (was {})\n", digest.status, previous));
    }
    text.push_str(&format!("\n🆔 <code>{}</code>", digest.booking_id));
    push_changed_by(&mut text, digest.changed_by.as_deref());
    truncate_message(text)
}

/// Reminder sent ahead of a confirmed booking's departure
pub fn booking_reminder(digest: &BookingDigest, tz: Tz, lead_hours: i64) -> String {
    let text = format!(
        "⏰ <b>Upcoming Trip</b>\n\n\
         ⛵ {}\n\
         {}\n\n\
         Departure is within the next {} hours. See you at the dock!",
        escape(&digest.boat_name),
        window_lines(digest.start_time, digest.end_time, tz),
        lead_hours,
    );
    truncate_message(text)
}

/// Manager-facing notice for a freshly created group trip booking
pub fn trip_booking_created(digest: &TripBookingDigest, tz: Tz) -> String {
    let mut text = format!(
        "🛥 <b>New Group Trip Booking</b>\n\n\
         ⛵ {}\n\
         {}\n\
         👥 {} adults, {} children\n\
         👤 {}\n",
        escape(&digest.boat_name),
        window_lines(digest.start_time, digest.end_time, tz),
        digest.adult_count,
        digest.child_count,
        escape(&digest.client_name),
    );
    if let Some(phone) = &digest.client_phone {
        text.push_str(&format!("📞 {}\n", escape(phone)));
    }
    text.push_str(&format!(
        "💰 {}\n\n🆔 <code>{}</code>",
        format_price(digest.total_price()),
        digest.booking_id
    ));
    truncate_message(text)
}

/// Status change notice for a group trip booking
pub fn trip_booking_status_changed(digest: &TripBookingDigest, tz: Tz) -> String {
    let headline = match digest.status {
        TripBookingStatus::Confirmed => "✅ <b>Trip Booking Confirmed</b>",
        TripBookingStatus::Completed => "🏁 <b>Trip Booking Completed</b>",
        TripBookingStatus::Cancelled => "❌ <b>Trip Booking Cancelled</b>",
    };
    let mut text = format!(
        "{}\n\n\
         ⛵ {}\n\
         {}\n\
         👥 {} adults, {} children\n\
         💰 {}\n",
        headline,
        escape(&digest.boat_name),
        window_lines(digest.start_time, digest.end_time, tz),
        digest.adult_count,
        digest.child_count,
        format_price(digest.total_price()),
    );
    if let Some(previous) = digest.previous_status {
        text.push_str(&format!("📌 Status: {} (was {})\n", digest.status, previous));
    }
    text.push_str(&format!("\n🆔 <code>{}</code>", digest.booking_id));
    push_changed_by(&mut text, digest.changed_by.as_deref());
    truncate_message(text)
}

/// Status change notice for a group trip itself
pub fn trip_status_changed(digest: &TripDigest, tz: Tz) -> String {
    let headline = match digest.status {
        TripStatus::Scheduled => "📅 <b>Trip Scheduled</b>",
        TripStatus::Full => "💺 <b>Trip Fully Booked</b>",
        TripStatus::InProgress => "🚤 <b>Trip Under Way</b>",
        TripStatus::Completed => "🏁 <b>Trip Completed</b>",
        TripStatus::Cancelled => "❌ <b>Trip Cancelled</b>",
    };
    let mut text = format!(
        "{}\n\n\
         ⛵ {}\n\
         {}\n\
         💺 Seats left: {}",
        headline,
        escape(&digest.boat_name),
        window_lines(digest.start_time, digest.end_time, tz),
        digest.available_seats,
    );
    if let Some(previous) = digest.previous_status {
        text.push_str(&format!("\n📌 Status: {} (was {})", digest.status, previous));
    }
    push_changed_by(&mut text, digest.changed_by.as_deref());
    truncate_message(text)
}

/// Cap message text at Telegram's limit, marking the cut with an ellipsis
pub fn truncate_message(text: String) -> String {
    if text.chars().count() <= TELEGRAM_MESSAGE_LIMIT {
        return text;
    }
    tracing::warn!(chars = text.chars().count(), "truncating oversized telegram message");
    let mut truncated: String = text.chars().take(TELEGRAM_MESSAGE_LIMIT - 1).collect();
    truncated.push('…');
    truncated
}

fn push_changed_by(text: &mut String, changed_by: Option<&str>) {
    if let Some(name) = changed_by {
        text.push_str(&format!("\n\n✏️ Changed by {}", escape(name)));
    }
}

fn window_lines(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> String {
    let start = start.with_timezone(&tz);
    let end = end.with_timezone(&tz);
    if start.date_naive() == end.date_naive() {
        format!(
            "📅 {}\n🕐 {} - {}",
            start.format("%A, %B %d, %Y"),
            start.format("%H:%M"),
            end.format("%H:%M")
        )
    } else {
        format!(
            "📅 {}\n🕐 {} - {}",
            start.format("%A, %B %d, %Y"),
            start.format("%H:%M"),
            end.format("%H:%M on %B %d")
        )
    }
}

fn format_price(minor: i64) -> String {
    format!("{}.{:02}", minor / 100, (minor % 100).abs())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_booking_digest() -> BookingDigest {
        BookingDigest {
            booking_id: Uuid::new_v4(),
            boat_id: Uuid::new_v4(),
            boat_name: "Sea Breeze".to_string(),
            user_id: None,
            status: BookingStatus::Confirmed,
            previous_status: Some(BookingStatus::Pending),
            start_time: Utc.with_ymd_and_hms(2026, 7, 18, 8, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2026, 7, 18, 12, 0, 0).unwrap(),
            price: 150_00,
            client_name: "Jordan Lee".to_string(),
            client_phone: Some("+65 8123 4567".to_string()),
            changed_by: Some("Alex".to_string()),
        }
    }

    #[test]
    fn test_booking_status_changed_includes_core_fields() {
        let digest = sample_booking_digest();
        let text = booking_status_changed(&digest, chrono_tz::UTC);

        assert!(text.starts_with("✅ <b>Booking Confirmed</b>"));
        assert!(text.contains("Sea Breeze"));
        assert!(text.contains("Jordan Lee"));
        assert!(text.contains("150.00"));
        assert!(text.contains("confirmed (was pending)"));
        assert!(text.contains(&digest.booking_id.to_string()));
        assert!(text.contains("Changed by Alex"));
    }

    #[test]
    fn test_booking_reminder_mentions_lead_window() {
        let mut digest = sample_booking_digest();
        digest.previous_status = None;
        let text = booking_reminder(&digest, chrono_tz::UTC, 24);

        assert!(text.starts_with("⏰ <b>Upcoming Trip</b>"));
        assert!(text.contains("next 24 hours"));
    }

    #[test]
    fn test_times_render_in_local_timezone() {
        let digest = sample_booking_digest();
        let text = booking_requested(&digest, chrono_tz::Asia::Singapore);

        // 08:00 UTC is 16:00 in Singapore
        assert!(text.contains("16:00"));
        assert!(text.contains("20:00"));
    }

    #[test]
    fn test_booking_requested_skips_missing_phone() {
        let mut digest = sample_booking_digest();
        digest.client_phone = None;
        let text = booking_requested(&digest, chrono_tz::UTC);
        assert!(!text.contains("📞"));
    }

    #[test]
    fn test_html_in_names_is_escaped() {
        let mut digest = sample_booking_digest();
        digest.client_name = "<script>alert(1)</script>".to_string();
        let text = booking_status_changed(&digest, chrono_tz::UTC);
        assert!(!text.contains("<script>"));
        assert!(text.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_trip_booking_total_price() {
        let digest = TripBookingDigest {
            booking_id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            boat_id: Uuid::new_v4(),
            boat_name: "Reef Runner".to_string(),
            user_id: None,
            status: TripBookingStatus::Cancelled,
            previous_status: Some(TripBookingStatus::Confirmed),
            start_time: Utc.with_ymd_and_hms(2026, 7, 18, 8, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2026, 7, 18, 11, 0, 0).unwrap(),
            adult_count: 2,
            child_count: 1,
            price_per_seat: 45_00,
            client_name: "Sam".to_string(),
            client_phone: None,
            changed_by: None,
        };

        assert_eq!(digest.total_price(), 135_00);
        let text = trip_booking_status_changed(&digest, chrono_tz::UTC);
        assert!(text.starts_with("❌ <b>Trip Booking Cancelled</b>"));
        assert!(text.contains("135.00"));
        assert!(text.contains("2 adults, 1 children"));
        assert!(!text.contains("Changed by"));
    }

    #[test]
    fn test_truncation_appends_ellipsis_at_limit() {
        let text = "x".repeat(TELEGRAM_MESSAGE_LIMIT + 500);
        let truncated = truncate_message(text);
        assert_eq!(truncated.chars().count(), TELEGRAM_MESSAGE_LIMIT);
        assert!(truncated.ends_with('…'));

        let short = "hello".to_string();
        assert_eq!(truncate_message(short.clone()), short);
    }

    #[test]
    fn test_exactly_at_limit_is_untouched() {
        let text = "y".repeat(TELEGRAM_MESSAGE_LIMIT);
        assert_eq!(truncate_message(text.clone()), text);
    }
}
