//! Core domain models for Dockline
//!
//! These models represent the core business entities and map to database tables.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::CharterError;

/// Profile role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "profile_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    User,
    Manager,
    Admin,
    /// Known only through Telegram, never signed in on the web
    TelegramOnly,
}

/// Profile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub telegram_id: Option<i64>,
    pub display_name: String,
    pub phone: Option<String>,
    pub role: ProfileRole,
    pub created_at: DateTime<Utc>,
}

/// Boat entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct Boat {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub capacity: i32,
    pub price_per_hour: i64, // minor currency units
    pub created_at: DateTime<Utc>,
}

/// Assignment of a managing profile to a boat
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct BoatManager {
    pub id: Uuid,
    pub boat_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Individual booking status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CharterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CharterError::InvalidBookingData(format!(
                "unknown booking status: {other}"
            ))),
        }
    }
}

/// Individual booking entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub boat_id: Uuid,
    pub user_id: Option<Uuid>, // None once the owning profile is deleted
    pub status: BookingStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: i64, // minor currency units
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group trip status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Scheduled,
    InProgress,
    Full,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Full => "full",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = CharterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "full" => Ok(Self::Full),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CharterError::InvalidBookingData(format!(
                "unknown trip status: {other}"
            ))),
        }
    }
}

/// Scheduled group trip entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct GroupTrip {
    pub id: Uuid,
    pub boat_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub available_seats: i32, // never negative, enforced by the seat guard
    pub price_per_seat: i64,  // minor currency units
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group trip booking status enumeration
///
/// There is no pending state here. Seat bookings are confirmed at
/// creation time because the seat debit already reserved capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "trip_booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TripBookingStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl TripBookingStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TripBookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripBookingStatus {
    type Err = CharterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CharterError::InvalidBookingData(format!(
                "unknown trip booking status: {other}"
            ))),
        }
    }
}

/// Seat booking on a group trip
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct GroupTripBooking {
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

impl GroupTripBooking {
    /// Seats this booking holds on the trip
    pub const fn seat_count(&self) -> i32 {
        self.adult_count + self.child_count
    }
}

/// Outbox message type vocabulary shared by the enqueuing engine and
/// the notifier's dispatcher
pub mod message_types {
    pub const BOOKING_CREATED: &str = "booking_created";
    pub const BOOKING_STATUS: &str = "booking_status";
    pub const BOOKING_REMINDER: &str = "booking_reminder";
    pub const TRIP_BOOKING_CREATED: &str = "trip_booking_created";
    pub const TRIP_BOOKING_STATUS: &str = "trip_booking_status";
    pub const TRIP_STATUS: &str = "trip_status";
}

/// Outbox message for asynchronous processing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub message_type: String, // one of message_types::*
    pub payload: serde_json::Value,
    pub status: OutboxStatus,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Outbox message status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "outbox_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Identity of the party requesting a status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub profile_id: Uuid,
    pub role: ProfileRole,
    pub display_name: String,
}

impl Actor {
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, ProfileRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_status_serde_roundtrip() {
        let json = serde_json::to_string(&BookingStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
        let status: BookingStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, BookingStatus::Pending);
    }

    #[test]
    fn test_trip_status_uses_snake_case() {
        let json = serde_json::to_string(&TripStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(TripStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_status_parsing_rejects_unknown_values() {
        assert!(BookingStatus::from_str("confirmed").is_ok());
        assert!(BookingStatus::from_str("CONFIRMED").is_err());
        assert!(BookingStatus::from_str("approved").is_err());
        assert!(TripBookingStatus::from_str("pending").is_err());
        assert!(TripStatus::from_str("in progress").is_err());
    }

    #[test]
    fn test_seat_count_sums_party() {
        let booking = GroupTripBooking {
            id: Uuid::new_v4(),
            group_trip_id: Uuid::new_v4(),
            user_id: None,
            adult_count: 2,
            child_count: 3,
            status: TripBookingStatus::Confirmed,
            guest_name: Some("Walk-in".to_string()),
            guest_phone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(booking.seat_count(), 5);
    }
}
