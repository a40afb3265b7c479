//! Telegram callback data codec
//!
//! Inline keyboard buttons carry `<kind>:<action>:<uuid>` in their
//! callback data. Telegram caps callback data at 64 bytes, the encoded
//! form stays within that for every kind/action pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CharterError, CharterResult};
use crate::models::{BookingStatus, TripBookingStatus};

/// Telegram's hard limit on callback data, in bytes
pub const CALLBACK_DATA_LIMIT: usize = 64;

/// Which booking table a reference points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    Regular,
    GroupTrip,
}

impl BookingKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::GroupTrip => "group_trip",
        }
    }
}

impl fmt::Display for BookingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingKind {
    type Err = CharterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Self::Regular),
            "group_trip" => Ok(Self::GroupTrip),
            other => Err(CharterError::InvalidBookingData(format!(
                "unknown booking kind: {other}"
            ))),
        }
    }
}

/// Action a button or deep link requests on a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    Confirm,
    Cancel,
    Complete,
}

impl BookingAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
        }
    }

    /// Target status for an individual booking, if the action applies
    pub const fn booking_target(self) -> Option<BookingStatus> {
        match self {
            Self::Confirm => Some(BookingStatus::Confirmed),
            Self::Cancel => Some(BookingStatus::Cancelled),
            // Individual bookings have no completed state
            Self::Complete => None,
        }
    }

    /// Target status for a group trip booking, if the action applies
    pub const fn trip_booking_target(self) -> Option<TripBookingStatus> {
        match self {
            // Trip bookings are born confirmed, confirm maps to the same
            // status and surfaces as an idempotent no-op
            Self::Confirm => Some(TripBookingStatus::Confirmed),
            Self::Cancel => Some(TripBookingStatus::Cancelled),
            Self::Complete => Some(TripBookingStatus::Completed),
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingAction {
    type Err = CharterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirm" => Ok(Self::Confirm),
            "cancel" => Ok(Self::Cancel),
            "complete" => Ok(Self::Complete),
            other => Err(CharterError::InvalidBookingData(format!(
                "unknown booking action: {other}"
            ))),
        }
    }
}

/// Decoded callback button payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackAction {
    pub kind: BookingKind,
    pub action: BookingAction,
    pub booking_id: Uuid,
}

impl CallbackAction {
    pub const fn new(kind: BookingKind, action: BookingAction, booking_id: Uuid) -> Self {
        Self {
            kind,
            action,
            booking_id,
        }
    }

    /// Encode into the wire form carried in callback data
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.kind, self.action, self.booking_id)
    }

    /// Parse callback data back into a structured action
    pub fn parse(data: &str) -> CharterResult<Self> {
        let mut parts = data.splitn(3, ':');
        let (Some(kind), Some(action), Some(id)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CharterError::InvalidBookingData(format!(
                "malformed callback data: {data}"
            )));
        };

        let booking_id = Uuid::parse_str(id).map_err(|_| {
            CharterError::InvalidBookingData(format!("malformed callback booking id: {id}"))
        })?;

        Ok(Self {
            kind: kind.parse()?,
            action: action.parse()?,
            booking_id,
        })
    }
}
