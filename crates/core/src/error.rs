//! Error types for Dockline core domain logic

use thiserror::Error;
use uuid::Uuid;

/// Core charter domain errors
#[derive(Error, Debug)]
pub enum CharterError {
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Group trip not found: {0}")]
    TripNotFound(Uuid),

    #[error("Group trip booking not found: {0}")]
    TripBookingNotFound(Uuid),

    #[error("Boat not found: {0}")]
    BoatNotFound(Uuid),

    #[error("Invalid booking data: {0}")]
    InvalidBookingData(String),

    #[error("Status transition {from} -> {to} is not allowed")]
    IllegalTransition { from: String, to: String },

    #[error("Booking changed concurrently, expected status {expected}")]
    ConcurrentUpdate { expected: String },

    #[error("Not enough seats: requested {requested}, available {available}")]
    NotEnoughSeats { requested: i32, available: i32 },

    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Permission denied")]
    PermissionDenied,
}

/// Result type alias for charter operations
pub type CharterResult<T> = Result<T, CharterError>;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvVar { name: String, value: String },
}
