//! Dockline Core - Domain logic and models
//!
//! This crate contains pure domain logic with no I/O operations.
//! All database models, status rules, message formatting and error
//! types are defined here.

pub mod callback;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod status;
pub mod token;

pub use error::{CharterError, CharterResult};
