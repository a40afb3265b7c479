//! API route modules

pub mod bookings;
pub mod health;
pub mod telegram;
pub mod trips;
