//! Inline keyboards attached to booking notifications
//!
//! Button callback data uses the compact `<kind>:<action>:<uuid>` form
//! so the webhook can route a press without any stored state.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use uuid::Uuid;

use dockline_core::callback::{BookingAction, BookingKind, CallbackAction};

/// Keyboard offered to managers for a pending individual booking
pub fn pending_booking_keyboard(booking_id: Uuid) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        action_button("✅ Confirm", BookingKind::Regular, BookingAction::Confirm, booking_id),
        action_button("❌ Cancel", BookingKind::Regular, BookingAction::Cancel, booking_id),
    ]])
}

/// Keyboard offered to managers for a confirmed individual booking
pub fn confirmed_booking_keyboard(booking_id: Uuid) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![action_button(
        "❌ Cancel",
        BookingKind::Regular,
        BookingAction::Cancel,
        booking_id,
    )]])
}

/// Keyboard offered to managers for a confirmed group trip booking
pub fn trip_booking_keyboard(booking_id: Uuid) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        action_button(
            "🏁 Complete",
            BookingKind::GroupTrip,
            BookingAction::Complete,
            booking_id,
        ),
        action_button(
            "❌ Cancel",
            BookingKind::GroupTrip,
            BookingAction::Cancel,
            booking_id,
        ),
    ]])
}

fn action_button(
    label: &str,
    kind: BookingKind,
    action: BookingAction,
    booking_id: Uuid,
) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, CallbackAction::new(kind, action, booking_id).encode())
}
