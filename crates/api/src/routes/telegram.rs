//! Telegram webhook ingress
//!
//! Telegram retries any non-200 response, so this endpoint always
//! returns 200. Every failure mode is logged and swallowed: malformed
//! bodies, update kinds we do not handle, unknown senders, and
//! rejected transitions all end the same way for Telegram itself.
//!
//! The callback is acknowledged before the transition runs. The
//! spinner on the manager's button stops immediately and the edited
//! message is the real receipt.

use axum::{Router, body::Bytes, extract::State, http::StatusCode, routing::post};
use dockline_core::callback::{BookingKind, CallbackAction};
use dockline_core::format;
use dockline_core::models::Actor;
use dockline_telegram::update::{IncomingCallbackQuery, WebhookUpdate};

use crate::AppState;
use crate::db;
use crate::engine::StatusEngine;
use crate::error::ApiError;

async fn telegram_webhook(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let update: WebhookUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!("Discarding unparseable telegram update: {}", e);
            return StatusCode::OK;
        }
    };

    match update {
        WebhookUpdate::CallbackQuery {
            update_id,
            callback_query,
        } => {
            if let Err(e) = process_callback(&state, callback_query).await {
                tracing::warn!(update_id, "callback rejected: {}", e);
            }
        }
        WebhookUpdate::Message { update_id, .. } => {
            tracing::debug!(update_id, "ignoring chat message update");
        }
        WebhookUpdate::Unknown { update_id } => {
            tracing::debug!(update_id, "ignoring unhandled update kind");
        }
    }
    StatusCode::OK
}

async fn process_callback(
    state: &AppState,
    callback: IncomingCallbackQuery,
) -> Result<(), ApiError> {
    let Some(data) = callback.data.as_deref() else {
        tracing::warn!(callback_id = %callback.id, "callback without data");
        state.gateway.answer_callback(&callback.id, None, false).await;
        return Ok(());
    };

    // Identity lookup is cached; authorization inside the engine is not
    let sender_id = callback.from.id;
    // Check cache
    let mut profile = state.profile_cache.get(&sender_id).await;

    if profile.is_none() {
        match db::profiles::get_profile_by_telegram_id(&state.pool, sender_id).await {
            Ok(Some(found)) => {
                // Cache success only; misses stay uncached
                state.profile_cache.insert(sender_id, found.clone()).await;
                profile = Some(found);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(telegram_id = sender_id, "profile lookup failed: {}", e);
            }
        }
    }

    let Some(profile) = profile else {
        tracing::warn!(telegram_id = sender_id, "callback from unknown sender");
        state
            .gateway
            .answer_callback(
                &callback.id,
                Some("You are not authorized to manage bookings".to_string()),
                true,
            )
            .await;
        return Ok(());
    };

    let action = match CallbackAction::parse(data) {
        Ok(action) => action,
        Err(e) => {
            tracing::warn!(callback_id = %callback.id, "unparseable callback data: {}", e);
            state
                .gateway
                .answer_callback(&callback.id, Some("Unsupported action".to_string()), false)
                .await;
            return Ok(());
        }
    };

    state.gateway.answer_callback(&callback.id, None, false).await;

    let actor = Actor {
        profile_id: profile.id,
        role: profile.role,
        display_name: profile.display_name.clone(),
    };
    let engine = StatusEngine::new(state.pool.clone());

    let text = match action.kind {
        BookingKind::Regular => {
            let requested = action.action.booking_target().ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Action {} does not apply to individual bookings",
                    action.action
                ))
            })?;
            let outcome = engine
                .transition_booking(action.booking_id, requested, &actor)
                .await?;
            format::booking_status_changed(&outcome.digest, state.charter_timezone)
        }
        BookingKind::GroupTrip => {
            let requested = action.action.trip_booking_target().ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Action {} does not apply to group trip bookings",
                    action.action
                ))
            })?;
            let outcome = engine
                .transition_trip_booking(action.booking_id, requested, &actor)
                .await?;
            format::trip_booking_status_changed(&outcome.digest, state.charter_timezone)
        }
    };

    // Rewriting the message drops its inline keyboard, so a handled
    // button cannot be tapped twice from the same message
    if let Some(message) = callback.message {
        state
            .gateway
            .edit_message(message.chat.id, message.message_id, text)
            .await;
    } else {
        tracing::debug!(callback_id = %callback.id, "callback has no message to edit");
    }

    Ok(())
}

/// Webhook routes, mounted outside the authenticated API surface
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook", post(telegram_webhook))
}
