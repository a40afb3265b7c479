//! Outbox job dispatch
//!
//! Deserializes the digest snapshot, renders the message, and fans out
//! to every resolved recipient in parallel. Managers get the inline
//! keyboard for the record's current state, clients get text only. A
//! job counts as delivered once at least one send succeeds; when every
//! manager send fails the admin chat is tried as a last resort.

use anyhow::{Context, Result};
use futures::future::join_all;
use sqlx::PgPool;
use teloxide::types::InlineKeyboardMarkup;

use dockline_core::format::{self, BookingDigest, TripBookingDigest, TripDigest};
use dockline_core::models::{BookingStatus, TripBookingStatus, message_types};
use dockline_telegram::{TelegramGateway, keyboards};

use crate::config::Config;
use crate::db::OutboxMessage;
use crate::recipients;

/// Process a single claimed outbox job
pub async fn process_message(
    pool: &PgPool,
    gateway: &TelegramGateway,
    config: &Config,
    message: &OutboxMessage,
) -> Result<()> {
    match message.message_type.as_str() {
        message_types::BOOKING_CREATED => booking_created(pool, gateway, config, message).await,
        message_types::BOOKING_STATUS => booking_status(pool, gateway, config, message).await,
        message_types::BOOKING_REMINDER => booking_reminder(pool, gateway, config, message).await,
        message_types::TRIP_BOOKING_CREATED => {
            trip_booking_created(pool, gateway, config, message).await
        }
        message_types::TRIP_BOOKING_STATUS => {
            trip_booking_status(pool, gateway, config, message).await
        }
        message_types::TRIP_STATUS => trip_status(pool, gateway, config, message).await,
        other => Err(anyhow::anyhow!("unknown message type: {other}")),
    }
}

/// New booking request, prompting the boat's managers to decide
async fn booking_created(
    pool: &PgPool,
    gateway: &TelegramGateway,
    config: &Config,
    message: &OutboxMessage,
) -> Result<()> {
    let digest: BookingDigest = parse_payload(message)?;
    let text = format::booking_requested(&digest, config.charter_timezone);
    let keyboard = keyboards::pending_booking_keyboard(digest.booking_id);
    let managers = recipients::resolve_recipients(pool, digest.boat_id, config.admin_chat_id).await?;

    deliver(gateway, config.admin_chat_id, &managers, &[], text, Some(keyboard)).await
}

/// Booking status change, told to managers and the client
async fn booking_status(
    pool: &PgPool,
    gateway: &TelegramGateway,
    config: &Config,
    message: &OutboxMessage,
) -> Result<()> {
    let digest: BookingDigest = parse_payload(message)?;
    let text = format::booking_status_changed(&digest, config.charter_timezone);
    let keyboard = match digest.status {
        BookingStatus::Pending => Some(keyboards::pending_booking_keyboard(digest.booking_id)),
        BookingStatus::Confirmed => Some(keyboards::confirmed_booking_keyboard(digest.booking_id)),
        BookingStatus::Cancelled => None,
    };
    let managers = recipients::resolve_recipients(pool, digest.boat_id, config.admin_chat_id).await?;
    let client = recipients::resolve_client(pool, digest.user_id).await?;

    deliver(
        gateway,
        config.admin_chat_id,
        &managers,
        client.as_slice(),
        text,
        keyboard,
    )
    .await
}

/// Departure reminder, client-only
async fn booking_reminder(
    pool: &PgPool,
    gateway: &TelegramGateway,
    config: &Config,
    message: &OutboxMessage,
) -> Result<()> {
    let digest: BookingDigest = parse_payload(message)?;
    let client = recipients::resolve_client(pool, digest.user_id)
        .await?
        .context("reminder client has no telegram chat")?;
    let text = format::booking_reminder(
        &digest,
        config.charter_timezone,
        i64::from(config.reminder_lead_hours),
    );

    deliver(gateway, config.admin_chat_id, &[], &[client], text, None).await
}

/// New group trip booking, already confirmed by the seat debit
async fn trip_booking_created(
    pool: &PgPool,
    gateway: &TelegramGateway,
    config: &Config,
    message: &OutboxMessage,
) -> Result<()> {
    let digest: TripBookingDigest = parse_payload(message)?;
    let text = format::trip_booking_created(&digest, config.charter_timezone);
    let keyboard = keyboards::trip_booking_keyboard(digest.booking_id);
    let managers = recipients::resolve_recipients(pool, digest.boat_id, config.admin_chat_id).await?;
    let client = recipients::resolve_client(pool, digest.user_id).await?;

    deliver(
        gateway,
        config.admin_chat_id,
        &managers,
        client.as_slice(),
        text,
        Some(keyboard),
    )
    .await
}

/// Group trip booking status change
async fn trip_booking_status(
    pool: &PgPool,
    gateway: &TelegramGateway,
    config: &Config,
    message: &OutboxMessage,
) -> Result<()> {
    let digest: TripBookingDigest = parse_payload(message)?;
    let text = format::trip_booking_status_changed(&digest, config.charter_timezone);
    let keyboard = match digest.status {
        TripBookingStatus::Confirmed => Some(keyboards::trip_booking_keyboard(digest.booking_id)),
        TripBookingStatus::Completed | TripBookingStatus::Cancelled => None,
    };
    let managers = recipients::resolve_recipients(pool, digest.boat_id, config.admin_chat_id).await?;
    let client = recipients::resolve_client(pool, digest.user_id).await?;

    deliver(
        gateway,
        config.admin_chat_id,
        &managers,
        client.as_slice(),
        text,
        keyboard,
    )
    .await
}

/// Group trip lifecycle change, told to managers and booked participants
async fn trip_status(
    pool: &PgPool,
    gateway: &TelegramGateway,
    config: &Config,
    message: &OutboxMessage,
) -> Result<()> {
    let digest: TripDigest = parse_payload(message)?;
    let text = format::trip_status_changed(&digest, config.charter_timezone);
    let managers = recipients::resolve_recipients(pool, digest.boat_id, config.admin_chat_id).await?;
    let participants = recipients::resolve_trip_participants(pool, digest.trip_id).await?;

    deliver(
        gateway,
        config.admin_chat_id,
        &managers,
        &participants,
        text,
        None,
    )
    .await
}

/// Fan out to manager and client chats, all-settled
async fn deliver(
    gateway: &TelegramGateway,
    admin_chat_id: i64,
    manager_chats: &[i64],
    client_chats: &[i64],
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let manager_sends = manager_chats
        .iter()
        .map(|&chat| gateway.send_message(chat, text.clone(), keyboard.clone()));
    let client_sends = client_chats
        .iter()
        .map(|&chat| gateway.send_message(chat, text.clone(), None));
    let (manager_results, client_results) =
        tokio::join!(join_all(manager_sends), join_all(client_sends));

    let managers_delivered = manager_results.into_iter().filter(|&ok| ok).count();
    let clients_delivered = client_results.into_iter().filter(|&ok| ok).count();
    let mut delivered = managers_delivered + clients_delivered;

    if managers_delivered == 0 && !manager_chats.is_empty() {
        tracing::warn!(
            failed = manager_chats.len(),
            "all manager deliveries failed, trying the admin chat"
        );
        if gateway.send_message(admin_chat_id, text, keyboard).await {
            delivered += 1;
        }
    }

    if delivered == 0 {
        anyhow::bail!("no delivery succeeded");
    }
    Ok(())
}

fn parse_payload<T: serde::de::DeserializeOwned>(message: &OutboxMessage) -> Result<T> {
    serde_json::from_value(message.payload.clone())
        .with_context(|| format!("malformed {} payload", message.message_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    fn message_with(message_type: &str, payload: serde_json::Value) -> OutboxMessage {
        OutboxMessage {
            id: Uuid::new_v4(),
            message_type: message_type.to_string(),
            payload,
            retry_count: 0,
        }
    }

    #[test]
    fn test_booking_digest_payload_round_trips() {
        let digest = BookingDigest {
            booking_id: Uuid::new_v4(),
            boat_id: Uuid::new_v4(),
            boat_name: "Sea Breeze".to_string(),
            user_id: None,
            status: BookingStatus::Confirmed,
            previous_status: Some(BookingStatus::Pending),
            start_time: Utc.with_ymd_and_hms(2026, 7, 18, 8, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2026, 7, 18, 12, 0, 0).unwrap(),
            price: 150_00,
            client_name: "Jordan".to_string(),
            client_phone: None,
            changed_by: Some("Alex".to_string()),
        };

        let message = message_with(
            message_types::BOOKING_STATUS,
            serde_json::to_value(&digest).unwrap(),
        );
        let parsed: BookingDigest = parse_payload(&message).unwrap();
        assert_eq!(parsed.booking_id, digest.booking_id);
        assert_eq!(parsed.status, BookingStatus::Confirmed);
        assert_eq!(parsed.previous_status, Some(BookingStatus::Pending));
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let message = message_with(message_types::BOOKING_STATUS, json!({"booking_id": 42}));
        let result: Result<BookingDigest> = parse_payload(&message);
        let error = result.unwrap_err().to_string();
        assert!(error.contains("booking_status"));
    }

    #[test]
    fn test_trip_digest_payload_is_snapshot_complete() {
        // The payload written by the engine must round-trip without any
        // database context
        let payload = json!({
            "trip_id": Uuid::new_v4(),
            "boat_id": Uuid::new_v4(),
            "boat_name": "Island Hopper",
            "status": "in_progress",
            "previous_status": "scheduled",
            "start_time": "2026-08-01T02:00:00Z",
            "end_time": "2026-08-01T05:00:00Z",
            "available_seats": 0,
            "changed_by": "Morgan"
        });
        let message = message_with(message_types::TRIP_STATUS, payload);
        let parsed: TripDigest = parse_payload(&message).unwrap();
        assert_eq!(parsed.available_seats, 0);
        assert_eq!(parsed.changed_by.as_deref(), Some("Morgan"));
    }
}
