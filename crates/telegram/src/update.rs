//! Inbound webhook payload types
//!
//! Deliberately minimal mirror of the Bot API update object, parsed
//! into a union of the kinds this service recognizes. Unknown fields
//! inside a known kind are ignored, and update kinds this service does
//! not care about land in `Unknown` instead of failing the webhook.

use serde::{Deserialize, Serialize};

/// One update delivered to the webhook
///
/// Variants are tried in declaration order, so a payload that is
/// neither a button press nor a chat message always falls through to
/// `Unknown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebhookUpdate {
    CallbackQuery {
        update_id: i64,
        callback_query: IncomingCallbackQuery,
    },
    Message {
        update_id: i64,
        message: IncomingMessage,
    },
    Unknown {
        update_id: i64,
    },
}

impl WebhookUpdate {
    pub const fn update_id(&self) -> i64 {
        match self {
            Self::CallbackQuery { update_id, .. }
            | Self::Message { update_id, .. }
            | Self::Unknown { update_id } => *update_id,
        }
    }
}

/// Inline keyboard button press
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingCallbackQuery {
    pub id: String,
    pub from: Sender,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

/// Plain chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i32,
    pub chat: IncomingChat,
    #[serde(default)]
    pub from: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingChat {
    pub id: i64,
}

/// The Telegram account behind a message or button press
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}
