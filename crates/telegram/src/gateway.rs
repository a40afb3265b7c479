//! Outbound Telegram calls
//!
//! Thin wrapper around the teloxide [`Bot`] that applies the house
//! rules: HTML parse mode everywhere, message text capped at the
//! Telegram limit, and edits tolerating the "message is not modified"
//! error that re-delivered callbacks produce.
//!
//! The wrapper never returns transport errors. A failed call is logged
//! and collapsed to `false`; callers that care (the notifier's retry
//! loop) count successes instead of matching on error variants.

use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::{ApiError, Bot, RequestError};

use dockline_core::format::truncate_message;

/// Shared handle for all outbound bot traffic
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
        }
    }

    /// Send an HTML message, optionally with an inline keyboard
    ///
    /// Returns whether Telegram accepted the message.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> bool {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), truncate_message(text))
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }

        match request.await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "failed to send telegram message");
                false
            }
        }
    }

    /// Replace a message's text, dropping its inline keyboard
    ///
    /// Telegram rejects edits that change nothing. That happens whenever a
    /// callback is delivered twice, so it is treated as success here.
    pub async fn edit_message(&self, chat_id: i64, message_id: i32, text: String) -> bool {
        let result = self
            .bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), truncate_message(text))
            .parse_mode(ParseMode::Html)
            .await;

        match result {
            Ok(_) => true,
            Err(RequestError::Api(ApiError::MessageNotModified)) => {
                tracing::debug!(chat_id, message_id, "edit was a no-op");
                true
            }
            Err(e) => {
                tracing::warn!(chat_id, message_id, error = %e, "failed to edit telegram message");
                false
            }
        }
    }

    /// Acknowledge a callback query, optionally with a toast or alert text
    ///
    /// Telegram shows a spinner on the button until this is called, so
    /// handlers acknowledge before doing any real work.
    pub async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<String>,
        show_alert: bool,
    ) -> bool {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = text {
            request = request.text(truncate_message(text));
        }
        if show_alert {
            request = request.show_alert(true);
        }

        match request.await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(callback_id, error = %e, "failed to answer callback query");
                false
            }
        }
    }
}
