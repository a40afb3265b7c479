//! Dockline Telegram - the bot gateway
//!
//! Owns every Telegram wire concern: sending and editing HTML messages,
//! acknowledging callback queries, building inline keyboards, and the
//! serde types webhook payloads deserialize into. The rest of the
//! workspace never touches the Bot API directly.

pub mod gateway;
pub mod keyboards;
pub mod update;

pub use gateway::TelegramGateway;
