//! Configuration for the notifier process
//!
//! Loads configuration from environment variables

use anyhow::{Context, Result};
use std::env;
use std::ops::Deref;

use dockline_core::config::CoreConfig;

/// Notifier configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Core configuration
    pub core: CoreConfig,

    /// Poll interval in seconds
    pub poll_interval_secs: u64,

    /// Maximum retry count for failed jobs
    pub max_retry_count: i32,

    /// Batch size for claiming jobs
    pub batch_size: i64,

    /// Interval in seconds for logging queue status (COUNT(*))
    pub status_log_interval_secs: u64,

    /// How far ahead of departure a reminder goes out, in hours
    pub reminder_lead_hours: i32,

    /// Interval in seconds between reminder scans
    pub reminder_scan_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let core = CoreConfig::from_env()?;

        Ok(Self {
            core,
            poll_interval_secs: env::var("NOTIFIER_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("NOTIFIER_POLL_INTERVAL_SECS must be a valid integer")?,

            max_retry_count: env::var("NOTIFIER_MAX_RETRY_COUNT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("NOTIFIER_MAX_RETRY_COUNT must be a valid integer")?,

            batch_size: env::var("NOTIFIER_BATCH_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("NOTIFIER_BATCH_SIZE must be a valid integer")?,

            status_log_interval_secs: env::var("NOTIFIER_STATUS_LOG_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("NOTIFIER_STATUS_LOG_INTERVAL_SECS must be a valid integer")?,

            reminder_lead_hours: env::var("REMINDER_LEAD_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("REMINDER_LEAD_HOURS must be a valid integer")?,

            reminder_scan_interval_secs: env::var("REMINDER_SCAN_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("REMINDER_SCAN_INTERVAL_SECS must be a valid integer")?,
        })
    }
}

impl Deref for Config {
    type Target = CoreConfig;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_core() -> CoreConfig {
        CoreConfig {
            database_url: "postgres://test@localhost/dockline".to_string(),
            telegram_bot_token: "test_token".to_string(),
            admin_chat_id: -100_123_456,
            access_token_secret: "access".to_string(),
            refresh_token_secret: "refresh".to_string(),
            charter_timezone: chrono_tz::Tz::UTC,
            db_max_connections: 20,
        }
    }

    #[test]
    fn test_config_has_defaults() {
        let config = Config {
            core: test_core(),
            poll_interval_secs: 10,
            max_retry_count: 5,
            batch_size: 10,
            status_log_interval_secs: 60,
            reminder_lead_hours: 24,
            reminder_scan_interval_secs: 300,
        };

        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.max_retry_count, 5);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.reminder_lead_hours, 24);
    }

    #[test]
    fn test_config_deref() {
        let config = Config {
            core: test_core(),
            poll_interval_secs: 10,
            max_retry_count: 5,
            batch_size: 10,
            status_log_interval_secs: 60,
            reminder_lead_hours: 24,
            reminder_scan_interval_secs: 300,
        };

        // Core fields are reachable through Deref
        assert_eq!(config.database_url, "postgres://test@localhost/dockline");
        assert_eq!(config.admin_chat_id, -100_123_456);
    }
}
