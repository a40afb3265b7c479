use anyhow::Result;
use dockline_core::config::CoreConfig;
use std::env;

#[derive(Debug, Clone)]
pub struct UnifiedConfig {
    pub core: CoreConfig,
    pub api: ApiConfig,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origin: String,
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub poll_interval_secs: u64,
    pub max_retry_count: i32,
    pub batch_size: i64,
    pub status_log_interval_secs: u64,
    pub reminder_lead_hours: i32,
    pub reminder_scan_interval_secs: u64,
}

impl UnifiedConfig {
    pub fn from_env() -> Result<Self> {
        let core = CoreConfig::from_env()?;

        Ok(Self {
            core,
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
                port: env::var("API_PORT")
                    .unwrap_or_else(|_| "3000".into())
                    .parse()?,
                cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "*".into()),
            },
            notifier: NotifierConfig {
                poll_interval_secs: env::var("NOTIFIER_POLL_INTERVAL_SECS")
                    .unwrap_or_else(|_| "10".into())
                    .parse()?,
                max_retry_count: env::var("NOTIFIER_MAX_RETRY_COUNT")
                    .unwrap_or_else(|_| "5".into())
                    .parse()?,
                batch_size: env::var("NOTIFIER_BATCH_SIZE")
                    .unwrap_or_else(|_| "10".into())
                    .parse()?,
                status_log_interval_secs: env::var("NOTIFIER_STATUS_LOG_INTERVAL_SECS")
                    .unwrap_or_else(|_| "60".into())
                    .parse()?,
                reminder_lead_hours: env::var("REMINDER_LEAD_HOURS")
                    .unwrap_or_else(|_| "24".into())
                    .parse()?,
                reminder_scan_interval_secs: env::var("REMINDER_SCAN_INTERVAL_SECS")
                    .unwrap_or_else(|_| "300".into())
                    .parse()?,
            },
        })
    }

    pub fn to_api_config(&self) -> api::config::Config {
        api::config::Config {
            core: self.core.clone(),
            host: self.api.host.clone(),
            port: self.api.port,
            cors_allowed_origin: self.api.cors_allowed_origin.clone(),
        }
    }

    pub fn to_notifier_config(&self) -> notifier::Config {
        notifier::Config {
            core: self.core.clone(),
            poll_interval_secs: self.notifier.poll_interval_secs,
            max_retry_count: self.notifier.max_retry_count,
            batch_size: self.notifier.batch_size,
            status_log_interval_secs: self.notifier.status_log_interval_secs,
            reminder_lead_hours: self.notifier.reminder_lead_hours,
            reminder_scan_interval_secs: self.notifier.reminder_scan_interval_secs,
        }
    }
}
