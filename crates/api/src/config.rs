//! Server configuration from environment variables

use anyhow::{Context, Result};
use dockline_core::config::CoreConfig;
use std::env;

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub core: CoreConfig,
    pub host: String,
    pub port: u16,
    pub cors_allowed_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let core = CoreConfig::from_env()?;

        Ok(Self {
            core,
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Failed to parse API_PORT as u16")?,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        })
    }
}
