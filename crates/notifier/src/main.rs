//! Dockline Notifier - Outbox delivery binary (standalone mode)
//!
//! This binary runs the notifier as a standalone service.
//! For library usage, see the notifier crate's lib.rs.

use anyhow::Result;
use dockline_shared::bootstrap;
use dockline_telegram::TelegramGateway;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    let _guard = bootstrap::init_tracing("notifier");

    info!("Starting Dockline notifier (standalone mode)");

    let config = notifier::Config::from_env()?;

    let pool = bootstrap::init_db(&config).await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!("Database migrations completed");

    let gateway = TelegramGateway::new(&config.telegram_bot_token);
    info!("Telegram gateway initialized");

    notifier::run_notifier(pool, gateway, config, None).await?;

    Ok(())
}
