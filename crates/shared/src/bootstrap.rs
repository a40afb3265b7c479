use anyhow::Result;
use dockline_core::config::CoreConfig;
use sqlx::postgres::PgPoolOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Load .env before anything reads the environment
pub fn init_env() {
    dotenvy::dotenv().ok();
}

/// Initialize tracing for a service binary
///
/// Logs to stdout, and to a per-run JSONL file under `LOG_DIR` unless
/// `ENABLE_FILE_LOGGING` is turned off. The returned guard flushes the
/// file writer; keep it alive for the life of the process.
pub fn init_tracing(service_name: &str) -> Option<WorkerGuard> {
    let default_filter = format!("info,{service_name}=debug,sqlx=warn");
    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer());

    let file_logging = std::env::var("ENABLE_FILE_LOGGING")
        .map(|v| v.to_lowercase() != "false" && v != "0")
        .unwrap_or(true);
    if !file_logging {
        registry.init();
        return None;
    }

    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs/app".to_string());
    let started = chrono::Local::now().format("%y-%m-%d-%H-%M-%S");
    let file_appender = tracing_appender::rolling::never(
        &log_dir,
        format!("dockline-{service_name}.log.{started}.jsonl"),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    registry
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .json(),
        )
        .init();

    Some(guard)
}

/// Connect the service database pool
pub async fn init_db(config: &CoreConfig) -> Result<sqlx::PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .idle_timeout(std::time::Duration::from_secs(300))
        .max_lifetime(std::time::Duration::from_secs(1800)) // 30 minutes
        .connect(&config.database_url)
        .await?;

    tracing::info!(
        "✓ Database pool established (max_connections: {})",
        config.db_max_connections
    );

    Ok(pool)
}
