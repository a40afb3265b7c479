//! Dockline Notifier - Outbox delivery service
//!
//! Claims pending notification jobs, renders them, and fans them out to
//! Telegram with retry and exponential backoff. Also runs the periodic
//! scan that turns upcoming confirmed bookings into reminder jobs.

mod config;
mod db;
mod dispatch;
mod recipients;

pub use config::Config;

use anyhow::Result;
use db::NotifierDb;
use dockline_telegram::TelegramGateway;
use sqlx::PgPool;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How often completed and failed jobs are purged
const CLEANUP_INTERVAL_SECS: u64 = 86_400;

/// Run the notifier service
///
/// This function runs the delivery loop until cancelled or an error
/// occurs.
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `gateway` - Telegram gateway for sending notifications
/// * `config` - Notifier configuration
/// * `shutdown` - Optional cancellation token for graceful shutdown
pub async fn run_notifier(
    pool: PgPool,
    gateway: TelegramGateway,
    config: Config,
    shutdown: Option<CancellationToken>,
) -> Result<()> {
    let db = NotifierDb::new(pool);

    info!(
        "Starting notifier: poll_interval={}s, max_retries={}, batch_size={}, reminder_lead={}h",
        config.poll_interval_secs,
        config.max_retry_count,
        config.batch_size,
        config.reminder_lead_hours
    );

    run_notifier_loop(db, gateway, config, shutdown).await
}

/// Main delivery loop
async fn run_notifier_loop(
    db: NotifierDb,
    gateway: TelegramGateway,
    config: Config,
    shutdown: Option<CancellationToken>,
) -> Result<()> {
    let poll_interval = Duration::from_secs(config.poll_interval_secs);
    let mut last_status_log = past_instant(config.status_log_interval_secs);
    let mut last_reminder_scan = past_instant(config.reminder_scan_interval_secs);
    let mut last_cleanup = Instant::now();

    loop {
        // Check for shutdown signal
        if let Some(ref token) = shutdown
            && token.is_cancelled()
        {
            info!("Notifier received shutdown signal");
            break;
        }

        if last_reminder_scan.elapsed() >= Duration::from_secs(config.reminder_scan_interval_secs)
        {
            match schedule_due_reminders(&db, &config).await {
                Ok(0) => {}
                Ok(scheduled) => info!("Scheduled {} booking reminders", scheduled),
                Err(e) => error!("Reminder scan failed: {}", e),
            }
            last_reminder_scan = Instant::now();
        }

        if last_cleanup.elapsed() >= Duration::from_secs(CLEANUP_INTERVAL_SECS) {
            match db.cleanup_old_messages().await {
                Ok(0) => {}
                Ok(purged) => info!("Purged {} old outbox jobs", purged),
                Err(e) => error!("Outbox cleanup failed: {}", e),
            }
            last_cleanup = Instant::now();
        }

        // Fetch pending jobs
        match db.fetch_pending_messages(config.batch_size).await {
            Ok(jobs) if jobs.is_empty() => {
                // No jobs to process, sleep
                tokio::time::sleep(poll_interval).await;
            }
            Ok(jobs) => {
                info!("Processing {} jobs", jobs.len());

                for job in jobs {
                    process_job(&db, &gateway, &config, job).await;
                }

                // Log queue status
                if last_status_log.elapsed() >= Duration::from_secs(config.status_log_interval_secs)
                {
                    if let Ok(pending) = db.count_pending().await
                        && pending > 0
                    {
                        info!("Queue status: {} pending jobs remaining", pending);
                    }
                    last_status_log = Instant::now();
                }
            }
            Err(e) => {
                error!("Failed to fetch pending jobs: {}", e);
                tokio::time::sleep(poll_interval).await;
            }
        }
    }

    Ok(())
}

/// Process a single job
async fn process_job(
    db: &NotifierDb,
    gateway: &TelegramGateway,
    config: &Config,
    job: db::OutboxMessage,
) {
    info!(
        "Processing job {} (type: {}, retry: {})",
        job.id, job.message_type, job.retry_count
    );

    match dispatch::process_message(db.pool(), gateway, config, &job).await {
        Ok(()) => {
            info!("Job {} delivered", job.id);

            if let Err(e) = db.mark_completed(job.id).await {
                error!("Failed to mark job {} as completed: {}", job.id, e);
            }
        }
        Err(e) => {
            warn!("Job {} failed: {}", job.id, e);
            let error_msg = e.to_string();

            if job.retry_count < config.max_retry_count {
                let backoff_minutes = 2_i64.pow((job.retry_count + 1) as u32);
                info!(
                    "Rescheduling job {} for retry {} in {} minutes",
                    job.id,
                    job.retry_count + 1,
                    backoff_minutes
                );

                if let Err(e) = db
                    .reschedule_for_retry(job.id, job.retry_count, &error_msg)
                    .await
                {
                    error!("Failed to reschedule job {}: {}", job.id, e);
                }
            } else {
                error!(
                    "Job {} exceeded max retries ({}), marking as failed",
                    job.id, config.max_retry_count
                );

                if let Err(e) = db.mark_failed(job.id, &error_msg).await {
                    error!("Failed to mark job {} as failed: {}", job.id, e);
                }
            }
        }
    }
}

/// Turn due confirmed bookings into reminder jobs
async fn schedule_due_reminders(db: &NotifierDb, config: &Config) -> Result<u64> {
    let due = db
        .due_reminder_ids(config.reminder_lead_hours, config.batch_size)
        .await?;

    let mut scheduled = 0;
    for booking_id in due {
        match db.enqueue_reminder(booking_id).await {
            Ok(true) => scheduled += 1,
            Ok(false) => {}
            Err(e) => error!("Failed to enqueue reminder for booking {}: {}", booking_id, e),
        }
    }
    Ok(scheduled)
}

fn past_instant(secs: u64) -> Instant {
    Instant::now()
        .checked_sub(Duration::from_secs(secs))
        .unwrap_or_else(Instant::now)
}
