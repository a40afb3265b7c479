//! Outbox persistence for the notifier
//!
//! Claims use `FOR UPDATE SKIP LOCKED` so concurrently running notifier
//! instances never double-send a job. The reminder scan uses the same
//! guarded-update idiom as the transition engine: marking
//! `reminder_sent_at` and enqueueing the job commit together.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use dockline_core::format::BookingDigest;
use dockline_core::models::{Booking, message_types};

/// Completed and failed jobs older than this are purged
const CLEANUP_RETENTION_DAYS: i64 = 90;

/// Notification job claimed from the outbox
#[derive(Debug, Clone, FromRow)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub message_type: String,
    pub payload: Value,
    pub retry_count: i32,
}

/// Database handle for the notifier loop
#[derive(Clone)]
pub struct NotifierDb {
    pool: PgPool,
}

impl NotifierDb {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Claim a batch of due jobs, moving them to `processing`
    pub async fn fetch_pending_messages(
        &self,
        batch_size: i64,
    ) -> Result<Vec<OutboxMessage>, sqlx::Error> {
        sqlx::query_as::<_, OutboxMessage>(
            r#"
            UPDATE outbox_messages
            SET status = 'processing'
            WHERE id IN (
                SELECT id FROM outbox_messages
                WHERE status = 'pending'
                  AND scheduled_at <= NOW()
                ORDER BY scheduled_at
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, message_type, payload, retry_count
            "#,
        )
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await
    }

    /// Mark a job as delivered
    pub async fn mark_completed(&self, message_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE outbox_messages
            SET status = 'completed',
                processed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark a job as permanently failed
    pub async fn mark_failed(&self, message_id: Uuid, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE outbox_messages
            SET status = 'failed',
                last_error = $2,
                processed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Push a job back to `pending` with exponential backoff
    pub async fn reschedule_for_retry(
        &self,
        message_id: Uuid,
        current_retry_count: i32,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        let next_retry = current_retry_count + 1;
        let backoff_minutes = 2_i64.pow(next_retry as u32);
        let next_scheduled = Utc::now() + Duration::minutes(backoff_minutes);

        sqlx::query(
            r#"
            UPDATE outbox_messages
            SET status = 'pending',
                retry_count = $2,
                scheduled_at = $3,
                last_error = $4
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .bind(next_retry)
        .bind(next_scheduled)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Jobs still waiting in the queue
    pub async fn count_pending(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM outbox_messages WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await
    }

    /// Purge completed and failed jobs past the retention window
    pub async fn cleanup_old_messages(&self) -> Result<u64, sqlx::Error> {
        let cutoff = Utc::now() - Duration::days(CLEANUP_RETENTION_DAYS);

        let result = sqlx::query(
            r#"
            DELETE FROM outbox_messages
            WHERE (status = 'completed' OR status = 'failed')
              AND processed_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Confirmed bookings departing inside the lead window that have not
    /// been reminded yet
    pub async fn due_reminder_ids(
        &self,
        lead_hours: i32,
        limit: i64,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT id FROM bookings
            WHERE status = 'confirmed'
              AND reminder_sent_at IS NULL
              AND start_time > NOW()
              AND start_time <= NOW() + make_interval(hours => $1)
            ORDER BY start_time
            LIMIT $2
            "#,
        )
        .bind(lead_hours)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Claim one booking's reminder slot and enqueue the job
    ///
    /// Returns whether a reminder job was enqueued. The guard re-checks
    /// status and the dedup marker, so a booking cancelled or already
    /// reminded since the scan selected it is skipped. Bookings with no
    /// Telegram-linked client are still marked: there is nowhere to
    /// deliver their reminder, and re-scanning them forever helps nobody.
    pub async fn enqueue_reminder(&self, booking_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let Some(booking) = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET reminder_sent_at = NOW()
            WHERE id = $1
              AND status = 'confirmed'
              AND reminder_sent_at IS NULL
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            tracing::debug!(%booking_id, "reminder slot already claimed");
            return Ok(false);
        };

        let client = match booking.user_id {
            Some(user_id) => {
                sqlx::query_as::<_, (Option<i64>, String)>(
                    "SELECT telegram_id, display_name FROM profiles WHERE id = $1",
                )
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
            }
            None => None,
        };

        let Some((Some(_), display_name)) = client else {
            tracing::debug!(%booking_id, "no telegram channel for reminder");
            tx.commit().await?;
            return Ok(false);
        };

        let boat_name: String = sqlx::query_scalar("SELECT name FROM boats WHERE id = $1")
            .bind(booking.boat_id)
            .fetch_one(&mut *tx)
            .await?;

        let digest = BookingDigest {
            booking_id: booking.id,
            boat_id: booking.boat_id,
            boat_name,
            user_id: booking.user_id,
            status: booking.status,
            previous_status: None,
            start_time: booking.start_time,
            end_time: booking.end_time,
            price: booking.price,
            client_name: booking.guest_name.unwrap_or(display_name),
            client_phone: booking.guest_phone,
            changed_by: None,
        };
        let payload = serde_json::to_value(&digest).context("serializing reminder digest")?;

        sqlx::query("INSERT INTO outbox_messages (message_type, payload) VALUES ($1, $2)")
            .bind(message_types::BOOKING_REMINDER)
            .bind(payload)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
