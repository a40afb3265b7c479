//! Outbox repository for database operations
//!
//! Notification jobs are inserted in the same transaction as the state
//! change they describe, so a rolled-back transition never leaves a job
//! behind and a committed one always leaves exactly one.

use crate::error::ApiError;
use uuid::Uuid;

/// Enqueue a notification job inside a transaction
pub async fn enqueue_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    message_type: &str,
    payload: &serde_json::Value,
) -> Result<Uuid, ApiError> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO outbox_messages (message_type, payload)
        VALUES ($1, $2)
        RETURNING id
        "#,
    )
    .bind(message_type)
    .bind(payload)
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}
