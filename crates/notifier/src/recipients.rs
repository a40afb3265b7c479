//! Recipient resolution for notification fan-out
//!
//! Every event must reach at least one human. Managerless boats fall
//! back to the admin chat; duplicate delivery is tolerated, silent
//! loss is not.

use sqlx::PgPool;
use uuid::Uuid;

/// Telegram chats for the managers of a boat, in registration order
///
/// Falls back to the admin chat when no manager has a linked Telegram
/// account.
pub async fn resolve_recipients(
    pool: &PgPool,
    boat_id: Uuid,
    admin_chat_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    let chats: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT p.telegram_id
        FROM boat_managers bm
        JOIN profiles p ON p.id = bm.user_id
        WHERE bm.boat_id = $1
          AND p.telegram_id IS NOT NULL
        ORDER BY bm.created_at, p.id
        "#,
    )
    .bind(boat_id)
    .fetch_all(pool)
    .await?;

    if chats.is_empty() {
        return Ok(vec![admin_chat_id]);
    }
    Ok(chats)
}

/// Telegram chat for the client behind a booking, when one is linked
pub async fn resolve_client(
    pool: &PgPool,
    user_id: Option<Uuid>,
) -> Result<Option<i64>, sqlx::Error> {
    let Some(user_id) = user_id else {
        return Ok(None);
    };

    let chat: Option<Option<i64>> =
        sqlx::query_scalar("SELECT telegram_id FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(chat.flatten())
}

/// Telegram chats for clients holding confirmed bookings on a trip
pub async fn resolve_trip_participants(
    pool: &PgPool,
    trip_id: Uuid,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT p.telegram_id
        FROM group_trip_bookings gtb
        JOIN profiles p ON p.id = gtb.user_id
        WHERE gtb.group_trip_id = $1
          AND gtb.status = 'confirmed'
          AND p.telegram_id IS NOT NULL
        ORDER BY gtb.created_at
        "#,
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await
}
