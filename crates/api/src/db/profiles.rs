//! Profile repository for database operations

use crate::error::ApiError;
use dockline_core::models::Profile;
use sqlx::PgPool;
use uuid::Uuid;

/// Get profile by ID
pub async fn get_profile(pool: &PgPool, profile_id: Uuid) -> Result<Profile, ApiError> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(profile_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile not found: {}", profile_id)))?;

    Ok(profile)
}

/// Get profile by ID inside a transaction
pub async fn get_profile_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    profile_id: Uuid,
) -> Result<Profile, ApiError> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(profile_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile not found: {}", profile_id)))?;

    Ok(profile)
}

/// Get profile by Telegram ID
pub async fn get_profile_by_telegram_id(
    pool: &PgPool,
    telegram_id: i64,
) -> Result<Option<Profile>, ApiError> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE telegram_id = $1")
        .bind(telegram_id)
        .fetch_optional(pool)
        .await?;

    Ok(profile)
}
