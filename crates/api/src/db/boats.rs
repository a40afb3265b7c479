//! Boat repository for database operations

use crate::error::ApiError;
use dockline_core::models::Boat;
use sqlx::PgPool;
use uuid::Uuid;

/// Get boat by ID
pub async fn get_boat(pool: &PgPool, boat_id: Uuid) -> Result<Boat, ApiError> {
    let boat = sqlx::query_as::<_, Boat>("SELECT * FROM boats WHERE id = $1")
        .bind(boat_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Boat not found: {}", boat_id)))?;

    Ok(boat)
}

/// Get boat by ID inside a transaction
pub async fn get_boat_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    boat_id: Uuid,
) -> Result<Boat, ApiError> {
    let boat = sqlx::query_as::<_, Boat>("SELECT * FROM boats WHERE id = $1")
        .bind(boat_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Boat not found: {}", boat_id)))?;

    Ok(boat)
}

/// Check whether a profile manages a boat
///
/// Authorization checks are always answered from the database, never
/// from a cache, so a revoked manager loses access immediately.
pub async fn is_boat_manager_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    boat_id: Uuid,
    user_id: Uuid,
) -> Result<bool, ApiError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM boat_managers WHERE boat_id = $1 AND user_id = $2)",
    )
    .bind(boat_id)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(exists)
}
