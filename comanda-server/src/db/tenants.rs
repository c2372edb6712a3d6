//! Tenant registration and lookup

use sqlx::SqlitePool;
use uuid::Uuid;

use shared::models::Tenant;

use super::BoxError;
use super::store::parse_uuid;

/// Register a new tenant
pub async fn create(pool: &SqlitePool, name: &str, now: i64) -> Result<Tenant, BoxError> {
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO tenants (id, name, created_at) VALUES (?1, ?2, ?3)")
        .bind(id.to_string())
        .bind(name)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(Tenant {
        id,
        name: name.to_string(),
        created_at: now,
    })
}

pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Tenant>, BoxError> {
    let row: Option<(String, String, i64)> =
        sqlx::query_as("SELECT id, name, created_at FROM tenants WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(pool)
            .await?;

    row.map(|(id, name, created_at)| {
        Ok(Tenant {
            id: parse_uuid(&id)?,
            name,
            created_at,
        })
    })
    .transpose()
}
