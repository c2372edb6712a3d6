//! Dining table storage

use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use shared::models::{DiningTable, DiningTablePatch};

use super::{BoxError, parse_uuid};

type Row = (String, String, String, i64, Option<String>, i64, i64, i64);

fn from_row(r: Row) -> Result<DiningTable, BoxError> {
    Ok(DiningTable {
        id: parse_uuid(&r.0)?,
        tenant_id: parse_uuid(&r.1)?,
        name: r.2,
        seats: r.3,
        description: r.4,
        version: r.5,
        created_at: r.6,
        updated_at: r.7,
    })
}

const COLUMNS: &str = "id, tenant_id, name, seats, description, version, created_at, updated_at";

pub async fn get(
    pool: &SqlitePool,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<Option<DiningTable>, BoxError> {
    let row: Option<Row> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM dining_tables WHERE tenant_id = ?1 AND id = ?2"
    ))
    .bind(tenant_id.to_string())
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

pub async fn list(pool: &SqlitePool, tenant_id: Uuid) -> Result<Vec<DiningTable>, BoxError> {
    let rows: Vec<Row> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM dining_tables WHERE tenant_id = ?1 ORDER BY name"
    ))
    .bind(tenant_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(from_row).collect()
}

pub async fn insert(
    tx: &mut Transaction<'_, Sqlite>,
    tenant_id: Uuid,
    id: Uuid,
    patch: &DiningTablePatch,
    now: i64,
) -> Result<u64, BoxError> {
    let result = sqlx::query(
        r#"
        INSERT INTO dining_tables (id, tenant_id, name, seats, description, version, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(id.to_string())
    .bind(tenant_id.to_string())
    .bind(patch.name.clone().unwrap_or_default())
    .bind(patch.seats.unwrap_or(4))
    .bind(&patch.description)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

pub async fn update(
    tx: &mut Transaction<'_, Sqlite>,
    tenant_id: Uuid,
    id: Uuid,
    patch: &DiningTablePatch,
    expected_version: i64,
    now: i64,
) -> Result<u64, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE dining_tables
        SET name = COALESCE(?1, name),
            seats = COALESCE(?2, seats),
            description = COALESCE(?3, description),
            version = version + 1,
            updated_at = ?4
        WHERE tenant_id = ?5 AND id = ?6 AND version = ?7
        "#,
    )
    .bind(&patch.name)
    .bind(patch.seats)
    .bind(&patch.description)
    .bind(now)
    .bind(tenant_id.to_string())
    .bind(id.to_string())
    .bind(expected_version)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
