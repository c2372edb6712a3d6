//! Menu item storage
//!
//! Prices are TEXT decimal strings in storage, parsed to `Decimal` on read.

use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use shared::models::{MenuItem, MenuItemPatch};

use super::{BoxError, parse_decimal, parse_uuid};

type Row = (
    String,
    String,
    String,
    String,
    Option<String>,
    bool,
    i64,
    i64,
    i64,
    i64,
);

fn from_row(r: Row) -> Result<MenuItem, BoxError> {
    Ok(MenuItem {
        id: parse_uuid(&r.0)?,
        tenant_id: parse_uuid(&r.1)?,
        name: r.2,
        price: parse_decimal(&r.3)?,
        description: r.4,
        is_active: r.5,
        stock_quantity: r.6,
        version: r.7,
        created_at: r.8,
        updated_at: r.9,
    })
}

const COLUMNS: &str = "id, tenant_id, name, price, description, is_active, stock_quantity, version, created_at, updated_at";

pub async fn get(pool: &SqlitePool, tenant_id: Uuid, id: Uuid) -> Result<Option<MenuItem>, BoxError> {
    let row: Option<Row> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM menu_items WHERE tenant_id = ?1 AND id = ?2"
    ))
    .bind(tenant_id.to_string())
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

pub async fn list(pool: &SqlitePool, tenant_id: Uuid) -> Result<Vec<MenuItem>, BoxError> {
    let rows: Vec<Row> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM menu_items WHERE tenant_id = ?1 ORDER BY name"
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
    patch: &MenuItemPatch,
    now: i64,
) -> Result<u64, BoxError> {
    let result = sqlx::query(
        r#"
        INSERT INTO menu_items (id, tenant_id, name, price, description, is_active, stock_quantity, version, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(id.to_string())
    .bind(tenant_id.to_string())
    .bind(patch.name.clone().unwrap_or_default())
    .bind(patch.price.unwrap_or_default().to_string())
    .bind(&patch.description)
    .bind(patch.is_active.unwrap_or(true))
    .bind(patch.stock_quantity.unwrap_or(0))
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

pub async fn update(
    tx: &mut Transaction<'_, Sqlite>,
    tenant_id: Uuid,
    id: Uuid,
    patch: &MenuItemPatch,
    expected_version: i64,
    now: i64,
) -> Result<u64, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE menu_items
        SET name = COALESCE(?1, name),
            price = COALESCE(?2, price),
            description = COALESCE(?3, description),
            is_active = COALESCE(?4, is_active),
            stock_quantity = COALESCE(?5, stock_quantity),
            version = version + 1,
            updated_at = ?6
        WHERE tenant_id = ?7 AND id = ?8 AND version = ?9
        "#,
    )
    .bind(&patch.name)
    .bind(patch.price.map(|p| p.to_string()))
    .bind(&patch.description)
    .bind(patch.is_active)
    .bind(patch.stock_quantity)
    .bind(now)
    .bind(tenant_id.to_string())
    .bind(id.to_string())
    .bind(expected_version)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
