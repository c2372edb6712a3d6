//! Customer storage

use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use shared::models::{Customer, CustomerPatch};

use super::{BoxError, parse_uuid};

type Row = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    i64,
    i64,
    i64,
    i64,
);

fn from_row(r: Row) -> Result<Customer, BoxError> {
    Ok(Customer {
        id: parse_uuid(&r.0)?,
        tenant_id: parse_uuid(&r.1)?,
        name: r.2,
        phone: r.3,
        email: r.4,
        loyalty_points: r.5,
        version: r.6,
        created_at: r.7,
        updated_at: r.8,
    })
}

const COLUMNS: &str =
    "id, tenant_id, name, phone, email, loyalty_points, version, created_at, updated_at";

pub async fn get(pool: &SqlitePool, tenant_id: Uuid, id: Uuid) -> Result<Option<Customer>, BoxError> {
    let row: Option<Row> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM customers WHERE tenant_id = ?1 AND id = ?2"
    ))
    .bind(tenant_id.to_string())
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

pub async fn list(pool: &SqlitePool, tenant_id: Uuid) -> Result<Vec<Customer>, BoxError> {
    let rows: Vec<Row> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM customers WHERE tenant_id = ?1 ORDER BY name"
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
    patch: &CustomerPatch,
    now: i64,
) -> Result<u64, BoxError> {
    let result = sqlx::query(
        r#"
        INSERT INTO customers (id, tenant_id, name, phone, email, loyalty_points, version, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(id.to_string())
    .bind(tenant_id.to_string())
    .bind(patch.name.clone().unwrap_or_default())
    .bind(&patch.phone)
    .bind(&patch.email)
    .bind(patch.loyalty_points.unwrap_or(0))
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

pub async fn update(
    tx: &mut Transaction<'_, Sqlite>,
    tenant_id: Uuid,
    id: Uuid,
    patch: &CustomerPatch,
    expected_version: i64,
    now: i64,
) -> Result<u64, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE customers
        SET name = COALESCE(?1, name),
            phone = COALESCE(?2, phone),
            email = COALESCE(?3, email),
            loyalty_points = COALESCE(?4, loyalty_points),
            version = version + 1,
            updated_at = ?5
        WHERE tenant_id = ?6 AND id = ?7 AND version = ?8
        "#,
    )
    .bind(&patch.name)
    .bind(&patch.phone)
    .bind(&patch.email)
    .bind(patch.loyalty_points)
    .bind(now)
    .bind(tenant_id.to_string())
    .bind(id.to_string())
    .bind(expected_version)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
