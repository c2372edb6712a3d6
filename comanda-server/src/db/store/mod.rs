//! Versioned entity store
//!
//! One file per entity kind, each with fixed SQL for its field whitelist.
//! Updates and deletes are guarded compare-and-increment statements
//! (`... WHERE version = ?`): the version check, field application, and
//! increment happen in a single statement, so no interleaving writer can
//! observe or produce an intermediate state. Guarded operations run on a
//! caller-supplied transaction so the ledger append commits atomically
//! with the mutation.

pub mod customer;
pub mod dining_table;
pub mod menu_item;

use rust_decimal::Decimal;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use shared::models::EntityKind;
use shared::sync::EntityPatch;

use super::BoxError;

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, BoxError> {
    Ok(Uuid::parse_str(s)?)
}

pub(crate) fn parse_decimal(s: &str) -> Result<Decimal, BoxError> {
    use std::str::FromStr;
    Ok(Decimal::from_str(s)?)
}

/// Read the stored version of an entity, if it exists.
///
/// Works on both pools and open transactions.
pub async fn current_version<'e, E>(
    executor: E,
    kind: EntityKind,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<Option<i64>, BoxError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = match kind {
        EntityKind::Table => "SELECT version FROM dining_tables WHERE tenant_id = ?1 AND id = ?2",
        EntityKind::MenuItem => "SELECT version FROM menu_items WHERE tenant_id = ?1 AND id = ?2",
        EntityKind::Customer => "SELECT version FROM customers WHERE tenant_id = ?1 AND id = ?2",
    };

    let row: Option<(i64,)> = sqlx::query_as(sql)
        .bind(tenant_id.to_string())
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

    Ok(row.map(|(v,)| v))
}

/// Insert with version = 1. Returns the number of rows written: 0 means the
/// identity already exists (idempotent retransmission, not an error).
pub async fn insert(
    tx: &mut Transaction<'_, Sqlite>,
    tenant_id: Uuid,
    id: Uuid,
    patch: &EntityPatch,
    now: i64,
) -> Result<u64, BoxError> {
    match patch {
        EntityPatch::Table(p) => dining_table::insert(tx, tenant_id, id, p, now).await,
        EntityPatch::MenuItem(p) => menu_item::insert(tx, tenant_id, id, p, now).await,
        EntityPatch::Customer(p) => customer::insert(tx, tenant_id, id, p, now).await,
    }
}

/// Guarded update: applies the patch and increments version if and only if
/// the stored version equals `expected_version`. Returns rows affected.
pub async fn update(
    tx: &mut Transaction<'_, Sqlite>,
    tenant_id: Uuid,
    id: Uuid,
    patch: &EntityPatch,
    expected_version: i64,
    now: i64,
) -> Result<u64, BoxError> {
    match patch {
        EntityPatch::Table(p) => {
            dining_table::update(tx, tenant_id, id, p, expected_version, now).await
        }
        EntityPatch::MenuItem(p) => {
            menu_item::update(tx, tenant_id, id, p, expected_version, now).await
        }
        EntityPatch::Customer(p) => {
            customer::update(tx, tenant_id, id, p, expected_version, now).await
        }
    }
}

/// Guarded delete with the same version check as update. Returns rows affected.
pub async fn delete(
    tx: &mut Transaction<'_, Sqlite>,
    kind: EntityKind,
    tenant_id: Uuid,
    id: Uuid,
    expected_version: i64,
) -> Result<u64, BoxError> {
    let sql = match kind {
        EntityKind::Table => {
            "DELETE FROM dining_tables WHERE tenant_id = ?1 AND id = ?2 AND version = ?3"
        }
        EntityKind::MenuItem => {
            "DELETE FROM menu_items WHERE tenant_id = ?1 AND id = ?2 AND version = ?3"
        }
        EntityKind::Customer => {
            "DELETE FROM customers WHERE tenant_id = ?1 AND id = ?2 AND version = ?3"
        }
    };

    let result = sqlx::query(sql)
        .bind(tenant_id.to_string())
        .bind(id.to_string())
        .bind(expected_version)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

/// Fetch an entity as a JSON value, for broadcast payloads
pub async fn fetch_value(
    pool: &SqlitePool,
    kind: EntityKind,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<Option<serde_json::Value>, BoxError> {
    Ok(match kind {
        EntityKind::Table => dining_table::get(pool, tenant_id, id)
            .await?
            .map(|t| serde_json::to_value(t))
            .transpose()?,
        EntityKind::MenuItem => menu_item::get(pool, tenant_id, id)
            .await?
            .map(|m| serde_json::to_value(m))
            .transpose()?,
        EntityKind::Customer => customer::get(pool, tenant_id, id)
            .await?
            .map(|c| serde_json::to_value(c))
            .transpose()?,
    })
}
