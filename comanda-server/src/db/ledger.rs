//! Change ledger operations
//!
//! `append` takes a transaction, never a pool: a ledger entry must commit
//! atomically with the mutation it records, or not at all. A committed
//! mutation without its entry would be invisible to catch-up sync.

use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use shared::error::AppError;
use shared::models::{LedgerEntry, Operation};

use super::BoxError;
use super::store::parse_uuid;

/// Append one entry as part of the enclosing mutation's transaction
pub async fn append(
    tx: &mut Transaction<'_, Sqlite>,
    tenant_id: Uuid,
    entity_kind: &str,
    entity_id: Uuid,
    operation: Operation,
    actor_id: &str,
    now: i64,
) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        INSERT INTO sync_ledger (tenant_id, entity_kind, entity_id, operation, actor_id, committed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(tenant_id.to_string())
    .bind(entity_kind)
    .bind(entity_id.to_string())
    .bind(operation.as_str())
    .bind(actor_id)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Entries strictly newer than `since`, ascending by commit order
pub async fn list_since(
    pool: &SqlitePool,
    tenant_id: Uuid,
    since: i64,
) -> Result<Vec<LedgerEntry>, BoxError> {
    let rows: Vec<(i64, String, String, String, String, String, i64)> = sqlx::query_as(
        r#"
        SELECT id, tenant_id, entity_kind, entity_id, operation, actor_id, committed_at
        FROM sync_ledger
        WHERE tenant_id = ?1 AND committed_at > ?2
        ORDER BY committed_at ASC, id ASC
        "#,
    )
    .bind(tenant_id.to_string())
    .bind(since)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, tenant, kind, entity, op, actor, at)| {
            Ok(LedgerEntry {
                id,
                tenant_id: parse_uuid(&tenant)?,
                entity_kind: kind,
                entity_id: parse_uuid(&entity)?,
                operation: Operation::parse(&op)
                    .ok_or_else(|| AppError::internal(format!("bad ledger operation: {op}")))?,
                actor_id: actor,
                committed_at: at,
            })
        })
        .collect()
}
