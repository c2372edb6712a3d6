//! Conflict resolver
//!
//! Applies one client-proposed mutation against the versioned entity store.
//! The policy is last-writer-detects, not last-write-wins: the server never
//! overwrites a change it has not seen. A client whose version is behind
//! (or, defensively, ahead of) the server's gets a Conflict and is expected
//! to re-fetch, re-apply its business change, and resubmit.
//!
//! On success exactly one ledger entry commits atomically with the
//! mutation, and exactly one broadcast event fires after the commit.

use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use shared::models::Operation;
use shared::sync::{EntityPatch, ProposedChange};

use crate::db::{BoxError, ledger, store};
use crate::live::LiveHub;

/// Structured outcome of one proposed change.
///
/// Conflict and NotFound are expected branches of normal operation, not
/// errors; only storage failures propagate as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { version: i64 },
    Conflict { server_version: i64, client_version: i64 },
    NotFound,
}

/// Apply one proposed change for `tenant_id`, attributed to `actor_id`
pub async fn apply_change(
    pool: &SqlitePool,
    hub: &LiveHub,
    tenant_id: Uuid,
    actor_id: &str,
    change: &ProposedChange,
    now: i64,
) -> Result<ApplyOutcome, BoxError> {
    match change.operation {
        Operation::Insert => apply_insert(pool, hub, tenant_id, actor_id, change, now).await,
        Operation::Update => apply_update(pool, hub, tenant_id, actor_id, change, now).await,
        Operation::Delete => apply_delete(pool, hub, tenant_id, actor_id, change, now).await,
    }
}

fn parse_patch(change: &ProposedChange) -> Result<EntityPatch, BoxError> {
    let fields = change.fields.clone().unwrap_or_else(|| json!({}));
    Ok(EntityPatch::from_value(change.kind, fields)?)
}

async fn apply_insert(
    pool: &SqlitePool,
    hub: &LiveHub,
    tenant_id: Uuid,
    actor_id: &str,
    change: &ProposedChange,
    now: i64,
) -> Result<ApplyOutcome, BoxError> {
    let patch = parse_patch(change)?;

    let mut tx = pool.begin().await?;
    let rows = store::insert(&mut tx, tenant_id, change.id, &patch, now).await?;

    if rows == 0 {
        // Identity already exists: a retransmitted insert. Success, but no
        // second ledger entry and no event.
        drop(tx);
        let version = store::current_version(pool, change.kind, tenant_id, change.id)
            .await?
            .unwrap_or(1);
        return Ok(ApplyOutcome::Applied { version });
    }

    ledger::append(
        &mut tx,
        tenant_id,
        change.kind.table_name(),
        change.id,
        Operation::Insert,
        actor_id,
        now,
    )
    .await?;
    tx.commit().await?;

    publish_entity(pool, hub, tenant_id, change, "created").await;
    Ok(ApplyOutcome::Applied { version: 1 })
}

async fn apply_update(
    pool: &SqlitePool,
    hub: &LiveHub,
    tenant_id: Uuid,
    actor_id: &str,
    change: &ProposedChange,
    now: i64,
) -> Result<ApplyOutcome, BoxError> {
    let patch = parse_patch(change)?;
    let client_version = change.client_version.unwrap_or(0);

    let mut tx = pool.begin().await?;

    let Some(server_version) =
        store::current_version(&mut *tx, change.kind, tenant_id, change.id).await?
    else {
        return Ok(ApplyOutcome::NotFound);
    };

    if server_version != client_version {
        return Ok(ApplyOutcome::Conflict {
            server_version,
            client_version,
        });
    }

    let rows = store::update(&mut tx, tenant_id, change.id, &patch, client_version, now).await?;
    if rows == 0 {
        // Another writer got between our read and the guarded statement.
        drop(tx);
        let server_version = store::current_version(pool, change.kind, tenant_id, change.id)
            .await?
            .unwrap_or(server_version);
        return Ok(ApplyOutcome::Conflict {
            server_version,
            client_version,
        });
    }

    ledger::append(
        &mut tx,
        tenant_id,
        change.kind.table_name(),
        change.id,
        Operation::Update,
        actor_id,
        now,
    )
    .await?;
    tx.commit().await?;

    publish_entity(pool, hub, tenant_id, change, "updated").await;
    Ok(ApplyOutcome::Applied {
        version: client_version + 1,
    })
}

async fn apply_delete(
    pool: &SqlitePool,
    hub: &LiveHub,
    tenant_id: Uuid,
    actor_id: &str,
    change: &ProposedChange,
    now: i64,
) -> Result<ApplyOutcome, BoxError> {
    let client_version = change.client_version.unwrap_or(0);

    let mut tx = pool.begin().await?;

    let Some(server_version) =
        store::current_version(&mut *tx, change.kind, tenant_id, change.id).await?
    else {
        return Ok(ApplyOutcome::NotFound);
    };

    if server_version != client_version {
        return Ok(ApplyOutcome::Conflict {
            server_version,
            client_version,
        });
    }

    let rows = store::delete(&mut tx, change.kind, tenant_id, change.id, client_version).await?;
    if rows == 0 {
        drop(tx);
        let server_version = store::current_version(pool, change.kind, tenant_id, change.id)
            .await?
            .unwrap_or(server_version);
        return Ok(ApplyOutcome::Conflict {
            server_version,
            client_version,
        });
    }

    ledger::append(
        &mut tx,
        tenant_id,
        change.kind.table_name(),
        change.id,
        Operation::Delete,
        actor_id,
        now,
    )
    .await?;
    tx.commit().await?;

    hub.publish(
        tenant_id,
        &format!("{}-deleted", change.kind.event_prefix()),
        json!({ "id": change.id }),
    );
    Ok(ApplyOutcome::Applied {
        version: client_version,
    })
}

/// Broadcast the post-commit state of the entity. Best-effort: a failed
/// payload fetch drops the event, and catch-up sync covers the gap.
async fn publish_entity(
    pool: &SqlitePool,
    hub: &LiveHub,
    tenant_id: Uuid,
    change: &ProposedChange,
    verb: &str,
) {
    match store::fetch_value(pool, change.kind, tenant_id, change.id).await {
        Ok(Some(payload)) => {
            let event_type = format!("{}-{verb}", change.kind.event_prefix());
            hub.publish(tenant_id, &event_type, payload);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(
                kind = change.kind.table_name(),
                id = %change.id,
                "Skipping broadcast, payload fetch failed: {e}"
            );
        }
    }
}
