//! Reconciliation protocol
//!
//! One round trip per catch-up: the client sends everything it changed
//! since its last sync plus its watermark, the server applies each change
//! through the [`resolver`], and the response carries per-change results,
//! the ledger entries the client missed, and a fresh watermark.

pub mod resolver;

use sqlx::SqlitePool;
use uuid::Uuid;

use shared::sync::{ChangeResult, SyncRequest, SyncResponse};
use shared::util::now_millis;

use crate::db::{BoxError, ledger};
use crate::live::LiveHub;
use resolver::ApplyOutcome;

/// Run one reconciliation round for a tenant.
///
/// Changes apply strictly in request order, each in its own transaction. A
/// change that fails does not abort the batch: it reports its own result
/// and the rest proceed. Only storage-level failures bubble up as `Err`.
pub async fn reconcile(
    pool: &SqlitePool,
    hub: &LiveHub,
    tenant_id: Uuid,
    actor_id: &str,
    request: &SyncRequest,
) -> Result<SyncResponse, BoxError> {
    let mut results = Vec::with_capacity(request.proposed_changes.len());

    for change in &request.proposed_changes {
        let now = now_millis();
        let result = match resolver::apply_change(pool, hub, tenant_id, actor_id, change, now).await
        {
            Ok(ApplyOutcome::Applied { version }) => ChangeResult::success(change.id, version),
            Ok(ApplyOutcome::Conflict {
                server_version,
                client_version,
            }) => {
                tracing::debug!(
                    kind = change.kind.table_name(),
                    id = %change.id,
                    server_version,
                    client_version,
                    "Version conflict, change rejected"
                );
                ChangeResult::conflict(change.id, server_version, client_version)
            }
            Ok(ApplyOutcome::NotFound) => ChangeResult::error(
                change.id,
                format!("{} {} not found", change.kind.table_name(), change.id),
            ),
            Err(e) => {
                tracing::warn!(
                    kind = change.kind.table_name(),
                    id = %change.id,
                    "Change failed: {e}"
                );
                ChangeResult::error(change.id, e.to_string())
            }
        };
        results.push(result);
    }

    // The watermark is taken after the writes so every entry this round
    // produced is covered by it and will not resurface next round.
    let sync_time = now_millis();
    let server_changes = ledger::list_since(pool, tenant_id, request.last_sync_time.unwrap_or(0))
        .await?;

    Ok(SyncResponse {
        results,
        server_changes,
        sync_time,
    })
}
