//! Shared handler plumbing for the versioned entity collections
//!
//! REST writes go through the same resolver as sync, so every mutation gets
//! the same version check, ledger entry, and broadcast regardless of which
//! door it came in.

use serde::Deserialize;
use uuid::Uuid;

use shared::error::{AppError, ErrorCode};
use shared::models::{EntityKind, Operation};
use shared::sync::ProposedChange;
use shared::util::now_millis;

use crate::api::Identity;
use crate::state::AppState;
use crate::sync::resolver::{self, ApplyOutcome};

/// Body of a PUT on an entity
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateEntityRequest {
    /// The version the client last observed
    pub version: i64,
    pub fields: serde_json::Value,
}

/// Query string of a DELETE on an entity
#[derive(Debug, Deserialize)]
pub struct DeleteEntityQuery {
    pub version: i64,
}

fn map_parse_error(kind: EntityKind, e: &dyn std::fmt::Display) -> AppError {
    AppError::validation(format!("invalid {} fields: {e}", kind.table_name()))
}

/// Create an entity with a server-generated id. Returns the new id.
pub async fn create(
    state: &AppState,
    identity: &Identity,
    kind: EntityKind,
    fields: serde_json::Value,
) -> Result<Uuid, AppError> {
    let id = Uuid::new_v4();
    let change = ProposedChange {
        kind,
        id,
        operation: Operation::Insert,
        fields: Some(fields),
        client_version: None,
    };

    match resolver::apply_change(
        &state.pool,
        &state.hub,
        identity.tenant_id,
        &identity.actor_id,
        &change,
        now_millis(),
    )
    .await
    {
        Ok(ApplyOutcome::Applied { .. }) => Ok(id),
        Ok(other) => {
            // A fresh UUID cannot conflict or be missing
            tracing::error!(kind = kind.table_name(), ?other, "Unexpected insert outcome");
            Err(AppError::new(ErrorCode::InternalError))
        }
        Err(e) => {
            if e.downcast_ref::<serde_json::Error>().is_some() {
                return Err(map_parse_error(kind, &e));
            }
            tracing::error!(kind = kind.table_name(), "Create failed: {e}");
            Err(AppError::new(ErrorCode::InternalError))
        }
    }
}

/// Apply a guarded update. Returns the new version.
pub async fn update(
    state: &AppState,
    identity: &Identity,
    kind: EntityKind,
    id: Uuid,
    req: UpdateEntityRequest,
) -> Result<i64, AppError> {
    let change = ProposedChange {
        kind,
        id,
        operation: Operation::Update,
        fields: Some(req.fields),
        client_version: Some(req.version),
    };
    apply_guarded(state, identity, kind, &change).await
}

/// Apply a guarded delete. Returns the version that was removed.
pub async fn remove(
    state: &AppState,
    identity: &Identity,
    kind: EntityKind,
    id: Uuid,
    version: i64,
) -> Result<i64, AppError> {
    let change = ProposedChange {
        kind,
        id,
        operation: Operation::Delete,
        fields: None,
        client_version: Some(version),
    };
    apply_guarded(state, identity, kind, &change).await
}

async fn apply_guarded(
    state: &AppState,
    identity: &Identity,
    kind: EntityKind,
    change: &ProposedChange,
) -> Result<i64, AppError> {
    match resolver::apply_change(
        &state.pool,
        &state.hub,
        identity.tenant_id,
        &identity.actor_id,
        change,
        now_millis(),
    )
    .await
    {
        Ok(ApplyOutcome::Applied { version }) => Ok(version),
        Ok(ApplyOutcome::Conflict {
            server_version,
            client_version,
        }) => Err(AppError::version_conflict(server_version, client_version)),
        Ok(ApplyOutcome::NotFound) => Err(AppError::not_found(kind.table_name())),
        Err(e) => {
            if e.downcast_ref::<serde_json::Error>().is_some() {
                return Err(map_parse_error(kind, &e));
            }
            tracing::error!(kind = kind.table_name(), id = %change.id, "Write failed: {e}");
            Err(AppError::new(ErrorCode::InternalError))
        }
    }
}
