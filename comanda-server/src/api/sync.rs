//! Reconciliation endpoint

use axum::extract::State;
use axum::{Extension, Json};

use shared::error::{AppError, ErrorCode};
use shared::sync::{SyncRequest, SyncResponse};

use crate::api::Identity;
use crate::state::AppState;
use crate::sync;

/// POST /api/sync
///
/// The response is the raw protocol envelope, not the ApiResponse wrapper:
/// sync clients speak this exchange format on every transport.
pub async fn handle_sync(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, AppError> {
    let response = sync::reconcile(
        &state.pool,
        &state.hub,
        identity.tenant_id,
        &identity.actor_id,
        &request,
    )
    .await
    .map_err(|e| {
        tracing::error!(tenant_id = %identity.tenant_id, "Sync round failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    tracing::debug!(
        tenant_id = %identity.tenant_id,
        applied = response.results.len(),
        server_changes = response.server_changes.len(),
        "Sync round complete"
    );
    Ok(Json(response))
}
