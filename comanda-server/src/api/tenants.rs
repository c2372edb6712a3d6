//! Tenant registration

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::Tenant;
use shared::util::now_millis;

use crate::db::tenants;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterTenantRequest {
    pub name: String,
}

/// POST /api/tenants
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterTenantRequest>,
) -> Result<Json<ApiResponse<Tenant>>, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Tenant name must not be empty"));
    }

    let tenant = tenants::create(&state.pool, name, now_millis())
        .await
        .map_err(|e| {
            tracing::error!("Failed to register tenant: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    tracing::info!(tenant_id = %tenant.id, name = %tenant.name, "Tenant registered");
    Ok(Json(ApiResponse::success(tenant)))
}
