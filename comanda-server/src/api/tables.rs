//! Dining table endpoints

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use uuid::Uuid;

use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{DiningTable, EntityKind};

use crate::api::entities::{self, DeleteEntityQuery, UpdateEntityRequest};
use crate::api::Identity;
use crate::db::store::dining_table;
use crate::state::AppState;

const KIND: EntityKind = EntityKind::Table;

/// GET /api/tables
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<DiningTable>>>, AppError> {
    let tables = dining_table::list(&state.pool, identity.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list tables: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;
    Ok(Json(ApiResponse::success(tables)))
}

/// POST /api/tables
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(fields): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<DiningTable>>, AppError> {
    let id = entities::create(&state, &identity, KIND, fields).await?;
    let table = dining_table::get(&state.pool, identity.tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to read back table: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::InternalError))?;
    Ok(Json(ApiResponse::success(table)))
}

/// PUT /api/tables/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEntityRequest>,
) -> Result<Json<ApiResponse<DiningTable>>, AppError> {
    entities::update(&state, &identity, KIND, id, req).await?;
    let table = dining_table::get(&state.pool, identity.tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to read back table: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::not_found("dining_tables"))?;
    Ok(Json(ApiResponse::success(table)))
}

/// DELETE /api/tables/{id}?version=N
pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteEntityQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    entities::remove(&state, &identity, KIND, id, query.version).await?;
    Ok(Json(ApiResponse::ok()))
}
