//! Menu item endpoints
//!
//! Deleting a menu item that historical order lines reference is rejected
//! by the foreign key; the intended flow for retiring an item is an update
//! with `is_active: false`.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use uuid::Uuid;

use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{EntityKind, MenuItem};

use crate::api::entities::{self, DeleteEntityQuery, UpdateEntityRequest};
use crate::api::Identity;
use crate::db::store::menu_item;
use crate::state::AppState;

const KIND: EntityKind = EntityKind::MenuItem;

/// GET /api/menu-items
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<MenuItem>>>, AppError> {
    let items = menu_item::list(&state.pool, identity.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list menu items: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;
    Ok(Json(ApiResponse::success(items)))
}

/// POST /api/menu-items
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(fields): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<MenuItem>>, AppError> {
    let id = entities::create(&state, &identity, KIND, fields).await?;
    let item = menu_item::get(&state.pool, identity.tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to read back menu item: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::InternalError))?;
    Ok(Json(ApiResponse::success(item)))
}

/// PUT /api/menu-items/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEntityRequest>,
) -> Result<Json<ApiResponse<MenuItem>>, AppError> {
    entities::update(&state, &identity, KIND, id, req).await?;
    let item = menu_item::get(&state.pool, identity.tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to read back menu item: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::not_found("menu_items"))?;
    Ok(Json(ApiResponse::success(item)))
}

/// DELETE /api/menu-items/{id}?version=N
pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteEntityQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    entities::remove(&state, &identity, KIND, id, query.version).await?;
    Ok(Json(ApiResponse::ok()))
}
