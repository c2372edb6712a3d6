//! Customer endpoints

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use uuid::Uuid;

use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Customer, EntityKind};

use crate::api::entities::{self, DeleteEntityQuery, UpdateEntityRequest};
use crate::api::Identity;
use crate::db::store::customer;
use crate::state::AppState;

const KIND: EntityKind = EntityKind::Customer;

/// GET /api/customers
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<Customer>>>, AppError> {
    let customers = customer::list(&state.pool, identity.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list customers: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;
    Ok(Json(ApiResponse::success(customers)))
}

/// POST /api/customers
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(fields): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<Customer>>, AppError> {
    let id = entities::create(&state, &identity, KIND, fields).await?;
    let customer = customer::get(&state.pool, identity.tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to read back customer: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::InternalError))?;
    Ok(Json(ApiResponse::success(customer)))
}

/// PUT /api/customers/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEntityRequest>,
) -> Result<Json<ApiResponse<Customer>>, AppError> {
    entities::update(&state, &identity, KIND, id, req).await?;
    let customer = customer::get(&state.pool, identity.tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to read back customer: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::not_found("customers"))?;
    Ok(Json(ApiResponse::success(customer)))
}

/// DELETE /api/customers/{id}?version=N
pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteEntityQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    entities::remove(&state, &identity, KIND, id, query.version).await?;
    Ok(Json(ApiResponse::ok()))
}
