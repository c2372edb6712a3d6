//! Order endpoints

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{CreateOrder, Order, OrderStatus};
use shared::util::now_millis;

use crate::api::Identity;
use crate::db::orders;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleOrderRequest {
    pub payment_method: String,
    pub amount_paid: Decimal,
}

/// GET /api/orders?status=pending
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>, AppError> {
    let orders = orders::list_orders(&state.pool, identity.tenant_id, query.status)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list orders: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;
    Ok(Json(ApiResponse::success(orders)))
}

/// GET /api/orders/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order = orders::get_order(&state.pool, identity.tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!(order_id = %id, "Failed to fetch order: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateOrder>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order = orders::create_order(
        &state.pool,
        &state.hub,
        identity.tenant_id,
        &identity.actor_id,
        &req,
        now_millis(),
    )
    .await
    .map_err(AppError::from)?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/orders/{id}/settle
pub async fn settle(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<SettleOrderRequest>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    if req.amount_paid < Decimal::ZERO {
        return Err(AppError::validation("Amount paid must not be negative"));
    }
    let order = orders::settle_order(
        &state.pool,
        &state.hub,
        identity.tenant_id,
        &identity.actor_id,
        id,
        &req.payment_method,
        req.amount_paid,
        now_millis(),
    )
    .await
    .map_err(AppError::from)?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order = orders::cancel_order(
        &state.pool,
        &state.hub,
        identity.tenant_id,
        &identity.actor_id,
        id,
        now_millis(),
    )
    .await
    .map_err(AppError::from)?;
    Ok(Json(ApiResponse::success(order)))
}
