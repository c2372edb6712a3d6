//! API routes for comanda-server

pub mod customers;
pub mod entities;
pub mod health;
pub mod menu;
pub mod orders;
pub mod sync;
pub mod tables;
pub mod tenants;
pub mod ws;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use axum::extract::{Request, State};
use axum::middleware::Next;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use shared::error::{AppError, ErrorCode};

use crate::db::tenants as tenant_store;
use crate::state::AppState;

/// Authenticated caller identity, injected by [`identity_middleware`]
#[derive(Debug, Clone)]
pub struct Identity {
    pub tenant_id: Uuid,
    pub actor_id: String,
}

/// Middleware that resolves the caller's tenant from request headers.
///
/// Expects `X-Tenant-Id` (a registered tenant UUID) and `X-Actor-Id` (an
/// opaque device/user identifier used for change attribution).
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let tenant_header = request
        .headers()
        .get("X-Tenant-Id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated).into_response())?;

    let tenant_id = Uuid::parse_str(tenant_header)
        .map_err(|_| AppError::new(ErrorCode::NotAuthenticated).into_response())?;

    let actor_id = request
        .headers()
        .get("X-Actor-Id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated).into_response())?
        .to_string();

    tenant_store::get(&state.pool, tenant_id)
        .await
        .map_err(|e| {
            tracing::error!(tenant_id = %tenant_id, "Tenant lookup failed: {e}");
            AppError::new(ErrorCode::InternalError).into_response()
        })?
        .ok_or_else(|| AppError::new(ErrorCode::TenantNotFound).into_response())?;

    request.extensions_mut().insert(Identity {
        tenant_id,
        actor_id,
    });
    Ok(next.run(request).await)
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Everything tenant-scoped goes behind the identity middleware
    let tenant_scoped = Router::new()
        .route("/api/tables", get(tables::list).post(tables::create))
        .route(
            "/api/tables/{id}",
            put(tables::update).delete(tables::remove),
        )
        .route("/api/menu-items", get(menu::list).post(menu::create))
        .route("/api/menu-items/{id}", put(menu::update).delete(menu::remove))
        .route(
            "/api/customers",
            get(customers::list).post(customers::create),
        )
        .route(
            "/api/customers/{id}",
            put(customers::update).delete(customers::remove),
        )
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/orders/{id}", get(orders::get_one))
        .route("/api/orders/{id}/settle", post(orders::settle))
        .route("/api/orders/{id}/cancel", post(orders::cancel))
        .route("/api/sync", post(sync::handle_sync))
        .route("/api/ws", get(ws::handle_ws))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    // Public: registration and liveness
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/tenants", post(tenants::register));

    Router::new()
        .merge(public)
        .merge(tenant_scoped)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
