//! Shared helpers for integration tests

// Not every test binary uses every helper
#![allow(dead_code)]

use serde_json::{Value, json};
use uuid::Uuid;

use comanda_server::db::tenants;
use comanda_server::state::AppState;
use comanda_server::sync::resolver::{self, ApplyOutcome};
use shared::models::{EntityKind, Operation};
use shared::sync::ProposedChange;

pub async fn setup() -> AppState {
    AppState::in_memory().await.expect("in-memory state")
}

pub async fn register_tenant(state: &AppState, name: &str) -> Uuid {
    tenants::create(&state.pool, name, 1_000)
        .await
        .expect("tenant registration")
        .id
}

pub fn insert_change(kind: EntityKind, id: Uuid, fields: Value) -> ProposedChange {
    ProposedChange {
        kind,
        id,
        operation: Operation::Insert,
        fields: Some(fields),
        client_version: None,
    }
}

pub fn update_change(
    kind: EntityKind,
    id: Uuid,
    fields: Value,
    client_version: i64,
) -> ProposedChange {
    ProposedChange {
        kind,
        id,
        operation: Operation::Update,
        fields: Some(fields),
        client_version: Some(client_version),
    }
}

pub fn delete_change(kind: EntityKind, id: Uuid, client_version: i64) -> ProposedChange {
    ProposedChange {
        kind,
        id,
        operation: Operation::Delete,
        fields: None,
        client_version: Some(client_version),
    }
}

/// Apply one change at a controlled timestamp, panicking on storage errors
pub async fn apply(
    state: &AppState,
    tenant_id: Uuid,
    actor_id: &str,
    change: &ProposedChange,
    now: i64,
) -> ApplyOutcome {
    resolver::apply_change(&state.pool, &state.hub, tenant_id, actor_id, change, now)
        .await
        .expect("apply change")
}

/// Seed a menu item through the resolver and return its id
pub async fn seed_menu_item(state: &AppState, tenant_id: Uuid, name: &str, price: &str) -> Uuid {
    let id = Uuid::new_v4();
    let change = insert_change(
        EntityKind::MenuItem,
        id,
        json!({"name": name, "price": price}),
    );
    let outcome = apply(state, tenant_id, "seed", &change, 1_000).await;
    assert!(matches!(outcome, ApplyOutcome::Applied { version: 1 }));
    id
}
