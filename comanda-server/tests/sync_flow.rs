//! Reconciliation and conflict-resolution flow tests

mod common;

use serde_json::json;
use uuid::Uuid;

use comanda_server::db::{ledger, store};
use comanda_server::sync::resolver::ApplyOutcome;
use comanda_server::sync::reconcile;
use shared::models::{EntityKind, Operation};
use shared::sync::{ChangeStatus, SyncRequest};

use common::{apply, delete_change, insert_change, register_tenant, setup, update_change};

#[tokio::test]
async fn versions_increment_by_one_per_accepted_write() {
    let state = setup().await;
    let tenant = register_tenant(&state, "bistro").await;
    let id = Uuid::new_v4();

    let outcome = apply(
        &state,
        tenant,
        "pos-1",
        &insert_change(EntityKind::Table, id, json!({"name": "T1", "seats": 4})),
        2_000,
    )
    .await;
    assert_eq!(outcome, ApplyOutcome::Applied { version: 1 });

    let outcome = apply(
        &state,
        tenant,
        "pos-1",
        &update_change(EntityKind::Table, id, json!({"seats": 6}), 1),
        3_000,
    )
    .await;
    assert_eq!(outcome, ApplyOutcome::Applied { version: 2 });

    let table = store::dining_table::get(&state.pool, tenant, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(table.version, 2);
    assert_eq!(table.seats, 6);
    assert_eq!(table.name, "T1");
}

#[tokio::test]
async fn stale_update_conflicts_and_mutates_nothing() {
    let state = setup().await;
    let tenant = register_tenant(&state, "bistro").await;
    let id = Uuid::new_v4();

    apply(
        &state,
        tenant,
        "pos-a",
        &insert_change(EntityKind::Table, id, json!({"name": "T1", "seats": 4})),
        2_000,
    )
    .await;
    apply(
        &state,
        tenant,
        "pos-a",
        &update_change(EntityKind::Table, id, json!({"seats": 6}), 1),
        3_000,
    )
    .await;

    // pos-b still believes version 1
    let outcome = apply(
        &state,
        tenant,
        "pos-b",
        &update_change(EntityKind::Table, id, json!({"seats": 8}), 1),
        4_000,
    )
    .await;
    assert_eq!(
        outcome,
        ApplyOutcome::Conflict {
            server_version: 2,
            client_version: 1,
        }
    );

    // The rejected write left no trace: state, version, and ledger untouched
    let table = store::dining_table::get(&state.pool, tenant, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(table.seats, 6);
    assert_eq!(table.version, 2);

    let entries = ledger::list_since(&state.pool, tenant, 0).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.actor_id == "pos-a"));
}

#[tokio::test]
async fn insert_retransmission_is_idempotent() {
    let state = setup().await;
    let tenant = register_tenant(&state, "bistro").await;
    let id = Uuid::new_v4();
    let change = insert_change(EntityKind::Customer, id, json!({"name": "Ana"}));

    let first = apply(&state, tenant, "pos-1", &change, 2_000).await;
    let second = apply(&state, tenant, "pos-1", &change, 3_000).await;

    assert_eq!(first, ApplyOutcome::Applied { version: 1 });
    assert_eq!(second, ApplyOutcome::Applied { version: 1 });

    let customers = store::customer::list(&state.pool, tenant).await.unwrap();
    assert_eq!(customers.len(), 1);

    // Only the first transmission reached the ledger
    let entries = ledger::list_since(&state.pool, tenant, 0).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operation, Operation::Insert);
}

#[tokio::test]
async fn delete_requires_current_version() {
    let state = setup().await;
    let tenant = register_tenant(&state, "bistro").await;
    let id = Uuid::new_v4();

    apply(
        &state,
        tenant,
        "pos-1",
        &insert_change(EntityKind::Customer, id, json!({"name": "Ana"})),
        2_000,
    )
    .await;
    apply(
        &state,
        tenant,
        "pos-1",
        &update_change(EntityKind::Customer, id, json!({"loyalty_points": 5}), 1),
        3_000,
    )
    .await;

    let stale = apply(
        &state,
        tenant,
        "pos-2",
        &delete_change(EntityKind::Customer, id, 1),
        4_000,
    )
    .await;
    assert_eq!(
        stale,
        ApplyOutcome::Conflict {
            server_version: 2,
            client_version: 1,
        }
    );

    let fresh = apply(
        &state,
        tenant,
        "pos-2",
        &delete_change(EntityKind::Customer, id, 2),
        5_000,
    )
    .await;
    assert_eq!(fresh, ApplyOutcome::Applied { version: 2 });

    assert!(
        store::customer::get(&state.pool, tenant, id)
            .await
            .unwrap()
            .is_none()
    );

    // A deleted entity is gone for version reads too
    let missing = apply(
        &state,
        tenant,
        "pos-2",
        &update_change(EntityKind::Customer, id, json!({"name": "Bo"}), 2),
        6_000,
    )
    .await;
    assert_eq!(missing, ApplyOutcome::NotFound);
}

#[tokio::test]
async fn ledger_feed_is_ordered_and_strictly_newer() {
    let state = setup().await;
    let tenant = register_tenant(&state, "bistro").await;
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    apply(
        &state,
        tenant,
        "pos-1",
        &insert_change(EntityKind::Table, a, json!({"name": "T1"})),
        2_000,
    )
    .await;
    apply(
        &state,
        tenant,
        "pos-1",
        &insert_change(EntityKind::Table, b, json!({"name": "T2"})),
        3_000,
    )
    .await;
    apply(
        &state,
        tenant,
        "pos-1",
        &update_change(EntityKind::Table, a, json!({"seats": 2}), 1),
        3_000,
    )
    .await;

    let all = ledger::list_since(&state.pool, tenant, 0).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| {
        (w[0].committed_at, w[0].id) < (w[1].committed_at, w[1].id)
    }));

    // An entry at exactly the checkpoint is already observed
    let newer = ledger::list_since(&state.pool, tenant, 2_000).await.unwrap();
    assert_eq!(newer.len(), 2);
    assert!(newer.iter().all(|e| e.committed_at > 2_000));

    let none = ledger::list_since(&state.pool, tenant, 3_000).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn tenants_do_not_observe_each_other() {
    let state = setup().await;
    let tenant_a = register_tenant(&state, "bistro").await;
    let tenant_b = register_tenant(&state, "trattoria").await;
    let id = Uuid::new_v4();

    apply(
        &state,
        tenant_a,
        "pos-a",
        &insert_change(EntityKind::Table, id, json!({"name": "T1"})),
        2_000,
    )
    .await;

    // B's feed is empty and B cannot address A's entity
    let entries = ledger::list_since(&state.pool, tenant_b, 0).await.unwrap();
    assert!(entries.is_empty());

    let outcome = apply(
        &state,
        tenant_b,
        "pos-b",
        &update_change(EntityKind::Table, id, json!({"seats": 9}), 1),
        3_000,
    )
    .await;
    assert_eq!(outcome, ApplyOutcome::NotFound);

    let table = store::dining_table::get(&state.pool, tenant_a, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(table.version, 1);
}

#[tokio::test]
async fn reconcile_round_reports_per_change_results() {
    let state = setup().await;
    let tenant = register_tenant(&state, "bistro").await;
    let existing = Uuid::new_v4();
    let fresh = Uuid::new_v4();
    let missing = Uuid::new_v4();

    apply(
        &state,
        tenant,
        "pos-1",
        &insert_change(EntityKind::Table, existing, json!({"name": "T1"})),
        2_000,
    )
    .await;
    apply(
        &state,
        tenant,
        "pos-1",
        &update_change(EntityKind::Table, existing, json!({"seats": 6}), 1),
        3_000,
    )
    .await;

    // One good insert, one stale update, one update of a missing entity
    let request = SyncRequest {
        last_sync_time: Some(2_000),
        proposed_changes: vec![
            insert_change(EntityKind::Customer, fresh, json!({"name": "Ana"})),
            update_change(EntityKind::Table, existing, json!({"seats": 9}), 1),
            update_change(EntityKind::Customer, missing, json!({"name": "Bo"}), 1),
        ],
    };

    let response = reconcile(&state.pool, &state.hub, tenant, "pos-2", &request)
        .await
        .unwrap();

    assert_eq!(response.results.len(), 3);
    assert_eq!(response.results[0].status, ChangeStatus::Success);
    assert_eq!(response.results[0].server_version, Some(1));

    assert_eq!(response.results[1].status, ChangeStatus::Conflict);
    assert_eq!(response.results[1].server_version, Some(2));
    assert_eq!(response.results[1].client_version, Some(1));

    assert_eq!(response.results[2].status, ChangeStatus::Error);
    assert!(response.results[2].error.as_deref().unwrap().contains("not found"));

    // Feed covers the earlier update plus the insert this round applied
    assert!(response.server_changes.len() >= 2);
    assert!(response.server_changes.iter().any(|e| e.entity_id == fresh));
    assert!(response.sync_time >= response.server_changes.last().unwrap().committed_at);

    // The conflicting change took no effect
    let table = store::dining_table::get(&state.pool, tenant, existing)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(table.seats, 6);
}

#[tokio::test]
async fn conflict_recovery_round_trip() {
    let state = setup().await;
    let tenant = register_tenant(&state, "bistro").await;
    let id = Uuid::new_v4();

    apply(
        &state,
        tenant,
        "pos-a",
        &insert_change(EntityKind::Table, id, json!({"name": "T1", "seats": 4})),
        2_000,
    )
    .await;

    // Both devices saw version 1 before going offline. A wins.
    let a = apply(
        &state,
        tenant,
        "pos-a",
        &update_change(EntityKind::Table, id, json!({"seats": 6}), 1),
        3_000,
    )
    .await;
    assert_eq!(a, ApplyOutcome::Applied { version: 2 });

    let b = apply(
        &state,
        tenant,
        "pos-b",
        &update_change(EntityKind::Table, id, json!({"name": "Patio 1"}), 1),
        4_000,
    )
    .await;
    assert_eq!(
        b,
        ApplyOutcome::Conflict {
            server_version: 2,
            client_version: 1,
        }
    );

    // B reconciles, learns what it missed, and reapplies on the new version
    let catch_up = reconcile(
        &state.pool,
        &state.hub,
        tenant,
        "pos-b",
        &SyncRequest {
            last_sync_time: Some(2_000),
            proposed_changes: vec![],
        },
    )
    .await
    .unwrap();
    assert!(catch_up.server_changes.iter().any(|e| e.entity_id == id));

    let retry = apply(
        &state,
        tenant,
        "pos-b",
        &update_change(EntityKind::Table, id, json!({"name": "Patio 1"}), 2),
        5_000,
    )
    .await;
    assert_eq!(retry, ApplyOutcome::Applied { version: 3 });

    // Both intents survive
    let table = store::dining_table::get(&state.pool, tenant, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(table.seats, 6);
    assert_eq!(table.name, "Patio 1");
    assert_eq!(table.version, 3);
}

#[tokio::test]
async fn patch_with_unknown_field_is_rejected_per_change() {
    let state = setup().await;
    let tenant = register_tenant(&state, "bistro").await;
    let good = Uuid::new_v4();
    let bad = Uuid::new_v4();

    let request = SyncRequest {
        last_sync_time: None,
        proposed_changes: vec![
            // Clients cannot smuggle version or tenant writes through fields
            insert_change(EntityKind::Table, bad, json!({"name": "T1", "version": 99})),
            insert_change(EntityKind::Table, good, json!({"name": "T2"})),
        ],
    };

    let response = reconcile(&state.pool, &state.hub, tenant, "pos-1", &request)
        .await
        .unwrap();

    assert_eq!(response.results[0].status, ChangeStatus::Error);
    assert_eq!(response.results[1].status, ChangeStatus::Success);

    let tables = store::dining_table::list(&state.pool, tenant).await.unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name, "T2");
}

#[tokio::test]
async fn committed_changes_reach_live_subscribers() {
    let state = setup().await;
    let tenant = register_tenant(&state, "bistro").await;
    let mut events = state.hub.subscribe(Uuid::new_v4(), tenant);
    let id = Uuid::new_v4();

    apply(
        &state,
        tenant,
        "pos-1",
        &insert_change(EntityKind::MenuItem, id, json!({"name": "Espresso", "price": "2.20"})),
        2_000,
    )
    .await;
    apply(
        &state,
        tenant,
        "pos-1",
        &update_change(EntityKind::MenuItem, id, json!({"price": "2.40"}), 1),
        3_000,
    )
    .await;
    apply(
        &state,
        tenant,
        "pos-1",
        &delete_change(EntityKind::MenuItem, id, 2),
        4_000,
    )
    .await;

    let created = events.recv().await.unwrap();
    assert_eq!(created.event_type, "menu-item-created");
    assert_eq!(created.payload["name"], "Espresso");

    let updated = events.recv().await.unwrap();
    assert_eq!(updated.event_type, "menu-item-updated");
    assert_eq!(updated.payload["version"], 2);

    let deleted = events.recv().await.unwrap();
    assert_eq!(deleted.event_type, "menu-item-deleted");
    assert_eq!(deleted.payload["id"], id.to_string());
}
