//! Tenant broadcast fan-out
//!
//! One broadcast channel per tenant, created on first subscription and torn
//! down when the last subscriber leaves. Publishing to a tenant with no
//! subscribers is a no-op. Slow consumers lag and drop the oldest events
//! rather than applying backpressure to writers; catch-up sync recovers
//! anything a lagged session missed.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use shared::message::TenantEvent;

const BROADCAST_CAPACITY: usize = 256;

#[derive(Clone, Default)]
pub struct LiveHub {
    /// tenant_id -> event channel
    channels: Arc<DashMap<Uuid, broadcast::Sender<TenantEvent>>>,
    /// session_id -> tenant_id, so unsubscribe can find the channel
    sessions: Arc<DashMap<Uuid, Uuid>>,
}

impl LiveHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a session to a tenant's event stream.
    ///
    /// A session holds at most one subscription; subscribing again moves it,
    /// releasing the previous tenant's channel if it becomes empty.
    pub fn subscribe(&self, session_id: Uuid, tenant_id: Uuid) -> broadcast::Receiver<TenantEvent> {
        if let Some((_, previous)) = self.sessions.remove(&session_id)
            && previous != tenant_id
        {
            self.release(previous);
        }

        self.sessions.insert(session_id, tenant_id);
        self.channels
            .entry(tenant_id)
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .subscribe()
    }

    /// Drop a session's subscription and clean up an empty channel
    pub fn unsubscribe(&self, session_id: Uuid) {
        if let Some((_, tenant_id)) = self.sessions.remove(&session_id) {
            self.release(tenant_id);
        }
    }

    fn release(&self, tenant_id: Uuid) {
        self.channels
            .remove_if(&tenant_id, |_, sender| sender.receiver_count() == 0);
    }

    /// Publish an event to every live session of one tenant.
    ///
    /// Best-effort: no channel or no receivers means nobody is listening,
    /// and the event is simply not sent.
    pub fn publish(&self, tenant_id: Uuid, event_type: &str, payload: Value) {
        if let Some(sender) = self.channels.get(&tenant_id) {
            let event = TenantEvent {
                event_type: event_type.to_string(),
                tenant: tenant_id,
                payload,
            };
            let _ = sender.send(event);
        }
    }

    pub fn subscriber_count(&self, tenant_id: Uuid) -> usize {
        self.channels
            .get(&tenant_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn delivers_to_subscriber() {
        let hub = LiveHub::new();
        let tenant = Uuid::new_v4();
        let mut rx = hub.subscribe(Uuid::new_v4(), tenant);

        hub.publish(tenant, "table-updated", json!({"id": "t1"}));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, "table-updated");
        assert_eq!(event.tenant, tenant);
        assert_eq!(event.payload["id"], "t1");
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let hub = LiveHub::new();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        let mut rx_a = hub.subscribe(Uuid::new_v4(), tenant_a);
        let mut rx_b = hub.subscribe(Uuid::new_v4(), tenant_b);

        hub.publish(tenant_a, "customer-created", json!({"name": "Ana"}));

        assert_eq!(rx_a.recv().await.unwrap().event_type, "customer-created");
        assert!(matches!(
            rx_b.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn resubscribe_moves_session() {
        let hub = LiveHub::new();
        let session = Uuid::new_v4();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();

        let rx_a = hub.subscribe(session, tenant_a);
        let mut rx_b = hub.subscribe(session, tenant_b);
        drop(rx_a);

        hub.publish(tenant_b, "menu-item-updated", json!({}));
        assert_eq!(rx_b.recv().await.unwrap().event_type, "menu-item-updated");
        assert_eq!(hub.subscriber_count(tenant_a), 0);
    }

    #[tokio::test]
    async fn unsubscribe_cleans_up_empty_channel() {
        let hub = LiveHub::new();
        let session = Uuid::new_v4();
        let tenant = Uuid::new_v4();

        let rx = hub.subscribe(session, tenant);
        drop(rx);
        hub.unsubscribe(session);

        assert!(hub.channels.get(&tenant).is_none());
        // publish after teardown must not panic
        hub.publish(tenant, "table-deleted", json!({}));
    }
}
