//! WebSocket handler for tenant event streaming
//!
//! One-way push: the server forwards the tenant's broadcast events as JSON
//! text frames. Client frames are only read to detect disconnects and
//! answer pings.

use axum::Extension;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::api::Identity;
use crate::state::AppState;

/// GET /api/ws, upgrades to WebSocket
pub async fn handle_ws(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, identity))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState, identity: Identity) {
    let session_id = Uuid::new_v4();
    let mut events = state.hub.subscribe(session_id, identity.tenant_id);

    tracing::info!(
        tenant_id = %identity.tenant_id,
        actor_id = %identity.actor_id,
        session_id = %session_id,
        "WebSocket connected"
    );

    let (mut ws_sink, mut ws_stream) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let Ok(json) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if ws_sink.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        // Catch-up sync recovers the dropped events
                        tracing::warn!(
                            session_id = %session_id,
                            missed,
                            "Slow WebSocket consumer lagged"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::warn!(session_id = %session_id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {} // ignore Text, Binary, Pong
                }
            }
        }
    }

    let _ = ws_sink.close().await;
    // Release the receiver before unsubscribing so an empty channel can be
    // reclaimed immediately
    drop(events);
    state.hub.unsubscribe(session_id);

    tracing::info!(session_id = %session_id, "WebSocket session cleaned up");
}
