//! WebSocket upgrade handler and per-connection reader.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::StreamExt;
use tokio::sync::oneshot;

use crate::AppState;

use super::fanout::Hub;
use super::sink::WsSink;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_failed_upgrade(|error| tracing::debug!(%error, "websocket upgrade failed"))
        .on_upgrade(move |socket| handle_connection(socket, state.hub))
}

/// Register the write half with the hub and watch the read half for close.
///
/// Clients never send anything meaningful; the reader only exists to notice a
/// disconnect early and to stop once the hub has evicted the sink.
async fn handle_connection(socket: WebSocket, hub: Hub) {
    let (ws_tx, mut ws_rx) = socket.split();
    let (evicted_tx, mut evicted) = oneshot::channel::<()>();

    let sink_id = match hub.register(WsSink::new(ws_tx, evicted_tx)).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "could not register websocket");
            return;
        }
    };

    loop {
        tokio::select! {
            // Sender dropped: the hub evicted this sink.
            _ = &mut evicted => break,

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, %sink_id, "ws read error");
                        break;
                    }
                    Some(Ok(_)) => continue,
                }
            }
        }
    }

    // No-op if the hub already evicted it.
    let _ = hub.unregister(sink_id).await;
}
