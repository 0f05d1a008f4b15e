#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::{tungstenite, MaybeTlsStream, WebSocketStream};

use tally_hub::config::Config;
use tally_hub::AppState;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Hub state with a short write timeout and no heartbeat.
pub fn test_state() -> AppState {
    AppState::new(Config {
        write_timeout: Duration::from_millis(500),
        ..Config::default()
    })
}

pub fn test_app(state: &AppState) -> Router {
    tally_hub::routes::router().with_state(state.clone())
}

/// Start an actual TCP server for WebSocket testing. The server runs in the
/// background.
pub async fn start_server() -> (SocketAddr, AppState) {
    let state = test_state();
    let app = test_app(&state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Open a WebSocket and wait until the hub has registered it.
pub async fn connect(addr: SocketAddr, state: &AppState) -> WsClient {
    let before = state.hub.sinks().await.expect("hub running").len();
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("ws connect");
    wait_for_connections(state, before + 1).await;
    ws
}

/// Poll the registry until it holds exactly `expected` sinks.
pub async fn wait_for_connections(state: &AppState, expected: usize) {
    time::timeout(Duration::from_secs(5), async {
        loop {
            if state.hub.sinks().await.expect("hub running").len() == expected {
                return;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("registry never reached {expected} connections"));
}

/// Read the next text frame and parse it as JSON.
pub async fn next_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for envelope")
            .expect("stream ended")
            .expect("ws read error");

        match msg {
            tungstenite::Message::Text(text) => {
                return serde_json::from_str(&text).expect("parse envelope");
            }
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("Expected text frame, got: {other:?}"),
        }
    }
}

/// Assert nothing arrives within a short window.
pub async fn assert_silent(ws: &mut WsClient) {
    if let Ok(Some(msg)) = time::timeout(Duration::from_millis(200), ws.next()).await {
        panic!("Expected no frame, got: {msg:?}");
    }
}
