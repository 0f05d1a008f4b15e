mod common;

use axum::body::Body;
use axum::http::Request;
use serde_json::json;
use tower::ServiceExt;

use tally_hub::hub::{Envelope, EventKind};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_reaches_all_clients_and_closed_client_is_evicted() {
    let (addr, state) = common::start_server().await;
    let mut a = common::connect(addr, &state).await;
    let mut b = common::connect(addr, &state).await;

    state.hub.broadcast(Envelope::empty(EventKind::Clear)).await.unwrap();

    let expected = json!({"type": "clear", "body": null});
    assert_eq!(common::next_json(&mut a).await, expected);
    assert_eq!(common::next_json(&mut b).await, expected);

    // A's connection closes.
    a.close(None).await.expect("close");
    drop(a);
    common::wait_for_connections(&state, 1).await;

    let line = json!({"name": "Coffee", "count": 1, "cost": 3.5});
    state
        .hub
        .broadcast(Envelope::from_value(EventKind::AddLine, &line).unwrap())
        .await
        .unwrap();

    assert_eq!(
        common::next_json(&mut b).await,
        json!({"type": "add-line", "body": line})
    );
    assert_eq!(state.hub.sinks().await.unwrap().len(), 1);
}

#[tokio::test]
async fn late_client_does_not_get_earlier_envelopes() {
    let (addr, state) = common::start_server().await;

    state.hub.broadcast(Envelope::empty(EventKind::Clear)).await.unwrap();
    let mut c = common::connect(addr, &state).await;

    state
        .hub
        .broadcast(Envelope::empty(EventKind::Heartbeat))
        .await
        .unwrap();

    let first = common::next_json(&mut c).await;
    assert_eq!(first["type"], "heartbeat");
    common::assert_silent(&mut c).await;
}

#[tokio::test]
async fn envelopes_arrive_in_submission_order() {
    let (addr, state) = common::start_server().await;
    let mut client = common::connect(addr, &state).await;

    for i in 0..25 {
        let envelope = Envelope::from_value(EventKind::AddLabel, &json!({"str": i})).unwrap();
        state.hub.broadcast(envelope).await.unwrap();
    }

    for i in 0..25 {
        let received = common::next_json(&mut client).await;
        assert_eq!(received["body"]["str"], i);
    }
}

#[tokio::test]
async fn payload_round_trips_unchanged() {
    let (addr, state) = common::start_server().await;
    let mut client = common::connect(addr, &state).await;

    let payload = json!({
        "name": "Crème brûlée",
        "count": 2,
        "nested": {"list": [1, 2.5, null, "x"], "flag": false}
    });
    state
        .hub
        .broadcast(Envelope::from_value(EventKind::NewRecord, &payload).unwrap())
        .await
        .unwrap();

    let received = common::next_json(&mut client).await;
    assert_eq!(received["type"], "new-record");
    assert_eq!(received["body"], payload);
}

#[tokio::test]
async fn failed_upgrade_never_registers() {
    let state = common::test_state();
    let app = common::test_app(&state);

    let response = app
        .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(state.hub.sinks().await.unwrap().is_empty());
}
