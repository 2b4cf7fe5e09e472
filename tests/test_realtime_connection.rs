//! Realtime connection integration tests against an in-process WebSocket
//! server and a mock polling backend: connect/disconnect idempotence, the
//! catch-all event forwarding, the connectivity probe, and transport
//! fallback.

mod common;

use common::{wait_for, WAIT};
use futures_util::{SinkExt, StreamExt};
use paper_link::{
    ConnectionOptions, ConnectionState, EventKind, PaperLinkClient, PaperLinkTimeouts,
    TransportKind,
};
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// How the in-process server treats `ping` probe events.
#[derive(Clone, Copy)]
enum ProbeBehavior {
    /// Answer with a `pong` echoing the probe payload.
    Echo,
    /// Swallow probes so the client's wait times out.
    Swallow,
}

/// Spawn a WebSocket server that authenticates, pushes the given events,
/// then serves probe traffic per `behavior`. Returns the HTTP base URL.
async fn spawn_stream_server(behavior: ProbeBehavior, push: Vec<JsonValue>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle_stream(stream, behavior, push.clone()));
        }
    });
    format!("http://{}", addr)
}

async fn handle_stream(stream: TcpStream, behavior: ProbeBehavior, push: Vec<JsonValue>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    // Auth handshake: the first message must authenticate.
    match ws.next().await {
        Some(Ok(Message::Text(text))) => {
            let value: JsonValue = match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(_) => return,
            };
            if value["type"] != "authenticate" {
                let _ = ws
                    .send(Message::Text(
                        json!({"type": "auth_error", "message": "authenticate first"})
                            .to_string()
                            .into(),
                    ))
                    .await;
                return;
            }
            let _ = ws
                .send(Message::Text(
                    json!({"type": "auth_success", "user_id": "tester"}).to_string().into(),
                ))
                .await;
        },
        _ => return,
    }

    for event in &push {
        let _ = ws.send(Message::Text(event.to_string().into())).await;
    }

    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let value: JsonValue = match serde_json::from_str(&text) {
                    Ok(value) => value,
                    Err(_) => continue,
                };
                if value["type"] == "event" && value["event"] == "ping" {
                    if matches!(behavior, ProbeBehavior::Echo) {
                        let reply = json!({"event": "pong", "payload": value["payload"]});
                        let _ = ws.send(Message::Text(reply.to_string().into())).await;
                    }
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = ws.send(Message::Pong(payload)).await;
            },
            Ok(Message::Close(_)) | Err(_) => return,
            _ => {},
        }
    }
}

fn stream_client(base_url: &str, probe_timeout: Duration) -> PaperLinkClient {
    PaperLinkClient::builder()
        .base_url(base_url)
        .jwt_token("test-token")
        .timeouts(PaperLinkTimeouts::builder().probe_timeout(probe_timeout).build())
        .connection_options(
            ConnectionOptions::new().with_transports(vec![TransportKind::WebSocket]),
        )
        .build()
        .expect("valid configuration")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_forwards_server_events_to_registry() {
    let base_url = spawn_stream_server(
        ProbeBehavior::Echo,
        vec![json!({"event": "document_updated", "payload": {"id": "d1"}})],
    )
    .await;
    let client = stream_client(&base_url, Duration::from_secs(5));

    let received = Arc::new(AtomicUsize::new(0));
    let received_clone = received.clone();
    let _sub = client.registry().on("document_updated", move |payload| {
        assert_eq!(payload["id"], "d1");
        received_clone.fetch_add(1, Ordering::SeqCst);
    });

    // Lifecycle events flow through the registry like any other event.
    let connects = Arc::new(AtomicUsize::new(0));
    let connects_clone = connects.clone();
    let _lifecycle = client.registry().on(EventKind::Connect, move |_| {
        connects_clone.fetch_add(1, Ordering::SeqCst);
    });

    client.connect(None).await.expect("connect");

    assert!(client.is_connected());
    assert_eq!(client.connection_state(), ConnectionState::Connected);
    assert_eq!(client.connection().transport_name(), Some("websocket"));
    assert_eq!(client.connection().connection_attempts(), 1);
    assert_eq!(connects.load(Ordering::SeqCst), 1);

    assert!(
        wait_for(|| received.load(Ordering::SeqCst) == 1, WAIT).await,
        "pushed event should reach the subscriber"
    );

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_is_idempotent() {
    let base_url = spawn_stream_server(ProbeBehavior::Echo, Vec::new()).await;
    let client = stream_client(&base_url, Duration::from_secs(5));

    client.connect(None).await.expect("first connect");
    assert_eq!(client.connection().connection_attempts(), 1);

    // Connecting while connected is a no-op: no new transport attempt.
    client.connect(None).await.expect("second connect");
    assert_eq!(client.connection().connection_attempts(), 1);
    assert!(client.is_connected());

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disconnect_is_idempotent_and_publishes_event() {
    let base_url = spawn_stream_server(ProbeBehavior::Echo, Vec::new()).await;
    let client = stream_client(&base_url, Duration::from_secs(5));

    let disconnects = Arc::new(AtomicUsize::new(0));
    let disconnects_clone = disconnects.clone();
    let _sub = client.registry().on(EventKind::Disconnect, move |_| {
        disconnects_clone.fetch_add(1, Ordering::SeqCst);
    });

    client.connect(None).await.expect("connect");
    client.disconnect().await;

    assert!(!client.is_connected());
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    assert_eq!(client.connection().transport_name(), None);
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);

    // A second disconnect changes nothing.
    client.disconnect().await;
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_probe_round_trip_succeeds() {
    let base_url = spawn_stream_server(ProbeBehavior::Echo, Vec::new()).await;
    let client = stream_client(&base_url, Duration::from_secs(5));

    // Not connected yet: immediate false.
    assert!(!client.test_connection().await);

    client.connect(None).await.expect("connect");
    assert!(client.test_connection().await, "echoed probe should ack");

    // The temporary pong listener is gone afterwards.
    assert_eq!(client.registry().subscriber_count(&EventKind::Pong), 0);

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_probe_times_out_and_cleans_up() {
    let base_url = spawn_stream_server(ProbeBehavior::Swallow, Vec::new()).await;
    let client = stream_client(&base_url, Duration::from_millis(300));

    client.connect(None).await.expect("connect");
    assert!(
        !client.test_connection().await,
        "swallowed probe should time out"
    );
    assert_eq!(
        client.registry().subscriber_count(&EventKind::Pong),
        0,
        "no listener may remain after the timeout"
    );

    client.disconnect().await;
}

// ── Polling transport ───────────────────────────────────────────────────────

async fn mount_polling_backend(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/realtime/poll"))
        .and(query_param("cursor", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cursor": 1,
            "events": [{"event": "document_updated", "payload": {"id": "d2"}}],
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/realtime/poll"))
        .and(query_param("cursor", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(100))
                .set_body_json(json!({"cursor": 1, "events": []})),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/realtime/emit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_polling_transport_delivers_events() {
    let server = MockServer::start().await;
    mount_polling_backend(&server).await;

    let client = PaperLinkClient::builder()
        .base_url(server.uri())
        .jwt_token("test-token")
        .connection_options(ConnectionOptions::new().with_transports(vec![TransportKind::Polling]))
        .build()
        .expect("valid configuration");

    let received = Arc::new(AtomicUsize::new(0));
    let received_clone = received.clone();
    let _sub = client.registry().on("document_updated", move |payload| {
        assert_eq!(payload["id"], "d2");
        received_clone.fetch_add(1, Ordering::SeqCst);
    });

    client.connect(None).await.expect("connect");
    assert!(client.is_connected());
    assert_eq!(client.connection().transport_name(), Some("polling"));

    assert!(
        wait_for(|| received.load(Ordering::SeqCst) == 1, WAIT).await,
        "polled event should reach the subscriber"
    );

    // Outbound events go through the emit endpoint.
    assert!(client.registry().emit("ping", json!({"timestamp": 1})));
    assert!(
        wait_for_emit_request(&server).await,
        "emitted event should hit the backend"
    );

    client.disconnect().await;
}

async fn wait_for_emit_request(server: &MockServer) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        let hit = server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .any(|request| request.url.path() == "/v1/realtime/emit");
        if hit {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread")]
async fn test_websocket_failure_falls_back_to_polling() {
    // The mock backend speaks plain HTTP, so the WebSocket upgrade fails
    // and the preference order falls through to polling.
    let server = MockServer::start().await;
    mount_polling_backend(&server).await;

    let client = PaperLinkClient::builder()
        .base_url(server.uri())
        .jwt_token("test-token")
        .build()
        .expect("valid configuration");

    client.connect(None).await.expect("connect");
    assert!(client.is_connected());
    assert_eq!(
        client.connection().transport_name(),
        Some("polling"),
        "stream handshake failure should fall back to polling"
    );

    client.disconnect().await;
}
