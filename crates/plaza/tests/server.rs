//! Integration tests for the relay: real WebSocket clients against a
//! server on a random port.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use plaza::prelude::*;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a relay on random ports and returns (ws, http) addresses.
async fn start_server() -> (SocketAddr, SocketAddr) {
    let server = PlazaServer::builder()
        .bind("127.0.0.1:0")
        .http_bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let ws = server.local_addr().expect("should have local addr");
    let http = server.http_addr().expect("http enabled");

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (ws, http)
}

async fn connect(addr: SocketAddr) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send");
}

/// Next event from the relay, skipping control frames.
async fn recv(ws: &mut ClientWs) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("ws error");
        match msg {
            Message::Text(text) => return serde_json::from_str(&text).expect("decode event"),
            Message::Binary(data) => return serde_json::from_slice(&data).expect("decode event"),
            _ => continue,
        }
    }
}

/// Joins and returns the assigned id, consuming `assigned` and `roster`.
async fn join(ws: &mut ClientWs, x: f64, y: f64) -> SessionId {
    send(ws, json!({ "type": "join", "x": x, "y": y })).await;
    let id = match recv(ws).await {
        ServerEvent::Assigned(view) => view.id,
        other => panic!("expected assigned, got {other:?}"),
    };
    assert!(matches!(recv(ws).await, ServerEvent::Roster { .. }));
    id
}

/// Two joined clients; `a`'s `joined(b)` notification is consumed.
async fn pair(addr: SocketAddr) -> (ClientWs, SessionId, ClientWs, SessionId) {
    let mut a = connect(addr).await;
    let a_id = join(&mut a, 100.0, 100.0).await;
    let mut b = connect(addr).await;
    let b_id = join(&mut b, 150.0, 120.0).await;
    match recv(&mut a).await {
        ServerEvent::Joined(view) => assert_eq!(view.id, b_id),
        other => panic!("expected joined, got {other:?}"),
    }
    (a, a_id, b, b_id)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_join_over_websocket_assigns_defaults() {
    let (addr, _) = start_server().await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({ "type": "join" })).await;

    match recv(&mut ws).await {
        ServerEvent::Assigned(view) => {
            assert_eq!((view.x, view.y), (1920.0, 1280.0));
            assert_eq!(view.avatar_key, "avatar-front");
            assert!(!view.display_name.is_empty());
            assert!(!view.authenticated);
        }
        other => panic!("expected assigned, got {other:?}"),
    }
}

#[tokio::test]
async fn test_roster_lists_existing_players() {
    let (addr, _) = start_server().await;
    let mut a = connect(addr).await;
    let a_id = join(&mut a, 0.0, 0.0).await;

    let mut b = connect(addr).await;
    send(&mut b, json!({ "type": "join", "displayName": "Bea" })).await;
    assert!(matches!(recv(&mut b).await, ServerEvent::Assigned(_)));
    match recv(&mut b).await {
        ServerEvent::Roster { players } => {
            assert_eq!(players.len(), 1);
            assert_eq!(players[0].id, a_id);
        }
        other => panic!("expected roster, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_move_is_dropped_and_connection_survives() {
    let (addr, _) = start_server().await;
    let (mut a, a_id, mut b, _) = pair(addr).await;

    send(&mut a, json!({ "type": "move", "x": "abc", "y": 5 })).await;
    send(&mut a, json!({ "type": "move", "x": 300, "y": 400 })).await;

    // The first thing b hears about is the valid move.
    match recv(&mut b).await {
        ServerEvent::Moved { id, x, y, .. } => {
            assert_eq!(id, a_id);
            assert_eq!((x, y), (300.0, 400.0));
        }
        other => panic!("expected moved, got {other:?}"),
    }
    assert!(matches!(recv(&mut a).await, ServerEvent::PositionAck { .. }));
}

#[tokio::test]
async fn test_unknown_event_is_ignored() {
    let (addr, _) = start_server().await;
    let mut ws = connect(addr).await;
    join(&mut ws, 0.0, 0.0).await;

    send(&mut ws, json!({ "type": "dance", "style": "tango" })).await;
    send(&mut ws, json!({ "type": "liveness-ping" })).await;

    assert!(matches!(recv(&mut ws).await, ServerEvent::LivenessPong { .. }));
}

#[tokio::test]
async fn test_proximity_query_over_websocket() {
    let (addr, _) = start_server().await;
    let (mut a, _, _b, b_id) = pair(addr).await;

    send(&mut a, json!({ "type": "proximity-query", "x": 100, "y": 100 })).await;

    match recv(&mut a).await {
        ServerEvent::Nearby { players } => {
            assert_eq!(players.len(), 1);
            assert_eq!(players[0].id, b_id);
        }
        other => panic!("expected nearby, got {other:?}"),
    }
}

#[tokio::test]
async fn test_direct_message_over_websocket() {
    let (addr, _) = start_server().await;
    let (mut a, a_id, mut b, b_id) = pair(addr).await;

    send(&mut a, json!({ "type": "direct-message", "targetId": b_id, "body": "hi" })).await;

    match recv(&mut b).await {
        ServerEvent::DirectMessage { from_id, body, .. } => {
            assert_eq!(from_id, a_id);
            assert_eq!(body, "hi");
        }
        other => panic!("expected direct-message, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_close_broadcasts_left() {
    let (addr, _) = start_server().await;
    let (mut a, a_id, mut b, _) = pair(addr).await;

    a.close(None).await.expect("close");

    assert_eq!(recv(&mut b).await, ServerEvent::Left { id: a_id });
}

#[tokio::test]
async fn test_explicit_disconnect_closes_socket_and_broadcasts_left() {
    let (addr, _) = start_server().await;
    let (mut a, a_id, mut b, _) = pair(addr).await;

    send(&mut a, json!({ "type": "disconnect" })).await;

    assert_eq!(recv(&mut b).await, ServerEvent::Left { id: a_id });

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match a.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return true,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .expect("server should close the socket");
    assert!(closed);
}

#[tokio::test]
async fn test_silent_tcp_peer_does_not_block_new_clients() {
    let (addr, _) = start_server().await;

    // Connects but never sends the upgrade request.
    let _silent = tokio::net::TcpStream::connect(addr).await.expect("tcp connect");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut ws = tokio::time::timeout(Duration::from_secs(2), connect(addr))
        .await
        .expect("listener should keep accepting while a peer is silent");
    join(&mut ws, 0.0, 0.0).await;
}

#[tokio::test]
async fn test_silent_tcp_peer_is_dropped_after_handshake_timeout() {
    let server = PlazaServer::builder()
        .bind("127.0.0.1:0")
        .handshake_timeout(Duration::from_millis(100))
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("should have local addr");
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let mut silent = tokio::net::TcpStream::connect(addr).await.expect("tcp connect");
    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(2), silent.read(&mut buf))
        .await
        .expect("server should hang up on a silent peer");
    assert!(matches!(read, Ok(0) | Err(_)));
}

#[tokio::test]
async fn test_health_endpoint_over_http() {
    let (addr, http) = start_server().await;
    let mut ws = connect(addr).await;
    join(&mut ws, 0.0, 0.0).await;

    let mut stream = tokio::net::TcpStream::connect(http).await.expect("connect http");
    stream
        .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("write request");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read response");

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("\"status\":\"ok\""));
    assert!(response.contains("\"activePlayers\":1"));
}
