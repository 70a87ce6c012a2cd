//! # Room Socket Tests
//!
//! End-to-end tests over a real listener bound to an ephemeral port.

use crate::chat::testing::ScriptedGenerator;
use crate::chat::{Room, TextGenerator};
use crate::server::{create_router, AppState};
use futures_util::{SinkExt, StreamExt};
use lib_core::Config;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server(generator: Arc<dyn TextGenerator>) -> SocketAddr {
    let state = AppState {
        config: Config::default(),
        room: Arc::new(Room::new(None, generator)),
    };
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/api/ws/room")).await.unwrap();
    client
}

async fn send(client: &mut Client, frame: Value) {
    client
        .send(WsMessage::Text(frame.to_string().into()))
        .await
        .unwrap();
}

async fn recv(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_room_event_surface() {
    let addr = spawn_server(Arc::new(ScriptedGenerator::replying("unused"))).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, json!({ "event": "enterEvent", "data": "alice" })).await;

    // The sender only sees the participant list
    assert_eq!(
        recv(&mut alice).await,
        json!({ "event": "updateParticipants", "data": "alice" })
    );
    assert_eq!(recv(&mut bob).await, json!({ "event": "enterEvent", "data": "alice" }));
    assert_eq!(
        recv(&mut bob).await,
        json!({ "event": "updateParticipants", "data": "alice" })
    );

    let message = json!({ "id": 1, "user": "bob", "text": "hello" });
    send(&mut bob, json!({ "event": "publishEvent", "data": message })).await;
    assert_eq!(recv(&mut alice).await, json!({ "event": "publishEvent", "data": message }));
    assert_eq!(recv(&mut bob).await, json!({ "event": "publishEvent", "data": message }));

    send(&mut alice, json!({ "event": "getId" })).await;
    assert_eq!(recv(&mut alice).await, json!({ "event": "newId", "data": 1 }));

    // Bob's next frame is his own history request, not Alice's id
    send(&mut bob, json!({ "event": "getMessages" })).await;
    assert_eq!(
        recv(&mut bob).await,
        json!({ "event": "getMessages", "data": [message] })
    );

    send(&mut alice, json!({ "event": "deleteEvent", "data": { "id": 1 } })).await;
    let expected = json!({ "event": "deleteMessages", "data": { "id": 1 } });
    assert_eq!(recv(&mut alice).await, expected);
    assert_eq!(recv(&mut bob).await, expected);
}

#[tokio::test]
async fn test_malformed_frames_are_answered_to_sender_only() {
    let addr = spawn_server(Arc::new(ScriptedGenerator::replying("unused"))).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, json!({ "event": "shout", "data": "hey" })).await;
    let reply = recv(&mut alice).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["code"], "InvalidInput");

    send(&mut alice, json!({ "event": "deleteEvent", "data": {} })).await;
    let reply = recv(&mut alice).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["error"], "deleteEvent requires an id");

    // Nothing reached Bob; his first frame is the answer to his own request
    send(&mut bob, json!({ "event": "getId" })).await;
    assert_eq!(recv(&mut bob).await, json!({ "event": "newId", "data": 1 }));
}

#[tokio::test]
async fn test_disconnect_updates_participants() {
    let addr = spawn_server(Arc::new(ScriptedGenerator::replying("unused"))).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, json!({ "event": "enterEvent", "data": "alice" })).await;
    assert_eq!(recv(&mut bob).await["event"], "enterEvent");
    assert_eq!(recv(&mut bob).await["data"], "alice");

    alice.close(None).await.unwrap();

    assert_eq!(
        recv(&mut bob).await,
        json!({ "event": "updateParticipants", "data": "" })
    );
}

#[tokio::test]
async fn test_summary_reaches_everyone() {
    let addr = spawn_server(Arc::new(ScriptedGenerator::replying("No decisions yet."))).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, json!({ "event": "requestGemini" })).await;

    let expected = json!({ "event": "updateGeminiResponse", "data": "No decisions yet." });
    assert_eq!(recv(&mut alice).await, expected);
    assert_eq!(recv(&mut bob).await, expected);
}

#[tokio::test]
async fn test_summary_failure_is_sanitized() {
    let addr = spawn_server(Arc::new(ScriptedGenerator::failing("403 key AIza-secret revoked"))).await;
    let mut alice = connect(addr).await;

    send(&mut alice, json!({ "event": "requestGemini" })).await;

    let reply = recv(&mut alice).await;
    assert_eq!(reply["event"], "updateGeminiResponse");
    assert_eq!(reply["data"]["code"], "Summarizer");
    assert!(!reply.to_string().contains("AIza-secret"));
}
