//! End-to-end tests of the per-room signaling relay: `/ws/{code}`, opaque
//! offer/answer/ICE forwarding stamped with `from`, and connect/disconnect
//! bookkeeping frames.

mod test_helpers;

use futures_util::{SinkExt, StreamExt};
use lobby_signal_server::app_state::AppState;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use test_helpers::{spawn_app, ws_url};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn host_room(state: &AppState) -> String {
    state
        .store
        .host_room(Some("Room".into()), true, 0, "default".into(), false)
}

async fn connect(addr: std::net::SocketAddr, code: &str) -> Socket {
    let (socket, _response) = connect_async(ws_url(addr, &format!("/ws/{code}")))
        .await
        .expect("signaling socket connects");
    socket
}

async fn send(socket: &mut Socket, body: Value) {
    socket
        .send(Message::Text(body.to_string().into()))
        .await
        .expect("send frame");
}

async fn recv(socket: &mut Socket) -> Value {
    let frame = timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("frame arrives before timeout")
        .expect("stream not closed")
        .expect("no transport error");
    match frame {
        Message::Text(text) => serde_json::from_str(text.as_str()).expect("valid JSON frame"),
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn first_peer_initializes_with_no_existing_peers() {
    let (addr, state) = spawn_app().await;
    let code = host_room(&state);

    let mut first = connect(addr, &code).await;
    let init = recv(&mut first).await;
    assert_eq!(init["data_type"], "initialize");
    assert_eq!(init["id"], 1);
    assert!(init["peers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn second_peer_sees_first_and_first_is_notified() {
    let (addr, state) = spawn_app().await;
    let code = host_room(&state);

    let mut first = connect(addr, &code).await;
    recv(&mut first).await; // initialize{id:1, peers:[]}

    let mut second = connect(addr, &code).await;
    let init = recv(&mut second).await;
    assert_eq!(init["data_type"], "initialize");
    assert_eq!(init["id"], 2);
    assert_eq!(init["peers"].as_array().unwrap(), &[json!(1)]);

    let new_connection = recv(&mut first).await;
    assert_eq!(new_connection["data_type"], "new_connection");
    assert_eq!(new_connection["peer_id"], 2);
}

#[tokio::test]
async fn offer_is_forwarded_to_target_with_from_stamped() {
    let (addr, state) = spawn_app().await;
    let code = host_room(&state);

    let mut first = connect(addr, &code).await;
    recv(&mut first).await;
    let mut second = connect(addr, &code).await;
    recv(&mut second).await; // initialize
    recv(&mut first).await; // new_connection

    send(
        &mut second,
        json!({"data_type": "offer", "to": 1, "sdp": "v=0..."}),
    )
    .await;

    let forwarded = recv(&mut first).await;
    assert_eq!(forwarded["data_type"], "offer");
    assert_eq!(forwarded["from"], 2);
    assert_eq!(forwarded["sdp"], "v=0...");
}

#[tokio::test]
async fn ready_frames_are_silently_ignored() {
    let (addr, state) = spawn_app().await;
    let code = host_room(&state);

    let mut first = connect(addr, &code).await;
    recv(&mut first).await;
    send(&mut first, json!({"data_type": "ready"})).await;

    // No reply is expected for a `ready` frame; assert indirectly that the
    // read loop is still alive by observing the next peer's connection.
    let mut second = connect(addr, &code).await;
    recv(&mut second).await;
    recv(&mut first).await; // new_connection, proves first's read loop is alive
}

#[tokio::test]
async fn disconnect_notifies_remaining_peers() {
    let (addr, state) = spawn_app().await;
    let code = host_room(&state);

    let mut first = connect(addr, &code).await;
    recv(&mut first).await;
    let mut second = connect(addr, &code).await;
    recv(&mut second).await;
    recv(&mut first).await; // new_connection

    second.close(None).await.expect("close second");

    let disconnected = recv(&mut first).await;
    assert_eq!(disconnected["data_type"], "peer_disconnected");
    assert_eq!(disconnected["peer_id"], 2);
}

#[tokio::test]
async fn room_survives_after_its_only_connection_drops() {
    let (addr, state) = spawn_app().await;
    let code = host_room(&state);

    let mut first = connect(addr, &code).await;
    recv(&mut first).await;
    first.close(None).await.expect("close only connection");

    // Give the server a beat to process the close before asserting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(state.store.room_exists(&code), "room persists for later discovery");
}

#[tokio::test]
async fn connecting_to_an_unknown_room_code_closes_immediately() {
    let (addr, _state) = spawn_app().await;
    let mut socket = connect(addr, "ZZZZ").await;
    let result = timeout(Duration::from_secs(2), socket.next()).await;
    match result {
        Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {}
        other => panic!("expected the connection to close, got {other:?}"),
    }
}
