use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::*;
use crate::services::registry::RoomKey;
use crate::state::test_helpers;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, crate::routes::app(state))
            .await
            .expect("test server failed");
    });
    addr
}

async fn connect(addr: SocketAddr, query: &str) -> Client {
    let (stream, _) = connect_async(format!("ws://{addr}/ws?{query}"))
        .await
        .expect("ws connect");
    stream
}

async fn recv_server_event(client: &mut Client) -> ServerEvent {
    loop {
        let msg = timeout(Duration::from_millis(500), client.next())
            .await
            .expect("ws receive timed out")
            .expect("stream ended")
            .expect("ws error");
        if let WsMessage::Text(text) = msg {
            return frames::decode_server_event(text.as_str()).expect("server event decodes");
        }
    }
}

async fn send_text(client: &mut Client, text: &str) {
    client.send(WsMessage::text(text)).await.expect("ws send");
}

/// True once the server has closed the socket.
async fn closed_by_server(client: &mut Client) -> bool {
    loop {
        match timeout(Duration::from_millis(500), client.next()).await {
            Ok(None | Some(Err(_)) | Some(Ok(WsMessage::Close(_)))) => return true,
            Ok(Some(Ok(_))) => {}
            Err(_) => return false,
        }
    }
}

/// Wait until the registry shows `expected` connections in `room`.
async fn wait_for_room(state: &AppState, room: RoomKey, expected: usize) {
    for _ in 0..50 {
        if state.registry.room_size(room).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("room {room} never reached {expected} connections");
}

#[tokio::test]
async fn missing_user_id_gets_error_then_close() {
    let addr = spawn_server(test_helpers::test_app_state()).await;
    let mut client = connect(addr, "chatId=").await;

    assert_eq!(recv_server_event(&mut client).await, ServerEvent::error("userId required in query"));
    assert!(closed_by_server(&mut client).await);
}

#[tokio::test]
async fn outsider_is_rejected_from_chat_room() {
    let state = test_helpers::test_app_state();
    let a = test_helpers::seed_user(&state, "a").await;
    let b = test_helpers::seed_user(&state, "b").await;
    let d = test_helpers::seed_user(&state, "d").await;
    let chat_id = test_helpers::seed_chat(&state, a, b).await;
    let addr = spawn_server(state.clone()).await;

    let mut client = connect(addr, &format!("userId={d}&chatId={chat_id}")).await;

    assert_eq!(
        recv_server_event(&mut client).await,
        ServerEvent::error("Chat not found or access denied")
    );
    assert!(closed_by_server(&mut client).await);
    assert_eq!(state.registry.room_size(RoomKey::Chat(chat_id)).await, 0);
}

#[tokio::test]
async fn message_reaches_chat_room_and_recipient_user_room() {
    let state = test_helpers::test_app_state();
    let a = test_helpers::seed_user(&state, "vocals").await;
    let b = test_helpers::seed_user(&state, "keys").await;
    let chat_id = test_helpers::seed_chat(&state, a, b).await;
    let addr = spawn_server(state.clone()).await;

    let mut sender = connect(addr, &format!("userId={a}&chatId={chat_id}")).await;
    let mut recipient = connect(addr, &format!("userId={b}")).await;
    wait_for_room(&state, RoomKey::Chat(chat_id), 1).await;
    wait_for_room(&state, RoomKey::User(b), 1).await;

    send_text(&mut sender, r#"{"event":"message","data":{"content":"  soundcheck at 7  "}}"#).await;

    let ServerEvent::Message(live) = recv_server_event(&mut sender).await else {
        panic!("expected message event");
    };
    assert_eq!(live.content, "soundcheck at 7");
    assert_eq!(live.sender_id, a);

    let ServerEvent::NewMessage(note) = recv_server_event(&mut recipient).await else {
        panic!("expected new_message event");
    };
    assert_eq!(note.chat_id, chat_id);
    assert_eq!(note.sender_username, "vocals");
    assert_eq!(note.message.id, live.id);
}

#[tokio::test]
async fn invalid_event_keeps_connection_open() {
    let state = test_helpers::test_app_state();
    let a = test_helpers::seed_user(&state, "a").await;
    let b = test_helpers::seed_user(&state, "b").await;
    let chat_id = test_helpers::seed_chat(&state, a, b).await;
    let addr = spawn_server(state.clone()).await;

    let mut client = connect(addr, &format!("userId={a}&chatId={chat_id}")).await;
    wait_for_room(&state, RoomKey::Chat(chat_id), 1).await;

    send_text(&mut client, r#"{"event":"typing","data":{}}"#).await;
    assert_eq!(recv_server_event(&mut client).await, ServerEvent::error("Invalid message payload"));

    send_text(&mut client, r#"{"event":"message","data":{"content":"still here"}}"#).await;
    let ServerEvent::Message(live) = recv_server_event(&mut client).await else {
        panic!("expected message event");
    };
    assert_eq!(live.content, "still here");
}

#[tokio::test]
async fn disconnect_releases_room_membership() {
    let state = test_helpers::test_app_state();
    let user = test_helpers::seed_user(&state, "a").await;
    let addr = spawn_server(state.clone()).await;

    let mut client = connect(addr, &format!("userId={user}")).await;
    wait_for_room(&state, RoomKey::User(user), 1).await;

    client.close(None).await.expect("client close");
    wait_for_room(&state, RoomKey::User(user), 0).await;
}
