use tokio::time::{Duration, timeout};

use super::*;
use crate::services::registry::RoomKey;
use crate::state::test_helpers;

fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

async fn recv_event(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("event receive timed out")
        .expect("channel closed")
}

// =============================================================================
// HANDSHAKE
// =============================================================================

#[test]
fn handshake_requires_user_id() {
    assert_eq!(Handshake::from_query(&[]), Err(Rejection::MissingUserId));
    assert_eq!(Handshake::from_query(&query(&[("userId", "  ")])), Err(Rejection::MissingUserId));
    assert_eq!(Rejection::MissingUserId.to_string(), "userId required in query");
}

#[test]
fn handshake_first_value_wins() {
    let first = Uuid::new_v4();
    let params = query(&[("userId", &first.to_string()), ("userId", "not-a-uuid")]);
    assert_eq!(Handshake::from_query(&params), Ok(Handshake { user_id: first, chat_id: None }));
}

#[test]
fn handshake_rejects_malformed_ids() {
    let user = Uuid::new_v4().to_string();
    assert_eq!(
        Handshake::from_query(&query(&[("userId", "bob")])),
        Err(Rejection::MalformedId("userId"))
    );
    assert_eq!(
        Handshake::from_query(&query(&[("userId", &user), ("chatId", "42")])),
        Err(Rejection::MalformedId("chatId"))
    );
}

#[test]
fn handshake_with_empty_chat_id_is_user_room() {
    let user = Uuid::new_v4();
    let params = query(&[("userId", &user.to_string()), ("chatId", "")]);
    assert_eq!(Handshake::from_query(&params).unwrap().chat_id, None);
}

// =============================================================================
// ADMISSION
// =============================================================================

#[tokio::test]
async fn user_only_handshake_joins_user_room() {
    let state = test_helpers::test_app_state();
    let user = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);

    let session = admit(&state, &query(&[("userId", &user.to_string())]), Uuid::new_v4(), tx)
        .await
        .expect("admitted");

    assert_eq!(session.membership, Membership::UserRoom);
    assert_eq!(session.chat_id(), None);
    assert_eq!(session.room(), RoomKey::User(user));
    assert_eq!(state.registry.room_size(RoomKey::User(user)).await, 1);
}

#[tokio::test]
async fn participant_joins_chat_room() {
    let state = test_helpers::test_app_state();
    let a = test_helpers::seed_user(&state, "a").await;
    let b = test_helpers::seed_user(&state, "b").await;
    let chat_id = test_helpers::seed_chat(&state, a, b).await;
    let (tx, _rx) = mpsc::channel(8);

    let params = query(&[("userId", &b.to_string()), ("chatId", &chat_id.to_string())]);
    let session = admit(&state, &params, Uuid::new_v4(), tx).await.expect("admitted");

    assert_eq!(session.membership, Membership::ChatRoom(chat_id));
    assert_eq!(session.room(), RoomKey::Chat(chat_id));
    assert!(state.registry.is_viewing_chat(b, chat_id).await);
}

#[tokio::test]
async fn outsider_is_denied_and_not_admitted() {
    let state = test_helpers::test_app_state();
    let a = test_helpers::seed_user(&state, "a").await;
    let b = test_helpers::seed_user(&state, "b").await;
    let d = test_helpers::seed_user(&state, "d").await;
    let chat_id = test_helpers::seed_chat(&state, a, b).await;
    let (tx, _rx) = mpsc::channel(8);

    let params = query(&[("userId", &d.to_string()), ("chatId", &chat_id.to_string())]);
    let rejection = admit(&state, &params, Uuid::new_v4(), tx).await.unwrap_err();

    assert_eq!(rejection, Rejection::AccessDenied);
    assert_eq!(error_event(&rejection), ServerEvent::error("Chat not found or access denied"));
    assert_eq!(state.registry.room_size(RoomKey::Chat(chat_id)).await, 0);
    assert_eq!(state.registry.room_size(RoomKey::User(d)).await, 0);
}

#[tokio::test]
async fn unknown_chat_looks_like_denied_chat() {
    let state = test_helpers::test_app_state();
    let a = test_helpers::seed_user(&state, "a").await;
    let (tx, _rx) = mpsc::channel(8);

    let params = query(&[("userId", &a.to_string()), ("chatId", &Uuid::new_v4().to_string())]);
    assert_eq!(admit(&state, &params, Uuid::new_v4(), tx).await, Err(Rejection::AccessDenied));
}

// =============================================================================
// INBOUND
// =============================================================================

#[tokio::test]
async fn inbound_message_from_chat_session_is_broadcast() {
    let state = test_helpers::test_app_state();
    let a = test_helpers::seed_user(&state, "a").await;
    let b = test_helpers::seed_user(&state, "b").await;
    let chat_id = test_helpers::seed_chat(&state, a, b).await;
    let (tx, mut rx) = mpsc::channel(8);
    let params = query(&[("userId", &a.to_string()), ("chatId", &chat_id.to_string())]);
    let session = admit(&state, &params, Uuid::new_v4(), tx).await.unwrap();

    let replies = handle_inbound_text(&state, &session, r#"{"event":"message","data":{"content":"hey"}}"#).await;

    assert!(replies.is_empty());
    let ServerEvent::Message(msg) = recv_event(&mut rx).await else {
        panic!("expected message broadcast");
    };
    assert_eq!(msg.content, "hey");
    assert_eq!(msg.chat_id, chat_id);
    assert_eq!(msg.sender_id, a);
}

#[tokio::test]
async fn malformed_and_unknown_events_get_invalid_payload() {
    let state = test_helpers::test_app_state();
    let session = Session { connection_id: Uuid::new_v4(), user_id: Uuid::new_v4(), membership: Membership::UserRoom };
    let expected = vec![ServerEvent::error("Invalid message payload")];

    for text in [
        "not json",
        r#"{"event":"typing","data":{}}"#,
        r#"{"event":"message","data":{"content":"hi","chatId":"x"}}"#,
        r#"{"event":"message","data":{}}"#,
    ] {
        assert_eq!(handle_inbound_text(&state, &session, text).await, expected, "input: {text}");
    }
}

#[tokio::test]
async fn message_from_user_room_session_is_invalid() {
    let state = test_helpers::test_app_state();
    let session = Session { connection_id: Uuid::new_v4(), user_id: Uuid::new_v4(), membership: Membership::UserRoom };

    let replies = handle_inbound_text(&state, &session, r#"{"event":"message","data":{"content":"hi"}}"#).await;
    assert_eq!(replies, vec![ServerEvent::error("Invalid message payload")]);
}

#[tokio::test]
async fn blank_content_errors_to_sender_only() {
    let state = test_helpers::test_app_state();
    let a = test_helpers::seed_user(&state, "a").await;
    let b = test_helpers::seed_user(&state, "b").await;
    let chat_id = test_helpers::seed_chat(&state, a, b).await;
    let (tx, mut rx) = mpsc::channel(8);
    let params = query(&[("userId", &a.to_string()), ("chatId", &chat_id.to_string())]);
    let session = admit(&state, &params, Uuid::new_v4(), tx).await.unwrap();

    let replies = handle_inbound_text(&state, &session, r#"{"event":"message","data":{"content":"   "}}"#).await;

    assert_eq!(replies, vec![ServerEvent::error("Invalid message payload")]);
    assert!(timeout(Duration::from_millis(80), rx.recv()).await.is_err());
    assert!(state.store.list_messages(chat_id, a).await.unwrap().is_empty());
}
