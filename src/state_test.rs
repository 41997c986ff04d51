use super::*;
use crate::services::registry::RoomKey;

#[test]
fn new_state_uses_default_buffer_and_clamps_override() {
    let state = test_helpers::test_app_state();
    assert_eq!(state.ws_client_buffer, DEFAULT_WS_CLIENT_BUFFER);
    assert!(state.push.is_none());

    let state = state.with_ws_client_buffer(0);
    assert_eq!(state.ws_client_buffer, 1);
}

#[tokio::test]
async fn clones_share_store_and_registry() {
    let state = test_helpers::test_app_state();
    let clone = state.clone();

    let a = test_helpers::seed_user(&state, "a").await;
    let b = test_helpers::seed_user(&clone, "b").await;
    let chat_id = test_helpers::seed_chat(&state, a, b).await;
    assert_eq!(clone.store.find_participant_chat(chat_id, a).await.unwrap().id, chat_id);

    let (tx, _rx) = tokio::sync::mpsc::channel(1);
    clone.registry.admit_user_room(a, uuid::Uuid::new_v4(), tx).await;
    assert_eq!(state.registry.room_size(RoomKey::User(a)).await, 1);
}
