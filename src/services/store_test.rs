use super::*;

fn chat(user1_id: Uuid, user2_id: Uuid) -> Chat {
    Chat {
        id: Uuid::new_v4(),
        user1_id,
        user2_id,
        last_message: None,
        last_message_timestamp: None,
        created_at: 1,
        updated_at: 1,
    }
}

#[test]
fn other_participant_is_symmetric() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = chat(a, b);
    assert_eq!(c.other_participant(a), b);
    assert_eq!(c.other_participant(b), a);
    assert!(c.has_participant(a));
    assert!(!c.has_participant(Uuid::new_v4()));
}

#[test]
fn joins_ignores_pair_order() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = chat(a, b);
    assert!(c.joins(a, b));
    assert!(c.joins(b, a));
    assert!(!c.joins(a, Uuid::new_v4()));
}

#[test]
fn summary_text_truncates_to_two_hundred_chars() {
    let long = "x".repeat(250);
    assert_eq!(summary_text(&long).chars().count(), LAST_MESSAGE_MAX_CHARS);
    assert_eq!(summary_text("short"), "short");
}

#[test]
fn not_found_hides_cause() {
    assert_eq!(ChatError::NotFound.to_string(), "Chat not found or access denied");
    assert_eq!(ChatError::NotFound.error_code(), "E_CHAT_NOT_FOUND");
}

#[test]
fn users_not_found_lists_missing_ids() {
    let a = Uuid::nil();
    let err = ChatError::UsersNotFound(vec![a]);
    assert_eq!(err.to_string(), format!("user(s) not found: {a}"));
}

#[test]
fn database_errors_are_retryable_with_generic_client_text() {
    let err = ChatError::Database(sqlx::Error::PoolTimedOut);
    assert!(err.retryable());
    assert_eq!(err.client_message(), "Failed to send message");
    assert!(!ChatError::invalid_payload().retryable());
    assert_eq!(ChatError::invalid_payload().client_message(), INVALID_PAYLOAD_MESSAGE);
}

#[test]
fn distinct_users_and_username_validation() {
    let a = Uuid::new_v4();
    assert!(matches!(ensure_distinct_users(a, a), Err(ChatError::Validation(_))));
    assert!(ensure_distinct_users(a, Uuid::new_v4()).is_ok());
    assert_eq!(normalize_username("  guitar_hero ").unwrap(), "guitar_hero");
    assert!(normalize_username("   ").is_err());
}

#[test]
fn message_converts_to_wire_form() {
    let msg = Message {
        id: Uuid::new_v4(),
        chat_id: Uuid::new_v4(),
        sender_id: Uuid::new_v4(),
        content: "hello".into(),
        created_at: 42,
    };
    let wire = ChatMessage::from(&msg);
    assert_eq!(wire.id, msg.id);
    assert_eq!(wire.chat_id, msg.chat_id);
    assert_eq!(wire.content, "hello");
    assert_eq!(wire.created_at, 42);
}
