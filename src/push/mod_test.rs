use super::*;
use config::PushTimeouts;

#[test]
fn success_statuses_pass() {
    assert!(check_status(200, String::new()).is_ok());
    assert!(check_status(204, String::new()).is_ok());
}

#[test]
fn error_statuses_keep_body() {
    match check_status(401, "bad key".into()) {
        Err(PushError::Rejected { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[test]
fn from_config_keeps_endpoint() {
    let client = PushClient::from_config(PushConfig {
        endpoint: "https://push.example.test/send".into(),
        api_key: "k".into(),
        timeouts: PushTimeouts { request_secs: 1, connect_secs: 1 },
    })
    .expect("client builds");
    assert_eq!(client.endpoint(), "https://push.example.test/send");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_request_error() {
    let client = PushClient::from_config(PushConfig {
        endpoint: "http://127.0.0.1:9/send".into(),
        api_key: "k".into(),
        timeouts: PushTimeouts { request_secs: 2, connect_secs: 1 },
    })
    .expect("client builds");

    let msg = PushMessage::chat_message("t", uuid::Uuid::new_v4(), "s", "hi");
    assert!(matches!(client.send(&msg).await, Err(PushError::Request(_))));
}
