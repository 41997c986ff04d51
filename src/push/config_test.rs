use super::*;

/// # Safety
/// Mutates process environment; only this test touches the `PUSH_*` keys.
unsafe fn clear_push_env() {
    unsafe {
        std::env::remove_var("PUSH_ENDPOINT");
        std::env::remove_var("PUSH_API_KEY_ENV");
        std::env::remove_var("PUSH_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("PUSH_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("JAMMIT_TEST_PUSH_KEY");
    }
}

#[test]
fn from_env_requires_endpoint_and_key_then_parses_timeouts() {
    unsafe { clear_push_env() };
    assert!(matches!(
        PushConfig::from_env(),
        Err(PushError::NotConfigured { var }) if var == "PUSH_ENDPOINT"
    ));

    unsafe {
        std::env::set_var("PUSH_ENDPOINT", "https://push.example.test/send");
        std::env::set_var("PUSH_API_KEY_ENV", "JAMMIT_TEST_PUSH_KEY");
    }
    assert!(matches!(
        PushConfig::from_env(),
        Err(PushError::NotConfigured { var }) if var == "JAMMIT_TEST_PUSH_KEY"
    ));

    unsafe { std::env::set_var("JAMMIT_TEST_PUSH_KEY", "secret") };
    let cfg = PushConfig::from_env().unwrap();
    assert_eq!(cfg.endpoint, "https://push.example.test/send");
    assert_eq!(cfg.api_key, "secret");
    assert_eq!(
        cfg.timeouts,
        PushTimeouts {
            request_secs: DEFAULT_PUSH_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_PUSH_CONNECT_TIMEOUT_SECS
        }
    );

    unsafe {
        std::env::set_var("PUSH_REQUEST_TIMEOUT_SECS", "30");
        std::env::set_var("PUSH_CONNECT_TIMEOUT_SECS", "nope");
    }
    let cfg = PushConfig::from_env().unwrap();
    assert_eq!(cfg.timeouts, PushTimeouts { request_secs: 30, connect_secs: DEFAULT_PUSH_CONNECT_TIMEOUT_SECS });

    unsafe { clear_push_env() };
}
