use super::*;

use crate::test_support::{FakeBackend, FakePortalApi};

fn manager(api: &Arc<FakePortalApi>) -> SessionManager {
    SessionManager::new(api.clone(), DemoCredentials::default())
}

#[test]
fn unauthenticated_session_has_empty_credential_and_headers() {
    let api = Arc::new(FakePortalApi::with_token("tok123"));
    let session = manager(&api);
    assert_eq!(session.state(), &AuthState::SignedOut);
    assert_eq!(session.credential(), "");
    assert!(session.auth_headers().is_empty());
}

#[tokio::test]
async fn seeds_then_logs_in_with_demo_credentials() {
    let api = Arc::new(FakePortalApi::with_token("tok123"));
    let mut session = manager(&api);

    let state = session.acquire_session().await.expect("sign in").clone();

    assert_eq!(
        state,
        AuthState::SignedIn {
            token: "tok123".to_string()
        }
    );
    assert_eq!(session.credential(), "tok123");
    assert_eq!(
        session.auth_headers().get(AUTHORIZATION).map(|v| v.as_bytes()),
        Some(&b"Bearer tok123"[..])
    );
    assert_eq!(
        api.calls(),
        vec!["POST /setup/seed-admin", "POST /auth/login"]
    );
    let backend = api.backend();
    assert_eq!(backend.login_credentials[0].email, "admin@example.com");
    assert_eq!(backend.login_credentials[0].password, "admin123");
}

#[tokio::test]
async fn seed_failure_does_not_block_login() {
    let api = Arc::new(FakePortalApi::new(FakeBackend {
        login_token: Some("tok123".to_string()),
        seed_status: Some(500),
        ..FakeBackend::default()
    }));
    let mut session = manager(&api);

    session.acquire_session().await.expect("sign in");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn missing_token_is_reported_as_invalid_credentials() {
    let api = Arc::new(FakePortalApi::new(FakeBackend::default()));
    let mut session = manager(&api);

    let err = session.acquire_session().await.expect_err("must fail");

    assert!(matches!(err, ClientError::InvalidCredentials));
    assert_eq!(session.state(), &AuthState::InvalidCredentials);
    assert_eq!(session.credential(), "");
    assert!(session.auth_headers().is_empty());
}

#[tokio::test]
async fn unauthorized_login_is_reported_as_invalid_credentials() {
    let api = Arc::new(FakePortalApi::new(FakeBackend {
        login_status: Some(401),
        ..FakeBackend::default()
    }));
    let mut session = manager(&api);

    let err = session.acquire_session().await.expect_err("must fail");
    assert!(matches!(err, ClientError::InvalidCredentials));
    assert_eq!(session.state(), &AuthState::InvalidCredentials);
}

#[tokio::test]
async fn server_error_on_login_leaves_state_untouched() {
    let api = Arc::new(FakePortalApi::new(FakeBackend {
        login_status: Some(502),
        ..FakeBackend::default()
    }));
    let mut session = manager(&api);

    let err = session.acquire_session().await.expect_err("must fail");
    assert_eq!(err.status(), Some(502));
    assert_eq!(session.state(), &AuthState::SignedOut);
}

#[tokio::test]
async fn failed_relogin_keeps_existing_token() {
    let api = Arc::new(FakePortalApi::with_token("tok123"));
    let mut session = manager(&api);
    session.acquire_session().await.expect("sign in");

    api.backend().login_token = None;
    session.acquire_session().await.expect_err("must fail");

    assert_eq!(session.credential(), "tok123");
}

#[tokio::test]
async fn tokens_that_cannot_be_sent_as_headers_are_rejected() {
    let api = Arc::new(FakePortalApi::with_token("tok\n123"));
    let mut session = manager(&api);

    session.acquire_session().await.expect_err("must fail");
    assert_eq!(session.state(), &AuthState::InvalidCredentials);
}
