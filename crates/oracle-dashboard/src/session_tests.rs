use super::*;
use crate::testing::{FakeApi, TempTokenDir};
use chrono::TimeZone;

fn session_with(api: FakeApi, name: &str) -> (Session, Arc<FakeApi>, TempTokenDir) {
    let api = Arc::new(api);
    let scratch = TempTokenDir::new(name);
    let session = Session::new(api.clone(), TokenStore::new(scratch.token_path()));
    (session, api, scratch)
}

#[tokio::test]
async fn test_login_stores_token() {
    let (session, api, _scratch) = session_with(FakeApi::new(), "session-login");
    let token = session
        .login(&Credentials::new(" a@b.com ", "password1"))
        .await
        .unwrap();

    assert_eq!(token.access_token, "token-for-a@b.com");
    assert_eq!(session.bearer().await.unwrap(), "token-for-a@b.com");
    assert_eq!(api.calls(), vec!["login:a@b.com"]);
    session.logout().await.unwrap();
}

#[tokio::test]
async fn test_invalid_form_never_reaches_backend() {
    let (session, api, _scratch) = session_with(FakeApi::new(), "session-invalid");
    let err = session
        .login(&Credentials::new("a@b.com", "short"))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Form(FormError::PasswordTooShort)));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_register_then_logs_in_once() {
    let (session, api, _scratch) = session_with(FakeApi::new(), "session-register");
    let credentials = Credentials::new("new@b.com", "password1").with_username("newbie");

    let (user, token) = session.register(&credentials).await.unwrap();
    assert_eq!(user.username(), Some("newbie"));
    assert_eq!(token.access_token, "token-for-new@b.com");
    assert_eq!(api.calls(), vec!["register:new@b.com:newbie", "login:new@b.com"]);
    session.logout().await.unwrap();
}

#[tokio::test]
async fn test_failed_login_shows_server_detail() {
    let (session, _api, _scratch) = session_with(FakeApi::new().failing_login(401), "session-fail");
    let err = session
        .login(&Credentials::new("a@b.com", "password1"))
        .await
        .unwrap_err();

    assert_eq!(err.user_message("Login failed."), "Invalid credentials");
    assert!(matches!(session.bearer().await, Err(SessionError::NotLoggedIn)));
}

#[tokio::test]
async fn test_expired_token_is_refused() {
    let (session, api, _scratch) = session_with(FakeApi::new().with_expiry("2025-11-14T12:34:56"), "session-expired");
    session
        .login(&Credentials::new("a@b.com", "password1"))
        .await
        .unwrap();

    let before = Utc.with_ymd_and_hms(2025, 11, 14, 0, 0, 0).unwrap();
    let after = Utc.with_ymd_and_hms(2025, 11, 15, 0, 0, 0).unwrap();
    assert!(session.bearer_at(before).await.is_ok());
    assert!(matches!(session.bearer_at(after).await, Err(SessionError::Expired)));

    assert!(matches!(session.usage().await, Err(SessionError::Expired)));
    assert_eq!(api.calls(), vec!["login:a@b.com"]);
    session.logout().await.unwrap();
}

#[tokio::test]
async fn test_expiry_check_can_be_disabled() {
    let api = Arc::new(FakeApi::new().with_expiry("2000-01-01T00:00:00"));
    let scratch = TempTokenDir::new("session-noexpiry");
    let session = Session::new(api.clone(), TokenStore::new(scratch.token_path()))
        .with_expiry_check(false);
    session
        .login(&Credentials::new("a@b.com", "password1"))
        .await
        .unwrap();

    let me = session.me().await.unwrap();
    assert_eq!(me.email(), Some("user@example.com"));
    assert_eq!(api.calls(), vec!["login:a@b.com", "me:token-for-a@b.com"]);
    session.logout().await.unwrap();
}

#[tokio::test]
async fn test_authenticated_wrappers_pass_stored_token() {
    let (session, api, _scratch) = session_with(FakeApi::new(), "session-wrappers");
    session
        .login(&Credentials::new("a@b.com", "password1"))
        .await
        .unwrap();

    session.usage().await.unwrap();
    session.preferences().await.unwrap();
    session.update_preferences(&Preferences::default()).await.unwrap();
    session.recent_trades().await.unwrap();

    let token = "token-for-a@b.com";
    assert_eq!(
        api.calls()[1..],
        [
            format!("usage:{token}"),
            format!("preferences:{token}"),
            format!("update_preferences:{token}"),
            format!("trades:{token}"),
        ]
    );
    session.logout().await.unwrap();
}

#[tokio::test]
async fn test_logged_out_calls_fail_locally() {
    let (session, api, _scratch) = session_with(FakeApi::new(), "session-loggedout");
    session.logout().await.unwrap();

    assert!(matches!(session.recent_trades().await, Err(SessionError::NotLoggedIn)));
    assert!(api.calls().is_empty());
}
