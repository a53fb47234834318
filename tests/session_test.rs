//! ログインセッションのテスト

mod support;

use review_desk::api::Method;
use review_desk::error::{ApiError, ReviewDeskError};
use review_desk::session::SESSION_EXPIRED_NOTICE;
use review_desk_common::RegisterRequest;
use serde_json::json;
use support::{profile, session, session_with, Reply, ScriptedGateway, ME};

fn auth_reply(token: &str) -> Reply {
    Reply::Json(json!({"access_token": token, "token_type": "bearer"}))
}

#[tokio::test]
async fn test_restore_without_token() {
    let gw = ScriptedGateway::new();
    let store = session_with(&gw, None);
    assert!(store.is_loading());

    assert!(store.restore().await.is_none());
    assert!(!store.is_loading());
    assert!(gw.requests().is_empty());
}

#[tokio::test]
async fn test_restore_with_valid_token() {
    let gw = ScriptedGateway::new();
    gw.push(Method::Get, ME, Reply::Json(profile(3.5, 27)));
    let store = session(&gw);

    let user = store.restore().await.expect("ユーザーが復元されない");
    assert_eq!(user.username, "asha");
    assert!(!store.is_loading());

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_reviews, 27);
    assert_eq!(stats.today_reviews, 2);
    assert_eq!(stats.streak, 6);
    assert_eq!(store.review_languages(), vec!["en".to_string(), "hi".to_string()]);
}

/// 401 はセッション切れ通知付きでログアウト
#[tokio::test]
async fn test_restore_expired_token() {
    let gw = ScriptedGateway::new();
    gw.push(
        Method::Get,
        ME,
        Reply::Fail(ApiError::from_status(401, Some("Could not validate credentials".into()))),
    );
    let store = session(&gw);

    assert!(store.restore().await.is_none());
    assert!(!store.api().has_token());
    assert!(!store.is_loading());
    assert_eq!(store.take_notice().as_deref(), Some(SESSION_EXPIRED_NOTICE));
    assert_eq!(store.take_notice(), None);
}

#[tokio::test]
async fn test_restore_other_failure_clears_token_silently() {
    let gw = ScriptedGateway::new();
    gw.push(Method::Get, ME, Reply::Fail(ApiError::transport("connection refused")));
    let store = session(&gw);

    assert!(store.restore().await.is_none());
    assert!(!store.api().has_token());
    assert_eq!(store.take_notice(), None);
}

#[tokio::test]
async fn test_login_saves_token_and_loads_user() {
    let gw = ScriptedGateway::new();
    gw.push(Method::Post, "/auth/login", auth_reply("fresh"));
    gw.push(Method::Get, ME, Reply::Json(profile(0.0, 0)));
    let store = session_with(&gw, None);

    let user = store.login("asha", "s3cret").await.unwrap();
    assert_eq!(user.email, "asha@example.com");
    assert_eq!(store.api().tokens().load().as_deref(), Some("fresh"));

    let login = &gw.requests_to(Method::Post, "/auth/login")[0];
    assert_eq!(login.bearer, None);
    assert_eq!(login.body, Some(json!({"username": "asha", "password": "s3cret"})));
    assert_eq!(gw.requests_to(Method::Get, ME)[0].bearer.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_login_failure_surfaces_detail() {
    let gw = ScriptedGateway::new();
    gw.push(
        Method::Post,
        "/auth/login",
        Reply::Fail(ApiError::from_status(401, Some("Incorrect username or password".into()))),
    );
    let store = session_with(&gw, None);

    let err = store.login("asha", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("Incorrect username or password"));
    assert!(store.user().is_none());
}

#[tokio::test]
async fn test_register_then_login() {
    let gw = ScriptedGateway::new();
    gw.push(Method::Post, "/auth/register", auth_reply("reg"));
    gw.push(Method::Post, "/auth/login", auth_reply("fresh"));
    gw.push(Method::Get, ME, Reply::Json(profile(0.0, 0)));
    let store = session_with(&gw, None);

    let request = RegisterRequest {
        username: "asha".into(),
        email: "asha@example.com".into(),
        password: "s3cret".into(),
        languages: vec!["en".into(), "hi".into()],
    };
    store.register(&request).await.unwrap();

    assert!(store.user().is_some());
    assert_eq!(store.api().tokens().load().as_deref(), Some("fresh"));
    let body = gw.requests_to(Method::Post, "/auth/register")[0].body.clone().unwrap();
    assert_eq!(body["languages"], json!(["en", "hi"]));
}

#[tokio::test]
async fn test_logout_with_message() {
    let gw = ScriptedGateway::new();
    gw.push(Method::Get, ME, Reply::Json(profile(0.0, 0)));
    let store = session(&gw);
    store.restore().await;

    store.logout("Signed out on another device");
    assert!(store.user().is_none());
    assert!(!store.api().has_token());
    assert_eq!(store.take_notice().as_deref(), Some("Signed out on another device"));

    store.logout("");
    assert_eq!(store.take_notice(), None);
}

#[tokio::test]
async fn test_refresh_failure_keeps_user() {
    let gw = ScriptedGateway::new();
    gw.push(Method::Get, ME, Reply::Json(profile(2.0, 5)));
    gw.push(Method::Get, ME, Reply::Fail(ApiError::from_status(502, None)));
    gw.push(Method::Get, ME, Reply::Json(profile(2.5, 6)));
    let store = session(&gw);
    store.restore().await;

    store.refresh_user().await;
    assert_eq!(store.user().map(|u| u.payout_balance), Some(2.0));

    store.refresh_user().await;
    assert_eq!(store.user().map(|u| u.reviews_done), Some(6));
}

#[tokio::test]
async fn test_unparseable_profile_is_parse_error() {
    let gw = ScriptedGateway::new();
    gw.push(Method::Get, ME, Reply::Json(json!("not a profile")));
    let store = session(&gw);

    let err = store.api().me().await.unwrap_err();
    assert!(matches!(err, ReviewDeskError::ApiParse(_)));
}
