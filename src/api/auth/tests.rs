use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
async fn register_then_login_roundtrip() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/register"),
            None,
            Some(json!({"username": "alice", "password": "correct-horse-battery"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = test_support::read_json(response).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "student");
    assert!(body.get("hashed_password").is_none());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/login"),
            None,
            Some(json!({"username": "alice", "password": "correct-horse-battery"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert!(body["access"].as_str().is_some());
    assert!(body["refresh"].as_str().is_some());
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn register_rejects_taken_username_and_short_password() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    test_support::insert_user(ctx.state.db(), "bob", "a-long-password").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/register"),
            None,
            Some(json!({"username": "bob", "password": "another-password"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Username already taken");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/register"),
            None,
            Some(json!({"username": "carol", "password": "short"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_one_opaque_message() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    test_support::insert_user(ctx.state.db(), "dave", "a-long-password").await;

    for payload in [
        json!({"username": "dave", "password": "wrong-password"}),
        json!({"username": "nobody", "password": "a-long-password"}),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("{prefix}/login"),
                None,
                Some(payload),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = test_support::read_json(response).await;
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn refresh_issues_new_access_token() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    test_support::insert_user(ctx.state.db(), "erin", "a-long-password").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/login"),
            None,
            Some(json!({"username": "erin", "password": "a-long-password"})),
        ))
        .await
        .expect("response");
    let body = test_support::read_json(response).await;
    let refresh = body["refresh"].as_str().expect("refresh token").to_string();
    let access = body["access"].as_str().expect("access token").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/token/refresh"),
            None,
            Some(json!({"refresh": refresh})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert!(body["access"].as_str().is_some());

    // An access token is not accepted where a refresh token is expected.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/token/refresh"),
            None,
            Some(json!({"refresh": access})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verify_accepts_valid_and_rejects_garbage() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    let user = test_support::insert_user(ctx.state.db(), "frank", "a-long-password").await;
    let token = test_support::bearer_token(&ctx.state, &user);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/token/verify"),
            None,
            Some(json!({"token": token})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/token/verify"),
            None,
            Some(json!({"token": "not-a-jwt"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
