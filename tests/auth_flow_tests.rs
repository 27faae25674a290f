//! # Authentication Flow Tests
//!
//! Login cookie, identity resolution, admin guard and the OAuth redirect leg.

mod common;

use axum::http::{header, HeaderValue, StatusCode};
use serde_json::{json, Value};

use common::{gateway, gateway_with, test_config, user_json, Calls};
use shop_gateway::core::config::OAuthProviderConfig;
use shop_gateway::dto::user::Role;
use shop_gateway::rpc::exception::{ErrorCode, TypedRpcException};
use shop_gateway::rpc::patterns::{auth, notification, user};
use shop_gateway::rpc::MessageRouter;

fn auth_service() -> MessageRouter {
    let router = MessageRouter::new();
    router.on(auth::LOGIN, |payload: Value| async move {
        if payload["password"] == "correct-horse" {
            Ok(user_json("u1"))
        } else {
            Err(TypedRpcException::new(ErrorCode::Unauthorized, "auth.errors.invalidCredentials"))
        }
    });
    router.on(user::GET_USER_BY_ID, |payload: Value| async move {
        Ok(user_json(payload["id"].as_str().unwrap_or_default()))
    });
    router
}

#[tokio::test]
async fn test_login_sets_cookie_that_authenticates_me() {
    let gw = gateway(auth_service());

    let response = gw
        .server
        .post("/auth/login")
        .json(&json!({ "email": " U1@Shop.Test ", "password": "correct-horse" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let token = body["data"]["accessToken"].as_str().expect("token").to_string();
    assert_eq!(body["data"]["user"]["id"], "u1");
    assert_eq!(body["data"]["expiresIn"], 86400);

    let set_cookie = response.headers().get(header::SET_COOKIE).expect("cookie").to_str().unwrap().to_string();
    assert!(set_cookie.starts_with(&format!("access_token={};", token)));
    assert!(set_cookie.contains("HttpOnly"));

    let cookie = HeaderValue::from_str(&format!("access_token={}", token)).unwrap();
    let me = gw.server.get("/auth/me").add_header(header::COOKIE, cookie).await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["data"]["email"], "u1@shop.test");
}

#[tokio::test]
async fn test_wrong_password_is_propagated_unchanged() {
    let gw = gateway(auth_service());

    let response = gw
        .server
        .post("/auth/login")
        .json(&json!({ "email": "u1@shop.test", "password": "nope" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(response.json::<Value>()["messageKey"], "auth.errors.invalidCredentials");
}

#[tokio::test]
async fn test_logout_expires_cookie() {
    let gw = gateway(auth_service());

    let response = gw.server.post("/auth/logout").await;

    response.assert_status_ok();
    let set_cookie = response.headers().get(header::SET_COOKIE).expect("cookie").to_str().unwrap();
    assert!(set_cookie.starts_with("access_token=; Path=/; Max-Age=0"));
}

#[tokio::test]
async fn test_me_without_token() {
    let gw = gateway(auth_service());

    let response = gw.server.get("/auth/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["messageKey"], "common.errors.unauthorized");
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let gw = gateway(auth_service());

    let anonymous = gw.server.get("/admin/users").await;
    anonymous.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.json::<Value>()["messageKey"], "auth.errors.missingToken");

    let (name, value) = gw.bearer("u1", Role::User);
    let customer = gw.server.get("/admin/users").add_header(name, value).await;
    customer.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(customer.json::<Value>()["messageKey"], "auth.errors.adminOnly");
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let gw = gateway(auth_service());

    let response = gw
        .server
        .get("/admin/users")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer not.a.jwt"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["messageKey"], "auth.errors.invalidToken");
}

#[tokio::test]
async fn test_register_emits_event_with_request_language() {
    let events = Calls::default();
    let router = auth_service();
    router.on(auth::REGISTER, |payload: Value| async move {
        assert_eq!(payload["email"], "new@shop.test");
        Ok(user_json("u2"))
    });
    let seen = events.clone();
    router.on_event(notification::USER_REGISTERED, move |payload: Value| {
        assert_eq!(payload["lang"], "vi");
        seen.hit();
        async {}
    });
    let gw = gateway(router);

    let response = gw
        .server
        .post("/auth/register")
        .add_header(header::ACCEPT_LANGUAGE, HeaderValue::from_static("vi-VN,vi;q=0.9"))
        .json(&json!({ "email": "New@Shop.Test", "password": "long-enough", "name": "Minh" }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["id"], "u2");
    assert_eq!(events.count(), 1);
}

#[tokio::test]
async fn test_unconfigured_oauth_provider() {
    let gw = gateway(auth_service());

    let response = gw.server.get("/auth/google").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["messageKey"], "auth.errors.unsupportedProvider");
}

#[tokio::test]
async fn test_oauth_redirect_and_stale_callback() {
    let mut config = test_config();
    config.auth.oauth.google = Some(OAuthProviderConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_url: "http://localhost:3000/auth/google/callback".to_string(),
        scopes: vec![],
    });
    let gw = gateway_with(auth_service(), config);

    let redirect = gw.server.get("/auth/google").await;
    redirect.assert_status(StatusCode::SEE_OTHER);
    let location = redirect.headers().get(header::LOCATION).expect("location").to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/"));
    assert!(location.contains("code_challenge_method=S256"));
    assert!(location.contains("state="));

    let callback = gw
        .server
        .get("/auth/google/callback")
        .add_query_param("code", "abc")
        .add_query_param("state", "never-issued")
        .await;
    callback.assert_status(StatusCode::SEE_OTHER);
    let location = callback.headers().get(header::LOCATION).expect("location").to_str().unwrap();
    assert!(location.starts_with("http://localhost:5173/auth/callback?status=failed"));
    assert!(location.contains("reason=auth.errors.invalidOauthState"));
    assert!(callback.headers().get(header::SET_COOKIE).is_none());
}
