mod support;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Duration;
use qalab_shop::auth::TokenService;
use serde_json::json;
use support::{Auth, Reply, TestApp, API_KEY};

fn session_cookie(reply: &Reply) -> Option<String> {
    reply
        .headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("auth-token="))
        .map(str::to_string)
}

fn cookie_token(set_cookie: &str) -> &str {
    set_cookie.trim_start_matches("auth-token=").split(';').next().unwrap_or_default()
}

#[tokio::test]
async fn test_bearer_and_cookie_resolve_same_user() {
    let app = TestApp::new().await;
    let token = app.token(&app.user);

    let bearer = app.send(Method::GET, "/api/auth/profile", Auth::Bearer(&token), None).await;
    let cookie = app.send(Method::GET, "/api/auth/profile", Auth::Cookie(&token), None).await;
    assert_eq!(bearer.status, StatusCode::OK);
    assert_eq!(cookie.status, StatusCode::OK);
    assert_eq!(bearer.body["user"]["id"], cookie.body["user"]["id"]);
    assert_eq!(bearer.body["user"]["email"], "user@qalab.hu");
    assert!(bearer.body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_bad_cookie_falls_back_to_bearer() {
    let app = TestApp::new().await;
    let token = app.token(&app.admin);
    let request = Request::builder()
        .uri("/api/auth/profile")
        .header(header::COOKIE, "auth-token=garbage")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let reply = app.raw(request).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["user"]["role"], "ADMIN");
}

#[tokio::test]
async fn test_token_failures() {
    let app = TestApp::new().await;

    let missing = app.send(Method::GET, "/api/auth/profile", Auth::None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.code(), "MISSING_AUTH");

    let invalid = app.send(Method::GET, "/api/auth/profile", Auth::Bearer("not.a.jwt"), None).await;
    assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.code(), "INVALID_TOKEN");

    let forged = TokenService::new("some-other-secret").sign(&app.user).unwrap();
    let reply = app.send(Method::GET, "/api/auth/profile", Auth::Bearer(&forged), None).await;
    assert_eq!(reply.code(), "INVALID_TOKEN");

    let expired = TokenService::new(&app.state.config.jwt_secret).with_ttl(Duration::hours(-1)).sign(&app.user).unwrap();
    let reply = app.send(Method::GET, "/api/auth/profile", Auth::Bearer(&expired), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.code(), "INVALID_TOKEN");
}

#[tokio::test]
async fn test_api_key_reads_product() {
    let app = TestApp::new().await;
    let uri = format!("/api/products/{}", app.products[0].id);

    let keyed = app.send(Method::GET, &uri, Auth::ApiKey(API_KEY), None).await;
    assert_eq!(keyed.status, StatusCode::OK);
    assert_eq!(keyed.body["data"]["name"], app.products[0].name.as_str());

    let wrong = app.send(Method::GET, &uri, Auth::ApiKey("guess"), None).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.code(), "MISSING_AUTH");

    let anonymous = app.send(Method::GET, &uri, Auth::None, None).await;
    assert_eq!(anonymous.code(), "MISSING_AUTH");
}

#[tokio::test]
async fn test_api_key_write_needs_json_content_type() {
    let app = TestApp::new().await;
    let order = app.place_order(&app.user).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/orders/{}/cancel", order.id))
        .header("x-api-key", API_KEY)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("cancel"))
        .unwrap();

    let reply = app.raw(request).await;
    assert_eq!(reply.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(reply.code(), "INVALID_CONTENT_TYPE");
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = TestApp::new().await;
    let credentials = json!({"email": "new@qalab.hu", "password": "secret1"});

    let registered = app
        .send(Method::POST, "/api/auth/register", Auth::None, Some(json!({"name": "New Tester", "email": "new@qalab.hu", "password": "secret1"})))
        .await;
    assert_eq!(registered.status, StatusCode::OK);
    assert_eq!(registered.body["message"], "User registered successfully");
    assert_eq!(registered.body["user"]["role"], "USER");
    let cookie = session_cookie(&registered).expect("register sets the session cookie");
    assert!(cookie.contains("HttpOnly"));

    let profile = app.send(Method::GET, "/api/auth/profile", Auth::Cookie(cookie_token(&cookie)), None).await;
    assert_eq!(profile.body["user"]["email"], "new@qalab.hu");

    let logged_in = app.send(Method::POST, "/api/auth/login", Auth::None, Some(credentials)).await;
    assert_eq!(logged_in.status, StatusCode::OK);
    assert_eq!(logged_in.body["message"], "Login successful");
    assert!(session_cookie(&logged_in).is_some());

    let token = cookie_token(&cookie).to_string();
    let logged_out = app.send(Method::POST, "/api/auth/logout", Auth::Cookie(&token), None).await;
    assert_eq!(logged_out.status, StatusCode::OK);
    let cleared = session_cookie(&logged_out).expect("logout clears the session cookie");
    assert!(cleared.starts_with("auth-token=;"));
}

#[tokio::test]
async fn test_register_rejects_taken_email_and_bad_input() {
    let app = TestApp::new().await;

    let taken = app
        .send(Method::POST, "/api/auth/register", Auth::None, Some(json!({"name": "Again", "email": "user@qalab.hu", "password": "secret1"})))
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);
    assert_eq!(taken.code(), "EMAIL_TAKEN");

    let invalid = app
        .send(Method::POST, "/api/auth/register", Auth::None, Some(json!({"name": "X", "email": "nope", "password": "123"})))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.code(), "VALIDATION_FAILED");
    assert_eq!(invalid.body["error"]["details"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new().await;
    app.send(Method::POST, "/api/auth/register", Auth::None, Some(json!({"name": "Pat", "email": "pat@qalab.hu", "password": "right-one"})))
        .await;

    let reply = app
        .send(Method::POST, "/api/auth/login", Auth::None, Some(json!({"email": "pat@qalab.hu", "password": "wrong-one"})))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.code(), "INVALID_CREDENTIALS");
    assert!(session_cookie(&reply).is_none());

    let unknown = app
        .send(Method::POST, "/api/auth/login", Auth::None, Some(json!({"email": "ghost@qalab.hu", "password": "whatever"})))
        .await;
    assert_eq!(unknown.code(), "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new().await;
    let token = app.token(&app.user);

    let updated = app
        .send(Method::PUT, "/api/auth/profile", Auth::Bearer(&token), Some(json!({"name": "Renamed", "email": "renamed@qalab.hu"})))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["user"]["name"], "Renamed");

    let clash = app
        .send(Method::PUT, "/api/auth/profile", Auth::Bearer(&token), Some(json!({"name": "Renamed", "email": "admin@qalab.hu"})))
        .await;
    assert_eq!(clash.status, StatusCode::CONFLICT);
    assert_eq!(clash.code(), "EMAIL_TAKEN");
}

#[tokio::test]
async fn test_token_endpoint_issues_usable_token() {
    let app = TestApp::new().await;
    let session = app.token(&app.user);

    let reply = app.send(Method::GET, "/api/auth/token", Auth::Cookie(&session), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let data = &reply.body["data"];
    assert_eq!(data["usage"]["headerName"], "Authorization");
    assert!(data["usage"]["example"].as_str().unwrap().contains("http://localhost:8083/api/products"));

    let minted = data["accessToken"].as_str().unwrap();
    let orders = app.send(Method::GET, "/api/orders", Auth::Bearer(minted), None).await;
    assert_eq!(orders.status, StatusCode::OK);

    let keyed = app.send(Method::GET, "/api/auth/token", Auth::ApiKey(API_KEY), None).await;
    assert_eq!(keyed.code(), "MISSING_AUTH");
}
