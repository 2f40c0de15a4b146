//! Shared helpers for the API integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use database::Database;
use server::auth::AuthKeys;
use server::catalog::GameCatalog;
use server::state::AppState;

/// App backed by a fresh in-memory database and the built-in game catalog.
pub async fn test_app() -> Router {
    test_app_with_catalog(GameCatalog::builtin()).await
}

/// App with a custom game catalog.
pub async fn test_app_with_catalog(catalog: GameCatalog) -> Router {
    // one connection keeps the in-memory database alive across requests
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();
    database::bond::seed_questions(db.pool()).await.unwrap();

    let state = AppState::new(db, catalog, AuthKeys::new("test-secret", false));
    server::routes::router().with_state(state)
}

/// Build a JSON request. `cookie` carries the session, `body` the payload.
pub fn req(method: &str, path: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie.to_string());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request, returning the status and the parsed JSON body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// The `name=value` pair of the session cookie set by `response`.
pub fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .unwrap()
        .to_string()
}

/// Sign up an adult user, returning the session cookie and the user id.
pub async fn signup(app: &Router, full_name: &str, email: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(req(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({
                "fullName": full_name,
                "email": email,
                "password": "password123",
                "dateOfBirth": "1995-04-12",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = session_cookie(&response);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    (cookie, body["user"]["id"].as_str().unwrap().to_string())
}

/// Complete onboarding with the given language pair.
pub async fn onboard(app: &Router, cookie: &str, full_name: &str, native: &str, learning: &str) {
    let (status, _) = send(
        app,
        req(
            "POST",
            "/api/auth/onboarding",
            Some(cookie),
            Some(json!({
                "fullName": full_name,
                "bio": "Here to learn",
                "nativeLanguage": native,
                "learningLanguage": learning,
                "location": "Mumbai",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

/// Make the two sessions friends.
pub async fn befriend(app: &Router, sender: &str, recipient: &str, recipient_id: &str) {
    let (status, body) = send(
        app,
        req(
            "POST",
            &format!("/api/users/friend-request/{recipient_id}"),
            Some(sender),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let request_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app,
        req(
            "PUT",
            &format!("/api/users/friend-request/{request_id}/accept"),
            Some(recipient),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

/// Befriend and pair the two sessions as a couple.
pub async fn couple_up(app: &Router, a: &str, a_id: &str, b: &str, b_id: &str) {
    befriend(app, a, b, b_id).await;

    let (status, _) = send(
        app,
        req("POST", &format!("/api/couple/request/{b_id}"), Some(a), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        app,
        req("PUT", &format!("/api/couple/accept/{a_id}"), Some(b), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

/// Activate premium membership for the session.
pub async fn make_member(app: &Router, cookie: &str) {
    let (status, _) = send(
        app,
        req("POST", "/api/membership/subscribe", Some(cookie), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
