use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::{auth_routes, seed_sample_doctors, AccountService, AuthState};
use shared_database::InMemoryStore;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::TestConfig;

async fn app() -> Router {
    let config = TestConfig::default().to_arc();
    let store = Arc::new(InMemoryStore::new());
    seed_sample_doctors(store.as_ref(), "doctor123").await.unwrap();

    auth_routes(AuthState {
        accounts: Arc::new(AccountService::new(store, config.clone())),
        config,
    })
}

async fn send(app: &Router, method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header("Authorization", bearer);
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn registration() -> Value {
    json!({
        "username": "jane",
        "email": "jane@example.com",
        "password": "secret1",
        "full_name": "Jane Doe",
        "gender": "female"
    })
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = app().await;

    let (status, body) = send(&app, "POST", "/register", None, Some(registration())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"username": "jane", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "jane");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap().to_string();
    let bearer = format!("Bearer {}", token);
    let (status, body) = send(&app, "GET", "/profile", Some(&bearer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "patient");
    assert_eq!(body["profile"]["full_name"], "Jane Doe");
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let app = app().await;
    send(&app, "POST", "/register", None, Some(registration())).await;

    let (status, body) = send(&app, "POST", "/register", None, Some(registration())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username or email already exists");
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/login/patient",
        None,
        Some(json!({"username": "nobody", "password": "whatever"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_seeded_doctor_login_issues_short_token() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/login/doctor",
        None,
        Some(json!({"username": "dr.michael", "password": "doctor123"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doctor"]["specialization"], "Cardiologist");

    let secret = TestConfig::default().to_app_config().jwt_secret;
    let user = validate_token(body["token"].as_str().unwrap(), &secret).unwrap();
    assert_eq!(user.role.as_deref(), Some("doctor"));
}

#[tokio::test]
async fn test_doctor_directory_is_public_and_sorted() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/doctors", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let doctors = body["doctors"].as_array().unwrap();
    assert_eq!(doctors.len(), 4);
    assert_eq!(doctors[0]["full_name"], "Dr. Emily Davis");
}

#[tokio::test]
async fn test_profile_requires_token() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
