// libs/auth-cell/src/handlers.rs
use axum::extract::{Extension, Json, State};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{LoginRequest, RegisterRequest};
use crate::router::AuthState;
use crate::services::accounts::Profile;

#[axum::debug_handler]
pub async fn register(
    State(state): State<AuthState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state.accounts.register(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Registration successful",
        "user_id": user.id
    })))
}

#[axum::debug_handler]
pub async fn login_patient(
    State(state): State<AuthState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let (token, user) = state.accounts.login_patient(request).await?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": user
    })))
}

#[axum::debug_handler]
pub async fn login_doctor(
    State(state): State<AuthState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let (token, doctor) = state.accounts.login_doctor(request).await?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AuthState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", user.id);

    let account_id = user
        .record_id()
        .ok_or_else(|| AppError::Auth("Token subject is not a valid account id".to_string()))?;

    let profile = match state.accounts.profile(account_id, user.role()).await? {
        Profile::Patient(record) => json!(record),
        Profile::Doctor(record) => json!(record),
    };

    Ok(Json(json!({
        "success": true,
        "role": user.role().as_str(),
        "profile": profile
    })))
}

#[axum::debug_handler]
pub async fn list_doctors(State(state): State<AuthState>) -> Result<Json<Value>, AppError> {
    let doctors = state.accounts.list_doctors().await?;

    Ok(Json(json!({
        "success": true,
        "doctors": doctors
    })))
}
