// libs/appointment-cell/src/handlers.rs
use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{
    AppointmentError, BookAppointmentRequest, Decision, RejectAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::router::AppointmentState;

const DEFAULT_REJECTION_REASON: &str = "Not specified";

/// Decode an optional JSON body; an empty body yields the default.
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let subject_id = require_role(&user, Role::Patient)
        .map_err(|_| AppError::Forbidden("Only patients can book appointments".to_string()))?;

    let command = state
        .scheduler
        .validate_booking_request(subject_id, request)?;
    let booked = state.scheduler.book(command).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment booked successfully",
        "appointment_id": booked.appointment.id,
        "appointment": booked.appointment
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let account_id = user
        .record_id()
        .ok_or_else(|| AppError::Auth("Token subject is not a valid account id".to_string()))?;

    let appointments = match user.role() {
        Role::Patient => state.scheduler.appointments_for_subject(account_id).await?,
        Role::Doctor => state.scheduler.appointments_for_provider(account_id).await?,
        Role::Unknown => return Err(AppError::Forbidden("Invalid role".to_string())),
    };

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let account_id = user
        .record_id()
        .ok_or_else(|| AppError::Auth("Token subject is not a valid account id".to_string()))?;

    let appointment = state.scheduler.get_appointment(appointment_id).await?;

    let is_owner = match user.role() {
        Role::Patient => appointment.subject_id == account_id,
        Role::Doctor => appointment.is_managed_by(account_id),
        Role::Unknown => false,
    };
    if !is_owner {
        return Err(AppointmentError::Unauthorized.into());
    }

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn doctor_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = require_role(&user, Role::Doctor)?;
    let appointments = state.scheduler.appointments_for_provider(doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn approve_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let doctor_id = require_role(&user, Role::Doctor)?;
    let request: RejectAppointmentRequest = optional_body(&body)?;
    let reason = request.reason.filter(|r| !r.trim().is_empty());

    let result = state
        .scheduler
        .decide(appointment_id, Decision::Approved, doctor_id, reason)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment approved successfully",
        "appointment": result.appointment
    })))
}

#[axum::debug_handler]
pub async fn reject_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let doctor_id = require_role(&user, Role::Doctor)?;
    let request: RejectAppointmentRequest = optional_body(&body)?;
    let reason = request
        .reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());

    let result = state
        .scheduler
        .decide(appointment_id, Decision::Rejected, doctor_id, Some(reason))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment rejected successfully",
        "appointment": result.appointment
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = require_role(&user, Role::Doctor)?;
    debug!(
        "Doctor {} sets appointment {} to {:?}",
        doctor_id, appointment_id, request.status
    );

    let reason = request.reason.filter(|r| !r.trim().is_empty());
    let result = state
        .scheduler
        .decide(appointment_id, request.status, doctor_id, reason)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Appointment {} successfully", result.appointment.status),
        "appointment": result.appointment
    })))
}
