// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::warn;

use shared_models::clinic::{Appointment, AppointmentStatus, SlotKey};
use shared_models::error::AppError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(alias = "doctor_name")]
    pub provider_name: String,
    pub specialization: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub prediction_id: Option<i64>,
    pub notes: Option<String>,
}

/// Validated booking input.
#[derive(Debug, Clone)]
pub struct BookingCommand {
    pub subject_id: i64,
    pub prediction_id: Option<i64>,
    pub provider_name: String,
    pub specialization: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub notes: Option<String>,
}

impl BookingCommand {
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            provider_name: self.provider_name.clone(),
            date: self.date,
            time: self.time,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn status(&self) -> AppointmentStatus {
        match self {
            Decision::Approved => AppointmentStatus::Approved,
            Decision::Rejected => AppointmentStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub status: Decision,
    pub reason: Option<String>,
}

// ==============================================================================
// RESULTS
// ==============================================================================

/// Handle to a notification dispatched after a durable write.
/// Dropping it detaches the task; awaiting it yields the delivery outcome.
#[derive(Debug)]
pub struct NotificationTask {
    handle: Option<JoinHandle<bool>>,
}

impl NotificationTask {
    pub(crate) fn spawned(handle: JoinHandle<bool>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    pub(crate) fn skipped() -> Self {
        Self { handle: None }
    }

    pub async fn outcome(self) -> bool {
        match self.handle {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                warn!("Notification task failed to complete: {}", e);
                false
            }),
            None => false,
        }
    }
}

#[derive(Debug)]
pub struct Booked {
    pub appointment: Appointment,
    pub notification: NotificationTask,
}

#[derive(Debug)]
pub struct DecisionResult {
    pub appointment: Appointment,
    pub notification: NotificationTask,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("{0} is already booked")]
    SlotConflict(SlotKey),

    #[error("Appointment is already {current} and cannot be changed")]
    InvalidStatusTransition { current: AppointmentStatus },

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::SlotConflict(_) => AppError::Conflict(
                "This time slot is already booked. Please choose another time.".to_string(),
            ),
            AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(err.to_string()),
            AppointmentError::Unauthorized => AppError::Forbidden(err.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
