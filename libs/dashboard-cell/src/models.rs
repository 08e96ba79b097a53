// libs/dashboard-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::clinic::{Appointment, PredictionRecord};
use shared_models::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientStats {
    pub total_predictions: usize,
    pub healthy_results: usize,
    pub risk_detected: usize,
    pub total_appointments: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stats {
    Patient(PatientStats),
    Provider(ProviderStats),
}

/// Predictions for a patient, the appointment queue for a doctor.
#[derive(Debug, Clone)]
pub enum History {
    Predictions(Vec<PredictionRecord>),
    Appointments(Vec<Appointment>),
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Unauthorized => AppError::Forbidden("Unauthorized".to_string()),
            DashboardError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
