use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use shared_models::clinic::{
    Appointment, AppointmentStatus, DoctorRecord, NewAppointment, NewDoctor, NewPrediction,
    NewUser, PredictionRecord, SlotKey, UserRecord,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Referenced record does not exist: {0}")]
    ForeignKeyViolation(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Malformed row: {0}")]
    Decode(String),
}

/// Conditional status write: applied only while the row is still in `expected`.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub appointment_id: i64,
    pub expected: AppointmentStatus,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub decided_by: Option<i64>,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum StatusWrite {
    Applied(Appointment),
    NotFound,
    StatusMismatch(AppointmentStatus),
}

/// Durable storage for accounts, predictions and appointments.
///
/// Implementations must reject a second active appointment for the same
/// slot with `StoreError::UniqueViolation`.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    async fn insert_prediction(&self, prediction: NewPrediction)
        -> Result<PredictionRecord, StoreError>;

    async fn query_predictions_by_subject(
        &self,
        subject_id: i64,
    ) -> Result<Vec<PredictionRecord>, StoreError>;

    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StoreError>;

    /// Active (pending or approved) appointments holding the slot.
    async fn query_appointments_by_slot(
        &self,
        slot: &SlotKey,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn update_appointment_status(&self, change: StatusChange)
        -> Result<StatusWrite, StoreError>;

    async fn query_appointment_by_id(&self, id: i64) -> Result<Option<Appointment>, StoreError>;

    async fn query_appointments_by_subject(
        &self,
        subject_id: i64,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn query_appointments_by_provider(
        &self,
        provider_id: i64,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<UserRecord>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, StoreError>;

    async fn insert_doctor(&self, doctor: NewDoctor) -> Result<DoctorRecord, StoreError>;

    async fn find_doctor_by_username(
        &self,
        username: &str,
    ) -> Result<Option<DoctorRecord>, StoreError>;

    async fn find_doctor_by_name(&self, full_name: &str)
        -> Result<Option<DoctorRecord>, StoreError>;

    async fn get_doctor(&self, id: i64) -> Result<Option<DoctorRecord>, StoreError>;

    async fn list_doctors(&self) -> Result<Vec<DoctorRecord>, StoreError>;
}
