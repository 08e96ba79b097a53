use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use shared_config::AppConfig;
use shared_models::clinic::{
    Appointment, DoctorRecord, NewAppointment, NewDoctor, NewPrediction, NewUser,
    PredictionRecord, SlotKey, UserRecord,
};

use crate::store::{ClinicStore, StatusChange, StatusWrite, StoreError};
use crate::supabase::{SupabaseApiError, SupabaseClient};

/// `ClinicStore` backed by Supabase PostgREST tables (see `migrations/`).
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    pub fn with_client(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn insert_row<T, R>(&self, table: &str, row: &T) -> Result<R, StoreError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(row).map_err(|e| StoreError::Decode(e.to_string()))?;
        let rows = self
            .client
            .insert_returning(table, body)
            .await
            .map_err(map_backend_error)?;

        first_row(rows)?.ok_or_else(|| {
            StoreError::Backend(format!("Insert into {} returned no rows", table))
        })
    }

    async fn select_rows<R>(&self, table: &str, query: &str) -> Result<Vec<R>, StoreError>
    where
        R: DeserializeOwned,
    {
        let rows = self
            .client
            .select(table, query)
            .await
            .map_err(map_backend_error)?;

        rows.into_iter().map(decode_row).collect()
    }

    async fn select_one<R>(&self, table: &str, query: &str) -> Result<Option<R>, StoreError>
    where
        R: DeserializeOwned,
    {
        let rows = self
            .client
            .select(table, &format!("{}&limit=1", query))
            .await
            .map_err(map_backend_error)?;

        first_row(rows)
    }
}

fn decode_row<R: DeserializeOwned>(row: Value) -> Result<R, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
}

fn first_row<R: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<R>, StoreError> {
    rows.into_iter().next().map(decode_row).transpose()
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn map_backend_error(error: anyhow::Error) -> StoreError {
    let Some(api) = error.downcast_ref::<SupabaseApiError>() else {
        return StoreError::Backend(error.to_string());
    };
    if !api.is_conflict() {
        return StoreError::Backend(error.to_string());
    }

    match api.pg_code().as_deref() {
        Some(UNIQUE_VIOLATION) => StoreError::UniqueViolation(api.body.clone()),
        Some(FOREIGN_KEY_VIOLATION) => StoreError::ForeignKeyViolation(api.body.clone()),
        _ => StoreError::Backend(error.to_string()),
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", urlencoding::encode(value))
}

fn slot_filter(slot: &SlotKey) -> String {
    format!(
        "provider_name={}&appointment_date={}&appointment_time={}",
        eq(&slot.provider_name),
        eq(&slot.date.format("%Y-%m-%d").to_string()),
        eq(&slot.time.format("%H:%M:%S").to_string()),
    )
}

#[async_trait]
impl ClinicStore for SupabaseStore {
    #[instrument(skip(self, prediction), fields(subject_id = prediction.subject_id))]
    async fn insert_prediction(
        &self,
        prediction: NewPrediction,
    ) -> Result<PredictionRecord, StoreError> {
        self.insert_row("predictions", &prediction).await
    }

    async fn query_predictions_by_subject(
        &self,
        subject_id: i64,
    ) -> Result<Vec<PredictionRecord>, StoreError> {
        self.select_rows(
            "predictions",
            &format!("subject_id=eq.{}&order=created_at.desc", subject_id),
        )
        .await
    }

    #[instrument(skip(self, appointment), fields(provider = %appointment.provider_name))]
    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let mut row =
            serde_json::to_value(&appointment).map_err(|e| StoreError::Decode(e.to_string()))?;
        row["status"] = json!("pending");

        // 23505 from the partial unique index surfaces as UniqueViolation,
        // 23503 from the prediction_id reference as ForeignKeyViolation.
        self.insert_row("appointments", &row).await
    }

    async fn query_appointments_by_slot(
        &self,
        slot: &SlotKey,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.select_rows(
            "appointments",
            &format!("{}&status=in.(pending,approved)", slot_filter(slot)),
        )
        .await
    }

    #[instrument(skip(self, change), fields(appointment_id = change.appointment_id))]
    async fn update_appointment_status(
        &self,
        change: StatusChange,
    ) -> Result<StatusWrite, StoreError> {
        let filter = format!(
            "id=eq.{}&status=eq.{}",
            change.appointment_id,
            change.expected.as_str()
        );
        let changes = json!({
            "status": change.status,
            "reason": change.reason,
            "decided_by": change.decided_by,
            "decided_at": change.decided_at.to_rfc3339(),
        });

        let rows = self
            .client
            .update_returning("appointments", &filter, changes)
            .await
            .map_err(map_backend_error)?;

        if let Some(updated) = first_row::<Appointment>(rows)? {
            return Ok(StatusWrite::Applied(updated));
        }

        // Nothing matched: either the row is gone or its status moved on.
        debug!(
            "Conditional update matched no rows for appointment {}",
            change.appointment_id
        );
        match self.query_appointment_by_id(change.appointment_id).await? {
            Some(current) => Ok(StatusWrite::StatusMismatch(current.status)),
            None => Ok(StatusWrite::NotFound),
        }
    }

    async fn query_appointment_by_id(&self, id: i64) -> Result<Option<Appointment>, StoreError> {
        self.select_one("appointments", &format!("id=eq.{}", id))
            .await
    }

    async fn query_appointments_by_subject(
        &self,
        subject_id: i64,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.select_rows(
            "appointments",
            &format!("subject_id=eq.{}&order=created_at.desc", subject_id),
        )
        .await
    }

    async fn query_appointments_by_provider(
        &self,
        provider_id: i64,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.select_rows(
            "appointments",
            &format!("provider_id=eq.{}&order=created_at.desc", provider_id),
        )
        .await
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        self.insert_row("users", &user).await
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.select_one("users", &format!("username={}", eq(username)))
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.select_one("users", &format!("email={}", eq(email))).await
    }

    async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        self.select_one("users", &format!("id=eq.{}", id)).await
    }

    async fn insert_doctor(&self, doctor: NewDoctor) -> Result<DoctorRecord, StoreError> {
        self.insert_row("doctors", &doctor).await
    }

    async fn find_doctor_by_username(
        &self,
        username: &str,
    ) -> Result<Option<DoctorRecord>, StoreError> {
        self.select_one("doctors", &format!("username={}", eq(username)))
            .await
    }

    async fn find_doctor_by_name(
        &self,
        full_name: &str,
    ) -> Result<Option<DoctorRecord>, StoreError> {
        self.select_one("doctors", &format!("full_name={}", eq(full_name)))
            .await
    }

    async fn get_doctor(&self, id: i64) -> Result<Option<DoctorRecord>, StoreError> {
        self.select_one("doctors", &format!("id=eq.{}", id)).await
    }

    async fn list_doctors(&self) -> Result<Vec<DoctorRecord>, StoreError> {
        self.select_rows("doctors", "order=full_name.asc").await
    }
}
