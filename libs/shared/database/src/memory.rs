use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use shared_models::clinic::{
    Appointment, AppointmentStatus, DoctorRecord, NewAppointment, NewDoctor, NewPrediction,
    NewUser, PredictionRecord, SlotKey, UserRecord,
};

use crate::store::{ClinicStore, StatusChange, StatusWrite, StoreError};

#[derive(Default)]
struct Tables {
    predictions: Vec<PredictionRecord>,
    appointments: Vec<Appointment>,
    users: Vec<UserRecord>,
    doctors: Vec<DoctorRecord>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store used when Supabase is not configured and in tests.
/// Every table sits behind one lock, so the slot check and the status
/// compare-and-swap are atomic.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClinicStore for InMemoryStore {
    async fn insert_prediction(
        &self,
        prediction: NewPrediction,
    ) -> Result<PredictionRecord, StoreError> {
        let mut tables = self.tables.lock().await;
        let record = PredictionRecord {
            id: tables.allocate_id(),
            subject_id: prediction.subject_id,
            condition: prediction.condition,
            outcome: prediction.outcome,
            confidence: prediction.confidence,
            raw_input: prediction.raw_input,
            created_at: Utc::now(),
        };
        tables.predictions.push(record.clone());
        Ok(record)
    }

    async fn query_predictions_by_subject(
        &self,
        subject_id: i64,
    ) -> Result<Vec<PredictionRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .predictions
            .iter()
            .filter(|p| p.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.tables.lock().await;
        let slot = appointment.slot();

        if tables
            .appointments
            .iter()
            .any(|a| a.status.is_active() && a.slot() == slot)
        {
            debug!("Rejecting insert for occupied slot {}", slot);
            return Err(StoreError::UniqueViolation(format!("slot {}", slot)));
        }

        if let Some(prediction_id) = appointment.prediction_id {
            if !tables.predictions.iter().any(|p| p.id == prediction_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "prediction {}",
                    prediction_id
                )));
            }
        }

        let record = Appointment {
            id: tables.allocate_id(),
            subject_id: appointment.subject_id,
            prediction_id: appointment.prediction_id,
            provider_id: appointment.provider_id,
            provider_name: appointment.provider_name,
            specialization: appointment.specialization,
            appointment_date: appointment.appointment_date,
            appointment_time: appointment.appointment_time,
            status: AppointmentStatus::Pending,
            notes: appointment.notes,
            reason: None,
            created_at: Utc::now(),
            decided_at: None,
            decided_by: None,
        };
        tables.appointments.push(record.clone());
        Ok(record)
    }

    async fn query_appointments_by_slot(
        &self,
        slot: &SlotKey,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .appointments
            .iter()
            .filter(|a| a.status.is_active() && &a.slot() == slot)
            .cloned()
            .collect())
    }

    async fn update_appointment_status(
        &self,
        change: StatusChange,
    ) -> Result<StatusWrite, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(appointment) = tables
            .appointments
            .iter_mut()
            .find(|a| a.id == change.appointment_id)
        else {
            return Ok(StatusWrite::NotFound);
        };

        if appointment.status != change.expected {
            return Ok(StatusWrite::StatusMismatch(appointment.status));
        }

        appointment.status = change.status;
        appointment.reason = change.reason;
        appointment.decided_by = change.decided_by;
        appointment.decided_at = Some(change.decided_at);

        Ok(StatusWrite::Applied(appointment.clone()))
    }

    async fn query_appointment_by_id(&self, id: i64) -> Result<Option<Appointment>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn query_appointments_by_subject(
        &self,
        subject_id: i64,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .appointments
            .iter()
            .filter(|a| a.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn query_appointments_by_provider(
        &self,
        provider_id: i64,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .appointments
            .iter()
            .filter(|a| a.provider_id == Some(provider_id))
            .cloned()
            .collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::UniqueViolation(
                "username or email already exists".to_string(),
            ));
        }

        let record = UserRecord {
            id: tables.allocate_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            phone: user.phone,
            gender: user.gender,
            created_at: Utc::now(),
        };
        tables.users.push(record.clone());
        Ok(record)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_doctor(&self, doctor: NewDoctor) -> Result<DoctorRecord, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables
            .doctors
            .iter()
            .any(|d| d.username == doctor.username || d.email == doctor.email)
        {
            return Err(StoreError::UniqueViolation(
                "doctor username or email already exists".to_string(),
            ));
        }

        let record = DoctorRecord {
            id: tables.allocate_id(),
            username: doctor.username,
            email: doctor.email,
            password_hash: doctor.password_hash,
            full_name: doctor.full_name,
            phone: doctor.phone,
            specialization: doctor.specialization,
            qualification: doctor.qualification,
            experience_years: doctor.experience_years,
            created_at: Utc::now(),
        };
        tables.doctors.push(record.clone());
        Ok(record)
    }

    async fn find_doctor_by_username(
        &self,
        username: &str,
    ) -> Result<Option<DoctorRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.doctors.iter().find(|d| d.username == username).cloned())
    }

    async fn find_doctor_by_name(
        &self,
        full_name: &str,
    ) -> Result<Option<DoctorRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.doctors.iter().find(|d| d.full_name == full_name).cloned())
    }

    async fn get_doctor(&self, id: i64) -> Result<Option<DoctorRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.doctors.iter().find(|d| d.id == id).cloned())
    }

    async fn list_doctors(&self) -> Result<Vec<DoctorRecord>, StoreError> {
        let tables = self.tables.lock().await;
        let mut doctors = tables.doctors.clone();
        doctors.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(doctors)
    }
}
