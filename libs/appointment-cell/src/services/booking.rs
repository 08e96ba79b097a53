// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use notification_cell::{ApprovalNotice, BookingNotice, Notifier, RejectionNotice};
use shared_database::{ClinicStore, StatusChange, StatusWrite, StoreError};
use shared_models::clinic::{Appointment, AppointmentStatus, NewAppointment};

use crate::models::{
    AppointmentError, BookAppointmentRequest, Booked, BookingCommand, Decision, DecisionResult,
    NotificationTask,
};
use crate::services::conflict::SlotLocks;
use crate::services::lifecycle::AppointmentLifecycleService;

/// Owns the booking state machine: slot-safe creation, one-shot decisions and
/// the notification that follows each durable write.
pub struct AppointmentScheduler {
    store: Arc<dyn ClinicStore>,
    notifier: Arc<dyn Notifier>,
    slot_locks: SlotLocks,
    lifecycle: AppointmentLifecycleService,
    notification_timeout: Duration,
}

impl AppointmentScheduler {
    pub fn new(
        store: Arc<dyn ClinicStore>,
        notifier: Arc<dyn Notifier>,
        notification_timeout: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            slot_locks: SlotLocks::new(),
            lifecycle: AppointmentLifecycleService::new(),
            notification_timeout,
        }
    }

    /// Check the request shape and parse date and time before anything is written.
    pub fn validate_booking_request(
        &self,
        subject_id: i64,
        request: BookAppointmentRequest,
    ) -> Result<BookingCommand, AppointmentError> {
        let provider_name = request.provider_name.trim().to_string();
        if provider_name.is_empty() {
            return Err(AppointmentError::ValidationError(
                "Missing field: doctor_name".to_string(),
            ));
        }

        let specialization = request.specialization.trim().to_string();
        if specialization.is_empty() {
            return Err(AppointmentError::ValidationError(
                "Missing field: specialization".to_string(),
            ));
        }

        let date = NaiveDate::parse_from_str(request.appointment_date.trim(), "%Y-%m-%d")
            .map_err(|_| {
                AppointmentError::ValidationError(format!(
                    "Invalid appointment_date '{}', expected YYYY-MM-DD",
                    request.appointment_date
                ))
            })?;

        let time = parse_time(request.appointment_time.trim()).ok_or_else(|| {
            AppointmentError::ValidationError(format!(
                "Invalid appointment_time '{}', expected HH:MM",
                request.appointment_time
            ))
        })?;

        Ok(BookingCommand {
            subject_id,
            prediction_id: request.prediction_id,
            provider_name,
            specialization,
            date,
            time,
            notes: request
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
    }

    #[instrument(skip(self, command), fields(slot = %command.slot()))]
    pub async fn book(&self, command: BookingCommand) -> Result<Booked, AppointmentError> {
        let slot = command.slot();

        let appointment = {
            let _slot_guard = self.slot_locks.acquire(&slot).await;

            let active = self
                .store
                .query_appointments_by_slot(&slot)
                .await
                .map_err(store_error)?;
            if !active.is_empty() {
                warn!("Slot conflict for {} ({} active)", slot, active.len());
                return Err(AppointmentError::SlotConflict(slot));
            }

            // Provider id is advisory; the name alone defines the slot.
            let provider_id = match self.store.find_doctor_by_name(&command.provider_name).await {
                Ok(found) => found.map(|doctor| doctor.id),
                Err(e) => {
                    warn!("Could not resolve provider '{}': {}", command.provider_name, e);
                    None
                }
            };

            self.store
                .insert_appointment(NewAppointment {
                    subject_id: command.subject_id,
                    prediction_id: command.prediction_id,
                    provider_id,
                    provider_name: command.provider_name.clone(),
                    specialization: command.specialization.clone(),
                    appointment_date: command.date,
                    appointment_time: command.time,
                    notes: command.notes.clone(),
                })
                .await
                .map_err(|e| match e {
                    StoreError::UniqueViolation(_) => {
                        warn!("Store rejected concurrent booking for {}", slot);
                        AppointmentError::SlotConflict(slot.clone())
                    }
                    StoreError::ForeignKeyViolation(_) => AppointmentError::ValidationError(
                        "prediction_id does not reference an existing prediction".to_string(),
                    ),
                    other => store_error(other),
                })?
        };

        info!(
            "Appointment {} booked for subject {} with {}",
            appointment.id, appointment.subject_id, appointment.provider_name
        );

        let notification = self.dispatch_booked(&appointment).await;

        Ok(Booked {
            appointment,
            notification,
        })
    }

    #[instrument(skip(self, reason))]
    pub async fn decide(
        &self,
        appointment_id: i64,
        decision: Decision,
        decider_id: i64,
        reason: Option<String>,
    ) -> Result<DecisionResult, AppointmentError> {
        let current = self.get_appointment(appointment_id).await?;
        if !current.is_managed_by(decider_id) {
            warn!(
                "Provider {} tried to decide appointment {} owned by {:?}",
                decider_id, appointment_id, current.provider_id
            );
            return Err(AppointmentError::Unauthorized);
        }

        let write = self
            .store
            .update_appointment_status(StatusChange {
                appointment_id,
                expected: AppointmentStatus::Pending,
                status: decision.status(),
                reason: reason.clone(),
                decided_by: Some(decider_id),
                decided_at: Utc::now(),
            })
            .await
            .map_err(store_error)?;

        let appointment = match write {
            StatusWrite::Applied(appointment) => appointment,
            StatusWrite::NotFound => return Err(AppointmentError::NotFound),
            StatusWrite::StatusMismatch(current) => {
                self.lifecycle
                    .validate_status_transition(&current, &decision.status())?;
                // A pending row that still failed the swap lost a race; report
                // it the same way as a decided one.
                return Err(AppointmentError::InvalidStatusTransition { current });
            }
        };

        info!(
            "Appointment {} {} by provider {}",
            appointment.id, appointment.status, decider_id
        );

        let notification = self.dispatch_decision(&appointment, decision).await;

        Ok(DecisionResult {
            appointment,
            notification,
        })
    }

    pub async fn get_appointment(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        self.store
            .query_appointment_by_id(appointment_id)
            .await
            .map_err(store_error)?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn appointments_for_subject(
        &self,
        subject_id: i64,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments = self
            .store
            .query_appointments_by_subject(subject_id)
            .await
            .map_err(store_error)?;
        sort_newest_first(&mut appointments);
        Ok(appointments)
    }

    pub async fn appointments_for_provider(
        &self,
        provider_id: i64,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments = self
            .store
            .query_appointments_by_provider(provider_id)
            .await
            .map_err(store_error)?;
        sort_newest_first(&mut appointments);
        Ok(appointments)
    }

    async fn dispatch_booked(&self, appointment: &Appointment) -> NotificationTask {
        let Some((patient_email, patient_name)) = self.patient_contact(appointment.subject_id).await
        else {
            return NotificationTask::skipped();
        };

        let notice = BookingNotice {
            appointment_id: appointment.id,
            patient_email,
            patient_name,
            doctor_name: appointment.provider_name.clone(),
            appointment_date: appointment.appointment_date,
            appointment_time: appointment.appointment_time,
        };

        let notifier = self.notifier.clone();
        self.spawn_notification(appointment.id, async move {
            notifier.notify_booked(&notice).await
        })
    }

    async fn dispatch_decision(
        &self,
        appointment: &Appointment,
        decision: Decision,
    ) -> NotificationTask {
        let Some((patient_email, patient_name)) = self.patient_contact(appointment.subject_id).await
        else {
            return NotificationTask::skipped();
        };

        let doctor_name = match appointment.provider_id {
            Some(id) => match self.store.get_doctor(id).await {
                Ok(Some(doctor)) => doctor.full_name,
                _ => appointment.provider_name.clone(),
            },
            None => appointment.provider_name.clone(),
        };

        let notifier = self.notifier.clone();
        match decision {
            Decision::Approved => {
                let notice = ApprovalNotice {
                    appointment_id: appointment.id,
                    patient_email,
                    patient_name,
                    doctor_name,
                    specialization: appointment.specialization.clone(),
                    appointment_date: appointment.appointment_date,
                    appointment_time: appointment.appointment_time,
                };
                self.spawn_notification(appointment.id, async move {
                    notifier.notify_approved(&notice).await
                })
            }
            Decision::Rejected => {
                let notice = RejectionNotice {
                    appointment_id: appointment.id,
                    patient_email,
                    patient_name,
                    doctor_name,
                    appointment_date: appointment.appointment_date,
                    appointment_time: appointment.appointment_time,
                    reason: appointment.reason.clone(),
                };
                self.spawn_notification(appointment.id, async move {
                    notifier.notify_rejected(&notice).await
                })
            }
        }
    }

    async fn patient_contact(&self, subject_id: i64) -> Option<(String, String)> {
        match self.store.get_user(subject_id).await {
            Ok(Some(user)) => Some((user.email, user.full_name)),
            Ok(None) => {
                warn!("No patient record for subject {}, skipping notification", subject_id);
                None
            }
            Err(e) => {
                error!("Failed to load patient {} for notification: {}", subject_id, e);
                None
            }
        }
    }

    fn spawn_notification<F>(&self, appointment_id: i64, send: F) -> NotificationTask
    where
        F: std::future::Future<Output = bool> + Send + 'static,
    {
        let timeout = self.notification_timeout;
        NotificationTask::spawned(tokio::spawn(async move {
            match tokio::time::timeout(timeout, send).await {
                Ok(true) => {
                    debug!("Notification delivered for appointment {}", appointment_id);
                    true
                }
                Ok(false) => {
                    warn!("Notification failed for appointment {}", appointment_id);
                    false
                }
                Err(_) => {
                    warn!(
                        "Notification for appointment {} timed out after {:?}",
                        appointment_id, timeout
                    );
                    false
                }
            }
        }))
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn sort_newest_first(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

fn store_error(error: StoreError) -> AppointmentError {
    AppointmentError::DatabaseError(error.to_string())
}
