// libs/dashboard-cell/src/services/aggregator.rs
use std::sync::Arc;

use tracing::{debug, instrument};

use shared_database::{ClinicStore, StoreError};
use shared_models::auth::Role;
use shared_models::clinic::{AppointmentStatus, Outcome, PredictionRecord};

use crate::models::{DashboardError, History, PatientStats, ProviderStats, Stats};

pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Read-only dashboard summaries over persisted predictions and appointments.
pub struct StatsAggregator {
    store: Arc<dyn ClinicStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn summarize(&self, account_id: i64, role: Role) -> Result<Stats, DashboardError> {
        match role {
            Role::Patient => {
                let predictions = self
                    .store
                    .query_predictions_by_subject(account_id)
                    .await
                    .map_err(store_error)?;
                let appointments = self
                    .store
                    .query_appointments_by_subject(account_id)
                    .await
                    .map_err(store_error)?;

                let risk_detected = predictions
                    .iter()
                    .filter(|p| p.outcome == Outcome::Positive)
                    .count();

                Ok(Stats::Patient(PatientStats {
                    total_predictions: predictions.len(),
                    healthy_results: predictions.len() - risk_detected,
                    risk_detected,
                    total_appointments: appointments.len(),
                }))
            }
            Role::Doctor => {
                let appointments = self
                    .store
                    .query_appointments_by_provider(account_id)
                    .await
                    .map_err(store_error)?;

                let mut stats = ProviderStats {
                    total: appointments.len(),
                    ..ProviderStats::default()
                };
                for appointment in &appointments {
                    match appointment.status {
                        AppointmentStatus::Pending => stats.pending += 1,
                        AppointmentStatus::Approved => stats.approved += 1,
                        AppointmentStatus::Rejected => stats.rejected += 1,
                    }
                }
                debug!("Provider {} stats: {:?}", account_id, stats);

                Ok(Stats::Provider(stats))
            }
            Role::Unknown => Err(DashboardError::Unauthorized),
        }
    }

    pub async fn recent_predictions(
        &self,
        subject_id: i64,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>, DashboardError> {
        let mut predictions = self
            .store
            .query_predictions_by_subject(subject_id)
            .await
            .map_err(store_error)?;

        newest_first(&mut predictions);
        predictions.truncate(limit);
        Ok(predictions)
    }

    pub async fn history(&self, account_id: i64, role: Role) -> Result<History, DashboardError> {
        match role {
            Role::Patient => {
                let mut predictions = self
                    .store
                    .query_predictions_by_subject(account_id)
                    .await
                    .map_err(store_error)?;
                newest_first(&mut predictions);
                Ok(History::Predictions(predictions))
            }
            Role::Doctor => {
                let mut appointments = self
                    .store
                    .query_appointments_by_provider(account_id)
                    .await
                    .map_err(store_error)?;
                appointments
                    .sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
                Ok(History::Appointments(appointments))
            }
            Role::Unknown => Err(DashboardError::Unauthorized),
        }
    }
}

/// created_at descending, ties by id ascending.
pub(crate) fn newest_first(predictions: &mut [PredictionRecord]) {
    predictions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

fn store_error(error: StoreError) -> DashboardError {
    DashboardError::DatabaseError(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use shared_database::InMemoryStore;
    use shared_models::clinic::{Condition, NewAppointment, NewPrediction};

    fn record(id: i64, minute: u32) -> PredictionRecord {
        PredictionRecord {
            id,
            subject_id: 1,
            condition: Condition::Heart,
            outcome: Outcome::Negative,
            confidence: 0.8,
            raw_input: "{}".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
        }
    }

    async fn predict(store: &InMemoryStore, subject_id: i64, outcome: Outcome) {
        store
            .insert_prediction(NewPrediction {
                subject_id,
                condition: Condition::Diabetes,
                outcome,
                confidence: 0.9,
                raw_input: "{}".to_string(),
            })
            .await
            .unwrap();
    }

    async fn appointment(store: &InMemoryStore, subject_id: i64, provider_id: i64, hour: u32) -> i64 {
        store
            .insert_appointment(NewAppointment {
                subject_id,
                prediction_id: None,
                provider_id: Some(provider_id),
                provider_name: "Dr. X".to_string(),
                specialization: "Cardiologist".to_string(),
                appointment_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                appointment_time: chrono::NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                notes: None,
            })
            .await
            .unwrap()
            .id
    }

    #[test]
    fn test_newest_first_breaks_ties_by_id() {
        let mut records = vec![record(3, 1), record(1, 5), record(2, 5), record(4, 0)];
        newest_first(&mut records);
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_patient_stats_count_outcomes() {
        let store = Arc::new(InMemoryStore::new());
        predict(&store, 7, Outcome::Positive).await;
        predict(&store, 7, Outcome::Negative).await;
        predict(&store, 7, Outcome::Negative).await;
        predict(&store, 8, Outcome::Positive).await;
        appointment(&store, 7, 50, 9).await;

        let aggregator = StatsAggregator::new(store);
        let stats = aggregator.summarize(7, Role::Patient).await.unwrap();

        assert_eq!(
            stats,
            Stats::Patient(PatientStats {
                total_predictions: 3,
                healthy_results: 2,
                risk_detected: 1,
                total_appointments: 1,
            })
        );
    }

    #[tokio::test]
    async fn test_provider_stats_count_statuses() {
        let store = Arc::new(InMemoryStore::new());
        let first = appointment(&store, 7, 50, 9).await;
        appointment(&store, 7, 50, 10).await;
        appointment(&store, 8, 50, 11).await;
        appointment(&store, 8, 51, 12).await;

        store
            .update_appointment_status(shared_database::StatusChange {
                appointment_id: first,
                expected: AppointmentStatus::Pending,
                status: AppointmentStatus::Approved,
                reason: None,
                decided_by: Some(50),
                decided_at: Utc::now(),
            })
            .await
            .unwrap();

        let aggregator = StatsAggregator::new(store);
        let stats = aggregator.summarize(50, Role::Doctor).await.unwrap();

        assert_eq!(
            stats,
            Stats::Provider(ProviderStats {
                total: 3,
                pending: 2,
                approved: 1,
                rejected: 0,
            })
        );
    }

    #[tokio::test]
    async fn test_recent_predictions_are_limited() {
        let store = Arc::new(InMemoryStore::new());
        for _ in 0..7 {
            predict(&store, 7, Outcome::Negative).await;
        }

        let aggregator = StatsAggregator::new(store);
        let recent = aggregator
            .recent_predictions(7, DEFAULT_RECENT_LIMIT)
            .await
            .unwrap();
        assert_eq!(recent.len(), DEFAULT_RECENT_LIMIT);
    }

    #[tokio::test]
    async fn test_unknown_role_is_unauthorized() {
        let aggregator = StatsAggregator::new(Arc::new(InMemoryStore::new()));
        assert_matches!(
            aggregator.summarize(1, Role::Unknown).await,
            Err(DashboardError::Unauthorized)
        );
        assert_matches!(
            aggregator.history(1, Role::Unknown).await,
            Err(DashboardError::Unauthorized)
        );
    }
}
