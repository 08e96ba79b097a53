use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use shared_database::ClinicStore;
use shared_models::clinic::{Condition, NewPrediction, Outcome};

use crate::models::{FeatureOrdering, InferenceError, ModelError, PredictionOutcome};
use crate::services::normalizer::{normalize, NormalizeError};
use crate::services::recommendations::recommendations;
use crate::services::registry::ModelRegistry;

pub struct InferenceEngine {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn ClinicStore>,
    ordering: FeatureOrdering,
}

impl InferenceEngine {
    pub fn new(
        registry: Arc<ModelRegistry>,
        store: Arc<dyn ClinicStore>,
        ordering: FeatureOrdering,
    ) -> Self {
        Self {
            registry,
            store,
            ordering,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Resolve a condition named in a request path, then predict.
    pub async fn predict_named(
        &self,
        subject_id: i64,
        condition: &str,
        raw: &Map<String, Value>,
    ) -> Result<PredictionOutcome, InferenceError> {
        let condition: Condition = condition
            .parse()
            .map_err(|_| InferenceError::ModelUnavailable(condition.trim().to_lowercase()))?;

        self.predict(subject_id, condition, raw).await
    }

    #[instrument(skip(self, raw), fields(condition = %condition))]
    pub async fn predict(
        &self,
        subject_id: i64,
        condition: Condition,
        raw: &Map<String, Value>,
    ) -> Result<PredictionOutcome, InferenceError> {
        let entry = self
            .registry
            .get(condition)
            .ok_or_else(|| InferenceError::ModelUnavailable(condition.to_string()))?;

        let normalized = normalize(raw, &entry.expected_features, self.ordering).map_err(
            |e| match e {
                NormalizeError::SchemaMissing => {
                    warn!("{} model has no declared feature schema", condition);
                    InferenceError::ModelUnavailable(condition.to_string())
                }
                NormalizeError::MissingFields(fields) => InferenceError::MissingFields { fields },
                NormalizeError::InvalidInput { field, value } => {
                    InferenceError::InvalidInput { field, value }
                }
            },
        )?;

        let mut vector = normalized.vector;
        if let Some(scaler) = &entry.scaler {
            match scaler.apply(&vector) {
                Ok(scaled) => vector = scaled,
                Err(e) => warn!("Scaler transform failed for {}: {}", condition, e),
            }
        }

        // Declared schemas are width-checked at load, so a mismatch here comes
        // from the submitted fields under sorted-key ordering.
        let score = entry.scorer.score(&vector).map_err(|e| match e {
            ModelError::DimensionMismatch { expected, actual } => {
                InferenceError::FeatureCount { expected, actual }
            }
            other => InferenceError::Scoring(other.to_string()),
        })?;

        let confidence = score
            .probabilities
            .as_deref()
            .and_then(|probabilities| probabilities.iter().copied().reduce(f64::max))
            .map(|p| p.clamp(0.0, 1.0))
            .unwrap_or(1.0);
        let outcome = Outcome::from_label(score.label);

        debug!(
            "Scored {} for subject {}: label={} confidence={}",
            condition, subject_id, score.label, confidence
        );

        let raw_input = serde_json::to_string(raw)
            .map_err(|e| InferenceError::Persistence(e.to_string()))?;

        let record = self
            .store
            .insert_prediction(NewPrediction {
                subject_id,
                condition,
                outcome,
                confidence,
                raw_input,
            })
            .await
            .map_err(|e| InferenceError::Persistence(e.to_string()))?;

        info!(
            "Recorded prediction {} ({}) for subject {}",
            record.id, outcome, subject_id
        );

        Ok(PredictionOutcome {
            prediction_id: record.id,
            condition,
            result: outcome,
            confidence: round_to(confidence, 3),
            recommendations: recommendations(condition, outcome.is_positive())
                .iter()
                .map(|s| s.to_string())
                .collect(),
        })
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
