// libs/prediction-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::clinic::{Condition, Outcome};
use shared_models::error::AppError;

// ==============================================================================
// SCORING PRIMITIVES
// ==============================================================================

/// Raw scorer output: class label plus class probabilities when the model is calibrated.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub label: i64,
    pub probabilities: Option<Vec<f64>>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("transform produced a non-finite value at position {0}")]
    NonFinite(usize),
}

/// How the normalizer orders features when an artifact declares no schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureOrdering {
    /// Refuse to score without a declared feature list.
    #[default]
    Declared,
    /// Sort the submitted field names lexicographically.
    SortedFallback,
}

impl FeatureOrdering {
    pub fn from_flag(allow_sorted_fallback: bool) -> Self {
        if allow_sorted_fallback {
            FeatureOrdering::SortedFallback
        } else {
            FeatureOrdering::Declared
        }
    }
}

// ==============================================================================
// ARTIFACT FORMAT
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScorerSpec {
    Logistic {
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
}

impl ScorerSpec {
    pub fn coefficient_count(&self) -> usize {
        match self {
            ScorerSpec::Logistic { coefficients, .. } | ScorerSpec::Linear { coefficients, .. } => {
                coefficients.len()
            }
        }
    }
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerSpec {
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported artifact shape: {0}")]
    UnsupportedShape(String),

    #[error("duplicate feature name '{0}'")]
    DuplicateFeature(String),

    #[error("scorer expects {coefficients} coefficients but {features} features are declared")]
    SchemaMismatch { coefficients: usize, features: usize },

    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),
}

// ==============================================================================
// INFERENCE
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("{0} model not available")]
    ModelUnavailable(String),

    #[error("Missing input fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("Invalid numeric input for '{field}': {value}")]
    InvalidInput { field: String, value: String },

    #[error("Expected {expected} input fields, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("Failed to record prediction: {0}")]
    Persistence(String),
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::ModelUnavailable(_)
            | InferenceError::MissingFields { .. }
            | InferenceError::InvalidInput { .. }
            | InferenceError::FeatureCount { .. } => AppError::BadRequest(err.to_string()),
            InferenceError::Scoring(_) => AppError::Internal(err.to_string()),
            InferenceError::Persistence(_) => AppError::Database(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictionOutcome {
    pub prediction_id: i64,
    pub condition: Condition,
    pub result: Outcome,
    /// Rounded to three decimals; the stored record keeps full precision.
    pub confidence: f64,
    pub recommendations: Vec<String>,
}
