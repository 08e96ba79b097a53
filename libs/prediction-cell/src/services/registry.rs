use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use shared_models::clinic::Condition;

use crate::models::{ArtifactError, ModelError, Score, ScalerSpec, ScorerSpec};

/// Keys tried, in order, when an artifact is a bundle.
const SCORER_KEYS: [&str; 3] = ["model", "estimator", "clf"];
const FEATURE_KEYS: [&str; 3] = ["features", "feature_columns", "columns"];
const SCALER_KEY: &str = "scaler";

pub trait Scorer: Send + Sync {
    fn score(&self, features: &[f64]) -> Result<Score, ModelError>;
}

pub trait Scaler: Send + Sync {
    fn apply(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

// ==============================================================================
// BUILT-IN SCORERS AND SCALERS
// ==============================================================================

#[derive(Debug, Clone)]
pub struct LogisticScorer {
    coefficients: Vec<f64>,
    intercept: f64,
    threshold: f64,
}

impl Scorer for LogisticScorer {
    fn score(&self, features: &[f64]) -> Result<Score, ModelError> {
        let z = linear_term(&self.coefficients, self.intercept, features)?;
        let positive = 1.0 / (1.0 + (-z).exp());
        let label = if positive >= self.threshold { 1 } else { 0 };

        Ok(Score {
            label,
            probabilities: Some(vec![1.0 - positive, positive]),
        })
    }
}

/// Decision-function-only scorer: no calibrated probabilities.
#[derive(Debug, Clone)]
pub struct LinearScorer {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl Scorer for LinearScorer {
    fn score(&self, features: &[f64]) -> Result<Score, ModelError> {
        let z = linear_term(&self.coefficients, self.intercept, features)?;
        Ok(Score {
            label: if z > 0.0 { 1 } else { 0 },
            probabilities: None,
        })
    }
}

fn linear_term(coefficients: &[f64], intercept: f64, features: &[f64]) -> Result<f64, ModelError> {
    if coefficients.len() != features.len() {
        return Err(ModelError::DimensionMismatch {
            expected: coefficients.len(),
            actual: features.len(),
        });
    }

    Ok(coefficients
        .iter()
        .zip(features)
        .map(|(w, x)| w * x)
        .sum::<f64>()
        + intercept)
}

#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Scaler for StandardScaler {
    fn apply(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.mean.len().min(self.scale.len()), features.len())?;
        finite(
            features
                .iter()
                .zip(self.mean.iter().zip(&self.scale))
                .map(|(x, (mean, scale))| (x - mean) / scale)
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    scale: Vec<f64>,
}

impl Scaler for MinMaxScaler {
    fn apply(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.min.len().min(self.scale.len()), features.len())?;
        finite(
            features
                .iter()
                .zip(self.min.iter().zip(&self.scale))
                .map(|(x, (min, scale))| x * scale + min)
                .collect(),
        )
    }
}

fn check_width(expected: usize, actual: usize) -> Result<(), ModelError> {
    if expected != actual {
        return Err(ModelError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

fn finite(values: Vec<f64>) -> Result<Vec<f64>, ModelError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ModelError::NonFinite(index)),
        None => Ok(values),
    }
}

impl From<ScorerSpec> for Arc<dyn Scorer> {
    fn from(spec: ScorerSpec) -> Self {
        match spec {
            ScorerSpec::Logistic {
                coefficients,
                intercept,
                threshold,
            } => Arc::new(LogisticScorer {
                coefficients,
                intercept,
                threshold,
            }),
            ScorerSpec::Linear {
                coefficients,
                intercept,
            } => Arc::new(LinearScorer {
                coefficients,
                intercept,
            }),
        }
    }
}

impl From<ScalerSpec> for Arc<dyn Scaler> {
    fn from(spec: ScalerSpec) -> Self {
        match spec {
            ScalerSpec::Standard { mean, scale } => Arc::new(StandardScaler { mean, scale }),
            ScalerSpec::MinMax { min, scale } => Arc::new(MinMaxScaler { min, scale }),
        }
    }
}

// ==============================================================================
// MODEL ENTRY
// ==============================================================================

#[derive(Clone)]
pub struct ModelEntry {
    pub condition: Condition,
    pub scorer: Arc<dyn Scorer>,
    pub scaler: Option<Arc<dyn Scaler>>,
    /// Empty when the artifact carried no schema.
    pub expected_features: Vec<String>,
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("condition", &self.condition)
            .field("has_scaler", &self.scaler.is_some())
            .field("expected_features", &self.expected_features)
            .finish()
    }
}

impl ModelEntry {
    pub fn new(condition: Condition, scorer: Arc<dyn Scorer>) -> Self {
        Self {
            condition,
            scorer,
            scaler: None,
            expected_features: Vec::new(),
        }
    }

    pub fn with_scaler(mut self, scaler: Arc<dyn Scaler>) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_features = features.into_iter().map(Into::into).collect();
        self
    }
}

/// Decode one artifact document into a `ModelEntry`.
///
/// A document with a `kind` tag is a bare scorer. Anything else must be a
/// bundle exposing the scorer, an optional scaler and the feature list under
/// one of the aliased keys.
pub fn decode_artifact(condition: Condition, bytes: &[u8]) -> Result<ModelEntry, ArtifactError> {
    let document: Value = serde_json::from_slice(bytes)?;
    let Value::Object(object) = document else {
        return Err(ArtifactError::UnsupportedShape(
            "top-level value is not an object".to_string(),
        ));
    };

    if object.contains_key("kind") {
        let spec: ScorerSpec = serde_json::from_value(Value::Object(object))?;
        return Ok(ModelEntry::new(condition, spec.into()));
    }

    let scorer_value = first_present(&object, &SCORER_KEYS).ok_or_else(|| {
        ArtifactError::UnsupportedShape(format!(
            "bundle has none of the scorer keys {:?}",
            SCORER_KEYS
        ))
    })?;
    let scorer_spec: ScorerSpec = serde_json::from_value(scorer_value.clone())?;

    let features = match first_present(&object, &FEATURE_KEYS) {
        Some(value) => serde_json::from_value::<Vec<String>>(value.clone())?,
        None => Vec::new(),
    };

    let mut seen = HashSet::new();
    if let Some(duplicate) = features.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(ArtifactError::DuplicateFeature(duplicate.clone()));
    }

    if !features.is_empty() && scorer_spec.coefficient_count() != features.len() {
        return Err(ArtifactError::SchemaMismatch {
            coefficients: scorer_spec.coefficient_count(),
            features: features.len(),
        });
    }

    let mut entry = ModelEntry::new(condition, scorer_spec.into()).with_features(features);

    match object.get(SCALER_KEY) {
        Some(Value::Null) | None => {}
        Some(value) => {
            let scaler: ScalerSpec = serde_json::from_value(value.clone())?;
            entry = entry.with_scaler(scaler.into());
        }
    }

    Ok(entry)
}

fn first_present<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

// ==============================================================================
// REGISTRY
// ==============================================================================

/// Read-only index of loaded models, built once at startup and shared by `Arc`.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    entries: HashMap<Condition, Arc<ModelEntry>>,
}

impl ModelRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Load `<condition>_model.json` for every known condition. Missing or
    /// undecodable artifacts leave that condition unavailable.
    pub fn load_from_dir(dir: &Path) -> Self {
        let mut builder = Self::builder();

        for condition in Condition::ALL {
            let path = dir.join(format!("{}_model.json", condition));

            if !path.exists() {
                warn!("Model file not found for {}: {}", condition, path.display());
                continue;
            }

            let decoded = std::fs::read(&path)
                .map_err(ArtifactError::from)
                .and_then(|bytes| decode_artifact(condition, &bytes));

            match decoded {
                Ok(entry) => {
                    debug!(
                        "Decoded {} artifact with {} declared features",
                        condition,
                        entry.expected_features.len()
                    );
                    builder = builder.register(entry);
                    info!("Loaded {} model from {}", condition, path.display());
                }
                Err(e) => warn!("Skipping {} model at {}: {}", condition, path.display(), e),
            }
        }

        builder.build()
    }

    pub fn get(&self, condition: Condition) -> Option<Arc<ModelEntry>> {
        self.entries.get(&condition).cloned()
    }

    pub fn loaded_conditions(&self) -> Vec<Condition> {
        let mut conditions: Vec<Condition> = self.entries.keys().copied().collect();
        conditions.sort();
        conditions
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    entries: HashMap<Condition, Arc<ModelEntry>>,
}

impl RegistryBuilder {
    /// Later registrations for the same condition replace earlier ones.
    pub fn register(mut self, entry: ModelEntry) -> Self {
        self.entries.insert(entry.condition, Arc::new(entry));
        self
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            entries: self.entries,
        }
    }
}
