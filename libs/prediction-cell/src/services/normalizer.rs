use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::FeatureOrdering;

const TRUTHY: [&str; 6] = ["male", "m", "yes", "y", "true", "positive"];
const FALSY: [&str; 6] = ["female", "f", "no", "n", "false", "negative"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("model declares no feature schema")]
    SchemaMissing,

    #[error("missing input fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("invalid numeric input for '{field}': {value}")]
    InvalidInput { field: String, value: String },
}

/// A single form value after token coercion, before vector assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Number(f64),
    Flag(bool),
    /// Kept verbatim; rejected if the model needs this field.
    Token(String),
    Unsupported(Value),
}

impl Coerced {
    fn to_feature(&self, field: &str) -> Result<f64, NormalizeError> {
        let value = match self {
            Coerced::Number(n) => *n,
            Coerced::Flag(true) => 1.0,
            Coerced::Flag(false) => 0.0,
            Coerced::Token(token) => {
                return Err(NormalizeError::InvalidInput {
                    field: field.to_string(),
                    value: token.clone(),
                })
            }
            Coerced::Unsupported(raw) => {
                return Err(NormalizeError::InvalidInput {
                    field: field.to_string(),
                    value: raw.to_string(),
                })
            }
        };

        if !value.is_finite() {
            return Err(NormalizeError::InvalidInput {
                field: field.to_string(),
                value: value.to_string(),
            });
        }

        Ok(value)
    }
}

pub fn coerce(value: &Value) -> Coerced {
    match value {
        Value::String(raw) => coerce_token(raw),
        Value::Number(n) => match n.as_f64() {
            Some(f) => Coerced::Number(f),
            None => Coerced::Unsupported(value.clone()),
        },
        Value::Bool(b) => Coerced::Flag(*b),
        other => Coerced::Unsupported(other.clone()),
    }
}

fn coerce_token(raw: &str) -> Coerced {
    let token = raw.trim().to_lowercase();

    if TRUTHY.contains(&token.as_str()) {
        Coerced::Number(1.0)
    } else if FALSY.contains(&token.as_str()) {
        Coerced::Number(0.0)
    } else {
        match token.parse::<f64>() {
            Ok(n) => Coerced::Number(n),
            Err(_) => Coerced::Token(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    /// Feature names in vector order.
    pub features: Vec<String>,
    pub vector: Vec<f64>,
}

/// Build the model input vector from a raw observation.
///
/// Missing fields are all reported together, in schema order, before any
/// value is converted.
pub fn normalize(
    raw: &Map<String, Value>,
    expected_features: &[String],
    ordering: FeatureOrdering,
) -> Result<NormalizedInput, NormalizeError> {
    let features: Vec<String> = if expected_features.is_empty() {
        match ordering {
            FeatureOrdering::Declared => return Err(NormalizeError::SchemaMissing),
            FeatureOrdering::SortedFallback => {
                let mut keys: Vec<String> = raw.keys().cloned().collect();
                keys.sort();
                keys
            }
        }
    } else {
        expected_features.to_vec()
    };

    let missing: Vec<String> = features
        .iter()
        .filter(|name| !raw.contains_key(name.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(NormalizeError::MissingFields(missing));
    }

    let vector = features
        .iter()
        .map(|name| {
            let value = raw.get(name.as_str()).unwrap_or(&Value::Null);
            coerce(value).to_feature(name)
        })
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(NormalizedInput { features, vector })
}
