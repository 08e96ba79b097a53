pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{FeatureOrdering, InferenceError, PredictionOutcome};
pub use router::{prediction_routes, PredictionState};
pub use services::{InferenceEngine, ModelEntry, ModelRegistry};
