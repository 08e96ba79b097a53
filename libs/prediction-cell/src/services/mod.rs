pub mod engine;
pub mod normalizer;
pub mod recommendations;
pub mod registry;

pub use engine::InferenceEngine;
pub use registry::{ModelEntry, ModelRegistry, Scaler, Scorer};
