// libs/prediction-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::InferenceEngine;

#[derive(Clone)]
pub struct PredictionState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<InferenceEngine>,
}

pub fn prediction_routes(state: PredictionState) -> Router {
    Router::new()
        .route("/predict/{condition}", post(handlers::predict))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
