use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use appointment_cell::{appointment_routes, AppointmentScheduler, AppointmentState};
use auth_cell::{auth_routes, AccountService, AuthState};
use dashboard_cell::{dashboard_routes, DashboardState, StatsAggregator};
use notification_cell::Notifier;
use prediction_cell::{
    prediction_routes, FeatureOrdering, InferenceEngine, ModelRegistry, PredictionState,
};
use shared_config::AppConfig;
use shared_database::ClinicStore;

/// Everything the cells share, built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ClinicStore>,
    pub registry: Arc<ModelRegistry>,
    pub notifier: Arc<dyn Notifier>,
}

pub fn create_router(services: AppServices) -> Router {
    let config = services.config.clone();

    let engine = Arc::new(InferenceEngine::new(
        services.registry.clone(),
        services.store.clone(),
        FeatureOrdering::from_flag(config.allow_sorted_feature_fallback),
    ));
    let scheduler = Arc::new(AppointmentScheduler::new(
        services.store.clone(),
        services.notifier.clone(),
        Duration::from_secs(config.notification_timeout_secs),
    ));
    let accounts = Arc::new(AccountService::new(services.store.clone(), config.clone()));
    let aggregator = Arc::new(StatsAggregator::new(services.store.clone()));

    let api = Router::new()
        .route("/health", get(health).with_state(services.registry.clone()))
        .merge(auth_routes(AuthState {
            config: config.clone(),
            accounts,
        }))
        .merge(prediction_routes(PredictionState {
            config: config.clone(),
            engine,
        }))
        .merge(appointment_routes(AppointmentState {
            config: config.clone(),
            scheduler,
        }))
        .merge(dashboard_routes(DashboardState {
            config: config.clone(),
            aggregator,
        }));

    Router::new()
        .route("/", get(|| async { "Clinic Portal API is running!" }))
        .nest("/api", api)
}

async fn health(State(registry): State<Arc<ModelRegistry>>) -> Json<Value> {
    let models_loaded: Vec<&str> = registry
        .loaded_conditions()
        .iter()
        .map(|condition| condition.as_str())
        .collect();

    Json(json!({
        "status": "healthy",
        "models_loaded": models_loaded,
        "time": Utc::now().to_rfc3339()
    }))
}
