// libs/dashboard-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::StatsAggregator;

#[derive(Clone)]
pub struct DashboardState {
    pub config: Arc<AppConfig>,
    pub aggregator: Arc<StatsAggregator>,
}

pub fn dashboard_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/stats", get(handlers::get_stats))
        .route("/history", get(handlers::get_history))
        .route("/recent-predictions", get(handlers::get_recent_predictions))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
