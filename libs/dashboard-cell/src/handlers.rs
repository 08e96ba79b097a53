// libs/dashboard-cell/src/handlers.rs
use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{History, RecentQuery, Stats};
use crate::router::DashboardState;
use crate::services::DEFAULT_RECENT_LIMIT;

fn account_id(user: &User) -> Result<i64, AppError> {
    user.record_id()
        .ok_or_else(|| AppError::Auth("Token subject is not a valid account id".to_string()))
}

#[axum::debug_handler]
pub async fn get_stats(
    State(state): State<DashboardState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let id = account_id(&user)?;

    // Patients get flat counters, doctors a nested `stats` object.
    let body = match state.aggregator.summarize(id, user.role()).await? {
        Stats::Patient(stats) => json!({
            "success": true,
            "total_predictions": stats.total_predictions,
            "healthy_results": stats.healthy_results,
            "risk_detected": stats.risk_detected,
            "total_appointments": stats.total_appointments
        }),
        Stats::Provider(stats) => json!({
            "success": true,
            "stats": stats
        }),
    };

    Ok(Json(body))
}

#[axum::debug_handler]
pub async fn get_history(
    State(state): State<DashboardState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let id = account_id(&user)?;

    let body = match state.aggregator.history(id, user.role()).await? {
        History::Predictions(predictions) => json!({
            "success": true,
            "predictions": predictions
        }),
        History::Appointments(appointments) => json!({
            "success": true,
            "appointments": appointments
        }),
    };

    Ok(Json(body))
}

#[axum::debug_handler]
pub async fn get_recent_predictions(
    State(state): State<DashboardState>,
    Extension(user): Extension<User>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Value>, AppError> {
    let subject_id = require_role(&user, Role::Patient)
        .map_err(|_| AppError::Forbidden("Unauthorized".to_string()))?;

    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let predictions = state
        .aggregator
        .recent_predictions(subject_id, limit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "predictions": predictions
    })))
}
