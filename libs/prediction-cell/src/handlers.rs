// libs/prediction-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::router::PredictionState;

#[axum::debug_handler]
pub async fn predict(
    State(state): State<PredictionState>,
    Extension(user): Extension<User>,
    Path(condition): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let subject_id = require_role(&user, Role::Patient)?;

    let Value::Object(observation) = body else {
        return Err(AppError::BadRequest(
            "Request body must be a JSON object of field values".to_string(),
        ));
    };

    debug!(
        "Prediction request for {} from subject {} with {} fields",
        condition,
        subject_id,
        observation.len()
    );

    let outcome = state
        .engine
        .predict_named(subject_id, &condition, &observation)
        .await?;

    Ok(Json(json!({
        "success": true,
        "prediction_id": outcome.prediction_id,
        "condition": outcome.condition,
        "result": outcome.result,
        "confidence": outcome.confidence,
        "recommendations": outcome.recommendations
    })))
}
