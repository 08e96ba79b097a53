use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use dashboard_cell::{dashboard_routes, DashboardState, StatsAggregator};
use shared_config::AppConfig;
use shared_database::{ClinicStore, InMemoryStore};
use shared_models::clinic::{Condition, NewPrediction, Outcome};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn app(store: Arc<InMemoryStore>, config: &AppConfig) -> Router {
    dashboard_routes(DashboardState {
        config: Arc::new(config.clone()),
        aggregator: Arc::new(StatsAggregator::new(store)),
    })
}

async fn get(app: &Router, uri: &str, bearer: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Authorization", bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn seed_predictions(store: &InMemoryStore, subject_id: i64, outcomes: &[Outcome]) {
    for outcome in outcomes {
        store
            .insert_prediction(NewPrediction {
                subject_id,
                condition: Condition::Kidney,
                outcome: *outcome,
                confidence: 0.75,
                raw_input: "{}".to_string(),
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_patient_stats_are_flat_counters() {
    let config = TestConfig::default().to_app_config();
    let store = Arc::new(InMemoryStore::new());
    let patient = TestUser::patient("stats@example.com");
    seed_predictions(
        &store,
        patient.id,
        &[Outcome::Positive, Outcome::Negative, Outcome::Positive],
    )
    .await;

    let app = app(store, &config);
    let (status, body) = get(&app, "/stats", &JwtTestUtils::bearer(&patient, &config)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_predictions"], 3);
    assert_eq!(body["risk_detected"], 2);
    assert_eq!(body["healthy_results"], 1);
    assert_eq!(body["total_appointments"], 0);
}

#[tokio::test]
async fn test_doctor_stats_are_nested() {
    let config = TestConfig::default().to_app_config();
    let doctor = TestUser::doctor("dr@hospital.com");

    let app = app(Arc::new(InMemoryStore::new()), &config);
    let (status, body) = get(&app, "/stats", &JwtTestUtils::bearer(&doctor, &config)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total"], 0);
    assert_eq!(body["stats"]["pending"], 0);
}

#[tokio::test]
async fn test_recent_predictions_default_to_five() {
    let config = TestConfig::default().to_app_config();
    let store = Arc::new(InMemoryStore::new());
    let patient = TestUser::patient("recent@example.com");
    seed_predictions(&store, patient.id, &[Outcome::Negative; 8]).await;

    let app = app(store, &config);
    let bearer = JwtTestUtils::bearer(&patient, &config);

    let (status, body) = get(&app, "/recent-predictions", &bearer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 5);

    let (_, body) = get(&app, "/recent-predictions?limit=2", &bearer).await;
    assert_eq!(body["predictions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_recent_predictions_are_patient_only() {
    let config = TestConfig::default().to_app_config();
    let doctor = TestUser::doctor("dr2@hospital.com");

    let app = app(Arc::new(InMemoryStore::new()), &config);
    let (status, body) = get(
        &app,
        "/recent-predictions",
        &JwtTestUtils::bearer(&doctor, &config),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_history_follows_role() {
    let config = TestConfig::default().to_app_config();
    let store = Arc::new(InMemoryStore::new());
    let patient = TestUser::patient("history@example.com");
    seed_predictions(&store, patient.id, &[Outcome::Negative]).await;

    let app = app(store, &config);
    let (_, body) = get(&app, "/history", &JwtTestUtils::bearer(&patient, &config)).await;
    assert_eq!(body["predictions"].as_array().unwrap().len(), 1);

    let doctor = TestUser::doctor("dr3@hospital.com");
    let (_, body) = get(&app, "/history", &JwtTestUtils::bearer(&doctor, &config)).await;
    assert!(body["appointments"].as_array().unwrap().is_empty());
}
