// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::AppointmentScheduler;

#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub scheduler: Arc<AppointmentScheduler>,
}

pub fn appointment_routes(state: AppointmentState) -> Router {
    // All appointment operations require authentication
    Router::new()
        .route(
            "/appointments",
            post(handlers::book_appointment).get(handlers::list_appointments),
        )
        .route("/appointments/doctor", get(handlers::doctor_appointments))
        .route(
            "/appointments/{appointment_id}",
            get(handlers::get_appointment).put(handlers::update_appointment),
        )
        .route(
            "/doctor/appointments/{appointment_id}/approve",
            post(handlers::approve_appointment),
        )
        .route(
            "/doctor/appointments/{appointment_id}/reject",
            post(handlers::reject_appointment),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
