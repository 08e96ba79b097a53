// libs/auth-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::AccountService;

#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<AccountService>,
}

pub fn auth_routes(state: AuthState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login_patient))
        .route("/login/patient", post(handlers::login_patient))
        .route("/login/doctor", post(handlers::login_doctor))
        .route("/doctors", get(handlers::list_doctors));

    let protected_routes = Router::new()
        .route("/profile", get(handlers::get_profile))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
