use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_cell::seed_sample_doctors;
use clinic_portal_api::{create_router, AppServices};
use notification_cell::notifier_from_config;
use prediction_cell::ModelRegistry;
use shared_config::AppConfig;
use shared_database::{ClinicStore, InMemoryStore, SupabaseStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Clinic Portal API server");

    let config = Arc::new(AppConfig::from_env());

    let registry = Arc::new(ModelRegistry::load_from_dir(Path::new(&config.models_dir)));
    if registry.is_empty() {
        warn!("No models loaded from {}, predictions will be unavailable", config.models_dir.display());
    }

    let store: Arc<dyn ClinicStore> = if config.is_configured() {
        info!("Using Supabase store at {}", config.supabase_url);
        Arc::new(SupabaseStore::new(&config))
    } else {
        warn!("Supabase not configured, using in-memory store (data is not persisted)");
        Arc::new(InMemoryStore::new())
    };

    if let Err(e) = seed_sample_doctors(store.as_ref(), &config.seed_doctor_password).await {
        warn!("Sample doctor seeding failed: {}", e);
    }

    let services = AppServices {
        config: config.clone(),
        store,
        registry,
        notifier: notifier_from_config(&config),
    };

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(services)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
