pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{DashboardError, History, PatientStats, ProviderStats, Stats};
pub use router::{dashboard_routes, DashboardState};
pub use services::StatsAggregator;
