pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::AuthError;
pub use router::{auth_routes, AuthState};
pub use services::{seed_sample_doctors, AccountService};
