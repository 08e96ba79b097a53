pub mod models;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;
use tracing::info;

pub use models::{ApprovalNotice, BookingNotice, RejectionNotice};
pub use services::{EmailNotifier, LogNotifier, Notifier};

/// Email delivery when the mail API is configured, log-only otherwise.
pub fn notifier_from_config(config: &AppConfig) -> Arc<dyn Notifier> {
    if config.is_mail_configured() {
        info!("Email notifications enabled via {}", config.mail_api_url);
        Arc::new(EmailNotifier::new(config))
    } else {
        info!("Mail API not configured, notifications will be logged only");
        Arc::new(LogNotifier)
    }
}
