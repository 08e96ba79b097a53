pub mod email;
pub mod notifier;
pub mod templates;

pub use email::EmailNotifier;
pub use notifier::{LogNotifier, Notifier};
pub use templates::ClinicBranding;
