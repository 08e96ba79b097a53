use std::env;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub jwt_secret: String,
    pub jwt_exp_hours: i64,
    pub models_dir: PathBuf,
    pub allow_sorted_feature_fallback: bool,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_sender: String,
    pub mail_reply_to: String,
    pub hospital_name: String,
    pub hospital_phone: String,
    pub hospital_address: String,
    pub notification_timeout_secs: u64,
    pub port: u16,
    pub seed_doctor_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            jwt_secret: String::new(),
            jwt_exp_hours: 24,
            models_dir: PathBuf::from("models"),
            allow_sorted_feature_fallback: false,
            mail_api_url: String::new(),
            mail_api_key: String::new(),
            mail_sender: String::new(),
            mail_reply_to: String::new(),
            hospital_name: "MediCare AI Hospital".to_string(),
            hospital_phone: "+1 (555) 123-4567".to_string(),
            hospital_address: "123 Health Street, Medical City".to_string(),
            notification_timeout_secs: 20,
            port: 5000,
            seed_doctor_password: "doctor123".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mail_sender = env::var("MAIL_SENDER").unwrap_or_else(|_| {
            warn!("MAIL_SENDER not set, email notifications will be skipped");
            String::new()
        });

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using in-memory store");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            jwt_exp_hours: parse_var("JWT_EXP_DELTA_HOURS", defaults.jwt_exp_hours),
            models_dir: env::var("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("MODELS_DIR not set, using default");
                    defaults.models_dir.clone()
                }),
            allow_sorted_feature_fallback: parse_var(
                "ALLOW_SORTED_FEATURE_FALLBACK",
                defaults.allow_sorted_feature_fallback,
            ),
            mail_api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| {
                    warn!("MAIL_API_URL not set, using empty value");
                    String::new()
                }),
            mail_api_key: env::var("MAIL_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("MAIL_API_KEY not set, using empty value");
                    String::new()
                }),
            mail_reply_to: env::var("MAIL_REPLY_TO").unwrap_or_else(|_| mail_sender.clone()),
            mail_sender,
            hospital_name: env::var("HOSPITAL_NAME").unwrap_or(defaults.hospital_name),
            hospital_phone: env::var("HOSPITAL_PHONE").unwrap_or(defaults.hospital_phone),
            hospital_address: env::var("HOSPITAL_ADDRESS").unwrap_or(defaults.hospital_address),
            notification_timeout_secs: parse_var(
                "NOTIFICATION_TIMEOUT_SECS",
                defaults.notification_timeout_secs,
            ),
            port: parse_var("PORT", defaults.port),
            seed_doctor_password: env::var("SEED_DOCTOR_PASSWORD")
                .unwrap_or(defaults.seed_doctor_password),
        };

        if config.jwt_secret.is_empty() {
            warn!("Application not fully configured - JWT_SECRET is missing");
        }

        config
    }

    /// True when the Supabase-backed store can be used.
    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.mail_api_url.is_empty()
            && !self.mail_api_key.is_empty()
            && !self.mail_sender.is_empty()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_not_configured() {
        let config = AppConfig::default();

        assert!(!config.is_configured());
        assert!(!config.is_mail_configured());
        assert_eq!(config.jwt_exp_hours, 24);
        assert_eq!(config.notification_timeout_secs, 20);
        assert!(!config.allow_sorted_feature_fallback);
    }

    #[test]
    fn test_mail_configuration_requires_all_fields() {
        let mut config = AppConfig {
            mail_api_url: "https://mail.example.com/send".to_string(),
            mail_api_key: "key".to_string(),
            ..AppConfig::default()
        };
        assert!(!config.is_mail_configured());

        config.mail_sender = "clinic@example.com".to_string();
        assert!(config.is_mail_configured());
    }
}
