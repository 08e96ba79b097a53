use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use shared_config::AppConfig;

static NEXT_TEST_ID: AtomicI64 = AtomicI64::new(10_000);

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            notification_timeout_secs: 2,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::patient("test@example.com")
    }
}

impl TestUser {
    fn new(email: &str, role: &str) -> Self {
        Self {
            id: NEXT_TEST_ID.fetch_add(1, Ordering::Relaxed),
            email: email.to_string(),
            username: email.split('@').next().unwrap_or(email).to_string(),
            role: role.to_string(),
        }
    }

    pub fn with_id(id: i64, email: &str, role: &str) -> Self {
        Self {
            id,
            ..Self::new(email, role)
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id.to_string(),
            "email": user.email,
            "username": user.username,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        // HMAC accepts keys of any length.
        let signature_encoded = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
            Ok(mut mac) => {
                mac.update(signing_input.as_bytes());
                general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
            }
            Err(_) => String::new(),
        };

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, config: &AppConfig) -> String {
        format!(
            "Bearer {}",
            Self::create_test_token(user, &config.jwt_secret, None)
        )
    }
}

/// PostgREST row shapes for wiremock-backed tests.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_response(id: i64, username: &str, email: &str) -> serde_json::Value {
        json!({
            "id": id,
            "username": username,
            "email": email,
            "password_hash": "",
            "full_name": "Test Patient",
            "phone": null,
            "gender": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_response(id: i64, full_name: &str, specialization: &str) -> serde_json::Value {
        json!({
            "id": id,
            "username": format!("doctor{}", id),
            "email": format!("doctor{}@hospital.com", id),
            "password_hash": "",
            "full_name": full_name,
            "phone": "555-0100",
            "specialization": specialization,
            "qualification": null,
            "experience_years": 10,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        id: i64,
        subject_id: i64,
        provider_id: i64,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "subject_id": subject_id,
            "prediction_id": null,
            "provider_id": provider_id,
            "provider_name": "Dr. Test",
            "specialization": "General Practice",
            "appointment_date": "2030-01-15",
            "appointment_time": "10:00:00",
            "status": status,
            "notes": null,
            "reason": null,
            "created_at": "2024-01-01T00:00:00Z",
            "decided_at": null,
            "decided_by": null
        })
    }

    pub fn prediction_response(id: i64, subject_id: i64, condition: &str, outcome: &str) -> serde_json::Value {
        json!({
            "id": id,
            "subject_id": subject_id,
            "condition": condition,
            "outcome": outcome,
            "confidence": 0.9,
            "raw_input": "{}",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        assert_eq!(user.email, "doc@example.com");
        assert_eq!(user.username, "doc");

        assert_eq!(user.role, "doctor");

        let pinned = TestUser::with_id(42, "pat@example.com", "patient");
        assert_eq!(pinned.id, 42);
        assert_eq!(pinned.username, "pat");
    }

    #[test]
    fn test_jwt_token_round_trips_through_validation() {
        let config = TestConfig::default();
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

        let validated = validate_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(validated.record_id(), Some(user.id));
    }
}
