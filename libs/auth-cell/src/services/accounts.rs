// libs/auth-cell/src/services/accounts.rs
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{ClinicStore, StoreError};
use shared_models::auth::Role;
use shared_models::clinic::{DoctorRecord, NewUser, UserRecord};
use shared_utils::jwt::{issue_token, DOCTOR_TOKEN_HOURS};

use crate::models::{AuthError, LoginRequest, RegisterRequest};
use crate::services::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

pub enum Profile {
    Patient(UserRecord),
    Doctor(DoctorRecord),
}

/// Registration, login and profile lookups for patients and doctors.
pub struct AccountService {
    store: Arc<dyn ClinicStore>,
    config: Arc<AppConfig>,
}

impl AccountService {
    pub fn new(store: Arc<dyn ClinicStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<UserRecord, AuthError> {
        let username = required("username", &request.username)?;
        let email = required("email", &request.email)?.to_lowercase();
        let full_name = required("full_name", &request.full_name)?;

        if !email_regex()?.is_match(&email) || email.len() > 254 {
            return Err(AuthError::ValidationError("Invalid email format".to_string()));
        }
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }

        let password_hash = hash_password(&request.password)?;

        let user = self
            .store
            .insert_user(NewUser {
                username,
                email,
                password_hash,
                full_name,
                phone: non_blank(request.phone),
                gender: non_blank(request.gender),
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => AuthError::Conflict,
                other => AuthError::DatabaseError(other.to_string()),
            })?;

        info!("Registered patient {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Returns the signed token and the account it was issued for.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login_patient(
        &self,
        request: LoginRequest,
    ) -> Result<(String, UserRecord), AuthError> {
        let user = self
            .store
            .find_user_by_username(request.username.trim())
            .await
            .map_err(store_error)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !check_password(&request.password, &user.password_hash)? {
            warn!("Failed patient login for {}", user.username);
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(
            user.id,
            &user.email,
            &user.username,
            Role::Patient,
            self.config.jwt_exp_hours,
            &self.config.jwt_secret,
        )
        .map_err(AuthError::Internal)?;

        debug!("Issued patient token for {}", user.id);
        Ok((token, user))
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login_doctor(
        &self,
        request: LoginRequest,
    ) -> Result<(String, DoctorRecord), AuthError> {
        let doctor = self
            .store
            .find_doctor_by_username(request.username.trim())
            .await
            .map_err(store_error)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !check_password(&request.password, &doctor.password_hash)? {
            warn!("Failed doctor login for {}", doctor.username);
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(
            doctor.id,
            &doctor.email,
            &doctor.username,
            Role::Doctor,
            DOCTOR_TOKEN_HOURS,
            &self.config.jwt_secret,
        )
        .map_err(AuthError::Internal)?;

        debug!("Issued doctor token for {}", doctor.id);
        Ok((token, doctor))
    }

    pub async fn profile(&self, account_id: i64, role: Role) -> Result<Profile, AuthError> {
        match role {
            Role::Patient => self
                .store
                .get_user(account_id)
                .await
                .map_err(store_error)?
                .map(Profile::Patient)
                .ok_or(AuthError::NotFound),
            Role::Doctor => self
                .store
                .get_doctor(account_id)
                .await
                .map_err(store_error)?
                .map(Profile::Doctor)
                .ok_or(AuthError::NotFound),
            Role::Unknown => Err(AuthError::NotFound),
        }
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorRecord>, AuthError> {
        self.store.list_doctors().await.map_err(store_error)
    }
}

/// A stored hash that cannot be parsed counts as a failed login.
fn check_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    match verify_password(password, hash) {
        Ok(matched) => Ok(matched),
        Err(e) => {
            warn!("Unreadable password hash: {}", e);
            Ok(false)
        }
    }
}

fn required(field: &str, value: &str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::ValidationError(format!("Missing field: {}", field)));
    }
    Ok(value.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn email_regex() -> Result<&'static Regex, AuthError> {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = EMAIL_RE.get() {
        return Ok(re);
    }
    let re = Regex::new(EMAIL_PATTERN).map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(EMAIL_RE.get_or_init(|| re))
}

fn store_error(error: StoreError) -> AuthError {
    AuthError::DatabaseError(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_database::InMemoryStore;
    use shared_utils::jwt::validate_token;
    use shared_utils::test_utils::TestConfig;

    fn service() -> AccountService {
        AccountService::new(Arc::new(InMemoryStore::new()), TestConfig::default().to_arc())
    }

    fn registration(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            full_name: "Jane Doe".to_string(),
            phone: Some("  ".to_string()),
            gender: Some("female".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let accounts = service();
        let user = accounts
            .register(registration("jane", "Jane@Example.com"))
            .await
            .unwrap();
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.phone, None);
        assert_ne!(user.password_hash, "secret1");

        let (token, logged_in) = accounts
            .login_patient(LoginRequest {
                username: "jane".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);

        let claims = validate_token(&token, &TestConfig::default().to_app_config().jwt_secret)
            .unwrap();
        assert_eq!(claims.record_id(), Some(user.id));
        assert_eq!(claims.role(), Role::Patient);
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_conflicts() {
        let accounts = service();
        accounts.register(registration("jane", "jane@example.com")).await.unwrap();

        assert_matches!(
            accounts.register(registration("jane", "other@example.com")).await,
            Err(AuthError::Conflict)
        );
        assert_matches!(
            accounts.register(registration("janet", "jane@example.com")).await,
            Err(AuthError::Conflict)
        );
    }

    #[tokio::test]
    async fn test_registration_validation() {
        let accounts = service();

        assert_matches!(
            accounts.register(registration("jane", "not-an-email")).await,
            Err(AuthError::ValidationError(msg)) if msg.contains("email")
        );

        let mut short = registration("jane", "jane@example.com");
        short.password = "12345".to_string();
        assert_matches!(
            accounts.register(short).await,
            Err(AuthError::ValidationError(msg)) if msg.contains("at least 6")
        );

        assert_matches!(
            accounts.register(registration(" ", "jane@example.com")).await,
            Err(AuthError::ValidationError(msg)) if msg == "Missing field: username"
        );
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let accounts = service();
        accounts.register(registration("jane", "jane@example.com")).await.unwrap();

        assert_matches!(
            accounts
                .login_patient(LoginRequest {
                    username: "jane".to_string(),
                    password: "wrong!".to_string(),
                })
                .await,
            Err(AuthError::InvalidCredentials)
        );
        assert_matches!(
            accounts
                .login_doctor(LoginRequest {
                    username: "jane".to_string(),
                    password: "secret1".to_string(),
                })
                .await,
            Err(AuthError::InvalidCredentials)
        );
    }
}
