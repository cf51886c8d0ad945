//! Authentication service implementation
//! 
//! This service handles registration, password verification, login sessions
//! and HTTP Basic credentials for the JSON API.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::database::DatabaseService;
use crate::models::{CreateUserRequest, Role, User};
use crate::state::{Session, SessionStorage};
use crate::utils::errors::{AuthFailure, Result, SchoolError, ValidationErrors};
use crate::utils::helpers::{
    is_valid_email, is_valid_person_name, normalize_email, username_base, username_candidate,
};
use crate::utils::logging::{log_login_failure, log_user_action};

/// Registration tries this many derived usernames before giving up
const USERNAME_ATTEMPTS: u32 = 3;

/// Submitted registration form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Submitted login form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Hash a password into an argon2 PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SchoolError::PasswordHash(e.to_string()))
}

/// Check a password against a stored hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| SchoolError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Field checks that need no database; every failure is collected
pub fn validate_registration(form: &RegistrationForm, min_password_length: usize) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let email = normalize_email(&form.email);
    if email.is_empty() {
        errors.add("email", "required");
    } else if !is_valid_email(&email) {
        errors.add("email", "invalid_email");
    }

    for (field, value) in [("first_name", form.first_name.trim()), ("last_name", form.last_name.trim())] {
        if value.is_empty() {
            errors.add(field, "required");
        } else if !is_valid_person_name(value) {
            errors.add(field, "invalid_name");
        }
    }

    if form.password1.is_empty() {
        errors.add("password1", "required");
    } else if form.password1.chars().count() < min_password_length {
        errors.add_with_param("password1", "password_too_short", "min", min_password_length);
    }

    if form.password2.is_empty() {
        errors.add("password2", "required");
    } else if !form.password1.is_empty() && form.password1 != form.password2 {
        errors.add_non_field("password_mismatch");
    }

    errors
}

/// Authentication service for accounts and sessions
#[derive(Clone)]
pub struct AuthService {
    db: DatabaseService,
    sessions: SessionStorage,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: DatabaseService, sessions: SessionStorage, config: AuthConfig) -> Self {
        Self { db, sessions, config }
    }

    /// Register a student account with an empty profile
    pub async fn register(&self, form: RegistrationForm) -> Result<User> {
        let mut errors = validate_registration(&form, self.config.min_password_length);

        let email = normalize_email(&form.email);
        if !errors.has_field("email") && self.db.users.email_exists(&email).await? {
            errors.add("email", "email_taken");
        }
        errors.into_result()?;

        let password_hash = hash_password(&form.password1)?;

        // A concurrent registration may take the derived handle first
        let mut attempts = 0;
        let user = loop {
            attempts += 1;
            let username = self.free_username(&email).await?;
            let created = self
                .db
                .users
                .create(CreateUserRequest {
                    email: email.clone(),
                    username,
                    first_name: form.first_name.trim().to_string(),
                    last_name: form.last_name.trim().to_string(),
                    password_hash: password_hash.clone(),
                    role: Role::Student,
                })
                .await;
            match created {
                Err(SchoolError::Validation(errors))
                    if attempts < USERNAME_ATTEMPTS && errors.has(Some("username"), "username_taken") =>
                {
                    debug!(attempts, "Username taken concurrently, retrying");
                }
                other => break other?,
            }
        };
        self.db.profiles.create_empty(user.id).await?;

        log_user_action(user.id, "register", Some(&user.username));
        info!(user_id = user.id, "New account registered");
        Ok(user)
    }

    /// First free login handle derived from the email's local part
    async fn free_username(&self, email: &str) -> Result<String> {
        let base = username_base(email);
        let mut attempt = 1;
        loop {
            let candidate = username_candidate(&base, attempt);
            if !self.db.users.username_exists(&candidate).await? {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }

    /// Check an email and password pair
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);

        let Some(user) = self.db.users.find_by_email(&email).await? else {
            log_login_failure(&email, AuthFailure::InvalidCredentials.code());
            return Err(SchoolError::Authentication(AuthFailure::InvalidCredentials));
        };

        if !verify_password(password, &user.password_hash)? {
            log_login_failure(&email, AuthFailure::InvalidCredentials.code());
            return Err(SchoolError::Authentication(AuthFailure::InvalidCredentials));
        }

        if !user.is_active {
            log_login_failure(&email, AuthFailure::AccountDisabled.code());
            return Err(SchoolError::Authentication(AuthFailure::AccountDisabled));
        }

        Ok(user)
    }

    /// Authenticate and open a session
    pub async fn login(&self, form: LoginForm) -> Result<(User, Session)> {
        let user = self.authenticate(&form.email, &form.password).await?;
        let session = self.sessions.create(user.id).await?;

        log_user_action(user.id, "login", None);
        Ok((user, session))
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        if let Some(session) = self.sessions.load(token).await? {
            log_user_action(session.user_id, "logout", None);
        }
        self.sessions.delete(token).await
    }

    /// The active user behind a session token, if any
    pub async fn user_for_session(&self, token: &str) -> Result<Option<User>> {
        let Some(session) = self.sessions.load(token).await? else {
            return Ok(None);
        };

        match self.db.users.find_by_id(session.user_id).await? {
            Some(user) if user.is_active => Ok(Some(user)),
            _ => {
                debug!(user_id = session.user_id, "Session of a missing or disabled user, removing");
                self.sessions.delete(token).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            email: "  Anna.Petrova@School.TEST ".to_string(),
            first_name: "Анна".to_string(),
            last_name: "Петрова-Сидорова".to_string(),
            password1: "secret-pass".to_string(),
            password2: "secret-pass".to_string(),
        }
    }

    #[test]
    fn test_valid_registration_has_no_errors() {
        assert!(validate_registration(&form(), 8).is_empty());
    }

    #[test]
    fn test_registration_collects_every_error() {
        let form = RegistrationForm {
            email: "not-an-email".to_string(),
            first_name: "A".to_string(),
            last_name: "Smith1".to_string(),
            password1: "short".to_string(),
            password2: "other".to_string(),
        };
        let errors = validate_registration(&form, 8);

        assert!(errors.has(Some("email"), "invalid_email"));
        assert!(errors.has(Some("first_name"), "invalid_name"));
        assert!(errors.has(Some("last_name"), "invalid_name"));
        assert!(errors.has(Some("password1"), "password_too_short"));
        assert!(errors.has(None, "password_mismatch"));
    }

    #[test]
    fn test_required_fields() {
        let errors = validate_registration(&RegistrationForm::default(), 8);
        for field in ["email", "first_name", "last_name", "password1", "password2"] {
            assert!(errors.has(Some(field), "required"), "{} should be required", field);
        }
        assert!(!errors.has(None, "password_mismatch"));
    }

    #[test]
    fn test_minimum_length_is_configurable() {
        let mut form = form();
        form.password1 = "abcd".to_string();
        form.password2 = "abcd".to_string();
        assert!(validate_registration(&form, 4).is_empty());
        assert!(validate_registration(&form, 5).has(Some("password1"), "password_too_short"));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(matches!(verify_password("x", "plain"), Err(SchoolError::PasswordHash(_))));
    }

    proptest! {
        #[test]
        fn prop_mismatched_passwords_always_rejected(a in "[a-z]{8,16}", b in "[A-Z]{8,16}") {
            let mut form = form();
            form.password1 = a;
            form.password2 = b;
            prop_assert!(validate_registration(&form, 8).has(None, "password_mismatch"));
        }
    }
}
