//! Registration and password authentication against a real database

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;

use helpers::*;
use school_journal::models::{CreateUserRequest, Role, UpdateUserRequest};
use school_journal::services::auth::RegistrationForm;
use school_journal::utils::errors::{AuthFailure, SchoolError};

fn registration(email: &str) -> RegistrationForm {
    RegistrationForm {
        email: email.to_string(),
        first_name: "Иван".to_string(),
        last_name: "Иванов".to_string(),
        password1: "secret-pass".to_string(),
        password2: "secret-pass".to_string(),
    }
}

#[tokio::test]
#[serial]
async fn test_register_creates_student_with_profile() {
    let database = require_db!();
    let services = database.services();

    let user = services
        .auth_service
        .register(registration("  Ivan.Ivanov@School.TEST "))
        .await
        .unwrap();

    assert_eq!(user.email, "ivan.ivanov@school.test");
    assert_eq!(user.username, "ivan.ivanov");
    assert_eq!(user.role, Role::Student);
    assert!(user.is_active);
    assert_ne!(user.password_hash, "secret-pass");
    assert_eq!(database.count_records("profiles").await, 1);
}

#[tokio::test]
#[serial]
async fn test_register_derives_free_username() {
    let database = require_db!();
    let services = database.services();

    let first = services.auth_service.register(registration("ivan@a.test")).await.unwrap();
    let second = services.auth_service.register(registration("ivan@b.test")).await.unwrap();
    let third = services.auth_service.register(registration("ivan@c.test")).await.unwrap();

    assert_eq!(first.username, "ivan");
    assert_eq!(second.username, "ivan2");
    assert_eq!(third.username, "ivan3");
}

#[tokio::test]
#[serial]
async fn test_register_rejects_taken_email() {
    let database = require_db!();
    let services = database.services();
    services.auth_service.register(registration("ivan@school.test")).await.unwrap();

    let result = services.auth_service.register(registration("IVAN@school.test")).await;
    assert_matches!(result, Err(SchoolError::Validation(errors)) if errors.has(Some("email"), "email_taken"));
    assert_eq!(database.count_records("users").await, 1);
}

#[tokio::test]
#[serial]
async fn test_duplicate_username_is_not_reported_as_email() {
    let database = require_db!();
    let existing = create_user(&database.db, "petr@school.test", "Пётр", "Петров", Role::Student).await;

    let result = database
        .db
        .users
        .create(CreateUserRequest {
            email: "petr@other.test".to_string(),
            username: existing.username.clone(),
            first_name: "Пётр".to_string(),
            last_name: "Сидоров".to_string(),
            password_hash: existing.password_hash.clone(),
            role: Role::Student,
        })
        .await;
    assert_matches!(
        result,
        Err(SchoolError::Validation(errors))
            if errors.has(Some("username"), "username_taken") && !errors.has_field("email")
    );

    let result = database
        .db
        .users
        .create(CreateUserRequest {
            email: "PETR@school.test".to_string(),
            username: "petr.other".to_string(),
            first_name: "Пётр".to_string(),
            last_name: "Сидоров".to_string(),
            password_hash: existing.password_hash.clone(),
            role: Role::Student,
        })
        .await;
    assert_matches!(result, Err(SchoolError::Validation(errors)) if errors.has(Some("email"), "email_taken"));
    assert_eq!(database.count_records("users").await, 1);
}

#[tokio::test]
#[serial]
async fn test_register_collects_every_form_error() {
    let database = require_db!();
    let services = database.services();

    let form = RegistrationForm {
        email: "not-an-email".to_string(),
        first_name: "I".to_string(),
        last_name: "Иванов".to_string(),
        password1: "short".to_string(),
        password2: "other".to_string(),
    };
    let Err(SchoolError::Validation(errors)) = services.auth_service.register(form).await else {
        panic!("registration should fail validation");
    };

    assert!(errors.has(Some("email"), "invalid_email"));
    assert!(errors.has_field("first_name"));
    assert!(errors.has_field("password1"));
    assert!(errors.has(None, "password_mismatch"));
    assert_eq!(database.count_records("users").await, 0);
}

#[tokio::test]
#[serial]
async fn test_authenticate() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    let user = services
        .auth_service
        .authenticate("PETROV@school.test", PASSWORD)
        .await
        .unwrap();
    assert_eq!(user.id, school.teacher.id);

    let wrong_password = services.auth_service.authenticate("petrov@school.test", "nope").await;
    assert_matches!(
        wrong_password,
        Err(SchoolError::Authentication(AuthFailure::InvalidCredentials))
    );

    let unknown = services.auth_service.authenticate("nobody@school.test", PASSWORD).await;
    assert_matches!(unknown, Err(SchoolError::Authentication(AuthFailure::InvalidCredentials)));
}

#[tokio::test]
#[serial]
async fn test_disabled_account_cannot_authenticate() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    database
        .db
        .users
        .update(
            school.student.id,
            UpdateUserRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let result = services.auth_service.authenticate("ivanov@school.test", PASSWORD).await;
    assert_matches!(result, Err(SchoolError::Authentication(AuthFailure::AccountDisabled)));
}
