//! HTTP handlers
//!
//! This module wires the axum router:
//! - HTML pages for accounts, academics, the journal, administration and reports
//! - the JSON API under `/api`
//! - liveness and readiness probes

pub mod academics;
pub mod accounts;
pub mod api;
pub mod dashboard;
pub mod director;
pub mod health;
pub mod journal;
pub mod render;
pub mod reports;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tera::Tera;

use crate::config::Settings;
use crate::i18n::I18n;
use crate::middleware::log_requests;
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub services: ServiceFactory,
    pub i18n: Arc<I18n>,
    pub templates: Arc<Tera>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings, services: ServiceFactory, i18n: I18n) -> Result<Self> {
        let i18n = Arc::new(i18n);
        let templates = render::build_templates(i18n.clone())?;

        Ok(Self {
            services,
            i18n,
            templates: Arc::new(templates),
            settings: Arc::new(settings),
        })
    }
}

/// `?page=` of paginated listings
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/accounts", account_routes())
        .nest("/academics", academics_routes())
        .nest("/journal", journal_routes())
        .nest("/director", director_routes())
        .nest("/reports", report_routes())
        .nest("/api", api_routes())
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .layer(axum::middleware::from_fn(log_requests))
        .with_state(state)
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(accounts::login_page).post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/register", get(accounts::register_page).post(accounts::register))
        .route("/profile", get(accounts::profile).post(accounts::update_profile))
}

fn academics_routes() -> Router<AppState> {
    Router::new()
        .route("/subjects", get(academics::subjects))
        .route("/classes", get(academics::classes))
        .route("/enrollments", get(academics::enrollments))
        .route("/lessons", get(academics::lessons))
        .route("/lessons/{id}", get(academics::lesson_detail))
}

fn journal_routes() -> Router<AppState> {
    Router::new()
        .route("/grades/new", get(journal::grade_form).post(journal::create_grade))
        .route(
            "/attendance/new",
            get(journal::attendance_form).post(journal::create_attendance),
        )
        .route("/teacher/lessons", get(journal::teacher_lessons))
        .route("/teacher/grades", get(journal::teacher_grades))
        .route("/teacher/attendance", get(journal::teacher_attendance))
        .route("/me/grades", get(journal::my_grades))
        .route("/me/attendance", get(journal::my_attendance))
}

fn director_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(director::users))
        .route("/users/{id}/role", get(director::role_form).post(director::change_role))
        .route("/users/{id}/delete", get(director::confirm_delete_user).post(director::delete_user))
        .route("/classes", get(director::classes))
        .route("/classes/new", get(director::class_form).post(director::create_class))
        .route("/classes/{id}/students", get(director::class_students))
        .route(
            "/classes/{id}/add-student",
            get(director::add_student_form).post(director::add_student),
        )
        .route(
            "/classes/{id}/delete",
            get(director::confirm_delete_class).post(director::delete_class),
        )
        .route("/subjects", get(director::subjects))
        .route("/subjects/new", get(director::subject_form).post(director::create_subject))
        .route(
            "/subjects/{id}/delete",
            get(director::confirm_delete_subject).post(director::delete_subject),
        )
        .route("/lessons", get(director::lessons))
        .route("/lessons/new", get(director::lesson_form).post(director::create_lesson))
        .route(
            "/lessons/{id}/delete",
            get(director::confirm_delete_lesson).post(director::delete_lesson),
        )
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/class/{id}", get(reports::class_report))
        .route("/class/{id}/pdf", get(reports::class_report_pdf))
        .route("/class/{id}/attendance/pdf", get(reports::class_attendance_pdf))
        .route("/students/search", get(reports::search_students))
        .route("/student/{id}", get(reports::student_report))
        .route("/student/{id}/pdf", get(reports::student_report_pdf))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/subjects", get(api::subjects))
        .route("/subjects/{id}", get(api::subject))
        .route("/classes", get(api::classes))
        .route("/classes/{id}", get(api::classroom))
        .route("/enrollments", get(api::enrollments))
        .route("/lessons", get(api::lessons))
        .route("/lessons/{id}", get(api::lesson))
        .route("/grades", get(api::grades).post(api::create_grade))
        .route(
            "/grades/{id}",
            get(api::grade).patch(api::update_grade).delete(api::delete_grade),
        )
        .route("/attendance", get(api::attendance).post(api::create_attendance))
        .route(
            "/attendance/{id}",
            get(api::attendance_record)
                .patch(api::update_attendance)
                .delete(api::delete_attendance),
        )
}
