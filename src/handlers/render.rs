//! Template rendering and error responses
//!
//! Templates are compiled into the binary and registered with one `Tera`
//! instance at startup. Translations reach the templates through the `t`
//! function; validation errors are translated before they reach a template
//! or a JSON body.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tera::{Context, Tera, Value};
use tracing::{debug, error, warn};

use crate::handlers::AppState;
use crate::i18n::I18n;
use crate::models::User;
use crate::utils::errors::{ErrorSeverity, Result, SchoolError, ValidationErrors};
use crate::utils::helpers::format_score;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("macros.html", include_str!("../../templates/macros.html")),
    ("error.html", include_str!("../../templates/error.html")),
    ("dashboard.html", include_str!("../../templates/dashboard.html")),
    ("accounts/login.html", include_str!("../../templates/accounts/login.html")),
    ("accounts/register.html", include_str!("../../templates/accounts/register.html")),
    ("accounts/profile.html", include_str!("../../templates/accounts/profile.html")),
    ("accounts/profile_edit.html", include_str!("../../templates/accounts/profile_edit.html")),
    ("academics/subjects.html", include_str!("../../templates/academics/subjects.html")),
    ("academics/classes.html", include_str!("../../templates/academics/classes.html")),
    ("academics/enrollments.html", include_str!("../../templates/academics/enrollments.html")),
    ("academics/lessons.html", include_str!("../../templates/academics/lessons.html")),
    ("academics/lesson_detail.html", include_str!("../../templates/academics/lesson_detail.html")),
    ("journal/grade_form.html", include_str!("../../templates/journal/grade_form.html")),
    ("journal/attendance_form.html", include_str!("../../templates/journal/attendance_form.html")),
    ("journal/lessons.html", include_str!("../../templates/journal/lessons.html")),
    ("journal/grades.html", include_str!("../../templates/journal/grades.html")),
    ("journal/attendance.html", include_str!("../../templates/journal/attendance.html")),
    ("director/users.html", include_str!("../../templates/director/users.html")),
    ("director/user_role.html", include_str!("../../templates/director/user_role.html")),
    ("director/classes.html", include_str!("../../templates/director/classes.html")),
    ("director/class_form.html", include_str!("../../templates/director/class_form.html")),
    ("director/class_students.html", include_str!("../../templates/director/class_students.html")),
    ("director/add_student.html", include_str!("../../templates/director/add_student.html")),
    ("director/subjects.html", include_str!("../../templates/director/subjects.html")),
    ("director/subject_form.html", include_str!("../../templates/director/subject_form.html")),
    ("director/lessons.html", include_str!("../../templates/director/lessons.html")),
    ("director/lesson_form.html", include_str!("../../templates/director/lesson_form.html")),
    ("director/confirm_delete.html", include_str!("../../templates/director/confirm_delete.html")),
    ("reports/class.html", include_str!("../../templates/reports/class.html")),
    ("reports/student.html", include_str!("../../templates/reports/student.html")),
    ("reports/search.html", include_str!("../../templates/reports/search.html")),
];

/// Compile the embedded templates and register the `t` function and `score` filter
///
/// `t(key=..., lang=...)` looks a message up; with `count=n` the plural form is chosen.
pub fn build_templates(i18n: Arc<I18n>) -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.iter().copied())?;

    tera.register_function("t", move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let key = args
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("t() needs a `key` argument"))?;
        let lang = args
            .get("lang")
            .and_then(Value::as_str)
            .unwrap_or_else(|| i18n.default_language());
        match args.get("count").and_then(Value::as_i64) {
            Some(count) => Ok(Value::String(i18n.tp(key, lang, count as i32, None))),
            None => Ok(Value::String(i18n.t(key, lang, None))),
        }
    });

    tera.register_filter("score", |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
        match value.as_f64() {
            Some(score) => Ok(Value::String(format_score(score))),
            None => Ok(value.clone()),
        }
    });

    debug!(templates = TEMPLATES.len(), "Templates compiled");
    Ok(tera)
}

/// Validation errors translated for a form: per field and for the whole form
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormErrors {
    pub fields: HashMap<String, Vec<String>>,
    pub form: Vec<String>,
}

impl FormErrors {
    pub fn translate(i18n: &I18n, errors: &ValidationErrors, lang: &str) -> Self {
        let mut translated = Self::default();
        for error in &errors.errors {
            let message = i18n.error_message(error, lang);
            match &error.field {
                Some(field) => translated.fields.entry(field.clone()).or_default().push(message),
                None => translated.form.push(message),
            }
        }
        translated
    }
}

/// Log an error at the level its severity calls for
pub fn log_error(error: &SchoolError) {
    match error.severity() {
        ErrorSeverity::Info => debug!(error = %error, "Request ended with a client error"),
        ErrorSeverity::Warning => warn!(error = %error, "Request refused"),
        ErrorSeverity::Error => error!(error = %error, "Request failed"),
        ErrorSeverity::Critical => error!(error = %error, critical = true, "Request failed"),
    }
}

fn status_of(error: &SchoolError) -> StatusCode {
    match error {
        SchoolError::Validation(_) => StatusCode::BAD_REQUEST,
        SchoolError::Authentication(_) | SchoolError::Unauthenticated => StatusCode::UNAUTHORIZED,
        SchoolError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        SchoolError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Translation key of the page-level message for an error
fn message_key(error: &SchoolError) -> String {
    match error {
        SchoolError::Validation(_) => "errors.invalid_form".to_string(),
        SchoolError::Authentication(failure) => format!("errors.{}", failure.code()),
        SchoolError::Unauthenticated => "errors.unauthenticated".to_string(),
        SchoolError::PermissionDenied(_) => "errors.forbidden".to_string(),
        SchoolError::NotFound { .. } => "errors.not_found".to_string(),
        _ => "errors.server_error".to_string(),
    }
}

/// Error answer of an HTML page
#[derive(Debug)]
pub struct PageError(Response);

impl PageError {
    pub fn from_error(state: &AppState, error: SchoolError, lang: &str) -> Self {
        log_error(&error);

        if matches!(error, SchoolError::Unauthenticated) {
            return Self(Redirect::to(crate::middleware::auth::LOGIN_PATH).into_response());
        }

        let status = status_of(&error);
        let details = match &error {
            SchoolError::Validation(errors) => FormErrors::translate(&state.i18n, errors, lang).form_and_fields(),
            _ => Vec::new(),
        };

        let mut context = Context::new();
        context.insert("lang", lang);
        context.insert("status", &status.as_u16());
        context.insert("message", &state.i18n.t(&message_key(&error), lang, None));
        context.insert("details", &details);
        context.insert("current_user", &Option::<User>::None);
        context.insert("errors", &FormErrors::default());

        match state.templates.render("error.html", &context) {
            Ok(body) => Self((status, Html(body)).into_response()),
            Err(e) => {
                error!(error = %e, "Error page failed to render");
                Self((status, status.canonical_reason().unwrap_or("error")).into_response())
            }
        }
    }
}

impl FormErrors {
    /// Every message, form-wide ones first
    fn form_and_fields(self) -> Vec<String> {
        let mut all = self.form;
        let mut fields: Vec<(String, Vec<String>)> = self.fields.into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        all.extend(fields.into_iter().flat_map(|(_, messages)| messages));
        all
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        self.0
    }
}

/// Error answer of the JSON API
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    pub fn from_error(state: &AppState, error: SchoolError, lang: &str) -> Self {
        log_error(&error);

        let status = status_of(&error);
        let body = match &error {
            SchoolError::Validation(errors) => {
                let translated = FormErrors::translate(&state.i18n, errors, lang);
                let mut fields: serde_json::Map<String, Value> = translated
                    .fields
                    .into_iter()
                    .map(|(field, messages)| (field, json!(messages)))
                    .collect();
                if !translated.form.is_empty() {
                    fields.insert("non_field_errors".to_string(), json!(translated.form));
                }
                json!({ "errors": fields })
            }
            _ => json!({ "detail": state.i18n.t(&message_key(&error), lang, None) }),
        };

        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status == StatusCode::UNAUTHORIZED {
            (
                self.status,
                [(WWW_AUTHENTICATE, "Basic realm=\"school-journal\"")],
                Json(self.body),
            )
                .into_response()
        } else {
            (self.status, Json(self.body)).into_response()
        }
    }
}

/// Turn a service result into a page result
pub trait PageContext<T> {
    fn or_page(self, state: &AppState, lang: &str) -> std::result::Result<T, PageError>;
}

impl<T> PageContext<T> for Result<T> {
    fn or_page(self, state: &AppState, lang: &str) -> std::result::Result<T, PageError> {
        self.map_err(|e| PageError::from_error(state, e, lang))
    }
}

/// Turn a service result into an API result
pub trait ApiContext<T> {
    fn or_api(self, state: &AppState, lang: &str) -> std::result::Result<T, ApiError>;
}

impl<T> ApiContext<T> for Result<T> {
    fn or_api(self, state: &AppState, lang: &str) -> std::result::Result<T, ApiError> {
        self.map_err(|e| ApiError::from_error(state, e, lang))
    }
}

pub type PageResult = std::result::Result<Response, PageError>;

impl AppState {
    /// Render a page; `user` drives the navigation bar
    pub fn render(&self, template: &str, lang: &str, user: Option<&User>, mut context: Context) -> PageResult {
        context.insert("lang", lang);
        context.insert("current_user", &user);
        if !context.contains_key("errors") {
            context.insert("errors", &FormErrors::default());
        }

        match self.templates.render(template, &context) {
            Ok(body) => Ok(Html(body).into_response()),
            Err(e) => {
                warn!(template = template, "Template rendering failed");
                Err(PageError::from_error(self, SchoolError::Template(e), lang))
            }
        }
    }

    /// Render a form again with its validation errors
    pub fn render_form(
        &self,
        template: &str,
        lang: &str,
        user: Option<&User>,
        mut context: Context,
        errors: &ValidationErrors,
    ) -> PageResult {
        context.insert("errors", &FormErrors::translate(&self.i18n, errors, lang));
        self.render(template, lang, user, context)
    }
}
