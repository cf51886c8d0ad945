//! Report pages and PDF downloads

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use serde::Deserialize;
use tera::Context;

use crate::handlers::render::{PageContext, PageResult};
use crate::handlers::AppState;
use crate::middleware::CurrentUser;
use crate::services::access::require_staff;
use crate::services::report::{PdfFile, ReportQuery};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

fn pdf_response(file: PdfFile) -> axum::response::Response {
    (
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (CONTENT_DISPOSITION, file.content_disposition),
        ],
        file.bytes,
    )
        .into_response()
}

/// Class averages, optionally filtered by grade date and subject
pub async fn class_report(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<ReportQuery>,
) -> PageResult {
    require_staff(&user).or_page(&state, &lang)?;
    let filter = query.filter().or_page(&state, &lang)?;

    let report = state
        .services
        .report_service
        .class_report(&user, id, filter)
        .await
        .or_page(&state, &lang)?;
    let subjects = state
        .services
        .academics_service
        .subjects(&user)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("report", &report);
    context.insert("query", &query);
    context.insert("subjects", &subjects);
    state.render("reports/class.html", &lang, Some(&user), context)
}

pub async fn class_report_pdf(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let file = state
        .services
        .report_service
        .class_report_pdf(&user, id)
        .await
        .or_page(&state, &lang)?;
    Ok(pdf_response(file))
}

pub async fn class_attendance_pdf(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let file = state
        .services
        .report_service
        .class_attendance_pdf(&user, id)
        .await
        .or_page(&state, &lang)?;
    Ok(pdf_response(file))
}

pub async fn student_report(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let report = state
        .services
        .report_service
        .student_report(&user, id)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("report", &report);
    state.render("reports/student.html", &lang, Some(&user), context)
}

pub async fn student_report_pdf(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let file = state
        .services
        .report_service
        .student_report_pdf(&user, id)
        .await
        .or_page(&state, &lang)?;
    Ok(pdf_response(file))
}

pub async fn search_students(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> PageResult {
    let students = state
        .services
        .report_service
        .search_students(&user, &query.q)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("q", query.q.trim());
    context.insert("students", &students);
    state.render("reports/search.html", &lang, Some(&user), context)
}
