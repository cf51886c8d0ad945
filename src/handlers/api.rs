//! JSON API
//!
//! Same visibility rules as the HTML pages. Journal writes follow the same
//! checks as the teacher's forms; malformed bodies are answered as an
//! invalid form rather than with the extractor's plain-text rejection.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;

use crate::handlers::render::{ApiContext, ApiError};
use crate::handlers::{AppState, PageQuery};
use crate::middleware::ApiUser;
use crate::models::{
    AttendanceDetails, ClassRoomDetails, CreateAttendanceRequest, CreateGradeRequest, EnrollmentDetails,
    GradeDetails, LessonDetails, SubjectDetails, UpdateAttendanceRequest, UpdateGradeRequest,
};
use crate::utils::errors::ValidationErrors;
use crate::utils::helpers::Page;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn body<T>(state: &AppState, lang: &str, payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable JSON body");
            Err(ApiError::from_error(state, ValidationErrors::non_field("invalid_form").into(), lang))
        }
    }
}

pub async fn subjects(State(state): State<AppState>, ApiUser { user, lang }: ApiUser) -> ApiResult<Vec<SubjectDetails>> {
    let subjects = state
        .services
        .academics_service
        .subjects(&user)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(subjects))
}

pub async fn subject(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Path(id): Path<i64>,
) -> ApiResult<SubjectDetails> {
    let subject = state
        .services
        .academics_service
        .subject(&user, id)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(subject))
}

pub async fn classes(State(state): State<AppState>, ApiUser { user, lang }: ApiUser) -> ApiResult<Vec<ClassRoomDetails>> {
    let classes = state
        .services
        .academics_service
        .classrooms(&user)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(classes))
}

pub async fn classroom(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Path(id): Path<i64>,
) -> ApiResult<ClassRoomDetails> {
    let classroom = state
        .services
        .academics_service
        .classroom(&user, id)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(classroom))
}

pub async fn enrollments(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<EnrollmentDetails>> {
    let page = state
        .services
        .academics_service
        .enrollments(&user, query.page)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(page))
}

pub async fn lessons(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<LessonDetails>> {
    let page = state
        .services
        .academics_service
        .lessons(&user, query.page)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(page))
}

pub async fn lesson(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Path(id): Path<i64>,
) -> ApiResult<LessonDetails> {
    let lesson = state
        .services
        .academics_service
        .lesson(&user, id)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(lesson))
}

pub async fn grades(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<GradeDetails>> {
    let page = state
        .services
        .journal_service
        .grades(&user, query.page)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(page))
}

pub async fn create_grade(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    payload: Result<Json<CreateGradeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GradeDetails>), ApiError> {
    let request = body(&state, &lang, payload)?;
    let journal = &state.services.journal_service;

    let grade = journal.create_grade(&user, request).await.or_api(&state, &lang)?;
    let details = journal.grade(&user, grade.id).await.or_api(&state, &lang)?;
    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn grade(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Path(id): Path<i64>,
) -> ApiResult<GradeDetails> {
    let grade = state
        .services
        .journal_service
        .grade(&user, id)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(grade))
}

pub async fn update_grade(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateGradeRequest>, JsonRejection>,
) -> ApiResult<GradeDetails> {
    let request = body(&state, &lang, payload)?;
    let grade = state
        .services
        .journal_service
        .update_grade(&user, id, request)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(grade))
}

pub async fn delete_grade(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .journal_service
        .delete_grade(&user, id)
        .await
        .or_api(&state, &lang)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn attendance(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<AttendanceDetails>> {
    let page = state
        .services
        .journal_service
        .attendance(&user, query.page)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(page))
}

pub async fn create_attendance(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    payload: Result<Json<CreateAttendanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AttendanceDetails>), ApiError> {
    let request = body(&state, &lang, payload)?;
    let journal = &state.services.journal_service;

    let record = journal.create_attendance(&user, request).await.or_api(&state, &lang)?;
    let details = journal
        .attendance_record(&user, record.id)
        .await
        .or_api(&state, &lang)?;
    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn attendance_record(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Path(id): Path<i64>,
) -> ApiResult<AttendanceDetails> {
    let record = state
        .services
        .journal_service
        .attendance_record(&user, id)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(record))
}

pub async fn update_attendance(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateAttendanceRequest>, JsonRejection>,
) -> ApiResult<AttendanceDetails> {
    let request = body(&state, &lang, payload)?;
    let record = state
        .services
        .journal_service
        .update_attendance(&user, id, request)
        .await
        .or_api(&state, &lang)?;
    Ok(Json(record))
}

pub async fn delete_attendance(
    State(state): State<AppState>,
    ApiUser { user, lang }: ApiUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .journal_service
        .delete_attendance(&user, id)
        .await
        .or_api(&state, &lang)?;
    Ok(StatusCode::NO_CONTENT)
}
