//! Grade and attendance journal pages

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::Form;
use serde::Deserialize;
use tera::Context;

use crate::handlers::render::{PageContext, PageError, PageResult};
use crate::handlers::{AppState, PageQuery};
use crate::middleware::CurrentUser;
use crate::models::{AttendanceStatus, User};
use crate::services::access::require_teacher;
use crate::services::journal::{AttendanceForm, GradeForm};
use crate::utils::errors::SchoolError;

/// `?lesson=` preselects a lesson and loads its students
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LessonChoice {
    pub lesson: Option<String>,
}

async fn form_context(state: &AppState, teacher: &User, lesson: &str, lang: &str) -> Result<Context, PageError> {
    let lesson_id = lesson.trim().parse::<i64>().ok();
    let (lessons, students) = state
        .services
        .journal_service
        .form_choices(teacher, lesson_id)
        .await
        .or_page(state, lang)?;

    let statuses: Vec<(&str, &str)> = AttendanceStatus::ALL
        .iter()
        .map(|status| (status.code(), status.label()))
        .collect();

    let mut context = Context::new();
    context.insert("lessons", &lessons);
    context.insert("students", &students);
    context.insert("statuses", &statuses);
    Ok(context)
}

pub async fn grade_form(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(choice): Query<LessonChoice>,
) -> PageResult {
    require_teacher(&user).or_page(&state, &lang)?;
    let form = GradeForm {
        lesson: choice.lesson.unwrap_or_default(),
        ..GradeForm::default()
    };

    let mut context = form_context(&state, &user, &form.lesson, &lang).await?;
    context.insert("form", &form);
    state.render("journal/grade_form.html", &lang, Some(&user), context)
}

pub async fn create_grade(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Form(form): Form<GradeForm>,
) -> PageResult {
    require_teacher(&user).or_page(&state, &lang)?;

    let result = match form.parse() {
        Ok(request) => state.services.journal_service.create_grade(&user, request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(Redirect::to("/journal/teacher/grades").into_response()),
        Err(SchoolError::Validation(errors)) => {
            let mut context = form_context(&state, &user, &form.lesson, &lang).await?;
            context.insert("form", &form);
            state.render_form("journal/grade_form.html", &lang, Some(&user), context, &errors)
        }
        Err(e) => Err(PageError::from_error(&state, e, &lang)),
    }
}

pub async fn attendance_form(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(choice): Query<LessonChoice>,
) -> PageResult {
    require_teacher(&user).or_page(&state, &lang)?;
    let form = AttendanceForm {
        lesson: choice.lesson.unwrap_or_default(),
        status: AttendanceStatus::Present.code().to_string(),
        ..AttendanceForm::default()
    };

    let mut context = form_context(&state, &user, &form.lesson, &lang).await?;
    context.insert("form", &form);
    state.render("journal/attendance_form.html", &lang, Some(&user), context)
}

pub async fn create_attendance(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Form(form): Form<AttendanceForm>,
) -> PageResult {
    require_teacher(&user).or_page(&state, &lang)?;

    let result = match form.parse() {
        Ok(request) => state.services.journal_service.create_attendance(&user, request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(Redirect::to("/journal/teacher/attendance").into_response()),
        Err(SchoolError::Validation(errors)) => {
            let mut context = form_context(&state, &user, &form.lesson, &lang).await?;
            context.insert("form", &form);
            state.render_form("journal/attendance_form.html", &lang, Some(&user), context, &errors)
        }
        Err(e) => Err(PageError::from_error(&state, e, &lang)),
    }
}

fn listing(title_key: &str, base_path: &str) -> Context {
    let mut context = Context::new();
    context.insert("title_key", title_key);
    context.insert("base_path", base_path);
    context
}

pub async fn teacher_lessons(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let page = state
        .services
        .journal_service
        .teacher_lessons(&user, query.page)
        .await
        .or_page(&state, &lang)?;

    let mut context = listing("journal.my_lessons", "/journal/teacher/lessons");
    context.insert("page", &page);
    state.render("journal/lessons.html", &lang, Some(&user), context)
}

pub async fn teacher_grades(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let page = state
        .services
        .journal_service
        .teacher_grades(&user, query.page)
        .await
        .or_page(&state, &lang)?;

    let mut context = listing("journal.given_grades", "/journal/teacher/grades");
    context.insert("page", &page);
    context.insert("show_student", &true);
    state.render("journal/grades.html", &lang, Some(&user), context)
}

pub async fn teacher_attendance(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let page = state
        .services
        .journal_service
        .teacher_attendance(&user, query.page)
        .await
        .or_page(&state, &lang)?;

    let mut context = listing("journal.marked_attendance", "/journal/teacher/attendance");
    context.insert("page", &page);
    context.insert("show_student", &true);
    state.render("journal/attendance.html", &lang, Some(&user), context)
}

pub async fn my_grades(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let page = state
        .services
        .journal_service
        .student_grades(&user, query.page)
        .await
        .or_page(&state, &lang)?;

    let mut context = listing("journal.my_grades", "/journal/me/grades");
    context.insert("page", &page);
    context.insert("show_student", &false);
    state.render("journal/grades.html", &lang, Some(&user), context)
}

pub async fn my_attendance(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let page = state
        .services
        .journal_service
        .student_attendance(&user, query.page)
        .await
        .or_page(&state, &lang)?;

    let mut context = listing("journal.my_attendance", "/journal/me/attendance");
    context.insert("page", &page);
    context.insert("show_student", &false);
    state.render("journal/attendance.html", &lang, Some(&user), context)
}
