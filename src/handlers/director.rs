//! Administrator pages: users, classrooms, subjects and lessons
//!
//! Deletions go through a confirmation page (GET) and happen on POST.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::Form;
use serde::Deserialize;
use tera::Context;

use crate::database::repositories::enrollment::RosterSort;
use crate::handlers::render::{PageContext, PageError, PageResult};
use crate::handlers::{AppState, PageQuery};
use crate::middleware::CurrentUser;
use crate::models::{Role, User};
use crate::services::academics::{ClassRoomForm, EnrollForm, LessonForm, SubjectForm};
use crate::services::access::require_admin;
use crate::services::user::RoleForm;
use crate::utils::errors::{SchoolError, ValidationErrors};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub page: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// What a confirmation page is about to delete
struct Deletion {
    description: String,
    action: String,
    back: &'static str,
}

fn render_confirm(
    state: &AppState,
    user: &User,
    lang: &str,
    deletion: &Deletion,
    errors: Option<&ValidationErrors>,
) -> PageResult {
    let mut context = Context::new();
    context.insert("description", &deletion.description);
    context.insert("action", &deletion.action);
    context.insert("back", deletion.back);
    match errors {
        Some(errors) => state.render_form("director/confirm_delete.html", lang, Some(user), context, errors),
        None => state.render("director/confirm_delete.html", lang, Some(user), context),
    }
}

/// Redirect on success, the confirmation page with messages on a refused deletion
fn after_delete(
    state: &AppState,
    user: &User,
    lang: &str,
    deletion: &Deletion,
    result: crate::utils::errors::Result<()>,
) -> PageResult {
    match result {
        Ok(()) => Ok(Redirect::to(deletion.back).into_response()),
        Err(SchoolError::Validation(errors)) => render_confirm(state, user, lang, deletion, Some(&errors)),
        Err(e) => Err(PageError::from_error(state, e, lang)),
    }
}

fn role_choices() -> Vec<(&'static str, &'static str)> {
    Role::ALL.iter().map(|role| (role.as_str(), role.label())).collect()
}

pub async fn users(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<UserListQuery>,
) -> PageResult {
    let role = query.role.as_deref().and_then(|r| r.parse::<Role>().ok());
    let page = state
        .services
        .user_service
        .list_users(&user, role, query.page)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("page", &page);
    context.insert("roles", &role_choices());
    context.insert("role_filter", &role.map(|r| r.as_str()).unwrap_or(""));
    state.render("director/users.html", &lang, Some(&user), context)
}

async fn role_page(state: &AppState, admin: &User, lang: &str, user_id: i64, form: &RoleForm) -> Result<Context, PageError> {
    require_admin(admin).or_page(state, lang)?;
    let target = state
        .services
        .user_service
        .get_user(user_id)
        .await
        .or_page(state, lang)?;

    let mut context = Context::new();
    context.insert("target", &target);
    context.insert("form", form);
    context.insert("roles", &role_choices());
    Ok(context)
}

pub async fn role_form(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    require_admin(&user).or_page(&state, &lang)?;
    let target = state
        .services
        .user_service
        .get_user(id)
        .await
        .or_page(&state, &lang)?;
    let form = RoleForm {
        role: target.role.as_str().to_string(),
        is_active: target.is_active.then(|| "on".to_string()),
    };

    let context = role_page(&state, &user, &lang, id, &form).await?;
    state.render("director/user_role.html", &lang, Some(&user), context)
}

pub async fn change_role(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<RoleForm>,
) -> PageResult {
    match state.services.user_service.change_role(&user, id, &form).await {
        Ok(_) => Ok(Redirect::to("/director/users").into_response()),
        Err(SchoolError::Validation(errors)) => {
            let context = role_page(&state, &user, &lang, id, &form).await?;
            state.render_form("director/user_role.html", &lang, Some(&user), context, &errors)
        }
        Err(e) => Err(PageError::from_error(&state, e, &lang)),
    }
}

async fn user_deletion(state: &AppState, admin: &User, lang: &str, id: i64) -> Result<Deletion, PageError> {
    require_admin(admin).or_page(state, lang)?;
    let target = state
        .services
        .user_service
        .get_user(id)
        .await
        .or_page(state, lang)?;

    Ok(Deletion {
        description: format!("{} ({})", target.full_name(), target.email),
        action: format!("/director/users/{}/delete", id),
        back: "/director/users",
    })
}

pub async fn confirm_delete_user(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let deletion = user_deletion(&state, &user, &lang, id).await?;
    render_confirm(&state, &user, &lang, &deletion, None)
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let deletion = user_deletion(&state, &user, &lang, id).await?;
    let result = state.services.user_service.delete_user(&user, id).await;
    after_delete(&state, &user, &lang, &deletion, result)
}

pub async fn classes(State(state): State<AppState>, CurrentUser { user, lang }: CurrentUser) -> PageResult {
    let classes = state
        .services
        .academics_service
        .all_classrooms(&user)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("classes", &classes);
    state.render("director/classes.html", &lang, Some(&user), context)
}

async fn teacher_choices(state: &AppState, lang: &str) -> Result<Context, PageError> {
    let teachers = state
        .services
        .academics_service
        .users_with_role(Role::Teacher)
        .await
        .or_page(state, lang)?;

    let mut context = Context::new();
    context.insert("teachers", &teachers);
    Ok(context)
}

pub async fn class_form(State(state): State<AppState>, CurrentUser { user, lang }: CurrentUser) -> PageResult {
    require_admin(&user).or_page(&state, &lang)?;
    let mut context = teacher_choices(&state, &lang).await?;
    context.insert("form", &ClassRoomForm::default());
    state.render("director/class_form.html", &lang, Some(&user), context)
}

pub async fn create_class(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Form(form): Form<ClassRoomForm>,
) -> PageResult {
    match state.services.academics_service.create_classroom(&user, &form).await {
        Ok(_) => Ok(Redirect::to("/director/classes").into_response()),
        Err(SchoolError::Validation(errors)) => {
            let mut context = teacher_choices(&state, &lang).await?;
            context.insert("form", &form);
            state.render_form("director/class_form.html", &lang, Some(&user), context, &errors)
        }
        Err(e) => Err(PageError::from_error(&state, e, &lang)),
    }
}

pub async fn class_students(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<RosterQuery>,
) -> PageResult {
    let sort = RosterSort::parse(query.sort.as_deref());
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let (classroom, students) = state
        .services
        .academics_service
        .class_students(&user, id, search, sort)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("classroom", &classroom);
    context.insert("label", &classroom.label());
    context.insert("students", &students);
    context.insert("search", search.unwrap_or(""));
    context.insert("sort", sort.as_str());
    state.render("director/class_students.html", &lang, Some(&user), context)
}

async fn enroll_page(state: &AppState, admin: &User, lang: &str, id: i64, form: &EnrollForm) -> Result<Context, PageError> {
    let (classroom, students) = state
        .services
        .academics_service
        .enrollable_students(admin, id)
        .await
        .or_page(state, lang)?;

    let mut context = Context::new();
    context.insert("classroom", &classroom);
    context.insert("label", &classroom.label());
    context.insert("students", &students);
    context.insert("form", form);
    Ok(context)
}

pub async fn add_student_form(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let context = enroll_page(&state, &user, &lang, id, &EnrollForm::default()).await?;
    state.render("director/add_student.html", &lang, Some(&user), context)
}

pub async fn add_student(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<EnrollForm>,
) -> PageResult {
    match state.services.academics_service.enroll_student(&user, id, &form).await {
        Ok(_) => Ok(Redirect::to(&format!("/director/classes/{}/students", id)).into_response()),
        Err(SchoolError::Validation(errors)) => {
            let context = enroll_page(&state, &user, &lang, id, &form).await?;
            state.render_form("director/add_student.html", &lang, Some(&user), context, &errors)
        }
        Err(e) => Err(PageError::from_error(&state, e, &lang)),
    }
}

async fn class_deletion(state: &AppState, admin: &User, lang: &str, id: i64) -> Result<Deletion, PageError> {
    require_admin(admin).or_page(state, lang)?;
    let classroom = state
        .services
        .academics_service
        .classroom(admin, id)
        .await
        .or_page(state, lang)?;

    Ok(Deletion {
        description: classroom.label,
        action: format!("/director/classes/{}/delete", id),
        back: "/director/classes",
    })
}

pub async fn confirm_delete_class(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let deletion = class_deletion(&state, &user, &lang, id).await?;
    render_confirm(&state, &user, &lang, &deletion, None)
}

pub async fn delete_class(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let deletion = class_deletion(&state, &user, &lang, id).await?;
    let result = state.services.academics_service.delete_classroom(&user, id).await;
    after_delete(&state, &user, &lang, &deletion, result)
}

pub async fn subjects(State(state): State<AppState>, CurrentUser { user, lang }: CurrentUser) -> PageResult {
    require_admin(&user).or_page(&state, &lang)?;
    let subjects = state
        .services
        .academics_service
        .subjects(&user)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("subjects", &subjects);
    state.render("director/subjects.html", &lang, Some(&user), context)
}

pub async fn subject_form(State(state): State<AppState>, CurrentUser { user, lang }: CurrentUser) -> PageResult {
    require_admin(&user).or_page(&state, &lang)?;
    let mut context = teacher_choices(&state, &lang).await?;
    context.insert("form", &SubjectForm::default());
    state.render("director/subject_form.html", &lang, Some(&user), context)
}

pub async fn create_subject(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Form(form): Form<SubjectForm>,
) -> PageResult {
    match state.services.academics_service.create_subject(&user, &form).await {
        Ok(_) => Ok(Redirect::to("/director/subjects").into_response()),
        Err(SchoolError::Validation(errors)) => {
            let mut context = teacher_choices(&state, &lang).await?;
            context.insert("form", &form);
            state.render_form("director/subject_form.html", &lang, Some(&user), context, &errors)
        }
        Err(e) => Err(PageError::from_error(&state, e, &lang)),
    }
}

async fn subject_deletion(state: &AppState, admin: &User, lang: &str, id: i64) -> Result<Deletion, PageError> {
    require_admin(admin).or_page(state, lang)?;
    let subject = state
        .services
        .academics_service
        .subject(admin, id)
        .await
        .or_page(state, lang)?;

    Ok(Deletion {
        description: format!("{} ({})", subject.name, subject.code),
        action: format!("/director/subjects/{}/delete", id),
        back: "/director/subjects",
    })
}

pub async fn confirm_delete_subject(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let deletion = subject_deletion(&state, &user, &lang, id).await?;
    render_confirm(&state, &user, &lang, &deletion, None)
}

pub async fn delete_subject(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let deletion = subject_deletion(&state, &user, &lang, id).await?;
    let result = state.services.academics_service.delete_subject(&user, id).await;
    after_delete(&state, &user, &lang, &deletion, result)
}

pub async fn lessons(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let page = state
        .services
        .academics_service
        .all_lessons(&user, query.page)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("page", &page);
    state.render("director/lessons.html", &lang, Some(&user), context)
}

async fn lesson_choices(state: &AppState, admin: &User, lang: &str) -> Result<Context, PageError> {
    let academics = &state.services.academics_service;
    let subjects = academics.subjects(admin).await.or_page(state, lang)?;
    let classes = academics.all_classrooms(admin).await.or_page(state, lang)?;

    let mut context = teacher_choices(state, lang).await?;
    context.insert("subjects", &subjects);
    context.insert("classes", &classes);
    Ok(context)
}

pub async fn lesson_form(State(state): State<AppState>, CurrentUser { user, lang }: CurrentUser) -> PageResult {
    require_admin(&user).or_page(&state, &lang)?;
    let mut context = lesson_choices(&state, &user, &lang).await?;
    context.insert("form", &LessonForm::default());
    state.render("director/lesson_form.html", &lang, Some(&user), context)
}

pub async fn create_lesson(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Form(form): Form<LessonForm>,
) -> PageResult {
    match state.services.academics_service.create_lesson(&user, &form).await {
        Ok(_) => Ok(Redirect::to("/director/lessons").into_response()),
        Err(SchoolError::Validation(errors)) => {
            let mut context = lesson_choices(&state, &user, &lang).await?;
            context.insert("form", &form);
            state.render_form("director/lesson_form.html", &lang, Some(&user), context, &errors)
        }
        Err(e) => Err(PageError::from_error(&state, e, &lang)),
    }
}

async fn lesson_deletion(state: &AppState, admin: &User, lang: &str, id: i64) -> Result<Deletion, PageError> {
    require_admin(admin).or_page(state, lang)?;
    let lesson = state
        .services
        .academics_service
        .lesson(admin, id)
        .await
        .or_page(state, lang)?;

    Ok(Deletion {
        description: format!(
            "{}, {}, {}",
            lesson.subject.name,
            lesson.classroom.label,
            lesson.date.format("%d.%m.%Y")
        ),
        action: format!("/director/lessons/{}/delete", id),
        back: "/director/lessons",
    })
}

pub async fn confirm_delete_lesson(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let deletion = lesson_deletion(&state, &user, &lang, id).await?;
    render_confirm(&state, &user, &lang, &deletion, None)
}

pub async fn delete_lesson(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let deletion = lesson_deletion(&state, &user, &lang, id).await?;
    let result = state.services.academics_service.delete_lesson(&user, id).await;
    after_delete(&state, &user, &lang, &deletion, result)
}
