//! Academic registry pages, filtered by the requester's role

use axum::extract::{Path, Query, State};
use tera::Context;

use crate::handlers::render::{PageContext, PageResult};
use crate::handlers::{AppState, PageQuery};
use crate::middleware::CurrentUser;

pub async fn subjects(State(state): State<AppState>, CurrentUser { user, lang }: CurrentUser) -> PageResult {
    let subjects = state
        .services
        .academics_service
        .subjects(&user)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("subjects", &subjects);
    state.render("academics/subjects.html", &lang, Some(&user), context)
}

pub async fn classes(State(state): State<AppState>, CurrentUser { user, lang }: CurrentUser) -> PageResult {
    let classes = state
        .services
        .academics_service
        .classrooms(&user)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("classes", &classes);
    state.render("academics/classes.html", &lang, Some(&user), context)
}

pub async fn enrollments(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let page = state
        .services
        .academics_service
        .enrollments(&user, query.page)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("page", &page);
    state.render("academics/enrollments.html", &lang, Some(&user), context)
}

pub async fn lessons(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let page = state
        .services
        .academics_service
        .lessons(&user, query.page)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("page", &page);
    state.render("academics/lessons.html", &lang, Some(&user), context)
}

pub async fn lesson_detail(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Path(id): Path<i64>,
) -> PageResult {
    let lesson = state
        .services
        .academics_service
        .lesson(&user, id)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("lesson", &lesson);
    context.insert("can_write", &(lesson.teacher.id == user.id));
    state.render("academics/lesson_detail.html", &lang, Some(&user), context)
}
