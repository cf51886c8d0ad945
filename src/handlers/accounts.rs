//! Login, logout, registration and the own profile

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect};
use axum::Form;
use serde::Deserialize;
use tera::Context;

use crate::handlers::render::{PageContext, PageError, PageResult};
use crate::handlers::AppState;
use crate::middleware::auth::{cookie_value, safe_next, session_cookie};
use crate::middleware::{CurrentUser, Visitor};
use crate::services::auth::{LoginForm, RegistrationForm};
use crate::services::user::ProfileForm;
use crate::utils::errors::{SchoolError, ValidationErrors};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub registered: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileQuery {
    pub edit: Option<String>,
}

fn login_context(query: &LoginQuery, email: &str) -> Context {
    let mut context = Context::new();
    context.insert("next", &query.next.clone().unwrap_or_default());
    context.insert("registered", &query.registered.is_some());
    context.insert("email", email);
    context
}

pub async fn login_page(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<LoginQuery>,
) -> PageResult {
    if visitor.user.is_some() {
        return Ok(Redirect::to(&safe_next(query.next.as_deref())).into_response());
    }
    state.render("accounts/login.html", &visitor.lang, None, login_context(&query, ""))
}

pub async fn login(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> PageResult {
    let email = form.email.clone();

    match state.services.auth_service.login(form).await {
        Ok((_, session)) => {
            let cookie = session_cookie(&state.settings.session, Some(&session.token));
            Ok((
                [(SET_COOKIE, cookie)],
                Redirect::to(&safe_next(query.next.as_deref())),
            )
                .into_response())
        }
        Err(SchoolError::Authentication(failure)) => state.render_form(
            "accounts/login.html",
            &visitor.lang,
            None,
            login_context(&query, &email),
            &ValidationErrors::non_field(failure.code()),
        ),
        Err(e) => Err(PageError::from_error(&state, e, &visitor.lang)),
    }
}

pub async fn logout(State(state): State<AppState>, visitor: Visitor, headers: HeaderMap) -> PageResult {
    if let Some(token) = cookie_value(&headers, &state.settings.session.cookie_name) {
        state
            .services
            .auth_service
            .logout(&token)
            .await
            .or_page(&state, &visitor.lang)?;
    }

    let cookie = session_cookie(&state.settings.session, None);
    Ok(([(SET_COOKIE, cookie)], Redirect::to(crate::middleware::auth::LOGIN_PATH)).into_response())
}

fn registration_context(form: &RegistrationForm) -> Context {
    let mut context = Context::new();
    context.insert("email", &form.email);
    context.insert("first_name", &form.first_name);
    context.insert("last_name", &form.last_name);
    context
}

pub async fn register_page(State(state): State<AppState>, visitor: Visitor) -> PageResult {
    if visitor.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    state.render(
        "accounts/register.html",
        &visitor.lang,
        None,
        registration_context(&RegistrationForm::default()),
    )
}

pub async fn register(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<RegistrationForm>,
) -> PageResult {
    let context = registration_context(&form);

    match state.services.auth_service.register(form).await {
        Ok(_) => Ok(Redirect::to("/accounts/login?registered=1").into_response()),
        Err(SchoolError::Validation(errors)) => {
            state.render_form("accounts/register.html", &visitor.lang, None, context, &errors)
        }
        Err(e) => Err(PageError::from_error(&state, e, &visitor.lang)),
    }
}

/// Own profile; `?edit=true` shows the edit form
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Query(query): Query<ProfileQuery>,
) -> PageResult {
    let profile = state
        .services
        .user_service
        .profile(&user)
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    if query.edit.as_deref() == Some("true") {
        context.insert("form", &ProfileForm::from_profile(&profile));
        state.render("accounts/profile_edit.html", &lang, Some(&user), context)
    } else {
        context.insert("profile", &profile);
        state.render("accounts/profile.html", &lang, Some(&user), context)
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser { user, lang }: CurrentUser,
    Form(form): Form<ProfileForm>,
) -> PageResult {
    match state.services.user_service.update_profile(&user, &form).await {
        Ok(_) => Ok(Redirect::to("/accounts/profile").into_response()),
        Err(SchoolError::Validation(errors)) => {
            let mut context = Context::new();
            context.insert("form", &form);
            state.render_form("accounts/profile_edit.html", &lang, Some(&user), context, &errors)
        }
        Err(e) => Err(PageError::from_error(&state, e, &lang)),
    }
}
