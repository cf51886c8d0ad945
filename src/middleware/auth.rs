//! Authentication extractors
//!
//! Pages authenticate with the session cookie and send anonymous visitors to
//! the login form. The JSON API also accepts HTTP Basic credentials and
//! answers 401 instead of redirecting.

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::header::{ACCEPT_LANGUAGE, AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::handlers::render::{ApiError, PageError};
use crate::handlers::AppState;
use crate::models::User;
use crate::utils::errors::{Result, SchoolError};

pub const LOGIN_PATH: &str = "/accounts/login";

/// Value of the named cookie, if the request carries it
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Email and password of an `Authorization: Basic` header
pub fn basic_credentials(parts: &Parts) -> Option<(String, String)> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

/// `Set-Cookie` value of a login session; `None` expires the cookie
pub fn session_cookie(settings: &SessionConfig, token: Option<&str>) -> String {
    let (value, max_age) = match token {
        Some(token) => (token, settings.ttl_seconds),
        None => ("", 0),
    };
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        settings.cookie_name, value, max_age
    );
    if settings.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Redirect target after login; only local paths are followed
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path.to_string(),
        _ => "/".to_string(),
    }
}

/// Language of the response, from `Accept-Language`
pub fn request_language(parts: &Parts, state: &AppState) -> String {
    let header = parts
        .headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    state.i18n.detect_user_language(header)
}

/// Login page URL that comes back to the current request afterwards
pub fn login_url(parts: &Parts) -> String {
    // Nested routers see the URI without their prefix
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("{}?next={}", LOGIN_PATH, urlencoding::encode(next))
}

/// User of the session cookie, if it names a live session of an active user
pub async fn session_user(parts: &Parts, state: &AppState) -> Result<Option<User>> {
    let Some(token) = cookie_value(&parts.headers, &state.settings.session.cookie_name) else {
        return Ok(None);
    };
    state.services.auth_service.user_for_session(&token).await
}

/// Authenticated user of an HTML page
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub lang: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let lang = request_language(parts, state);

        match session_user(parts, state).await {
            Ok(Some(user)) => Ok(Self { user, lang }),
            Ok(None) => {
                debug!(path = %parts.uri.path(), "Anonymous request, redirecting to login");
                Err(Redirect::to(&login_url(parts)).into_response())
            }
            Err(e) => Err(PageError::from_error(state, e, &lang).into_response()),
        }
    }
}

/// Visitor of the public account pages, signed in or not
#[derive(Debug, Clone)]
pub struct Visitor {
    pub user: Option<User>,
    pub lang: String,
}

impl FromRequestParts<AppState> for Visitor {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let lang = request_language(parts, state);
        let user = match session_user(parts, state).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Session lookup failed, treating visitor as anonymous");
                None
            }
        };
        Ok(Self { user, lang })
    }
}

/// Authenticated caller of the JSON API: session cookie first, then HTTP Basic
#[derive(Debug, Clone)]
pub struct ApiUser {
    pub user: User,
    pub lang: String,
}

impl FromRequestParts<AppState> for ApiUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let lang = request_language(parts, state);

        let from_session = session_user(parts, state)
            .await
            .map_err(|e| ApiError::from_error(state, e, &lang))?;
        if let Some(user) = from_session {
            return Ok(Self { user, lang });
        }

        let Some((email, password)) = basic_credentials(parts) else {
            return Err(ApiError::from_error(state, SchoolError::Unauthenticated, &lang));
        };
        match state.services.auth_service.authenticate(&email, &password).await {
            Ok(user) => Ok(Self { user, lang }),
            Err(SchoolError::Authentication(_)) => {
                Err(ApiError::from_error(state, SchoolError::Unauthenticated, &lang))
            }
            Err(e) => Err(ApiError::from_error(state, e, &lang)),
        }
    }
}
