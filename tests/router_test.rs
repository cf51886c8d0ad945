//! Routing, authentication redirects and probes that need no backing service
//!
//! The pool and the Redis client are lazy, so these requests never open a
//! connection: none of them carries a session cookie or credentials.

use axum::body::Body;
use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, LOCATION, SET_COOKIE, WWW_AUTHENTICATE};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use school_journal::database::{create_lazy_pool, DatabaseService};
use school_journal::{router, AppState, I18n, ServiceFactory, Settings};

async fn app() -> Router {
    let settings = Settings::default();
    let pool = create_lazy_pool(&settings.database).unwrap();
    let services = ServiceFactory::new(&settings, DatabaseService::new(pool)).unwrap();
    let i18n = I18n::load(&settings.i18n).await.unwrap();
    router(AppState::new(settings, services, i18n).unwrap())
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_liveness() {
    let response = app()
        .await
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], school_journal::VERSION);
}

#[tokio::test]
async fn test_pages_redirect_anonymous_visitors_to_login() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[LOCATION], "/accounts/login?next=%2F");

    let response = app
        .oneshot(Request::get("/journal/me/grades?page=2").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers()[LOCATION],
        "/accounts/login?next=%2Fjournal%2Fme%2Fgrades%3Fpage%3D2"
    );
}

#[tokio::test]
async fn test_api_requires_credentials() {
    let response = app()
        .await
        .oneshot(
            Request::get("/api/lessons")
                .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[WWW_AUTHENTICATE], "Basic realm=\"school-journal\"");
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["detail"], "Authentication required.");
}

#[tokio::test]
async fn test_login_page_renders() {
    let response = app()
        .await
        .oneshot(
            Request::get("/accounts/login?next=/academics/lessons")
                .header(ACCEPT_LANGUAGE, "en")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    let html = body_text(response).await;
    assert!(html.contains("Log in"));
    assert!(html.contains("next=%2Facademics%2Flessons"));
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let response = app()
        .await
        .oneshot(Request::post("/accounts/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[LOCATION], "/accounts/login");
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("sessionid=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_unknown_route() {
    let response = app()
        .await
        .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
