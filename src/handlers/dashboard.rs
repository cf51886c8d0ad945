//! Landing page

use axum::extract::State;
use tera::Context;

use crate::handlers::render::{PageContext, PageResult};
use crate::handlers::AppState;
use crate::middleware::CurrentUser;
use crate::services::Scope;

/// Role-specific counters and the most recent visible lessons
pub async fn index(State(state): State<AppState>, CurrentUser { user, lang }: CurrentUser) -> PageResult {
    let stats = state
        .services
        .db
        .dashboard_stats(&Scope::for_user(&user))
        .await
        .or_page(&state, &lang)?;

    let mut context = Context::new();
    context.insert("stats", &stats);
    state.render("dashboard.html", &lang, Some(&user), context)
}
