//! Liveness and readiness probes

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::handlers::AppState;
use crate::services::ServiceHealthStatus;

#[derive(Debug, Clone, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(flatten)]
    pub components: ServiceHealthStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl IntoResponse for ReadinessResponse {
    fn into_response(self) -> Response {
        let status = if self.ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(self)).into_response()
    }
}

/// The process is up; touches no backing service
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// PostgreSQL and Redis both answer
pub async fn readiness(State(state): State<AppState>) -> ReadinessResponse {
    let components = state.services.health_check().await;
    ReadinessResponse {
        ready: components.is_healthy(),
        issues: components.get_issues(),
        components,
    }
}
