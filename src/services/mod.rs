//! Services module
//!
//! This module contains business logic services

pub mod academics;
pub mod access;
pub mod auth;
pub mod journal;
pub mod report;
pub mod user;

// Re-export commonly used services
pub use academics::AcademicsService;
pub use access::Scope;
pub use auth::AuthService;
pub use journal::JournalService;
pub use report::ReportService;
pub use user::UserService;

use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::reports::PdfRenderer;
use crate::state::SessionStorage;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub db: DatabaseService,
    pub sessions: SessionStorage,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub academics_service: AcademicsService,
    pub journal_service: JournalService,
    pub report_service: ReportService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, db: DatabaseService) -> Result<Self> {
        let sessions = SessionStorage::new(&settings.redis, &settings.session)?;
        let renderer = PdfRenderer::new(&settings.reports);

        Ok(Self {
            auth_service: AuthService::new(db.clone(), sessions.clone(), settings.auth.clone()),
            user_service: UserService::new(db.clone()),
            academics_service: AcademicsService::new(db.clone()),
            journal_service: JournalService::new(db.clone()),
            report_service: ReportService::new(db.clone(), renderer),
            sessions,
            db,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = crate::database::health_check(self.db.pool()).await.is_ok();
        let redis_healthy = self.sessions.test_connection().await.is_ok();

        ServiceHealthStatus {
            database_healthy,
            redis_healthy,
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub redis_healthy: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.database_healthy && self.redis_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if !self.redis_healthy {
            issues.push("Redis connection failed".to_string());
        }

        issues
    }
}
