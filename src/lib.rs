//! School Journal
//!
//! A web service for keeping a school journal: classrooms, subjects, lessons,
//! grades and attendance, with role-based pages, a JSON API and PDF reports.

pub mod config;
pub mod database;
pub mod handlers;
pub mod i18n;
pub mod middleware;
pub mod models;
pub mod reports;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, SchoolError};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use handlers::{router, AppState};
pub use i18n::I18n;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
