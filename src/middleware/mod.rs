//! Middleware module
//!
//! This module contains request extractors for authentication and the
//! request logging layer

pub mod auth;
pub mod logging;

// Re-export commonly used middleware
pub use auth::{ApiUser, CurrentUser, Visitor};
pub use logging::log_requests;
