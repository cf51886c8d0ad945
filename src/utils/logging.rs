//! Logging configuration and setup
//! 
//! This module provides logging initialization and structured logging utilities
//! for the school journal.

use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use crate::config::LoggingConfig;
use crate::utils::errors::{Result, SchoolError};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer and must live as long as the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "school-journal.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let registry = tracing_subscriber::registry().with(EnvFilter::new(&config.level));
    let initialized = if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stdout))
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .try_init()
    };
    initialized.map_err(|e| SchoolError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: i64, action: &str, details: Option<&str>) {
    info!(
        user_id = user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log rejected login attempts
pub fn log_login_failure(email: &str, reason: &str) {
    warn!(email = email, reason = reason, "Login rejected");
}

/// Log grade and attendance writes
pub fn log_journal_write(teacher_id: i64, record: &str, lesson_id: i64, student_id: i64) {
    info!(
        teacher_id = teacher_id,
        record = record,
        lesson_id = lesson_id,
        student_id = student_id,
        "Journal record written"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log report generation
pub fn log_report_generated(user_id: i64, report: &str, target_id: i64, rows: usize) {
    debug!(
        user_id = user_id,
        report = report,
        target_id = target_id,
        rows = rows,
        "Report generated"
    );
}
