//! Configuration validation
//!
//! Every section is checked and all problems are reported together, so a
//! broken deployment shows its whole list of mistakes on the first start.

use std::net::SocketAddr;

use super::{
    AuthConfig, DatabaseConfig, I18nConfig, LoggingConfig, RedisConfig, ReportsConfig, ServerConfig, SessionConfig,
    Settings,
};
use crate::utils::errors::{Result, SchoolError};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Problems found so far
#[derive(Debug, Default)]
struct Issues(Vec<String>);

impl Issues {
    fn require(&mut self, ok: bool, problem: impl FnOnce() -> String) {
        if !ok {
            self.0.push(problem());
        }
    }
}

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    let mut issues = Issues::default();

    check_server(&mut issues, &settings.server);
    check_database(&mut issues, &settings.database);
    check_redis(&mut issues, &settings.redis);
    check_session(&mut issues, &settings.session);
    check_auth(&mut issues, &settings.auth);
    check_i18n(&mut issues, &settings.i18n);
    check_reports(&mut issues, &settings.reports);
    check_logging(&mut issues, &settings.logging);

    if issues.0.is_empty() {
        Ok(())
    } else {
        Err(SchoolError::Config(issues.0.join("; ")))
    }
}

fn check_server(issues: &mut Issues, config: &ServerConfig) {
    issues.require(config.bind_address.parse::<SocketAddr>().is_ok(), || {
        format!("server.bind_address '{}' is not a socket address", config.bind_address)
    });
}

fn check_database(issues: &mut Issues, config: &DatabaseConfig) {
    issues.require(
        config.url.starts_with("postgres://") || config.url.starts_with("postgresql://"),
        || "database.url must be a postgres:// URL".to_string(),
    );
    issues.require(config.max_connections > 0, || {
        "database.max_connections must be greater than 0".to_string()
    });
    issues.require(config.min_connections <= config.max_connections, || {
        format!(
            "database.min_connections ({}) exceeds max_connections ({})",
            config.min_connections, config.max_connections
        )
    });
}

fn check_redis(issues: &mut Issues, config: &RedisConfig) {
    issues.require(
        config.url.starts_with("redis://") || config.url.starts_with("rediss://"),
        || "redis.url must be a redis:// URL".to_string(),
    );
}

fn check_session(issues: &mut Issues, config: &SessionConfig) {
    let name_ok = !config.cookie_name.is_empty()
        && config
            .cookie_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    issues.require(name_ok, || {
        format!("session.cookie_name '{}' is not a valid cookie name", config.cookie_name)
    });
    issues.require(config.ttl_seconds > 0, || "session.ttl_seconds must be greater than 0".to_string());
}

fn check_auth(issues: &mut Issues, config: &AuthConfig) {
    issues.require(config.min_password_length > 0, || {
        "auth.min_password_length must be at least 1".to_string()
    });
}

fn check_i18n(issues: &mut Issues, config: &I18nConfig) {
    issues.require(!config.supported_languages.is_empty(), || {
        "i18n.supported_languages must not be empty".to_string()
    });
    issues.require(config.supported_languages.contains(&config.default_language), || {
        format!(
            "i18n.default_language '{}' is not among the supported languages",
            config.default_language
        )
    });
}

fn check_reports(issues: &mut Issues, config: &ReportsConfig) {
    issues.require(!config.font_dir.is_empty(), || "reports.font_dir is required".to_string());
    issues.require(!config.font_family.is_empty(), || "reports.font_family is required".to_string());
}

fn check_logging(issues: &mut Issues, config: &LoggingConfig) {
    issues.require(LOG_LEVELS.contains(&config.level.as_str()), || {
        format!("logging.level '{}' is not one of {:?}", config.level, LOG_LEVELS)
    });
}
