//! Application settings management
//! 
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub i18n: I18nConfig,
    pub reports: ReportsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
}

/// Login session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_seconds: u64,
    pub secure_cookie: bool,
}

/// Registration and password policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub min_password_length: usize,
}

/// Internationalization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I18nConfig {
    pub default_language: String,
    pub supported_languages: Vec<String>,
    pub translations_dir: String,
}

/// PDF report configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportsConfig {
    /// Directory holding `<font_family>-Regular.ttf`, `-Bold.ttf`, `-Italic.ttf`, `-BoldItalic.ttf`
    pub font_dir: String,
    pub font_family: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub json: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("SCHOOL_JOURNAL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("i18n.supported_languages")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::SchoolError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1:8000".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/school_journal".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "school_journal:".to_string(),
            },
            session: SessionConfig {
                cookie_name: "sessionid".to_string(),
                ttl_seconds: 60 * 60 * 24 * 14,
                secure_cookie: false,
            },
            auth: AuthConfig {
                min_password_length: 8,
            },
            i18n: I18nConfig {
                default_language: "ru".to_string(),
                supported_languages: vec!["ru".to_string(), "en".to_string()],
                translations_dir: "translations".to_string(),
            },
            reports: ReportsConfig {
                font_dir: "fonts".to_string(),
                font_family: "DejaVuSans".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
                json: false,
            },
        }
    }
}
