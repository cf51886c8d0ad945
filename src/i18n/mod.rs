//! Internationalization module
//!
//! This module loads the message catalogs used for page texts and
//! validation messages, with fallback to the default language.

pub mod loader;

// Re-export commonly used i18n components
pub use loader::{I18n, TranslationParams, TranslationStats, LanguageStats};
