//! Message catalogs
//!
//! One JSON catalog per language (`translations/{lang}.json`), keys nested by
//! dotted path. Lookups fall back to the default language and finally to the
//! key itself, so a missing text never breaks a page.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::I18nConfig;
use crate::utils::errors::{FieldError, Result, SchoolError};

/// `{name}` placeholders of a message
pub type TranslationParams = HashMap<String, String>;

/// CLDR plural category of a count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralCategory {
    One,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub fn for_count(lang: &str, count: i32) -> Self {
        let n = count.unsigned_abs();
        match lang {
            "ru" => {
                let (last, last_two) = (n % 10, n % 100);
                if last == 1 && last_two != 11 {
                    PluralCategory::One
                } else if (2..=4).contains(&last) && !(12..=14).contains(&last_two) {
                    PluralCategory::Few
                } else {
                    PluralCategory::Many
                }
            }
            _ if n == 1 => PluralCategory::One,
            _ => PluralCategory::Other,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            PluralCategory::One => "one",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

/// Parsed catalog of one language
#[derive(Debug, Clone, Default)]
struct Catalog(Map<String, Value>);

impl Catalog {
    fn parse(lang: &str, content: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(content)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(SchoolError::Config(format!(
                "Catalog for '{}' must be a JSON object",
                lang
            ))),
        }
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    fn key_count(&self) -> usize {
        fn count(map: &Map<String, Value>) -> usize {
            map.values()
                .map(|value| match value {
                    Value::Object(nested) => count(nested),
                    _ => 1,
                })
                .sum()
        }
        count(&self.0)
    }
}

/// Plain text of a catalog entry; plural groups without a category read as "other"
fn entry_text(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) => Some(text.as_str()),
        Value::Object(group) => group
            .get("other")
            .or_else(|| group.values().next())
            .and_then(entry_text),
        _ => None,
    }
}

fn interpolate(template: &str, params: Option<&TranslationParams>) -> String {
    let Some(params) = params else {
        return template.to_string();
    };
    params.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

/// Translations of every supported language
#[derive(Debug, Clone)]
pub struct I18n {
    catalogs: HashMap<String, Catalog>,
    default_language: String,
    supported_languages: Vec<String>,
    translations_dir: PathBuf,
}

impl I18n {
    /// Empty instance; see [`I18n::load`]
    pub fn new(config: &I18nConfig) -> Self {
        Self {
            catalogs: HashMap::new(),
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
            translations_dir: PathBuf::from(&config.translations_dir),
        }
    }

    pub async fn load(config: &I18nConfig) -> Result<Self> {
        let mut i18n = Self::new(config);
        i18n.load_translations().await?;
        Ok(i18n)
    }

    /// Read `{lang}.json` of each supported language. Only the default
    /// language's catalog is mandatory.
    pub async fn load_translations(&mut self) -> Result<()> {
        if !self.translations_dir.is_dir() {
            return Err(SchoolError::Config(format!(
                "Translations directory not found: {}",
                self.translations_dir.display()
            )));
        }

        for lang in self.supported_languages.clone() {
            let path = self.translations_dir.join(format!("{}.json", lang));
            let loaded = match fs::read_to_string(&path).await {
                Ok(content) => self.add_catalog(&lang, &content),
                Err(e) => Err(e.into()),
            };

            match loaded {
                Ok(()) => info!(language = %lang, "Translations loaded"),
                Err(e) if lang == self.default_language => {
                    return Err(SchoolError::Config(format!(
                        "Default language catalog {} is unusable: {}",
                        path.display(),
                        e
                    )));
                }
                Err(e) => warn!(language = %lang, error = %e, "Skipping translation catalog"),
            }
        }

        Ok(())
    }

    /// Register a catalog given as JSON text
    pub fn add_catalog(&mut self, lang: &str, content: &str) -> Result<()> {
        let catalog = Catalog::parse(lang, content)?;
        debug!(language = lang, keys = catalog.key_count(), "Catalog registered");
        self.catalogs.insert(lang.to_string(), catalog);
        Ok(())
    }

    /// Text of `key` in `lang`, then in the default language, then the key itself
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let found = [lang, self.default_language.as_str()]
            .into_iter()
            .filter_map(|code| self.catalogs.get(code))
            .find_map(|catalog| catalog.lookup(key).and_then(entry_text));

        match found {
            Some(text) => interpolate(text, params),
            None => {
                warn!(key = key, language = lang, "Missing translation");
                key.to_string()
            }
        }
    }

    /// Plural-aware text: `key.one`, `key.few`, ... with `{count}` filled in
    pub fn tp(&self, key: &str, lang: &str, count: i32, params: Option<&TranslationParams>) -> String {
        let lang = if self.catalogs.contains_key(lang) { lang } else { &self.default_language };
        let category = PluralCategory::for_count(lang, count);

        let mut params = params.cloned().unwrap_or_default();
        params.insert("count".to_string(), count.to_string());
        self.t(&format!("{}.{}", key, category.key()), lang, Some(&params))
    }

    /// User-facing text of a validation error
    pub fn error_message(&self, error: &FieldError, lang: &str) -> String {
        let params = (!error.params.is_empty()).then_some(&error.params);
        self.t(&format!("errors.{}", error.code), lang, params)
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.supported_languages.iter().any(|code| code == lang)
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// First supported language of an `Accept-Language` header
    pub fn detect_user_language(&self, accept_language: Option<&str>) -> String {
        accept_language
            .into_iter()
            .flat_map(|header| header.split(','))
            .filter_map(|entry| {
                // "en-US;q=0.8" -> "en"
                let tag = entry.split(';').next()?.trim();
                let primary = tag.split('-').next()?.to_ascii_lowercase();
                self.is_language_supported(&primary).then_some(primary)
            })
            .next()
            .unwrap_or_else(|| self.default_language.clone())
    }

    pub fn get_stats(&self) -> TranslationStats {
        let mut languages: Vec<LanguageStats> = self
            .catalogs
            .iter()
            .map(|(code, catalog)| LanguageStats {
                code: code.clone(),
                key_count: catalog.key_count(),
            })
            .collect();
        languages.sort_by(|a, b| a.code.cmp(&b.code));

        let total_keys = self
            .catalogs
            .get(&self.default_language)
            .map(Catalog::key_count)
            .unwrap_or(0);

        TranslationStats { languages, total_keys }
    }
}

#[derive(Debug, Clone)]
pub struct TranslationStats {
    pub languages: Vec<LanguageStats>,
    /// Keys of the default language
    pub total_keys: usize,
}

#[derive(Debug, Clone)]
pub struct LanguageStats {
    pub code: String,
    pub key_count: usize,
}
