//! Helper functions and utilities
//! 
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[А-Яа-яA-Za-zЁё-]{2,30}$").expect("name pattern is valid")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?\d{10,15}$").expect("phone pattern is valid")
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Generate an opaque session token
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Format a date the way reports print it (`dd.mm.yyyy`)
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format a grade value with two decimal places
pub fn format_score(value: f64) -> String {
    format!("{:.2}", value)
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalize an email for storage and comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

/// Letters (Latin or Cyrillic) and hyphens, 2 to 30 characters
pub fn is_valid_person_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Base of the login handle derived from an email address
pub fn username_base(email: &str) -> String {
    let local = email.split('@').next().unwrap_or("").trim();
    if local.is_empty() {
        "user".to_string()
    } else {
        local.to_string()
    }
}

/// The `attempt`-th candidate handle: `base`, `base2`, `base3`, ...
pub fn username_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}{}", base, attempt)
    }
}

/// ASCII slug: letters and digits, words joined with `-`.
/// Accents are stripped by NFKD decomposition; other non-ASCII is dropped.
pub fn slugify_ascii(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for ch in text.nfkd().filter(char::is_ascii) {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Subject code: first eight slug characters upper-cased plus a four character suffix
pub fn subject_code(name: &str, suffix: &str) -> String {
    let base: String = slugify_ascii(name).chars().take(8).collect();
    format!("{}-{}", base.to_uppercase(), suffix.to_uppercase())
}

/// Random four character hex suffix for subject codes
pub fn random_code_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..4].to_uppercase()
}

/// Requested page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    /// Page numbers start at 1 and stop where the offset would overflow
    pub fn new(page: Option<i64>, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        Self {
            page: page.unwrap_or(1).clamp(1, i64::MAX / per_page),
            per_page,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// One page of a listing together with navigation data
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub num_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: i64) -> Self {
        let num_pages = ((total + pagination.per_page - 1) / pagination.per_page).max(1);
        Self {
            items,
            page: pagination.page,
            per_page: pagination.per_page,
            total,
            num_pages,
            has_previous: pagination.page > 1,
            has_next: pagination.page < num_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify_ascii("Computer Science"), "computer-science");
        assert_eq!(slugify_ascii("  Art -- History  "), "art-history");
        assert_eq!(slugify_ascii("Математика"), "");
        assert_eq!(slugify_ascii("Физика 2"), "2");
    }

    #[test]
    fn test_slugify_strips_accents() {
        assert_eq!(slugify_ascii("Café"), "cafe");
        assert_eq!(slugify_ascii("Ästhetik und Übung"), "asthetik-und-ubung");
        assert_eq!(subject_code("Éducation civique", "0A1B"), "EDUCATIO-0A1B");
    }

    #[test]
    fn test_subject_code_shape() {
        assert_eq!(subject_code("Computer Science", "ab12"), "COMPUTER-AB12");
        assert_eq!(subject_code("Math", "0F3C"), "MATH-0F3C");
        assert_eq!(subject_code("Математика", "1A2B"), "-1A2B");
        assert_eq!(random_code_suffix().len(), 4);
    }

    #[test]
    fn test_username_derivation() {
        assert_eq!(username_base("ivan.petrov@school.ru"), "ivan.petrov");
        assert_eq!(username_base("@school.ru"), "user");
        assert_eq!(username_candidate("ivan", 1), "ivan");
        assert_eq!(username_candidate("ivan", 2), "ivan2");
        assert_eq!(username_candidate("ivan", 10), "ivan10");
    }

    #[test]
    fn test_validators() {
        assert!(is_valid_person_name("Анна-Мария"));
        assert!(is_valid_person_name("Ivan"));
        assert!(!is_valid_person_name("I"));
        assert!(!is_valid_person_name("Ivan1"));
        assert!(is_valid_phone("+71234567890"));
        assert!(!is_valid_phone("12345"));
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("not an email"));
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[test]
    fn test_date_and_score_formatting() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        assert_eq!(format_date(date), "12.03.2025");
        assert_eq!(format_score(90.0), "90.00");
        assert_eq!(round2(86.666_666), 86.67);
    }

    #[test]
    fn test_pagination_and_page() {
        let pagination = Pagination::new(Some(0), 10);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.offset(), 0);

        let pagination = Pagination::new(Some(3), 10);
        assert_eq!(pagination.offset(), 20);

        let page = Page::new(vec![1, 2, 3], pagination, 23);
        assert_eq!(page.num_pages, 3);
        assert!(page.has_previous);
        assert!(!page.has_next);

        let empty: Page<i32> = Page::new(vec![], Pagination::new(None, 20), 0);
        assert_eq!(empty.num_pages, 1);
        assert!(!empty.has_next);
    }

    #[test]
    fn test_huge_page_number_is_capped() {
        let pagination = Pagination::new(Some(i64::MAX), 50);
        assert_eq!(pagination.page, i64::MAX / 50);
        assert!(pagination.offset() >= 0);

        let page: Page<i32> = Page::new(vec![], pagination, 3);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    proptest! {
        #[test]
        fn prop_username_candidates_are_distinct(base in "[a-z]{1,12}", a in 1u32..50, b in 1u32..50) {
            prop_assume!(a != b);
            prop_assert_ne!(username_candidate(&base, a), username_candidate(&base, b));
        }

        #[test]
        fn prop_subject_code_fits_column(name in "\\PC{0,100}", suffix in "[0-9A-F]{4}") {
            let code = subject_code(&name, &suffix);
            prop_assert!(code.len() <= 20);
            let tail = format!("-{}", suffix);
            prop_assert!(code.ends_with(&tail));
        }

        #[test]
        fn prop_pagination_offset_never_overflows(page in any::<i64>(), per_page in 1i64..500) {
            let pagination = Pagination::new(Some(page), per_page);
            prop_assert!(pagination.page >= 1);
            prop_assert!(pagination.offset() >= 0);
        }
    }
}
