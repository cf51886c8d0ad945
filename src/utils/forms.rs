//! Parsing of submitted form values into typed fields
//!
//! Each parser records a field error and returns `None` when the raw value is
//! unusable, so a whole form can be checked before anything is rejected.

use chrono::NaiveDate;

use super::errors::ValidationErrors;

/// Largest magnitude a score may have (five digits, two of them decimals)
pub const SCORE_LIMIT: f64 = 1000.0;

/// A required record id, chosen from a list
pub fn parse_id(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, "required");
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            errors.add(field, "invalid_choice");
            None
        }
    }
}

/// An id that may be left empty
pub fn parse_optional_id(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<i64> {
    if raw.trim().is_empty() {
        None
    } else {
        parse_id(errors, field, raw)
    }
}

/// A required ISO date (`yyyy-mm-dd`)
pub fn parse_date(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, "required");
        return None;
    }
    parse_optional_date(errors, field, raw)
}

/// An optional ISO date; empty input is `None` without an error
pub fn parse_optional_date(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "invalid_date");
            None
        }
    }
}

/// A required score such as `87.5`; a decimal comma is accepted
pub fn parse_score(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<f64> {
    let raw = raw.trim().replace(',', ".");
    if raw.is_empty() {
        errors.add(field, "required");
        return None;
    }

    let decimals = raw.split_once('.').map(|(_, fraction)| fraction.len()).unwrap_or(0);
    let value = match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            errors.add(field, "invalid_number");
            return None;
        }
    };

    if decimals > 2 {
        errors.add(field, "too_many_decimals");
        return None;
    }
    if !check_score(errors, field, value) {
        return None;
    }
    Some(value)
}

/// Range and precision check of a score that already is a number
pub fn check_score(errors: &mut ValidationErrors, field: &str, value: f64) -> bool {
    if !value.is_finite() {
        errors.add(field, "invalid_number");
        return false;
    }
    if value.abs() >= SCORE_LIMIT {
        errors.add(field, "value_out_of_range");
        return false;
    }
    let cents = value * 100.0;
    if (cents - cents.round()).abs() > 1e-6 {
        errors.add(field, "too_many_decimals");
        return false;
    }
    true
}

/// Reject text longer than `max` characters
pub fn check_length(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) -> bool {
    if value.chars().count() > max {
        errors.add_with_param(field, "too_long", "max", max);
        false
    } else {
        true
    }
}

/// A required, trimmed, length-limited text field
pub fn required_text(errors: &mut ValidationErrors, field: &str, raw: &str, max: usize) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, "required");
        return None;
    }
    check_length(errors, field, value, max).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_id() {
        let mut errors = ValidationErrors::new();
        assert_eq!(parse_id(&mut errors, "lesson", " 12 "), Some(12));
        assert_eq!(parse_id(&mut errors, "lesson", ""), None);
        assert_eq!(parse_id(&mut errors, "student", "abc"), None);
        assert_eq!(parse_optional_id(&mut errors, "curator", ""), None);

        assert!(errors.has(Some("lesson"), "required"));
        assert!(errors.has(Some("student"), "invalid_choice"));
        assert!(!errors.has_field("curator"));
    }

    #[test]
    fn test_parse_dates() {
        let mut errors = ValidationErrors::new();
        assert_eq!(
            parse_date(&mut errors, "date", "2024-09-02"),
            NaiveDate::from_ymd_opt(2024, 9, 2)
        );
        assert_eq!(parse_date(&mut errors, "date", "02.09.2024"), None);
        assert_eq!(parse_optional_date(&mut errors, "start_date", "  "), None);

        assert!(errors.has(Some("date"), "invalid_date"));
        assert!(!errors.has_field("start_date"));
    }

    #[test]
    fn test_parse_score() {
        let mut errors = ValidationErrors::new();
        assert_eq!(parse_score(&mut errors, "value", "87.5"), Some(87.5));
        assert_eq!(parse_score(&mut errors, "value", "4,25"), Some(4.25));
        assert!(errors.is_empty());

        assert_eq!(parse_score(&mut errors, "value", "1.234"), None);
        assert!(errors.has(Some("value"), "too_many_decimals"));

        let mut errors = ValidationErrors::new();
        assert_eq!(parse_score(&mut errors, "max_value", "1000"), None);
        assert!(errors.has(Some("max_value"), "value_out_of_range"));

        let mut errors = ValidationErrors::new();
        assert_eq!(parse_score(&mut errors, "value", "ten"), None);
        assert!(errors.has(Some("value"), "invalid_number"));
    }

    #[test]
    fn test_required_text_length() {
        let mut errors = ValidationErrors::new();
        assert_eq!(required_text(&mut errors, "name", " Физика ", 100), Some("Физика".to_string()));
        assert_eq!(required_text(&mut errors, "topic", &"я".repeat(256), 255), None);
        assert!(errors.has(Some("topic"), "too_long"));
    }

    proptest! {
        #[test]
        fn prop_two_decimal_scores_accepted(cents in -99_999i64..99_999) {
            let raw = format!("{}.{:02}", cents / 100, (cents % 100).abs());
            let raw = if cents < 0 && cents > -100 { format!("-{}", raw) } else { raw };
            let mut errors = ValidationErrors::new();
            prop_assert!(parse_score(&mut errors, "value", &raw).is_some(), "{} rejected: {}", raw, errors);
        }
    }
}
