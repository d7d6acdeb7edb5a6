//! Field validation helpers shared by the lead and blog inputs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Collects field errors in declaration order
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
        self
    }

    /// Value must contain something besides whitespace
    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.error(field, format!("{} is required", field));
        }
        self
    }

    /// Value must be at least `min` characters long
    pub fn min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) -> &mut Self {
        if value.chars().count() < min {
            self.error(field, message);
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.error(field, format!("{} is required", field));
        } else if !is_valid_email(value.trim()) {
            self.error(field, "Invalid email address");
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

/// Loose address check: something@something.tld, no whitespace
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Treat empty optional strings as absent
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane example@test.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_validator_collects_in_order() {
        let errors = Validator::new()
            .required("name", "  ")
            .email("email", "nope")
            .min_chars("message", "hi", 5, "too short")
            .finish()
            .unwrap_err();

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "message"]);
        assert_eq!(errors[1].message, "Invalid email address");
    }

    #[test]
    fn test_email_ignores_surrounding_whitespace() {
        assert!(Validator::new()
            .email("email", "  jane@example.com \t")
            .finish()
            .is_ok());
    }

    #[test]
    fn test_min_chars_counts_characters_not_bytes() {
        assert!(Validator::new()
            .min_chars("title", "ééééé", 5, "short")
            .finish()
            .is_ok());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&Some("x".to_string())), Some("x"));
    }

    proptest! {
        #[test]
        fn emails_with_whitespace_rejected(local in "[a-z]{1,8}", domain in "[a-z]{1,8}") {
            let spaced = format!("{} x@{}.com", local, domain);
            prop_assert!(!is_valid_email(&spaced));
            let plain = format!("{}@{}.com", local, domain);
            prop_assert!(is_valid_email(&plain));
        }
    }
}
