//! # Field Validation
//!
//! Pure validators shared by every write path. Nothing here touches the
//! database; uniqueness and reference checks live in the repositories.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Maximum length of role, permission and person names.
pub const NAME_MAX_LEN: usize = 100;

/// Maximum length of an email address.
pub const EMAIL_MAX_LEN: usize = 254;

/// Human-readable phone format, used in error messages.
pub const PHONE_FORMAT: &str = "(XXX) XXX-XXXX";

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\([0-9]{3}\) [0-9]{3}-[0-9]{4}$").expect("phone pattern is valid"));

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

/// Validation failures keyed by field name.
///
/// A field may carry several messages; fields are reported in name order so
/// responses are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Record `result` against `field` if it failed.
    pub fn check(&mut self, field: &'static str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Non-empty string of at most `max_len` characters.
pub fn validate_name(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if value.chars().count() > max_len {
        return Err(format!("{field} cannot exceed {max_len} characters"));
    }
    Ok(())
}

/// Phone numbers must be present and match `(XXX) XXX-XXXX` exactly.
pub fn validate_phone_number(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("phone_number is required".to_string());
    }
    if !PHONE_PATTERN.is_match(value) {
        return Err(format!("phone_number must match {PHONE_FORMAT}"));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("email is required".to_string());
    }
    if value.chars().count() > EMAIL_MAX_LEN {
        return Err(format!("email cannot exceed {EMAIL_MAX_LEN} characters"));
    }
    if !EMAIL_PATTERN.is_match(value) {
        return Err("email must be a valid email address".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_phone_numbers() {
        for value in ["(123) 456-7890", "(000) 000-0000", "(555) 123-4567", "(098) 765-4321"] {
            assert!(validate_phone_number(value).is_ok(), "{value} should pass");
        }
    }

    #[test]
    fn rejects_malformed_phone_numbers() {
        for value in [
            "123-456-7890",
            "1234567890",
            "(123)456-7890",
            "(123) 4567890",
            " (123) 456-7890",
            "(123) 456-7890 ",
            "(12) 3456-7890",
            "(abc) def-ghij",
            "(123) 456-78901",
            "+1 (123) 456-7890",
            "(１２３) 456-7890",
        ] {
            assert_eq!(
                validate_phone_number(value),
                Err("phone_number must match (XXX) XXX-XXXX".to_string()),
                "{value} should fail"
            );
        }
    }

    #[test]
    fn empty_phone_number_is_required_error() {
        assert_eq!(
            validate_phone_number(""),
            Err("phone_number is required".to_string())
        );
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("jane@x.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("jane").is_err());
        assert!(validate_email("jane@").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("jane@localhost").is_err());
        assert!(validate_email("jane doe@x.com").is_err());
    }

    #[test]
    fn name_validation_counts_characters() {
        assert!(validate_name("name", "view", NAME_MAX_LEN).is_ok());
        assert!(validate_name("name", "   ", NAME_MAX_LEN).is_err());
        assert!(validate_name("name", &"é".repeat(100), NAME_MAX_LEN).is_ok());
        assert_eq!(
            validate_name("name", &"a".repeat(101), NAME_MAX_LEN),
            Err("name cannot exceed 100 characters".to_string())
        );
    }

    #[test]
    fn field_errors_collect_and_render() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.check("phone_number", validate_phone_number("555-123-4567"));
        errors.check("email", validate_email("jane@x.com"));
        errors.add("first_name", "first_name is required");

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["first_name", "phone_number"]);
        assert_eq!(
            errors.get("phone_number"),
            Some(&["phone_number must match (XXX) XXX-XXXX".to_string()][..])
        );
        assert_eq!(
            errors.to_string(),
            "first_name: first_name is required; phone_number: phone_number must match (XXX) XXX-XXXX"
        );

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json["phone_number"][0],
            "phone_number must match (XXX) XXX-XXXX"
        );
    }
}
