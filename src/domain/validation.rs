//! Field validators for account and loan input.
//!
//! Each validator returns the cleaned value or the message to show against
//! the field. Messages are collected into [`FieldErrors`], which serializes to
//! `{"field": ["message", ...]}`.

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::models::loan::LoanStatus;

pub const REQUIRED: &str = "This field is required.";
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const MAX_EMAIL_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_PURPOSE_LENGTH: usize = 100;
pub const MAX_AMOUNT_DIGITS: u32 = 15;
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email regex is valid")
});

const COMMON_PASSWORDS: &[&str] = &[
    "123456", "12345678", "123456789", "1234567890", "password", "password1", "password123",
    "qwerty", "qwerty123", "qwertyuiop", "abc123", "111111", "000000", "iloveyou", "admin",
    "admin123", "welcome", "welcome1", "letmein", "monkey", "dragon", "football", "baseball",
    "sunshine", "princess", "master", "shadow", "superman", "trustno1", "passw0rd",
    "1q2w3e4r", "zaq12wsx", "asdfghjkl", "changeme", "secret", "whatever", "starwars",
    "computer", "michael", "jennifer",
];

/// Field-level validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records the error of a validator result and returns its value, if any.
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Normalizes an email address to lower case and checks its shape.
pub fn validate_email(raw: Option<&str>) -> Result<String, String> {
    let email = raw.map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(REQUIRED.to_string());
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {MAX_EMAIL_LENGTH} characters."
        ));
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Enter a valid email address.".to_string());
    }
    Ok(email.to_lowercase())
}

pub fn validate_name(raw: Option<&str>) -> Result<String, String> {
    let name = raw.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(REQUIRED.to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {MAX_NAME_LENGTH} characters."
        ));
    }
    Ok(name.to_string())
}

/// Runs every password rule and returns all failures.
///
/// `attributes` pairs a human label ("email", "first name") with the value the
/// password must not resemble.
#[must_use]
pub fn validate_password(
    password: &str,
    min_length: usize,
    attributes: &[(&str, &str)],
) -> Vec<String> {
    let mut problems = Vec::new();

    for (label, value) in attributes {
        if is_too_similar(password, value) {
            problems.push(format!("The password is too similar to the {label}."));
            break;
        }
    }

    if password.chars().count() < min_length {
        problems.push(format!(
            "This password is too short. It must contain at least {min_length} characters."
        ));
    }

    if COMMON_PASSWORDS.contains(&password.to_lowercase().trim()) {
        problems.push("This password is too common.".to_string());
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    problems
}

const MAX_SIMILARITY: f64 = 0.7;

fn is_too_similar(password: &str, attribute: &str) -> bool {
    let password = password.to_lowercase();
    let attribute = attribute.to_lowercase();
    if attribute.is_empty() {
        return false;
    }

    std::iter::once(attribute.as_str())
        .chain(attribute.split(|c: char| !c.is_alphanumeric()))
        .filter(|part| part.chars().count() >= 3)
        .any(|part| similarity(&password, part) >= MAX_SIMILARITY)
}

/// Ratio of twice the longest common substring to the combined length.
#[allow(clippy::cast_precision_loss)]
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut longest = 0usize;
    let mut previous = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut current = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                current[j + 1] = previous[j] + 1;
                longest = longest.max(current[j + 1]);
            }
        }
        previous = current;
    }

    (2 * longest) as f64 / (a.len() + b.len()) as f64
}

/// Parses a requested amount given either as a JSON string or number.
pub fn validate_amount(raw: Option<&serde_json::Value>) -> Result<Decimal, String> {
    let invalid = || "A valid number is required.".to_string();

    let parsed = match raw {
        None | Some(serde_json::Value::Null) => return Err(REQUIRED.to_string()),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
            return Err("The amount requested cannot be empty.".to_string());
        }
        Some(serde_json::Value::String(s)) => parse_decimal(s.trim()),
        Some(serde_json::Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(_) => None,
    };
    let amount = parsed.ok_or_else(invalid)?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err("The amount requested cannot be a negative value.".to_string());
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > AMOUNT_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {AMOUNT_DECIMAL_PLACES} decimal places."
        ));
    }

    let digits = u32::try_from(normalized.mantissa().unsigned_abs().to_string().len())
        .unwrap_or(u32::MAX)
        .max(scale);
    if digits > MAX_AMOUNT_DIGITS {
        return Err(format!(
            "Ensure that there are no more than {MAX_AMOUNT_DIGITS} digits in total."
        ));
    }

    let mut amount = normalized.abs();
    amount.rescale(AMOUNT_DECIMAL_PLACES);
    Ok(amount)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Reads a JSON value as text. Numbers are accepted and stringified;
/// `null` reads as absent.
pub fn text_value(raw: Option<&serde_json::Value>) -> Result<Option<String>, String> {
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err("Not a valid string.".to_string()),
    }
}

pub fn validate_purpose(raw: Option<&str>) -> Result<String, String> {
    let Some(raw) = raw else {
        return Err(REQUIRED.to_string());
    };

    let purpose = raw.trim();
    if purpose.is_empty() {
        return Err("The purpose cannot be empty.".to_string());
    }
    if purpose.chars().all(char::is_numeric) {
        return Err("Purpose cannot be purely numeric.".to_string());
    }
    if purpose.chars().count() > MAX_PURPOSE_LENGTH {
        return Err(format!(
            "Purpose cannot exceed {MAX_PURPOSE_LENGTH} characters."
        ));
    }
    Ok(purpose.to_string())
}

pub fn validate_status(raw: &str) -> Result<LoanStatus, String> {
    raw.parse()
        .map_err(|_| "Invalid status choice".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_value() {
        assert_eq!(text_value(None), Ok(None));
        assert_eq!(text_value(Some(&json!(null))), Ok(None));
        assert_eq!(text_value(Some(&json!("rent"))), Ok(Some("rent".to_string())));
        assert_eq!(text_value(Some(&json!(42))), Ok(Some("42".to_string())));
        assert!(text_value(Some(&json!(["rent"]))).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(Some("  QuickCheck@Gmail.com ")),
            Ok("quickcheck@gmail.com".to_string())
        );
        assert_eq!(validate_email(None), Err(REQUIRED.to_string()));
        assert!(validate_email(Some("not-an-email")).is_err());
        assert!(validate_email(Some("a@b")).is_err());
    }

    #[test]
    fn test_validate_password_rules() {
        assert!(validate_password("Testseries1@", 8, &[]).is_empty());

        let problems = validate_password("1234567", 8, &[]);
        assert!(problems.iter().any(|p| p.contains("too short")));
        assert!(problems.iter().any(|p| p.contains("entirely numeric")));

        let problems = validate_password("password", 8, &[]);
        assert_eq!(problems, vec!["This password is too common.".to_string()]);

        let problems = validate_password("emmanuel1", 8, &[("first name", "Emmanuel")]);
        assert_eq!(
            problems,
            vec!["The password is too similar to the first name.".to_string()]
        );
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(
            validate_amount(Some(&json!("50000.00"))),
            Ok(Decimal::new(5_000_000, 2))
        );
        assert_eq!(
            validate_amount(Some(&json!(10_000_000))),
            Ok(Decimal::new(1_000_000_000, 2))
        );
        assert_eq!(validate_amount(None), Err(REQUIRED.to_string()));
        assert_eq!(
            validate_amount(Some(&json!("-1"))),
            Err("The amount requested cannot be a negative value.".to_string())
        );
        assert!(validate_amount(Some(&json!("abc"))).is_err());
        assert!(validate_amount(Some(&json!("1.005"))).is_err());
        assert!(validate_amount(Some(&json!("1234567890123456"))).is_err());
        assert!(validate_amount(Some(&json!(true))).is_err());
        assert_eq!(validate_amount(Some(&json!("0"))), Ok(Decimal::new(0, 2)));
    }

    #[test]
    fn test_validate_purpose() {
        assert_eq!(
            validate_purpose(Some("  Business expansion ")),
            Ok("Business expansion".to_string())
        );
        assert_eq!(
            validate_purpose(Some("   ")),
            Err("The purpose cannot be empty.".to_string())
        );
        assert_eq!(
            validate_purpose(Some("12345")),
            Err("Purpose cannot be purely numeric.".to_string())
        );
        assert!(validate_purpose(Some(&"a".repeat(101))).is_err());
        assert!(validate_purpose(Some(&"a".repeat(100))).is_ok());
        assert_eq!(validate_purpose(None), Err(REQUIRED.to_string()));
    }

    #[test]
    fn test_validate_status() {
        assert_eq!(validate_status("approved"), Ok(LoanStatus::Approved));
        assert_eq!(
            validate_status("archived"),
            Err("Invalid status choice".to_string())
        );
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let mut errors = FieldErrors::new();
        errors.add("email", "A user with this email already exists.");
        errors.add("email", "second");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            value,
            json!({"email": ["A user with this email already exists.", "second"]})
        );
        assert!(errors.into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
