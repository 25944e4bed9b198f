/// Input validators for registration and finance submissions
///
/// Every check returns a `ValidationError` naming the offending field,
/// never echoing the submitted value.

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MAX_USERNAME_LENGTH: usize = 64;
/// bcrypt reads 72 bytes including a terminating NUL and silently drops the
/// rest, so anything longer would match on its prefix alone.
pub const MAX_PASSWORD_BYTES: usize = 71;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_TEXT_LENGTH: usize = 512;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    // Non-negative decimal, at most two fractional digits
    static ref AMOUNT_REGEX: Regex = Regex::new(r"^[0-9]{1,12}(\.[0-9]{1,2})?$").unwrap();
}

/// Usernames are stored exactly as submitted, so they may not carry
/// whitespace or control characters that would make two names look alike.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username".to_string(), MAX_USERNAME_LENGTH));
    }
    if username.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_BYTES));
    }
    Ok(())
}

/// Email is optional; an empty value is stored as the empty string.
pub fn normalize_email(email: Option<&str>) -> Result<String, ValidationError> {
    let trimmed = email.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn validate_amount(amount: &str) -> Result<String, ValidationError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("amount".to_string()));
    }
    if !AMOUNT_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("amount".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Optional free text: blank becomes `None`.
pub fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > MAX_TEXT_LENGTH => {
            Err(ValidationError::TooLong(field.to_string(), MAX_TEXT_LENGTH))
        }
        Some(text) => Ok(Some(text.to_string())),
    }
}
