//! Common validation rules shared across request payloads.

use std::borrow::Cow;

use validator::ValidationError;

/// Minimum length accepted for company passwords.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Rejects values that are empty once surrounding whitespace is removed.
pub fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(with_message("required", "This field is required"));
    }
    Ok(())
}

/// Password rule used by company registration.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(with_message(
            "password_too_short",
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

fn with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}
