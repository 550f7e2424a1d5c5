//! Form field validation
//!
//! Forms derive [`validator::Validate`]; [`check`] turns the result into the
//! [`FieldErrors`] map the pages and API render.

use std::borrow::Cow;

use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::FieldErrors;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

/// Run the derived rules of a form, collecting messages per field
pub fn check<T: Validate>(form: &T) -> FieldErrors {
    match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => field_errors(&errors),
    }
}

pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Blank is allowed; anything else must be an email address
pub fn optional_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.to_owned().validate_email() {
        Ok(())
    } else {
        Err(error("email", INVALID_EMAIL))
    }
}

pub fn required_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(error("required", REQUIRED));
    }
    optional_email(email)
}

/// Required, letters, digits and @/./+/-/_ only
pub fn username_characters(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(error("required", REQUIRED));
    }
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(error("username", INVALID_USERNAME))
    }
}
