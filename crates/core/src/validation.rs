//! Client-side validation rules.
//!
//! Every check here runs before a request is built; a failure blocks
//! submission and carries a message suitable for display.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::models::{Credentials, RegisterRequest};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Nepali mobile number, optionally prefixed with the country code.
pub const PHONE_PATTERN: &str = r"^(\+977)?9[6-8][0-9]{8}$";

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("valid regex"));

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub const MIN_NAME_LENGTH: usize = 3;
pub const MAX_NAME_LENGTH: usize = 50;

/// Document image types the backend accepts.
pub const ALLOWED_DOCUMENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Largest document image the backend accepts (1 MiB).
pub const MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

pub fn validate_phone(phone: &str) -> Result<(), CoreError> {
    if !PHONE_RE.is_match(phone.trim()) {
        return Err(CoreError::Validation(
            "Invalid Nepali phone number".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<(), CoreError> {
    if password != confirmation {
        return Err(CoreError::Validation("Passwords don't match".to_string()));
    }
    Ok(())
}

/// Display names are optional, but when given must be 3-50 characters.
pub fn validate_name(name: Option<&str>) -> Result<(), CoreError> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(());
    };
    let len = name.chars().count();
    if len < MIN_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    if len > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Login only checks presence; format errors come back from the server.
pub fn validate_credentials(credentials: &Credentials) -> Result<(), CoreError> {
    if credentials.phone.trim().is_empty() {
        return Err(CoreError::Validation(
            "Phone number is required".to_string(),
        ));
    }
    if credentials.password.is_empty() {
        return Err(CoreError::Validation("Password is required".to_string()));
    }
    Ok(())
}

pub fn validate_document(content_type: &str, len: usize) -> Result<(), CoreError> {
    let mime = content_type.trim().to_ascii_lowercase();
    if !ALLOWED_DOCUMENT_TYPES.contains(&mime.as_str()) {
        return Err(CoreError::Validation(
            "Only JPG and PNG files are allowed".to_string(),
        ));
    }
    if len > MAX_DOCUMENT_BYTES {
        return Err(CoreError::Validation(
            "Payload too large (max 1 MB)".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Signup form as entered by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignupForm {
    pub name: Option<String>,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    /// Return the first rule the form violates.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name(self.name.as_deref())?;
        validate_phone(&self.phone)?;
        validate_password(&self.password)?;
        validate_password_confirmation(&self.password, &self.confirm_password)
    }

    /// Validate and turn the form into the registration body.
    pub fn into_request(self) -> Result<RegisterRequest, CoreError> {
        self.validate()?;
        Ok(RegisterRequest {
            name: self
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            password: self.password,
            phone: self.phone.trim().to_string(),
        })
    }
}
