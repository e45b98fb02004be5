//! Input validation for pixel-claim submissions.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

static TELEGRAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@?[A-Za-z0-9_]{5,32}$").expect("valid telegram pattern"));

/// Field-level validation failures. The display strings are the exact
/// messages returned to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please provide a valid email address")]
    InvalidEmail,
    #[error("Please provide a valid URL for the link field")]
    InvalidLink,
    #[error("Invalid status. Must be one of: pending, confirmed, rejected")]
    InvalidStatus,
    #[error("Please provide a valid Telegram username")]
    InvalidTelegram,
    #[error("Either email or telegram is required (at least one contact method)")]
    MissingContact,
}

/// Check an email address against the accepted shape: one `@`, no
/// whitespace, at least one dot in the domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Validate a telegram handle and normalize it to carry a leading `@`.
/// Normalization is idempotent: an already-prefixed handle passes through.
pub fn normalize_telegram(telegram: &str) -> Result<String, ValidationError> {
    if !TELEGRAM_RE.is_match(telegram) {
        return Err(ValidationError::InvalidTelegram);
    }
    if telegram.starts_with('@') {
        Ok(telegram.to_string())
    } else {
        Ok(format!("@{telegram}"))
    }
}

/// Check that a link parses as an absolute URL.
pub fn validate_link(link: &str) -> Result<(), ValidationError> {
    url::Url::parse(link)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidLink)
}
