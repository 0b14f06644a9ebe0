//! Bot token format validation
//!
//! Tokens are checked locally before any network attempt. The check is a
//! fixed-format gate, not a remote validation: three dot-separated segments,
//! the first starting with `M`.

use regex::Regex;
use std::sync::OnceLock;

/// Expected token shape: `M` + at least 23 alphanumerics, a dot, at least 6
/// URL-safe characters, a dot, at least 27 URL-safe characters.
fn token_regex() -> &'static Regex {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    TOKEN_REGEX.get_or_init(|| {
        Regex::new(r"^M[A-Za-z0-9]{23,}\.[\w-]{6,}\.[\w-]{27,}$")
            .expect("token pattern is a valid regex")
    })
}

/// Token format validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is required")]
    Empty,

    #[error("token has invalid length")]
    InvalidLength,

    #[error("token must start with 'M'")]
    InvalidPrefix,

    #[error("invalid bot token format, expected M<23+ chars>.<6+ chars>.<27+ chars>")]
    InvalidFormat,
}

/// Validate the format of a bot token.
///
/// Returns the specific reason the token was rejected, so callers can
/// surface actionable feedback without echoing the token itself.
pub fn validate_token(token: &str) -> Result<(), TokenError> {
    let token = token.trim();

    if token.is_empty() {
        return Err(TokenError::Empty);
    }
    if token.len() < 50 || token.len() > 100 {
        return Err(TokenError::InvalidLength);
    }
    if !token.starts_with('M') {
        return Err(TokenError::InvalidPrefix);
    }
    if !token_regex().is_match(token) {
        return Err(TokenError::InvalidFormat);
    }

    Ok(())
}

/// Mask a token for display: first 10 and last 4 characters kept, the rest
/// replaced with bullets. Short inputs are fully masked.
#[must_use]
pub fn mask_token(token: &str) -> String {
    if token.len() < 14 {
        return "\u{2022}".repeat(14);
    }
    format!(
        "{}{}{}",
        &token[..10],
        "\u{2022}".repeat(token.len() - 14),
        &token[token.len() - 4..]
    )
}
