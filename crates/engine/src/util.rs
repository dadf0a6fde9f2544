//! Internal helpers for validation, conversion and token generation.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::NotFound(format!("invalid {label} id")))
}

/// Trim optional free text, mapping blank input to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_positive(amount: i64) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
    }
    Ok(())
}

/// A fresh URL-safe token carrying 244 random bits (two v4 UUIDs).
pub(crate) fn random_token() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tokens_are_url_safe_and_distinct() {
        let tokens: HashSet<String> = (0..256).map(|_| random_token()).collect();
        assert_eq!(tokens.len(), 256);
        for token in &tokens {
            assert_eq!(token.len(), 43);
            assert!(
                token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
        }
    }

    #[test]
    fn blank_text_is_dropped() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(
            normalize_optional_text(Some(" thanks ")),
            Some("thanks".to_string())
        );
        assert_eq!(normalize_optional_text(None), None);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(require_positive(1).is_ok());
        assert!(matches!(
            require_positive(0),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            require_positive(-3),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn blank_required_text_is_invalid_input() {
        assert_eq!(normalize_required_text(" shop ", "app name"), Ok("shop".to_string()));
        assert_eq!(
            normalize_required_text("\t ", "username"),
            Err(EngineError::InvalidInput("username must not be empty".to_string()))
        );
    }
}
