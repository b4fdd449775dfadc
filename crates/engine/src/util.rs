//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Trim and NFC-normalize a required display name.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(normalized)
}

/// Trim an optional free-text field; blank becomes `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// `None` keeps the stored value, `Some("")` clears it.
pub(crate) fn apply_optional_text_patch(
    existing: Option<String>,
    patch: Option<&str>,
) -> Option<String> {
    match patch {
        None => existing,
        Some(value) => normalize_optional_text(Some(value)),
    }
}

pub(crate) fn validate_user_id(user_id: &str) -> ResultEngine<()> {
    if user_id.trim().is_empty() {
        return Err(EngineError::InvalidName(
            "user id must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_composed() {
        // "e" + combining acute accent composes to a single code point.
        let name = normalize_required_name("  Cafe\u{301} ", "book").unwrap();
        assert_eq!(name, "Caf\u{e9}");
        assert!(normalize_required_name("   ", "book").is_err());
    }

    #[test]
    fn text_patch_semantics() {
        let existing = Some("rent".to_string());
        assert_eq!(apply_optional_text_patch(existing.clone(), None), existing);
        assert_eq!(apply_optional_text_patch(existing.clone(), Some("  ")), None);
        assert_eq!(
            apply_optional_text_patch(existing, Some(" salary ")),
            Some("salary".to_string())
        );
    }
}
