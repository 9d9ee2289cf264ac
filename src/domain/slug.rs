//! Slug derivation and normalization.
//!
//! Tags carry exactly one canonical slug: the lower-cased, URL-safe form of
//! their title (`slug` crate). Inbound path parameters are normalized through
//! the same rules so `/tag/Python` and `/tag/python` resolve identically.

use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive the canonical slug for a title.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Normalize an inbound slug-shaped path parameter.
///
/// Already-canonical slugs pass through unchanged; anything else is folded
/// through the same derivation used at creation time.
pub fn normalize_slug(input: &str) -> Result<String, SlugError> {
    derive_slug(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_lowercases_and_dashes() {
        assert_eq!(derive_slug("Hello World").expect("slug"), "hello-world");
        assert_eq!(derive_slug("Python").expect("slug"), "python");
    }

    #[test]
    fn derive_slug_rejects_empty_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn normalize_slug_is_idempotent_on_canonical_input() {
        let canonical = derive_slug("Systems Programming").expect("slug");
        assert_eq!(normalize_slug(&canonical).expect("slug"), canonical);
    }
}
