//! Slug derivation and validation for blog URLs.
//!
//! Slugs are the stable public identifier of a record (`/blog/<slug>`), so
//! anything accepted here must already be in the canonical form produced by
//! the `slug` crate: lowercase ASCII words joined by single hyphens.

use slug::slugify;
use thiserror::Error;

const MAX_SLUG_LEN: usize = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("slug `{slug}` is not canonical (expected `{expected}`)")]
    NotCanonical { slug: String, expected: String },
    #[error("slug exceeds {MAX_SLUG_LEN} characters")]
    TooLong,
}

/// Derive a slug from human-readable text such as a title.
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
    if candidate.len() > MAX_SLUG_LEN {
        return Err(SlugError::TooLong);
    }

    Ok(candidate)
}

/// Accept a caller-provided slug only when it is already canonical.
pub fn validate_slug(slug: &str) -> Result<&str, SlugError> {
    if slug.is_empty() {
        return Err(SlugError::EmptyInput);
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(SlugError::TooLong);
    }

    let expected = slugify(slug);
    if expected != slug {
        return Err(SlugError::NotCanonical {
            slug: slug.to_string(),
            expected,
        });
    }

    Ok(slug)
}
