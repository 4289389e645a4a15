use thiserror::Error;

use crate::domain::slug::SlugError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid blog `{slug}`: {message}")]
    InvalidBlog { slug: String, message: String },
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn invalid_blog(slug: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBlog {
            slug: slug.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
