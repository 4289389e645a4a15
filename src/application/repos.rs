//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use folio_api_types::BlogSummary;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::PageWindow;
use crate::domain::entities::BlogRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Fields an authoring path supplies when creating or replacing a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBlog {
    pub slug: String,
    pub title: String,
    pub category: String,
    pub excerpt: String,
    pub read_time: String,
    pub content: Value,
    pub published_at: OffsetDateTime,
}

#[async_trait]
pub trait BlogsRepo: Send + Sync {
    /// Summaries in listing order, skipping `window.offset()` records and
    /// returning at most `window.limit()`. An offset past the end yields an
    /// empty page.
    async fn fetch_page(&self, window: PageWindow) -> Result<Vec<BlogSummary>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogRecord>, RepoError>;

    async fn count(&self) -> Result<u64, RepoError>;

    async fn ping(&self) -> Result<(), RepoError>;
}

#[async_trait]
pub trait BlogsWriteRepo: Send + Sync {
    /// Insert a record, or replace the fields of the record with the same
    /// slug. An existing record keeps its id.
    async fn upsert(&self, blog: NewBlog) -> Result<BlogRecord, RepoError>;
}
