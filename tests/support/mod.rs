#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use folio_api_types::BlogSummary;
use serde_json::json;
use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::sync::Mutex;

use folio::application::pagination::PageWindow;
use folio::application::repos::{BlogsRepo, BlogsWriteRepo, NewBlog, RepoError};
use folio::domain::entities::{BlogRecord, compare_summaries};

/// In-memory store that pages with the same total order as the database.
#[derive(Default)]
pub struct MemoryBlogs {
    records: Mutex<Vec<BlogRecord>>,
    fetches: AtomicUsize,
}

impl MemoryBlogs {
    pub fn new(records: Vec<BlogRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            fetches: AtomicUsize::new(0),
        }
    }

    /// `count` records, one per day going back from a fixed instant. Id 1 is
    /// the oldest.
    pub fn with_daily_posts(count: i64) -> Self {
        Self::new((1..=count).map(daily_record).collect())
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub async fn records(&self) -> Vec<BlogRecord> {
        self.records.lock().await.clone()
    }

    pub async fn remove(&self, slug: &str) {
        self.records.lock().await.retain(|record| record.slug != slug);
    }
}

#[async_trait]
impl BlogsRepo for MemoryBlogs {
    async fn fetch_page(&self, window: PageWindow) -> Result<Vec<BlogSummary>, RepoError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut summaries: Vec<BlogSummary> = self
            .records
            .lock()
            .await
            .iter()
            .map(BlogRecord::summary)
            .collect();
        summaries.sort_by(compare_summaries);

        let offset = usize::try_from(window.offset()).unwrap_or(usize::MAX);
        Ok(summaries
            .into_iter()
            .skip(offset)
            .take(window.limit() as usize)
            .collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogRecord>, RepoError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|record| record.slug == slug)
            .cloned())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.records.lock().await.len() as u64)
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[async_trait]
impl BlogsWriteRepo for MemoryBlogs {
    async fn upsert(&self, blog: NewBlog) -> Result<BlogRecord, RepoError> {
        let mut records = self.records.lock().await;
        let now = OffsetDateTime::now_utc();

        if let Some(existing) = records.iter_mut().find(|record| record.slug == blog.slug) {
            existing.title = blog.title;
            existing.category = blog.category;
            existing.excerpt = blog.excerpt;
            existing.read_time = blog.read_time;
            existing.content = blog.content;
            existing.published_at = blog.published_at;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let id = records.iter().map(|record| record.id).max().unwrap_or(0) + 1;
        let record = BlogRecord {
            id,
            slug: blog.slug,
            title: blog.title,
            category: blog.category,
            excerpt: blog.excerpt,
            read_time: blog.read_time,
            content: blog.content,
            published_at: blog.published_at,
            created_at: now,
            updated_at: now,
        };
        records.push(record.clone());
        Ok(record)
    }
}

/// Store whose every call fails with the configured error.
pub enum FailingBlogs {
    Timeout,
    Down,
}

impl FailingBlogs {
    fn error(&self) -> RepoError {
        match self {
            Self::Timeout => RepoError::Timeout,
            Self::Down => RepoError::from_persistence("connection refused"),
        }
    }
}

#[async_trait]
impl BlogsRepo for FailingBlogs {
    async fn fetch_page(&self, _window: PageWindow) -> Result<Vec<BlogSummary>, RepoError> {
        Err(self.error())
    }

    async fn find_by_slug(&self, _slug: &str) -> Result<Option<BlogRecord>, RepoError> {
        Err(self.error())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Err(self.error())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Err(self.error())
    }
}

#[async_trait]
impl BlogsWriteRepo for FailingBlogs {
    async fn upsert(&self, _blog: NewBlog) -> Result<BlogRecord, RepoError> {
        Err(self.error())
    }
}

pub fn record(id: i64, slug: &str, published_at: OffsetDateTime) -> BlogRecord {
    BlogRecord {
        id,
        slug: slug.to_string(),
        title: format!("Post {id}"),
        category: "Engineering".to_string(),
        excerpt: format!("Excerpt for post {id}."),
        read_time: "5 min read".to_string(),
        content: json!({ "format": "markdown", "body": format!("# Post {id}") }),
        published_at,
        created_at: published_at,
        updated_at: published_at,
    }
}

pub fn daily_record(id: i64) -> BlogRecord {
    let published_at = datetime!(2026-02-24 00:00 UTC) - Duration::days(100 - id);
    record(id, &format!("post-{id}"), published_at)
}

pub fn ids(summaries: &[BlogSummary]) -> Vec<i64> {
    summaries.iter().map(|summary| summary.id).collect()
}
