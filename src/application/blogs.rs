//! Blog listing service: the page fetcher behind the listing endpoint.

use std::{sync::Arc, time::Instant};

use folio_api_types::{BlogDetail, BlogSummary, BlogsPage};
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::pagination::{PageWindow, PaginationError};
use crate::application::repos::{BlogsRepo, RepoError};

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("blog `{0}` not found")]
    NotFound(String),
    #[error("pagination did not advance past offset {offset}")]
    Stalled { offset: u64 },
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct BlogService {
    blogs: Arc<dyn BlogsRepo>,
}

impl BlogService {
    pub fn new(blogs: Arc<dyn BlogsRepo>) -> Self {
        Self { blogs }
    }

    /// Fetch one page and compute the cursor that follows it.
    ///
    /// Storage errors propagate unchanged; they are never turned into an
    /// empty page.
    pub async fn list_page(&self, window: PageWindow) -> Result<BlogsPage, BlogError> {
        let started = Instant::now();
        let result = self.blogs.fetch_page(window).await;
        histogram!("folio_blog_page_fetch_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        let blogs = match result {
            Ok(blogs) => blogs,
            Err(err) => {
                counter!("folio_blog_page_errors_total").increment(1);
                warn!(
                    target = "folio::blogs",
                    limit = window.limit(),
                    offset = window.offset(),
                    error = %err,
                    "page fetch failed"
                );
                return Err(err.into());
            }
        };

        counter!("folio_blog_pages_served_total").increment(1);
        let next_cursor = window.next_cursor(blogs.len());
        debug!(
            target = "folio::blogs",
            limit = window.limit(),
            offset = window.offset(),
            returned = blogs.len(),
            next_cursor = ?next_cursor,
            "served blog page"
        );

        Ok(BlogsPage::new(blogs, next_cursor))
    }

    /// The first page a freshly rendered list is seeded with.
    pub async fn first_page(&self, limit: u32) -> Result<BlogsPage, BlogError> {
        self.list_page(PageWindow::first(limit)).await
    }

    pub async fn detail(&self, slug: &str) -> Result<BlogDetail, BlogError> {
        self.blogs
            .find_by_slug(slug)
            .await?
            .map(|record| record.into_detail())
            .ok_or_else(|| BlogError::NotFound(slug.to_string()))
    }

    /// Follow `next_cursor` from the start of the listing until it runs out.
    pub async fn collect_all(&self, page_size: u32) -> Result<Vec<BlogSummary>, BlogError> {
        let mut window = PageWindow::new(page_size, 0)?;
        let mut collected = Vec::new();

        loop {
            let page = self.list_page(window).await?;
            collected.extend(page.blogs);

            match page.next_cursor {
                Some(cursor) if cursor > window.offset() => window = window.at(cursor),
                Some(_) => {
                    return Err(BlogError::Stalled {
                        offset: window.offset(),
                    });
                }
                None => return Ok(collected),
            }
        }
    }

    pub async fn count(&self) -> Result<u64, BlogError> {
        Ok(self.blogs.count().await?)
    }

    pub async fn health(&self) -> Result<(), RepoError> {
        self.blogs.ping().await
    }
}
