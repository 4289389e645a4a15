use async_trait::async_trait;
use folio_api_types::BlogSummary;
use futures::{StreamExt, stream::BoxStream};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    application::{
        pagination::PageWindow,
        repos::{BlogsRepo, BlogsWriteRepo, NewBlog, RepoError},
    },
    domain::entities::BlogRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const SUMMARY_COLUMNS: &str = "id, slug, title, category, published_at, excerpt, read_time";
const RECORD_COLUMNS: &str = "id, slug, title, category, excerpt, read_time, content, \
     published_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BlogRow {
    id: i64,
    slug: String,
    title: String,
    category: String,
    excerpt: String,
    read_time: String,
    content: Value,
    published_at: OffsetDateTime,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<BlogRow> for BlogRecord {
    fn from(row: BlogRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            category: row.category,
            excerpt: row.excerpt,
            read_time: row.read_time,
            content: row.content,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    /// Every summary in listing order, as a single query.
    pub fn stream_all_blogs(&self) -> BoxStream<'_, Result<BlogSummary, RepoError>> {
        let stream = sqlx::query_as::<_, BlogSummary>(
            "SELECT id, slug, title, category, published_at, excerpt, read_time \
             FROM blogs ORDER BY published_at DESC, id DESC",
        )
        .fetch(self.pool())
        .map(|row| row.map_err(map_sqlx_error));

        Box::pin(stream)
    }
}

#[async_trait]
impl BlogsRepo for PostgresRepositories {
    async fn fetch_page(&self, window: PageWindow) -> Result<Vec<BlogSummary>, RepoError> {
        // Postgres offsets are signed; anything beyond that is past the end.
        let Ok(offset) = i64::try_from(window.offset()) else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM blogs \
             ORDER BY published_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, BlogSummary>(&sql)
            .bind(i64::from(window.limit()))
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogRecord>, RepoError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM blogs WHERE slug = $1");
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(BlogRecord::from))
    }

    async fn count(&self) -> Result<u64, RepoError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blogs")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(total)
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl BlogsWriteRepo for PostgresRepositories {
    async fn upsert(&self, blog: NewBlog) -> Result<BlogRecord, RepoError> {
        let sql = format!(
            "INSERT INTO blogs (slug, title, category, excerpt, read_time, content, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (slug) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 category = EXCLUDED.category, \
                 excerpt = EXCLUDED.excerpt, \
                 read_time = EXCLUDED.read_time, \
                 content = EXCLUDED.content, \
                 published_at = EXCLUDED.published_at, \
                 updated_at = NOW() \
             RETURNING {RECORD_COLUMNS}"
        );

        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(&blog.slug)
            .bind(&blog.title)
            .bind(&blog.category)
            .bind(&blog.excerpt)
            .bind(&blog.read_time)
            .bind(&blog.content)
            .bind(blog.published_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
