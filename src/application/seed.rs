//! Seeding blog records from a TOML archive.
//!
//! ```toml
//! [[blogs]]
//! published_at = 2026-02-24T00:00:00Z
//! body_file = "posts/clean-code.md"
//!
//! [[blogs]]
//! slug = "refactoring-martin-fowler"
//! title = "Refactoring"
//! category = "Practice"
//! published_at = "2026-02-20T09:30:00+01:00"
//! body = "# Refactoring\n\nImproving the design of existing code."
//! ```
//!
//! Missing titles, excerpts and read times are derived from the markdown
//! body. Entries are upserted by slug in archive order.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::info;

use crate::{
    application::repos::{BlogsWriteRepo, NewBlog, RepoError},
    domain::{
        authoring::{extract_metadata, fallback_excerpt, format_read_time},
        error::DomainError,
        slug::{derive_slug, validate_slug},
    },
};

pub const DEFAULT_CATEGORY: &str = "Engineering";
pub const CONTENT_FORMAT: &str = "markdown";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid archive `{}`: {message}", path.display())]
    Archive { path: PathBuf, message: String },
    #[error("blog entry #{index} is invalid: {source}")]
    Entry {
        index: usize,
        #[source]
        source: DomainError,
    },
    #[error("failed to store blog `{slug}`: {source}")]
    Store {
        slug: String,
        #[source]
        source: RepoError,
    },
}

#[derive(Debug, Deserialize)]
struct SeedArchive {
    #[serde(default)]
    blogs: Vec<SeedEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedEntry {
    slug: Option<String>,
    title: Option<String>,
    category: Option<String>,
    published_at: ArchiveTimestamp,
    excerpt: Option<String>,
    read_time: Option<String>,
    body: Option<String>,
    body_file: Option<PathBuf>,
}

/// TOML allows both native datetimes and quoted strings.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct ArchiveTimestamp(toml::Value);

impl ArchiveTimestamp {
    fn parse(&self) -> Result<OffsetDateTime, String> {
        let text = match &self.0 {
            toml::Value::Datetime(value) => value.to_string(),
            toml::Value::String(value) => value.trim().to_string(),
            other => return Err(format!("published_at must be a timestamp, got `{other}`")),
        };
        OffsetDateTime::parse(&text, &Rfc3339)
            .map_err(|err| format!("published_at `{text}` is not an RFC 3339 timestamp: {err}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub slugs: Vec<String>,
}

/// Read the archive at `path` and turn every entry into a record to store.
///
/// `body_file` paths resolve relative to the archive's directory.
pub async fn load_archive(path: &Path) -> Result<Vec<NewBlog>, SeedError> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let archive: SeedArchive = toml::from_str(&data).map_err(|err| SeedError::Archive {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut blogs = Vec::with_capacity(archive.blogs.len());
    for (position, entry) in archive.blogs.into_iter().enumerate() {
        let index = position + 1;
        let body = read_body(&entry, base_dir)
            .await
            .map_err(|source| SeedError::Entry { index, source })?;
        let blog =
            prepare_entry(entry, body).map_err(|source| SeedError::Entry { index, source })?;
        blogs.push(blog);
    }

    Ok(blogs)
}

/// Upsert every entry of the archive, stopping at the first failure.
pub async fn seed_archive(
    repo: &dyn BlogsWriteRepo,
    path: &Path,
) -> Result<SeedReport, SeedError> {
    let blogs = load_archive(path).await?;
    let mut slugs = Vec::with_capacity(blogs.len());

    for blog in blogs {
        let slug = blog.slug.clone();
        let record = repo
            .upsert(blog)
            .await
            .map_err(|source| SeedError::Store {
                slug: slug.clone(),
                source,
            })?;
        info!(
            target = "folio::seed",
            id = record.id,
            slug = %record.slug,
            published_at = %record.published_at,
            "seeded blog"
        );
        slugs.push(slug);
    }

    Ok(SeedReport { slugs })
}

async fn read_body(entry: &SeedEntry, base_dir: &Path) -> Result<String, DomainError> {
    let label = entry_label(entry);
    match (&entry.body, &entry.body_file) {
        (Some(body), None) => Ok(body.clone()),
        (None, Some(file)) => {
            let resolved = base_dir.join(file);
            tokio::fs::read_to_string(&resolved).await.map_err(|err| {
                DomainError::invalid_blog(
                    label,
                    format!("failed to read `{}`: {err}", resolved.display()),
                )
            })
        }
        (Some(_), Some(_)) => Err(DomainError::invalid_blog(
            label,
            "set either `body` or `body_file`, not both",
        )),
        (None, None) => Err(DomainError::invalid_blog(
            label,
            "missing `body` or `body_file`",
        )),
    }
}

fn prepare_entry(entry: SeedEntry, body: String) -> Result<NewBlog, DomainError> {
    let label = entry_label(&entry);
    let metadata = extract_metadata(&body);

    let title = entry
        .title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .or(metadata.title)
        .ok_or_else(|| DomainError::invalid_blog(&label, "no title and no `# ` heading in body"))?;

    let slug = match entry.slug {
        Some(slug) => validate_slug(slug.trim())
            .map(str::to_string)
            .map_err(|err| DomainError::invalid_blog(&label, err.to_string()))?,
        None => derive_slug(&title).map_err(|err| DomainError::invalid_blog(&label, err.to_string()))?,
    };

    let published_at = entry
        .published_at
        .parse()
        .map_err(|message| DomainError::invalid_blog(&slug, message))?;

    let excerpt = entry
        .excerpt
        .or(metadata.excerpt)
        .unwrap_or_else(|| fallback_excerpt(&title));
    let read_time = entry
        .read_time
        .unwrap_or_else(|| format_read_time(metadata.read_time_minutes));
    let category = entry
        .category
        .map(|category| category.trim().to_string())
        .filter(|category| !category.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    Ok(NewBlog {
        slug,
        title,
        category,
        excerpt,
        read_time,
        content: json!({ "format": CONTENT_FORMAT, "body": body }),
        published_at,
    })
}

fn entry_label(entry: &SeedEntry) -> String {
    entry
        .slug
        .clone()
        .or_else(|| entry.title.clone())
        .unwrap_or_else(|| "<untitled>".to_string())
}
