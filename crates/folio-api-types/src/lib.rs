//! Wire types for the folio blog listing API.
//!
//! These are shared by the server (`GET /api/blogs`, `GET /api/blogs/{slug}`)
//! and by clients that page through the listing. Field names follow the
//! JSON contract (camelCase); timestamps travel as RFC 3339 strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// A blog record without its content document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct BlogSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub excerpt: String,
    pub read_time: String,
}

/// A full blog record as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetail {
    #[serde(flatten)]
    pub summary: BlogSummary,
    pub content: Value,
}

/// One page of the listing.
///
/// `next_cursor` is the offset to request next, or `None` once the listing
/// is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogsPage {
    pub blogs: Vec<BlogSummary>,
    pub next_cursor: Option<u64>,
}

impl BlogsPage {
    pub fn new(blogs: Vec<BlogSummary>, next_cursor: Option<u64>) -> Self {
        Self { blogs, next_cursor }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn summary() -> BlogSummary {
        BlogSummary {
            id: 7,
            slug: "clean-code-robert-martin-interview-guide".to_string(),
            title: "Clean Code: Interview Guide".to_string(),
            category: "Engineering".to_string(),
            published_at: datetime!(2026-02-24 00:00 UTC),
            excerpt: "Functions, comments, formatting.".to_string(),
            read_time: "18 min read".to_string(),
        }
    }

    #[test]
    fn page_serializes_with_camel_case_and_null_cursor() {
        let page = BlogsPage::new(vec![summary()], None);
        let json = serde_json::to_value(&page).expect("serialize page");

        assert_eq!(json["nextCursor"], Value::Null);
        let blog = &json["blogs"][0];
        assert_eq!(blog["id"], 7);
        assert_eq!(blog["publishedAt"], "2026-02-24T00:00:00Z");
        assert_eq!(blog["readTime"], "18 min read");
        assert!(blog.get("content").is_none());
    }

    #[test]
    fn detail_flattens_summary_fields() {
        let detail = BlogDetail {
            summary: summary(),
            content: serde_json::json!({ "format": "markdown", "body": "# Clean Code" }),
        };
        let json = serde_json::to_value(&detail).expect("serialize detail");

        assert_eq!(json["slug"], "clean-code-robert-martin-interview-guide");
        assert_eq!(json["content"]["format"], "markdown");

        let parsed: BlogDetail = serde_json::from_value(json).expect("parse detail");
        assert_eq!(parsed, detail);
    }
}
