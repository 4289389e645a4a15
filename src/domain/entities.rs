//! Blog records mirrored from persistent storage and their listing order.

use std::cmp::Ordering;

use folio_api_types::{BlogDetail, BlogSummary};
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogRecord {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub category: String,
    pub excerpt: String,
    pub read_time: String,
    /// Opaque document owned by the rendering layer.
    pub content: Value,
    pub published_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl BlogRecord {
    pub fn summary(&self) -> BlogSummary {
        BlogSummary {
            id: self.id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
            published_at: self.published_at,
            excerpt: self.excerpt.clone(),
            read_time: self.read_time.clone(),
        }
    }

    pub fn into_detail(self) -> BlogDetail {
        let summary = self.summary();
        BlogDetail {
            summary,
            content: self.content,
        }
    }
}

/// Total order of the listing: newest first, ties broken by the higher id.
///
/// Ids are unique, so two distinct records never compare equal.
pub fn listing_order(
    a_published_at: OffsetDateTime,
    a_id: i64,
    b_published_at: OffsetDateTime,
    b_id: i64,
) -> Ordering {
    b_published_at
        .cmp(&a_published_at)
        .then_with(|| b_id.cmp(&a_id))
}

/// [`listing_order`] applied to two summaries.
pub fn compare_summaries(a: &BlogSummary, b: &BlogSummary) -> Ordering {
    listing_order(a.published_at, a.id, b.published_at, b.id)
}

/// Returns `true` when `items` is strictly ordered by [`listing_order`].
pub fn is_listing_ordered(items: &[BlogSummary]) -> bool {
    items
        .windows(2)
        .all(|pair| compare_summaries(&pair[0], &pair[1]) == Ordering::Less)
}
