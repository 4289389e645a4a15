//! Incremental list controller for infinite-scroll listings.
//!
//! The list starts from a server-rendered first page and appends further
//! pages as the visibility trigger reports that the reader is near the end.
//! At most one page request is in flight per list. Loading is split in two
//! phases so the request itself runs without holding the list:
//! [`IncrementalList::begin_load`] hands out a [`LoadTicket`], and
//! [`IncrementalList::complete`] applies the response if the ticket is still
//! current.

use std::{fmt::Display, sync::Arc};

use async_trait::async_trait;
use folio_api_types::{BlogSummary, BlogsPage};
use tokio::sync::Mutex;
use tracing::warn;

use crate::application::trigger::{SentinelObservation, VisibilityTrigger};

pub const LOAD_ERROR_MESSAGE: &str =
    "Something went wrong while loading more posts. Please try again.";

/// Where pages come from, typically the listing endpoint over HTTP.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch(&self, cursor: u64, limit: u32) -> Result<BlogsPage, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    /// Not loading; more pages may exist.
    Idle,
    /// A page request is in flight.
    Loading,
    /// No more pages. Terminal for this list.
    Exhausted,
}

/// Permission to run one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    cursor: u64,
    limit: u32,
    generation: u64,
}

impl LoadTicket {
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Page appended; more may follow.
    Appended { added: usize },
    /// Final page appended.
    Exhausted { added: usize },
    /// Request failed; the list is unchanged and may retry.
    Failed,
    /// No request was made (already loading, exhausted, disposed, or the
    /// trigger did not fire).
    Skipped,
    /// Response arrived for a disposed list and was dropped.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct IncrementalList {
    items: Vec<BlogSummary>,
    next_cursor: Option<u64>,
    state: ListState,
    error: Option<String>,
    page_size: u32,
    generation: u64,
    disposed: bool,
}

impl IncrementalList {
    /// Seed the list with the first page rendered by the server.
    pub fn new(first_page: BlogsPage, page_size: u32) -> Self {
        let state = if first_page.is_last() {
            ListState::Exhausted
        } else {
            ListState::Idle
        };
        Self {
            items: first_page.blogs,
            next_cursor: first_page.next_cursor,
            state,
            error: None,
            page_size,
            generation: 0,
            disposed: false,
        }
    }

    pub fn items(&self) -> &[BlogSummary] {
        &self.items
    }

    pub fn next_cursor(&self) -> Option<u64> {
        self.next_cursor
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    /// Inline error message to show below the list, if the last load failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether to show the "reached the end" affordance.
    pub fn reached_end(&self) -> bool {
        self.state == ListState::Exhausted && !self.items.is_empty()
    }

    /// Move Idle → Loading and return the request to make.
    ///
    /// Returns `None` while a request is already in flight, once exhausted,
    /// or after disposal.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if self.disposed || self.state != ListState::Idle {
            return None;
        }
        let cursor = self.next_cursor?;
        self.state = ListState::Loading;
        Some(LoadTicket {
            cursor,
            limit: self.page_size,
            generation: self.generation,
        })
    }

    /// Apply the result of the request described by `ticket`.
    pub fn complete<E: Display>(
        &mut self,
        ticket: LoadTicket,
        result: Result<BlogsPage, E>,
    ) -> LoadOutcome {
        if self.disposed || ticket.generation != self.generation || self.state != ListState::Loading
        {
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(page) => {
                let added = page.blogs.len();
                self.items.extend(page.blogs);
                self.error = None;
                self.next_cursor = match page.next_cursor {
                    Some(next) if next <= ticket.cursor => {
                        warn!(
                            target = "folio::listing",
                            cursor = ticket.cursor,
                            next,
                            "next cursor did not advance; treating list as exhausted"
                        );
                        None
                    }
                    other => other,
                };

                if self.next_cursor.is_some() {
                    self.state = ListState::Idle;
                    LoadOutcome::Appended { added }
                } else {
                    self.state = ListState::Exhausted;
                    LoadOutcome::Exhausted { added }
                }
            }
            Err(err) => {
                warn!(
                    target = "folio::listing",
                    cursor = ticket.cursor,
                    limit = ticket.limit,
                    error = %err,
                    "failed to load more blogs"
                );
                self.state = ListState::Idle;
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Tear the list down. Responses still in flight are dropped on arrival.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.generation = self.generation.wrapping_add(1);
    }
}

/// A list bound to its page source and visibility trigger.
pub struct ListHandle<S> {
    source: Arc<S>,
    list: Mutex<IncrementalList>,
    trigger: Mutex<VisibilityTrigger>,
}

impl<S: PageSource> ListHandle<S> {
    pub fn new(source: Arc<S>, list: IncrementalList, mut trigger: VisibilityTrigger) -> Self {
        if list.state() == ListState::Exhausted {
            trigger.deactivate();
        }
        Self {
            source,
            list: Mutex::new(list),
            trigger: Mutex::new(trigger),
        }
    }

    /// Run one guarded page load.
    pub async fn load_more(&self) -> LoadOutcome {
        let ticket = match self.list.lock().await.begin_load() {
            Some(ticket) => ticket,
            None => return LoadOutcome::Skipped,
        };

        let result = self.source.fetch(ticket.cursor(), ticket.limit()).await;

        let outcome = self.list.lock().await.complete(ticket, result);
        match outcome {
            LoadOutcome::Exhausted { .. } => self.trigger.lock().await.deactivate(),
            // Appended content moves the sentinel; a sentinel still in range
            // must be able to fire again. Failures stay unarmed.
            LoadOutcome::Appended { .. } => self.trigger.lock().await.rearm(),
            LoadOutcome::Failed | LoadOutcome::Skipped | LoadOutcome::Discarded => {}
        }
        outcome
    }

    /// Feed a layout observation to the trigger and load if it fires.
    pub async fn observe(&self, observation: SentinelObservation) -> LoadOutcome {
        let fired = self.trigger.lock().await.observe(observation);
        match fired {
            Some(_) => self.load_more().await,
            None => LoadOutcome::Skipped,
        }
    }

    pub async fn items(&self) -> Vec<BlogSummary> {
        self.list.lock().await.items().to_vec()
    }

    pub async fn state(&self) -> ListState {
        self.list.lock().await.state()
    }

    pub async fn error(&self) -> Option<String> {
        self.list.lock().await.error().map(str::to_string)
    }

    pub async fn trigger_active(&self) -> bool {
        self.trigger.lock().await.is_active()
    }

    pub async fn dispose(&self) {
        self.list.lock().await.dispose();
        self.trigger.lock().await.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn summaries(ids: std::ops::Range<i64>) -> Vec<BlogSummary> {
        ids.map(|id| BlogSummary {
            id,
            slug: format!("post-{id}"),
            title: format!("Post {id}"),
            category: "Engineering".to_string(),
            published_at: datetime!(2026-02-24 00:00 UTC),
            excerpt: String::new(),
            read_time: "5 min read".to_string(),
        })
        .collect()
    }

    #[test]
    fn seeded_state_follows_first_cursor() {
        let idle = IncrementalList::new(BlogsPage::new(summaries(0..2), Some(2)), 2);
        assert_eq!(idle.state(), ListState::Idle);

        let done = IncrementalList::new(BlogsPage::new(summaries(0..1), None), 2);
        assert_eq!(done.state(), ListState::Exhausted);
        assert!(done.reached_end());
    }

    #[test]
    fn only_one_ticket_while_loading() {
        let mut list = IncrementalList::new(BlogsPage::new(summaries(0..2), Some(2)), 2);
        let ticket = list.begin_load().expect("first ticket");
        assert_eq!(ticket.cursor(), 2);
        assert_eq!(list.state(), ListState::Loading);
        assert!(list.begin_load().is_none());
    }

    #[test]
    fn success_appends_in_order_and_adopts_cursor() {
        let mut list = IncrementalList::new(BlogsPage::new(summaries(0..2), Some(2)), 2);
        let ticket = list.begin_load().expect("ticket");
        let outcome = list.complete::<String>(ticket, Ok(BlogsPage::new(summaries(2..4), Some(4))));

        assert_eq!(outcome, LoadOutcome::Appended { added: 2 });
        assert_eq!(list.next_cursor(), Some(4));
        let ids: Vec<i64> = list.items().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn failure_keeps_cursor_and_flags_error_until_next_success() {
        let mut list = IncrementalList::new(BlogsPage::new(summaries(0..2), Some(2)), 2);
        let ticket = list.begin_load().expect("ticket");
        let outcome = list.complete(ticket, Err("connection reset"));

        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(list.state(), ListState::Idle);
        assert_eq!(list.next_cursor(), Some(2));
        assert_eq!(list.error(), Some(LOAD_ERROR_MESSAGE));
        assert_eq!(list.items().len(), 2);

        let retry = list.begin_load().expect("retry ticket");
        assert_eq!(retry.cursor(), 2);
        list.complete::<String>(retry, Ok(BlogsPage::new(summaries(2..3), None)));
        assert_eq!(list.error(), None);
        assert_eq!(list.state(), ListState::Exhausted);
    }

    #[test]
    fn disposed_list_discards_late_response() {
        let mut list = IncrementalList::new(BlogsPage::new(summaries(0..2), Some(2)), 2);
        let ticket = list.begin_load().expect("ticket");
        list.dispose();

        let outcome = list.complete::<String>(ticket, Ok(BlogsPage::new(summaries(2..4), Some(4))));
        assert_eq!(outcome, LoadOutcome::Discarded);
        assert_eq!(list.items().len(), 2);
        assert!(list.begin_load().is_none());
    }

    #[test]
    fn non_advancing_cursor_ends_the_list() {
        let mut list = IncrementalList::new(BlogsPage::new(summaries(0..2), Some(2)), 2);
        let ticket = list.begin_load().expect("ticket");
        let outcome = list.complete::<String>(ticket, Ok(BlogsPage::new(summaries(2..4), Some(2))));

        assert_eq!(outcome, LoadOutcome::Exhausted { added: 2 });
        assert_eq!(list.next_cursor(), None);
    }
}
