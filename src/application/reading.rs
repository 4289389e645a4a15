//! Reading progress for long-form posts and the "continue reading" offer.
//!
//! Progress is kept in a persistent key-value store: one entry per post plus
//! the most recent entry overall. Accepting an offer leaves a short-lived
//! marker in a session store so the post page knows to restore the position
//! once, right after navigation.

use std::{collections::HashMap, sync::Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

pub const PROGRESS_KEY_PREFIX: &str = "readingProgress:";
pub const LAST_PROGRESS_KEY: &str = "lastReadingProgress";
pub const RESUME_PATH_KEY: &str = "resumeReadingPath";

/// Paths that track progress start with this prefix.
pub const TRACKED_PATH_PREFIX: &str = "/blog/";
/// At or above this fraction a post counts as finished.
pub const FINISHED_FRACTION: f64 = 0.99;
/// The offer is skipped when the reader is already this close to the spot.
pub const SAME_SPOT_PX: f64 = 100.0;
/// Restored positions land this far above the saved spot, under the nav bar.
pub const NAV_OFFSET_PX: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub scroll_y: f64,
    pub percentage: f64,
    /// Travels as Unix epoch milliseconds, the form browsers write.
    #[serde(with = "epoch_millis")]
    pub updated_at: OffsetDateTime,
}

/// Scroll geometry sampled from the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ReadingProgress {
    /// Build a progress entry for `path`, or `None` for untracked paths.
    pub fn capture(
        path: &str,
        title: Option<&str>,
        sample: ScrollSample,
        now: OffsetDateTime,
    ) -> Option<Self> {
        if !path.starts_with(TRACKED_PATH_PREFIX) {
            return None;
        }

        let viewport = non_zero(sample.viewport_height);
        let document = non_zero(sample.document_height);
        let percentage = ((sample.scroll_y + viewport) / document).clamp(0.0, 1.0);

        Some(Self {
            path: path.to_string(),
            title: title.map(str::to_string),
            scroll_y: sample.scroll_y,
            percentage,
            updated_at: now,
        })
    }

    pub fn percentage_label(&self) -> String {
        format!("{}% read", (self.percentage * 100.0).round() as i64)
    }
}

mod epoch_millis {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use time::OffsetDateTime;

    const NANOS_PER_MILLI: i128 = 1_000_000;

    pub fn serialize<S: Serializer>(
        value: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let millis = value.unix_timestamp_nanos() / NANOS_PER_MILLI;
        let millis = i64::try_from(millis).map_err(<S::Error as serde::ser::Error>::custom)?;
        serializer.serialize_i64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI)
            .map_err(D::Error::custom)
    }
}

fn non_zero(value: f64) -> f64 {
    if value > 0.0 && value.is_finite() {
        value
    } else {
        1.0
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String keys mapped to serialized JSON values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|err| StorageError::Unavailable(err.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries
            .lock()
            .map_err(|err| StorageError::Unavailable(err.to_string()))?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .map_err(|err| StorageError::Unavailable(err.to_string()))?
            .remove(key);
        Ok(())
    }
}

pub struct ProgressTracker<'a> {
    persistent: &'a dyn KeyValueStore,
    session: &'a dyn KeyValueStore,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(persistent: &'a dyn KeyValueStore, session: &'a dyn KeyValueStore) -> Self {
        Self {
            persistent,
            session,
        }
    }

    /// Save `progress` as both the per-post and the latest entry.
    ///
    /// Storage failures are not reported to the reader.
    pub fn record(&self, progress: &ReadingProgress) {
        let payload = match serde_json::to_string(progress) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(target = "folio::reading", error = %err, "failed to encode progress");
                return;
            }
        };

        let key = progress_key(&progress.path);
        for key in [key.as_str(), LAST_PROGRESS_KEY] {
            if let Err(err) = self.persistent.set(key, payload.clone()) {
                debug!(target = "folio::reading", key, error = %err, "failed to save progress");
            }
        }
    }

    /// The latest progress worth offering to the reader, if any.
    pub fn resume_offer(&self, current_path: &str, current_scroll: f64) -> Option<ReadingProgress> {
        let progress = self.load(LAST_PROGRESS_KEY)?;
        if progress.path.is_empty() || progress.percentage >= FINISHED_FRACTION {
            return None;
        }
        if progress.path == current_path && (current_scroll - progress.scroll_y).abs() < SAME_SPOT_PX
        {
            return None;
        }
        Some(progress)
    }

    /// Mark `offer` for restoration and return the path to navigate to.
    pub fn accept_offer<'p>(&self, offer: &'p ReadingProgress) -> &'p str {
        if let Err(err) = self.session.set(RESUME_PATH_KEY, offer.path.clone()) {
            debug!(target = "folio::reading", error = %err, "failed to store resume marker");
        }
        &offer.path
    }

    /// Scroll position to restore on `path`, consuming the resume marker.
    ///
    /// The marker is removed whether or not it matched.
    pub fn restore_target(&self, path: &str) -> Option<f64> {
        let marker = self.session.get(RESUME_PATH_KEY).ok().flatten();
        if let Err(err) = self.session.remove(RESUME_PATH_KEY) {
            debug!(target = "folio::reading", error = %err, "failed to clear resume marker");
        }

        if marker.as_deref() != Some(path) {
            return None;
        }
        let saved = self.load(&progress_key(path))?;
        Some((saved.scroll_y - NAV_OFFSET_PX).max(0.0))
    }

    fn load(&self, key: &str) -> Option<ReadingProgress> {
        let raw = self.persistent.get(key).ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(progress) => Some(progress),
            Err(err) => {
                debug!(target = "folio::reading", key, error = %err, "ignoring unreadable progress");
                None
            }
        }
    }
}

pub fn progress_key(path: &str) -> String {
    format!("{PROGRESS_KEY_PREFIX}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded)
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn sample(scroll_y: f64) -> ScrollSample {
        ScrollSample {
            scroll_y,
            viewport_height: 800.0,
            document_height: 4_000.0,
        }
    }

    fn progress(path: &str, scroll_y: f64) -> ReadingProgress {
        ReadingProgress::capture(path, Some("Post"), sample(scroll_y), NOW).expect("tracked path")
    }

    #[test]
    fn capture_only_tracks_posts() {
        assert!(ReadingProgress::capture("/", None, sample(0.0), NOW).is_none());
        assert!(ReadingProgress::capture("/blog", None, sample(0.0), NOW).is_none());

        let captured = progress("/blog/clean-code", 1_200.0);
        assert!((captured.percentage - 0.5).abs() < f64::EPSILON);
        assert_eq!(captured.percentage_label(), "50% read");
    }

    #[test]
    fn capture_clamps_and_tolerates_zero_heights() {
        let overshoot = ReadingProgress::capture(
            "/blog/a",
            None,
            ScrollSample {
                scroll_y: 5_000.0,
                viewport_height: 800.0,
                document_height: 4_000.0,
            },
            NOW,
        )
        .expect("tracked");
        assert_eq!(overshoot.percentage, 1.0);

        let degenerate = ReadingProgress::capture(
            "/blog/a",
            None,
            ScrollSample {
                scroll_y: 0.0,
                viewport_height: 0.0,
                document_height: 0.0,
            },
            NOW,
        )
        .expect("tracked");
        assert_eq!(degenerate.percentage, 1.0);
    }

    #[test]
    fn serialized_form_uses_camel_case_and_epoch_millis() {
        let json = serde_json::to_value(progress("/blog/a", 10.0)).expect("serialize");
        assert!(json.get("scrollY").is_some());
        assert_eq!(json["updatedAt"], NOW.unix_timestamp() * 1_000);
    }

    #[test]
    fn reads_entries_written_by_the_site() {
        let local = MemoryStore::new();
        let session = MemoryStore::new();
        local
            .set(
                LAST_PROGRESS_KEY,
                r#"{"path":"/blog/clean-code","scrollY":1200,"percentage":0.5,"updatedAt":1772000000000}"#
                    .to_string(),
            )
            .expect("set");
        let tracker = ProgressTracker::new(&local, &session);

        let offer = tracker.resume_offer("/", 0.0).expect("offer");
        assert_eq!(offer.path, "/blog/clean-code");
        assert_eq!(offer.title, None);
        assert_eq!(offer.scroll_y, 1_200.0);
        assert_eq!(offer.updated_at, datetime!(2026-02-25 06:13:20 UTC));
        assert_eq!(offer.percentage_label(), "50% read");
    }

    #[test]
    fn epoch_millis_keep_sub_second_precision() {
        let stored = r#"{"path":"/blog/a","scrollY":0,"percentage":0.1,"updatedAt":1772000000123}"#;
        let progress: ReadingProgress = serde_json::from_str(stored).expect("parse");
        assert_eq!(progress.updated_at.millisecond(), 123);
        let json = serde_json::to_value(&progress).expect("serialize");
        assert_eq!(json["updatedAt"], 1_772_000_000_123_i64);
    }

    #[test]
    fn record_writes_both_keys() {
        let local = MemoryStore::new();
        let session = MemoryStore::new();
        let tracker = ProgressTracker::new(&local, &session);
        tracker.record(&progress("/blog/a", 300.0));

        assert!(local.get("readingProgress:/blog/a").expect("get").is_some());
        assert!(local.get(LAST_PROGRESS_KEY).expect("get").is_some());
    }

    #[test]
    fn record_ignores_storage_failures() {
        let session = MemoryStore::new();
        let tracker = ProgressTracker::new(&FullStore, &session);
        tracker.record(&progress("/blog/a", 300.0));
        assert!(tracker.resume_offer("/", 0.0).is_none());
    }

    #[test]
    fn offer_skips_finished_posts_and_same_spot() {
        let local = MemoryStore::new();
        let session = MemoryStore::new();
        let tracker = ProgressTracker::new(&local, &session);

        tracker.record(&progress("/blog/a", 1_000.0));
        assert!(tracker.resume_offer("/", 0.0).is_some());
        assert!(tracker.resume_offer("/blog/a", 1_050.0).is_none());
        assert!(tracker.resume_offer("/blog/a", 1_200.0).is_some());

        tracker.record(&progress("/blog/a", 3_200.0));
        assert!(tracker.resume_offer("/", 0.0).is_none());
    }

    #[test]
    fn offer_ignores_unreadable_entries() {
        let local = MemoryStore::new();
        let session = MemoryStore::new();
        local
            .set(LAST_PROGRESS_KEY, "{not json".to_string())
            .expect("set");
        let tracker = ProgressTracker::new(&local, &session);
        assert!(tracker.resume_offer("/", 0.0).is_none());
    }

    #[test]
    fn accepted_offer_restores_once_below_nav() {
        let local = MemoryStore::new();
        let session = MemoryStore::new();
        let tracker = ProgressTracker::new(&local, &session);
        tracker.record(&progress("/blog/a", 1_000.0));

        let offer = tracker.resume_offer("/", 0.0).expect("offer");
        assert_eq!(tracker.accept_offer(&offer), "/blog/a");

        assert_eq!(tracker.restore_target("/blog/a"), Some(920.0));
        assert_eq!(tracker.restore_target("/blog/a"), None);
    }

    #[test]
    fn mismatched_marker_is_still_consumed() {
        let local = MemoryStore::new();
        let session = MemoryStore::new();
        let tracker = ProgressTracker::new(&local, &session);
        tracker.record(&progress("/blog/a", 50.0));
        session
            .set(RESUME_PATH_KEY, "/blog/a".to_string())
            .expect("set");

        assert_eq!(tracker.restore_target("/blog/b"), None);
        assert!(session.get(RESUME_PATH_KEY).expect("get").is_none());

        session
            .set(RESUME_PATH_KEY, "/blog/a".to_string())
            .expect("set");
        assert_eq!(tracker.restore_target("/blog/a"), Some(0.0));
    }
}
