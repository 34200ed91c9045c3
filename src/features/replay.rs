//! Latest-event cache so late joiners can catch up.
//!
//! Keeps only the most recent broadcast, stamped with a version number and
//! the time it was recorded.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A cached event with its version and timestamp.
#[derive(Debug)]
pub struct CachedEvent<E> {
    /// Version number (monotonically increasing, starts at 0)
    pub version: u64,
    /// When the event was broadcast
    pub timestamp: DateTime<Utc>,
    /// The event itself
    pub event: Arc<E>,
}

/// Holds the most recently broadcast event.
///
/// # Examples
///
/// ```rust
/// use observer_registry::features::LatestEvent;
/// use std::sync::Arc;
///
/// let cache: LatestEvent<String> = LatestEvent::new();
/// assert!(cache.get().is_none());
///
/// cache.record(Arc::new("first".to_string()));
/// cache.record(Arc::new("second".to_string()));
///
/// let latest = cache.get().unwrap();
/// assert_eq!(latest.version, 1);
/// assert_eq!(*latest.event, "second");
/// ```
pub struct LatestEvent<E> {
    slot: ArcSwapOption<CachedEvent<E>>,
    next_version: AtomicU64,
}

impl<E> LatestEvent<E> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
            next_version: AtomicU64::new(0),
        }
    }

    /// Replace the cached event, returning the version it was stored under.
    pub fn record(&self, event: Arc<E>) -> u64 {
        let version = self.next_version.fetch_add(1, Ordering::AcqRel);
        self.slot.store(Some(Arc::new(CachedEvent {
            version,
            timestamp: Utc::now(),
            event,
        })));
        version
    }

    /// Get the cached event, if any broadcast has been recorded.
    pub fn get(&self) -> Option<Arc<CachedEvent<E>>> {
        self.slot.load_full()
    }

    /// Drop the cached event. Version numbering continues where it left off.
    pub fn clear(&self) {
        self.slot.store(None);
    }
}

impl<E> Default for LatestEvent<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache() {
        let cache: LatestEvent<u32> = LatestEvent::new();
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_record_replaces() {
        let cache = LatestEvent::new();
        assert_eq!(cache.record(Arc::new(10)), 0);
        assert_eq!(cache.record(Arc::new(20)), 1);

        let latest = cache.get().unwrap();
        assert_eq!(*latest.event, 20);
        assert_eq!(latest.version, 1);
    }

    #[test]
    fn test_timestamps_are_ordered() {
        let cache = LatestEvent::new();
        cache.record(Arc::new("a"));
        let first = cache.get().unwrap().timestamp;
        cache.record(Arc::new("b"));
        let second = cache.get().unwrap().timestamp;
        assert!(second >= first);
    }

    #[test]
    fn test_clear_keeps_versioning() {
        let cache = LatestEvent::new();
        cache.record(Arc::new(1));
        cache.clear();
        assert!(cache.get().is_none());

        assert_eq!(cache.record(Arc::new(2)), 1);
    }
}
