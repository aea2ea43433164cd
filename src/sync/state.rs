// ABOUTME: Observable state published by a synchronizer
// ABOUTME: Data is shared behind Arc so unchanged cycles keep the same reference

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Snapshot of a synchronized resource as seen by consumers.
#[derive(Debug)]
pub struct SyncState<T> {
    /// Last published value
    pub data: Option<Arc<T>>,
    /// True while the first fetch runs (or a fetch runs with no data yet)
    pub loading: bool,
    /// True while a background fetch runs over existing data
    pub is_refreshing: bool,
    /// Message of the last failed cycle, cleared by the next successful one
    pub error: Option<String>,
    /// Wall-clock time of the last publish
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Default for SyncState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            is_refreshing: false,
            error: None,
            last_updated: None,
        }
    }
}

impl<T> Clone for SyncState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            is_refreshing: self.is_refreshing,
            error: self.error.clone(),
            last_updated: self.last_updated,
        }
    }
}

impl<T> SyncState<T> {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// True while any fetch for this resource is running.
    pub fn is_busy(&self) -> bool {
        self.loading || self.is_refreshing
    }

    /// Whether `other` holds the very same published value as `self`.
    pub fn same_data(&self, other: &SyncState<T>) -> bool {
        match (&self.data, &other.data) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_empty() {
        let state: SyncState<Vec<u32>> = SyncState::default();
        assert!(!state.has_data());
        assert!(!state.is_busy());
        assert!(state.error.is_none());
        assert!(state.last_updated.is_none());
    }

    #[test]
    fn test_same_data_uses_reference_identity() {
        let shared = Arc::new(vec![1, 2]);
        let a = SyncState {
            data: Some(Arc::clone(&shared)),
            ..SyncState::default()
        };
        let b = a.clone();
        let c = SyncState {
            data: Some(Arc::new(vec![1, 2])),
            ..SyncState::default()
        };
        assert!(a.same_data(&b));
        assert!(!a.same_data(&c));
    }
}
