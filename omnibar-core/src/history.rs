//! Capacity-bounded, consecutively-deduplicated command history.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::persistence::HistoryStore;

/// Default number of lines kept in the history log.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Direction of a history navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the oldest entry (ArrowUp).
    Older,
    /// Toward the newest entry and then back to a blank line (ArrowDown).
    Newer,
}

/// Ordered log of executed command lines, oldest first.
pub struct HistoryLog {
    entries: Vec<String>,
    capacity: usize,
    store: Option<Arc<dyn HistoryStore>>,
}

impl fmt::Debug for HistoryLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryLog")
            .field("entries", &self.entries)
            .field("capacity", &self.capacity)
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    /// An empty, non-persistent log. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
            store: None,
        }
    }

    /// Restore the log from `store` and persist every later mutation to it.
    ///
    /// Stored entries are re-normalized: blank lines and consecutive repeats
    /// are dropped and only the newest `capacity` lines are kept. A store that
    /// fails to load yields an empty log rather than an error.
    pub fn load(store: Arc<dyn HistoryStore>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        match store.load() {
            Ok(stored) => {
                for line in stored {
                    log.push_entry(&line);
                }
                debug!(entries = log.entries.len(), "Loaded command history");
            }
            Err(e) => warn!(error = %e, "Failed to load command history, starting empty"),
        }
        log.store = Some(store);
        log
    }

    /// Append an executed line.
    ///
    /// Blank lines and a repeat of the most recent entry are ignored. Returns
    /// whether the log changed; the store is only written when it did.
    pub fn append(&mut self, line: &str) -> bool {
        if !self.push_entry(line) {
            return false;
        }
        self.persist();
        true
    }

    fn push_entry(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        if self.entries.last().map(String::as_str) == Some(line) {
            return false;
        }
        self.entries.push(line.to_string());
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
        true
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.entries) {
                warn!(error = %e, "Failed to persist command history");
            }
        }
    }

    /// Step `cursor` through the log.
    ///
    /// `Older` starts at the newest entry and stops at the oldest. `Newer`
    /// walks forward and returns `None` once it passes the newest entry; the
    /// caller clears its input at that point. There is no way back to `None`
    /// in the `Older` direction.
    pub fn navigate(&self, direction: Direction, cursor: Option<usize>) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        match (direction, cursor) {
            (Direction::Older, None) => Some(last),
            (Direction::Older, Some(index)) => Some(index.min(last).saturating_sub(1)),
            (Direction::Newer, None) => None,
            (Direction::Newer, Some(index)) if index >= last => None,
            (Direction::Newer, Some(index)) => Some(index + 1),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
