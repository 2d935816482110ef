//! The activity log: an append-only record of every detection and kill the
//! decision engine makes.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::Pid;

/// One detection or kill. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub name: String,
    pub pid: Pid,
    pub cpu_usage: f32,
    pub gpu_usage: f32,
    pub detected_at: String,
    pub was_killed: bool,
    pub reason: String,
}

/// An insertion-ordered log of [`ActivityLogEntry`] values.
///
/// The log holds at most `max_entries` records, evicting the oldest first;
/// `None` means unbounded. Entries are only ever removed by eviction or by
/// [`ActivityLog::clear`] - there is no per-entry deletion.
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: Vec<ActivityLogEntry>,
    max_entries: Option<NonZeroUsize>,
}

impl ActivityLog {
    /// An unbounded log.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_entries: Option<NonZeroUsize>) -> Self {
        ActivityLog {
            entries: Vec::new(),
            max_entries,
        }
    }

    /// Restores previously persisted entries, applying the limit.
    pub fn restore(&mut self, entries: Vec<ActivityLogEntry>) {
        self.entries = entries;
        self.evict();
    }

    pub fn append(&mut self, entry: ActivityLogEntry) {
        self.entries.push(entry);
        self.evict();
    }

    /// A read-only snapshot in insertion order, oldest first. Presentation
    /// layers that want newest-first reverse this themselves.
    pub fn list(&self) -> Vec<ActivityLogEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the log. Irreversible, and a no-op on an already empty log.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict(&mut self) {
        if let Some(limit) = self.max_entries {
            let len = self.entries.len();
            if len > limit.get() {
                self.entries.drain(..len - limit.get());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry(pid: Pid, reason: &str) -> ActivityLogEntry {
        ActivityLogEntry {
            name: "proc".to_string(),
            pid,
            cpu_usage: 0.0,
            gpu_usage: 0.0,
            detected_at: String::new(),
            was_killed: false,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut log = ActivityLog::new();
        log.append(entry(1, "first"));
        log.append(entry(2, "second"));

        let listed = log.list();
        assert_eq!(listed[0].pid, 1);
        assert_eq!(listed[1].pid, 2);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut log = ActivityLog::new();
        log.append(entry(1, "a"));

        log.clear();
        assert!(log.is_empty());
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn bounded_log_evicts_oldest_first() {
        let mut log = ActivityLog::with_limit(NonZeroUsize::new(3));
        for pid in 1..=5 {
            log.append(entry(pid, "x"));
        }

        let pids: Vec<Pid> = log.list().into_iter().map(|e| e.pid).collect();
        assert_eq!(pids, vec![3, 4, 5]);
    }

    #[test]
    fn unbounded_log_never_evicts() {
        let mut log = ActivityLog::with_limit(None);
        for pid in 0..2000 {
            log.append(entry(pid, "x"));
        }
        assert_eq!(log.len(), 2000);
    }

    #[test]
    fn restore_applies_the_limit() {
        let mut log = ActivityLog::with_limit(NonZeroUsize::new(2));
        log.restore((1..=4).map(|pid| entry(pid, "x")).collect());
        let pids: Vec<Pid> = log.list().into_iter().map(|e| e.pid).collect();
        assert_eq!(pids, vec![3, 4]);
    }
}
