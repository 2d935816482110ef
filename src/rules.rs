//! Rule storage: blacklist entries, their thresholds, and the operations the
//! command surface exposes on them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::timestamp;

/// The wire value meaning "this trigger never fires". `100` is a legitimate
/// full-load threshold, so the disabled marker has to sit out of range.
pub const THRESHOLD_DISABLED_SENTINEL: u8 = 101;

/// A kill trigger. Armed thresholds fire at or above their value; a
/// threshold of zero is vacuously satisfied (kill whenever the process
/// exists). On the wire this is a `u8` where `101` means disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Threshold {
    Armed(u8),
    Disabled,
}

impl Threshold {
    /// Converts a raw wire value, clamping anything above 100 to disabled.
    pub fn from_raw(raw: u8) -> Self {
        if raw > 100 {
            Threshold::Disabled
        } else {
            Threshold::Armed(raw)
        }
    }

    /// The raw wire value of this threshold.
    pub fn raw(self) -> u8 {
        match self {
            Threshold::Armed(value) => value,
            Threshold::Disabled => THRESHOLD_DISABLED_SENTINEL,
        }
    }

    pub fn is_armed(self) -> bool {
        matches!(self, Threshold::Armed(_))
    }

    /// Whether an observed load trips this trigger.
    pub fn exceeded_by(self, load: f32) -> bool {
        match self {
            Threshold::Armed(value) => load >= f32::from(value),
            Threshold::Disabled => false,
        }
    }
}

impl From<u8> for Threshold {
    fn from(raw: u8) -> Self {
        Threshold::from_raw(raw)
    }
}

impl From<Threshold> for u8 {
    fn from(threshold: Threshold) -> Self {
        threshold.raw()
    }
}

/// A single blacklist rule, one per unique process name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub name: String,
    pub auto_kill: bool,
    pub cpu_threshold: Threshold,
    pub gpu_threshold: Threshold,
    pub log_enabled: bool,
    pub log_kills_only: bool,
    pub created_at: String,
    pub kill_count: u32,
}

/// An error from a rule store operation, returned synchronously to the
/// caller for direct user feedback.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("'{0}' is already in the blacklist")]
    DuplicateEntry(String),
    #[error("'{0}' is not in the blacklist")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The set of blacklist rules, keyed by process name.
///
/// Lookups are case-insensitive; `list()` preserves insertion order so that
/// repeated listings are stable for display.
#[derive(Debug, Default)]
pub struct RuleStore {
    entries: IndexMap<String, BlacklistEntry>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from previously persisted entries. Later duplicates
    /// of the same name are dropped.
    pub fn from_entries(entries: Vec<BlacklistEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            let key = entry.name.to_ascii_lowercase();
            store.entries.entry(key).or_insert(entry);
        }
        store
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The names of every rule, in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.values().map(|e| e.name.clone()).collect()
    }

    /// A snapshot of all entries, in insertion order.
    pub fn list(&self) -> Vec<BlacklistEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&BlacklistEntry> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    /// Adds a new rule. The GPU trigger starts disabled; it can be armed
    /// afterwards with [`RuleStore::set_gpu_threshold`].
    pub fn add(
        &mut self, name: &str, auto_kill: bool, cpu_threshold: Threshold,
    ) -> StoreResult<()> {
        let key = name.to_ascii_lowercase();
        if self.entries.contains_key(&key) {
            return Err(StoreError::DuplicateEntry(name.to_string()));
        }

        self.entries.insert(
            key,
            BlacklistEntry {
                name: name.to_string(),
                auto_kill,
                cpu_threshold,
                gpu_threshold: Threshold::Disabled,
                log_enabled: true,
                log_kills_only: false,
                created_at: timestamp::now(),
                kill_count: 0,
            },
        );

        Ok(())
    }

    /// Removes a rule. Historical activity log entries are left untouched.
    pub fn remove(&mut self, name: &str) -> StoreResult<BlacklistEntry> {
        self.entries
            .shift_remove(&name.to_ascii_lowercase())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    pub fn set_cpu_threshold(&mut self, name: &str, value: u8) -> StoreResult<Threshold> {
        let entry = self.get_mut(name)?;
        entry.cpu_threshold = Threshold::from_raw(value);
        Ok(entry.cpu_threshold)
    }

    pub fn set_gpu_threshold(&mut self, name: &str, value: u8) -> StoreResult<Threshold> {
        let entry = self.get_mut(name)?;
        entry.gpu_threshold = Threshold::from_raw(value);
        Ok(entry.gpu_threshold)
    }

    pub fn toggle_auto_kill(&mut self, name: &str) -> StoreResult<bool> {
        let entry = self.get_mut(name)?;
        entry.auto_kill = !entry.auto_kill;
        Ok(entry.auto_kill)
    }

    pub fn toggle_log(&mut self, name: &str) -> StoreResult<bool> {
        let entry = self.get_mut(name)?;
        entry.log_enabled = !entry.log_enabled;
        Ok(entry.log_enabled)
    }

    pub fn toggle_log_kills_only(&mut self, name: &str) -> StoreResult<bool> {
        let entry = self.get_mut(name)?;
        entry.log_kills_only = !entry.log_kills_only;
        Ok(entry.log_kills_only)
    }

    /// Bumps the kill counter after confirmed terminations. Only the
    /// decision engine calls this; partially successful kills count only
    /// the successes.
    pub fn increment_kill_count(&mut self, name: &str, by: u32) -> StoreResult<u32> {
        let entry = self.get_mut(name)?;
        entry.kill_count = entry.kill_count.saturating_add(by);
        Ok(entry.kill_count)
    }

    fn get_mut(&mut self, name: &str) -> StoreResult<&mut BlacklistEntry> {
        self.entries
            .get_mut(&name.to_ascii_lowercase())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn threshold_raw_round_trip() {
        assert_eq!(Threshold::from_raw(0), Threshold::Armed(0));
        assert_eq!(Threshold::from_raw(100), Threshold::Armed(100));
        assert_eq!(Threshold::from_raw(101), Threshold::Disabled);
        assert_eq!(Threshold::from_raw(255), Threshold::Disabled);
        assert_eq!(Threshold::Armed(30).raw(), 30);
        assert_eq!(Threshold::Disabled.raw(), THRESHOLD_DISABLED_SENTINEL);
    }

    #[test]
    fn threshold_zero_is_vacuously_satisfied() {
        assert!(Threshold::Armed(0).exceeded_by(0.0));
        assert!(Threshold::Armed(0).exceeded_by(0.1));
    }

    #[test]
    fn disabled_threshold_never_fires() {
        assert!(!Threshold::Disabled.exceeded_by(100.0));
        assert!(!Threshold::Disabled.exceeded_by(f32::MAX));
    }

    #[test]
    fn duplicate_add_leaves_original_untouched() {
        let mut store = RuleStore::new();
        store.add("miner", true, Threshold::Armed(30)).unwrap();
        store.increment_kill_count("miner", 3).unwrap();

        assert_eq!(
            store.add("Miner", false, Threshold::Armed(90)),
            Err(StoreError::DuplicateEntry("Miner".to_string()))
        );

        let entry = store.get("miner").unwrap();
        assert!(entry.auto_kill);
        assert_eq!(entry.cpu_threshold, Threshold::Armed(30));
        assert_eq!(entry.kill_count, 3);
    }

    #[test]
    fn remove_missing_leaves_store_unchanged() {
        let mut store = RuleStore::new();
        store.add("a", false, Threshold::Disabled).unwrap();

        assert_eq!(
            store.remove("b"),
            Err(StoreError::NotFound("b".to_string()))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn toggles_return_the_new_value() {
        let mut store = RuleStore::new();
        store.add("a", false, Threshold::Disabled).unwrap();

        assert_eq!(store.toggle_auto_kill("a"), Ok(true));
        assert_eq!(store.toggle_auto_kill("a"), Ok(false));
        assert_eq!(store.toggle_log("a"), Ok(false));
        assert_eq!(store.toggle_log_kills_only("a"), Ok(true));
        assert_eq!(
            store.toggle_log("missing"),
            Err(StoreError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn set_threshold_clamps_into_range() {
        let mut store = RuleStore::new();
        store.add("a", true, Threshold::Armed(10)).unwrap();

        assert_eq!(store.set_cpu_threshold("a", 100), Ok(Threshold::Armed(100)));
        assert_eq!(store.set_cpu_threshold("a", 200), Ok(Threshold::Disabled));
        assert_eq!(store.set_gpu_threshold("a", 50), Ok(Threshold::Armed(50)));
        assert_eq!(
            store.get("a").unwrap().gpu_threshold,
            Threshold::Armed(50)
        );
    }

    #[test]
    fn list_preserves_insertion_order() {
        let mut store = RuleStore::new();
        for name in ["zeta", "alpha", "mid"] {
            store.add(name, false, Threshold::Disabled).unwrap();
        }
        store.remove("alpha").unwrap();
        store.add("beta", false, Threshold::Disabled).unwrap();

        let names = store.names();
        assert_eq!(names, vec!["zeta", "mid", "beta"]);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut store = RuleStore::new();
        store.add("Chrome", true, Threshold::Armed(50)).unwrap();

        assert!(store.get("chrome").is_some());
        assert_eq!(store.toggle_auto_kill("CHROME"), Ok(false));
        // The display name keeps the casing it was added with.
        assert_eq!(store.get("chrome").unwrap().name, "Chrome");
    }
}
