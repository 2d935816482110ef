//! The command surface consumed by presentation layers.
//!
//! [`Warden`] is the explicitly owned store object the rest of the system
//! shares: the rule store and activity log live behind one mutex so the
//! tick thread and user-facing operations always observe a consistent
//! snapshot, and the collector sits behind its own lock since sampling is
//! the slow part. Lock order is always collector first, then state.

use std::{path::PathBuf, sync::Mutex};

use thiserror::Error;

use crate::{
    activity_log::{ActivityLog, ActivityLogEntry},
    collection::{
        error::{CollectionError, CollectionResult},
        Collector, SystemStats,
    },
    engine::{self, OsTerminator, Terminator},
    grouping::{self, ProcessGroup, ProcessSample},
    killer::TerminationError,
    privilege,
    rules::{BlacklistEntry, RuleStore, StoreError},
    state::{self, PersistedState},
    Pid,
};

/// An error from a command. Store and validation errors surface directly to
/// the caller; engine-internal termination failures never show up here,
/// they become activity log entries instead.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error(transparent)]
    Termination(#[from] TerminationError),
    #[error("process name cannot be empty")]
    EmptyName,
    #[error("no matching processes found")]
    NoMatchingProcesses,
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Maps the friendly names users actually type to the process names the OS
/// reports.
pub fn resolve_process_name(input: &str) -> String {
    let name = input.trim().to_ascii_lowercase();
    match name.as_str() {
        "edge" | "microsoft edge" | "msedge" => "msedge".to_string(),
        "chrome" | "google chrome" => "chrome".to_string(),
        "code" | "vscode" | "vs code" => "code".to_string(),
        "calc" | "calculator" => "calculator".to_string(),
        "task manager" | "taskmgr" => "taskmgr".to_string(),
        "cmd" | "command prompt" => "cmd".to_string(),
        _ => name,
    }
}

struct CoreState {
    rules: RuleStore,
    log: ActivityLog,
}

/// The shared handle implementing the command surface.
pub struct Warden {
    state: Mutex<CoreState>,
    collector: Mutex<Collector>,
    terminator: Box<dyn Terminator + Send + Sync>,
    state_file: Option<PathBuf>,
}

impl Warden {
    pub fn new(rules: RuleStore, log: ActivityLog, state_file: Option<PathBuf>) -> Self {
        Self::with_terminator(rules, log, state_file, Box::new(OsTerminator))
    }

    /// A handle with a caller-supplied terminator, for embedders that want
    /// the decision loop without real kills.
    pub fn with_terminator(
        rules: RuleStore, log: ActivityLog, state_file: Option<PathBuf>,
        terminator: Box<dyn Terminator + Send + Sync>,
    ) -> Self {
        Warden {
            state: Mutex::new(CoreState { rules, log }),
            collector: Mutex::new(Collector::new()),
            terminator,
            state_file,
        }
    }

    // ----- System and process browsing -----

    pub fn get_system_stats(&self) -> SystemStats {
        self.collector.lock().unwrap().system_stats()
    }

    /// The flat list of live process samples matching any of `names`.
    pub fn watched_processes(&self, names: &[String]) -> CollectionResult<Vec<ProcessSample>> {
        let watch = resolve_names(names);
        if watch.is_empty() {
            return Ok(Vec::new());
        }

        let samples = self.collector.lock().unwrap().process_samples()?;
        Ok(samples
            .into_iter()
            .filter(|s| watch.iter().any(|w| grouping::matches_name(&s.name, w)))
            .collect())
    }

    /// Live process groups for the given names.
    pub fn grouped_processes(&self, names: &[String]) -> CollectionResult<Vec<ProcessGroup>> {
        let watch = resolve_names(names);
        if watch.is_empty() {
            return Ok(Vec::new());
        }

        let samples = self.collector.lock().unwrap().process_samples()?;
        Ok(grouping::group_samples(&samples, Some(&watch)))
    }

    /// Every running process, grouped by name.
    pub fn get_all_process_list(&self) -> CollectionResult<Vec<ProcessGroup>> {
        let samples = self.collector.lock().unwrap().process_samples()?;
        Ok(grouping::group_samples(&samples, None))
    }

    // ----- Manual kills -----

    pub fn kill_pid(&self, pid: Pid) -> CommandResult<String> {
        self.terminator.terminate(pid)?;
        Ok(format!("PID {pid} terminated"))
    }

    /// Kills every live process in the named group, reporting a summary.
    pub fn kill_process_group(&self, name: &str) -> CommandResult<String> {
        let resolved = resolve_process_name(name);
        if resolved.is_empty() {
            return Err(CommandError::EmptyName);
        }

        let samples = self.collector.lock().unwrap().process_samples()?;
        let pids: Vec<Pid> = samples
            .iter()
            .filter(|s| grouping::matches_name(&s.name, &resolved))
            .map(|s| s.pid)
            .collect();

        if pids.is_empty() {
            return Err(CommandError::NoMatchingProcesses);
        }

        let mut killed = 0;
        let mut failed = 0;
        for pid in pids {
            match self.terminator.terminate(pid) {
                Ok(()) => killed += 1,
                Err(err) => {
                    debug!("manual group kill: pid {pid} failed: {err}");
                    failed += 1;
                }
            }
        }

        if killed > 0 {
            Ok(format!("Killed {killed} processes, {failed} failed"))
        } else {
            Err(CommandError::Termination(TerminationError::Failed(
                format!("failed to kill {failed} processes (permission denied?)"),
            )))
        }
    }

    pub fn is_running_as_admin(&self) -> bool {
        privilege::is_elevated()
    }

    // ----- Blacklist management -----

    pub fn get_blacklist(&self) -> Vec<BlacklistEntry> {
        self.state.lock().unwrap().rules.list()
    }

    pub fn add_to_blacklist(
        &self, name: &str, auto_kill: bool, cpu_threshold: u8,
    ) -> CommandResult<String> {
        let resolved = resolve_process_name(name);
        if resolved.is_empty() {
            return Err(CommandError::EmptyName);
        }

        let mut state = self.state.lock().unwrap();
        state
            .rules
            .add(&resolved, auto_kill, cpu_threshold.into())?;
        self.persist(&state);

        Ok(format!("'{resolved}' added to the blacklist"))
    }

    pub fn remove_from_blacklist(&self, name: &str) -> CommandResult<String> {
        let mut state = self.state.lock().unwrap();
        let removed = state.rules.remove(&resolve_process_name(name))?;
        self.persist(&state);

        Ok(format!("'{}' removed from the blacklist", removed.name))
    }

    pub fn toggle_auto_kill(&self, name: &str) -> CommandResult<bool> {
        self.with_rules(|rules| rules.toggle_auto_kill(name))
    }

    pub fn toggle_blacklist_log(&self, name: &str) -> CommandResult<bool> {
        self.with_rules(|rules| rules.toggle_log(name))
    }

    pub fn toggle_log_kills_only(&self, name: &str) -> CommandResult<bool> {
        self.with_rules(|rules| rules.toggle_log_kills_only(name))
    }

    /// Stores a clamped CPU threshold, returning the value actually stored
    /// (101 when the clamp disabled the trigger).
    pub fn set_cpu_threshold(&self, name: &str, threshold: u8) -> CommandResult<u8> {
        self.with_rules(|rules| rules.set_cpu_threshold(name, threshold).map(|t| t.raw()))
    }

    pub fn set_gpu_threshold(&self, name: &str, threshold: u8) -> CommandResult<u8> {
        self.with_rules(|rules| rules.set_gpu_threshold(name, threshold).map(|t| t.raw()))
    }

    // ----- Ticks and the activity log -----

    /// Runs one decision engine tick, returning the log entries it produced.
    pub fn check_and_kill_blacklist(&self) -> CollectionResult<Vec<ActivityLogEntry>> {
        self.tick()
    }

    /// One full sample -> evaluate -> act -> log cycle. Called by the
    /// periodic driver and by [`Warden::check_and_kill_blacklist`].
    pub fn tick(&self) -> CollectionResult<Vec<ActivityLogEntry>> {
        let mut collector = self.collector.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        // Reborrow so the rules and log borrows are disjoint fields rather
        // than two mutable borrows through the guard.
        let state = &mut *state;

        let outcome = engine::run_tick(
            &mut *collector,
            &*self.terminator,
            &mut state.rules,
            &mut state.log,
        )?;

        // An entry with logging disabled still bumps its kill count, so an
        // empty entry list alone does not mean nothing changed.
        if !outcome.entries.is_empty() || outcome.kills > 0 {
            self.persist(state);
        }

        Ok(outcome.entries)
    }

    /// Activity log entries, newest first.
    pub fn get_activity_logs(&self) -> Vec<ActivityLogEntry> {
        let mut logs = self.state.lock().unwrap().log.list();
        logs.reverse();
        logs
    }

    pub fn clear_activity_logs(&self) -> String {
        let mut state = self.state.lock().unwrap();
        state.log.clear();
        self.persist(&state);
        "Logs cleared".to_string()
    }

    // ----- Internals -----

    fn with_rules<T>(
        &self, f: impl FnOnce(&mut RuleStore) -> Result<T, StoreError>,
    ) -> CommandResult<T> {
        let mut state = self.state.lock().unwrap();
        let result = f(&mut state.rules)?;
        self.persist(&state);
        Ok(result)
    }

    fn persist(&self, state: &CoreState) {
        if let Some(path) = &self.state_file {
            let snapshot = PersistedState {
                blacklist: state.rules.list(),
                activity_logs: state.log.list(),
            };
            if let Err(err) = state::save(path, &snapshot) {
                warn!("failed to persist state: {err:#}");
            }
        }
    }
}

fn resolve_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|name| resolve_process_name(name))
        .filter(|name| !name.is_empty())
        .collect()
}
