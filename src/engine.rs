//! The auto-kill decision engine.
//!
//! One [`run_tick`] is one full sample -> evaluate -> act -> log cycle. The
//! engine joins aggregated process groups against the rule store, kills the
//! groups whose armed condition holds, and appends a log entry for every
//! decision. Termination failures are recovered per-pid and never abort the
//! rest of the tick.

use hashbrown::HashMap;

use crate::{
    activity_log::{ActivityLog, ActivityLogEntry},
    collection::error::CollectionResult,
    grouping::{self, ProcessGroup, ProcessSample},
    killer::{self, TerminationResult},
    rules::{BlacklistEntry, RuleStore, Threshold},
    utils::timestamp,
    Pid,
};

/// Something that can produce the current process table. The only blocking
/// call of a tick besides termination.
pub trait SnapshotProvider {
    fn sample_processes(&mut self) -> CollectionResult<Vec<ProcessSample>>;
}

/// Something that can end a process by pid.
pub trait Terminator {
    fn terminate(&self, pid: Pid) -> TerminationResult<()>;
}

/// The real terminator, backed by the OS facilities in [`crate::killer`].
#[derive(Debug, Default)]
pub struct OsTerminator;

impl Terminator for OsTerminator {
    fn terminate(&self, pid: Pid) -> TerminationResult<()> {
        killer::kill_process_given_pid(pid)
    }
}

/// Which armed trigger fired for a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    Cpu(u8),
    Gpu(u8),
}

impl Trigger {
    fn reason(self) -> String {
        match self {
            Trigger::Cpu(threshold) => format!("CPU ≥ {threshold}%"),
            Trigger::Gpu(threshold) => format!("GPU ≥ {threshold}%"),
        }
    }
}

/// Evaluates the armed condition for one entry against its live group:
/// a logical OR across whichever triggers are armed. An entry with both
/// triggers disabled never fires, even with auto-kill on.
fn fired_trigger(entry: &BlacklistEntry, group: &ProcessGroup) -> Option<Trigger> {
    if let Threshold::Armed(threshold) = entry.cpu_threshold {
        if entry.cpu_threshold.exceeded_by(group.total_cpu) {
            return Some(Trigger::Cpu(threshold));
        }
    }
    if let Threshold::Armed(threshold) = entry.gpu_threshold {
        if entry.gpu_threshold.exceeded_by(group.total_gpu) {
            return Some(Trigger::Gpu(threshold));
        }
    }
    None
}

/// What one tick did: the log entries it appended and how many processes
/// it terminated. Kills and entries can diverge, since an entry with
/// logging disabled is still killed.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub entries: Vec<ActivityLogEntry>,
    pub kills: u32,
}

/// Runs one decision engine tick.
///
/// The provider is only consulted when at least one rule exists; a rule
/// whose name has no live processes is skipped outright ("not currently
/// running" is not an event). A provider failure aborts the tick with all
/// state untouched; the scheduler simply retries next tick.
pub fn run_tick<P, T>(
    provider: &mut P, terminator: &T, store: &mut RuleStore, log: &mut ActivityLog,
) -> CollectionResult<TickOutcome>
where
    P: SnapshotProvider + ?Sized,
    T: Terminator + ?Sized,
{
    let names = store.names();
    if names.is_empty() {
        return Ok(TickOutcome::default());
    }

    let samples = provider.sample_processes()?;

    // Per-pid readings, so log entries can carry the observed usage of the
    // exact process they name rather than the group totals.
    let readings: HashMap<Pid, (f32, f32)> = samples
        .iter()
        .map(|s| (s.pid, (s.cpu_percent, s.gpu_percent)))
        .collect();

    let groups: HashMap<String, ProcessGroup> = grouping::group_samples(&samples, Some(&names))
        .into_iter()
        .map(|group| (group.name.to_ascii_lowercase(), group))
        .collect();

    let mut new_entries: Vec<ActivityLogEntry> = Vec::new();
    let mut total_kills: u32 = 0;

    for entry in store.list() {
        let Some(group) = groups.get(&entry.name.to_ascii_lowercase()) else {
            continue;
        };

        let trigger = if entry.auto_kill {
            fired_trigger(&entry, group)
        } else {
            None
        };

        match trigger {
            Some(trigger) => {
                let reason = trigger.reason();
                let mut kills: u32 = 0;

                for &pid in &group.pids {
                    match terminator.terminate(pid) {
                        Ok(()) => {
                            kills += 1;
                            // Kills are never suppressed by log_kills_only;
                            // that flag only gates non-kill detections.
                            if entry.log_enabled {
                                new_entries.push(log_entry(
                                    &entry, pid, &readings, true, &reason,
                                ));
                            }
                        }
                        Err(err) => {
                            debug!(
                                "could not terminate pid {pid} of '{}': {err}",
                                entry.name
                            );
                            if entry.log_enabled {
                                new_entries.push(log_entry(
                                    &entry,
                                    pid,
                                    &readings,
                                    false,
                                    &err.to_string(),
                                ));
                            }
                        }
                    }
                }

                if kills > 0 {
                    info!("killed {kills} process(es) of '{}': {reason}", entry.name);
                    total_kills += kills;
                    let _ = store.increment_kill_count(&entry.name, kills);
                }
            }
            None => {
                if entry.log_enabled && !entry.log_kills_only {
                    for &pid in &group.pids {
                        new_entries.push(log_entry(&entry, pid, &readings, false, "Watching"));
                    }
                }
            }
        }
    }

    for log_item in &new_entries {
        log.append(log_item.clone());
    }

    Ok(TickOutcome {
        entries: new_entries,
        kills: total_kills,
    })
}

fn log_entry(
    entry: &BlacklistEntry, pid: Pid, readings: &HashMap<Pid, (f32, f32)>, was_killed: bool,
    reason: &str,
) -> ActivityLogEntry {
    let (cpu_usage, gpu_usage) = readings.get(&pid).copied().unwrap_or((0.0, 0.0));
    ActivityLogEntry {
        name: entry.name.clone(),
        pid,
        cpu_usage,
        gpu_usage,
        detected_at: timestamp::now(),
        was_killed,
        reason: reason.to_string(),
    }
}
