//! Aggregation of raw process samples into name-keyed groups.
//!
//! A group is the unit the decision engine reasons about: all live processes
//! sharing one name, with their resource usage *summed* (aggregate load, not
//! a per-process average). Name matching is a case-insensitive exact match;
//! the group key preserves the casing of the first sample seen.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::Pid;

/// A single process observation, produced fresh each tick and never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    /// The pid of the process.
    pub pid: Pid,

    /// The name of the process.
    pub name: String,

    /// CPU usage as a percentage, normalized by the number of logical CPUs.
    pub cpu_percent: f32,

    /// Memory usage in KiB.
    pub memory_kb: u64,

    /// GPU utilization as a percentage. Zero when no GPU data is available.
    pub gpu_percent: f32,
}

/// The aggregate of all live processes sharing one name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessGroup {
    pub name: String,
    pub pids: Vec<Pid>,
    pub process_count: usize,
    pub total_cpu: f32,
    pub total_memory_kb: u64,
    pub total_gpu: f32,
}

impl ProcessGroup {
    fn new(name: String) -> Self {
        ProcessGroup {
            name,
            pids: Vec::new(),
            process_count: 0,
            total_cpu: 0.0,
            total_memory_kb: 0,
            total_gpu: 0.0,
        }
    }

    fn absorb(&mut self, sample: &ProcessSample) {
        self.pids.push(sample.pid);
        self.process_count += 1;
        self.total_cpu += sample.cpu_percent;
        self.total_memory_kb += sample.memory_kb;
        self.total_gpu += sample.gpu_percent;
    }
}

/// Whether a live process name matches a configured name.
#[inline]
pub fn matches_name(process_name: &str, wanted: &str) -> bool {
    process_name.eq_ignore_ascii_case(wanted)
}

/// Groups `samples` by process name, keeping only names present in `filter`
/// (or every name when `filter` is `None`). Groups are ordered by
/// `total_cpu`, highest first.
///
/// An empty filter returns an empty list; callers are expected to check this
/// *before* sampling so that an empty watch set never hits the OS at all.
pub fn group_samples(samples: &[ProcessSample], filter: Option<&[String]>) -> Vec<ProcessGroup> {
    if matches!(filter, Some(f) if f.is_empty()) {
        return Vec::new();
    }

    let mut groups: HashMap<String, ProcessGroup> = HashMap::new();

    for sample in samples {
        if let Some(wanted_names) = filter {
            if !wanted_names.iter().any(|w| matches_name(&sample.name, w)) {
                continue;
            }
        }

        groups
            .entry(sample.name.to_ascii_lowercase())
            .or_insert_with(|| ProcessGroup::new(sample.name.clone()))
            .absorb(sample);
    }

    let mut result: Vec<ProcessGroup> = groups.into_values().collect();
    result.sort_by(|a, b| {
        b.total_cpu
            .partial_cmp(&a.total_cpu)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    result
}
