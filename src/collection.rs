//! The process snapshot provider and system statistics source.
//!
//! This is a wrapper around the sysinfo data source. We use sysinfo for the
//! following data:
//! - Process samples (name, CPU, memory)
//! - Global CPU and memory usage
//! - Disks
//!
//! Per-pid GPU utilization comes from NVML when the `gpu` feature is on.

pub mod error;

#[cfg(feature = "nvidia")]
pub mod nvidia;

use serde::Serialize;

use crate::{engine::SnapshotProvider, grouping::ProcessSample, Pid};
use error::CollectionResult;

/// A wrapper around the sysinfo handles we keep alive between ticks.
/// Keeping one [`sysinfo::System`] across refreshes is what makes the
/// per-process CPU deltas meaningful.
#[derive(Debug)]
pub struct SysinfoSource {
    pub(crate) system: sysinfo::System,
    pub(crate) disks: sysinfo::Disks,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self {
            system: sysinfo::System::new(),
            disks: sysinfo::Disks::new(),
        }
    }
}

/// Aggregate machine statistics for the status surface.
#[derive(Clone, Debug, Serialize)]
pub struct SystemStats {
    pub cpu_usage: f32,
    pub memory_total_gb: f64,
    pub memory_used_gb: f64,
    pub memory_percent: f32,
    pub disks: Vec<DiskInfo>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DiskInfo {
    pub name: String,
    pub mount_point: String,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub usage_percent: f32,
}

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// The live snapshot provider backed by sysinfo.
#[derive(Debug, Default)]
pub struct Collector {
    sys: SysinfoSource,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples every running process. CPU usage is normalized by the number
    /// of logical CPUs so that 100% means the whole machine, matching the
    /// scale thresholds are written in.
    pub fn process_samples(&mut self) -> CollectionResult<Vec<ProcessSample>> {
        self.sys.system.refresh_cpu_all();
        self.sys
            .system
            .refresh_processes(sysinfo::ProcessesToUpdate::All, true);

        let num_cpus = self.sys.system.cpus().len().max(1) as f32;

        #[cfg(feature = "gpu")]
        let gpu_usage = nvidia::gpu_usage_per_pid();

        let samples = self
            .sys
            .system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let pid = pid.as_u32() as Pid;

                #[cfg(feature = "gpu")]
                let gpu_percent = gpu_usage.get(&(pid as u32)).copied().unwrap_or(0.0);
                #[cfg(not(feature = "gpu"))]
                let gpu_percent = 0.0;

                ProcessSample {
                    pid,
                    name: sample_name(process),
                    cpu_percent: process.cpu_usage() / num_cpus,
                    memory_kb: process.memory() / 1024,
                    gpu_percent,
                }
            })
            .collect();

        Ok(samples)
    }

    /// Aggregate CPU%, memory totals, and per-disk usage.
    pub fn system_stats(&mut self) -> SystemStats {
        self.sys.system.refresh_cpu_all();
        self.sys.system.refresh_memory();
        self.sys.disks.refresh(true);

        let memory_total = self.sys.system.total_memory();
        let memory_used = self.sys.system.used_memory();

        let disks = self
            .sys
            .disks
            .list()
            .iter()
            .map(|disk| {
                let total = disk.total_space();
                let free = disk.available_space();
                let used = total.saturating_sub(free);
                DiskInfo {
                    name: disk.name().to_string_lossy().to_string(),
                    mount_point: disk.mount_point().to_string_lossy().to_string(),
                    total_gb: total as f64 / BYTES_PER_GB,
                    used_gb: used as f64 / BYTES_PER_GB,
                    free_gb: free as f64 / BYTES_PER_GB,
                    usage_percent: if total > 0 {
                        (used as f32 / total as f32) * 100.0
                    } else {
                        0.0
                    },
                }
            })
            .collect();

        SystemStats {
            cpu_usage: self.sys.system.global_cpu_usage(),
            memory_total_gb: memory_total as f64 / BYTES_PER_GB,
            memory_used_gb: memory_used as f64 / BYTES_PER_GB,
            memory_percent: if memory_total > 0 {
                (memory_used as f32 / memory_total as f32) * 100.0
            } else {
                0.0
            },
            disks,
        }
    }
}

impl SnapshotProvider for Collector {
    fn sample_processes(&mut self) -> CollectionResult<Vec<ProcessSample>> {
        self.process_samples()
    }
}

/// The name a process is grouped and matched under.
///
/// On Linux the reported name is the kernel `comm` value, truncated to 15
/// bytes, so a rule for a longer binary name could never match; when the
/// name looks truncated, the cmdline basename is used instead.
fn sample_name(process: &sysinfo::Process) -> String {
    let name = process.name().to_string_lossy();

    #[cfg(target_os = "linux")]
    if let Some(full_name) = untruncated_name(&name, process.cmd()) {
        return full_name;
    }

    name.into_owned()
}

#[cfg(target_os = "linux")]
fn untruncated_name(comm: &str, cmd: &[std::ffi::OsString]) -> Option<String> {
    const MAX_COMM_LEN: usize = 15;

    if comm.len() < MAX_COMM_LEN {
        return None;
    }

    // Processes rewrite argv[0]; only trust a basename that extends the
    // comm value.
    let base = std::path::Path::new(cmd.first()?)
        .file_name()?
        .to_string_lossy();
    base.starts_with(comm).then(|| base.into_owned())
}
