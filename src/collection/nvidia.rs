//! Per-pid GPU utilization from NVIDIA cards via NVML.

use std::sync::OnceLock;

use hashbrown::HashMap;
use nvml_wrapper::{error::NvmlError, Nvml};

static NVML_DATA: OnceLock<Result<Nvml, NvmlError>> = OnceLock::new();

/// Wrapper around Nvml::init.
///
/// On Linux, if `Nvml::init()` fails, this function attempts to explicitly
/// load the library from `libnvidia-ml.so.1`. On other platforms, it simply
/// calls `Nvml::init`.
fn init_nvml() -> Result<Nvml, NvmlError> {
    #[cfg(not(target_os = "linux"))]
    let res = Nvml::init();

    #[cfg(target_os = "linux")]
    let res = match Nvml::init() {
        Ok(nvml) => Ok(nvml),
        Err(_) => Nvml::builder()
            .lib_path(std::ffi::OsStr::new("libnvidia-ml.so.1"))
            .init(),
    };

    if let Err(e) = &res {
        log::warn!("Failed to initialize NVML, GPU thresholds will never fire: {e}");
    }

    res
}

/// The summed GPU engine utilization (sm + encode + decode) per pid, across
/// every device. Empty when NVML is unavailable: a missing reading is "no
/// GPU load", never an error.
pub fn gpu_usage_per_pid() -> HashMap<u32, f32> {
    let mut usage: HashMap<u32, f32> = HashMap::new();

    if let Ok(nvml) = NVML_DATA.get_or_init(init_nvml) {
        if let Ok(num_gpu) = nvml.device_count() {
            for i in 0..num_gpu {
                if let Ok(device) = nvml.device_by_index(i) {
                    if let Ok(gpu_procs) = device.process_utilization_stats(None) {
                        for proc in gpu_procs {
                            let gpu_util = proc.sm_util + proc.enc_util + proc.dec_util;
                            *usage.entry(proc.pid).or_insert(0.0) += gpu_util as f32;
                        }
                    }
                }
            }
        }
    }

    usage
}
