//! Argument and config file handling, merged into one set of runtime
//! settings. Command-line arguments win over the config file.

pub mod args;
pub mod config;
pub mod error;

use std::{
    fs,
    io::Write,
    num::NonZeroUsize,
    path::PathBuf,
    time::Duration,
};

use clap::ArgMatches;

use crate::{
    rules::{RuleStore, Threshold},
    state,
};
pub use config::Config;
use error::{OptionError, OptionResult};

const DEFAULT_CONFIG_FILE_PATH: &str = "warden/warden.toml";
const DEFAULT_TICK_RATE: Duration = Duration::from_secs(1);
const MINIMUM_TICK_RATE: Duration = Duration::from_millis(250);
const DEFAULT_LOG_LIMIT: usize = 1000;

/// The merged runtime settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigFields {
    pub tick_rate: Duration,
    pub log_limit: Option<NonZeroUsize>,
    pub state_file: Option<PathBuf>,
    pub oneshot: bool,
    pub debug: bool,
}

/// Where the config file lives: an explicit location if one was given,
/// otherwise the platform config dir.
pub fn read_config(config_location: Option<&str>) -> OptionResult<Option<PathBuf>> {
    let config_path = if let Some(conf_loc) = config_location {
        Some(PathBuf::from(conf_loc))
    } else if let Some(config_dir) = dirs::config_dir() {
        let mut path = config_dir;
        path.push(DEFAULT_CONFIG_FILE_PATH);
        Some(path)
    } else {
        None
    };

    Ok(config_path)
}

/// Reads the config file, creating a commented-out default one if it does
/// not exist yet.
pub fn create_or_get_config(config_path: &Option<PathBuf>) -> OptionResult<Config> {
    if let Some(path) = config_path {
        if let Ok(config_string) = fs::read_to_string(path) {
            Ok(toml_edit::de::from_str(config_string.as_str())?)
        } else {
            if let Some(parent_path) = path.parent() {
                fs::create_dir_all(parent_path)?;
            }
            fs::File::create(path)?.write_all(config::DEFAULT_CONFIG_TEXT.as_bytes())?;
            Ok(Config::default())
        }
    } else {
        // Don't write, the config path was somehow None...
        Ok(Config::default())
    }
}

/// Merges arguments and config into [`ConfigFields`].
pub fn init(matches: &ArgMatches, config: &Config) -> OptionResult<ConfigFields> {
    let flags = config.flags.clone().unwrap_or_default();

    let tick_rate = {
        let rate = if let Some(rate) = matches.get_one::<String>("rate") {
            Some(parse_rate(rate).map_err(OptionError::arg)?)
        } else if let Some(rate) = &flags.rate {
            Some(parse_rate(rate).map_err(OptionError::config)?)
        } else {
            None
        };
        rate.unwrap_or(DEFAULT_TICK_RATE)
    };

    if tick_rate < MINIMUM_TICK_RATE {
        return Err(OptionError::arg(
            "set your update rate to be at least 250 milliseconds",
        ));
    }

    let log_limit = match flags.log_limit {
        Some(limit) => NonZeroUsize::new(limit),
        None => NonZeroUsize::new(DEFAULT_LOG_LIMIT),
    };

    let no_persist =
        matches.get_flag("no_persist") || flags.no_persist.unwrap_or(false);
    let state_file = if no_persist {
        None
    } else if let Some(path) = matches.get_one::<String>("state_file") {
        Some(PathBuf::from(path))
    } else if let Some(path) = &flags.state_file {
        Some(path.clone())
    } else {
        state::default_state_path()
    };

    Ok(ConfigFields {
        tick_rate,
        log_limit,
        state_file,
        oneshot: matches.get_flag("oneshot"),
        debug: matches.get_flag("debug") || flags.debug.unwrap_or(false),
    })
}

/// Seeds config-declared blacklist entries into the store, skipping names
/// the persisted state already has. Persisted entries win so that runtime
/// edits (thresholds, kill counts) are not clobbered at startup.
pub fn seed_rules(config: &Config, rules: &mut RuleStore) {
    let Some(seeds) = &config.blacklist else {
        return;
    };

    for seed in seeds {
        let name = crate::commands::resolve_process_name(&seed.name);
        if name.is_empty() || rules.get(&name).is_some() {
            continue;
        }

        let cpu = Threshold::from_raw(seed.cpu_threshold.unwrap_or(Threshold::Disabled.raw()));
        if rules.add(&name, seed.auto_kill, cpu).is_err() {
            continue;
        }
        if let Some(gpu) = seed.gpu_threshold {
            let _ = rules.set_gpu_threshold(&name, gpu);
        }
        if seed.log_enabled == Some(false) {
            let _ = rules.toggle_log(&name);
        }
        if seed.log_kills_only == Some(true) {
            let _ = rules.toggle_log_kills_only(&name);
        }
    }
}

/// Parses a rate as either a number in milliseconds or a "human duration".
fn parse_rate(rate: &str) -> Result<Duration, String> {
    if let Ok(ms) = rate.parse::<u64>() {
        Ok(Duration::from_millis(ms))
    } else {
        humantime::parse_duration(rate)
            .map_err(|err| format!("'{rate}' is an invalid tick rate, {err}"))
    }
}
