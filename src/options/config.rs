//! The TOML config file layout.

use std::path::PathBuf;

use serde::Deserialize;

/// What a brand-new config file gets seeded with: everything commented out.
pub const DEFAULT_CONFIG_TEXT: &str = r##"# This is warden's config file.
# All of these options can also be set from the command line, which wins over
# the file when both are given.

# [flags]
# How often the decision engine ticks. At least 250ms.
# rate = "1s"
# How many activity log entries to retain; 0 means unbounded.
# log_limit = 1000
# Where to persist the blacklist and activity log between runs.
# state_file = "/path/to/state.json"
# Disable persistence entirely.
# no_persist = false

# Blacklist entries created at startup when not already present in the
# persisted state. Thresholds are percentages; anything above 100 disables
# the trigger.
#
# [[blacklist]]
# name = "miner"
# auto_kill = true
# cpu_threshold = 30
# gpu_threshold = 101
"##;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    pub flags: Option<FlagConfig>,
    pub blacklist: Option<Vec<BlacklistSeed>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FlagConfig {
    pub rate: Option<String>,
    pub log_limit: Option<usize>,
    pub state_file: Option<PathBuf>,
    pub no_persist: Option<bool>,
    pub debug: Option<bool>,
}

/// A blacklist entry as it appears in the config file. Only `name` is
/// required; unset fields take the same defaults as `add_to_blacklist`.
#[derive(Clone, Debug, Deserialize)]
pub struct BlacklistSeed {
    pub name: String,
    #[serde(default)]
    pub auto_kill: bool,
    pub cpu_threshold: Option<u8>,
    pub gpu_threshold: Option<u8>,
    pub log_enabled: Option<bool>,
    pub log_kills_only: Option<bool>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_text_is_all_comments() {
        let config: Config = toml_edit::de::from_str(DEFAULT_CONFIG_TEXT).unwrap();
        assert!(config.flags.is_none());
        assert!(config.blacklist.is_none());
    }

    #[test]
    fn parses_flags_and_seeds() {
        let config: Config = toml_edit::de::from_str(
            r#"
                [flags]
                rate = "2s"
                log_limit = 50

                [[blacklist]]
                name = "miner"
                auto_kill = true
                cpu_threshold = 30

                [[blacklist]]
                name = "updater"
            "#,
        )
        .unwrap();

        let flags = config.flags.unwrap();
        assert_eq!(flags.rate.as_deref(), Some("2s"));
        assert_eq!(flags.log_limit, Some(50));

        let seeds = config.blacklist.unwrap();
        assert_eq!(seeds.len(), 2);
        assert!(seeds[0].auto_kill);
        assert_eq!(seeds[0].cpu_threshold, Some(30));
        assert!(!seeds[1].auto_kill);
        assert_eq!(seeds[1].cpu_threshold, None);
    }
}
