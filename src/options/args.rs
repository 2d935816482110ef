//! The argument table.

use clap::{Arg, ArgAction, ArgMatches, Command};

const TEMPLATE: &str = "\
{name} {version}

{about}

{usage-heading} {usage}

{all-args}";

const USAGE: &str = "warden [OPTIONS]";

pub fn get_matches() -> ArgMatches {
    build_app().get_matches()
}

pub fn build_app() -> Command {
    let config_location = Arg::new("config_location")
        .short('C')
        .long("config")
        .action(ArgAction::Set)
        .value_name("CONFIG PATH")
        .help("Sets the location of the config file.")
        .long_help(
            "Sets the location of the config file. Expects a config file in the TOML format. \
             If it doesn't exist, one is created.",
        );

    let rate = Arg::new("rate")
        .short('r')
        .long("rate")
        .action(ArgAction::Set)
        .value_name("TIME")
        .help("Sets how often the decision engine ticks.")
        .long_help(
            "Sets how often the decision engine samples processes and evaluates the blacklist. \
             Either a number in milliseconds or a 'human duration' (e.g. 1s, 2500ms). \
             Must be at least 250 milliseconds; defaults to 1s.",
        );

    let state_file = Arg::new("state_file")
        .short('s')
        .long("state")
        .action(ArgAction::Set)
        .value_name("STATE PATH")
        .help("Sets where the blacklist and activity log are persisted.")
        .long_help(
            "Sets where the blacklist and activity log are persisted between runs. \
             Defaults to a 'warden/state.json' under the platform's local data directory.",
        );

    let no_persist = Arg::new("no_persist")
        .long("no_persist")
        .action(ArgAction::SetTrue)
        .help("Disables state persistence entirely.");

    let oneshot = Arg::new("oneshot")
        .long("oneshot")
        .action(ArgAction::SetTrue)
        .help("Runs a single evaluation tick and exits.")
        .long_help(
            "Runs a single evaluation tick and exits instead of scheduling ticks at the \
             configured rate. Useful for cron-style setups and scripting.",
        );

    let debug = Arg::new("debug")
        .long("debug")
        .action(ArgAction::SetTrue)
        .help("Enables debug logging to warden_debug.log.");

    Command::new("warden")
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            "A process watchdog that samples running processes, evaluates them against a \
             blacklist, and terminates the ones that break their resource rules.",
        )
        .override_usage(USAGE)
        .help_template(TEMPLATE)
        .arg(config_location)
        .arg(rate)
        .arg(state_file)
        .arg(no_persist)
        .arg(oneshot)
        .arg(debug)
}
