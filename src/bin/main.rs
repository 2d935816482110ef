#![warn(rust_2018_idioms)]
#[allow(unused_imports)]
#[macro_use]
extern crate log;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex,
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use itertools::Itertools;
use warden::{
    activity_log::ActivityLog,
    commands::Warden,
    create_tick_thread, options, privilege,
    rules::RuleStore,
    state, utils,
};

fn main() -> Result<()> {
    let matches = options::args::get_matches();

    let config_path = options::read_config(
        matches
            .get_one::<String>("config_location")
            .map(|s| s.as_str()),
    )
    .context("Unable to access the given config file location.")?;
    let config = options::create_or_get_config(&config_path)
        .context("Unable to properly parse or create the config file.")?;

    let fields = options::init(&matches, &config)?;

    let (min_level, debug_file) = if fields.debug {
        (
            log::LevelFilter::Debug,
            Some(std::path::Path::new("warden_debug.log")),
        )
    } else {
        (log::LevelFilter::Info, None)
    };
    utils::logging::init_logger(min_level, debug_file)
        .context("Unable to initialize the logger.")?;

    // Restore persisted state, then layer config-declared entries on top.
    let persisted = fields
        .state_file
        .as_deref()
        .map(state::load)
        .unwrap_or_default();
    let mut rules = RuleStore::from_entries(persisted.blacklist);
    options::seed_rules(&config, &mut rules);

    let mut log = ActivityLog::with_limit(fields.log_limit);
    log.restore(persisted.activity_logs);

    info!(
        "watching {} blacklisted name(s), ticking every {}",
        rules.len(),
        humantime::format_duration(fields.tick_rate)
    );
    if !rules.is_empty() {
        debug!("blacklist: {}", rules.names().iter().join(", "));
    }
    if !privilege::is_elevated() {
        info!(
            "running without administrative rights; terminating protected processes may fail"
        );
    }

    let warden = Arc::new(Warden::new(rules, log, fields.state_file.clone()));

    if fields.oneshot {
        let entries = warden
            .check_and_kill_blacklist()
            .context("The snapshot provider failed.")?;
        info!("oneshot tick complete, {} log entries", entries.len());
        return Ok(());
    }

    // Create termination mutex and cvar
    #[allow(clippy::mutex_atomic)]
    let thread_termination_lock = Arc::new(Mutex::new(false));
    let thread_termination_cvar = Arc::new(Condvar::new());

    let tick_thread = create_tick_thread(
        warden.clone(),
        thread_termination_lock.clone(),
        thread_termination_cvar.clone(),
        fields.tick_rate,
    );

    // Set termination hook
    let is_terminated = Arc::new(AtomicBool::new(false));
    let ist_clone = is_terminated.clone();
    ctrlc::set_handler(move || {
        ist_clone.store(true, Ordering::SeqCst);
    })?;

    while !is_terminated.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }

    info!("shutting down");
    *thread_termination_lock.lock().unwrap() = true;
    thread_termination_cvar.notify_all();
    let _ = tick_thread.join();

    Ok(())
}
