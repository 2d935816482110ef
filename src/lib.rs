//! warden watches the process table and enforces user-declared blacklist
//! rules: "kill X if its CPU goes over N%". The decision engine samples,
//! groups, evaluates, kills, and logs once per tick; everything else is
//! plumbing around that loop.

#![warn(rust_2018_idioms)]
#[allow(unused_imports)]
#[macro_use]
extern crate log;

pub mod utils {
    pub mod logging;
    pub mod timestamp;
}
pub mod activity_log;
pub mod collection;
pub mod commands;
pub mod engine;
pub mod grouping;
pub mod killer;
pub mod options;
pub mod privilege;
pub mod rules;
pub mod state;

use std::{
    sync::{Arc, Condvar, Mutex},
    thread,
    time::Duration,
};

use commands::Warden;

cfg_if::cfg_if! {
    if #[cfg(target_family = "windows")] {
        /// A Windows process ID.
        pub type Pid = usize;
    } else if #[cfg(target_family = "unix")] {
        /// A UNIX process ID.
        pub type Pid = libc::pid_t;
    }
}

/// Spawns the periodic tick driver.
///
/// Ticks run sequentially in this one thread, so they can never overlap no
/// matter how long a termination call stalls; pacing only begins once the
/// previous tick has finished. A failed tick is logged and scheduling
/// continues. Flipping the termination lock and notifying the cvar stops
/// the thread before its *next* tick; an in-flight tick always completes.
pub fn create_tick_thread(
    warden: Arc<Warden>, termination_ctrl_lock: Arc<Mutex<bool>>,
    termination_ctrl_cvar: Arc<Condvar>, tick_rate: Duration,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        loop {
            // Check once at the very top...
            if let Ok(is_terminated) = termination_ctrl_lock.try_lock() {
                // We don't block here.
                if *is_terminated {
                    drop(is_terminated);
                    break;
                }
            }

            match warden.tick() {
                Ok(entries) => {
                    if !entries.is_empty() {
                        debug!("tick appended {} activity log entries", entries.len());
                    }
                }
                Err(err) => {
                    warn!("tick skipped: {err}");
                }
            }

            if let Ok((is_terminated, _wait_timeout_result)) = termination_ctrl_cvar
                .wait_timeout(termination_ctrl_lock.lock().unwrap(), tick_rate)
            {
                if *is_terminated {
                    drop(is_terminated);
                    break;
                }
            }
        }
    })
}
