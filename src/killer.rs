//! OS-specific implementations of how to terminate a process.

use thiserror::Error;

use crate::Pid;

#[cfg(target_os = "windows")]
use windows::Win32::{
    Foundation::HANDLE,
    System::Threading::{
        OpenProcess, TerminateProcess, PROCESS_QUERY_INFORMATION, PROCESS_TERMINATE,
    },
};

/// A per-pid termination failure. Never fatal to a tick; the decision
/// engine records these in the activity log and moves on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerminationError {
    #[error("the target process did not exist")]
    NoSuchProcess,
    #[error("missing permissions to terminate the target process")]
    PermissionDenied,
    #[error("termination failed, {0}")]
    Failed(String),
}

pub type TerminationResult<T> = Result<T, TerminationError>;

/// Based from [this SO answer](https://stackoverflow.com/a/55231715).
#[cfg(target_os = "windows")]
struct Process(HANDLE);

#[cfg(target_os = "windows")]
impl Process {
    fn open(pid: u32) -> TerminationResult<Process> {
        match unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_TERMINATE, false, pid) } {
            Ok(process) => Ok(Process(process)),
            Err(_) => Err(TerminationError::NoSuchProcess),
        }
    }

    fn kill(self) -> TerminationResult<()> {
        if unsafe { TerminateProcess(self.0, 1) }.is_err() {
            return Err(TerminationError::PermissionDenied);
        }

        Ok(())
    }
}

/// Kills a process, given a PID, for Windows.
#[cfg(target_os = "windows")]
pub fn kill_process_given_pid(pid: Pid) -> TerminationResult<()> {
    Process::open(pid as u32)?.kill()
}

/// Kills a process, given a PID, for unix. Sends SIGTERM.
#[cfg(target_family = "unix")]
pub fn kill_process_given_pid(pid: Pid) -> TerminationResult<()> {
    let output = unsafe { libc::kill(pid, libc::SIGTERM) };
    if output != 0 {
        let err_code = std::io::Error::last_os_error().raw_os_error();
        return Err(match err_code {
            Some(libc::ESRCH) => TerminationError::NoSuchProcess,
            Some(libc::EPERM) => TerminationError::PermissionDenied,
            Some(code) => TerminationError::Failed(format!("error code {code}")),
            None => TerminationError::Failed("unknown error occurred".to_string()),
        });
    }

    Ok(())
}
