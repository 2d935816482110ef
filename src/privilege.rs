//! A read-only probe for whether we run with administrative rights.
//!
//! This is informational only: the decision engine always *attempts* a
//! termination and relies on the reported failure, never on a pre-check.

/// Whether the current execution context is elevated (root on unix, an
/// elevated token on Windows).
#[cfg(target_family = "unix")]
pub fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

/// Whether the current execution context is elevated (root on unix, an
/// elevated token on Windows).
#[cfg(target_os = "windows")]
pub fn is_elevated() -> bool {
    use std::mem;

    use windows::Win32::{
        Foundation::{CloseHandle, HANDLE},
        Security::{GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY},
        System::Threading::{GetCurrentProcess, OpenProcessToken},
    };

    unsafe {
        let mut token = HANDLE::default();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
            return false;
        }

        let mut elevation = TOKEN_ELEVATION::default();
        let mut size = mem::size_of::<TOKEN_ELEVATION>() as u32;
        let result = GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut _ as *mut _),
            size,
            &mut size,
        );
        let _ = CloseHandle(token);

        result.is_ok() && elevation.TokenIsElevated != 0
    }
}
