//! Host checks: privilege and tool lookup.

use std::path::PathBuf;

/// True when running with an effective uid of 0.
#[cfg(unix)]
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Find a program in PATH, returning its full path.
/// Names containing a `/` are checked as given.
pub fn find_program(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
