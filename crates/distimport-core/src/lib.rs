pub mod config;
pub mod error;
pub mod logging;

pub mod arch;
pub mod checksum;
pub mod fetch;
pub mod mount;
pub mod provisioner;
pub mod runner;
pub mod source;
pub mod storage;
pub mod system;
pub mod workflow;

pub use error::ImportError;

/// Print a step to the operator and record it in the run log.
pub(crate) fn announce(msg: impl AsRef<str>) {
    let msg = msg.as_ref();
    println!("{msg}");
    tracing::info!("{msg}");
}
