//! Error taxonomy for an import run.
//!
//! Every variant is fatal: the binary prints it and exits non-zero. Variants
//! exist so messages name the step that failed, not to drive recovery.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::http::FetchError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("only root can run this tool")]
    NotRoot,

    #[error("{0} is not valid architecture (supported: i386, x86_64, arm)")]
    UnsupportedArch(String),

    #[error("invalid ISO source {raw}: {reason}")]
    InvalidSource { raw: String, reason: String },

    #[error("{program} is not installed on this system.")]
    ToolMissing { program: String },

    #[error("Directory {} doesn't exist, check why?", .0.display())]
    DownloadDirMissing(PathBuf),

    #[error("kickstart file {} not found", .0.display())]
    KickstartMissing(PathBuf),

    #[error("Distro {0} is already present.")]
    DistroExists(String),

    #[error("{what}: failed to run `{command}`")]
    Spawn {
        what: String,
        command: String,
        #[source]
        err: io::Error,
    },

    #[error("{what}: `{command}` {status}")]
    CommandFailed {
        what: String,
        command: String,
        status: String,
    },

    #[error("can't download {iso}")]
    Download {
        iso: String,
        #[source]
        err: FetchError,
    },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("{what}")]
    Io {
        what: String,
        #[source]
        err: io::Error,
    },
}

impl ImportError {
    pub(crate) fn io(what: impl Into<String>, err: io::Error) -> Self {
        ImportError::Io {
            what: what.into(),
            err,
        }
    }
}
