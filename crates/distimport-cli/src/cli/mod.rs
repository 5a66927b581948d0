//! CLI for importing an ISO image into Cobbler.

mod commands;

use anyhow::Result;
use clap::Parser;
use distimport_core::config::{self, ImportConfig};
use distimport_core::{logging, system, ImportError};
use std::path::PathBuf;

use commands::run_import;

/// Import a new distro into Cobbler from an ISO image.
#[derive(Debug, Parser)]
#[command(name = "distimport")]
#[command(about = "Import new distro into Cobbler", long_about = None)]
pub struct Cli {
    /// [ HTTP(s) | NFS ] path of an ISO.
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    pub path: String,

    /// Distro architecture, supported are: i386, x86_64, arm.
    #[arg(short = 'a', long = "arch", value_name = "ARCH")]
    pub arch: String,

    /// Nickname for distribution (defaults to the ISO name without `.iso`).
    #[arg(short = 'n', long = "nickname", value_name = "NAME")]
    pub nickname: Option<String>,

    /// Read configuration from this file instead of ~/.config/distimport/config.toml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Expected SHA-256 of the ISO; verified before mounting.
    #[arg(long, value_name = "HEX")]
    pub sha256: Option<String>,

    /// Keep the downloaded ISO after a successful import.
    #[arg(long)]
    pub keep_iso: bool,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = cli.prepare(system::is_root())?;

        if let Err(e) = logging::init_logging(&cfg.log_dir, cfg.log_retention) {
            logging::init_logging_stderr();
            tracing::warn!("file logging unavailable: {:#}", e);
        }
        tracing::info!(args = ?std::env::args().collect::<Vec<_>>(), "run started");
        tracing::debug!("loaded config: {:?}", cfg);

        let result = run_import(&cfg, &cli);
        match &result {
            Ok(()) => tracing::info!("run finished"),
            Err(e) => tracing::error!("{:#}", e),
        }
        result
    }

    /// Root check, then config. Nothing is read or created for non-root
    /// users; logging starts only once this succeeds.
    pub(crate) fn prepare(&self, privileged: bool) -> Result<ImportConfig> {
        require_root(privileged)?;
        match &self.config {
            Some(path) => config::load_from(path),
            None => config::load_or_init(),
        }
    }
}

pub(crate) fn require_root(privileged: bool) -> Result<()> {
    if privileged {
        Ok(())
    } else {
        Err(ImportError::NotRoot.into())
    }
}

/// The line `main` prints to stderr before exiting with status 1.
pub fn error_line(err: &anyhow::Error) -> String {
    format!("distimport error: {:#}", err)
}

#[cfg(test)]
mod tests;
