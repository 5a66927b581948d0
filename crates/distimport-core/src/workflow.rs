//! The import procedure, step by step.
//!
//! Steps run strictly in order and the first failure ends the run. A failure
//! after the image is mounted still unmounts it and removes the downloaded
//! file (best effort) before the error is returned.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::announce;
use crate::arch::Arch;
use crate::checksum;
use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::fetch::{self, FetchedIso};
use crate::mount::LoopMount;
use crate::provisioner::Cobbler;
use crate::runner::Runner;
use crate::source::IsoSource;

/// What to import.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub source: IsoSource,
    pub arch: Arch,
    /// Name to import under; defaults to the source's distro name.
    pub nickname: Option<String>,
    /// Expected SHA-256 of the image, hex.
    pub sha256: Option<String>,
    /// Leave the downloaded image in the download directory.
    pub keep_iso: bool,
}

impl ImportRequest {
    pub fn new(source: IsoSource, arch: Arch) -> Self {
        Self {
            source,
            arch,
            nickname: None,
            sha256: None,
            keep_iso: false,
        }
    }

    /// The distro name passed to the import command.
    pub fn import_name(&self) -> String {
        self.nickname
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.source.distro_name())
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub name: String,
    pub arch: Arch,
    pub iso: PathBuf,
    pub mount_dir: PathBuf,
    pub iso_kept: bool,
}

pub struct Importer<'a, R: Runner + ?Sized> {
    cfg: &'a ImportConfig,
    runner: &'a R,
}

impl<'a, R: Runner + ?Sized> Importer<'a, R> {
    pub fn new(cfg: &'a ImportConfig, runner: &'a R) -> Self {
        Self { cfg, runner }
    }

    pub fn run(&self, req: &ImportRequest) -> Result<ImportReport, ImportError> {
        let cobbler = Cobbler::new(self.runner, &self.cfg.provisioner);
        let name = req.import_name();
        validate_name(&name)?;
        tracing::info!(source = %req.source, arch = %req.arch, name = %name, "import requested");

        let download_dir = fetch::locate_download_dir(&self.cfg.download_dir);
        cobbler.ensure_installed()?;
        if !self.cfg.kickstart.is_file() {
            return Err(ImportError::KickstartMissing(self.cfg.kickstart.clone()));
        }
        cobbler.ensure_absent(&name)?;

        let fetched = fetch::fetch_iso(&req.source, &download_dir, self.cfg, self.runner)?;
        let iso = IsoGuard::new(fetched, req.keep_iso);

        if let Some(expected) = &req.sha256 {
            checksum::verify_sha256(iso.path(), expected)?;
            announce(format!("{} matches the expected SHA-256", iso.path().display()));
        }

        let mut mount = LoopMount::prepare(self.runner, &self.cfg.mount_root, &req.source.distro_name())?;
        mount.attach(iso.path())?;

        cobbler.import(mount.dir(), &name, req.arch, &self.cfg.kickstart)?;
        announce(format!(
            "{name} was imported into {}, still it's good to check import logs in {}",
            self.cfg.provisioner,
            self.cfg.task_log_dir.display()
        ));

        let mount_dir = mount.dir().to_path_buf();
        mount.release()?;
        let (iso_path, iso_kept) = iso.finish()?;

        cobbler.sync()?;

        Ok(ImportReport {
            name,
            arch: req.arch,
            iso: iso_path,
            mount_dir,
            iso_kept,
        })
    }
}

/// The name ends up as a directory name and a command argument.
fn validate_name(name: &str) -> Result<(), ImportError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.chars().any(|c| c.is_whitespace() || c.is_control());
    if bad {
        return Err(ImportError::InvalidSource {
            raw: name.to_string(),
            reason: "not usable as a distro name".to_string(),
        });
    }
    Ok(())
}

/// Removes the downloaded image on drop unless it is kept or was not ours.
struct IsoGuard {
    fetched: FetchedIso,
    keep: bool,
    done: bool,
}

impl IsoGuard {
    fn new(fetched: FetchedIso, keep: bool) -> Self {
        Self {
            fetched,
            keep,
            done: false,
        }
    }

    fn path(&self) -> &Path {
        &self.fetched.path
    }

    fn removable(&self) -> bool {
        self.fetched.owned && !self.keep
    }

    /// Remove the image (if ours); failure is fatal. Returns (path, kept).
    fn finish(mut self) -> Result<(PathBuf, bool), ImportError> {
        self.done = true;
        let path = self.fetched.path.clone();
        if !self.removable() {
            return Ok((path, true));
        }
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ImportError::io(format!("can't remove {}", path.display()), e));
            }
        }
        announce(format!("Remove {}", path.display()));
        Ok((path, false))
    }
}

impl Drop for IsoGuard {
    fn drop(&mut self) {
        if self.done || !self.removable() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.fetched.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.fetched.path.display(), "cleanup failed: {}", e);
            }
        }
    }
}
