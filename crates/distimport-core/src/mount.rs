//! Temporary loop mount of an image.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::announce;
use crate::error::ImportError;
use crate::runner::{run_checked, OutputMode, Runner, ToolCommand};

/// Mount point `<mount_root>/<distro_name>`.
///
/// Unmounts (if mounted) and removes the directory (if this guard created it)
/// on drop, unless `release` already did so.
pub struct LoopMount<'a, R: Runner + ?Sized> {
    runner: &'a R,
    dir: PathBuf,
    created: bool,
    mounted: bool,
    released: bool,
}

impl<'a, R: Runner + ?Sized> LoopMount<'a, R> {
    /// Create the mount point directory if it does not exist yet.
    pub fn prepare(runner: &'a R, mount_root: &Path, distro_name: &str) -> Result<Self, ImportError> {
        let dir = mount_root.join(distro_name);
        let mut created = false;
        if !dir.exists() {
            announce(format!("Creating temp mount point {}", dir.display()));
            fs::create_dir_all(&dir).map_err(|e| {
                ImportError::io(format!("can't create temp mount point {}", dir.display()), e)
            })?;
            created = true;
        }
        Ok(Self {
            runner,
            dir,
            created,
            mounted: false,
            released: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `mount -o loop <iso> <dir>`
    pub fn attach(&mut self, iso: &Path) -> Result<(), ImportError> {
        let cmd = ToolCommand::new("mount")
            .args(["-o", "loop"])
            .arg(iso)
            .arg(&self.dir);
        run_checked(
            self.runner,
            &cmd,
            OutputMode::Capture,
            &format!("can't mount {}", iso.display()),
        )?;
        self.mounted = true;
        announce(format!(
            "{} is loop mounted to {}",
            iso.display(),
            self.dir.display()
        ));
        Ok(())
    }

    /// Unmount and remove the mount point; any failure is fatal.
    pub fn release(mut self) -> Result<(), ImportError> {
        self.released = true;
        if self.mounted {
            run_checked(
                self.runner,
                &umount_command(&self.dir),
                OutputMode::Capture,
                &format!("can't umount {}", self.dir.display()),
            )?;
            self.mounted = false;
            announce(format!("Unmount {}", self.dir.display()));
        }
        fs::remove_dir(&self.dir).map_err(|e| {
            ImportError::io(format!("can't remove directory {}", self.dir.display()), e)
        })?;
        announce(format!("Remove directory {}", self.dir.display()));
        Ok(())
    }
}

impl<R: Runner + ?Sized> Drop for LoopMount<'_, R> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if self.mounted {
            match self.runner.run(&umount_command(&self.dir), OutputMode::Capture) {
                Ok(out) if out.success() => {}
                Ok(out) => {
                    tracing::warn!(dir = %self.dir.display(), "cleanup umount {}", out.describe_status());
                    return;
                }
                Err(e) => {
                    tracing::warn!(dir = %self.dir.display(), "cleanup umount failed: {}", e);
                    return;
                }
            }
        }
        if self.created {
            if let Err(e) = fs::remove_dir(&self.dir) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(dir = %self.dir.display(), "cleanup rmdir failed: {}", e);
                }
            }
        }
    }
}

fn umount_command(dir: &Path) -> ToolCommand {
    ToolCommand::new("umount").arg(dir)
}
