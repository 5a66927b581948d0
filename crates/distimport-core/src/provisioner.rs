//! The provisioning server's CLI (Cobbler).

use std::path::Path;

use crate::announce;
use crate::arch::Arch;
use crate::error::ImportError;
use crate::runner::{run_checked, OutputMode, Runner, ToolCommand};

pub struct Cobbler<'a, R: Runner + ?Sized> {
    runner: &'a R,
    program: &'a str,
}

impl<'a, R: Runner + ?Sized> Cobbler<'a, R> {
    pub fn new(runner: &'a R, program: &'a str) -> Self {
        Self { runner, program }
    }

    fn command(&self) -> ToolCommand {
        ToolCommand::new(self.program)
    }

    /// Fails unless the CLI can be found.
    pub fn ensure_installed(&self) -> Result<(), ImportError> {
        announce(format!("Check if {} app is installed", self.program));
        match self.runner.locate(self.program) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "found provisioner");
                Ok(())
            }
            None => Err(ImportError::ToolMissing {
                program: self.program.to_string(),
            }),
        }
    }

    /// Names from `cobbler distro list`.
    pub fn distro_list(&self) -> Result<Vec<String>, ImportError> {
        let out = run_checked(
            self.runner,
            &self.command().args(["distro", "list"]),
            OutputMode::Capture,
            "can't list distros",
        )?;
        Ok(parse_distro_list(&out.stdout))
    }

    /// Fails if `name` (or an import of it, `name-<suffix>`) is already listed.
    pub fn ensure_absent(&self, name: &str) -> Result<(), ImportError> {
        announce(format!("Check if {name} is present."));
        let listed = self.distro_list()?;
        if let Some(hit) = listed.iter().find(|d| collides(d, name)) {
            tracing::debug!(existing = %hit, "name collision");
            return Err(ImportError::DistroExists(name.to_string()));
        }
        Ok(())
    }

    /// `cobbler import --path=<mount> --name=<name> --arch=<arch> --kickstart=<ks>`
    pub fn import(
        &self,
        mount: &Path,
        name: &str,
        arch: Arch,
        kickstart: &Path,
    ) -> Result<(), ImportError> {
        let cmd = self.command()
            .arg("import")
            .arg(format!("--path={}", mount.display()))
            .arg(format!("--name={name}"))
            .arg(format!("--arch={arch}"))
            .arg(format!("--kickstart={}", kickstart.display()));
        run_checked(
            self.runner,
            &cmd,
            OutputMode::Inherit,
            &format!("can't import {name} into {}", self.program),
        )?;
        Ok(())
    }

    /// `cobbler sync`, so the provisioner's rsync config picks up the new distro.
    pub fn sync(&self) -> Result<(), ImportError> {
        run_checked(
            self.runner,
            &self.command().arg("sync"),
            OutputMode::Inherit,
            &format!("can't run {} sync command", self.program),
        )?;
        announce(format!("Run {} sync command", self.program));
        Ok(())
    }
}

fn parse_distro_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn collides(existing: &str, name: &str) -> bool {
    existing == name
        || existing
            .strip_prefix(name)
            .is_some_and(|rest| rest.starts_with('-'))
}
