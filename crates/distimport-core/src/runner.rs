//! External tool invocation.
//!
//! Each import step is one call to an external program (rsync, mount, the
//! provisioner CLI). `Runner` is the seam between the workflow and the host,
//! so the workflow can be driven by a recording fake in tests.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::ImportError;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Space-joined command line for logs and error messages (not shell-quoted).
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for a in &self.args {
            line.push(' ');
            line.push_str(&a.to_string_lossy());
        }
        line
    }
}

/// Where a command's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Share the terminal, so progress output reaches the operator.
    Inherit,
    /// Collect stdout/stderr for parsing.
    Capture,
}

/// Exit code and captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn describe_status(&self) -> String {
        match self.code {
            Some(c) => format!("exited with status {c}"),
            None => "was terminated by a signal".to_string(),
        }
    }
}

pub trait Runner {
    fn run(&self, cmd: &ToolCommand, mode: OutputMode) -> io::Result<ToolOutput>;

    /// Full path of `program` if it can be executed.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Runs commands on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, cmd: &ToolCommand, mode: OutputMode) -> io::Result<ToolOutput> {
        let mut command = Command::new(cmd.program());
        command.args(cmd.arguments()).stdin(Stdio::null());
        match mode {
            OutputMode::Inherit => {
                let status = command.status()?;
                Ok(ToolOutput {
                    code: status.code(),
                    ..ToolOutput::default()
                })
            }
            OutputMode::Capture => {
                let out = command.output()?;
                Ok(ToolOutput {
                    code: out.status.code(),
                    stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                })
            }
        }
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        crate::system::find_program(program)
    }
}

/// Run `cmd` and turn spawn failures and non-zero exits into `ImportError`.
/// `what` names the step for the error message.
pub fn run_checked<R: Runner + ?Sized>(
    runner: &R,
    cmd: &ToolCommand,
    mode: OutputMode,
    what: &str,
) -> Result<ToolOutput, ImportError> {
    let line = cmd.display();
    tracing::debug!(command = %line, "running");
    let out = runner.run(cmd, mode).map_err(|err| ImportError::Spawn {
        what: what.to_string(),
        command: line.clone(),
        err,
    })?;
    if !out.success() {
        let stderr = out.stderr.trim();
        if !stderr.is_empty() {
            tracing::debug!(command = %line, "stderr: {}", stderr);
        }
        return Err(ImportError::CommandFailed {
            what: what.to_string(),
            command: line,
            status: out.describe_status(),
        });
    }
    Ok(out)
}
