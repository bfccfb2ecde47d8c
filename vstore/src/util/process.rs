//! External command execution.
//!
//! Every shell-out (mount, umount, volume queries) goes through
//! [`CommandRunner`] so tests can script the host's behavior.

use std::fmt::Debug;
use std::path::Path;
use std::process::Command;

use vstore_shared::errors::{VstoreError, VstoreResult};

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn succeeded(&self) -> bool {
        self.code == Some(0)
    }

    /// Short human-readable reason for a failed run.
    pub fn fail_reason(&self) -> String {
        let detail = self.stderr.trim();
        match self.code {
            Some(code) if detail.is_empty() => format!("exited with code {}", code),
            Some(code) => format!("exited with code {}: {}", code, detail),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external programs to completion.
pub trait CommandRunner: Send + Sync + Debug {
    /// Run `program` with `args`, optionally inside `cwd`.
    ///
    /// Returns `Err` only when the program could not be started; a non-zero
    /// exit is reported through [`CommandOutput::code`].
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> VstoreResult<CommandOutput>;
}

/// Runs commands on the local host with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> VstoreResult<CommandOutput> {
        tracing::debug!(program, ?args, "Running command");

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .map_err(|e| VstoreError::Command(format!("Failed to run {}: {}", program, e)))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
