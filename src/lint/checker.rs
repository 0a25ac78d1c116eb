//! Runs the external line length checker
//!
//! The checker is spawned directly, never through a shell: the file path and
//! the length limit are passed as separate argv entries.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::{DEFAULT_CHECKER, DEFAULT_CHECKER_TIMEOUT};
use crate::lint::error::CheckerError;

/// Trait for producing raw checker output for one file
#[async_trait]
pub trait Checker: Send + Sync {
    /// Runs the checker on `path` and returns everything it wrote to stdout
    async fn run(&self, path: &Path, max_length: u32) -> Result<String, CheckerError>;
}

/// Invokes `lll -l <max_length> <path>` as a subprocess
pub struct LllChecker {
    program: String,
    leading_args: Vec<String>,
    timeout: Duration,
}

impl LllChecker {
    /// Creates a checker running `program`, with `leading_args` placed before
    /// the `-l <max_length> <path>` arguments
    pub fn new(program: impl Into<String>, leading_args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            leading_args,
            timeout,
        }
    }

    fn command(&self, path: &Path, max_length: u32) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .arg("-l")
            .arg(max_length.to_string())
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl Default for LllChecker {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKER, Vec::new(), DEFAULT_CHECKER_TIMEOUT)
    }
}

#[async_trait]
impl Checker for LllChecker {
    async fn run(&self, path: &Path, max_length: u32) -> Result<String, CheckerError> {
        debug!(
            program = %self.program,
            path = %path.display(),
            max_length,
            "running checker"
        );

        let mut command = self.command(path, max_length);

        // Dropping the pending output future on timeout kills the child
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| CheckerError::Timeout {
                program: self.program.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| CheckerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CheckerError::Exit {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(
            program = %self.program,
            stdout_bytes = output.stdout.len(),
            "checker finished"
        );

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
