//! Process execution for bumper.
//!
//! Every external program bumper touches (git, npm, cargo) goes through the
//! [`CommandRunner`] trait so the release engine can be driven by a fake in
//! tests. [`SystemRunner`] is the real implementation.
//!
//! # Example
//!
//! ```ignore
//! use bumper_process::{CommandRunner, SystemRunner};
//!
//! let mut runner = SystemRunner::new(".");
//! let result = runner.run("git", &["--version"]).expect("run");
//! assert!(result.success);
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Result of a command execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code (if available)
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Duration of execution
    pub duration_ms: u64,
}

impl CommandResult {
    /// A successful result carrying the given stdout.
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// A failed result carrying the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    /// Check if the command succeeded
    pub fn ok(&self) -> Result<&Self> {
        if self.success {
            Ok(self)
        } else {
            Err(anyhow::anyhow!(
                "command failed with exit code {:?}: {}",
                self.exit_code,
                self.stderr.trim()
            ))
        }
    }

    /// Create a result from a process output
    pub fn from_output(output: &Output, duration: Duration) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// Narrow seam over external process execution.
///
/// Implementations only report what happened; deciding whether a non-zero
/// exit is fatal is left to the caller (usually via [`CommandResult::ok`]).
pub trait CommandRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> Result<CommandResult>;
}

/// Runs commands for real, inside a fixed working directory.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    dir: PathBuf,
}

impl SystemRunner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> Result<CommandResult> {
        run_command_in_dir(program, args, &self.dir)
    }
}

/// Run a command in a specific directory
pub fn run_command_in_dir(program: &str, args: &[&str], dir: &Path) -> Result<CommandResult> {
    let start = Instant::now();

    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| {
            format!(
                "failed to run command: {} {:?} in {}",
                program,
                args,
                dir.display()
            )
        })?;

    Ok(CommandResult::from_output(&output, start.elapsed()))
}

/// Get the full path to a command
pub fn which(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

/// Resolve the program to invoke for a tool.
///
/// An explicit override in `env_var` always wins. Otherwise the tool is
/// looked up on PATH, falling back to the bare name so the spawn error
/// names the missing tool.
pub fn resolve_program(env_var: &str, default: &str) -> String {
    if let Ok(bin) = env::var(env_var)
        && !bin.trim().is_empty()
    {
        return bin;
    }

    which(default)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| default.to_string())
}
