//! Git operations for bumper.
//!
//! This crate reads commit history for changelog generation and performs the
//! release side effects (stage, commit, tag, push). All git invocations go
//! through a [`CommandRunner`], so callers can substitute a fake.
//!
//! # Example
//!
//! ```ignore
//! use bumper_git::GitCli;
//! use bumper_process::SystemRunner;
//!
//! let git = GitCli::from_env();
//! let mut runner = SystemRunner::new(".");
//! for commit in git.log_commits(&mut runner, 10)? {
//!     println!("{} {}", commit.abbrev_hash, commit.subject);
//! }
//! ```

use anyhow::{Context, Result, bail};
use bumper_process::{CommandResult, CommandRunner, resolve_program};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the git binary.
pub const GIT_BIN_ENV: &str = "BUMPER_GIT_BIN";

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

/// `git log` pretty format producing one record per commit.
const LOG_FORMAT: &str = "--format=%H%x1f%h%x1f%s%x1f%an%x1f%aI%x1e";

/// `git log` pretty format producing one full message per commit.
const MESSAGE_FORMAT: &str = "--format=%B%x1e";

/// One row of version-control history, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Full commit hash
    pub hash: String,
    /// Abbreviated commit hash
    pub abbrev_hash: String,
    /// First line of the commit message
    pub subject: String,
    /// Author name
    pub author_name: String,
    /// Author date (ISO 8601, strict)
    pub author_date: String,
}

/// Thin wrapper over the git command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve git from `BUMPER_GIT_BIN`, then PATH.
    pub fn from_env() -> Self {
        Self::new(resolve_program(GIT_BIN_ENV, "git"))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, runner: &mut dyn CommandRunner, args: &[&str]) -> Result<CommandResult> {
        let result = runner.run(&self.program, args)?;
        result
            .ok()
            .with_context(|| format!("git {} failed", args.first().copied().unwrap_or("")))?;
        Ok(result)
    }

    /// Fetch up to `number` commits reachable from HEAD, newest first.
    pub fn log_commits(
        &self,
        runner: &mut dyn CommandRunner,
        number: usize,
    ) -> Result<Vec<CommitRecord>> {
        let count = format!("-n{number}");
        let out = self
            .run(runner, &["log", &count, LOG_FORMAT])
            .context("failed to read git history")?;
        parse_log(&out.stdout)
    }

    /// Most recent tag reachable from HEAD, if any.
    pub fn last_tag(&self, runner: &mut dyn CommandRunner) -> Result<Option<String>> {
        let out = runner.run(&self.program, &["describe", "--tags", "--abbrev=0"])?;
        if !out.success {
            return Ok(None);
        }
        let tag = out.stdout.trim();
        Ok((!tag.is_empty()).then(|| tag.to_string()))
    }

    /// Full commit messages since the most recent tag, newest first.
    ///
    /// With no tag the whole history is returned.
    pub fn messages_since_last_tag(&self, runner: &mut dyn CommandRunner) -> Result<Vec<String>> {
        let range = self.last_tag(runner)?.map(|tag| format!("{tag}..HEAD"));
        let mut args = vec!["log"];
        if let Some(range) = range.as_deref() {
            args.push(range);
        }
        args.push(MESSAGE_FORMAT);

        let out = self
            .run(runner, &args)
            .context("failed to read commit messages")?;
        Ok(parse_messages(&out.stdout))
    }

    pub fn add(&self, runner: &mut dyn CommandRunner, paths: &[&str]) -> Result<()> {
        let mut args = vec!["add", "--"];
        args.extend_from_slice(paths);
        self.run(runner, &args)?;
        Ok(())
    }

    pub fn commit(&self, runner: &mut dyn CommandRunner, message: &str) -> Result<()> {
        self.run(runner, &["commit", "-m", message])?;
        Ok(())
    }

    pub fn tag_annotated(
        &self,
        runner: &mut dyn CommandRunner,
        tag: &str,
        message: &str,
    ) -> Result<()> {
        self.run(runner, &["tag", "-a", tag, "-m", message])?;
        Ok(())
    }

    pub fn push(&self, runner: &mut dyn CommandRunner, remote: Option<&str>) -> Result<()> {
        let mut args = vec!["push"];
        args.extend(remote);
        self.run(runner, &args)?;
        Ok(())
    }

    pub fn push_tags(&self, runner: &mut dyn CommandRunner, remote: Option<&str>) -> Result<()> {
        let mut args = vec!["push"];
        args.extend(remote);
        args.push("--tags");
        self.run(runner, &args)?;
        Ok(())
    }
}

/// Parse the output of `git log` in [`LOG_FORMAT`].
pub fn parse_log(raw: &str) -> Result<Vec<CommitRecord>> {
    let mut commits = Vec::new();

    for record in raw.split(RECORD_SEP) {
        let record = record.trim_matches(|c| c == '\n' || c == '\r');
        if record.is_empty() {
            continue;
        }

        let fields: Vec<&str> = record.split(FIELD_SEP).collect();
        if fields.len() != 5 {
            bail!(
                "unexpected git log record with {} fields: {:?}",
                fields.len(),
                record
            );
        }

        commits.push(CommitRecord {
            hash: fields[0].to_string(),
            abbrev_hash: fields[1].to_string(),
            subject: fields[2].to_string(),
            author_name: fields[3].to_string(),
            author_date: fields[4].to_string(),
        });
    }

    Ok(commits)
}

fn parse_messages(raw: &str) -> Vec<String> {
    raw.split(RECORD_SEP)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
