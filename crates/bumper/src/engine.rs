use std::fmt;

use anyhow::{Context, Result, bail};
use bumper_git::GitCli;
use bumper_process::CommandRunner;
use chrono::Utc;

use crate::changelog::{latest_commit, record_release, render_markdown, trim_new_commits};
use crate::classify::{Classifier, RELEASE_COMMIT_PREFIX};
use crate::config::ReleaseOptions;
use crate::manifest::PackageManifest;
use crate::recommend::GitRecommender;
use crate::registry::CommitTypeRegistry;
use crate::state::{load_changelog, save_changelog, write_markdown};
use crate::version::{VersionIntent, resolve_next_version};

pub trait Reporter {
    fn info(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Interactive yes/no gate in front of the side-effecting steps.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Progress of a release run. Stages only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReleaseStage {
    Idle,
    CommitsFetched,
    CommitsPending,
    VersionRecommended,
    Confirmed,
    /// Files are being rewritten; some may already be on disk.
    Writing,
    Persisted,
    Committed,
    Tagged,
    Pushed,
    Published,
}

impl fmt::Display for ReleaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::CommitsFetched => "commits fetched",
            Self::CommitsPending => "commits pending",
            Self::VersionRecommended => "version recommended",
            Self::Confirmed => "confirmed",
            Self::Writing => "writing files",
            Self::Persisted => "files updated",
            Self::Committed => "committed",
            Self::Tagged => "tagged",
            Self::Pushed => "pushed",
            Self::Published => "published",
        };
        f.write_str(s)
    }
}

/// How a release run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Nothing new since the last recorded release; nothing was written.
    NoNewCommits,
    /// The operator said no; nothing was written.
    Declined { version: String },
    Released {
        version: String,
        commits: usize,
        /// Distribution tag used for publishing, if any
        dist_tag: Option<String>,
        published: bool,
    },
}

/// Run one release end to end.
///
/// Failures abort immediately. Steps that already completed are not rolled
/// back; the error names the last completed stage.
pub fn run_release(
    opts: &ReleaseOptions,
    runner: &mut dyn CommandRunner,
    confirm: &mut dyn Confirm,
    reporter: &mut dyn Reporter,
) -> Result<ReleaseOutcome> {
    let mut stage = ReleaseStage::Idle;
    match execute(opts, runner, confirm, reporter, &mut stage) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            let err = if stage >= ReleaseStage::Writing {
                err.context(format!(
                    "release aborted after stage '{stage}'; completed steps were not rolled back"
                ))
            } else {
                err.context(format!("release aborted after stage '{stage}'"))
            };
            reporter.error(&format!("{err:#}"));
            Err(err)
        }
    }
}

fn advance(stage: &mut ReleaseStage, next: ReleaseStage) {
    debug_assert!(next > *stage);
    *stage = next;
}

fn execute(
    opts: &ReleaseOptions,
    runner: &mut dyn CommandRunner,
    confirm: &mut dyn Confirm,
    reporter: &mut dyn Reporter,
    stage: &mut ReleaseStage,
) -> Result<ReleaseOutcome> {
    let mut manifest = PackageManifest::load(&opts.manifest_path)?;
    let mut store = load_changelog(&opts.changelog_json_path)?;
    let registry = match &opts.commit_types_path {
        Some(path) => CommitTypeRegistry::load(path)?,
        None => CommitTypeRegistry::builtin(),
    };
    let current = manifest.version();
    let git = GitCli::new(opts.git_program.clone());

    let records = git
        .log_commits(runner, opts.log_depth)
        .context("failed to retrieve commits")?;
    advance(stage, ReleaseStage::CommitsFetched);

    let classifier = Classifier::new(&registry)?;
    let commits = classifier.classify_all(records);
    let fresh = trim_new_commits(commits, latest_commit(&store, current.as_deref()));

    if fresh.is_empty() {
        reporter.info("No new commits found; no need for a new version");
        return Ok(ReleaseOutcome::NoNewCommits);
    }
    advance(stage, ReleaseStage::CommitsPending);

    let count = fresh.len();
    reporter.info(&format!(
        "{count} new commit{} found",
        if count == 1 { "" } else { "s" }
    ));

    let Some(homepage) = manifest.homepage() else {
        bail!(
            "{} has no homepage; commit links cannot be built",
            opts.manifest_path.display()
        );
    };

    match &opts.intent {
        VersionIntent::Bump(kind) => {
            reporter.info(&format!("--{kind} will force a {kind} version bump"));
        }
        VersionIntent::Exact(version) => {
            reporter.info(&format!("--version {version} will force version {version}"));
        }
        VersionIntent::Recommend => {}
    }

    let next = {
        let mut recommender = GitRecommender::new(&git, runner);
        resolve_next_version(current.as_deref(), &opts.intent, &mut recommender)?
    };
    advance(stage, ReleaseStage::VersionRecommended);
    reporter.info(&format!(
        "Recommended version: {} → {next}",
        current.as_deref().unwrap_or("(none)")
    ));

    if !opts.assume_yes && !confirm.confirm("Do you want to continue?")? {
        reporter.info("release cancelled");
        return Ok(ReleaseOutcome::Declined { version: next });
    }
    advance(stage, ReleaseStage::Confirmed);

    let manifest_name = opts.repo_relative(&opts.manifest_path).display().to_string();
    let json_name = opts
        .repo_relative(&opts.changelog_json_path)
        .display()
        .to_string();
    let md_name = opts
        .repo_relative(&opts.changelog_md_path)
        .display()
        .to_string();

    manifest.set_version(&next)?;
    advance(stage, ReleaseStage::Writing);
    manifest.save(&opts.manifest_path)?;
    reporter.info(&format!("✔ updated {manifest_name} to version {next}"));

    record_release(&mut store, &next, fresh, Utc::now().timestamp_millis());
    save_changelog(&opts.changelog_json_path, &store)?;
    reporter.info(&format!("✔ added new version and commits to {json_name}"));

    write_markdown(&opts.changelog_md_path, &render_markdown(&store, &homepage))?;
    reporter.info(&format!("✔ updated {md_name}"));
    advance(stage, ReleaseStage::Persisted);

    git.add(runner, &[&manifest_name, &json_name, &md_name])?;
    reporter.info("✔ ran git add");

    git.commit(runner, &format!("{RELEASE_COMMIT_PREFIX}{next}"))?;
    advance(stage, ReleaseStage::Committed);
    reporter.info(&format!("✔ committed {manifest_name} and changelogs"));

    git.tag_annotated(runner, &format!("v{next}"), &format!("Version {next}"))?;
    advance(stage, ReleaseStage::Tagged);
    reporter.info(&format!("✔ added tag v{next}"));

    let remote = opts.git_remote.as_deref();
    git.push(runner, remote)?;
    git.push_tags(runner, remote)?;
    advance(stage, ReleaseStage::Pushed);
    reporter.info("✔ pushed to git");

    let Some(publish) = &opts.publish else {
        reporter.warn("publishing disabled; skipping publish step");
        return Ok(ReleaseOutcome::Released {
            version: next,
            commits: count,
            dist_tag: None,
            published: false,
        });
    };

    let args = publish.args_for(opts.prerelease);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    runner
        .run(&publish.program, &arg_refs)?
        .ok()
        .with_context(|| format!("{} {} failed", publish.program, args.join(" ")))?;
    advance(stage, ReleaseStage::Published);

    let dist_tag = if opts.prerelease {
        publish.prerelease_tag.clone()
    } else {
        None
    };
    match &dist_tag {
        Some(tag) => reporter.info(&format!("✔ published (--tag={tag})")),
        None => reporter.info("✔ published"),
    }

    Ok(ReleaseOutcome::Released {
        version: next,
        commits: count,
        dist_tag,
        published: true,
    })
}
