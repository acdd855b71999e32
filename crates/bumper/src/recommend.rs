//! Conventional-commit based bump recommendation.
//!
//! Uses angular-preset rules over every commit since the last tag: any
//! breaking change recommends a major bump, otherwise any `feat` a minor
//! bump, otherwise a patch bump.

use anyhow::{Context, Result};
use bumper_git::GitCli;
use bumper_process::CommandRunner;

use crate::version::{BumpKind, BumpRecommender};

/// Recommend a bump from full commit messages.
///
/// Messages that are not conventional commits are ignored.
pub fn recommend_from_messages<S: AsRef<str>>(messages: &[S]) -> BumpKind {
    let mut kind = BumpKind::Patch;

    for message in messages {
        let Ok(commit) = git_conventional::Commit::parse(message.as_ref().trim()) else {
            continue;
        };
        if commit.breaking() {
            return BumpKind::Major;
        }
        if commit.type_() == git_conventional::Type::FEAT {
            kind = BumpKind::Minor;
        }
    }

    kind
}

/// Recommends a bump from the repository history since the last tag.
pub struct GitRecommender<'a> {
    git: &'a GitCli,
    runner: &'a mut dyn CommandRunner,
}

impl<'a> GitRecommender<'a> {
    pub fn new(git: &'a GitCli, runner: &'a mut dyn CommandRunner) -> Self {
        Self { git, runner }
    }
}

impl BumpRecommender for GitRecommender<'_> {
    fn recommend(&mut self) -> Result<BumpKind> {
        let messages = self
            .git
            .messages_since_last_tag(self.runner)
            .context("failed to compute recommended version bump")?;
        Ok(recommend_from_messages(messages.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumper_process::CommandResult;

    #[test]
    fn no_commits_recommends_patch() {
        let messages: [&str; 0] = [];
        assert_eq!(recommend_from_messages(&messages), BumpKind::Patch);
    }

    #[test]
    fn fixes_recommend_patch() {
        assert_eq!(
            recommend_from_messages(&["fix: a", "docs: b", "random words"]),
            BumpKind::Patch
        );
    }

    #[test]
    fn feature_recommends_minor() {
        assert_eq!(
            recommend_from_messages(&["fix: a", "feat(ui): b"]),
            BumpKind::Minor
        );
    }

    #[test]
    fn bang_recommends_major() {
        assert_eq!(
            recommend_from_messages(&["feat: a", "refactor!: drop old api"]),
            BumpKind::Major
        );
    }

    #[test]
    fn breaking_footer_recommends_major() {
        let msg = "fix: change config format\n\nBREAKING CHANGE: the `port` key is now `listen`";
        assert_eq!(recommend_from_messages(&[msg]), BumpKind::Major);
    }

    struct FailingRunner;

    impl CommandRunner for FailingRunner {
        fn run(&mut self, _program: &str, args: &[&str]) -> Result<CommandResult> {
            if args.first() == Some(&"describe") {
                return Ok(CommandResult::failed(128, "fatal: No names found"));
            }
            Ok(CommandResult::failed(128, "fatal: bad revision"))
        }
    }

    #[test]
    fn git_failure_surfaces_as_error() {
        let git = GitCli::new("git");
        let mut runner = FailingRunner;
        let mut rec = GitRecommender::new(&git, &mut runner);

        let err = rec.recommend().expect_err("should fail");
        assert!(format!("{err:#}").contains("failed to compute recommended version bump"));
    }
}
