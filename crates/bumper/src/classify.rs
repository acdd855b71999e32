//! Commit classification by conventional-commit prefix.
//!
//! A subject is matched against `^(<keys>): (.*)` first and then against
//! `^(<keys>)(<scope>): (.*)`, where `<keys>` is the registry's keys joined
//! as an alternation in registry order. On a match the prefix (and scope) is
//! stripped from the subject and the type is attached.

use anyhow::{Context, Result};
use bumper_git::CommitRecord;
use regex::Regex;

use crate::registry::CommitTypeRegistry;
use crate::types::{Commit, CommitType};

/// Subject prefix of the commits bumper itself creates.
pub const RELEASE_COMMIT_PREFIX: &str = "chore(release): ";

/// Whether `subject` belongs to a release commit made by a previous run.
pub fn is_release_commit(subject: &str) -> bool {
    subject.starts_with(RELEASE_COMMIT_PREFIX)
}

#[derive(Debug)]
struct Patterns {
    plain: Regex,
    scoped: Regex,
}

#[derive(Debug)]
pub struct Classifier<'a> {
    registry: &'a CommitTypeRegistry,
    // None when the registry is empty; nothing can match then.
    patterns: Option<Patterns>,
}

impl<'a> Classifier<'a> {
    pub fn new(registry: &'a CommitTypeRegistry) -> Result<Self> {
        if registry.is_empty() {
            return Ok(Self {
                registry,
                patterns: None,
            });
        }

        let keys = registry
            .keys()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");

        let plain = Regex::new(&format!("^({keys}): (.*)"))
            .context("failed to build commit type pattern")?;
        let scoped = Regex::new(&format!(r"^({keys})\([^)]+\): (.*)"))
            .context("failed to build scoped commit type pattern")?;

        Ok(Self {
            registry,
            patterns: Some(Patterns { plain, scoped }),
        })
    }

    /// Match a subject, returning the type and the subject without its prefix.
    pub fn match_subject<'s>(&self, subject: &'s str) -> Option<(&'a CommitType, &'s str)> {
        let patterns = self.patterns.as_ref()?;

        let caps = patterns
            .plain
            .captures(subject)
            .or_else(|| patterns.scoped.captures(subject))?;

        let key = caps.get(1)?.as_str();
        let rest = caps.get(2)?.as_str();
        let commit_type = self.registry.get(key)?;
        Some((commit_type, rest))
    }

    /// Classify one commit. Unmatched subjects pass through untouched.
    pub fn classify(&self, record: CommitRecord) -> Commit {
        let mut commit = Commit::from(record);
        if let Some((commit_type, rest)) = self.match_subject(&commit.subject) {
            let rest = rest.to_string();
            commit.commit_type = Some(commit_type.clone());
            commit.subject = rest;
        }
        commit
    }

    /// Drop release commits and classify the rest, keeping order.
    pub fn classify_all(&self, records: Vec<CommitRecord>) -> Vec<Commit> {
        records
            .into_iter()
            .filter(|r| !is_release_commit(&r.subject))
            .map(|r| self.classify(r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, subject: &str) -> CommitRecord {
        CommitRecord {
            hash: hash.to_string(),
            abbrev_hash: hash.chars().take(7).collect(),
            subject: subject.to_string(),
            ..CommitRecord::default()
        }
    }

    fn key_of(commit: &Commit) -> Option<&str> {
        commit.commit_type.as_ref().map(|t| t.key.as_str())
    }

    #[test]
    fn strips_plain_prefix() {
        let registry = CommitTypeRegistry::builtin();
        let classifier = Classifier::new(&registry).expect("classifier");

        let commit = classifier.classify(record("a1", "feat: add login"));
        assert_eq!(commit.subject, "add login");
        assert_eq!(key_of(&commit), Some("feat"));
        assert_eq!(
            commit.commit_type.as_ref().map(|t| t.title.as_str()),
            Some("Features")
        );
    }

    #[test]
    fn strips_scoped_prefix() {
        let registry = CommitTypeRegistry::builtin();
        let classifier = Classifier::new(&registry).expect("classifier");

        let commit = classifier.classify(record("a1", "fix(parser): handle empty input"));
        assert_eq!(commit.subject, "handle empty input");
        assert_eq!(key_of(&commit), Some("fix"));
    }

    #[test]
    fn unknown_type_is_untouched() {
        let registry = CommitTypeRegistry::builtin();
        let classifier = Classifier::new(&registry).expect("classifier");

        for subject in [
            "wip: half done",
            "Merge branch 'main'",
            "feat:missing space",
            "feat(): empty scope",
            "Feat: wrong case",
        ] {
            let commit = classifier.classify(record("a1", subject));
            assert_eq!(commit.subject, subject);
            assert!(commit.commit_type.is_none(), "{subject} should not match");
        }
    }

    #[test]
    fn first_registered_key_wins_on_shared_prefix() {
        let registry = CommitTypeRegistry::new(vec![
            CommitType::new("fix", "Fix", ""),
            CommitType::new("fixup", "Fixup", ""),
        ]);
        let classifier = Classifier::new(&registry).expect("classifier");

        let commit = classifier.classify(record("a1", "fixup: squash me"));
        assert_eq!(key_of(&commit), Some("fixup"));
        assert_eq!(commit.subject, "squash me");

        let commit = classifier.classify(record("a2", "fix: real fix"));
        assert_eq!(key_of(&commit), Some("fix"));
    }

    #[test]
    fn keys_are_matched_literally() {
        let registry = CommitTypeRegistry::new(vec![CommitType::new("c++", "Cpp", "")]);
        let classifier = Classifier::new(&registry).expect("classifier");

        let commit = classifier.classify(record("a1", "c++: bump toolchain"));
        assert_eq!(key_of(&commit), Some("c++"));
        assert_eq!(classifier.classify(record("a2", "cc: nope")).commit_type, None);
    }

    #[test]
    fn empty_registry_classifies_nothing() {
        let registry = CommitTypeRegistry::default();
        let classifier = Classifier::new(&registry).expect("classifier");

        let commit = classifier.classify(record("a1", ": odd subject"));
        assert_eq!(commit.subject, ": odd subject");
        assert!(commit.commit_type.is_none());
    }

    #[test]
    fn release_commits_are_dropped() {
        let registry = CommitTypeRegistry::builtin();
        let classifier = Classifier::new(&registry).expect("classifier");

        let commits = classifier.classify_all(vec![
            record("c3", "feat: new"),
            record("c2", "chore(release): 1.0.0"),
            record("c1", "chore: tidy"),
        ]);

        let hashes: Vec<&str> = commits.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["c3", "c1"]);
    }

    #[test]
    fn release_commits_dropped_even_without_registry() {
        let registry = CommitTypeRegistry::default();
        let classifier = Classifier::new(&registry).expect("classifier");

        let commits = classifier.classify_all(vec![record("c2", "chore(release): 1.0.0")]);
        assert!(commits.is_empty());
    }

    #[test]
    fn release_prefix_requires_trailing_space() {
        assert!(is_release_commit("chore(release): 2.0.0"));
        assert!(!is_release_commit("chore(release):2.0.0"));
        assert!(!is_release_commit("chore: release 2.0.0"));
    }
}
