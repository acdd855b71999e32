use std::collections::BTreeMap;

use bumper_git::CommitRecord;
use serde::{Deserialize, Serialize};

/// Classification metadata for one conventional-commit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitType {
    /// Short key matched against the subject prefix, e.g. `feat`.
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl CommitType {
    pub fn new(key: &str, title: &str, description: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// A commit as it flows through the release pipeline and into `changelog.json`.
///
/// After classification `subject` no longer carries the type prefix; the
/// original subject is not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub hash: String,
    #[serde(default)]
    pub abbrev_hash: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author_date: String,
    #[serde(default, rename = "type")]
    pub commit_type: Option<CommitType>,
}

impl From<CommitRecord> for Commit {
    fn from(record: CommitRecord) -> Self {
        Self {
            hash: record.hash,
            abbrev_hash: record.abbrev_hash,
            subject: record.subject,
            author_name: record.author_name,
            author_date: record.author_date,
            commit_type: None,
        }
    }
}

/// One recorded release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    /// Commits included in the release, newest first.
    #[serde(default)]
    pub commits: Vec<Commit>,
    /// Creation instant, epoch milliseconds.
    #[serde(default)]
    pub ts: i64,
}

impl ReleaseEntry {
    /// The newest commit of this release; the trim cursor for the next run.
    pub fn latest_commit(&self) -> Option<&Commit> {
        self.commits.first()
    }
}

/// Release history keyed by version string.
///
/// Persisted as a plain JSON object. Key order carries no meaning; see
/// [`ChangelogStore::entries_newest_first`] for display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangelogStore {
    releases: BTreeMap<String, ReleaseEntry>,
}

impl ChangelogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn get(&self, version: &str) -> Option<&ReleaseEntry> {
        self.releases.get(version)
    }

    pub fn contains(&self, version: &str) -> bool {
        self.releases.contains_key(version)
    }

    pub fn insert(&mut self, version: impl Into<String>, entry: ReleaseEntry) {
        self.releases.insert(version.into(), entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReleaseEntry)> {
        self.releases.iter()
    }
}
