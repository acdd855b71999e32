//! Changelog state: release cursor, commit trimming, merge, and rendering.

use std::cmp::Ordering;

use chrono::DateTime;

use crate::types::{ChangelogStore, Commit, ReleaseEntry};

/// Heading of the rendered changelog document.
pub const CHANGELOG_TITLE: &str = "# Changelog";

/// The newest commit recorded against `version`, if any.
///
/// This is the release cursor: everything from it onwards in a fresh log was
/// already published under `version`.
pub fn latest_commit<'a>(store: &'a ChangelogStore, version: Option<&str>) -> Option<&'a Commit> {
    store.get(version?)?.latest_commit()
}

/// Keep only the commits newer than `cursor`.
///
/// `commits` must be newest first. If the cursor has no hash or does not
/// appear in `commits`, the whole batch is new.
pub fn trim_new_commits(mut commits: Vec<Commit>, cursor: Option<&Commit>) -> Vec<Commit> {
    let Some(cursor) = cursor.filter(|c| !c.hash.is_empty()) else {
        return commits;
    };

    if let Some(idx) = commits.iter().position(|c| c.hash == cursor.hash) {
        commits.truncate(idx);
    }
    commits
}

/// Add a release for `version`, replacing any entry with the same key.
pub fn record_release(store: &mut ChangelogStore, version: &str, commits: Vec<Commit>, ts: i64) {
    store.insert(version, ReleaseEntry { commits, ts });
}

/// Entries in display order: newest timestamp first.
///
/// Equal timestamps fall back to semantic version, highest first; keys that
/// are not valid versions sort after those that are.
pub fn entries_newest_first(store: &ChangelogStore) -> Vec<(&str, &ReleaseEntry)> {
    let mut entries: Vec<(&str, &ReleaseEntry)> =
        store.iter().map(|(k, v)| (k.as_str(), v)).collect();

    entries.sort_by(|(ka, a), (kb, b)| {
        b.ts.cmp(&a.ts).then_with(|| compare_versions_desc(ka, kb))
    });
    entries
}

fn compare_versions_desc(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(va), Ok(vb)) => vb.cmp(&va),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.cmp(a),
    }
}

/// `YYYY-MM-DD` for an epoch-millisecond timestamp, in UTC.
pub fn format_date(ts: i64) -> String {
    DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}

/// Link to a commit on the project homepage.
pub fn commit_url(homepage: &str, hash: &str) -> String {
    format!("{}/commit/{}", homepage.trim_end_matches('/'), hash)
}

/// Render the full release history as a Markdown document.
pub fn render_markdown(store: &ChangelogStore, homepage: &str) -> String {
    let mut md = String::from(CHANGELOG_TITLE);

    for (version, entry) in entries_newest_first(store) {
        md.push_str(&format!("\n\n## v{} ({})\n", version, format_date(entry.ts)));
        for commit in &entry.commits {
            md.push_str(&format!(
                "\n* [{}]({}) - {}",
                commit.abbrev_hash,
                commit_url(homepage, &commit.hash),
                commit.subject
            ));
        }
    }

    md.push('\n');
    md
}
