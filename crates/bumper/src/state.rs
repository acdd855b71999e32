//! Persistence for the release history.
//!
//! `changelog.json` and `CHANGELOG.md` are always rewritten in full through
//! [`atomic_write`], so an interrupted run never leaves a half-written file.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::types::ChangelogStore;

/// Default structured changelog file name.
pub const CHANGELOG_JSON_FILE: &str = "changelog.json";

/// Default rendered changelog file name.
pub const CHANGELOG_MD_FILE: &str = "CHANGELOG.md";

/// Load the structured changelog. A missing file is an empty history.
pub fn load_changelog(path: &Path) -> Result<ChangelogStore> {
    if !path.exists() {
        return Ok(ChangelogStore::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read changelog {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(ChangelogStore::new());
    }
    let store: ChangelogStore = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse changelog JSON {}", path.display()))?;
    Ok(store)
}

/// Rewrite the structured changelog in full.
pub fn save_changelog(path: &Path, store: &ChangelogStore) -> Result<()> {
    let mut data = serde_json::to_vec_pretty(store).context("failed to serialize changelog")?;
    data.push(b'\n');
    atomic_write(path, &data)
}

/// Rewrite the rendered changelog document in full.
pub fn write_markdown(path: &Path, document: &str) -> Result<()> {
    atomic_write(path, document.as_bytes())
}

pub(crate) fn fsync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = fs::File::open(parent)
    {
        let _ = dir.sync_all();
    }
}

/// Write via a sibling temp file and rename, so readers never see a torn file.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create dir {}", parent.display()))?;
    }

    let tmp = path.with_extension("tmp");

    {
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("failed to create tmp file {}", tmp.display()))?;
        f.write_all(data)
            .with_context(|| format!("failed to write tmp file {}", tmp.display()))?;
        f.sync_all().ok();
    }

    fs::rename(&tmp, path).with_context(|| {
        format!(
            "failed to rename tmp file {} to {}",
            tmp.display(),
            path.display()
        )
    })?;

    fsync_parent_dir(path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::changelog::record_release;
    use crate::types::Commit;

    fn sample_store() -> ChangelogStore {
        let mut store = ChangelogStore::new();
        record_release(
            &mut store,
            "1.0.0",
            vec![Commit {
                hash: "abc".to_string(),
                abbrev_hash: "abc".to_string(),
                subject: "first".to_string(),
                ..Commit::default()
            }],
            1_614_902_400_000,
        );
        store
    }

    #[test]
    fn load_changelog_missing_is_empty() {
        let td = tempdir().expect("tempdir");
        let store = load_changelog(&td.path().join(CHANGELOG_JSON_FILE)).expect("load");
        assert!(store.is_empty());
    }

    #[test]
    fn load_changelog_blank_file_is_empty() {
        let td = tempdir().expect("tempdir");
        let path = td.path().join(CHANGELOG_JSON_FILE);
        fs::write(&path, "\n").expect("write");
        assert!(load_changelog(&path).expect("load").is_empty());
    }

    #[test]
    fn save_and_load_changelog_roundtrip() {
        let td = tempdir().expect("tempdir");
        let path = td.path().join("nested").join(CHANGELOG_JSON_FILE);
        let store = sample_store();

        save_changelog(&path, &store).expect("save");
        let loaded = load_changelog(&path).expect("load");
        assert_eq!(loaded, store);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn load_changelog_accepts_minimal_commits() {
        let td = tempdir().expect("tempdir");
        let path = td.path().join(CHANGELOG_JSON_FILE);
        fs::write(
            &path,
            r#"{"1.0.0": {"commits": [{"hash": "abc"}, {"hash": "def"}], "ts": 1614902400000}}"#,
        )
        .expect("write");

        let store = load_changelog(&path).expect("load");
        let entry = store.get("1.0.0").expect("entry");
        assert_eq!(entry.commits.len(), 2);
        assert_eq!(entry.latest_commit().map(|c| c.hash.as_str()), Some("abc"));
    }

    #[test]
    fn load_changelog_reads_full_commit_shape() {
        let td = tempdir().expect("tempdir");
        let path = td.path().join(CHANGELOG_JSON_FILE);
        fs::write(
            &path,
            r#"{"0.1.0": {"commits": [{
                "hash": "abcdef1234", "abbrevHash": "abcdef1", "subject": "add feature",
                "authorName": "Jane", "authorDate": "2021-03-05 10:00:00 +0000",
                "type": {"description": "A new feature", "title": "Features", "key": "feat"}
            }], "ts": 1614902400000}}"#,
        )
        .expect("write");

        let store = load_changelog(&path).expect("load");
        let commit = &store.get("0.1.0").expect("entry").commits[0];
        assert_eq!(commit.abbrev_hash, "abcdef1");
        assert_eq!(commit.commit_type.as_ref().map(|t| t.key.as_str()), Some("feat"));
    }

    #[test]
    fn load_changelog_rejects_invalid_json() {
        let td = tempdir().expect("tempdir");
        let path = td.path().join(CHANGELOG_JSON_FILE);
        fs::write(&path, "{ nope").expect("write");

        let err = load_changelog(&path).expect_err("invalid");
        assert!(format!("{err:#}").contains("failed to parse changelog JSON"));
    }

    #[test]
    fn write_markdown_overwrites() {
        let td = tempdir().expect("tempdir");
        let path = td.path().join(CHANGELOG_MD_FILE);
        fs::write(&path, "old content that is longer").expect("write");

        write_markdown(&path, "# Changelog\n").expect("write md");
        assert_eq!(fs::read_to_string(&path).expect("read"), "# Changelog\n");
    }
}
