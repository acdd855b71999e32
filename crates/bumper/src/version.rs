//! Version arithmetic and next-version resolution.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("invalid version '{version}': {source}")]
    Invalid {
        version: String,
        #[source]
        source: semver::Error,
    },
    #[error("cannot compute prerelease identifier for '{0}'")]
    Prerelease(String),
    #[error("unknown bump kind '{0}' (expected major, minor, patch, or prerelease)")]
    UnknownBump(String),
    #[error("no current version found in the manifest")]
    MissingCurrent,
    #[error("cannot bump '{0}': a version component would overflow")]
    Overflow(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
    Prerelease,
}

impl BumpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Prerelease => "prerelease",
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpKind {
    type Err = VersionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            "prerelease" | "pre" => Ok(Self::Prerelease),
            other => Err(VersionError::UnknownBump(other.to_string())),
        }
    }
}

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionIntent {
    /// Bump by a forced kind.
    Bump(BumpKind),
    /// Use this exact version string, unvalidated.
    Exact(String),
    /// Ask the recommendation engine.
    Recommend,
}

impl VersionIntent {
    /// Pick the intent by precedence: forced bump, then explicit version,
    /// then recommendation.
    pub fn from_parts(bump: Option<BumpKind>, exact: Option<String>) -> Self {
        match (bump, exact) {
            (Some(kind), _) => Self::Bump(kind),
            (None, Some(version)) if !version.is_empty() => Self::Exact(version),
            _ => Self::Recommend,
        }
    }
}

/// Source of an inferred bump kind.
pub trait BumpRecommender {
    fn recommend(&mut self) -> Result<BumpKind>;
}

/// Compute the next version string.
///
/// The recommender is only consulted for [`VersionIntent::Recommend`].
pub fn resolve_next_version(
    current: Option<&str>,
    intent: &VersionIntent,
    recommender: &mut dyn BumpRecommender,
) -> Result<String> {
    let kind = match intent {
        VersionIntent::Exact(version) => return Ok(version.clone()),
        VersionIntent::Bump(kind) => *kind,
        VersionIntent::Recommend => recommender.recommend()?,
    };

    let current = current.ok_or(VersionError::MissingCurrent)?;
    Ok(increment(current, kind)?)
}

/// Next version after `current` for `kind`, following npm `semver.inc` rules.
///
/// A prerelease of the target version is promoted rather than bumped past,
/// e.g. `2.0.0-rc.1` major-bumps to `2.0.0`. Build metadata is dropped.
pub fn increment(current: &str, kind: BumpKind) -> Result<String, VersionError> {
    let trimmed = current.trim().trim_start_matches(['v', '=']);
    let mut v = Version::parse(trimmed).map_err(|source| VersionError::Invalid {
        version: current.to_string(),
        source,
    })?;
    v.build = BuildMetadata::EMPTY;
    let was_pre = !v.pre.is_empty();

    match kind {
        BumpKind::Major => {
            if !(was_pre && v.minor == 0 && v.patch == 0) {
                v.major = bump_component(v.major, current)?;
            }
            v.minor = 0;
            v.patch = 0;
            v.pre = Prerelease::EMPTY;
        }
        BumpKind::Minor => {
            if !(was_pre && v.patch == 0) {
                v.minor = bump_component(v.minor, current)?;
            }
            v.patch = 0;
            v.pre = Prerelease::EMPTY;
        }
        BumpKind::Patch => {
            if !was_pre {
                v.patch = bump_component(v.patch, current)?;
            }
            v.pre = Prerelease::EMPTY;
        }
        BumpKind::Prerelease => {
            if !was_pre {
                v.patch = bump_component(v.patch, current)?;
                v.pre = Prerelease::new("0").map_err(|_| VersionError::Prerelease(current.into()))?;
            } else {
                let next = next_prerelease(v.pre.as_str())
                    .ok_or_else(|| VersionError::Overflow(current.to_string()))?;
                v.pre = Prerelease::new(&next)
                    .map_err(|_| VersionError::Prerelease(current.to_string()))?;
            }
        }
    }

    Ok(v.to_string())
}

fn bump_component(n: u64, current: &str) -> Result<u64, VersionError> {
    n.checked_add(1)
        .ok_or_else(|| VersionError::Overflow(current.to_string()))
}

/// Increment the last numeric identifier, or append `.0` if there is none.
///
/// `None` when the numeric identifier does not fit in a `u64` after the bump.
fn next_prerelease(pre: &str) -> Option<String> {
    let mut parts: Vec<String> = pre.split('.').map(str::to_string).collect();

    let numeric = parts
        .iter()
        .rposition(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));

    match numeric {
        Some(idx) => {
            let n: u64 = parts[idx].parse().ok()?;
            parts[idx] = n.checked_add(1)?.to_string();
        }
        None => parts.push("0".to_string()),
    }

    Some(parts.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRecommender {
        kind: Option<BumpKind>,
        calls: usize,
    }

    impl FixedRecommender {
        fn new(kind: Option<BumpKind>) -> Self {
            Self { kind, calls: 0 }
        }
    }

    impl BumpRecommender for FixedRecommender {
        fn recommend(&mut self) -> Result<BumpKind> {
            self.calls += 1;
            self.kind
                .ok_or_else(|| anyhow::anyhow!("recommendation engine failed"))
        }
    }

    fn inc(v: &str, kind: BumpKind) -> String {
        increment(v, kind).expect("increment")
    }

    #[test]
    fn release_bumps() {
        assert_eq!(inc("1.2.3", BumpKind::Major), "2.0.0");
        assert_eq!(inc("1.2.3", BumpKind::Minor), "1.3.0");
        assert_eq!(inc("1.2.3", BumpKind::Patch), "1.2.4");
        assert_eq!(inc("0.1.9", BumpKind::Patch), "0.1.10");
    }

    #[test]
    fn bumps_from_prerelease_promote() {
        assert_eq!(inc("2.0.0-rc.1", BumpKind::Major), "2.0.0");
        assert_eq!(inc("2.1.0-rc.1", BumpKind::Major), "3.0.0");
        assert_eq!(inc("1.3.0-rc.1", BumpKind::Minor), "1.3.0");
        assert_eq!(inc("1.3.1-rc.1", BumpKind::Minor), "1.4.0");
        assert_eq!(inc("1.2.4-rc.1", BumpKind::Patch), "1.2.4");
    }

    #[test]
    fn prerelease_bumps() {
        assert_eq!(inc("1.2.3", BumpKind::Prerelease), "1.2.4-0");
        assert_eq!(inc("1.2.4-0", BumpKind::Prerelease), "1.2.4-1");
        assert_eq!(inc("1.2.4-rc.1", BumpKind::Prerelease), "1.2.4-rc.2");
        assert_eq!(inc("1.2.4-rc", BumpKind::Prerelease), "1.2.4-rc.0");
        assert_eq!(inc("1.2.4-alpha.3.beta", BumpKind::Prerelease), "1.2.4-alpha.4.beta");
    }

    #[test]
    fn build_metadata_and_prefix_are_dropped() {
        assert_eq!(inc("v1.2.3+build.7", BumpKind::Patch), "1.2.4");
    }

    #[test]
    fn invalid_version_is_error() {
        let err = increment("not-a-version", BumpKind::Patch).expect_err("invalid");
        assert!(matches!(err, VersionError::Invalid { .. }));
        assert!(err.to_string().contains("not-a-version"));
    }

    #[test]
    fn component_overflow_is_error() {
        let max = u64::MAX;
        for (current, kind) in [
            (format!("{max}.0.0"), BumpKind::Major),
            (format!("1.{max}.0"), BumpKind::Minor),
            (format!("1.0.{max}"), BumpKind::Patch),
            (format!("1.0.{max}"), BumpKind::Prerelease),
        ] {
            let err = increment(&current, kind).expect_err("overflow");
            assert!(matches!(err, VersionError::Overflow(_)), "{current} {kind}");
        }
    }

    #[test]
    fn oversized_prerelease_counter_is_error() {
        let max = u64::MAX;
        for current in [
            "1.0.0-99999999999999999999".to_string(),
            format!("1.0.0-rc.{max}"),
        ] {
            let err = increment(&current, BumpKind::Prerelease).expect_err("overflow");
            assert!(matches!(err, VersionError::Overflow(_)), "{current}");
        }
    }

    #[test]
    fn prerelease_bump_never_goes_backwards() {
        for current in ["1.0.0-0", "1.0.0-rc.9", "1.0.0-9999999999", "1.0.0-alpha"] {
            let next = inc(current, BumpKind::Prerelease);
            let before = Version::parse(current).expect("before");
            let after = Version::parse(&next).expect("after");
            assert!(after > before, "{current} -> {next}");
        }
    }

    #[test]
    fn bump_kind_parsing() {
        assert_eq!("pre".parse::<BumpKind>().expect("pre"), BumpKind::Prerelease);
        assert_eq!("minor".parse::<BumpKind>().expect("minor"), BumpKind::Minor);
        assert!("huge".parse::<BumpKind>().is_err());
    }

    #[test]
    fn forced_bump_beats_explicit_version() {
        let intent = VersionIntent::from_parts(Some(BumpKind::Major), Some("9.9.9".into()));
        assert_eq!(intent, VersionIntent::Bump(BumpKind::Major));

        let mut rec = FixedRecommender::new(Some(BumpKind::Patch));
        let next = resolve_next_version(Some("1.4.2"), &intent, &mut rec).expect("resolve");
        assert_eq!(next, "2.0.0");
        assert_eq!(rec.calls, 0);
    }

    #[test]
    fn explicit_version_is_used_verbatim() {
        let intent = VersionIntent::from_parts(None, Some("0.0.1-anything".into()));
        let mut rec = FixedRecommender::new(None);

        let next = resolve_next_version(Some("5.0.0"), &intent, &mut rec).expect("resolve");
        assert_eq!(next, "0.0.1-anything");
        assert_eq!(rec.calls, 0);
    }

    #[test]
    fn explicit_version_needs_no_current() {
        let intent = VersionIntent::Exact("1.0.0".into());
        let mut rec = FixedRecommender::new(None);
        assert_eq!(
            resolve_next_version(None, &intent, &mut rec).expect("resolve"),
            "1.0.0"
        );
    }

    #[test]
    fn recommendation_applied_when_no_flags() {
        let intent = VersionIntent::from_parts(None, None);
        assert_eq!(intent, VersionIntent::Recommend);

        let mut rec = FixedRecommender::new(Some(BumpKind::Minor));
        let next = resolve_next_version(Some("1.4.2"), &intent, &mut rec).expect("resolve");
        assert_eq!(next, "1.5.0");
        assert_eq!(rec.calls, 1);
    }

    #[test]
    fn recommendation_failure_is_fatal() {
        let mut rec = FixedRecommender::new(None);
        let err = resolve_next_version(Some("1.0.0"), &VersionIntent::Recommend, &mut rec)
            .expect_err("should fail");
        assert!(err.to_string().contains("recommendation engine failed"));
    }

    #[test]
    fn missing_current_version_is_error() {
        let mut rec = FixedRecommender::new(Some(BumpKind::Patch));
        let err = resolve_next_version(None, &VersionIntent::Recommend, &mut rec)
            .expect_err("should fail");
        assert!(err.to_string().contains("no current version"));
    }
}
