//! # Bumper
//!
//! Conventional-commit driven releases for a single package.
//!
//! One run reads the git history, keeps the commits made since the last
//! recorded release, works out the next version, and then updates the
//! manifest and both changelogs before committing, tagging, pushing, and
//! publishing.
//!
//! ## Pipeline
//!
//! 1. [`bumper_git::GitCli::log_commits`] reads recent history.
//! 2. [`classify::Classifier`] drops release commits and attaches commit types.
//! 3. [`changelog::trim_new_commits`] cuts the list at the last released commit.
//! 4. [`version::resolve_next_version`] applies a forced bump, an exact
//!    version, or the recommendation from [`recommend::GitRecommender`].
//! 5. [`engine::run_release`] confirms, persists, commits, tags, pushes, and
//!    publishes, stopping at the first failure.
//!
//! ## Files
//!
//! - `package.json` or `Cargo.toml`: source of the current version and homepage
//! - `changelog.json`: structured history keyed by version
//! - `CHANGELOG.md`: rendered from `changelog.json` on every release
//! - `.bumper.toml`: optional configuration, see [`config`]
//!
//! ## CLI Usage
//!
//! For command-line usage, see the `bumper-cli` crate.

/// Rendering and trimming of the release history.
pub mod changelog;

/// Subject-line classification against the commit type registry.
pub mod classify;

/// Configuration file (`.bumper.toml`) loading and merging.
pub mod config;

/// The release state machine.
pub mod engine;

/// `package.json` and `Cargo.toml` access.
pub mod manifest;

/// Bump recommendation from commits since the last tag.
pub mod recommend;

/// Known commit types.
pub mod registry;

/// Changelog persistence.
pub mod state;

/// Domain types: commits, commit types, release entries.
pub mod types;

/// Semantic version increments.
pub mod version;
