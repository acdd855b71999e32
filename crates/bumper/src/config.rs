//! Configuration file support for bumper (`.bumper.toml`)
//!
//! Values come from three layers, lowest precedence first: built-in
//! defaults, the project's `.bumper.toml`, and command-line overrides. The
//! merged result is a [`ReleaseOptions`] built once at startup and passed by
//! reference to the engine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bumper_git::GIT_BIN_ENV;
use bumper_process::resolve_program;
use serde::{Deserialize, Serialize};

use crate::manifest::ManifestKind;
use crate::state::{CHANGELOG_JSON_FILE, CHANGELOG_MD_FILE};
use crate::version::{BumpKind, VersionIntent};

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".bumper.toml";

/// Environment variable overriding the publish binary.
pub const PUBLISH_BIN_ENV: &str = "BUMPER_PUBLISH_BIN";

/// Nested git configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GitConfig {
    /// Remote to push to; git's default when unset
    #[serde(default)]
    pub remote: Option<String>,
}

/// Nested publish configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Run the publish step at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Publishing program; derived from the manifest kind when unset
    #[serde(default)]
    pub program: Option<String>,

    /// Arguments for the publishing program
    #[serde(default = "default_publish_args")]
    pub args: Vec<String>,

    /// Distribution tag for prerelease publishes (`--tag=<tag>`).
    /// Unset means `dev` for npm and none for cargo; empty disables it.
    #[serde(default)]
    pub prerelease_tag: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: None,
            args: default_publish_args(),
            prerelease_tag: None,
        }
    }
}

/// Configuration loaded from .bumper.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BumperConfig {
    /// Package manifest holding the version and homepage
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Structured release history
    #[serde(default = "default_changelog_json")]
    pub changelog_json: PathBuf,

    /// Rendered changelog document
    #[serde(default = "default_changelog_md")]
    pub changelog_md: PathBuf,

    /// Optional JSON commit type registry; built-in types when unset
    #[serde(default)]
    pub commit_types: Option<PathBuf>,

    /// Number of commits read from history
    #[serde(default = "default_log_depth")]
    pub log_depth: usize,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

impl Default for BumperConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            changelog_json: default_changelog_json(),
            changelog_md: default_changelog_md(),
            commit_types: None,
            log_depth: default_log_depth(),
            git: GitConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_publish_args() -> Vec<String> {
    vec!["publish".to_string()]
}

fn default_manifest() -> PathBuf {
    PathBuf::from("package.json")
}

fn default_changelog_json() -> PathBuf {
    PathBuf::from(CHANGELOG_JSON_FILE)
}

fn default_changelog_md() -> PathBuf {
    PathBuf::from(CHANGELOG_MD_FILE)
}

fn default_log_depth() -> usize {
    100
}

/// CLI overrides for merging with config file values.
///
/// `Option` fields mean "user did not pass this flag" when `None`.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Forced bump kind, already resolved by flag precedence
    pub bump: Option<BumpKind>,
    /// Explicit next version
    pub version: Option<String>,
    /// `--prerelease`/`--pre` was passed; publishes under the prerelease tag
    pub prerelease: bool,
    /// Skip the confirmation prompt
    pub assume_yes: bool,
    pub manifest: Option<PathBuf>,
    pub no_publish: bool,
}

/// Fully resolved publish invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishCommand {
    pub program: String,
    pub args: Vec<String>,
    pub prerelease_tag: Option<String>,
}

impl PublishCommand {
    /// Arguments for this run; prereleases never go out under the default tag.
    pub fn args_for(&self, prerelease: bool) -> Vec<String> {
        let mut args = self.args.clone();
        if prerelease && let Some(tag) = &self.prerelease_tag {
            args.push(format!("--tag={tag}"));
        }
        args
    }
}

/// Everything a release run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    /// Repository working directory
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub changelog_json_path: PathBuf,
    pub changelog_md_path: PathBuf,
    pub commit_types_path: Option<PathBuf>,
    pub log_depth: usize,
    pub intent: VersionIntent,
    pub prerelease: bool,
    pub assume_yes: bool,
    pub git_program: String,
    pub git_remote: Option<String>,
    /// `None` when publishing is disabled
    pub publish: Option<PublishCommand>,
}

impl ReleaseOptions {
    /// Path as it should be passed to git: relative to the root when possible.
    pub fn repo_relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

impl BumperConfig {
    /// Load configuration from a directory by looking for .bumper.toml
    ///
    /// Returns `Ok(None)` if no config file exists.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(None);
        }
        Self::load_from_file(&config_path).map(Some)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: BumperConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.log_depth == 0 {
            bail!("log_depth must be greater than 0");
        }

        for (name, path) in [
            ("manifest", &self.manifest),
            ("changelog_json", &self.changelog_json),
            ("changelog_md", &self.changelog_md),
        ] {
            if path.as_os_str().is_empty() {
                bail!("{name} must not be empty");
            }
        }

        if self.changelog_json == self.changelog_md {
            bail!("changelog_json and changelog_md must be different files");
        }

        if self.publish.enabled && self.publish.program.as_deref() == Some("") {
            bail!("publish.program must not be empty");
        }

        Ok(())
    }

    /// Merge with CLI overrides into the options for one run.
    pub fn build_options(&self, root: &Path, cli: &CliOverrides) -> Result<ReleaseOptions> {
        self.validate()?;

        let manifest = cli.manifest.as_ref().unwrap_or(&self.manifest);
        let manifest_path = root.join(manifest);
        let kind = ManifestKind::detect(&manifest_path);

        let publish = if self.publish.enabled && !cli.no_publish {
            let default_program = self
                .publish
                .program
                .as_deref()
                .unwrap_or_else(|| kind.publish_program());
            let prerelease_tag = match &self.publish.prerelease_tag {
                Some(tag) if tag.is_empty() => None,
                Some(tag) => Some(tag.clone()),
                None if kind == ManifestKind::PackageJson => Some("dev".to_string()),
                None => None,
            };
            Some(PublishCommand {
                program: resolve_program(PUBLISH_BIN_ENV, default_program),
                args: self.publish.args.clone(),
                prerelease_tag,
            })
        } else {
            None
        };

        Ok(ReleaseOptions {
            root: root.to_path_buf(),
            manifest_path,
            changelog_json_path: root.join(&self.changelog_json),
            changelog_md_path: root.join(&self.changelog_md),
            commit_types_path: self.commit_types.as_ref().map(|p| root.join(p)),
            log_depth: self.log_depth,
            intent: VersionIntent::from_parts(cli.bump, cli.version.clone()),
            prerelease: cli.prerelease,
            assume_yes: cli.assume_yes,
            git_program: resolve_program(GIT_BIN_ENV, "git"),
            git_remote: self.git.remote.clone(),
            publish,
        })
    }
}
