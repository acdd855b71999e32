//! Registry of known conventional-commit types.
//!
//! Key order matters: the classifier tries keys in registry order and the
//! first match wins.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::CommitType;

const BUILTIN_TYPES: &[(&str, &str, &str)] = &[
    ("feat", "Features", "A new feature"),
    ("fix", "Bug Fixes", "A bug fix"),
    ("docs", "Documentation", "Documentation only changes"),
    (
        "style",
        "Styles",
        "Changes that do not affect the meaning of the code (white-space, formatting, missing semi-colons, etc)",
    ),
    (
        "refactor",
        "Code Refactoring",
        "A code change that neither fixes a bug nor adds a feature",
    ),
    (
        "perf",
        "Performance Improvements",
        "A code change that improves performance",
    ),
    (
        "test",
        "Tests",
        "Adding missing tests or correcting existing tests",
    ),
    (
        "build",
        "Builds",
        "Changes that affect the build system or external dependencies (example scopes: gulp, broccoli, npm)",
    ),
    (
        "ci",
        "Continuous Integrations",
        "Changes to our CI configuration files and scripts (example scopes: Travis, Circle, BrowserStack, SauceLabs)",
    ),
    (
        "chore",
        "Chores",
        "Other changes that don't modify src or test files",
    ),
    ("revert", "Reverts", "Reverts a previous commit"),
];

#[derive(Debug, Default, Deserialize)]
struct TypeMeta {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    types: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitTypeRegistry {
    types: Vec<CommitType>,
}

impl CommitTypeRegistry {
    pub fn new(types: Vec<CommitType>) -> Self {
        Self { types }
    }

    /// The standard conventional-commit types.
    pub fn builtin() -> Self {
        let types = BUILTIN_TYPES
            .iter()
            .map(|(key, title, description)| CommitType::new(key, title, description))
            .collect();
        Self { types }
    }

    /// Parse a `{ "types": { "<key>": { "title", "description" } } }` document.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: RegistryFile =
            serde_json::from_str(content).context("failed to parse commit type registry JSON")?;

        let mut types = Vec::with_capacity(file.types.len());
        for (key, value) in file.types {
            let meta: TypeMeta = serde_json::from_value(value)
                .with_context(|| format!("invalid entry for commit type '{key}'"))?;
            types.push(CommitType {
                key,
                title: meta.title,
                description: meta.description,
            });
        }

        Ok(Self { types })
    }

    /// Load a registry file. A missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read commit types {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("failed to load commit types {}", path.display()))
    }

    pub fn get(&self, key: &str) -> Option<&CommitType> {
        self.types.iter().find(|t| t.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
