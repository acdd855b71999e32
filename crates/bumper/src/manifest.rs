//! Package manifest access: current version, homepage, and version rewrite.
//!
//! Two manifest flavours are supported: an npm-style `package.json` and a
//! cargo `Cargo.toml`. Rewrites only touch the version; every other field
//! keeps its value and position.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use toml_edit::DocumentMut;

use crate::state::atomic_write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    PackageJson,
    CargoToml,
}

impl ManifestKind {
    /// `.toml` files are cargo manifests; anything else is treated as JSON.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::CargoToml,
            _ => Self::PackageJson,
        }
    }

    /// Program publishing this kind of package.
    pub fn publish_program(self) -> &'static str {
        match self {
            Self::PackageJson => "npm",
            Self::CargoToml => "cargo",
        }
    }
}

#[derive(Debug, Clone)]
enum Document {
    Json(Value),
    Toml(DocumentMut),
}

#[derive(Debug, Clone)]
pub struct PackageManifest {
    kind: ManifestKind,
    doc: Document,
}

impl PackageManifest {
    pub fn parse(kind: ManifestKind, content: &str) -> Result<Self> {
        let doc = match kind {
            ManifestKind::PackageJson => {
                let value: Value =
                    serde_json::from_str(content).context("failed to parse manifest JSON")?;
                if !value.is_object() {
                    bail!("manifest JSON must be an object");
                }
                Document::Json(value)
            }
            ManifestKind::CargoToml => Document::Toml(
                content
                    .parse::<DocumentMut>()
                    .context("failed to parse manifest TOML")?,
            ),
        };
        Ok(Self { kind, doc })
    }

    /// Load a manifest. A missing file reads as an empty manifest.
    pub fn load(path: &Path) -> Result<Self> {
        let kind = ManifestKind::detect(path);
        if !path.exists() {
            return Ok(Self::empty(kind));
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::parse(kind, &content)
            .with_context(|| format!("failed to load manifest {}", path.display()))
    }

    pub fn empty(kind: ManifestKind) -> Self {
        let doc = match kind {
            ManifestKind::PackageJson => Document::Json(Value::Object(Default::default())),
            ManifestKind::CargoToml => Document::Toml(DocumentMut::new()),
        };
        Self { kind, doc }
    }

    pub fn kind(&self) -> ManifestKind {
        self.kind
    }

    pub fn version(&self) -> Option<String> {
        self.field("version")
    }

    /// Project homepage used for commit links.
    ///
    /// Cargo manifests fall back to `repository` when `homepage` is unset.
    pub fn homepage(&self) -> Option<String> {
        match self.kind {
            ManifestKind::PackageJson => self.field("homepage"),
            ManifestKind::CargoToml => self.field("homepage").or_else(|| self.field("repository")),
        }
    }

    fn field(&self, key: &str) -> Option<String> {
        match &self.doc {
            Document::Json(value) => value.get(key)?.as_str().map(str::to_string),
            Document::Toml(doc) => doc
                .get("package")?
                .get(key)?
                .as_str()
                .map(str::to_string),
        }
    }

    pub fn set_version(&mut self, version: &str) -> Result<()> {
        match &mut self.doc {
            Document::Json(value) => {
                let Some(obj) = value.as_object_mut() else {
                    bail!("manifest JSON must be an object");
                };
                obj.insert("version".to_string(), Value::String(version.to_string()));
            }
            Document::Toml(doc) => {
                let Some(package) = doc
                    .get_mut("package")
                    .and_then(|p| p.as_table_like_mut())
                else {
                    bail!("Cargo.toml has no [package] table");
                };
                package.insert("version", toml_edit::value(version));
            }
        }
        Ok(())
    }

    pub fn render(&self) -> Result<String> {
        match &self.doc {
            Document::Json(value) => {
                let mut out =
                    serde_json::to_string_pretty(value).context("failed to serialize manifest")?;
                out.push('\n');
                Ok(out)
            }
            Document::Toml(doc) => Ok(doc.to_string()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render()?;
        atomic_write(path, content.as_bytes())
    }
}
