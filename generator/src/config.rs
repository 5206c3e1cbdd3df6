//! Run configuration and `cmixgen.toml` parsing.
//!
//! Only *where* things go is configurable. The precision, quantization and
//! folding sets are fixed in [`crate::domain`].

use crate::error::{GenError, Result};
use crate::output::OutputLayout;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The manifest file name.
pub const MANIFEST_FILE: &str = "cmixgen.toml";

/// The raw TOML structure.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    generator: Option<GeneratorSection>,
}

/// `[generator]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GeneratorSection {
    /// Install root the output layout is created under
    pub root: Option<String>,
    /// Directory of template overrides
    pub templates: Option<String>,
}

/// Parse a `cmixgen.toml` string.
pub fn parse_manifest(content: &str) -> Result<GeneratorSection> {
    let raw: RawManifest = toml::from_str(content)
        .map_err(|e| GenError::Manifest(format!("failed to parse {}: {}", MANIFEST_FILE, e)))?;
    Ok(raw.generator.unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Install root; `Include/` and `Source/` are created beneath it
    pub root: PathBuf,
    /// Overrides for the embedded templates
    pub template_dir: Option<PathBuf>,
    /// Render everything but write nothing
    pub dry_run: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            template_dir: None,
            dry_run: false,
        }
    }
}

impl GeneratorConfig {
    /// Build a config from a manifest; relative paths resolve against
    /// `base_dir`, the directory holding the manifest.
    pub fn from_manifest(section: &GeneratorSection, base_dir: &Path) -> Self {
        let mut config = GeneratorConfig::default();
        if let Some(ref root) = section.root {
            config.root = base_dir.join(root);
        }
        config.template_dir = section.templates.as_ref().map(|t| base_dir.join(t));
        config
    }

    /// Load a manifest. `path` may be the file itself or a directory
    /// containing `cmixgen.toml`.
    pub fn load(path: &Path) -> Result<Self> {
        let manifest_path = if path.is_file() {
            path.to_path_buf()
        } else {
            path.join(MANIFEST_FILE)
        };

        let content = std::fs::read_to_string(&manifest_path).map_err(|e| {
            GenError::Manifest(format!("failed to read {}: {}", manifest_path.display(), e))
        })?;
        let section = parse_manifest(&content)?;

        let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::from_manifest(&section, base_dir))
    }

    /// Load `cmixgen.toml` from `dir` if there is one, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self> {
        if dir.join(MANIFEST_FILE).is_file() {
            Self::load(dir)
        } else {
            Ok(Self::default())
        }
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.root)
    }
}
