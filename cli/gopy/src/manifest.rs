//! `gopy.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gopy_bindgen::LoadMode;
use serde::Deserialize;

/// File name searched for from the working directory upward.
pub const MANIFEST_FILE: &str = "gopy.toml";

/// The top-level manifest structure for a binding project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GopyManifest {
    /// What to bind and where to write it.
    #[serde(default)]
    pub package: PackageConfig,
    /// Signature oracle configuration.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Rendering options.
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Package section. Paths are relative to the manifest directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageConfig {
    /// Go package identifier handed to the oracle.
    #[serde(default)]
    pub import_path: Option<String>,
    /// cgo export header.
    #[serde(default)]
    pub header: Option<String>,
    /// Shared library path or name loaded by the generated module.
    #[serde(default)]
    pub library: Option<String>,
    /// Output module path.
    #[serde(default)]
    pub output: Option<String>,
}

/// Oracle section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OracleConfig {
    /// Command prefix; package and function are appended (default `go doc -u`).
    #[serde(default)]
    pub command: Option<Vec<String>>,
    /// Canned signature table used instead of running a command.
    #[serde(default)]
    pub signatures: Option<String>,
}

/// Generation section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GenerationConfig {
    #[serde(default)]
    pub load_mode: Option<LoadMode>,
    #[serde(default)]
    pub lib_var: Option<String>,
    #[serde(default)]
    pub indent: Option<usize>,
}

impl GopyManifest {
    /// Search upward from `start_dir` for a `gopy.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: GopyManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing gopy.toml")
    }
}
