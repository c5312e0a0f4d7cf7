//! CLI command implementations and shared settings resolution.

pub mod generate;
pub mod inspect;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use gopy_bindgen::{GenerateOptions, GoDocOracle, LoadMode, SignatureOracle, StaticOracle};

use crate::manifest::GopyManifest;

/// Inputs shared by every command. Unset flags fall back to `gopy.toml`.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Go package identifier queried for signatures
    #[arg(long)]
    pub package: Option<String>,
    /// cgo export header
    #[arg(long)]
    pub header: Option<PathBuf>,
    /// Shared library loaded by the generated module
    #[arg(long)]
    pub library: Option<String>,
    /// TOML table of canned signatures used instead of `go doc`
    #[arg(long, conflicts_with = "header_only")]
    pub signatures: Option<PathBuf>,
    /// Skip the signature oracle and use the header's own types
    #[arg(long)]
    pub header_only: bool,
}

/// Generation-only flags.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Output module path (stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Library load mode (eager, deferred)
    #[arg(long)]
    pub load_mode: Option<String>,
    /// Name the loaded library is bound to
    #[arg(long)]
    pub lib_var: Option<String>,
    /// Spaces per indentation level
    #[arg(long)]
    pub indent: Option<usize>,
}

/// Where signatures come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleChoice {
    /// Header types only.
    HeaderOnly,
    /// A canned signature table.
    Signatures(PathBuf),
    /// An external command run from `dir`.
    Command { argv: Option<Vec<String>>, dir: PathBuf },
}

/// Fully resolved command settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub package: String,
    pub header: PathBuf,
    pub output: Option<PathBuf>,
    pub oracle: OracleChoice,
    pub options: GenerateOptions,
}

impl Settings {
    /// Merge command-line flags over manifest values.
    ///
    /// Flag paths are relative to `cwd`, manifest paths to the manifest's
    /// directory.
    pub fn resolve(
        cwd: &Path,
        manifest: Option<(&GopyManifest, &Path)>,
        source: &SourceArgs,
        generate: &GenerateArgs,
    ) -> Result<Self> {
        let default_manifest = GopyManifest::default();
        let (m, base) = manifest.unwrap_or((&default_manifest, cwd));
        let from_manifest = |p: &Option<String>| p.as_ref().map(|p| base.join(p));

        let header = source
            .header
            .as_ref()
            .map(|p| cwd.join(p))
            .or_else(|| from_manifest(&m.package.header))
            .context("no header given (use --header or [package].header in gopy.toml)")?;

        let output = generate
            .output
            .as_ref()
            .map(|p| cwd.join(p))
            .or_else(|| from_manifest(&m.package.output));

        let oracle = if source.header_only {
            OracleChoice::HeaderOnly
        } else if let Some(sigs) = &source.signatures {
            OracleChoice::Signatures(cwd.join(sigs))
        } else if let Some(sigs) = from_manifest(&m.oracle.signatures) {
            OracleChoice::Signatures(sigs)
        } else {
            OracleChoice::Command {
                argv: m.oracle.command.clone(),
                dir: base.to_path_buf(),
            }
        };

        let package = source
            .package
            .clone()
            .or_else(|| m.package.import_path.clone());
        let package = match (&oracle, package) {
            (_, Some(package)) => package,
            (OracleChoice::Command { .. }, None) => {
                bail!("no package given (use --package or [package].import-path in gopy.toml)")
            }
            (_, None) => String::new(),
        };

        let mut options = GenerateOptions::default();
        if let Some(library) = source.library.clone().or_else(|| m.package.library.clone()) {
            options.library = library;
        }
        if let Some(mode) = &generate.load_mode {
            options.load_mode = parse_load_mode(mode)?;
        } else if let Some(mode) = m.generation.load_mode {
            options.load_mode = mode;
        }
        if let Some(lib_var) = generate.lib_var.clone().or_else(|| m.generation.lib_var.clone()) {
            options.lib_var = lib_var;
        }
        if let Some(indent) = generate.indent.or(m.generation.indent) {
            options.indent = indent;
        }

        Ok(Self {
            package,
            header,
            output,
            oracle,
            options,
        })
    }

    /// Build the configured oracle, `None` in header-only mode.
    pub fn oracle(&self) -> Result<Option<Box<dyn SignatureOracle>>> {
        let oracle: Box<dyn SignatureOracle> = match &self.oracle {
            OracleChoice::HeaderOnly => return Ok(None),
            OracleChoice::Signatures(path) => Box::new(
                StaticOracle::load(path)
                    .with_context(|| format!("loading signatures from {}", path.display()))?,
            ),
            OracleChoice::Command { argv, dir } => {
                let oracle = match argv {
                    Some(argv) => GoDocOracle::from_argv(argv)
                        .context("[oracle].command must not be empty")?,
                    None => GoDocOracle::new(),
                };
                Box::new(oracle.in_dir(dir))
            }
        };
        Ok(Some(oracle))
    }

    /// Read the header text.
    pub fn read_header(&self) -> Result<String> {
        std::fs::read_to_string(&self.header)
            .with_context(|| format!("reading {}", self.header.display()))
    }
}

fn parse_load_mode(s: &str) -> Result<LoadMode> {
    match s {
        "eager" => Ok(LoadMode::Eager),
        "deferred" => Ok(LoadMode::Deferred),
        other => bail!("unknown load mode '{other}' (expected eager or deferred)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(text: &str) -> GopyManifest {
        GopyManifest::from_str(text).unwrap()
    }

    #[test]
    fn flags_override_manifest() {
        let m = manifest(
            r#"
[package]
import-path = "example.com/demo"
header = "demo.h"
library = "./demo.so"

[generation]
load-mode = "deferred"
indent = 2
"#,
        );
        let source = SourceArgs {
            library: Some("/opt/demo.so".to_string()),
            ..SourceArgs::default()
        };
        let generate = GenerateArgs {
            load_mode: Some("eager".to_string()),
            ..GenerateArgs::default()
        };
        let settings = Settings::resolve(
            Path::new("/work/sub"),
            Some((&m, Path::new("/work"))),
            &source,
            &generate,
        )
        .unwrap();
        assert_eq!(settings.header, Path::new("/work/demo.h"));
        assert_eq!(settings.package, "example.com/demo");
        assert_eq!(settings.options.library, "/opt/demo.so");
        assert_eq!(settings.options.load_mode, LoadMode::Eager);
        assert_eq!(settings.options.indent, 2);
        assert_eq!(
            settings.oracle,
            OracleChoice::Command {
                argv: None,
                dir: PathBuf::from("/work"),
            }
        );
    }

    #[test]
    fn header_is_required() {
        let err = Settings::resolve(
            Path::new("/work"),
            None,
            &SourceArgs::default(),
            &GenerateArgs::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no header given"));
    }

    #[test]
    fn package_required_only_for_command_oracle() {
        let source = SourceArgs {
            header: Some(PathBuf::from("demo.h")),
            ..SourceArgs::default()
        };
        assert!(Settings::resolve(Path::new("/w"), None, &source, &GenerateArgs::default()).is_err());

        let source = SourceArgs {
            header: Some(PathBuf::from("demo.h")),
            header_only: true,
            ..SourceArgs::default()
        };
        let settings =
            Settings::resolve(Path::new("/w"), None, &source, &GenerateArgs::default()).unwrap();
        assert_eq!(settings.oracle, OracleChoice::HeaderOnly);
        assert!(settings.oracle().unwrap().is_none());
    }

    #[test]
    fn signatures_flag_is_cwd_relative() {
        let source = SourceArgs {
            header: Some(PathBuf::from("demo.h")),
            signatures: Some(PathBuf::from("sigs.toml")),
            ..SourceArgs::default()
        };
        let settings =
            Settings::resolve(Path::new("/w"), None, &source, &GenerateArgs::default()).unwrap();
        assert_eq!(settings.oracle, OracleChoice::Signatures(PathBuf::from("/w/sigs.toml")));
    }

    #[test]
    fn bad_load_mode() {
        assert!(parse_load_mode("lazy").is_err());
        assert_eq!(parse_load_mode("deferred").unwrap(), LoadMode::Deferred);
    }
}
