//! Signature oracle and reconciliation.
//!
//! The header only carries C-level types. The oracle answers, per function,
//! with the Go declaration the export was compiled from, which is
//! authoritative for parameter names, parameter types and the result type.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::declaration::FunctionDecl;
use crate::error::{BindgenError, Result};
use crate::gosig::GoSignature;

/// Source of canonical Go signatures.
pub trait SignatureOracle {
    /// Return one line of the form `func <name>(<params>) <result>` for
    /// `function` in `package`.
    fn query(&self, package: &str, function: &str) -> Result<String>;
}

impl<F> SignatureOracle for F
where
    F: Fn(&str, &str) -> Result<String>,
{
    fn query(&self, package: &str, function: &str) -> Result<String> {
        self(package, function)
    }
}

/// Oracle backed by `go doc -u <package> <function>`.
#[derive(Debug, Clone)]
pub struct GoDocOracle {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl Default for GoDocOracle {
    fn default() -> Self {
        Self {
            program: "go".to_string(),
            args: vec!["doc".to_string(), "-u".to_string()],
            working_dir: None,
        }
    }
}

impl GoDocOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom command prefix; package and function are appended.
    ///
    /// Returns `None` for an empty argv.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            working_dir: None,
        })
    }

    /// Run the command from `dir` (module resolution is directory-relative).
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl SignatureOracle for GoDocOracle {
    fn query(&self, package: &str, function: &str) -> Result<String> {
        let unavailable = |diagnostic: String| BindgenError::OracleUnavailable {
            package: package.to_string(),
            function: function.to_string(),
            diagnostic,
        };

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(package).arg(function);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        debug!(program = %self.program, package, function, "querying signature oracle");

        let output = cmd
            .output()
            .map_err(|e| unavailable(format!("failed to invoke {}: {e}", self.program)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let text: Vec<&str> = [stdout.trim(), stderr.trim()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect();
            return Err(unavailable(format!("{}: {}", output.status, text.join("\n"))));
        }

        first_line(&stdout)
            .map(str::to_string)
            .ok_or_else(|| unavailable("empty output".to_string()))
    }
}

/// First line of oracle output, if it has any text.
fn first_line(output: &str) -> Option<&str> {
    output
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Oracle answering from a fixed table of signatures, keyed by function.
///
/// The package is not consulted. Useful offline and in tests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticOracle {
    #[serde(default)]
    signatures: BTreeMap<String, String>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the signature for `function`.
    pub fn with(mut self, function: impl Into<String>, signature: impl Into<String>) -> Self {
        self.signatures.insert(function.into(), signature.into());
        self
    }

    /// Parse a `[signatures]` table mapping function names to Go signatures.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Load a signature table from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl SignatureOracle for StaticOracle {
    fn query(&self, package: &str, function: &str) -> Result<String> {
        self.signatures
            .get(function)
            .and_then(|sig| first_line(sig))
            .map(str::to_string)
            .ok_or_else(|| BindgenError::OracleUnavailable {
                package: package.to_string(),
                function: function.to_string(),
                diagnostic: "no signature on record".to_string(),
            })
    }
}

/// Replace header-derived parameters and result types with the oracle's.
///
/// Doc comments are left as parsed from the header. The first failure
/// aborts the whole pass.
pub fn reconcile(
    funcs: &mut [FunctionDecl],
    package: &str,
    oracle: &dyn SignatureOracle,
) -> Result<()> {
    for func in funcs.iter_mut() {
        reconcile_function(func, package, oracle)?;
    }
    Ok(())
}

fn reconcile_function(
    func: &mut FunctionDecl,
    package: &str,
    oracle: &dyn SignatureOracle,
) -> Result<()> {
    let line = oracle.query(package, &func.name)?;
    let sig = GoSignature::parse(&line)?;

    if sig.name != func.name {
        return Err(BindgenError::malformed(format!(
            "oracle answered for '{}' when asked for '{}'",
            sig.name, func.name
        )));
    }
    if sig.parameters.len() != func.parameters.len() {
        return Err(BindgenError::ArityMismatch {
            function: func.name.clone(),
            detail: format!(
                "header declares {} parameters, oracle reports {}",
                func.parameters.len(),
                sig.parameters.len()
            ),
        });
    }

    debug!(function = %func.name, signature = %line, "reconciled");
    func.parameters = sig.parameters;
    func.native_return_type = sig.return_type;
    Ok(())
}
