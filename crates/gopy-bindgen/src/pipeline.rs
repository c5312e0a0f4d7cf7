//! End-to-end binding generation.
//!
//! header text → tokens → declarations → oracle reconciliation → module text.
//! Each stage consumes its whole input before the next starts, and the first
//! error aborts the run without producing any text.

use std::path::Path;

use tracing::{info, warn};

use crate::codegen::{render_module, GenerateOptions};
use crate::declaration::{parse_tokens, FunctionDecl};
use crate::error::Result;
use crate::header::{read_header, select_lines, tokenize};
use crate::oracle::{reconcile, SignatureOracle};
use crate::typemap::TypeMap;

/// Parse declarations from header text.
pub fn parse_header_source(source: &str) -> Result<Vec<FunctionDecl>> {
    let lines = select_lines(source)?;
    let tokens = tokenize(&lines)?;
    parse_tokens(&tokens)
}

/// Parse declarations from a header file.
pub fn parse_header(path: &Path) -> Result<Vec<FunctionDecl>> {
    let lines = read_header(path)?;
    let tokens = tokenize(&lines)?;
    parse_tokens(&tokens)
}

/// Header declarations, reconciled against `oracle` when one is given.
///
/// Without an oracle the header's own types are used as-is.
pub fn collect_declarations(
    source: &str,
    package: &str,
    oracle: Option<&dyn SignatureOracle>,
) -> Result<Vec<FunctionDecl>> {
    let mut funcs = parse_header_source(source)?;
    if funcs.is_empty() {
        warn!("export block contains no function declarations");
    }
    match oracle {
        Some(oracle) => reconcile(&mut funcs, package, oracle)?,
        None => info!("no signature oracle; using header types"),
    }
    Ok(funcs)
}

/// Generate the Python module for header text.
pub fn generate_from_source(
    source: &str,
    package: &str,
    oracle: Option<&dyn SignatureOracle>,
    options: &GenerateOptions,
) -> Result<String> {
    let funcs = collect_declarations(source, package, oracle)?;
    let types = TypeMap::standard();
    let text = render_module(&funcs, &types, options)?;
    info!(
        functions = funcs.len(),
        library = %options.library,
        bytes = text.len(),
        "rendered bindings"
    );
    Ok(text)
}

/// Generate the Python module for a header file.
pub fn generate_bindings(
    header: &Path,
    package: &str,
    oracle: Option<&dyn SignatureOracle>,
    options: &GenerateOptions,
) -> Result<String> {
    let source = std::fs::read_to_string(header)?;
    generate_from_source(&source, package, oracle, options)
}
