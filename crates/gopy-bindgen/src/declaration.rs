//! Exported function declarations and the header declaration parser.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::csig::{CSignature, CType};
use crate::error::{BindgenError, Result};
use crate::header::{Token, TokenKind};

/// A positional parameter of an exported function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    /// Go-side type name (`int64`, `string`, `[]float64`, ...). Empty until resolved.
    pub native_type: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
        }
    }
}

/// One exported function, as read from the header and later reconciled
/// against the signature oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    /// Go-side return type name; empty for no return value.
    pub native_return_type: String,
    /// Parameters in call order.
    pub parameters: Vec<Parameter>,
    /// Comment block attached directly above the declaration.
    pub doc_comment: String,
}

impl FunctionDecl {
    /// Build a declaration from a parsed header signature.
    ///
    /// Types are provisional: C types with a known Go counterpart are
    /// translated, anything else keeps its C spelling.
    pub fn from_c_signature(sig: &CSignature, doc_comment: String) -> Result<Self> {
        if sig.return_type.is_struct() {
            return Err(BindgenError::MultiReturnUnsupported {
                declaration: sig.to_string(),
            });
        }

        let mut parameters = Vec::with_capacity(sig.parameters.len());
        for (i, param) in sig.parameters.iter().enumerate() {
            if param.name.is_empty() {
                return Err(BindgenError::malformed(format!(
                    "parameter {} of {} has no name",
                    i + 1,
                    sig.name
                )));
            }
            parameters.push(Parameter::new(&param.name, provisional_type(&param.param_type)));
        }

        Ok(Self {
            name: sig.name.clone(),
            native_return_type: provisional_type(&sig.return_type),
            parameters,
            doc_comment,
        })
    }

    /// Whether the function returns a value.
    pub fn has_return(&self) -> bool {
        !self.native_return_type.is_empty()
    }

    /// Names of parameters whose type has not been resolved.
    pub fn unresolved_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.native_type.is_empty())
            .map(|p| p.name.as_str())
            .collect()
    }
}

fn provisional_type(ct: &CType) -> String {
    match ct.native_name() {
        Some(name) => name.to_string(),
        None => ct.to_string(),
    }
}

/// Whether a declaration's return position is an aggregate, judged before
/// the declaration grammar is applied.
fn returns_aggregate(decl: &str) -> bool {
    let mut words = decl.split_whitespace();
    match words.next() {
        Some("struct") => true,
        Some("const") => words.next() == Some("struct"),
        _ => false,
    }
}

/// Turn a token stream into function declarations.
///
/// Consecutive comment tokens accumulate into a pending block. The block is
/// attached to a declaration only if it ends on the line directly above it;
/// a blank or skipped line in between detaches it.
pub fn parse_tokens(tokens: &[Token]) -> Result<Vec<FunctionDecl>> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();
    let mut pending: Vec<&Token> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::Comment => {
                if pending.last().is_some_and(|last| last.line + 1 != token.line) {
                    pending.clear();
                }
                pending.push(token);
            }
            TokenKind::Function => {
                let attached = pending.last().is_some_and(|last| last.line + 1 == token.line);
                let doc_comment = if attached {
                    doc_text(&pending)
                } else {
                    String::new()
                };
                pending.clear();

                if returns_aggregate(&token.text) {
                    return Err(BindgenError::MultiReturnUnsupported {
                        declaration: token.text.clone(),
                    });
                }

                let sig = CSignature::parse(&token.text).map_err(|e| match e {
                    BindgenError::MalformedSignature { detail } => BindgenError::malformed(
                        format!("line {}: {detail}", token.line),
                    ),
                    other => other,
                })?;
                let decl = FunctionDecl::from_c_signature(&sig, doc_comment)?;

                if !seen.insert(decl.name.clone()) {
                    return Err(BindgenError::DuplicateFunction { name: decl.name });
                }
                debug!(
                    function = %decl.name,
                    params = decl.parameters.len(),
                    documented = !decl.doc_comment.is_empty(),
                    "parsed header declaration"
                );
                result.push(decl);
            }
        }
    }

    Ok(result)
}

/// Join a comment block into documentation text.
///
/// cgo `export` directives are dropped, as are blank lines at either end.
fn doc_text(comments: &[&Token]) -> String {
    let lines: Vec<&str> = comments
        .iter()
        .map(|t| t.text.as_str())
        .filter(|text| {
            let directive = text.starts_with("export ");
            if directive {
                warn!(directive = %text, "dropping cgo directive from doc comment");
            }
            !directive
        })
        .collect();

    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}
