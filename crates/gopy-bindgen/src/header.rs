//! Header reading and tokenization.
//!
//! A cgo-generated header carries a prologue of helper declarations, then
//! opens the C-linkage block and lists one `extern` declaration per exported
//! function, each optionally preceded by its `//` doc comment. Only the part
//! after the block opener is considered.

use std::path::Path;

use tracing::debug;

use crate::error::{BindgenError, Result};

/// The line that opens the C-linkage export block.
pub const EXPORT_BLOCK_MARKER: &str = "extern \"C\" {";

const COMMENT_PREFIX: &str = "//";
const EXTERN_PREFIX: &str = "extern ";

/// A header line kept for tokenization, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

/// Kind of a header token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    Function,
}

/// A classified header line with its markers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Source line the token came from.
    pub line: usize,
}

/// Read a header file and keep the comment and export lines of its export block.
pub fn read_header(path: &Path) -> Result<Vec<SourceLine>> {
    let source = std::fs::read_to_string(path)?;
    let lines = select_lines(&source)?;
    debug!(path = %path.display(), kept = lines.len(), "read header");
    Ok(lines)
}

/// Drop everything up to and including the export block opener, then keep
/// only comment lines and `extern` declarations.
///
/// A header without the opener is rejected rather than read as empty.
pub fn select_lines(source: &str) -> Result<Vec<SourceLine>> {
    let mut lines = source.split('\n').enumerate();

    let found = lines
        .by_ref()
        .any(|(_, line)| line.trim_matches('\r').starts_with(EXPORT_BLOCK_MARKER));
    if !found {
        return Err(BindgenError::malformed(format!(
            "header has no export block (expected a line starting with {EXPORT_BLOCK_MARKER:?})"
        )));
    }

    let kept = lines
        .filter_map(|(idx, line)| {
            let line = line.trim_matches('\r');
            if line.starts_with(COMMENT_PREFIX) || line.starts_with(EXTERN_PREFIX) {
                Some(SourceLine {
                    number: idx + 1,
                    text: line.to_string(),
                })
            } else {
                None
            }
        })
        .collect();
    Ok(kept)
}

/// Classify kept lines into comment and function tokens.
///
/// Any other line shape is an error: the reader is expected to have
/// filtered those out already.
pub fn tokenize(lines: &[SourceLine]) -> Result<Vec<Token>> {
    lines.iter().map(tokenize_line).collect()
}

fn tokenize_line(line: &SourceLine) -> Result<Token> {
    let unrecognized = || BindgenError::UnrecognizedLine {
        line_number: line.number,
        line: line.text.clone(),
    };

    if let Some(rest) = line.text.strip_prefix(COMMENT_PREFIX) {
        return Ok(Token {
            kind: TokenKind::Comment,
            text: rest.trim_matches([' ', '\t']).to_string(),
            line: line.number,
        });
    }

    if let Some(rest) = line.text.strip_prefix(EXTERN_PREFIX) {
        let decl = rest.trim_end().strip_suffix(';').ok_or_else(unrecognized)?;
        return Ok(Token {
            kind: TokenKind::Function,
            text: decl.trim().to_string(),
            line: line.number,
        });
    }

    Err(unrecognized())
}
