//! Parser for the oracle's Go declaration syntax.
//!
//! Accepts one line of the form `func <name>(<params>) <result>`, where
//! consecutive parameters may share a trailing type (`a, b int64`).

use crate::declaration::Parameter;
use crate::error::{BindgenError, Result};

/// A parsed Go function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoSignature {
    pub name: String,
    /// Parameters in call order, every one typed.
    pub parameters: Vec<Parameter>,
    /// Single result type; empty when the function returns nothing.
    pub return_type: String,
}

/// One comma-separated parameter group before type fill.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParamGroup {
    name: String,
    ty: Option<String>,
}

impl GoSignature {
    /// Parse a Go signature line.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let mut cursor = Cursor::new(line);

        if !cursor.eat_keyword("func") {
            return Err(BindgenError::malformed(format!(
                "expected 'func' at start of {line:?}"
            )));
        }
        cursor.skip_whitespace();
        if cursor.peek() == Some('(') {
            return Err(BindgenError::malformed(format!(
                "methods are not exported functions: {line:?}"
            )));
        }
        let name = cursor
            .identifier()
            .ok_or_else(|| BindgenError::malformed(format!("missing function name in {line:?}")))?;

        let params_raw = cursor
            .bracketed('(', ')')
            .ok_or_else(|| BindgenError::malformed(format!("unbalanced parameter list in {line:?}")))?;

        let return_type = cursor.rest().trim().to_string();
        if return_type.starts_with('(') {
            return Err(BindgenError::MultiReturnUnsupported {
                declaration: line.to_string(),
            });
        }
        if return_type.contains(char::is_whitespace) {
            return Err(BindgenError::malformed(format!(
                "unexpected result type {return_type:?} in {line:?}"
            )));
        }

        let groups = split_groups(params_raw)
            .map_err(|detail| BindgenError::malformed(format!("{line:?}: {detail}")))?;
        let parameters = fill_types(&name, groups)?;

        Ok(Self {
            name,
            parameters,
            return_type,
        })
    }
}

/// Split a parameter list on top-level commas into name/type groups.
fn split_groups(raw: &str) -> std::result::Result<Vec<ParamGroup>, String> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);

    parts
        .into_iter()
        .map(|part| {
            let words: Vec<&str> = part.split_whitespace().collect();
            match words.as_slice() {
                [name] => Ok(ParamGroup {
                    name: name.to_string(),
                    ty: None,
                }),
                [name, ty] => Ok(ParamGroup {
                    name: name.to_string(),
                    ty: Some(ty.to_string()),
                }),
                [] => Err("empty parameter".to_string()),
                _ => Err(format!("cannot split parameter {:?}", part.trim())),
            }
        })
        .collect()
}

/// Assign types right to left: a parameter without its own type takes the
/// type of the parameter to its right.
fn fill_types(function: &str, mut groups: Vec<ParamGroup>) -> Result<Vec<Parameter>> {
    let mut trailing: Option<String> = None;

    for group in groups.iter_mut().rev() {
        match &group.ty {
            Some(ty) => trailing = Some(ty.clone()),
            None => group.ty = trailing.clone(),
        }
    }

    groups
        .into_iter()
        .map(|group| match group.ty {
            Some(ty) => Ok(Parameter::new(group.name, ty)),
            None => Err(BindgenError::ArityMismatch {
                function: function.to_string(),
                detail: format!("parameter '{}' has no type", group.name),
            }),
        })
        .collect()
}

/// Minimal character cursor for the signature grammar.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consume `word` if it is followed by whitespace.
    fn eat_keyword(&mut self, word: &str) -> bool {
        match self.rest().strip_prefix(word) {
            Some(after) if after.starts_with(char::is_whitespace) => {
                self.pos += word.len();
                true
            }
            _ => false,
        }
    }

    fn identifier(&mut self) -> Option<String> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let ident = &rest[..len];
        if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        self.pos += len;
        Some(ident.to_string())
    }

    /// Consume a balanced `open ... close` run and return its inside.
    fn bracketed(&mut self, open: char, close: char) -> Option<&'a str> {
        let rest = self.rest();
        if !rest.starts_with(open) {
            return None;
        }
        let mut depth = 0usize;
        for (i, c) in rest.char_indices() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    self.pos += i + c.len_utf8();
                    return Some(&rest[open.len_utf8()..i]);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_grouped_params() {
        let sig = GoSignature::parse("func add(a, b int64) int64").unwrap();
        assert_eq!(sig.name, "add");
        assert_eq!(
            sig.parameters,
            vec![Parameter::new("a", "int64"), Parameter::new("b", "int64")]
        );
        assert_eq!(sig.return_type, "int64");
    }

    #[test]
    fn fill_runs_right_to_left() {
        let sig = GoSignature::parse("func scale(a, b int64, c float64) float64").unwrap();
        assert_eq!(
            sig.parameters,
            vec![
                Parameter::new("a", "int64"),
                Parameter::new("b", "int64"),
                Parameter::new("c", "float64"),
            ]
        );
        assert_eq!(sig.return_type, "float64");
    }

    #[test]
    fn fill_spans_several_groups() {
        let sig = GoSignature::parse("func f(a, b, c string, d, e []float64)").unwrap();
        let types: Vec<&str> = sig.parameters.iter().map(|p| p.native_type.as_str()).collect();
        assert_eq!(types, ["string", "string", "string", "[]float64", "[]float64"]);
        assert!(sig.return_type.is_empty());
    }

    #[test]
    fn no_params_no_result() {
        let sig = GoSignature::parse("func tick()").unwrap();
        assert!(sig.parameters.is_empty());
        assert!(sig.return_type.is_empty());
    }

    #[test]
    fn trailing_untyped_param_is_arity_mismatch() {
        let err = GoSignature::parse("func f(a int, b)").unwrap_err();
        match err {
            BindgenError::ArityMismatch { function, detail } => {
                assert_eq!(function, "f");
                assert!(detail.contains("'b'"));
            }
            other => panic!("expected ArityMismatch, got {other:?}"),
        }
    }

    #[test]
    fn multiple_results_rejected() {
        let err = GoSignature::parse("func divmod(a, b int) (int, int)").unwrap_err();
        assert!(matches!(err, BindgenError::MultiReturnUnsupported { .. }));
    }

    #[test]
    fn malformed_lines() {
        for line in [
            "",
            "package foo // import \"foo\"",
            "func (s *Server) Run()",
            "func f(a int",
            "func f(a b c) int",
            "func f(a int,) int",
            "funcf(a int)",
        ] {
            assert!(
                matches!(
                    GoSignature::parse(line),
                    Err(BindgenError::MalformedSignature { .. })
                ),
                "{line:?} should be malformed"
            );
        }
    }

    #[test]
    fn nested_brackets_stay_in_one_group() {
        let sig = GoSignature::parse("func f(m map[string]int, n int) bool").unwrap();
        assert_eq!(sig.parameters[0].native_type, "map[string]int");
        assert_eq!(sig.parameters[1].native_type, "int");
    }
}
