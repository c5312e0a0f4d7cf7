//! Binding generation error types.

use std::fmt;

/// One place where a native type without a mapping was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeUse {
    /// Function the type appears in.
    pub function: String,
    /// The unmapped native type name.
    pub native_type: String,
}

impl fmt::Display for TypeUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' (in {})", self.native_type, self.function)
    }
}

fn join_uses(uses: &[TypeUse]) -> String {
    uses.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur while generating bindings.
///
/// Every stage fails fast; none of these are recovered per function.
#[derive(Debug, thiserror::Error)]
pub enum BindgenError {
    /// The header file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A kept header line is neither a comment nor an export declaration.
    #[error("unrecognized line {line_number}: {line:?}")]
    UnrecognizedLine { line_number: usize, line: String },

    /// A declaration (header or oracle) does not match its grammar.
    #[error("malformed signature: {detail}")]
    MalformedSignature { detail: String },

    /// The declaration returns an aggregate or multiple values.
    #[error("multiple return values are not supported: {declaration:?}")]
    MultiReturnUnsupported { declaration: String },

    /// The signature oracle failed or produced nothing.
    #[error("signature oracle failed for {package}.{function}: {diagnostic}")]
    OracleUnavailable {
        package: String,
        function: String,
        diagnostic: String,
    },

    /// Parameter types could not be assigned one-to-one.
    #[error("arity mismatch in {function}: {detail}")]
    ArityMismatch { function: String, detail: String },

    /// One or more native types have no entry in the type map.
    #[error("unsupported type(s): {}", join_uses(.uses))]
    UnsupportedType { uses: Vec<TypeUse> },

    /// Two declarations share a name.
    #[error("duplicate function '{name}'")]
    DuplicateFunction { name: String },

    /// TOML parsing error (canned signature tables).
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BindgenError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        BindgenError::MalformedSignature {
            detail: detail.into(),
        }
    }

    pub(crate) fn unsupported(function: &str, native_type: &str) -> Self {
        BindgenError::UnsupportedType {
            uses: vec![TypeUse {
                function: function.to_string(),
                native_type: native_type.to_string(),
            }],
        }
    }
}

/// Result type alias for binding generation.
pub type Result<T> = std::result::Result<T, BindgenError>;
