//! Hand-written parser for the header's C declaration syntax.
//!
//! Handles the declarations cgo writes into an export header: stdint and
//! builtin C types, the `Go*` typedefs, `const`, pointers and `struct`
//! return types. Does NOT handle function pointers, arrays or variadics.

use std::fmt;

use crate::error::{BindgenError, Result};

/// A C type as spelled in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CType {
    Void,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
    Bool,
    SizeT,
    // stdint types
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    // cgo typedefs
    GoInt,
    GoInt8,
    GoInt16,
    GoInt32,
    GoInt64,
    GoUint,
    GoUint8,
    GoUint16,
    GoUint32,
    GoUint64,
    GoUintptr,
    GoFloat32,
    GoFloat64,
    GoComplex64,
    GoComplex128,
    GoString,
    GoSlice,
    GoInterface,
    GoMap,
    GoChan,
    /// Pointer to another type.
    Pointer(Box<CType>),
    /// Const-qualified type.
    Const(Box<CType>),
    /// `struct name`, as cgo spells multi-value returns.
    Struct(String),
    /// Any other typedef name.
    Named(String),
}

impl CType {
    /// Whether this type is void.
    pub fn is_void(&self) -> bool {
        matches!(self, CType::Void)
    }

    /// Strip const qualifiers from outer level.
    pub fn strip_const(&self) -> &CType {
        match self {
            CType::Const(inner) => inner.strip_const(),
            other => other,
        }
    }

    /// Whether this type is an aggregate passed by value.
    pub fn is_struct(&self) -> bool {
        matches!(self.strip_const(), CType::Struct(_))
    }

    /// The Go-side type name this C type stands for, when it can be told
    /// from the header alone.
    ///
    /// Pointers, slices and unknown typedefs have no header-only answer;
    /// those are left for the signature oracle. Builtin C integer widths
    /// assume an LP64 target.
    pub fn native_name(&self) -> Option<&'static str> {
        let name = match self {
            CType::Void => "",
            CType::Char | CType::SignedChar | CType::Int8 | CType::GoInt8 => "int8",
            CType::UnsignedChar | CType::UInt8 | CType::GoUint8 => "uint8",
            CType::Short | CType::Int16 | CType::GoInt16 => "int16",
            CType::UnsignedShort | CType::UInt16 | CType::GoUint16 => "uint16",
            CType::Int | CType::Int32 | CType::GoInt32 => "int32",
            CType::UnsignedInt | CType::UInt32 | CType::GoUint32 => "uint32",
            CType::Long | CType::LongLong | CType::Int64 | CType::GoInt64 => "int64",
            CType::UnsignedLong | CType::UnsignedLongLong | CType::UInt64 | CType::GoUint64 => {
                "uint64"
            }
            CType::SizeT | CType::GoUintptr => "uintptr",
            CType::GoInt => "int",
            CType::GoUint => "uint",
            CType::Float | CType::GoFloat32 => "float32",
            CType::Double | CType::GoFloat64 => "float64",
            CType::GoComplex64 => "complex64",
            CType::GoComplex128 => "complex128",
            CType::Bool => "bool",
            CType::GoString => "string",
            CType::Const(inner) => return inner.native_name(),
            CType::LongDouble
            | CType::GoSlice
            | CType::GoInterface
            | CType::GoMap
            | CType::GoChan
            | CType::Pointer(_)
            | CType::Struct(_)
            | CType::Named(_) => return None,
        };
        Some(name)
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CType::Void => write!(f, "void"),
            CType::Char => write!(f, "char"),
            CType::SignedChar => write!(f, "signed char"),
            CType::UnsignedChar => write!(f, "unsigned char"),
            CType::Short => write!(f, "short"),
            CType::UnsignedShort => write!(f, "unsigned short"),
            CType::Int => write!(f, "int"),
            CType::UnsignedInt => write!(f, "unsigned int"),
            CType::Long => write!(f, "long"),
            CType::UnsignedLong => write!(f, "unsigned long"),
            CType::LongLong => write!(f, "long long"),
            CType::UnsignedLongLong => write!(f, "unsigned long long"),
            CType::Float => write!(f, "float"),
            CType::Double => write!(f, "double"),
            CType::LongDouble => write!(f, "long double"),
            CType::Bool => write!(f, "_Bool"),
            CType::SizeT => write!(f, "size_t"),
            CType::Int8 => write!(f, "int8_t"),
            CType::Int16 => write!(f, "int16_t"),
            CType::Int32 => write!(f, "int32_t"),
            CType::Int64 => write!(f, "int64_t"),
            CType::UInt8 => write!(f, "uint8_t"),
            CType::UInt16 => write!(f, "uint16_t"),
            CType::UInt32 => write!(f, "uint32_t"),
            CType::UInt64 => write!(f, "uint64_t"),
            CType::GoInt => write!(f, "GoInt"),
            CType::GoInt8 => write!(f, "GoInt8"),
            CType::GoInt16 => write!(f, "GoInt16"),
            CType::GoInt32 => write!(f, "GoInt32"),
            CType::GoInt64 => write!(f, "GoInt64"),
            CType::GoUint => write!(f, "GoUint"),
            CType::GoUint8 => write!(f, "GoUint8"),
            CType::GoUint16 => write!(f, "GoUint16"),
            CType::GoUint32 => write!(f, "GoUint32"),
            CType::GoUint64 => write!(f, "GoUint64"),
            CType::GoUintptr => write!(f, "GoUintptr"),
            CType::GoFloat32 => write!(f, "GoFloat32"),
            CType::GoFloat64 => write!(f, "GoFloat64"),
            CType::GoComplex64 => write!(f, "GoComplex64"),
            CType::GoComplex128 => write!(f, "GoComplex128"),
            CType::GoString => write!(f, "GoString"),
            CType::GoSlice => write!(f, "GoSlice"),
            CType::GoInterface => write!(f, "GoInterface"),
            CType::GoMap => write!(f, "GoMap"),
            CType::GoChan => write!(f, "GoChan"),
            CType::Pointer(inner) => write!(f, "{inner}*"),
            CType::Const(inner) => write!(f, "const {inner}"),
            CType::Struct(name) => write!(f, "struct {name}"),
            CType::Named(name) => write!(f, "{name}"),
        }
    }
}

/// A parsed C function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CParam {
    /// Parameter type.
    pub param_type: CType,
    /// Parameter name (may be empty if unnamed).
    pub name: String,
}

/// A parsed C function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSignature {
    /// Return type.
    pub return_type: CType,
    /// Function name.
    pub name: String,
    /// Parameters in call order.
    pub parameters: Vec<CParam>,
}

impl CSignature {
    /// Parse a declaration of the shape `<returnType> <name>(<params>)`.
    ///
    /// Examples:
    /// - `"GoInt64 add(GoInt64 a, GoInt64 b)"`
    /// - `"char* repeat(char* s, GoInt64 n)"`
    /// - `"struct divmod_return divmod(GoInt a, GoInt b)"`
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(BindgenError::malformed("empty declaration"));
        }

        let paren_pos = input
            .find('(')
            .ok_or_else(|| BindgenError::malformed(format!("missing '(' in {input:?}")))?;

        if !input.ends_with(')') {
            return Err(BindgenError::malformed(format!("missing ')' in {input:?}")));
        }

        let before_paren = input[..paren_pos].trim();
        let params_str = &input[paren_pos + 1..input.len() - 1];

        let (return_type, name) = parse_type_and_name(before_paren)
            .map_err(|e| BindgenError::malformed(format!("{input:?}: {}", detail_of(e))))?;
        let parameters = parse_params(params_str)
            .map_err(|e| BindgenError::malformed(format!("{input:?}: {}", detail_of(e))))?;

        Ok(CSignature {
            return_type,
            name,
            parameters,
        })
    }
}

impl fmt::Display for CSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.param_type)?;
            if !param.name.is_empty() {
                write!(f, " {}", param.name)?;
            }
        }
        write!(f, ")")
    }
}

fn detail_of(err: BindgenError) -> String {
    match err {
        BindgenError::MalformedSignature { detail } => detail,
        other => other.to_string(),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a type specifier from the front of a token sequence.
fn parse_base_type(tokens: &[&str]) -> Result<(CType, usize)> {
    if tokens.is_empty() {
        return Err(BindgenError::malformed("expected type"));
    }

    let mut pos = 0;
    let mut is_const = false;

    if tokens[pos] == "const" {
        is_const = true;
        pos += 1;
        if pos >= tokens.len() {
            return Err(BindgenError::malformed("expected type after 'const'"));
        }
    }

    let wrap = |ct: CType| if is_const { CType::Const(Box::new(ct)) } else { ct };

    if tokens[pos] == "struct" {
        pos += 1;
        let name = tokens
            .get(pos)
            .filter(|t| is_identifier(t))
            .ok_or_else(|| BindgenError::malformed("expected struct name"))?;
        return Ok((wrap(CType::Struct(name.to_string())), pos + 1));
    }

    let is_unsigned = tokens[pos] == "unsigned";
    let is_signed = tokens[pos] == "signed";

    if is_unsigned || is_signed {
        pos += 1;
        let ct = match tokens.get(pos).copied() {
            Some("char") => {
                pos += 1;
                if is_unsigned { CType::UnsignedChar } else { CType::SignedChar }
            }
            Some("short") => {
                pos += 1;
                if is_unsigned { CType::UnsignedShort } else { CType::Short }
            }
            Some("int") => {
                pos += 1;
                if is_unsigned { CType::UnsignedInt } else { CType::Int }
            }
            Some("long") => {
                pos += 1;
                if tokens.get(pos) == Some(&"long") {
                    pos += 1;
                    if is_unsigned { CType::UnsignedLongLong } else { CType::LongLong }
                } else if is_unsigned {
                    CType::UnsignedLong
                } else {
                    CType::Long
                }
            }
            // bare `unsigned` / `signed` means `int`
            _ => {
                if is_unsigned { CType::UnsignedInt } else { CType::Int }
            }
        };
        return Ok((wrap(ct), pos));
    }

    let ct = match tokens[pos] {
        "void" => CType::Void,
        "char" => CType::Char,
        "short" => CType::Short,
        "int" => CType::Int,
        "long" => {
            if tokens.get(pos + 1) == Some(&"long") {
                pos += 1;
                CType::LongLong
            } else if tokens.get(pos + 1) == Some(&"double") {
                pos += 1;
                CType::LongDouble
            } else {
                CType::Long
            }
        }
        "float" => CType::Float,
        "double" => CType::Double,
        "_Bool" | "bool" => CType::Bool,
        "size_t" => CType::SizeT,
        "int8_t" => CType::Int8,
        "int16_t" => CType::Int16,
        "int32_t" => CType::Int32,
        "int64_t" => CType::Int64,
        "uint8_t" => CType::UInt8,
        "uint16_t" => CType::UInt16,
        "uint32_t" => CType::UInt32,
        "uint64_t" => CType::UInt64,
        "GoInt" => CType::GoInt,
        "GoInt8" => CType::GoInt8,
        "GoInt16" => CType::GoInt16,
        "GoInt32" => CType::GoInt32,
        "GoInt64" => CType::GoInt64,
        "GoUint" => CType::GoUint,
        "GoUint8" => CType::GoUint8,
        "GoUint16" => CType::GoUint16,
        "GoUint32" => CType::GoUint32,
        "GoUint64" => CType::GoUint64,
        "GoUintptr" => CType::GoUintptr,
        "GoFloat32" => CType::GoFloat32,
        "GoFloat64" => CType::GoFloat64,
        "GoComplex64" => CType::GoComplex64,
        "GoComplex128" => CType::GoComplex128,
        "GoString" | "_GoString_" => CType::GoString,
        "GoSlice" => CType::GoSlice,
        "GoInterface" => CType::GoInterface,
        "GoMap" => CType::GoMap,
        "GoChan" => CType::GoChan,
        other if is_identifier(other) => CType::Named(other.to_string()),
        other => {
            return Err(BindgenError::malformed(format!("unexpected token '{other}'")));
        }
    };
    Ok((wrap(ct), pos + 1))
}

/// Tokenize a C declaration fragment, splitting on whitespace but keeping `*` as separate tokens.
fn tokenize(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for part in s.split_whitespace() {
        let mut remaining = part;
        while !remaining.is_empty() {
            if let Some(star_pos) = remaining.find('*') {
                if star_pos > 0 {
                    tokens.push(&remaining[..star_pos]);
                }
                tokens.push("*");
                remaining = &remaining[star_pos + 1..];
            } else {
                tokens.push(remaining);
                break;
            }
        }
    }
    tokens
}

/// Parse a type followed by pointer stars and an optional trailing name.
fn parse_declarator(s: &str) -> Result<(CType, String)> {
    let tokens = tokenize(s);
    let (base_type, consumed) = parse_base_type(&tokens)?;

    let mut result_type = base_type;
    let mut name = String::new();
    for tok in &tokens[consumed..] {
        match *tok {
            "*" if name.is_empty() => result_type = CType::Pointer(Box::new(result_type)),
            // `char* const p`
            "const" if name.is_empty() => {}
            ident if name.is_empty() && is_identifier(ident) => name = ident.to_string(),
            other => {
                return Err(BindgenError::malformed(format!("unexpected token '{other}'")));
            }
        }
    }
    Ok((result_type, name))
}

/// Parse "return_type function_name" from the part before `(`.
fn parse_type_and_name(s: &str) -> Result<(CType, String)> {
    if s.is_empty() {
        return Err(BindgenError::malformed("empty return type and name"));
    }
    let (return_type, name) = parse_declarator(s)?;
    if name.is_empty() {
        return Err(BindgenError::malformed("missing function name"));
    }
    Ok((return_type, name))
}

/// Parse the parameter list between `(` and `)`.
fn parse_params(s: &str) -> Result<Vec<CParam>> {
    let s = s.trim();
    if s.is_empty() || s == "void" {
        return Ok(Vec::new());
    }

    s.split(',')
        .map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return Err(BindgenError::malformed("empty parameter"));
            }
            if part == "..." {
                return Err(BindgenError::malformed("variadic parameters are not supported"));
            }
            let (param_type, name) = parse_declarator(part)?;
            Ok(CParam { param_type, name })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cgo_export() {
        let sig = CSignature::parse("GoInt64 add(GoInt64 a, GoInt64 b)").unwrap();
        assert_eq!(sig.name, "add");
        assert_eq!(sig.return_type, CType::GoInt64);
        assert_eq!(sig.parameters.len(), 2);
        assert_eq!(sig.parameters[0].name, "a");
        assert_eq!(sig.parameters[1].param_type, CType::GoInt64);
    }

    #[test]
    fn parse_stdint_types() {
        let sig = CSignature::parse("int64_t add(int64_t a, int64_t b)").unwrap();
        assert_eq!(sig.return_type, CType::Int64);
        assert_eq!(sig.return_type.native_name(), Some("int64"));
    }

    #[test]
    fn parse_pointer_types() {
        let sig = CSignature::parse("char* repeat(char* s, GoInt64 n, char *out)").unwrap();
        assert_eq!(sig.return_type, CType::Pointer(Box::new(CType::Char)));
        assert_eq!(sig.parameters[2].name, "out");
        assert_eq!(sig.parameters[2].param_type, CType::Pointer(Box::new(CType::Char)));
        assert_eq!(sig.parameters[0].param_type.native_name(), None);
    }

    #[test]
    fn parse_const_char_pointer() {
        let sig = CSignature::parse("void greet(const char* name)").unwrap();
        assert!(sig.return_type.is_void());
        assert_eq!(
            sig.parameters[0].param_type,
            CType::Pointer(Box::new(CType::Const(Box::new(CType::Char))))
        );
    }

    #[test]
    fn parse_struct_return() {
        let sig = CSignature::parse("struct divmod_return divmod(GoInt a, GoInt b)").unwrap();
        assert!(sig.return_type.is_struct());
        assert_eq!(sig.name, "divmod");
    }

    #[test]
    fn parse_multi_word_types() {
        let sig =
            CSignature::parse("unsigned long long f(long long x, unsigned short y)").unwrap();
        assert_eq!(sig.return_type, CType::UnsignedLongLong);
        assert_eq!(sig.parameters[0].param_type, CType::LongLong);
        assert_eq!(sig.parameters[1].param_type, CType::UnsignedShort);
    }

    #[test]
    fn parse_empty_and_void_params() {
        assert!(CSignature::parse("GoInt64 now()").unwrap().parameters.is_empty());
        assert!(CSignature::parse("int getpid(void)").unwrap().parameters.is_empty());
    }

    #[test]
    fn unknown_typedef_is_named() {
        let sig = CSignature::parse("Handle open(GoString path)").unwrap();
        assert_eq!(sig.return_type, CType::Named("Handle".to_string()));
        assert_eq!(sig.parameters[0].param_type.native_name(), Some("string"));
    }

    #[test]
    fn display_round_trips_spelling() {
        let text = "GoFloat64 scale(GoSlice xs, GoFloat64 k)";
        assert_eq!(CSignature::parse(text).unwrap().to_string(), text);
    }

    #[test]
    fn parse_invalid() {
        assert!(CSignature::parse("").is_err());
        assert!(CSignature::parse("GoInt add GoInt a").is_err());
        assert!(CSignature::parse("GoInt add(GoInt a").is_err());
        assert!(CSignature::parse("GoInt (GoInt a)").is_err());
        assert!(CSignature::parse("GoInt f(GoInt a,)").is_err());
        assert!(CSignature::parse("int printf(const char* fmt, ...)").is_err());
    }
}
