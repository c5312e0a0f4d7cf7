//! Go type → ctypes descriptor / Python type mapping.
//!
//! The table is closed and immutable: it is built once per generation run
//! and passed to the code generator. A lookup miss is always an error.

use std::collections::HashMap;

use crate::declaration::FunctionDecl;
use crate::error::{BindgenError, Result, TypeUse};

/// ctypes structure used to pass Go strings.
pub const STRING_CARRIER: &str = "GoString";
/// ctypes structure used to pass Go slices.
pub const BUFFER_CARRIER: &str = "GoSlice";

const SLICE_PREFIX: &str = "[]";

/// How a value crosses the native-call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarshalKind {
    /// Passed as-is (numbers, bools, no value).
    Direct,
    /// Encoded into a pointer/length string carrier.
    StringCarrier,
    /// Copied into a pointer/length/capacity buffer carrier.
    BufferCarrier,
}

/// One row of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// ctypes descriptor used in `argtypes`/`restype`.
    pub ctype: &'static str,
    /// Python annotation for the wrapper signature.
    pub host_type: &'static str,
}

/// Resolved binding for one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBinding {
    pub kind: MarshalKind,
    /// Descriptor registered in `argtypes`.
    pub arg_type: String,
    /// Python annotation.
    pub host_type: String,
    /// Element descriptor for buffer carriers.
    pub element_ctype: Option<String>,
}

/// Resolved binding for a return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultBinding {
    pub kind: MarshalKind,
    /// Descriptor registered in `restype`.
    pub res_type: String,
    /// Python annotation.
    pub host_type: String,
}

/// The immutable type table.
#[derive(Debug, Clone)]
pub struct TypeMap {
    entries: HashMap<&'static str, TypeMapping>,
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::standard()
    }
}

impl TypeMap {
    /// The supported Go types on a 64-bit target.
    pub fn standard() -> Self {
        let rows: [(&'static str, &'static str, &'static str); 13] = [
            ("string", STRING_CARRIER, "str"),
            ("int", "ctypes.c_longlong", "int"),
            ("int64", "ctypes.c_longlong", "int"),
            ("int32", "ctypes.c_int", "int"),
            ("int16", "ctypes.c_short", "int"),
            ("uint", "ctypes.c_ulonglong", "int"),
            ("uint64", "ctypes.c_ulonglong", "int"),
            ("uint32", "ctypes.c_uint", "int"),
            ("uint16", "ctypes.c_ushort", "int"),
            ("float64", "ctypes.c_double", "float"),
            ("float32", "ctypes.c_float", "float"),
            ("bool", "ctypes.c_bool", "bool"),
            ("", "None", "None"),
        ];
        let entries = rows
            .into_iter()
            .map(|(native, ctype, host_type)| (native, TypeMapping { ctype, host_type }))
            .collect();
        Self { entries }
    }

    /// Look up a non-slice Go type.
    pub fn get(&self, native_type: &str) -> Option<&TypeMapping> {
        self.entries.get(native_type)
    }

    /// Resolve the binding of a parameter of `function`.
    ///
    /// Slice elements must be scalar: strings and nested slices have no
    /// element descriptor to copy into the buffer.
    pub fn param(&self, function: &str, native_type: &str) -> Result<ParamBinding> {
        let unsupported = || BindgenError::unsupported(function, native_type);

        if let Some(element) = native_type.strip_prefix(SLICE_PREFIX) {
            let mapping = self
                .get(element)
                .filter(|_| !element.is_empty() && element != "string")
                .ok_or_else(unsupported)?;
            return Ok(ParamBinding {
                kind: MarshalKind::BufferCarrier,
                arg_type: BUFFER_CARRIER.to_string(),
                host_type: format!("List[{}]", mapping.host_type),
                element_ctype: Some(mapping.ctype.to_string()),
            });
        }

        if native_type.is_empty() {
            return Err(unsupported());
        }
        let mapping = self.get(native_type).ok_or_else(unsupported)?;
        let kind = if native_type == "string" {
            MarshalKind::StringCarrier
        } else {
            MarshalKind::Direct
        };
        Ok(ParamBinding {
            kind,
            arg_type: mapping.ctype.to_string(),
            host_type: mapping.host_type.to_string(),
            element_ctype: None,
        })
    }

    /// Resolve the binding of the return type of `function`.
    pub fn result(&self, function: &str, native_type: &str) -> Result<ResultBinding> {
        let mapping = self
            .get(native_type)
            .ok_or_else(|| BindgenError::unsupported(function, native_type))?;
        let kind = if native_type == "string" {
            MarshalKind::StringCarrier
        } else {
            MarshalKind::Direct
        };
        Ok(ResultBinding {
            kind,
            res_type: mapping.ctype.to_string(),
            host_type: mapping.host_type.to_string(),
        })
    }

    /// Check every parameter and return type, reporting all misses at once.
    pub fn validate(&self, funcs: &[FunctionDecl]) -> Result<()> {
        let mut uses = Vec::new();
        for func in funcs {
            for param in &func.parameters {
                if self.param(&func.name, &param.native_type).is_err() {
                    uses.push(TypeUse {
                        function: func.name.clone(),
                        native_type: param.native_type.clone(),
                    });
                }
            }
            if self.result(&func.name, &func.native_return_type).is_err() {
                uses.push(TypeUse {
                    function: func.name.clone(),
                    native_type: func.native_return_type.clone(),
                });
            }
        }

        if uses.is_empty() {
            Ok(())
        } else {
            Err(BindgenError::UnsupportedType { uses })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::Parameter;

    #[test]
    fn map_scalars() {
        let map = TypeMap::standard();
        let p = map.param("f", "int64").unwrap();
        assert_eq!(p.kind, MarshalKind::Direct);
        assert_eq!(p.arg_type, "ctypes.c_longlong");
        assert_eq!(p.host_type, "int");
        assert_eq!(map.param("f", "float32").unwrap().arg_type, "ctypes.c_float");
        assert_eq!(map.param("f", "bool").unwrap().host_type, "bool");
        assert_eq!(map.param("f", "uint16").unwrap().arg_type, "ctypes.c_ushort");
    }

    #[test]
    fn map_string_to_carrier() {
        let map = TypeMap::standard();
        let p = map.param("f", "string").unwrap();
        assert_eq!(p.kind, MarshalKind::StringCarrier);
        assert_eq!(p.arg_type, STRING_CARRIER);
        assert_eq!(p.host_type, "str");

        let r = map.result("f", "string").unwrap();
        assert_eq!(r.kind, MarshalKind::StringCarrier);
        assert_eq!(r.res_type, STRING_CARRIER);
    }

    #[test]
    fn map_slice_to_buffer() {
        let map = TypeMap::standard();
        let p = map.param("f", "[]float64").unwrap();
        assert_eq!(p.kind, MarshalKind::BufferCarrier);
        assert_eq!(p.arg_type, BUFFER_CARRIER);
        assert_eq!(p.host_type, "List[float]");
        assert_eq!(p.element_ctype.as_deref(), Some("ctypes.c_double"));
    }

    #[test]
    fn slice_elements_must_be_scalar() {
        let map = TypeMap::standard();
        for ty in ["[]string", "[][]int", "[]", "[]complex128"] {
            assert!(map.param("f", ty).is_err(), "{ty} should be rejected");
        }
    }

    #[test]
    fn void_result_maps_to_none() {
        let map = TypeMap::standard();
        let r = map.result("f", "").unwrap();
        assert_eq!(r.res_type, "None");
        assert_eq!(r.host_type, "None");
        assert!(map.param("f", "").is_err());
    }

    #[test]
    fn slice_result_unsupported() {
        let map = TypeMap::standard();
        assert!(map.result("f", "[]int64").is_err());
    }

    #[test]
    fn unknown_type_is_named() {
        let map = TypeMap::standard();
        let err = map.param("mul", "complex128").unwrap_err();
        match err {
            BindgenError::UnsupportedType { uses } => {
                assert_eq!(uses.len(), 1);
                assert_eq!(uses[0].native_type, "complex128");
                assert_eq!(uses[0].function, "mul");
            }
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }

    #[test]
    fn validate_reports_every_use() {
        let funcs = vec![
            FunctionDecl {
                name: "a".into(),
                native_return_type: "complex128".into(),
                parameters: vec![Parameter::new("x", "int64")],
                doc_comment: String::new(),
            },
            FunctionDecl {
                name: "b".into(),
                native_return_type: "".into(),
                parameters: vec![Parameter::new("p", "uintptr"), Parameter::new("s", "string")],
                doc_comment: String::new(),
            },
        ];
        match TypeMap::standard().validate(&funcs).unwrap_err() {
            BindgenError::UnsupportedType { uses } => {
                let names: Vec<&str> = uses.iter().map(|u| u.native_type.as_str()).collect();
                assert_eq!(names, ["complex128", "uintptr"]);
            }
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }
}
