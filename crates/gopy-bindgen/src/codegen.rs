//! Python ctypes module rendering.
//!
//! The module is assembled from independent sections: a fixed preamble with
//! the carrier types and marshaling helpers, the library load with one
//! `argtypes`/`restype` registration per function, and one wrapper per
//! function. Sections are joined in input order, so identical input always
//! renders identical text.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::declaration::FunctionDecl;
use crate::error::{BindgenError, Result};
use crate::typemap::{MarshalKind, ParamBinding, TypeMap, BUFFER_CARRIER, STRING_CARRIER};

/// First line of every generated module.
pub const BANNER: &str = "# Code generated by gopy. DO NOT EDIT.";

const SECTION_GAP: &str = "\n\n\n";

/// When the generated module loads the shared library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Load and register at import time.
    #[default]
    Eager,
    /// Load and register from an `init(dll_path)` function.
    Deferred,
}

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GenerateOptions {
    /// Path or name handed to `ctypes.CDLL`.
    pub library: String,
    pub load_mode: LoadMode,
    /// Module-level name the loaded library is bound to.
    pub lib_var: String,
    /// Spaces per indentation level.
    pub indent: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            library: String::new(),
            load_mode: LoadMode::Eager,
            lib_var: "_lib".to_string(),
            indent: 4,
        }
    }
}

impl GenerateOptions {
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            ..Self::default()
        }
    }

    fn indent_unit(&self) -> String {
        " ".repeat(self.indent)
    }
}

/// Render the complete module for `funcs`.
///
/// Every function is checked before any text is produced; an unresolved
/// parameter or an unmapped type aborts the whole render.
pub fn render_module(
    funcs: &[FunctionDecl],
    types: &TypeMap,
    options: &GenerateOptions,
) -> Result<String> {
    check_resolved(funcs)?;
    types.validate(funcs)?;

    let mut sections = vec![render_preamble(options), render_loader(funcs, types, options)?];
    for (func, name) in funcs.iter().zip(wrapper_names(funcs, options)) {
        sections.push(render_wrapper(func, &name, types, options)?);
    }

    let mut text = sections.join(SECTION_GAP);
    text.push('\n');
    Ok(text)
}

fn check_resolved(funcs: &[FunctionDecl]) -> Result<()> {
    for func in funcs {
        if let Some(name) = func.unresolved_parameters().first() {
            return Err(BindgenError::ArityMismatch {
                function: func.name.clone(),
                detail: format!("unresolved parameter type for '{name}'"),
            });
        }
    }
    Ok(())
}

/// The fixed module skeleton: imports, carrier types and helpers.
pub fn render_preamble(options: &GenerateOptions) -> String {
    let ind = options.indent_unit();
    let field_ind = " ".repeat("_fields_ = [".len());
    [
        format!("{BANNER}\n\nimport ctypes\nfrom typing import List"),
        format!(
            "class {STRING_CARRIER}(ctypes.Structure):\n\
             {ind}_fields_ = [('p', ctypes.c_char_p), ('n', ctypes.c_longlong)]"
        ),
        format!(
            "class {BUFFER_CARRIER}(ctypes.Structure):\n\
             {ind}_fields_ = [('data', ctypes.c_void_p),\n\
             {ind}{field_ind}('len', ctypes.c_longlong),\n\
             {ind}{field_ind}('cap', ctypes.c_longlong)]"
        ),
        format!(
            "def go_string(s: str) -> {STRING_CARRIER}:\n\
             {ind}enc = s.encode()\n\
             {ind}return {STRING_CARRIER}(enc, len(enc))"
        ),
        format!(
            "def from_go_string(s: {STRING_CARRIER}) -> str:\n\
             {ind}return s.p[:s.n].decode()"
        ),
        format!(
            "def go_slice(arr: List, ctype) -> {BUFFER_CARRIER}:\n\
             {ind}p = ctypes.cast((ctype * len(arr))(*arr), ctypes.c_void_p)\n\
             {ind}return {BUFFER_CARRIER}(p, len(arr), len(arr))"
        ),
    ]
    .join(SECTION_GAP)
}

/// The `argtypes`/`restype` registration lines for one function.
pub fn render_registration(
    func: &FunctionDecl,
    types: &TypeMap,
    options: &GenerateOptions,
) -> Result<Vec<String>> {
    let arg_types = func
        .parameters
        .iter()
        .map(|p| types.param(&func.name, &p.native_type).map(|b| b.arg_type))
        .collect::<Result<Vec<_>>>()?;
    let result = types.result(&func.name, &func.native_return_type)?;

    let target = native_ref(options, &func.name);
    Ok(vec![
        format!("{target}.argtypes = [{}]", arg_types.join(", ")),
        format!("{target}.restype = {}", result.res_type),
    ])
}

/// The library load followed by every function's registration.
pub fn render_loader(
    funcs: &[FunctionDecl],
    types: &TypeMap,
    options: &GenerateOptions,
) -> Result<String> {
    let lib = &options.lib_var;
    let library = py_string_literal(&options.library);
    let mut lines = Vec::new();

    let body_indent = match options.load_mode {
        LoadMode::Eager => {
            lines.push(format!("{lib} = ctypes.CDLL({library})"));
            String::new()
        }
        LoadMode::Deferred => {
            let ind = options.indent_unit();
            lines.push(format!("{lib}: ctypes.CDLL = None"));
            lines.push(String::new());
            lines.push(String::new());
            lines.push(format!("def init(dll_path: str = {library}) -> None:"));
            lines.push(format!("{ind}global {lib}"));
            lines.push(format!("{ind}{lib} = ctypes.CDLL(dll_path)"));
            ind
        }
    };

    for func in funcs {
        lines.push(String::new());
        for line in render_registration(func, types, options)? {
            lines.push(format!("{body_indent}{line}"));
        }
    }

    Ok(lines.join("\n"))
}

/// Python names for the wrappers of `funcs`, in order.
///
/// A Go name that is a Python keyword, shadows a module-level name or
/// collides with an earlier wrapper gets trailing underscores.
pub fn wrapper_names(funcs: &[FunctionDecl], options: &GenerateOptions) -> Vec<String> {
    let mut used = module_names(options);
    if options.load_mode == LoadMode::Deferred {
        used.insert("init".to_string());
    }
    funcs
        .iter()
        .map(|func| unique_identifier(&func.name, &mut used))
        .collect()
}

/// The Python wrapper for one function, bound to `wrapper_name`.
pub fn render_wrapper(
    func: &FunctionDecl,
    wrapper_name: &str,
    types: &TypeMap,
    options: &GenerateOptions,
) -> Result<String> {
    let ind = options.indent_unit();
    let mut used = module_names(options);
    let params = func
        .parameters
        .iter()
        .map(|p| {
            types
                .param(&func.name, &p.native_type)
                .map(|binding| (unique_identifier(&p.name, &mut used), binding))
        })
        .collect::<Result<Vec<(String, ParamBinding)>>>()?;
    let result = types.result(&func.name, &func.native_return_type)?;

    let signature = params
        .iter()
        .map(|(name, binding)| format!("{name}: {}", binding.host_type))
        .collect::<Vec<_>>()
        .join(", ");
    let mut lines = vec![format!(
        "def {wrapper_name}({signature}) -> {}:",
        result.host_type
    )];

    if !func.doc_comment.is_empty() {
        lines.push(format!("{ind}\"\"\"{}\"\"\"", docstring(&func.doc_comment, &ind)));
    }

    let args = params
        .iter()
        .map(|(name, binding)| marshal_argument(name, binding))
        .collect::<Vec<_>>()
        .join(", ");
    let call = format!("{}({args})", native_ref(options, &func.name));
    let value = match result.kind {
        MarshalKind::StringCarrier => format!("from_go_string({call})"),
        MarshalKind::Direct | MarshalKind::BufferCarrier => call,
    };
    lines.push(format!("{ind}return {value}"));

    Ok(lines.join("\n"))
}

fn marshal_argument(name: &str, binding: &ParamBinding) -> String {
    match (binding.kind, &binding.element_ctype) {
        (MarshalKind::StringCarrier, _) => format!("go_string({name})"),
        (MarshalKind::BufferCarrier, Some(element)) => format!("go_slice({name}, {element})"),
        _ => name.to_string(),
    }
}

const PY_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Names the generated module binds at top level.
const MODULE_NAMES: &[&str] = &[
    "ctypes",
    "List",
    STRING_CARRIER,
    BUFFER_CARRIER,
    "go_string",
    "from_go_string",
    "go_slice",
];

fn module_names(options: &GenerateOptions) -> HashSet<String> {
    MODULE_NAMES
        .iter()
        .map(|name| name.to_string())
        .chain([options.lib_var.clone()])
        .collect()
}

/// `name` made usable as a Python identifier and distinct from `used`.
///
/// The returned name is added to `used`.
fn unique_identifier(name: &str, used: &mut HashSet<String>) -> String {
    let mut ident = name.to_string();
    while PY_KEYWORDS.contains(&ident.as_str()) || used.contains(&ident) {
        ident.push('_');
    }
    used.insert(ident.clone());
    ident
}

/// Expression for the library's native function `name`.
///
/// Keywords cannot follow a `.`, so those go through `getattr`.
fn native_ref(options: &GenerateOptions, name: &str) -> String {
    if PY_KEYWORDS.contains(&name) {
        format!("getattr({}, {})", options.lib_var, py_string_literal(name))
    } else {
        format!("{}.{name}", options.lib_var)
    }
}

/// Single-quoted Python string literal.
fn py_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Docstring body: escaped, continuation lines indented to the body.
fn docstring(doc: &str, ind: &str) -> String {
    let mut text = doc.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    if text.ends_with('"') {
        text.pop();
        text.push_str("\\\"");
    }
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{ind}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
