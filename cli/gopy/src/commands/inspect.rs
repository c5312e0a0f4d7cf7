//! `gopy inspect`: show reconciled declarations.

use anyhow::{bail, Context, Result};
use gopy_bindgen::{collect_declarations, FunctionDecl};

use super::Settings;

/// Print the declarations bindings would be generated from.
pub fn run(settings: &Settings, export: &str) -> Result<()> {
    let source = settings.read_header()?;
    let oracle = settings.oracle()?;
    let funcs = collect_declarations(&source, &settings.package, oracle.as_deref())
        .with_context(|| format!("processing {}", settings.header.display()))?;

    match export {
        "text" => print!("{}", render_text(&funcs)),
        "json" => println!("{}", serde_json::to_string_pretty(&funcs)?),
        other => bail!("unknown export format '{other}' (expected text or json)"),
    }
    Ok(())
}

/// Go-style listing, one function per paragraph.
fn render_text(funcs: &[FunctionDecl]) -> String {
    let mut lines = Vec::new();
    for func in funcs {
        for doc in func.doc_comment.lines() {
            lines.push(format!("// {doc}").trim_end().to_string());
        }
        let params = func
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.name, p.native_type))
            .collect::<Vec<_>>()
            .join(", ");
        let ret = if func.has_return() {
            format!(" {}", func.native_return_type)
        } else {
            String::new()
        };
        lines.push(format!("func {}({params}){ret}", func.name));
        lines.push(String::new());
    }
    if lines.is_empty() {
        return "// No exported functions.\n".to_string();
    }
    lines.join("\n")
}
