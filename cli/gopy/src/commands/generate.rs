//! `gopy generate`: render the binding module.

use anyhow::{bail, Context, Result};
use gopy_bindgen::{collect_declarations, render_module, TypeMap};

use super::Settings;

/// Generate the module and write it to the configured output, or stdout.
///
/// Nothing is written unless every stage succeeds.
pub fn run(settings: &Settings) -> Result<()> {
    if settings.options.library.is_empty() {
        bail!("no library given (use --library or [package].library in gopy.toml)");
    }

    let source = settings.read_header()?;
    let oracle = settings.oracle()?;
    let funcs = collect_declarations(&source, &settings.package, oracle.as_deref())
        .with_context(|| format!("processing {}", settings.header.display()))?;

    let types = TypeMap::standard();
    let text = render_module(&funcs, &types, &settings.options)?;

    match &settings.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            println!(
                "Generated bindings for {} functions → {}",
                funcs.len(),
                path.display()
            );
        }
        None => print!("{text}"),
    }

    Ok(())
}
