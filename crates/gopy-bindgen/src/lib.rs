//! Python binding generation for cgo-exported shared libraries.
//!
//! Reads the export header cgo writes next to a `-buildmode=c-shared`
//! library, recovers each function's Go signature from a signature oracle,
//! and renders a ctypes module that loads the library and wraps every export.
//!
//! ## Modules
//!
//! - [`header`]: Export block reader and line tokenizer
//! - [`csig`]: C declaration parser for header lines
//! - [`declaration`]: Function declarations and the header declaration parser
//! - [`gosig`]: Go signature parser with grouped-type fill
//! - [`oracle`]: Signature oracles and reconciliation
//! - [`typemap`]: Go → ctypes/Python type mapping
//! - [`codegen`]: Python module rendering
//! - [`pipeline`]: End-to-end generation

pub mod codegen;
pub mod csig;
pub mod declaration;
pub mod error;
pub mod gosig;
pub mod header;
pub mod oracle;
pub mod pipeline;
pub mod typemap;

// Re-export key types for convenience
pub use codegen::{render_module, GenerateOptions, LoadMode};
pub use declaration::{FunctionDecl, Parameter};
pub use error::{BindgenError, Result};
pub use oracle::{GoDocOracle, SignatureOracle, StaticOracle};
pub use pipeline::{collect_declarations, generate_bindings, generate_from_source};
pub use typemap::TypeMap;
