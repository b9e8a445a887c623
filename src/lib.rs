//! hlsc: lowering of shape-annotated array programs to HLS-ready C.
//!
//! Pipeline:
//!
//! ```text
//! annotated source tree (front-end + typer, external)
//!   → Lowerer → [TranslationUnit] → printer → C source
//! ```
//!
//! The lowerer turns every array-valued operation into an explicit loop
//! nest, inlines `map` applications, resolves slices into index
//! arithmetic and derives declarations and function signatures from the
//! typer's annotations. Hardware interface directives are delegated to a
//! `DirectiveInjector`.

pub mod diagnostics;
pub mod directive;
pub mod error;
pub mod lower;
pub mod source;
pub mod target;

pub use directive::{DirectiveInjector, HlsDirectives, InterfaceArg, InterfaceDesc};
pub use error::{Error, LowerError};
pub use lower::{LowerOutput, Lowerer, Warning};
pub use source::Program;

use serde::{Deserialize, Serialize};

/// Knobs for one lowering run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerConfig {
    /// Dump the lowered target tree to stderr.
    pub debug: bool,
    /// Headers included after the fixed `ap_int.h` / `ap_fixed.h` prelude.
    pub headers: Vec<String>,
    /// Decorator that marks the synthesis entry point.
    pub top_marker: String,
    /// Return type of functions without a return annotation.
    pub default_return_type: String,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            headers: Vec::new(),
            top_marker: "top".to_owned(),
            default_return_type: "int".to_owned(),
        }
    }
}

/// Lowers `program` with the default directive injector.
///
/// `interface` describes the entry point's ports; without it no interface
/// directives are inserted.
pub fn lower_program(
    program: &Program,
    interface: Option<&InterfaceDesc>,
    config: &LowerConfig,
) -> Result<LowerOutput, Error> {
    let output = Lowerer::new(config)
        .with_interface(interface)
        .lower_program(program)?;
    if config.debug {
        eprintln!("--- C AST ---\n{:#?}", output.unit);
    }
    Ok(output)
}

/// Lowers `program` and renders it as C source behind the header prelude.
pub fn codegen(
    program: &Program,
    interface: Option<&InterfaceDesc>,
    config: &LowerConfig,
) -> Result<String, Error> {
    let output = lower_program(program, interface, config)?;
    Ok(target::emit_c_source(&output.unit, &config.headers)?)
}

/// Like `codegen`, reading the annotated tree and interface description
/// from their JSON encodings.
pub fn codegen_json(
    program: &str,
    interface: Option<&str>,
    config: &LowerConfig,
) -> Result<String, Error> {
    let program = source::from_json(program)?;
    let interface = interface.map(InterfaceDesc::from_json).transpose()?;
    codegen(&program, interface.as_ref(), config)
}
