//! Annotated source tree → C target tree lowering.
//!
//! The lowerer walks statements top-down. Expressions with a non-empty
//! shape never lower to a single C expression; they become loop nests that
//! assign one element at a time (`elementwise`, `map`). Every array
//! reference inside such a nest goes through the subscript resolver
//! (`subscript`), which is the only place slice bounds turn into index
//! arithmetic.
//!
//! Lowering is pure with respect to the source tree. Per-call state
//! (lambda bindings, assignment target) travels in explicit context values
//! and results are returned, never stored on the lowerer.

pub mod elementwise;
pub mod expr;
pub mod function;
pub mod map;
pub mod stmt;
pub mod subscript;

pub use function::LoweredFunction;
pub use subscript::IndexSpace;

use std::collections::HashMap;

use crate::directive::{DirectiveInjector, HlsDirectives, InterfaceDesc};
use crate::error::LowerError;
use crate::source::ast::{AssignOp, Expr, Program, Stmt};
use crate::source::span::Span;
use crate::target::ast::{CExpr, Item, TranslationUnit};
use crate::LowerConfig;

/// Loop-variable prefix for plain elementwise operations.
pub const ELEMENTWISE_PREFIX: &str = "i_bop_";
/// Loop-variable prefix for inlined `map` applications.
pub const MAP_PREFIX: &str = "i_map_";

static HLS_DIRECTIVES: HlsDirectives = HlsDirectives;

/// A non-fatal lowering diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Kind of the node the warning is about.
    pub node: String,
    pub message: String,
    pub span: Option<Span>,
}

/// Scope-local state consulted while lowering expressions.
#[derive(Debug, Clone, Default)]
pub struct LowerCtx {
    /// Lambda parameters bound to per-element array references.
    bindings: HashMap<String, CExpr>,
}

impl LowerCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binding(&self, name: &str) -> Option<&CExpr> {
        self.bindings.get(name)
    }

    /// A child scope with `bindings` layered over the current ones.
    pub fn with_bindings(&self, bindings: impl IntoIterator<Item = (String, CExpr)>) -> Self {
        let mut scope = self.clone();
        scope.bindings.extend(bindings);
        scope
    }
}

/// Target and operator of the assignment an array-valued right-hand side
/// is being lowered into.
#[derive(Debug, Clone, Copy)]
pub struct AssignCtx<'a> {
    pub target: &'a Expr,
    pub op: AssignOp,
}

/// Everything one lowering run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct LowerOutput {
    pub unit: TranslationUnit,
    /// Name of the function carrying the entry-point marker.
    pub top_function: Option<String>,
    /// Memory bundles reported by interface directive insertion.
    pub bundles: Option<usize>,
    pub warnings: Vec<Warning>,
}

pub struct Lowerer<'a> {
    config: &'a LowerConfig,
    injector: &'a dyn DirectiveInjector,
    interface: Option<&'a InterfaceDesc>,
}

impl<'a> Lowerer<'a> {
    pub fn new(config: &'a LowerConfig) -> Self {
        Self {
            config,
            injector: &HLS_DIRECTIVES,
            interface: None,
        }
    }

    pub fn with_injector(mut self, injector: &'a dyn DirectiveInjector) -> Self {
        self.injector = injector;
        self
    }

    pub fn with_interface(mut self, interface: Option<&'a InterfaceDesc>) -> Self {
        self.interface = interface;
        self
    }

    /// Lowers a whole program.
    ///
    /// Function definitions without the entry-point marker are emitted
    /// first as auxiliary definitions, followed by the entry point and the
    /// remaining top-level statements in source order.
    pub fn lower_program(&self, program: &Program) -> Result<LowerOutput, LowerError> {
        let mut globals = Vec::new();
        let mut top = Vec::new();
        let mut top_function: Option<String> = None;
        let mut bundles = None;
        let mut warnings = Vec::new();

        for stmt in &program.body {
            match stmt {
                Stmt::FunctionDef(def) => {
                    let lowered = self.lower_function(def, &mut warnings)?;
                    if !lowered.is_top {
                        globals.push(Item::Function(lowered.def));
                        continue;
                    }
                    if let Some(prev) = &top_function {
                        return Err(LowerError::Unsupported {
                            kind: stmt.kind_name().to_owned(),
                            detail: format!(
                                "'{}' is marked as the entry point but '{}' already is",
                                def.name, prev
                            ),
                            span: def.span,
                        });
                    }
                    top_function = Some(def.name.clone());
                    bundles = lowered.bundles;
                    top.push(Item::Function(lowered.def));
                }
                _ => {
                    let stmts = self.lower_stmt(stmt, &LowerCtx::new(), &mut warnings)?;
                    top.extend(stmts.into_iter().map(Item::Stmt));
                }
            }
        }

        globals.extend(top);
        Ok(LowerOutput {
            unit: TranslationUnit { items: globals },
            top_function,
            bundles,
            warnings,
        })
    }
}
