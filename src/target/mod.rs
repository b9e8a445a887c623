//! C-like target tree and its renderer.

pub mod ast;
pub mod printer;

pub use ast::{simple_for, CDecl, CExpr, CStmt, ConstKind, ForLoop, FuncDef, Item, TranslationUnit};
pub use printer::{emit_c_source, emit_stmt_text, emit_unit, PRELUDE_HEADERS};
