//! The annotated source tree handed over by the front-end and typer.

pub mod ast;
pub mod span;
pub mod types;

pub use ast::{
    AssignOp, BinOp, Expr, ExprKind, FunctionDef, IterDomain, Lambda, Literal, Param, Program,
    Slice, SliceBounds, Stmt, UnaryOp,
};
pub use span::{BytePos, Span};
pub use types::{ElemType, Shape};

use crate::error::Error;

/// Reads an annotated program serialized by an external front-end.
pub fn from_json(text: &str) -> Result<Program, Error> {
    Ok(serde_json::from_str(text)?)
}
