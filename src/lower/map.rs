//! Inlining of `map(lambda ..., arrays...)` into an explicit loop nest.
//!
//! ```text
//! out = map(lambda a, b: a + b, x, y)     // shape (8,)
//!
//! for (int i_map_0 = 0; i_map_0 < 8; i_map_0++) {
//!   out[i_map_0] = x[i_map_0] + y[i_map_0];
//! }
//! ```
//!
//! Each lambda parameter is bound to its array's per-element reference
//! before the body is lowered, so the body never sees the arrays
//! themselves. The `i_map_` prefix keeps these loops apart from elementwise
//! loops around or inside them.

use crate::error::LowerError;
use crate::lower::elementwise::loop_nest;
use crate::lower::subscript::IndexSpace;
use crate::lower::{LowerCtx, Lowerer};
use crate::source::ast::{AssignOp, Expr, ExprKind, Stmt};
use crate::target::ast::CStmt;

impl Lowerer<'_> {
    /// Lowers a `map` node into `target[idx] op body[params := arrays[idx]]`
    /// wrapped in the loop nest of the map's shape.
    pub fn lower_map(&self, map: &Expr, op: AssignOp, ctx: &LowerCtx) -> Result<CStmt, LowerError> {
        let ExprKind::Map {
            target,
            arrays,
            func,
        } = &map.kind
        else {
            return Err(LowerError::Unsupported {
                kind: map.kind_name().to_owned(),
                detail: "expected a map node".to_owned(),
                span: map.span,
            });
        };

        let body = match func.body.as_ref() {
            Stmt::Expr(body) => body,
            Stmt::Assign { span, .. } => {
                return Err(LowerError::MapBodyIsAssignment {
                    span: span.or(func.span),
                })
            }
            other => {
                return Err(LowerError::MapBodyNotExpression {
                    kind: other.kind_name().to_owned(),
                    span: other.span().or(func.span),
                })
            }
        };

        if func.params.len() != arrays.len() {
            return Err(LowerError::MapArity {
                params: func.params.len(),
                arrays: arrays.len(),
                span: map.span,
            });
        }

        let space = IndexSpace::map(map.shape.rank());

        let elements = arrays
            .iter()
            .map(|array| self.resolve_reference(array, space, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let scope = ctx.with_bindings(func.params.iter().cloned().zip(elements));

        let lvalue = self.resolve_reference(target, space, ctx)?;
        let rvalue = self.lower_element(body, space, &scope)?;
        let stmt = CStmt::assign(op.as_str(), lvalue, rvalue);
        loop_nest(space, &map.shape, stmt, map.span)
    }
}
