//! Shape-directed loop synthesis for elementwise operations.
//!
//! An assignment whose value has shape `(d0, ..., dn-1)` becomes `n` nested
//! counted loops, dimension 0 outermost, wrapping a single per-element
//! assignment:
//!
//! ```text
//! c = a + b        // shape (4, 8)
//!
//! for (int i_bop_0 = 0; i_bop_0 < 4; i_bop_0++) {
//!   for (int i_bop_1 = 0; i_bop_1 < 8; i_bop_1++) {
//!     c[i_bop_0][i_bop_1] = a[i_bop_0][i_bop_1] + b[i_bop_0][i_bop_1];
//!   }
//! }
//! ```

use crate::error::LowerError;
use crate::lower::subscript::{iteration_shape, IndexSpace};
use crate::lower::{AssignCtx, LowerCtx, Lowerer};
use crate::source::ast::{Expr, ExprKind};
use crate::source::span::Span;
use crate::source::types::Shape;
use crate::target::ast::{simple_for, CExpr, CStmt};

/// Wraps `body` in one loop per dimension of `shape`, last dimension
/// innermost. An empty shape returns `body` unchanged.
pub fn loop_nest(
    space: IndexSpace,
    shape: &Shape,
    body: CStmt,
    span: Option<Span>,
) -> Result<CStmt, LowerError> {
    if let Some((pos, extent)) = shape.first_invalid() {
        return Err(LowerError::InvalidShape {
            detail: format!("extent {} in dimension {} of shape {}", extent, pos, shape),
            span,
        });
    }
    if shape.rank() != space.rank {
        return Err(LowerError::InvalidShape {
            detail: format!(
                "loop nest of rank {} cannot iterate over shape {}",
                space.rank, shape
            ),
            span,
        });
    }

    let mut stmt = body;
    for (i, &extent) in shape.dims().iter().enumerate().rev() {
        stmt = simple_for(
            space.var(i),
            CExpr::int(0),
            "<",
            CExpr::int(extent),
            CExpr::int(1),
            vec![stmt],
        );
    }
    Ok(stmt)
}

impl Lowerer<'_> {
    /// Lowers an array-valued right-hand side straight into its
    /// assignment target.
    pub fn lower_value_into(
        &self,
        assign: AssignCtx<'_>,
        value: &Expr,
        ctx: &LowerCtx,
    ) -> Result<CStmt, LowerError> {
        match &value.kind {
            ExprKind::Map { .. } => self.lower_map(value, assign.op, ctx),
            _ => self.lower_elementwise_assign(assign, value, ctx),
        }
    }

    /// `target op value` applied at every coordinate of the value's shape.
    ///
    /// A scalar value is broadcast over the target's own iteration shape.
    pub fn lower_elementwise_assign(
        &self,
        assign: AssignCtx<'_>,
        value: &Expr,
        ctx: &LowerCtx,
    ) -> Result<CStmt, LowerError> {
        let value_shape = iteration_shape(value)?;
        let shape = if value_shape.is_scalar() {
            iteration_shape(assign.target)?
        } else {
            value_shape
        };
        let space = IndexSpace::elementwise(shape.rank());

        let lvalue = self.resolve_reference(assign.target, space, ctx)?;
        let rvalue = self.lower_element(value, space, ctx)?;
        let stmt = CStmt::assign(assign.op.as_str(), lvalue, rvalue);
        loop_nest(space, &shape, stmt, value.span.or(assign.target.span))
    }

    /// The value of `expr` at the current coordinate of `space`.
    ///
    /// Array references are subscripted; scalars are used as they are
    /// (broadcast); operators are re-applied to the per-element operands.
    pub fn lower_element(
        &self,
        expr: &Expr,
        space: IndexSpace,
        ctx: &LowerCtx,
    ) -> Result<CExpr, LowerError> {
        match &expr.kind {
            ExprKind::Var(name) => match ctx.binding(name) {
                Some(bound) => Ok(bound.clone()),
                None => self.resolve_reference(expr, space, ctx),
            },
            ExprKind::Subscript { .. } => self.resolve_reference(expr, space, ctx),
            ExprKind::Literal(_) => self.lower_expr(expr, ctx),
            ExprKind::Unary { op, operand } => Ok(CExpr::unary(
                op.as_str(),
                self.lower_element(operand, space, ctx)?,
            )),
            ExprKind::Binary { op, lhs, rhs } => Ok(CExpr::binary(
                op.as_str(),
                self.lower_element(lhs, space, ctx)?,
                self.lower_element(rhs, space, ctx)?,
            )),
            ExprKind::IfExp { test, body, orelse } => Ok(CExpr::ternary(
                self.lower_element(test, space, ctx)?,
                self.lower_element(body, space, ctx)?,
                self.lower_element(orelse, space, ctx)?,
            )),
            // Array-valued calls apply the callee per element.
            ExprKind::Call { func, args } if !expr.shape.is_scalar() => {
                let args = args
                    .iter()
                    .map(|a| self.lower_element(a, space, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CExpr::call(self.lower_expr(func, ctx)?, args))
            }
            ExprKind::Call { .. } => self.lower_expr(expr, ctx),
            ExprKind::Slice(_) | ExprKind::Map { .. } | ExprKind::Opaque { .. } => {
                Err(LowerError::Unsupported {
                    kind: expr.kind_name().to_owned(),
                    detail: "not allowed inside an elementwise expression".to_owned(),
                    span: expr.span,
                })
            }
        }
    }
}
