//! Scalar expression lowering.

use crate::error::LowerError;
use crate::lower::{LowerCtx, Lowerer};
use crate::source::ast::{Expr, ExprKind, Literal};
use crate::target::ast::CExpr;

impl Lowerer<'_> {
    /// Lowers an expression that evaluates to a single value.
    ///
    /// Array-valued operations and `map` have no expression form; they are
    /// only reachable as the right-hand side of an assignment.
    pub fn lower_expr(&self, expr: &Expr, ctx: &LowerCtx) -> Result<CExpr, LowerError> {
        match &expr.kind {
            ExprKind::Literal(lit) => lower_literal(lit, expr),

            ExprKind::Var(name) => Ok(ctx
                .binding(name)
                .cloned()
                .unwrap_or_else(|| CExpr::id(name.clone()))),

            ExprKind::Unary { op, operand } => {
                self.reject_array_value(expr)?;
                Ok(CExpr::unary(op.as_str(), self.lower_expr(operand, ctx)?))
            }

            ExprKind::Binary { op, lhs, rhs } => {
                self.reject_array_value(expr)?;
                Ok(CExpr::binary(
                    op.as_str(),
                    self.lower_expr(lhs, ctx)?,
                    self.lower_expr(rhs, ctx)?,
                ))
            }

            ExprKind::Call { func, args } => {
                let args = args
                    .iter()
                    .map(|a| self.lower_expr(a, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CExpr::call(self.lower_expr(func, ctx)?, args))
            }

            ExprKind::IfExp { test, body, orelse } => {
                self.reject_array_value(expr)?;
                Ok(CExpr::ternary(
                    self.lower_expr(test, ctx)?,
                    self.lower_expr(body, ctx)?,
                    self.lower_expr(orelse, ctx)?,
                ))
            }

            ExprKind::Subscript { base, indices } => self.lower_raw_subscript(base, indices, ctx),

            // Outside a loop nest a slice stands for its first element.
            ExprKind::Slice(slice) => match &slice.lower {
                Some(lower) => self.lower_expr(lower, ctx),
                None => Ok(CExpr::int(0)),
            },

            ExprKind::Map { .. } => Err(LowerError::Unsupported {
                kind: expr.kind_name().to_owned(),
                detail: "map must be a statement or the value of an assignment".to_owned(),
                span: expr.span,
            }),

            ExprKind::Opaque { kind, .. } => Err(LowerError::Unsupported {
                kind: kind.clone(),
                detail: "no lowering exists for this expression".to_owned(),
                span: expr.span,
            }),
        }
    }

    fn reject_array_value(&self, expr: &Expr) -> Result<(), LowerError> {
        if expr.shape.is_scalar() {
            return Ok(());
        }
        Err(LowerError::MissingAssignTarget {
            kind: expr.kind_name().to_owned(),
            span: expr.span,
        })
    }
}

fn lower_literal(lit: &Literal, expr: &Expr) -> Result<CExpr, LowerError> {
    match lit {
        Literal::Int(v) => Ok(CExpr::int(*v)),
        Literal::Float(v) => CExpr::float(*v).ok_or_else(|| LowerError::UnsupportedLiteral {
            kind: format!("non-finite float ({})", v),
            span: expr.span,
        }),
        Literal::Bool(b) => Ok(CExpr::int(i64::from(*b))),
        Literal::Str(s) => Ok(CExpr::id(s.clone())),
        Literal::Other { kind, .. } => Err(LowerError::UnsupportedLiteral {
            kind: kind.clone(),
            span: expr.span,
        }),
    }
}
