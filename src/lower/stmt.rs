//! Statement lowering and declarations.

use crate::error::LowerError;
use crate::lower::subscript::iteration_shape;
use crate::lower::{AssignCtx, LowerCtx, Lowerer, Warning};
use crate::source::ast::{AssignOp, Expr, ExprKind, IterDomain, Stmt};
use crate::source::span::Span;
use crate::target::ast::{simple_for, CDecl, CExpr, CStmt};

impl Lowerer<'_> {
    /// Lowers statements in order, flattening each one's output.
    pub fn lower_stmts(
        &self,
        stmts: &[Stmt],
        ctx: &LowerCtx,
        warnings: &mut Vec<Warning>,
    ) -> Result<Vec<CStmt>, LowerError> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            out.extend(self.lower_stmt(stmt, ctx, warnings)?);
        }
        Ok(out)
    }

    /// Lowers one statement to zero or more target statements.
    pub fn lower_stmt(
        &self,
        stmt: &Stmt,
        ctx: &LowerCtx,
        warnings: &mut Vec<Warning>,
    ) -> Result<Vec<CStmt>, LowerError> {
        match stmt {
            Stmt::Expr(expr) => self.lower_expr_stmt(expr, ctx, warnings),

            Stmt::Assign {
                op,
                target,
                value,
                is_decl,
                span,
            } => self.lower_assign(*op, target, value, *is_decl, *span, ctx),

            Stmt::VarDecl { ty, name, init, .. } => {
                let init = init.as_ref().map(|e| self.lower_expr(e, ctx)).transpose()?;
                Ok(vec![CStmt::Decl(CDecl::var(ty.c_name(), name.clone(), init))])
            }

            Stmt::ArrayDecl { ty, name, dims, .. } => {
                let dims = dims
                    .iter()
                    .map(|d| self.lower_expr(d, ctx).map(Some))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(vec![CStmt::Decl(CDecl::array(ty.c_name(), name.clone(), dims))])
            }

            Stmt::If {
                test, body, orelse, ..
            } => {
                let then = self.lower_stmts(body, ctx, warnings)?;
                let otherwise = self.lower_stmts(orelse, ctx, warnings)?;
                Ok(vec![CStmt::If {
                    cond: self.lower_expr(test, ctx)?,
                    then,
                    otherwise: (!otherwise.is_empty()).then_some(otherwise),
                }])
            }

            Stmt::For {
                target,
                domain,
                body,
                ..
            } => Ok(vec![self.lower_for(target, domain, body, ctx, warnings)?]),

            Stmt::While { test, body, .. } => Ok(vec![CStmt::While {
                cond: self.lower_expr(test, ctx)?,
                body: self.lower_stmts(body, ctx, warnings)?,
            }]),

            Stmt::FunctionDef(def) => Err(LowerError::Unsupported {
                kind: stmt.kind_name().to_owned(),
                detail: format!("'{}' is nested; only top-level functions are lowered", def.name),
                span: def.span,
            }),

            Stmt::Pragma { pragma, .. } => {
                let text = self.lower_expr(pragma, ctx)?;
                Ok(vec![CStmt::Pragma(text.to_string())])
            }

            Stmt::Return { value, .. } => {
                let value = value.as_ref().map(|e| self.lower_expr(e, ctx)).transpose()?;
                Ok(vec![CStmt::Return(value)])
            }

            Stmt::Opaque {
                kind,
                children,
                span,
            } => {
                if children.is_empty() {
                    warnings.push(Warning {
                        node: kind.clone(),
                        message: "no lowering exists for this node and it has no children; \
                                  nothing was emitted"
                            .to_owned(),
                        span: *span,
                    });
                    return Ok(Vec::new());
                }
                self.lower_stmts(children, ctx, warnings)
            }
        }
    }

    fn lower_expr_stmt(
        &self,
        expr: &Expr,
        ctx: &LowerCtx,
        warnings: &mut Vec<Warning>,
    ) -> Result<Vec<CStmt>, LowerError> {
        match &expr.kind {
            ExprKind::Map { .. } => Ok(vec![self.lower_map(expr, AssignOp::Assign, ctx)?]),
            ExprKind::Var(_) | ExprKind::Subscript { .. } if !expr.shape.is_scalar() => {
                warnings.push(Warning {
                    node: expr.kind_name().to_owned(),
                    message: "array-valued expression statement has no effect; nothing was emitted"
                        .to_owned(),
                    span: expr.span,
                });
                Ok(Vec::new())
            }
            _ => Ok(vec![CStmt::Expr(self.lower_expr(expr, ctx)?)]),
        }
    }

    /// Assignment and declaration-by-assignment.
    ///
    /// Scalars become a declaration with initializer or a plain assignment.
    /// Arrays get a sized declaration when newly bound, and the value is
    /// lowered with the assignment target attached, so it produces the
    /// whole loop nest itself.
    pub fn lower_assign(
        &self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        is_decl: bool,
        span: Option<Span>,
        ctx: &LowerCtx,
    ) -> Result<Vec<CStmt>, LowerError> {
        match &target.kind {
            ExprKind::Var(_) | ExprKind::Subscript { .. } => {}
            _ => {
                return Err(LowerError::InvalidTarget {
                    kind: target.kind_name().to_owned(),
                    span: target.span.or(span),
                })
            }
        }

        let mut out = Vec::with_capacity(2);
        let is_array = !iteration_shape(target)?.is_scalar();

        if matches!(value.kind, ExprKind::Map { .. }) {
            if is_decl {
                out.push(CStmt::Decl(self.declaration(target, None, span)?));
            }
            out.push(self.lower_map(value, op, ctx)?);
            return Ok(out);
        }

        if !is_array {
            let rvalue = self.lower_expr(value, ctx)?;
            if is_decl {
                out.push(CStmt::Decl(self.declaration(target, Some(rvalue), span)?));
            } else {
                out.push(CStmt::assign(op.as_str(), self.lower_expr(target, ctx)?, rvalue));
            }
            return Ok(out);
        }

        if is_decl {
            out.push(CStmt::Decl(self.declaration(target, None, span)?));
        }
        out.push(self.lower_value_into(AssignCtx { target, op }, value, ctx)?);
        Ok(out)
    }

    /// Declaration of a newly bound variable from its annotations.
    fn declaration(
        &self,
        target: &Expr,
        init: Option<CExpr>,
        span: Option<Span>,
    ) -> Result<CDecl, LowerError> {
        let ExprKind::Var(name) = &target.kind else {
            return Err(LowerError::InvalidTarget {
                kind: format!("{} in a declaration", target.kind_name()),
                span: target.span.or(span),
            });
        };
        if target.shape.is_scalar() {
            return Ok(CDecl::var(target.ty.c_name(), name.clone(), init));
        }
        if let Some((pos, extent)) = target.shape.first_invalid() {
            return Err(LowerError::InvalidShape {
                detail: format!(
                    "'{}' declared with extent {} in dimension {}",
                    name, extent, pos
                ),
                span: target.span.or(span),
            });
        }
        let dims = target
            .shape
            .dims()
            .iter()
            .map(|&d| Some(CExpr::int(d)))
            .collect();
        Ok(CDecl::array(target.ty.c_name(), name.clone(), dims))
    }

    fn lower_for(
        &self,
        target: &str,
        domain: &IterDomain,
        body: &[Stmt],
        ctx: &LowerCtx,
        warnings: &mut Vec<Warning>,
    ) -> Result<CStmt, LowerError> {
        let mut body = self.lower_stmts(body, ctx, warnings)?;
        if let Some(attr) = &domain.attr {
            let arg = domain
                .attr_args
                .first()
                .map(|a| self.lower_expr(a, ctx))
                .transpose()?;
            self.injector.insert_loop_pragma(&mut body, attr, arg.as_ref());
        }
        Ok(simple_for(
            target,
            self.lower_expr(&domain.start, ctx)?,
            domain.op.as_str(),
            self.lower_expr(&domain.end, ctx)?,
            self.lower_expr(&domain.step, ctx)?,
            body,
        ))
    }
}
