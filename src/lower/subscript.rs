//! Per-dimension index resolution for array references.
//!
//! Every dimension of a reference's declared shape resolves to one of:
//! - a loop variable of the surrounding nest, possibly offset and strided
//!   by a slice (`Loop`);
//! - a scalar index expression the reference already carries (`Fixed`);
//! - a constant, for degenerate (extent 1) slices (`Constant`).
//!
//! Loop-consuming dimensions are matched to loop variables right-aligned:
//! in a nest of rank `n`, the `k`-th of `r` such dimensions uses variable
//! `n - r + k`. When `r == n` this is the plain positional assignment.

use crate::error::LowerError;
use crate::lower::{LowerCtx, Lowerer, ELEMENTWISE_PREFIX, MAP_PREFIX};
use crate::source::ast::{Expr, ExprKind};
use crate::source::types::Shape;
use crate::target::ast::CExpr;

/// The loop-variable family of one synthesized loop nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpace {
    pub prefix: &'static str,
    pub rank: usize,
}

impl IndexSpace {
    pub fn elementwise(rank: usize) -> Self {
        Self {
            prefix: ELEMENTWISE_PREFIX,
            rank,
        }
    }

    pub fn map(rank: usize) -> Self {
        Self {
            prefix: MAP_PREFIX,
            rank,
        }
    }

    /// Loop variable of dimension `dim`.
    pub fn var(&self, dim: usize) -> String {
        format!("{}{}", self.prefix, dim)
    }
}

/// How one declared dimension of a reference is indexed.
#[derive(Debug, Clone, Copy)]
enum DimIndex<'e> {
    Loop { extent: i64, offset: i64, stride: i64 },
    Fixed(&'e Expr),
    Constant(i64),
}

fn invalid_shape(expr: &Expr, detail: String) -> LowerError {
    LowerError::InvalidShape {
        detail,
        span: expr.span,
    }
}

fn check_extents(expr: &Expr) -> Result<(), LowerError> {
    if let Some((pos, extent)) = expr.shape.first_invalid() {
        return Err(invalid_shape(
            expr,
            format!(
                "{} has extent {} in dimension {} of shape {}",
                expr.kind_name(),
                extent,
                pos,
                expr.shape
            ),
        ));
    }
    Ok(())
}

/// Classifies every declared dimension of a variable or subscript.
fn dim_indices(expr: &Expr) -> Result<Vec<DimIndex<'_>>, LowerError> {
    check_extents(expr)?;
    match &expr.kind {
        ExprKind::Var(_) => Ok(expr
            .shape
            .dims()
            .iter()
            .map(|&extent| DimIndex::Loop {
                extent,
                offset: 0,
                stride: 1,
            })
            .collect()),
        ExprKind::Subscript { indices, .. } => {
            let declared = &expr.shape;
            if indices.len() > declared.rank() {
                return Err(invalid_shape(
                    expr,
                    format!(
                        "subscript has {} indices but its shape {} has only {} dimensions",
                        indices.len(),
                        declared,
                        declared.rank()
                    ),
                ));
            }
            let mut dims = Vec::with_capacity(declared.rank());
            for (i, &extent) in declared.dims().iter().enumerate() {
                let index = indices.get(i);
                let dim = match index.map(|idx| (&idx.kind, idx)) {
                    Some((ExprKind::Slice(slice), idx)) => {
                        if slice.bounds.step == 0 {
                            return Err(LowerError::InvalidSlice {
                                step: 0,
                                span: idx.span,
                            });
                        }
                        if declared.is_degenerate(i) {
                            DimIndex::Constant(slice.bounds.lower)
                        } else {
                            DimIndex::Loop {
                                extent,
                                offset: slice.bounds.lower,
                                stride: slice.bounds.step,
                            }
                        }
                    }
                    Some((_, idx)) => DimIndex::Fixed(idx),
                    // Trailing dimensions without an index are fully sliced.
                    None if declared.is_degenerate(i) => DimIndex::Constant(0),
                    None => DimIndex::Loop {
                        extent,
                        offset: 0,
                        stride: 1,
                    },
                };
                dims.push(dim);
            }
            Ok(dims)
        }
        _ => Err(LowerError::Unsupported {
            kind: expr.kind_name().to_owned(),
            detail: "only variables and subscripts can be indexed per element".to_owned(),
            span: expr.span,
        }),
    }
}

/// Extents of the dimensions a loop nest iterates over for `expr`.
///
/// For variables this is the declared shape; for subscripts, only the
/// sliced non-degenerate dimensions; for anything else, the annotated
/// result shape.
pub fn iteration_shape(expr: &Expr) -> Result<Shape, LowerError> {
    match &expr.kind {
        ExprKind::Var(_) | ExprKind::Subscript { .. } => {
            let extents = dim_indices(expr)?
                .into_iter()
                .filter_map(|dim| match dim {
                    DimIndex::Loop { extent, .. } => Some(extent),
                    DimIndex::Fixed(_) | DimIndex::Constant(_) => None,
                })
                .collect::<Vec<_>>();
            Ok(Shape::new(extents))
        }
        _ => {
            check_extents(expr)?;
            Ok(expr.shape.clone())
        }
    }
}

impl Lowerer<'_> {
    /// Index expressions for every declared dimension of `reference` inside
    /// the loop nest described by `space`.
    pub fn resolve_indices(
        &self,
        reference: &Expr,
        space: IndexSpace,
        ctx: &LowerCtx,
    ) -> Result<Vec<CExpr>, LowerError> {
        let dims = dim_indices(reference)?;
        let loops = dims
            .iter()
            .filter(|d| matches!(d, DimIndex::Loop { .. }))
            .count();
        if loops > space.rank {
            return Err(invalid_shape(
                reference,
                format!(
                    "'{}' iterates over {} dimensions inside a loop nest of rank {}",
                    reference.root_name().unwrap_or("<expr>"),
                    loops,
                    space.rank
                ),
            ));
        }

        let mut next_var = space.rank - loops;
        let mut out = Vec::with_capacity(dims.len());
        for dim in dims {
            let index = match dim {
                DimIndex::Loop { offset, stride, .. } => {
                    let var = space.var(next_var);
                    next_var += 1;
                    CExpr::Affine {
                        var,
                        offset,
                        stride,
                    }
                }
                DimIndex::Fixed(idx) => self.lower_expr(idx, ctx)?,
                DimIndex::Constant(c) => CExpr::int(c),
            };
            out.push(index);
        }
        Ok(out)
    }

    /// The per-element form of `reference` inside the loop nest `space`.
    pub fn resolve_reference(
        &self,
        reference: &Expr,
        space: IndexSpace,
        ctx: &LowerCtx,
    ) -> Result<CExpr, LowerError> {
        let base = match &reference.kind {
            ExprKind::Var(name) => CExpr::id(name.clone()),
            ExprKind::Subscript { base, .. } => self.lower_expr(base, ctx)?,
            _ => {
                return Err(LowerError::Unsupported {
                    kind: reference.kind_name().to_owned(),
                    detail: "only variables and subscripts can be indexed per element".to_owned(),
                    span: reference.span,
                })
            }
        };
        let indices = self.resolve_indices(reference, space, ctx)?;
        Ok(CExpr::subscript(base, indices))
    }

    /// A subscript evaluated outside any loop nest.
    ///
    /// Each written index lowers on its own. A slice contributes its lower
    /// bound, and dimensions without an index are left off.
    pub fn lower_raw_subscript(
        &self,
        base: &Expr,
        indices: &[Expr],
        ctx: &LowerCtx,
    ) -> Result<CExpr, LowerError> {
        let base = self.lower_expr(base, ctx)?;
        let indices = indices
            .iter()
            .map(|idx| self.lower_expr(idx, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CExpr::subscript(base, indices))
    }
}
