//! Function definitions: signatures and the synthesis entry point.

use crate::error::LowerError;
use crate::lower::{LowerCtx, Lowerer, Warning};
use crate::source::ast::{FunctionDef, Param};
use crate::target::ast::{CDecl, CExpr, FuncDef};

/// A lowered definition plus what lowering learned about it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredFunction {
    pub def: FuncDef,
    /// Carries the entry-point marker.
    pub is_top: bool,
    /// Bundle count reported by interface directive insertion.
    pub bundles: Option<usize>,
}

/// Element type of parameters that arrive without annotations.
const DEFAULT_PARAM_TYPE: &str = "float";

impl Lowerer<'_> {
    pub fn lower_function(
        &self,
        func: &FunctionDef,
        warnings: &mut Vec<Warning>,
    ) -> Result<LoweredFunction, LowerError> {
        let params = func
            .params
            .iter()
            .map(lower_param)
            .collect::<Result<Vec<_>, _>>()?;
        let mut body = self.lower_stmts(&func.body, &LowerCtx::new(), warnings)?;

        let is_top = func.decorators.iter().any(|d| *d == self.config.top_marker);
        let bundles = match (is_top, self.interface) {
            (true, Some(iface)) => Some(self.injector.insert_interface_pragmas(&mut body, iface)),
            _ => None,
        };

        let ret_ty = func
            .return_ty
            .map(|ty| ty.c_name())
            .unwrap_or_else(|| self.config.default_return_type.clone());

        Ok(LoweredFunction {
            def: FuncDef {
                ret_ty,
                name: func.name.clone(),
                params,
                body,
            },
            is_top,
            bundles,
        })
    }
}

/// Annotated single-element parameters are passed by value, other
/// annotated parameters as arrays of their declared shape. Unannotated
/// parameters become two-dimensional float arrays sized by the caller.
pub fn lower_param(param: &Param) -> Result<CDecl, LowerError> {
    let (Some(ty), Some(shape)) = (&param.ty, &param.shape) else {
        return Ok(CDecl::array(
            DEFAULT_PARAM_TYPE,
            param.name.clone(),
            vec![None, None],
        ));
    };
    match shape.element_count() {
        None => Err(LowerError::InvalidShape {
            detail: format!("parameter '{}' annotated with shape {}", param.name, shape),
            span: param.span,
        }),
        Some(1) => Ok(CDecl::var(ty.c_name(), param.name.clone(), None)),
        Some(_) => Ok(CDecl::array(
            ty.c_name(),
            param.name.clone(),
            shape.dims().iter().map(|&d| Some(CExpr::int(d))).collect(),
        )),
    }
}
