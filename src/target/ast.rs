//! Target-language (C-like) syntax tree.
//!
//! Nodes are plain data; all layout decisions live in `printer`.

use std::fmt;

/// Kind of a numeric constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstKind {
    Int,
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CExpr {
    Id(String),
    Const { kind: ConstKind, value: String },
    /// Loop-variable index of a sliced dimension: `offset + var * stride`.
    Affine { var: String, offset: i64, stride: i64 },
    Unary { op: &'static str, operand: Box<CExpr> },
    Binary { op: &'static str, lhs: Box<CExpr>, rhs: Box<CExpr> },
    Ternary { cond: Box<CExpr>, then: Box<CExpr>, otherwise: Box<CExpr> },
    Call { func: Box<CExpr>, args: Vec<CExpr> },
    /// `base[i0][i1]...`
    Index { base: Box<CExpr>, indices: Vec<CExpr> },
}

impl CExpr {
    pub fn id(name: impl Into<String>) -> Self {
        CExpr::Id(name.into())
    }

    pub fn int(value: i64) -> Self {
        CExpr::Const {
            kind: ConstKind::Int,
            value: value.to_string(),
        }
    }

    /// Float constant; always spelled with a decimal point or exponent.
    /// C has no literal for NaN or the infinities, so those yield `None`.
    pub fn float(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(CExpr::Const {
            kind: ConstKind::Float,
            value: format!("{:?}", value),
        })
    }

    pub fn binary(op: &'static str, lhs: CExpr, rhs: CExpr) -> Self {
        CExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: &'static str, operand: CExpr) -> Self {
        CExpr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn ternary(cond: CExpr, then: CExpr, otherwise: CExpr) -> Self {
        CExpr::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn call(func: CExpr, args: Vec<CExpr>) -> Self {
        CExpr::Call {
            func: Box::new(func),
            args,
        }
    }

    /// `base[indices...]`; an empty index list yields `base` unchanged.
    pub fn subscript(base: CExpr, indices: Vec<CExpr>) -> Self {
        if indices.is_empty() {
            return base;
        }
        CExpr::Index {
            base: Box::new(base),
            indices,
        }
    }

    fn needs_parens(&self) -> bool {
        matches!(self, CExpr::Binary { .. } | CExpr::Ternary { .. })
    }

    /// Rendered text starts with a sign or prefix operator, so gluing
    /// another prefix operator in front would form `--`, `++` or `-+`.
    fn has_prefix(&self) -> bool {
        match self {
            CExpr::Unary { .. } => true,
            CExpr::Const { value, .. } => value.starts_with('-'),
            _ => false,
        }
    }
}

struct Operand<'a>(&'a CExpr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.needs_parens() {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for CExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CExpr::Id(name) => f.write_str(name),
            CExpr::Const { value, .. } => f.write_str(value),
            CExpr::Affine { var, offset, stride } => match (*offset, *stride) {
                (0, 1) => f.write_str(var),
                (0, s) => write!(f, "({}*({}))", var, s),
                (l, 1) => write!(f, "({}+{})", l, var),
                (l, s) => write!(f, "({}+{}*({}))", l, var, s),
            },
            CExpr::Unary { op, operand } if operand.has_prefix() => {
                write!(f, "{}({})", op, operand)
            }
            CExpr::Unary { op, operand } => write!(f, "{}{}", op, Operand(operand)),
            CExpr::Binary { op, lhs, rhs } => {
                write!(f, "{} {} {}", Operand(lhs), op, Operand(rhs))
            }
            CExpr::Ternary {
                cond,
                then,
                otherwise,
            } => write!(
                f,
                "{} ? {} : {}",
                Operand(cond),
                Operand(then),
                Operand(otherwise)
            ),
            CExpr::Call { func, args } => {
                write!(f, "{}(", func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            CExpr::Index { base, indices } => {
                write!(f, "{}", Operand(base))?;
                for idx in indices {
                    write!(f, "[{}]", idx)?;
                }
                Ok(())
            }
        }
    }
}

/// A scalar or array declaration; also used for function parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CDecl {
    pub ty: String,
    pub name: String,
    /// One entry per array dimension; `None` leaves the extent to the caller.
    pub dims: Vec<Option<CExpr>>,
    pub init: Option<CExpr>,
}

impl CDecl {
    pub fn var(ty: impl Into<String>, name: impl Into<String>, init: Option<CExpr>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            dims: Vec::new(),
            init,
        }
    }

    pub fn array(ty: impl Into<String>, name: impl Into<String>, dims: Vec<Option<CExpr>>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            dims,
            init: None,
        }
    }

    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }
}

/// Counted loop `for (int var = start; var cmp end; var += step)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub var: String,
    pub start: CExpr,
    pub cmp: &'static str,
    pub end: CExpr,
    pub step: CExpr,
    pub body: Vec<CStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CStmt {
    Decl(CDecl),
    Assign {
        op: &'static str,
        lvalue: CExpr,
        rvalue: CExpr,
    },
    Expr(CExpr),
    If {
        cond: CExpr,
        then: Vec<CStmt>,
        otherwise: Option<Vec<CStmt>>,
    },
    For(ForLoop),
    While {
        cond: CExpr,
        body: Vec<CStmt>,
    },
    Return(Option<CExpr>),
    /// Raw directive text following `#pragma `.
    Pragma(String),
}

impl CStmt {
    pub fn assign(op: &'static str, lvalue: CExpr, rvalue: CExpr) -> Self {
        CStmt::Assign { op, lvalue, rvalue }
    }
}

/// `for (int var = start; var cmp end; var += step) { body }`
pub fn simple_for(
    var: impl Into<String>,
    start: CExpr,
    cmp: &'static str,
    end: CExpr,
    step: CExpr,
    body: Vec<CStmt>,
) -> CStmt {
    CStmt::For(ForLoop {
        var: var.into(),
        start,
        cmp,
        end,
        step,
        body,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub ret_ty: String,
    pub name: String,
    pub params: Vec<CDecl>,
    pub body: Vec<CStmt>,
}

/// A top-level entry of the output file.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(FuncDef),
    Stmt(CStmt),
}

/// Auxiliary definitions first, then the lowered top-level items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslationUnit {
    pub items: Vec<Item>,
}

impl TranslationUnit {
    pub fn functions(&self) -> impl Iterator<Item = &FuncDef> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            Item::Stmt(_) => None,
        })
    }

    pub fn function(&self, name: &str) -> Option<&FuncDef> {
        self.functions().find(|f| f.name == name)
    }

    pub fn statements(&self) -> impl Iterator<Item = &CStmt> {
        self.items.iter().filter_map(|item| match item {
            Item::Stmt(s) => Some(s),
            Item::Function(_) => None,
        })
    }
}
