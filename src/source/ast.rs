//! The annotated source tree consumed by lowering.
//!
//! Every expression carries its element type and shape as plain fields;
//! the typer fills them in before lowering starts. Statements carry no
//! type information of their own.

use serde::{Deserialize, Serialize};

use crate::source::span::Span;
use crate::source::types::{ElemType, Shape};

/// A whole compilation unit: top-level statements in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

/// Binary operators, spelled as in the target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Plain and compound assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AssignOp {
    #[default]
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "-=")]
    Sub,
    #[serde(rename = "*=")]
    Mul,
    #[serde(rename = "/=")]
    Div,
    #[serde(rename = "%=")]
    Mod,
    #[serde(rename = "&=")]
    BitAnd,
    #[serde(rename = "|=")]
    BitOr,
    #[serde(rename = "^=")]
    BitXor,
    #[serde(rename = "<<=")]
    Shl,
    #[serde(rename = ">>=")]
    Shr,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
        }
    }
}

/// Literal values as they appear in source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Used for names (pragma text, identifiers), never as quoted C text.
    Str(String),
    /// Any literal kind the front-end could represent but lowering cannot
    /// (complex numbers, byte strings, `None`, ...).
    Other { kind: String, text: String },
}

/// Resolved `lower:upper:step` triple of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceBounds {
    pub lower: i64,
    pub upper: i64,
    pub step: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<Box<Expr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<Box<Expr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Box<Expr>>,
    /// Bounds after the typer folded defaults and negative offsets.
    pub bounds: SliceBounds,
}

/// A function literal with positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Box<Stmt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    Literal(Literal),
    Var(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `body if test else orelse`
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    /// `base[i0, i1, ...]`. Each index is either a slice or a scalar
    /// expression. Fewer indices than dimensions leaves the trailing
    /// dimensions fully sliced.
    Subscript {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    Slice(Slice),
    /// `target = map(func, arrays...)`
    Map {
        target: Box<Expr>,
        arrays: Vec<Expr>,
        func: Lambda,
    },
    /// An expression kind the front-end emitted but that has no lowering.
    /// Lowering rejects it.
    Opaque { kind: String },
}

/// An expression with its typer annotations.
///
/// For a subscript, `shape` lists one extent per indexed dimension of the
/// base, with 1 marking positions fixed by a scalar index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: ElemType,
    #[serde(default)]
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: ElemType, shape: Shape) -> Self {
        Self {
            kind,
            ty,
            shape,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn int(value: i64) -> Self {
        Self::new(ExprKind::Literal(Literal::Int(value)), ElemType::int(), Shape::scalar())
    }

    pub fn float(value: f64) -> Self {
        Self::new(ExprKind::Literal(Literal::Float(value)), ElemType::float(), Shape::scalar())
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Literal(Literal::Bool(value)), ElemType::Bool, Shape::scalar())
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::new(ExprKind::Literal(Literal::Str(value.into())), ElemType::Void, Shape::scalar())
    }

    pub fn var(name: impl Into<String>, ty: ElemType, shape: impl Into<Shape>) -> Self {
        Self::new(ExprKind::Var(name.into()), ty, shape.into())
    }

    pub fn scalar_var(name: impl Into<String>, ty: ElemType) -> Self {
        Self::var(name, ty, Shape::scalar())
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        let (ty, shape) = (operand.ty, operand.shape.clone());
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
            shape,
        )
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr, ty: ElemType, shape: impl Into<Shape>) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            shape.into(),
        )
    }

    pub fn call(
        func: impl Into<String>,
        args: Vec<Expr>,
        ty: ElemType,
        shape: impl Into<Shape>,
    ) -> Self {
        let callee = Self::scalar_var(func, ElemType::Void);
        Self::new(
            ExprKind::Call {
                func: Box::new(callee),
                args,
            },
            ty,
            shape.into(),
        )
    }

    pub fn if_exp(test: Expr, body: Expr, orelse: Expr) -> Self {
        let (ty, shape) = (body.ty, body.shape.clone());
        Self::new(
            ExprKind::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            },
            ty,
            shape,
        )
    }

    /// `base[indices]`, typed with the base's element type.
    pub fn subscript(base: Expr, indices: Vec<Expr>, shape: impl Into<Shape>) -> Self {
        let ty = base.ty;
        Self::new(
            ExprKind::Subscript {
                base: Box::new(base),
                indices,
            },
            ty,
            shape.into(),
        )
    }

    /// `lower:upper:step` with literal bounds.
    pub fn slice(lower: i64, upper: i64, step: i64) -> Self {
        let len = if step > 0 && upper > lower {
            (upper - lower + step - 1) / step
        } else if step < 0 && lower > upper {
            (lower - upper - step - 1) / -step
        } else {
            0
        };
        Self::new(
            ExprKind::Slice(Slice {
                lower: Some(Box::new(Expr::int(lower))),
                upper: Some(Box::new(Expr::int(upper))),
                step: Some(Box::new(Expr::int(step))),
                bounds: SliceBounds { lower, upper, step },
            }),
            ElemType::int(),
            Shape::new(vec![len]),
        )
    }

    pub fn map(
        target: Expr,
        arrays: Vec<Expr>,
        func: Lambda,
        ty: ElemType,
        shape: impl Into<Shape>,
    ) -> Self {
        Self::new(
            ExprKind::Map {
                target: Box::new(target),
                arrays,
                func,
            },
            ty,
            shape.into(),
        )
    }

    /// Node kind name used in diagnostics.
    pub fn kind_name(&self) -> &str {
        match &self.kind {
            ExprKind::Literal(_) => "literal",
            ExprKind::Var(_) => "variable",
            ExprKind::Unary { .. } => "unary operation",
            ExprKind::Binary { .. } => "binary operation",
            ExprKind::Call { .. } => "call",
            ExprKind::IfExp { .. } => "conditional expression",
            ExprKind::Subscript { .. } => "subscript",
            ExprKind::Slice(_) => "slice",
            ExprKind::Map { .. } => "map",
            ExprKind::Opaque { kind, .. } => kind.as_str(),
        }
    }

    /// Name of the variable this expression ultimately refers to, looking
    /// through subscripts.
    pub fn root_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Var(name) => Some(name),
            ExprKind::Subscript { base, .. } => base.root_name(),
            _ => None,
        }
    }
}

impl Lambda {
    pub fn new(params: Vec<impl Into<String>>, body: Expr) -> Self {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            body: Box::new(Stmt::Expr(body)),
            span: None,
        }
    }
}

/// Loop bounds of a `for` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterDomain {
    pub start: Expr,
    /// Comparison between the loop variable and `end`.
    pub op: BinOp,
    pub end: Expr,
    pub step: Expr,
    /// Loop-transformation directive such as `pipeline` or `unroll`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attr_args: Vec<Expr>,
}

impl IterDomain {
    /// `start <= v < end` stepping by 1.
    pub fn range(start: i64, end: i64) -> Self {
        Self {
            start: Expr::int(start),
            op: BinOp::Lt,
            end: Expr::int(end),
            step: Expr::int(1),
            attr: None,
            attr_args: Vec::new(),
        }
    }

    pub fn with_attr(mut self, attr: impl Into<String>, args: Vec<Expr>) -> Self {
        self.attr = Some(attr.into());
        self.attr_args = args;
        self
    }
}

/// A function parameter. Type and shape are present only when annotated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<ElemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Param {
    pub fn annotated(name: impl Into<String>, ty: ElemType, shape: impl Into<Shape>) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            shape: Some(shape.into()),
            span: None,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            shape: None,
            span: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    /// Decorator names, e.g. the entry-point marker.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_ty: Option<ElemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// An expression evaluated for its effect.
    Expr(Expr),
    /// `target op value`. `is_decl` marks the first binding of `target`.
    Assign {
        #[serde(default)]
        op: AssignOp,
        target: Expr,
        value: Expr,
        #[serde(default)]
        is_decl: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    VarDecl {
        ty: ElemType,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    ArrayDecl {
        ty: ElemType,
        name: String,
        dims: Vec<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        orelse: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    For {
        target: String,
        domain: IterDomain,
        body: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    FunctionDef(FunctionDef),
    Pragma {
        pragma: Expr,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    Return {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    /// A structural container the front-end emitted without a dedicated
    /// lowering; its children are lowered in order.
    Opaque {
        kind: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
}

impl Stmt {
    /// `target = value` on an existing binding.
    pub fn assign(target: Expr, value: Expr) -> Self {
        Stmt::Assign {
            op: AssignOp::Assign,
            target,
            value,
            is_decl: false,
            span: None,
        }
    }

    /// `target = value` introducing `target`.
    pub fn declare(target: Expr, value: Expr) -> Self {
        Stmt::Assign {
            op: AssignOp::Assign,
            target,
            value,
            is_decl: true,
            span: None,
        }
    }

    pub fn aug_assign(op: AssignOp, target: Expr, value: Expr) -> Self {
        Stmt::Assign {
            op,
            target,
            value,
            is_decl: false,
            span: None,
        }
    }

    pub fn kind_name(&self) -> &str {
        match self {
            Stmt::Expr(e) => e.kind_name(),
            Stmt::Assign { .. } => "assignment",
            Stmt::VarDecl { .. } => "variable declaration",
            Stmt::ArrayDecl { .. } => "array declaration",
            Stmt::If { .. } => "if statement",
            Stmt::For { .. } => "for statement",
            Stmt::While { .. } => "while statement",
            Stmt::FunctionDef(_) => "function definition",
            Stmt::Pragma { .. } => "pragma",
            Stmt::Return { .. } => "return",
            Stmt::Opaque { kind, .. } => kind.as_str(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Stmt::Expr(e) => e.span,
            Stmt::FunctionDef(f) => f.span,
            Stmt::Assign { span, .. }
            | Stmt::VarDecl { span, .. }
            | Stmt::ArrayDecl { span, .. }
            | Stmt::If { span, .. }
            | Stmt::For { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Pragma { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Opaque { span, .. } => *span,
        }
    }
}
