use thiserror::Error;

use crate::source::span::Span;

/// Top-level error type for the lowering pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", format_error_pretty("lowering error", &format!("{}", _0)))]
    Lower(#[from] LowerError),

    #[error("{}", format_error_pretty("input error", &format!("{}", _0)))]
    Json(#[from] serde_json::Error),

    #[error("{}", format_error_pretty("codegen error", &format!("{}", _0)))]
    Codegen(#[from] CodegenError),
}

fn format_error_pretty(category: &str, msg: &str) -> String {
    format!("[{}] {}", category, msg)
}

// ---------------------------------------------------------------------------
// Lowering errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LowerError {
    #[error("unsupported literal of kind '{kind}': only booleans, integers, floats and strings can be lowered")]
    UnsupportedLiteral { kind: String, span: Option<Span> },

    #[error("map body is an assignment: a function literal applied by map must be a single expression")]
    MapBodyIsAssignment { span: Option<Span> },

    #[error("map body is a {kind}: a function literal applied by map must be a single expression")]
    MapBodyNotExpression { kind: String, span: Option<Span> },

    #[error("map applies a function of {params} parameter(s) to {arrays} array(s)")]
    MapArity {
        params: usize,
        arrays: usize,
        span: Option<Span>,
    },

    #[error("invalid shape: {detail}")]
    InvalidShape { detail: String, span: Option<Span> },

    #[error("invalid slice step {step}: a slice step must be non-zero")]
    InvalidSlice { step: i64, span: Option<Span> },

    #[error("array-valued {kind} has no assignment target: elementwise results must be assigned to an array")]
    MissingAssignTarget { kind: String, span: Option<Span> },

    #[error("cannot assign to a {kind}: assignment targets must be variables or subscripts")]
    InvalidTarget { kind: String, span: Option<Span> },

    #[error("unsupported {kind}: {detail}")]
    Unsupported {
        kind: String,
        detail: String,
        span: Option<Span>,
    },
}

impl LowerError {
    /// Source location of the offending node, when the front-end supplied one.
    pub fn span(&self) -> Option<Span> {
        match self {
            LowerError::UnsupportedLiteral { span, .. }
            | LowerError::MapBodyIsAssignment { span }
            | LowerError::MapBodyNotExpression { span, .. }
            | LowerError::MapArity { span, .. }
            | LowerError::InvalidShape { span, .. }
            | LowerError::InvalidSlice { span, .. }
            | LowerError::MissingAssignTarget { span, .. }
            | LowerError::InvalidTarget { span, .. }
            | LowerError::Unsupported { span, .. } => *span,
        }
    }
}

// ---------------------------------------------------------------------------
// Codegen errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("failed to render C source: {detail}")]
    Render { detail: String },
}

impl From<std::fmt::Error> for CodegenError {
    fn from(e: std::fmt::Error) -> Self {
        CodegenError::Render {
            detail: e.to_string(),
        }
    }
}

impl Error {
    /// Returns a stable diagnostic code for this error.
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            Error::Lower(l) => match l {
                LowerError::UnsupportedLiteral { .. } => "E0100",
                LowerError::MapBodyIsAssignment { .. } => "E0101",
                LowerError::MapBodyNotExpression { .. } => "E0102",
                LowerError::MapArity { .. } => "E0103",
                LowerError::InvalidShape { .. } => "E0104",
                LowerError::InvalidSlice { .. } => "E0105",
                LowerError::MissingAssignTarget { .. } => "E0106",
                LowerError::InvalidTarget { .. } => "E0107",
                LowerError::Unsupported { .. } => "E0108",
            },
            Error::Json(_) => "E0200",
            Error::Codegen(_) => "E0300",
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Lower(l) => l.span(),
            Error::Json(_) | Error::Codegen(_) => None,
        }
    }
}
