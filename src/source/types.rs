//! Element types and shapes as annotated by the upstream typer.
//!
//! Both are read-only inputs to lowering: nothing in this crate infers or
//! recomputes them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Base scalar kind of an expression, with bit-width where the kind has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElemType {
    Bool,
    /// Signed integer. `None` means the platform `int`.
    Int { bits: Option<u16> },
    /// Unsigned integer. `None` means the platform `unsigned int`.
    #[serde(rename = "uint")]
    UInt { bits: Option<u16> },
    /// Signed fixed-point with `width` total bits, `int_bits` of them integral.
    Fixed { width: u16, int_bits: u16 },
    /// Unsigned fixed-point.
    #[serde(rename = "ufixed")]
    UFixed { width: u16, int_bits: u16 },
    Float { bits: u16 },
    /// Result type of calls that produce no value.
    Void,
}

impl ElemType {
    pub fn int() -> Self {
        ElemType::Int { bits: None }
    }

    pub fn uint() -> Self {
        ElemType::UInt { bits: None }
    }

    pub fn float() -> Self {
        ElemType::Float { bits: 32 }
    }

    pub fn double() -> Self {
        ElemType::Float { bits: 64 }
    }

    /// Target-language spelling of this type.
    ///
    /// Native widths map onto C scalars; anything else goes through the
    /// arbitrary-precision `ap_*` templates.
    pub fn c_name(&self) -> String {
        match *self {
            ElemType::Bool => "bool".to_owned(),
            ElemType::Int { bits: None | Some(32) } => "int".to_owned(),
            ElemType::Int { bits: Some(n) } => format!("ap_int<{}>", n),
            ElemType::UInt { bits: None | Some(32) } => "unsigned int".to_owned(),
            ElemType::UInt { bits: Some(n) } => format!("ap_uint<{}>", n),
            ElemType::Fixed { width, int_bits } => format!("ap_fixed<{},{}>", width, int_bits),
            ElemType::UFixed { width, int_bits } => format!("ap_ufixed<{},{}>", width, int_bits),
            ElemType::Float { bits: 16 } => "half".to_owned(),
            ElemType::Float { bits: 64 } => "double".to_owned(),
            ElemType::Float { .. } => "float".to_owned(),
            ElemType::Void => "void".to_owned(),
        }
    }
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.c_name())
    }
}

/// Ordered dimension extents. The empty shape is a scalar.
///
/// Extents are kept signed so that a malformed annotation survives
/// deserialization and is rejected by lowering with a proper error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape(pub Vec<i64>);

impl Shape {
    pub fn new(dims: impl Into<Vec<i64>>) -> Self {
        Shape(dims.into())
    }

    pub fn scalar() -> Self {
        Shape(Vec::new())
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn dims(&self) -> &[i64] {
        &self.0
    }

    pub fn dim(&self, i: usize) -> Option<i64> {
        self.0.get(i).copied()
    }

    /// Extent 1: always indexed with a fixed offset.
    pub fn is_degenerate(&self, i: usize) -> bool {
        self.dim(i) == Some(1)
    }

    /// First negative extent, as `(position, extent)`.
    pub fn first_invalid(&self) -> Option<(usize, i64)> {
        self.0.iter().copied().enumerate().find(|&(_, d)| d < 0)
    }

    /// Total number of elements, or `None` if any extent is invalid or the
    /// count does not fit in an `i64`.
    pub fn element_count(&self) -> Option<i64> {
        if self.first_invalid().is_some() {
            return None;
        }
        self.0.iter().try_fold(1i64, |acc, &d| acc.checked_mul(d))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        if self.0.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

impl From<Vec<i64>> for Shape {
    fn from(dims: Vec<i64>) -> Self {
        Shape(dims)
    }
}
