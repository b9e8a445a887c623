//! Hardware directive insertion.
//!
//! Deciding which interface directives a design needs is not part of
//! lowering. Lowering only calls a `DirectiveInjector` at two fixed points:
//! once per annotated `for` loop and once for the synthesis entry point.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::target::ast::{CExpr, CStmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    In,
    Out,
    InOut,
}

/// One parameter of the top-level function as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceArg {
    pub name: String,
    #[serde(default)]
    pub direction: Direction,
    /// Passed by address (memory-mapped) rather than by value.
    #[serde(default)]
    pub array: bool,
    /// Memory bundle to place this argument in; allocated in order when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<usize>,
}

impl InterfaceArg {
    pub fn array(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            direction,
            array: true,
            bundle: None,
        }
    }

    pub fn scalar(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            direction,
            array: false,
            bundle: None,
        }
    }

    pub fn in_bundle(mut self, bundle: usize) -> Self {
        self.bundle = Some(bundle);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterfaceDesc {
    pub args: Vec<InterfaceArg>,
}

impl InterfaceDesc {
    pub fn new(args: Vec<InterfaceArg>) -> Self {
        Self { args }
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Side-effecting directive insertion into lowered bodies.
pub trait DirectiveInjector {
    /// Places `directive` (with its optional argument) as the first
    /// statement of a loop body.
    fn insert_loop_pragma(&self, body: &mut Vec<CStmt>, directive: &str, arg: Option<&CExpr>);

    /// Places the interface directives for the entry point at the top of
    /// its body. Returns the number of memory bundles the design uses.
    fn insert_interface_pragmas(&self, body: &mut Vec<CStmt>, iface: &InterfaceDesc) -> usize;
}

/// Vivado/Vitis HLS spelling of loop and interface directives.
#[derive(Debug, Clone, Copy, Default)]
pub struct HlsDirectives;

impl DirectiveInjector for HlsDirectives {
    fn insert_loop_pragma(&self, body: &mut Vec<CStmt>, directive: &str, arg: Option<&CExpr>) {
        let text = match arg {
            None => format!("HLS {}", directive),
            Some(arg) => match directive {
                "pipeline" => format!("HLS pipeline II={}", arg),
                "unroll" | "array_partition" | "array_reshape" => {
                    format!("HLS {} factor={}", directive, arg)
                }
                _ => format!("HLS {} {}", directive, arg),
            },
        };
        body.insert(0, CStmt::Pragma(text));
    }

    fn insert_interface_pragmas(&self, body: &mut Vec<CStmt>, iface: &InterfaceDesc) -> usize {
        let mut pragmas = Vec::with_capacity(iface.args.len() + 1);
        let mut next_bundle = 0usize;
        let mut bundles = 0usize;

        for arg in &iface.args {
            if arg.array {
                let bundle = arg.bundle.unwrap_or(next_bundle);
                next_bundle = next_bundle.max(bundle + 1);
                bundles = bundles.max(bundle + 1);
                pragmas.push(CStmt::Pragma(format!(
                    "HLS INTERFACE m_axi port={} offset=slave bundle=data{}",
                    arg.name, bundle
                )));
            } else {
                let mode = match arg.direction {
                    Direction::Out => "ap_vld",
                    Direction::In | Direction::InOut => "s_axilite",
                };
                pragmas.push(CStmt::Pragma(format!(
                    "HLS INTERFACE {} port={}",
                    mode, arg.name
                )));
            }
        }
        pragmas.push(CStmt::Pragma("HLS INTERFACE s_axilite port=return".to_owned()));

        body.splice(0..0, pragmas);
        bundles
    }
}
