//! C pretty-printer.
//!
//! Output is deterministic: items in order, two-space indentation, one
//! statement per line.

use std::fmt::Write;

use crate::error::CodegenError;
use crate::target::ast::{CDecl, CExpr, CStmt, ConstKind, FuncDef, Item, TranslationUnit};

const INDENT: &str = "  ";

/// Arbitrary-precision integer and fixed-point support; always included.
pub const PRELUDE_HEADERS: [&str; 2] = ["ap_int.h", "ap_fixed.h"];

/// Emits the `#include` prelude, then `extra_headers` not already in it,
/// then the translation unit.
pub fn emit_c_source(
    unit: &TranslationUnit,
    extra_headers: &[String],
) -> Result<String, CodegenError> {
    let mut out = String::new();
    for header in PRELUDE_HEADERS {
        writeln!(out, "#include \"{}\"", header)?;
    }
    for header in extra_headers {
        if !PRELUDE_HEADERS.contains(&header.as_str()) {
            writeln!(out, "#include \"{}\"", header)?;
        }
    }
    if !unit.items.is_empty() {
        writeln!(out)?;
    }
    out.push_str(&emit_unit(unit)?);
    Ok(out)
}

/// Emits the translation unit without any prelude.
pub fn emit_unit(unit: &TranslationUnit) -> Result<String, CodegenError> {
    let mut out = String::new();
    for (i, item) in unit.items.iter().enumerate() {
        match item {
            Item::Function(func) => {
                if i > 0 {
                    writeln!(out)?;
                }
                emit_function(&mut out, func)?;
            }
            Item::Stmt(stmt) => emit_stmt(&mut out, stmt, 0)?,
        }
    }
    Ok(out)
}

pub fn emit_function(out: &mut String, func: &FuncDef) -> Result<(), CodegenError> {
    write!(out, "{} {}(", func.ret_ty, func.name)?;
    for (i, param) in func.params.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        emit_declarator(out, param)?;
    }
    writeln!(out, ") {{")?;
    for stmt in &func.body {
        emit_stmt(out, stmt, 1)?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

/// Renders a single statement with no indentation.
pub fn emit_stmt_text(stmt: &CStmt) -> Result<String, CodegenError> {
    let mut out = String::new();
    emit_stmt(&mut out, stmt, 0)?;
    Ok(out)
}

fn emit_declarator(out: &mut String, decl: &CDecl) -> Result<(), CodegenError> {
    write!(out, "{} {}", decl.ty, decl.name)?;
    for dim in &decl.dims {
        match dim {
            Some(extent) => write!(out, "[{}]", extent)?,
            None => write!(out, "[]")?,
        }
    }
    if let Some(init) = &decl.init {
        write!(out, " = {}", init)?;
    }
    Ok(())
}

fn emit_block(out: &mut String, body: &[CStmt], depth: usize) -> Result<(), CodegenError> {
    for stmt in body {
        emit_stmt(out, stmt, depth + 1)?;
    }
    Ok(())
}

fn emit_stmt(out: &mut String, stmt: &CStmt, depth: usize) -> Result<(), CodegenError> {
    let pad = INDENT.repeat(depth);
    match stmt {
        CStmt::Decl(decl) => {
            write!(out, "{}", pad)?;
            emit_declarator(out, decl)?;
            writeln!(out, ";")?;
        }
        CStmt::Assign { op, lvalue, rvalue } => {
            writeln!(out, "{}{} {} {};", pad, lvalue, op, rvalue)?;
        }
        CStmt::Expr(e) => {
            writeln!(out, "{}{};", pad, e)?;
        }
        CStmt::If {
            cond,
            then,
            otherwise,
        } => {
            writeln!(out, "{}if ({}) {{", pad, cond)?;
            emit_block(out, then, depth)?;
            if let Some(otherwise) = otherwise {
                writeln!(out, "{}}} else {{", pad)?;
                emit_block(out, otherwise, depth)?;
            }
            writeln!(out, "{}}}", pad)?;
        }
        CStmt::For(l) => {
            write!(
                out,
                "{}for (int {} = {}; {} {} {}; ",
                pad, l.var, l.start, l.var, l.cmp, l.end
            )?;
            if is_unit_step(&l.step) {
                writeln!(out, "{}++) {{", l.var)?;
            } else {
                writeln!(out, "{} += {}) {{", l.var, l.step)?;
            }
            emit_block(out, &l.body, depth)?;
            writeln!(out, "{}}}", pad)?;
        }
        CStmt::While { cond, body } => {
            writeln!(out, "{}while ({}) {{", pad, cond)?;
            emit_block(out, body, depth)?;
            writeln!(out, "{}}}", pad)?;
        }
        CStmt::Return(Some(e)) => writeln!(out, "{}return {};", pad, e)?,
        CStmt::Return(None) => writeln!(out, "{}return;", pad)?,
        CStmt::Pragma(text) => writeln!(out, "{}#pragma {}", pad, text)?,
    }
    Ok(())
}

fn is_unit_step(step: &CExpr) -> bool {
    matches!(step, CExpr::Const { kind: ConstKind::Int, value } if value == "1")
}
