//! Source diagnostics: byte-to-line/col mapping and human-readable error rendering.
//!
//! Spans come from the front-end that produced the annotated tree, so
//! rendering needs that front-end's original text.

use crate::error::Error;
use crate::lower::Warning;
use crate::source::span::Span;

/// Converts a byte offset within `source` to a 1-based `(line, col)` pair.
///
/// # Examples
/// ```text
/// "abc\ndef\n", byte 4  -> (2, 1)   // 'd' is first char of line 2
/// "hello",     byte 2  -> (1, 3)   // 'l' at column 3 on line 1
/// ```
pub fn byte_to_line_col(source: &str, byte: u32) -> (u32, u32) {
    let byte = byte as usize;
    let mut line = 1u32;
    let mut col = 1u32;
    for (i, ch) in source.char_indices() {
        if i == byte {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Renders a rustc-style diagnostic for `err`, with a source excerpt and caret.
///
/// ```text
/// error[E0100]: [lowering error] unsupported literal of kind 'complex': ...
///  --> 3:9
///   |
/// 3 |     x = 1j
///   |         ^^
/// ```
pub fn render_error(source: &str, err: &Error) -> String {
    let mut out = format!("error[{}]: {}\n", err.diagnostic_code(), err);
    if let Some(span) = err.span() {
        push_excerpt(&mut out, source, span);
    }
    out
}

/// Renders a lowering warning in the same layout as `render_error`.
pub fn render_warning(source: &str, warning: &Warning) -> String {
    let mut out = format!("warning: {}: {}\n", warning.node, warning.message);
    if let Some(span) = warning.span {
        push_excerpt(&mut out, source, span);
    }
    out
}

fn push_excerpt(out: &mut String, source: &str, span: Span) {
    let (line, col) = byte_to_line_col(source, span.start.0);
    let source_line = source.lines().nth((line - 1) as usize).unwrap_or("");

    // Caret run covers the span but never runs past the end of the line.
    let indent = (col as usize).saturating_sub(1);
    let width = (span.end.0.saturating_sub(span.start.0) as usize)
        .max(1)
        .min(source_line.len().saturating_sub(indent).max(1));
    let pointer = format!("{}{}", " ".repeat(indent), "^".repeat(width));
    let line_num = line.to_string();
    let gutter = " ".repeat(line_num.len());

    out.push_str(&format!(" --> {}:{}\n", line, col));
    out.push_str(&format!("{} |\n", gutter));
    out.push_str(&format!("{} | {}\n", line_num, source_line));
    out.push_str(&format!("{} | {}\n", gutter, pointer));
}
