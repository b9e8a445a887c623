//! Integration tests for errors, warnings, diagnostics rendering and JSON
//! input.

use hlsc::diagnostics::{byte_to_line_col, render_error, render_warning};
use hlsc::source::{BinOp, ElemType, Expr, ExprKind, Literal, Program, Span, Stmt};
use hlsc::target::emit_unit;
use hlsc::{codegen, codegen_json, lower_program, Error, InterfaceDesc, LowerConfig, LowerError};

fn lower_err(body: Vec<Stmt>) -> Error {
    lower_program(&Program::new(body), None, &LowerConfig::default()).unwrap_err()
}

fn complex_literal(span: Span) -> Expr {
    Expr::new(
        ExprKind::Literal(Literal::Other {
            kind: "complex".to_owned(),
            text: "1j".to_owned(),
        }),
        ElemType::float(),
        Default::default(),
    )
    .with_span(span)
}

// ---------------------------------------------------------------------------
// 1. Unsupported constructs
// ---------------------------------------------------------------------------

#[test]
fn test_unsupported_literal() {
    let x = Expr::scalar_var("x", ElemType::float());
    let err = lower_err(vec![Stmt::declare(x, complex_literal(Span::new(4, 6)))]);
    match &err {
        Error::Lower(LowerError::UnsupportedLiteral { kind, span }) => {
            assert_eq!(kind, "complex");
            assert_eq!(*span, Some(Span::new(4, 6)));
        }
        other => panic!("expected UnsupportedLiteral, got {:?}", other),
    }
    assert_eq!(err.diagnostic_code(), "E0100");
}

#[test]
fn test_non_finite_float_literal_rejected() {
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let f = Expr::scalar_var("f", ElemType::float());
        let err = lower_err(vec![Stmt::declare(f, Expr::float(value))]);
        assert!(
            matches!(err, Error::Lower(LowerError::UnsupportedLiteral { .. })),
            "expected UnsupportedLiteral for {}, got {:?}",
            value,
            err
        );
    }
}

#[test]
fn test_opaque_expression_rejected() {
    let opaque = Expr::new(
        ExprKind::Opaque {
            kind: "starred".to_owned(),
        },
        ElemType::int(),
        Default::default(),
    );
    let err = lower_err(vec![Stmt::Expr(opaque)]);
    assert!(
        matches!(&err, Error::Lower(LowerError::Unsupported { kind, .. }) if kind == "starred"),
        "expected Unsupported, got {:?}",
        err
    );
}

#[test]
fn test_array_expression_without_target() {
    let sum = Expr::binary(
        BinOp::Add,
        Expr::var("a", ElemType::float(), vec![8]),
        Expr::var("b", ElemType::float(), vec![8]),
        ElemType::float(),
        vec![8],
    );
    let err = lower_err(vec![Stmt::Expr(sum)]);
    assert!(
        matches!(err, Error::Lower(LowerError::MissingAssignTarget { .. })),
        "expected MissingAssignTarget, got {:?}",
        err
    );
}

#[test]
fn test_invalid_assignment_target() {
    let target = Expr::call("f", Vec::new(), ElemType::int(), Vec::<i64>::new());
    let err = lower_err(vec![Stmt::assign(target, Expr::int(1))]);
    assert!(
        matches!(err, Error::Lower(LowerError::InvalidTarget { .. })),
        "expected InvalidTarget, got {:?}",
        err
    );
}

// ---------------------------------------------------------------------------
// 2. Warnings for nodes that produce no output
// ---------------------------------------------------------------------------

#[test]
fn test_childless_opaque_statement_warns() {
    let out = lower_program(
        &Program::new(vec![Stmt::Opaque {
            kind: "pass".to_owned(),
            children: Vec::new(),
            span: Some(Span::new(0, 4)),
        }]),
        None,
        &LowerConfig::default(),
    )
    .expect("lower");
    assert!(out.unit.items.is_empty(), "nothing should be emitted");
    assert_eq!(out.warnings.len(), 1, "warnings: {:?}", out.warnings);
    assert_eq!(out.warnings[0].node, "pass");
    assert_eq!(out.warnings[0].span, Some(Span::new(0, 4)));

    let rendered = render_warning("pass\n", &out.warnings[0]);
    assert!(rendered.starts_with("warning: pass: "), "got:\n{}", rendered);
    assert!(rendered.contains("1 | pass\n  | ^^^^\n"), "got:\n{}", rendered);
}

#[test]
fn test_opaque_container_lowers_children() {
    let x = Expr::scalar_var("x", ElemType::int());
    let out = lower_program(
        &Program::new(vec![Stmt::Opaque {
            kind: "with".to_owned(),
            children: vec![Stmt::assign(x, Expr::int(3))],
            span: None,
        }]),
        None,
        &LowerConfig::default(),
    )
    .expect("lower");
    assert!(out.warnings.is_empty(), "unexpected warnings: {:?}", out.warnings);
    assert_eq!(emit_unit(&out.unit).expect("emit"), "x = 3;\n");
}

#[test]
fn test_bare_array_statement_warns() {
    let out = lower_program(
        &Program::new(vec![Stmt::Expr(Expr::var("a", ElemType::float(), vec![8]))]),
        None,
        &LowerConfig::default(),
    )
    .expect("lower");
    assert!(out.unit.items.is_empty());
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].node, "variable");
}

// ---------------------------------------------------------------------------
// 3. Rendering
// ---------------------------------------------------------------------------

#[test]
fn test_byte_to_line_col() {
    assert_eq!(byte_to_line_col("abc\ndef\n", 4), (2, 1));
    assert_eq!(byte_to_line_col("hello", 2), (1, 3));
}

#[test]
fn test_render_error_with_excerpt() {
    let source = "x = 1j\n";
    let x = Expr::scalar_var("x", ElemType::float());
    let err = lower_err(vec![Stmt::declare(x, complex_literal(Span::new(4, 6)))]);
    let rendered = render_error(source, &err);
    assert!(
        rendered.starts_with("error[E0100]: [lowering error] unsupported literal of kind 'complex'"),
        "got:\n{}",
        rendered
    );
    assert!(rendered.contains(" --> 1:5\n"), "got:\n{}", rendered);
    assert!(rendered.contains("1 | x = 1j\n"), "got:\n{}", rendered);
    assert!(rendered.contains("  |     ^^\n"), "got:\n{}", rendered);
}

#[test]
fn test_render_error_without_span() {
    let err = Error::from(LowerError::MapBodyIsAssignment { span: None });
    let rendered = render_error("", &err);
    assert_eq!(rendered.lines().count(), 1, "no excerpt expected:\n{}", rendered);
    assert!(rendered.starts_with("error[E0101]: "), "got:\n{}", rendered);
}

// ---------------------------------------------------------------------------
// 4. Whole-pipeline entry points
// ---------------------------------------------------------------------------

const ADD_JSON: &str = r#"
{
  "body": [
    {
      "assign": {
        "target": { "kind": { "var": "c" }, "ty": { "float": { "bits": 32 } }, "shape": [8] },
        "value": {
          "kind": {
            "binary": {
              "op": "+",
              "lhs": { "kind": { "var": "a" }, "ty": { "float": { "bits": 32 } }, "shape": [8] },
              "rhs": { "kind": { "var": "b" }, "ty": { "float": { "bits": 32 } }, "shape": [8] }
            }
          },
          "ty": { "float": { "bits": 32 } },
          "shape": [8]
        },
        "is_decl": true
      }
    }
  ]
}
"#;

#[test]
fn test_codegen_json_with_headers() {
    let c = codegen_json(ADD_JSON, None, &LowerConfig::default()).expect("codegen");
    let expected = "\
#include \"ap_int.h\"
#include \"ap_fixed.h\"

float c[8];
for (int i_bop_0 = 0; i_bop_0 < 8; i_bop_0++) {
  c[i_bop_0] = a[i_bop_0] + b[i_bop_0];
}
";
    assert_eq!(c, expected);
}

#[test]
fn test_extra_headers_follow_fixed_prelude() {
    let program = hlsc::source::from_json(ADD_JSON).expect("parse");
    let config = LowerConfig {
        headers: vec!["hls_math.h".to_owned(), "ap_int.h".to_owned()],
        ..LowerConfig::default()
    };
    let c = codegen(&program, None, &config).expect("codegen");
    let prelude = "\
#include \"ap_int.h\"
#include \"ap_fixed.h\"
#include \"hls_math.h\"

float c[8];
";
    assert!(c.starts_with(prelude), "got:\n{}", c);
    assert_eq!(c.matches("ap_int.h").count(), 1, "prelude header repeated:\n{}", c);
}

#[test]
fn test_prelude_emitted_for_empty_program() {
    let c = codegen(&Program::default(), None, &LowerConfig::default()).expect("codegen");
    assert_eq!(c, "#include \"ap_int.h\"\n#include \"ap_fixed.h\"\n");
}

#[test]
fn test_interface_and_config_from_json() {
    let iface = InterfaceDesc::from_json(
        r#"{ "args": [ { "name": "a", "array": true }, { "name": "n", "direction": "out" } ] }"#,
    )
    .expect("interface");
    assert!(iface.args[0].array);
    assert_eq!(iface.args[1].direction, hlsc::directive::Direction::Out);

    let config: LowerConfig = serde_json::from_str(r#"{ "top_marker": "entry" }"#).expect("config");
    assert_eq!(config.top_marker, "entry");
    assert_eq!(config.headers, LowerConfig::default().headers);
    assert!(!config.debug);
}

#[test]
fn test_malformed_json_is_input_error() {
    let err = codegen_json("{ \"body\": [ { \"nope\": 1 } ] }", None, &LowerConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::Json(_)), "expected Json, got {:?}", err);
    assert_eq!(err.diagnostic_code(), "E0200");
    assert!(err.span().is_none());
}
