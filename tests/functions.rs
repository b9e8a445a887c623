//! Integration tests for declarations, function signatures, the entry
//! point and directive insertion.

use std::cell::RefCell;

use hlsc::directive::Direction;
use hlsc::source::{
    AssignOp, BinOp, ElemType, Expr, FunctionDef, IterDomain, Param, Program, Shape, Stmt,
};
use hlsc::target::{emit_stmt_text, emit_unit, CExpr, CStmt};
use hlsc::{
    lower_program, DirectiveInjector, Error, InterfaceArg, InterfaceDesc, LowerConfig, LowerError,
    LowerOutput, Lowerer,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn func(name: &str, params: Vec<Param>, body: Vec<Stmt>, decorators: &[&str]) -> Stmt {
    Stmt::FunctionDef(FunctionDef {
        name: name.to_owned(),
        params,
        body,
        decorators: decorators.iter().map(|d| d.to_string()).collect(),
        return_ty: None,
        span: None,
    })
}

fn ret(value: Expr) -> Stmt {
    Stmt::Return {
        value: Some(value),
        span: None,
    }
}

fn int_var(name: &str) -> Expr {
    Expr::scalar_var(name, ElemType::int())
}

fn lower(body: Vec<Stmt>, interface: Option<&InterfaceDesc>) -> LowerOutput {
    lower_program(&Program::new(body), interface, &LowerConfig::default()).expect("lower")
}

fn render(body: Vec<Stmt>) -> String {
    emit_unit(&lower(body, None).unit).expect("emit")
}

// ---------------------------------------------------------------------------
// 1. Declarations
// ---------------------------------------------------------------------------

#[test]
fn test_scalar_declaration() {
    let out = lower(vec![Stmt::declare(int_var("x"), Expr::int(5))], None);
    let stmts: Vec<&CStmt> = out.unit.statements().collect();
    assert_eq!(stmts.len(), 1, "no loop wrapper expected: {:?}", stmts);
    assert!(matches!(stmts[0], CStmt::Decl(d) if !d.is_array()));
    assert_eq!(emit_stmt_text(stmts[0]).expect("emit"), "int x = 5;\n");
}

#[test]
fn test_scalar_reassignment() {
    let c = render(vec![Stmt::assign(int_var("x"), Expr::int(7))]);
    assert_eq!(c, "x = 7;\n");
}

#[test]
fn test_explicit_declarations_use_mapped_types() {
    let c = render(vec![
        Stmt::VarDecl {
            ty: ElemType::Int { bits: Some(12) },
            name: "acc".to_owned(),
            init: Some(Expr::int(0)),
            span: None,
        },
        Stmt::ArrayDecl {
            ty: ElemType::Fixed {
                width: 16,
                int_bits: 6,
            },
            name: "buf".to_owned(),
            dims: vec![Expr::int(64)],
            span: None,
        },
    ]);
    assert_eq!(c, "ap_int<12> acc = 0;\nap_fixed<16,6> buf[64];\n");
}

#[test]
fn test_literal_encodings() {
    let c = render(vec![
        Stmt::declare(Expr::scalar_var("flag", ElemType::Bool), Expr::bool(true)),
        Stmt::declare(Expr::scalar_var("off", ElemType::Bool), Expr::bool(false)),
        Stmt::declare(Expr::scalar_var("f", ElemType::float()), Expr::float(0.5)),
        Stmt::declare(Expr::scalar_var("g", ElemType::double()), Expr::float(2.0)),
    ]);
    assert!(c.contains("bool flag = 1;"), "got:\n{}", c);
    assert!(c.contains("bool off = 0;"), "got:\n{}", c);
    assert!(c.contains("float f = 0.5;"), "got:\n{}", c);
    assert!(c.contains("double g = 2.0;"), "got:\n{}", c);
}

#[test]
fn test_type_mapping() {
    let cases = [
        (ElemType::int(), "int"),
        (ElemType::Int { bits: Some(32) }, "int"),
        (ElemType::Int { bits: Some(7) }, "ap_int<7>"),
        (ElemType::uint(), "unsigned int"),
        (ElemType::UInt { bits: Some(1) }, "ap_uint<1>"),
        (
            ElemType::UFixed {
                width: 8,
                int_bits: 2,
            },
            "ap_ufixed<8,2>",
        ),
        (ElemType::Float { bits: 16 }, "half"),
        (ElemType::float(), "float"),
        (ElemType::double(), "double"),
        (ElemType::Bool, "bool"),
    ];
    for (ty, expected) in cases {
        assert_eq!(ty.c_name(), expected, "wrong C name for {:?}", ty);
    }
}

// ---------------------------------------------------------------------------
// 2. Control flow
// ---------------------------------------------------------------------------

#[test]
fn test_if_else_and_while() {
    let positive = Expr::binary(BinOp::Gt, int_var("x"), Expr::int(0), ElemType::Bool, Shape::scalar());
    let c = render(vec![
        Stmt::If {
            test: positive.clone(),
            body: vec![Stmt::assign(int_var("y"), Expr::int(1))],
            orelse: vec![Stmt::assign(int_var("y"), Expr::int(2))],
            span: None,
        },
        Stmt::While {
            test: positive,
            body: vec![Stmt::aug_assign(AssignOp::Sub, int_var("x"), Expr::int(1))],
            span: None,
        },
    ]);
    let expected = "\
if (x > 0) {
  y = 1;
} else {
  y = 2;
}
while (x > 0) {
  x -= 1;
}
";
    assert_eq!(c, expected);
}

#[test]
fn test_pragma_statement() {
    let c = render(vec![Stmt::Pragma {
        pragma: Expr::str("HLS dataflow"),
        span: None,
    }]);
    assert_eq!(c, "#pragma HLS dataflow\n");
}

// ---------------------------------------------------------------------------
// 3. Loop directives
// ---------------------------------------------------------------------------

fn counted_loop(domain: IterDomain) -> Stmt {
    Stmt::For {
        target: "i".to_owned(),
        domain,
        body: vec![Stmt::aug_assign(AssignOp::Add, int_var("s"), int_var("i"))],
        span: None,
    }
}

#[test]
fn test_for_loop_pipeline_directive_first_in_body() {
    let domain = IterDomain::range(0, 16).with_attr("pipeline", vec![Expr::int(1)]);
    let c = render(vec![counted_loop(domain)]);
    let expected = "\
for (int i = 0; i < 16; i++) {
  #pragma HLS pipeline II=1
  s += i;
}
";
    assert_eq!(c, expected);
}

#[test]
fn test_for_loop_unroll_factor_and_bare_directive() {
    let unrolled = counted_loop(IterDomain::range(0, 16).with_attr("unroll", vec![Expr::int(4)]));
    let bare = counted_loop(IterDomain::range(0, 16).with_attr("pipeline", Vec::new()));
    let c = render(vec![unrolled, bare]);
    assert!(c.contains("  #pragma HLS unroll factor=4\n"), "got:\n{}", c);
    assert!(c.contains("  #pragma HLS pipeline\n"), "got:\n{}", c);
}

#[test]
fn test_for_loop_non_unit_step() {
    let mut domain = IterDomain::range(0, 16);
    domain.step = Expr::int(2);
    let c = render(vec![counted_loop(domain)]);
    assert!(c.starts_with("for (int i = 0; i < 16; i += 2) {"), "got:\n{}", c);
}

#[derive(Default)]
struct Recorder {
    loops: RefCell<Vec<String>>,
    interfaces: RefCell<usize>,
}

impl DirectiveInjector for Recorder {
    fn insert_loop_pragma(&self, body: &mut Vec<CStmt>, directive: &str, arg: Option<&CExpr>) {
        self.loops
            .borrow_mut()
            .push(format!("{}:{}:{}", directive, arg.map(|a| a.to_string()).unwrap_or_default(), body.len()));
    }

    fn insert_interface_pragmas(&self, _body: &mut Vec<CStmt>, iface: &InterfaceDesc) -> usize {
        *self.interfaces.borrow_mut() += 1;
        iface.args.len()
    }
}

#[test]
fn test_custom_injector_sees_lowered_body() {
    let recorder = Recorder::default();
    let config = LowerConfig::default();
    let iface = InterfaceDesc::new(vec![InterfaceArg::scalar("n", Direction::In)]);
    let program = Program::new(vec![func(
        "kernel",
        vec![Param::annotated("n", ElemType::int(), vec![1])],
        vec![counted_loop(IterDomain::range(0, 4).with_attr("unroll", vec![Expr::int(2)]))],
        &["top"],
    )]);

    let out = Lowerer::new(&config)
        .with_injector(&recorder)
        .with_interface(Some(&iface))
        .lower_program(&program)
        .expect("lower");

    assert_eq!(*recorder.loops.borrow(), vec!["unroll:2:1".to_owned()]);
    assert_eq!(*recorder.interfaces.borrow(), 1);
    assert_eq!(out.bundles, Some(1));
}

// ---------------------------------------------------------------------------
// 4. Function signatures
// ---------------------------------------------------------------------------

#[test]
fn test_parameter_lowering() {
    let c = render(vec![func(
        "kernel",
        vec![
            Param::annotated("w", ElemType::float(), vec![4, 4]),
            Param::annotated("n", ElemType::int(), vec![1]),
            Param::untyped("a"),
        ],
        vec![ret(Expr::int(0))],
        &[],
    )]);
    let expected = "\
int kernel(float w[4][4], int n, float a[][]) {
  return 0;
}
";
    assert_eq!(c, expected);
}

#[test]
fn test_annotated_return_type() {
    let mut def = FunctionDef {
        name: "half_of".to_owned(),
        params: vec![Param::annotated("v", ElemType::float(), vec![1])],
        body: vec![ret(Expr::binary(
            BinOp::Mul,
            Expr::scalar_var("v", ElemType::float()),
            Expr::float(0.5),
            ElemType::float(),
            Shape::scalar(),
        ))],
        decorators: Vec::new(),
        return_ty: Some(ElemType::float()),
        span: None,
    };
    let c = render(vec![Stmt::FunctionDef(def.clone())]);
    assert!(c.starts_with("float half_of(float v) {\n  return v * 0.5;\n}"), "got:\n{}", c);

    def.return_ty = None;
    let config = LowerConfig {
        default_return_type: "void".to_owned(),
        ..LowerConfig::default()
    };
    let out = lower_program(&Program::new(vec![Stmt::FunctionDef(def)]), None, &config).expect("lower");
    let lowered = out.unit.function("half_of").expect("half_of");
    assert_eq!(lowered.ret_ty, "void");
}

#[test]
fn test_negative_parameter_shape_rejected() {
    let err = lower_program(
        &Program::new(vec![func(
            "kernel",
            vec![Param::annotated("w", ElemType::float(), vec![-4])],
            Vec::new(),
            &[],
        )]),
        None,
        &LowerConfig::default(),
    )
    .unwrap_err();
    assert!(
        matches!(err, Error::Lower(LowerError::InvalidShape { .. })),
        "expected InvalidShape, got {:?}",
        err
    );
}

#[test]
fn test_overflowing_parameter_shape_rejected() {
    let err = lower_program(
        &Program::new(vec![func(
            "kernel",
            vec![Param::annotated("w", ElemType::float(), vec![i64::MAX, 4])],
            Vec::new(),
            &[],
        )]),
        None,
        &LowerConfig::default(),
    )
    .unwrap_err();
    assert!(
        matches!(err, Error::Lower(LowerError::InvalidShape { .. })),
        "expected InvalidShape, got {:?}",
        err
    );
    assert_eq!(Shape::new(vec![i64::MAX, 4]).element_count(), None);
    assert_eq!(Shape::new(vec![4i64, 4]).element_count(), Some(16));
}

// ---------------------------------------------------------------------------
// 5. Entry point, interface directives and ordering
// ---------------------------------------------------------------------------

fn top_kernel() -> Stmt {
    let sum = Expr::binary(
        BinOp::Add,
        Expr::var("a", ElemType::float(), vec![8]),
        Expr::var("b", ElemType::float(), vec![8]),
        ElemType::float(),
        vec![8],
    );
    func(
        "kernel",
        vec![
            Param::annotated("a", ElemType::float(), vec![8]),
            Param::annotated("b", ElemType::float(), vec![8]),
            Param::annotated("n", ElemType::int(), vec![1]),
        ],
        vec![Stmt::assign(Expr::var("b", ElemType::float(), vec![8]), sum)],
        &["top"],
    )
}

#[test]
fn test_top_function_interface_directives() {
    let iface = InterfaceDesc::new(vec![
        InterfaceArg::array("a", Direction::In),
        InterfaceArg::array("b", Direction::Out),
        InterfaceArg::scalar("n", Direction::In),
    ]);
    let out = lower(vec![top_kernel()], Some(&iface));
    assert_eq!(out.top_function.as_deref(), Some("kernel"));
    assert_eq!(out.bundles, Some(2));

    let c = emit_unit(&out.unit).expect("emit");
    let expected = "\
int kernel(float a[8], float b[8], int n) {
  #pragma HLS INTERFACE m_axi port=a offset=slave bundle=data0
  #pragma HLS INTERFACE m_axi port=b offset=slave bundle=data1
  #pragma HLS INTERFACE s_axilite port=n
  #pragma HLS INTERFACE s_axilite port=return
  for (int i_bop_0 = 0; i_bop_0 < 8; i_bop_0++) {
    b[i_bop_0] = a[i_bop_0] + b[i_bop_0];
  }
}
";
    assert_eq!(c, expected);
}

#[test]
fn test_shared_bundle_and_output_scalar() {
    let iface = InterfaceDesc::new(vec![
        InterfaceArg::array("a", Direction::In).in_bundle(0),
        InterfaceArg::array("b", Direction::Out).in_bundle(0),
        InterfaceArg::scalar("n", Direction::Out),
    ]);
    let out = lower(vec![top_kernel()], Some(&iface));
    assert_eq!(out.bundles, Some(1));
    let c = emit_unit(&out.unit).expect("emit");
    assert!(c.contains("port=b offset=slave bundle=data0"), "got:\n{}", c);
    assert!(c.contains("#pragma HLS INTERFACE ap_vld port=n"), "got:\n{}", c);
}

#[test]
fn test_no_interface_means_no_directives() {
    let out = lower(vec![top_kernel()], None);
    assert_eq!(out.top_function.as_deref(), Some("kernel"));
    assert_eq!(out.bundles, None);
    let c = emit_unit(&out.unit).expect("emit");
    assert!(!c.contains("#pragma"), "got:\n{}", c);
}

#[test]
fn test_aux_functions_precede_top_level_items() {
    let helper = func(
        "helper",
        vec![Param::annotated("x", ElemType::int(), vec![1])],
        vec![ret(int_var("x"))],
        &[],
    );
    let out = lower(
        vec![Stmt::declare(int_var("g"), Expr::int(1)), top_kernel(), helper],
        None,
    );
    let names: Vec<&str> = out.unit.functions().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["helper", "kernel"]);

    let c = emit_unit(&out.unit).expect("emit");
    let helper_at = c.find("int helper(").expect("helper");
    let global_at = c.find("int g = 1;").expect("global");
    let kernel_at = c.find("int kernel(").expect("kernel");
    assert!(helper_at < global_at && global_at < kernel_at, "wrong order:\n{}", c);
}

#[test]
fn test_custom_top_marker() {
    let config = LowerConfig {
        top_marker: "kernel_entry".to_owned(),
        ..LowerConfig::default()
    };
    let program = Program::new(vec![
        func("a", Vec::new(), Vec::new(), &["top"]),
        func("b", Vec::new(), Vec::new(), &["kernel_entry"]),
    ]);
    let out = lower_program(&program, None, &config).expect("lower");
    assert_eq!(out.top_function.as_deref(), Some("b"));
}

#[test]
fn test_two_entry_points_rejected() {
    let err = lower_program(
        &Program::new(vec![
            func("a", Vec::new(), Vec::new(), &["top"]),
            func("b", Vec::new(), Vec::new(), &["top"]),
        ]),
        None,
        &LowerConfig::default(),
    )
    .unwrap_err();
    assert!(
        matches!(err, Error::Lower(LowerError::Unsupported { .. })),
        "expected Unsupported, got {:?}",
        err
    );
}

#[test]
fn test_nested_function_rejected() {
    let inner = func("inner", Vec::new(), Vec::new(), &[]);
    let err = lower_program(
        &Program::new(vec![func("outer", Vec::new(), vec![inner], &[])]),
        None,
        &LowerConfig::default(),
    )
    .unwrap_err();
    assert!(
        matches!(err, Error::Lower(LowerError::Unsupported { .. })),
        "expected Unsupported, got {:?}",
        err
    );
}
