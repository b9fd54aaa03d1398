// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

use expect_test::expect;
use ofc_semantics::asg::{LabeledStmt, Stmt};
use ofc_semantics::context::{Context, LangOptions};
use ofc_semantics::decl::DeclId;
use ofc_semantics::scope::{DummyArgument, ScopeKind};
use ofc_semantics::semantic_error::SemanticErrorKind;
use ofc_semantics::syntax_to_semantics::{analyze_source, ParseResult};
use ofc_syntax::ast::make::*;
use ofc_syntax::ast::{
    ArraySpec, BaseType, ClistEntry, CommonGroup, DataEntry, Decl, DeclStmt, DimensionEntity,
    DummyArg, Expr, ImplicitRule, ImplicitStmt, LenSpec, LetterRange, Lhs, ParameterAssign,
    ProgramUnit, SourceFile, StmtKind, StructureDef, TypeSpec, UnitKind,
};

//
// Parse-tree shorthands
//

fn program(body: Vec<ofc_syntax::ast::Stmt>) -> ProgramUnit {
    unit(UnitKind::Program, Some("MAIN"), body)
}

fn subroutine(unit_name: &str, args: &[&str], body: Vec<ofc_syntax::ast::Stmt>) -> ProgramUnit {
    ProgramUnit {
        args: args.iter().map(|a| dummy(a)).collect(),
        ..unit(UnitKind::Subroutine, Some(unit_name), body)
    }
}

fn function(
    ty: Option<TypeSpec>,
    unit_name: &str,
    args: &[&str],
    body: Vec<ofc_syntax::ast::Stmt>,
) -> ProgramUnit {
    ProgramUnit {
        args: args.iter().map(|a| dummy(a)).collect(),
        ..unit(UnitKind::Function(ty), Some(unit_name), body)
    }
}

fn dummy(text: &str) -> DummyArg {
    if text == "*" {
        DummyArg::Asterisk(Default::default())
    } else {
        DummyArg::Name(name(text))
    }
}

fn declare(ty: TypeSpec, decls: Vec<Decl>) -> ofc_syntax::ast::Stmt {
    stmt(StmtKind::Decl(decl_stmt(ty, decls)))
}

fn scalar(base: BaseType, names: &[&str]) -> ofc_syntax::ast::Stmt {
    declare(type_spec(base), names.iter().map(|n| decl(n)).collect())
}

fn call_stmt(text: &str, args: Vec<ofc_syntax::ast::CallArg>) -> ofc_syntax::ast::Stmt {
    stmt(StmtKind::Call {
        name: name(text),
        args,
    })
}

fn if_stmt(cond: Expr, then: ofc_syntax::ast::Stmt) -> ofc_syntax::ast::Stmt {
    stmt(StmtKind::If {
        cond,
        then: Box::new(then),
    })
}

fn data(targets: Vec<Lhs>, values: Vec<Expr>) -> DataEntry {
    DataEntry {
        targets,
        values: values
            .into_iter()
            .map(|value| ClistEntry { repeat: None, value })
            .collect(),
    }
}

fn analyze(units: Vec<ProgramUnit>) -> ParseResult {
    analyze_with(units, LangOptions::new())
}

fn analyze_with(units: Vec<ProgramUnit>, options: LangOptions) -> ParseResult {
    analyze_source(&SourceFile { units }, options).unwrap()
}

fn error_kinds(result: &ParseResult) -> Vec<SemanticErrorKind> {
    result.errors().kinds().cloned().collect()
}

fn local(result: &ParseResult, unit: usize, text: &str) -> DeclId {
    let scope = result.program()[unit].scope();
    result.context().lookup_local(scope, text).unwrap()
}

fn type_of(result: &ParseResult, unit: usize, text: &str) -> String {
    let decl = local(result, unit, text);
    result.context().decl(decl).unwrap().get_type().to_string()
}

fn render(context: &Context, stmt: &LabeledStmt) -> String {
    let label = stmt.label().map_or(String::new(), |l| format!("{l} "));
    let text = match stmt.stmt() {
        Stmt::Assignment(a) => format!("{} = {}", a.lvalue().display(context), a.rvalue().display(context)),
        Stmt::Call(call) => {
            let args: Vec<String> = call
                .args()
                .iter()
                .map(|a| a.expr().display(context).to_string())
                .collect();
            let callee = context.decl(call.decl()).unwrap().name();
            format!("CALL {callee}({})", args.join(", "))
        }
        Stmt::If(if_stmt) => format!(
            "IF ({}) {}",
            if_stmt.condition().display(context),
            render(context, if_stmt.then_branch())
        ),
        Stmt::Continue => "CONTINUE".to_string(),
        Stmt::GoTo(label) => format!("GO TO {label}"),
        Stmt::Return(None) => "RETURN".to_string(),
        Stmt::Return(Some(e)) => format!("RETURN {}", e.display(context)),
        Stmt::Stop(None) => "STOP".to_string(),
        Stmt::Stop(Some(e)) => format!("STOP {}", e.display(context)),
    };
    format!("{label}{text}")
}

fn render_unit(result: &ParseResult, unit: usize) -> String {
    result.program()[unit]
        .stmts()
        .iter()
        .map(|s| render(result.context(), s))
        .collect::<Vec<_>>()
        .join("\n")
}

//
// Tests
//

#[test]
fn test_data_initializes_elements() {
    let result = analyze(vec![program(vec![
        declare(type_spec(BaseType::Integer), vec![decl_array("A", array_spec(&[3]))]),
        stmt(StmtKind::Data(vec![
            data(vec![lhs_index("A", vec![int("2")])], vec![int("5")]),
            data(vec![lhs_index("A", vec![int("3")])], vec![int("7")]),
        ])),
    ])]);
    assert!(!result.any_semantic_errors(), "{}", result.errors());
    let a = result.context().decl(local(&result, 0, "A")).unwrap();
    let values: Vec<Option<i128>> = (0..4)
        .map(|i| a.init_at(i).and_then(|v| v.as_integer()))
        .collect();
    assert_eq!(values, [None, Some(5), Some(7), None]);
    assert_eq!(a.elem_count().unwrap(), 3);
}

#[test]
fn test_data_whole_array_and_count_mismatch() {
    let result = analyze(vec![program(vec![
        stmt(StmtKind::Dimension(vec![DimensionEntity {
            name: name("V"),
            dims: array_spec(&[2]),
        }])),
        stmt(StmtKind::Data(vec![data(
            vec![lhs_var("V"), lhs_var("K")],
            vec![real("1.0"), real("2.0"), int("3")],
        )])),
        stmt(StmtKind::Data(vec![data(vec![lhs_var("W")], vec![int("1"), int("2")])])),
    ])]);
    assert_eq!(error_kinds(&result).len(), 1);
    assert!(matches!(error_kinds(&result)[0], SemanticErrorKind::InvalidDeclaration(_)));
    let v = result.context().decl(local(&result, 0, "V")).unwrap();
    assert_eq!(v.init_at(1).and_then(|x| x.as_real()), Some(2.0));
    let k = result.context().decl(local(&result, 0, "K")).unwrap();
    assert_eq!(k.constant_value().and_then(|x| x.as_integer()), Some(3));
}

#[test]
fn test_clist_initializer_with_repeat() {
    let init = clist(vec![(Some(2), int("0")), (None, int("9"))]);
    let entity = Decl {
        init: Some(init),
        ..decl_array("A", array_spec(&[3]))
    };
    let result = analyze(vec![program(vec![declare(type_spec(BaseType::Integer), vec![entity])])]);
    assert!(!result.any_semantic_errors(), "{}", result.errors());
    let a = result.context().decl(local(&result, 0, "A")).unwrap();
    let values: Vec<Option<i128>> = (0..3)
        .map(|i| a.init_at(i).and_then(|v| v.as_integer()))
        .collect();
    assert_eq!(values, [Some(0), Some(0), Some(9)]);
}

#[test]
fn test_assignments_are_converted() {
    let result = analyze(vec![program(vec![
        declare(type_spec(BaseType::Integer), vec![decl_array("A", array_spec(&[3]))]),
        scalar(BaseType::DoublePrecision, &["D"]),
        assign(lhs_var("X"), add(index("A", vec![int("2")]), int("1"))),
        assign(lhs_var("D"), var("X")),
        assign(lhs_var("I"), var("D")),
        assign(lhs_var("A"), int("0")),
    ])]);
    assert!(!result.any_semantic_errors(), "{}", result.errors());
    expect![[r#"
        X = REAL(A(2) + 1)
        D = DBLE(X)
        I = INT(D)
        A = 0"#]]
    .assert_eq(&render_unit(&result, 0));
    // INTEGER to REAL and REAL(8) to INTEGER may lose information.
    assert_eq!(result.warnings().warnings().count(), 2);
}

#[test]
fn test_failed_statements_are_skipped() {
    let result = analyze(vec![program(vec![
        declare(type_spec(BaseType::Character), vec![decl("C")]),
        scalar(BaseType::Integer, &["J"]),
        scalar(BaseType::Real, &["J"]),
        assign(lhs_var("I"), var("C")),
        assign(lhs_var("I"), int("1")),
        if_stmt(var("I"), stmt(StmtKind::Continue)),
    ])]);
    let kinds = error_kinds(&result);
    assert_eq!(kinds.len(), 3);
    assert_eq!(kinds[0], SemanticErrorKind::DuplicateName("J".into()));
    assert!(matches!(kinds[1], SemanticErrorKind::TypeMismatch(_)));
    assert!(matches!(kinds[2], SemanticErrorKind::TypeMismatch(_)));
    expect![[r#"I = 1"#]].assert_eq(&render_unit(&result, 0));
    assert_eq!(type_of(&result, 0, "J"), "INTEGER");
}

#[test]
fn test_implicit_statements() {
    let double = ImplicitRule {
        ty: type_spec(BaseType::DoublePrecision),
        letters: vec![LetterRange { start: 'D', end: 'E' }],
    };
    let result = analyze(vec![
        program(vec![
            stmt(StmtKind::Implicit(ImplicitStmt::Rules(vec![double]))),
            assign(lhs_var("DX"), int("1")),
            assign(lhs_var("FX"), int("1")),
        ]),
        subroutine(
            "S",
            &[],
            vec![
                stmt(StmtKind::Implicit(ImplicitStmt::None)),
                assign(lhs_var("Y"), int("1")),
            ],
        ),
    ]);
    assert_eq!(type_of(&result, 0, "DX"), "REAL(KIND=8)");
    assert_eq!(type_of(&result, 0, "FX"), "REAL");
    assert_eq!(
        error_kinds(&result),
        [SemanticErrorKind::UndeclaredReference("Y".into())]
    );
}

#[test]
fn test_implicit_none_needs_typed_dummies() {
    let result = analyze(vec![function(
        None,
        "F",
        &["X"],
        vec![
            stmt(StmtKind::Implicit(ImplicitStmt::None)),
            scalar(BaseType::Real, &["F"]),
        ],
    )]);
    assert_eq!(
        error_kinds(&result),
        [SemanticErrorKind::UndeclaredReference("X".into())]
    );
}

#[test]
fn test_parameter_in_bounds() {
    let result = analyze(vec![program(vec![
        scalar(BaseType::Integer, &["N"]),
        stmt(StmtKind::Parameter(vec![ParameterAssign {
            name: name("N"),
            value: add(int("1"), int("2")),
        }])),
        declare(
            type_spec(BaseType::Real),
            vec![Decl {
                dims: Some(ArraySpec {
                    dims: vec![ofc_syntax::ast::ArrayDim {
                        lower: Some(int("0")),
                        upper: ofc_syntax::ast::DimBound::Expr(var("N")),
                    }],
                    range: Default::default(),
                }),
                ..decl("V")
            }],
        ),
        assign(lhs_var("N"), int("4")),
    ])]);
    assert_eq!(type_of(&result, 0, "V"), "REAL(0:3)");
    let kinds = error_kinds(&result);
    assert_eq!(kinds.len(), 1);
    assert!(matches!(kinds[0], SemanticErrorKind::TypeMismatch(_)));
}

#[test]
fn test_rejected_parameter_value_leaves_a_variable() {
    let result = analyze(vec![program(vec![
        scalar(BaseType::Integer, &["N"]),
        stmt(StmtKind::Parameter(vec![ParameterAssign {
            name: name("N"),
            value: character("A"),
        }])),
        assign(lhs_var("N"), int("2")),
    ])]);
    let kinds = error_kinds(&result);
    assert_eq!(kinds.len(), 1);
    assert!(matches!(kinds[0], SemanticErrorKind::TypeMismatch(_)));
    let n = result.context().decl(local(&result, 0, "N")).unwrap();
    assert!(!n.is_parameter());
    assert!(!n.has_initializer());
}

#[test]
fn test_dimension_then_typed_shape() {
    let result = analyze(vec![program(vec![
        stmt(StmtKind::Dimension(vec![
            DimensionEntity {
                name: name("A"),
                dims: array_spec(&[3]),
            },
            DimensionEntity {
                name: name("B"),
                dims: array_spec(&[3]),
            },
        ])),
        declare(type_spec(BaseType::Real), vec![decl_array("A", array_spec(&[5]))]),
        scalar(BaseType::Real, &["B"]),
    ])]);
    let kinds = error_kinds(&result);
    assert_eq!(kinds.len(), 1);
    assert!(matches!(kinds[0], SemanticErrorKind::InvalidDeclaration(_)));
    assert_eq!(type_of(&result, 0, "A"), "REAL(1:3)");
    assert_eq!(type_of(&result, 0, "B"), "REAL(1:3)");
}

#[test]
fn test_adjustable_bounds_only_for_dummies() {
    let adjustable = |entity: &str| {
        declare(
            type_spec(BaseType::Real),
            vec![decl_array(
                entity,
                ArraySpec {
                    dims: vec![ofc_syntax::ast::ArrayDim {
                        lower: None,
                        upper: ofc_syntax::ast::DimBound::Expr(var("N")),
                    }],
                    range: Default::default(),
                },
            )],
        )
    };
    let result = analyze(vec![subroutine(
        "S",
        &["A", "N"],
        vec![adjustable("A"), adjustable("B")],
    )]);
    assert_eq!(type_of(&result, 0, "A"), "REAL(1:?)");
    let kinds = error_kinds(&result);
    assert_eq!(kinds.len(), 1);
    assert!(matches!(kinds[0], SemanticErrorKind::InvalidDeclaration(_)));
}

#[test]
fn test_star_sizes() {
    let star = |base: BaseType, n: &str| TypeSpec {
        star_len: Some(LenSpec::Expr(int(n))),
        ..type_spec(base)
    };
    let result = analyze(vec![program(vec![
        declare(star(BaseType::Integer, "8"), vec![decl("I8")]),
        declare(star(BaseType::Complex, "16"), vec![decl("Z")]),
        declare(star(BaseType::Character, "10"), vec![decl("S")]),
        declare(
            type_spec(BaseType::Character),
            vec![Decl {
                star_len: Some(LenSpec::Expr(int("3"))),
                ..decl("T")
            }],
        ),
        declare(star(BaseType::Real, "3"), vec![decl("BAD")]),
    ])]);
    assert_eq!(type_of(&result, 0, "I8"), "INTEGER(KIND=8)");
    assert_eq!(type_of(&result, 0, "Z"), "COMPLEX(KIND=8)");
    assert_eq!(type_of(&result, 0, "S"), "CHARACTER(LEN=10)");
    assert_eq!(type_of(&result, 0, "T"), "CHARACTER(LEN=3)");
    assert_eq!(error_kinds(&result).len(), 1);
}

#[test]
fn test_calls_and_alternate_returns() {
    let result = analyze(vec![
        subroutine(
            "S",
            &["N", "*"],
            vec![
                scalar(BaseType::Integer, &["N"]),
                if_stmt(lt(var("N"), int("0")), stmt(StmtKind::Return(Some(int("1"))))),
                stmt(StmtKind::Return(None)),
            ],
        ),
        program(vec![
            call_stmt("S", vec![arg(int("3")), alt_return(10)]),
            labeled(10, StmtKind::Continue),
            call_stmt("S", vec![arg(real("1.0")), alt_return(10)]),
            call_stmt("S", vec![arg(int("3"))]),
            call_stmt("S", vec![arg(int("3")), alt_return(20)]),
            stmt(StmtKind::GoTo(30)),
            stmt(StmtKind::Stop(Some(character("DONE")))),
        ]),
    ]);
    expect![[r#"
        IF (N .LT. 0) RETURN 1
        RETURN"#]]
    .assert_eq(&render_unit(&result, 0));
    expect![[r#"
        CALL S(3, *10)
        10 CONTINUE
        STOP 'DONE'"#]]
    .assert_eq(&render_unit(&result, 1));
    let kinds = error_kinds(&result);
    assert_eq!(kinds.len(), 4, "{kinds:?}");
    assert!(matches!(kinds[0], SemanticErrorKind::ArgumentMismatch(_)));
    assert!(matches!(kinds[1], SemanticErrorKind::ArgumentMismatch(_)));
    assert_eq!(kinds[2], SemanticErrorKind::UndeclaredReference("label 20".into()));
    assert_eq!(kinds[3], SemanticErrorKind::UndeclaredReference("label 30".into()));

    let scope = result.program()[0].scope();
    let args = result.context().scope(scope).unwrap().args().to_vec();
    assert_eq!(args.len(), 2);
    assert_eq!(args[1], DummyArgument::AltReturn);
}

#[test]
fn test_alternate_return_needs_subroutine() {
    let result = analyze(vec![function(None, "F", &["*"], vec![])]);
    assert!(matches!(
        error_kinds(&result)[..],
        [SemanticErrorKind::InvalidDeclaration(_)]
    ));
    let result = analyze(vec![program(vec![stmt(StmtKind::Return(Some(int("1"))))])]);
    assert!(matches!(
        error_kinds(&result)[..],
        [SemanticErrorKind::ArgumentMismatch(_)]
    ));
}

#[test]
fn test_function_defined_later_is_checked() {
    let result = analyze(vec![
        program(vec![
            scalar(BaseType::Real, &["R"]),
            assign(lhs_var("R"), call("TWICE", vec![arg(int("2"))])),
            assign(lhs_var("R"), call("TWICE", vec![arg(real("1.5"))])),
            assign(lhs_var("R"), call("TWICE", vec![named_arg("K", int("2"))])),
            assign(lhs_var("R"), call("TWICE", vec![named_arg("Q", int("2"))])),
        ]),
        function(
            Some(type_spec(BaseType::Integer)),
            "TWICE",
            &["K"],
            vec![assign(lhs_var("TWICE"), mul(int("2"), var("K")))],
        ),
    ]);
    expect![[r#"
        R = REAL(TWICE(2))
        R = REAL(TWICE(K=2))"#]]
    .assert_eq(&render_unit(&result, 0));
    let kinds = error_kinds(&result);
    assert_eq!(kinds.len(), 2);
    assert!(kinds.iter().all(|k| matches!(k, SemanticErrorKind::ArgumentMismatch(_))));
    let twice = result
        .context()
        .lookup_local(result.context().global_scope(), "TWICE")
        .unwrap();
    assert_eq!(
        result.context().decl(twice).unwrap().get_type().to_string(),
        "FUNCTION(INTEGER)"
    );
}

#[test]
fn test_function_type_follows_result_declaration() {
    let result = analyze(vec![function(
        None,
        "F",
        &["X"],
        vec![
            scalar(BaseType::DoublePrecision, &["F"]),
            assign(lhs_var("F"), var("X")),
        ],
    )]);
    assert!(!result.any_semantic_errors(), "{}", result.errors());
    let f = result
        .context()
        .lookup_local(result.context().global_scope(), "F")
        .unwrap();
    assert_eq!(
        result.context().decl(f).unwrap().get_type().to_string(),
        "FUNCTION(REAL(KIND=8))"
    );
}

#[test]
fn test_external_and_intrinsic_statements() {
    let result = analyze(vec![program(vec![
        stmt(StmtKind::External(vec![name("G")])),
        stmt(StmtKind::Intrinsic(vec![name("SQRT"), name("NOSUCH")])),
        assign(lhs_var("Y"), call("G", vec![arg(var("X"))])),
        assign(lhs_var("Y"), call("SQRT", vec![arg(var("X"))])),
        call_stmt("G", vec![]),
    ])]);
    let g = result.context().decl(local(&result, 0, "G")).unwrap();
    assert!(g.is_external() && g.is_function());
    assert_eq!(g.get_type().to_string(), "FUNCTION(REAL)");
    let kinds = error_kinds(&result);
    assert_eq!(kinds.len(), 2, "{kinds:?}");
    assert_eq!(kinds[0], SemanticErrorKind::UndeclaredReference("NOSUCH".into()));
    assert!(matches!(kinds[1], SemanticErrorKind::TypeMismatch(_)));
    expect![[r#"
        Y = G(X)
        Y = SQRT(X)"#]]
    .assert_eq(&render_unit(&result, 0));
}

#[test]
fn test_common_and_equivalence() {
    let blk = CommonGroup {
        group: Some(name("BLK")),
        names: vec![lhs_var("A"), lhs_index("B", vec![int("2")])],
    };
    let result = analyze(vec![
        program(vec![
            stmt(StmtKind::Common(vec![blk.clone()])),
            stmt(StmtKind::Equivalence(vec![vec![lhs_var("X"), lhs_index("B", vec![int("1")])]])),
        ]),
        subroutine(
            "S",
            &[],
            vec![stmt(StmtKind::Common(vec![
                CommonGroup {
                    group: None,
                    names: vec![lhs_var("P")],
                },
                blk,
            ]))],
        ),
    ]);
    assert!(!result.any_semantic_errors(), "{}", result.errors());
    assert_eq!(type_of(&result, 0, "B"), "REAL(1:2)");
    let block = result.context().common_block("BLK").unwrap();
    assert_eq!(block.layouts().len(), 2);
    assert!(result.context().common_block("").is_some());
    let x = result.context().decl(local(&result, 0, "X")).unwrap();
    let b = result.context().decl(local(&result, 0, "B")).unwrap();
    assert!(x.equivalence_group().is_some());
    assert_eq!(x.equivalence_group(), b.equivalence_group());
}

#[test]
fn test_structures() {
    let point = StructureDef {
        name: name("POINT"),
        members: vec![DeclStmt {
            ty: type_spec(BaseType::Real),
            decls: vec![decl("X"), decl("Y")],
        }],
        range: Default::default(),
    };
    let result = analyze(vec![program(vec![
        stmt(StmtKind::Structure(point)),
        scalar(BaseType::Type(name("POINT")), &["P"]),
        scalar(BaseType::Type(name("LINE")), &["L"]),
        assign(lhs_member(lhs_var("P"), "X"), int("1")),
    ])]);
    assert_eq!(type_of(&result, 0, "P"), "TYPE(POINT)");
    assert_eq!(
        error_kinds(&result),
        [SemanticErrorKind::UndeclaredReference("LINE".into())]
    );
    expect![[r#"P%X = REAL(1)"#]].assert_eq(&render_unit(&result, 0));
    let p = local(&result, 0, "P");
    assert_eq!(result.context().decl_size(p).unwrap(), 8);
}

#[test]
fn test_save_statement() {
    let result = analyze(vec![
        program(vec![stmt(StmtKind::Save(vec![]))]),
        subroutine("S", &[], vec![stmt(StmtKind::Save(vec![name("K")]))]),
    ]);
    assert!(!result.any_semantic_errors(), "{}", result.errors());
    let main = result.program()[0].scope();
    assert!(result.context().scope(main).unwrap().save_all());
    let k = result.context().decl(local(&result, 1, "K")).unwrap();
    assert!(k.is_static());
}

#[test]
fn test_duplicate_labels_and_logical_if() {
    let result = analyze(vec![program(vec![
        labeled(10, StmtKind::Continue),
        labeled(10, StmtKind::Continue),
        if_stmt(logical(true), stmt(StmtKind::GoTo(10))),
        if_stmt(int("1"), stmt(StmtKind::Continue)),
    ])]);
    let kinds = error_kinds(&result);
    assert_eq!(kinds.len(), 2);
    assert_eq!(kinds[0], SemanticErrorKind::DuplicateName("10".into()));
    assert!(matches!(kinds[1], SemanticErrorKind::TypeMismatch(_)));
    assert_eq!(result.program()[0].stmts().len(), 3);
}

#[test]
fn test_units_and_scopes() {
    let result = analyze(vec![
        program(vec![]),
        unit(UnitKind::BlockData, None, vec![]),
        subroutine("S", &["A"], vec![]),
    ]);
    let kinds: Vec<ScopeKind> = result.program().iter().map(|u| u.kind()).collect();
    assert_eq!(kinds, [ScopeKind::Program, ScopeKind::BlockData, ScopeKind::Subroutine]);
    assert_eq!(result.program()[0].name(), Some("MAIN"));
    let a = result.context().decl(local(&result, 2, "A")).unwrap();
    assert!(a.is_dummy());
}

#[test]
fn test_case_sensitive_option() {
    let options = LangOptions::new().case_sensitive(true);
    let result = analyze_with(
        vec![program(vec![
            scalar(BaseType::Integer, &["x"]),
            assign(lhs_var("X"), int("1")),
        ])],
        options,
    );
    assert_eq!(type_of(&result, 0, "x"), "INTEGER");
    assert_eq!(type_of(&result, 0, "X"), "REAL");
}
