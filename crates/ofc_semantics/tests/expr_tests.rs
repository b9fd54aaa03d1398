// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

use expect_test::expect;
use ofc_semantics::asg::{Expr, TExpr};
use ofc_semantics::context::{Context, LangOptions};
use ofc_semantics::decl::Spec;
use ofc_semantics::expr_resolver::{resolve_constant, resolve_expr, resolve_lvalue, resolve_spec_expr};
use ofc_semantics::scope::{ScopeId, ScopeKind};
use ofc_semantics::semantic_error::SemanticErrorKind;
use ofc_semantics::types::{ArrayShape, CaseSensitive, CharLen, StructureMember, StructureRef, TypeKind};
use ofc_semantics::TextRange;
use ofc_syntax::ast;
use ofc_syntax::ast::make::*;

fn setup() -> (Context, ScopeId) {
    let mut context = Context::new(LangOptions::new()).unwrap();
    let scope = context.create_scope(ScopeKind::Program, Some("MAIN"), None).unwrap();
    (context, scope)
}

fn declare(context: &mut Context, scope: ScopeId, name: &str, spec: Spec) {
    context
        .declare_spec(scope, name, &spec, TextRange::default())
        .unwrap();
}

fn printed(context: &mut Context, scope: ScopeId, expr: &ast::Expr) -> String {
    let texpr = resolve_expr(context, scope, expr).unwrap();
    format!("{} :: {}", texpr.display(context), texpr.get_type())
}

fn error_kind(result: Result<impl std::fmt::Debug, ofc_semantics::semantic_error::SemanticError>) -> SemanticErrorKind {
    result.unwrap_err().kind().clone()
}

//
// Constant folding
//

#[test]
fn test_fold_precedence() {
    let (mut context, scope) = setup();
    let expr = add(int("2"), mul(int("3"), int("4")));
    let value = resolve_constant(&mut context, scope, &expr).unwrap();
    assert_eq!(value.as_integer(), Some(14));
    assert!(value.get_type().is_integer());
}

#[test]
fn test_integer_division_truncates() {
    let (mut context, scope) = setup();
    let seven_halves = resolve_constant(&mut context, scope, &div(int("7"), int("2"))).unwrap();
    assert_eq!(seven_halves.as_integer(), Some(3));
    let negative = resolve_constant(&mut context, scope, &div(neg(int("7")), int("2"))).unwrap();
    assert_eq!(negative.as_integer(), Some(-3));
}

#[test]
fn test_fold_with_variable_is_not_constant() {
    let (mut context, scope) = setup();
    let expr = add(int("1"), var("X"));
    let err = resolve_constant(&mut context, scope, &expr).unwrap_err();
    assert_eq!(err.kind(), &SemanticErrorKind::NotConstant);
    // X was declared implicitly on the way.
    assert!(context.lookup_local(scope, "X").is_some());
}

#[test]
fn test_fold_errors() {
    let (mut context, scope) = setup();
    let by_zero = div(int("1"), int("0"));
    assert_eq!(
        error_kind(resolve_constant(&mut context, scope, &by_zero)),
        SemanticErrorKind::DivideByZero
    );
    let big = mul(int("2147483647"), int("2"));
    assert_eq!(
        error_kind(resolve_constant(&mut context, scope, &big)),
        SemanticErrorKind::Overflow
    );
    // In an executable statement the same failure is only a warning.
    let texpr = resolve_expr(&mut context, scope, &by_zero).unwrap();
    assert!(!texpr.is_constant());
    assert_eq!(context.diagnostics().warnings().count(), 1);
    assert_eq!(texpr.resolve().unwrap_err().kind(), &SemanticErrorKind::DivideByZero);
}

#[test]
fn test_logical_folding() {
    let (mut context, scope) = setup();
    let expr = or(lt(int("1"), int("2")), and(logical(false), logical(true)));
    let value = resolve_constant(&mut context, scope, &expr).unwrap();
    assert_eq!(value.as_logical(), Some(true));
    let value = resolve_constant(&mut context, scope, &not(eq(int("3"), real("3.0")))).unwrap();
    assert_eq!(value.as_logical(), Some(false));
}

#[test]
fn test_power_and_real_folding() {
    let (mut context, scope) = setup();
    let value = resolve_constant(&mut context, scope, &pow(int("2"), pow(int("3"), int("2")))).unwrap();
    assert_eq!(value.as_integer(), Some(512));
    let value = resolve_constant(&mut context, scope, &mul(real("1.5"), int("2"))).unwrap();
    assert_eq!(value.as_real(), Some(3.0));
    let value = resolve_constant(&mut context, scope, &real("0.1D0")).unwrap();
    assert_eq!(value.get_type().to_string(), "REAL(KIND=8)");
    assert_eq!(value.as_real(), Some(0.1));
    let single = resolve_constant(&mut context, scope, &real("0.1")).unwrap();
    assert_eq!(single.as_real(), Some(f64::from(0.1f32)));
}

#[test]
fn test_character_folding() {
    let (mut context, scope) = setup();
    let value = resolve_constant(&mut context, scope, &concat(character("AB"), character("CDE"))).unwrap();
    assert_eq!(value.as_str(), Some("ABCDE"));
    assert_eq!(value.get_type().to_string(), "CHARACTER(LEN=5)");
}

#[test]
fn test_constant_equality() {
    let (mut context, scope) = setup();
    let a = resolve_spec_expr(&mut context, scope, &add(int("1"), int("2"))).unwrap();
    let b = resolve_spec_expr(&mut context, scope, &int("3")).unwrap();
    assert_eq!(a, b);
    let x1 = resolve_spec_expr(&mut context, scope, &add(var("X"), int("1"))).unwrap();
    let x2 = resolve_spec_expr(&mut context, scope, &add(var("X"), int("1"))).unwrap();
    let x3 = resolve_spec_expr(&mut context, scope, &add(var("X"), int("2"))).unwrap();
    assert_eq!(x1, x2);
    assert_ne!(x1, x3);
}

//
// Types of expressions
//

#[test]
fn test_mixed_arithmetic_casts() {
    let (mut context, scope) = setup();
    declare(&mut context, scope, "D", Spec::new(TypeKind::Real).with_kind(8));
    let lines = [
        printed(&mut context, scope, &add(var("X"), mul(int("2"), var("I")))),
        printed(&mut context, scope, &add(var("D"), var("I"))),
        printed(&mut context, scope, &lt(var("I"), var("X"))),
        printed(&mut context, scope, &mul(var("X"), complex(real("1.0"), real("2.0")))),
        printed(&mut context, scope, &pow(var("X"), int("2"))),
    ]
    .join("\n");
    expect![[r#"
        X + REAL(2 * I) :: REAL
        D + DBLE(I) :: REAL(KIND=8)
        REAL(I) .LT. X :: LOGICAL
        CMPLX(X) * (1.0, 2.0) :: COMPLEX
        X**2 :: REAL"#]]
    .assert_eq(&lines);
}

#[test]
fn test_printing_keeps_brackets() {
    let (mut context, scope) = setup();
    declare(&mut context, scope, "L", Spec::new(TypeKind::Logical));
    let lines = [
        printed(&mut context, scope, &mul(paren(add(var("A"), var("B"))), var("C"))),
        printed(&mut context, scope, &sub(var("A"), sub(var("B"), var("C")))),
        printed(&mut context, scope, &neg(neg(var("A")))),
        printed(&mut context, scope, &not(and(logical(true), var("L")))),
    ]
    .join("\n");
    expect![[r#"
        (A + B) * C :: REAL
        A - (B - C) :: REAL
        -(-A) :: REAL
        .NOT. (.TRUE. .AND. L) :: LOGICAL"#]]
    .assert_eq(&lines);
}

#[test]
fn test_logical_operands_must_be_logical() {
    let (mut context, scope) = setup();
    let err = resolve_expr(&mut context, scope, &and(character("A"), logical(true))).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::TypeMismatch(_)));
    let err = resolve_expr(&mut context, scope, &add(character("A"), int("1"))).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::TypeMismatch(_)));
}

#[test]
fn test_concatenation_length() {
    let (mut context, scope) = setup();
    let chars = |n| Spec::new(TypeKind::Character).with_len(CharLen::Known(n));
    declare(&mut context, scope, "S", chars(3));
    declare(&mut context, scope, "T", chars(4));
    declare(&mut context, scope, "U", Spec::new(TypeKind::Character).with_len(CharLen::Assumed));
    let st = resolve_expr(&mut context, scope, &concat(var("S"), var("T"))).unwrap();
    assert_eq!(st.get_type().char_len(), Some(CharLen::Known(7)));
    let su = resolve_expr(&mut context, scope, &concat(var("S"), var("U"))).unwrap();
    assert_eq!(su.get_type().char_len(), Some(CharLen::Unknown));
    let err = resolve_expr(&mut context, scope, &concat(var("S"), int("1"))).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::TypeMismatch(_)));
}

#[test]
fn test_parameter_reference_folds() {
    let (mut context, scope) = setup();
    let n = context
        .declare_spec(scope, "N", &Spec::new(TypeKind::Integer), TextRange::default())
        .unwrap();
    let ten = resolve_spec_expr(&mut context, scope, &int("10")).unwrap();
    context
        .decl_add_flags(n, ofc_semantics::decl::DeclFlags::PARAMETER, TextRange::default())
        .unwrap();
    context.decl_init(n, &ten).unwrap();
    let value = resolve_constant(&mut context, scope, &mul(var("N"), int("2"))).unwrap();
    assert_eq!(value.as_integer(), Some(20));
    let err = resolve_lvalue(&mut context, scope, &lhs_var("N")).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::TypeMismatch(_)));
}

//
// Array elements and structure members
//

#[test]
fn test_subscripts() {
    let (mut context, scope) = setup();
    let shape = ArrayShape::from_extents(&[3]).unwrap();
    declare(&mut context, scope, "A", Spec::new(TypeKind::Integer).with_array(shape));
    let element = resolve_expr(&mut context, scope, &index("A", vec![var("I")])).unwrap();
    assert_eq!(element.get_type().to_string(), "INTEGER");
    assert_eq!(element.display(&context).to_string(), "A(I)");
    let whole = resolve_expr(&mut context, scope, &var("A")).unwrap();
    assert_eq!(whole.get_type().to_string(), "INTEGER(1:3)");

    let out_of_bounds = index("A", vec![int("4")]);
    let rank = index("A", vec![int("1"), int("1")]);
    assert!(matches!(
        error_kind(resolve_expr(&mut context, scope, &out_of_bounds)),
        SemanticErrorKind::SubscriptError(_)
    ));
    assert!(matches!(
        error_kind(resolve_expr(&mut context, scope, &rank)),
        SemanticErrorKind::SubscriptError(_)
    ));
    assert!(matches!(
        error_kind(resolve_expr(&mut context, scope, &index("A", vec![real("1.0")]))),
        SemanticErrorKind::TypeMismatch(_)
    ));
}

#[test]
fn test_structure_members() {
    let (mut context, scope) = setup();
    let members = vec![
        StructureMember {
            name: "X".into(),
            ty: context.types.real(),
        },
        StructureMember {
            name: "TAG".into(),
            ty: context.types.integer(),
        },
    ];
    let def = StructureRef::new("POINT", members, CaseSensitive::False).unwrap();
    declare(&mut context, scope, "P", Spec::structure(def));
    let member = resolve_lvalue(&mut context, scope, &lhs_member(lhs_var("P"), "tag")).unwrap();
    assert!(member.get_type().is_integer());
    assert_eq!(member.display(&context).to_string(), "P%TAG");
    let err = resolve_lvalue(&mut context, scope, &lhs_member(lhs_var("P"), "Z")).unwrap_err();
    assert_eq!(err.kind(), &SemanticErrorKind::UndeclaredReference("P%Z".into()));
    let err = resolve_lvalue(&mut context, scope, &lhs_member(lhs_var("Q"), "X")).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::TypeMismatch(_)));
}

//
// Calls
//

#[test]
fn test_intrinsic_calls() {
    let (mut context, scope) = setup();
    let abs = resolve_constant(&mut context, scope, &call("ABS", vec![arg(neg(int("3")))])).unwrap();
    assert_eq!(abs.as_integer(), Some(3));
    let max = resolve_constant(&mut context, scope, &call("max", vec![arg(int("1")), arg(real("2.5"))])).unwrap();
    assert_eq!(max.as_real(), Some(2.5));
    let len = resolve_constant(&mut context, scope, &call("LEN", vec![arg(character("ABC"))])).unwrap();
    assert_eq!(len.as_integer(), Some(3));
    let modulo = call("MOD", vec![arg(int("7")), arg(int("0"))]);
    assert_eq!(
        error_kind(resolve_constant(&mut context, scope, &modulo)),
        SemanticErrorKind::DivideByZero
    );
    let sqrt = call("SQRT", vec![arg(int("4"))]);
    assert!(matches!(
        error_kind(resolve_expr(&mut context, scope, &sqrt)),
        SemanticErrorKind::ArgumentMismatch(_)
    ));
    let sin = resolve_expr(&mut context, scope, &call("SIN", vec![arg(var("X"))])).unwrap();
    assert!(matches!(sin.expression(), Expr::Intrinsic(_)));
    assert_eq!(sin.display(&context).to_string(), "SIN(X)");
}

#[test]
fn test_local_declaration_shadows_intrinsic() {
    let (mut context, scope) = setup();
    let shape = ArrayShape::from_extents(&[3]).unwrap();
    declare(&mut context, scope, "ABS", Spec::new(TypeKind::Integer).with_array(shape));
    let element = resolve_expr(&mut context, scope, &call("ABS", vec![arg(int("2"))])).unwrap();
    assert!(element.lvalue().is_some());
}

#[test]
fn test_unknown_function_is_declared_external() {
    let (mut context, scope) = setup();
    let texpr = resolve_expr(&mut context, scope, &call("KOUNT", vec![arg(var("X"))])).unwrap();
    assert!(matches!(texpr.expression(), Expr::Function(_)));
    assert!(texpr.get_type().is_integer());
    let decl = context.lookup_local(scope, "KOUNT").unwrap();
    assert!(context.decl(decl).unwrap().is_function());
    assert!(context.decl(decl).unwrap().is_external());
}

#[test]
fn test_alternate_return_only_in_call() {
    let (mut context, scope) = setup();
    let expr = call("F", vec![alt_return(10)]);
    assert!(matches!(
        error_kind(resolve_expr(&mut context, scope, &expr)),
        SemanticErrorKind::ArgumentMismatch(_)
    ));
}

#[test]
fn test_cached_constant_matches_resolve() {
    let (mut context, scope) = setup();
    let texpr: TExpr = resolve_expr(&mut context, scope, &paren(add(int("1"), int("1")))).unwrap();
    assert!(texpr.is_bracketed());
    assert_eq!(texpr.constant_value().and_then(|v| v.as_integer()), Some(2));
    assert_eq!(texpr.display(&context).to_string(), "(1 + 1)");
}
