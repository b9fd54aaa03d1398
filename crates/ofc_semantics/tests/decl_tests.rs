// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

use ofc_semantics::context::{Context, LangOptions};
use ofc_semantics::decl::{DeclFlags, DeclId, Initializer, Spec};
use ofc_semantics::expr_resolver::resolve_spec_expr;
use ofc_semantics::scope::{ScopeId, ScopeKind};
use ofc_semantics::semantic_error::SemanticErrorKind;
use ofc_semantics::types::{ArrayDim, ArrayShape, Bound, CharLen, TypeKind};
use ofc_semantics::TextRange;
use ofc_syntax::ast::make::*;

fn no_range() -> TextRange {
    TextRange::default()
}

fn setup() -> (Context, ScopeId) {
    let mut context = Context::new(LangOptions::new()).unwrap();
    let scope = context.create_scope(ScopeKind::Program, None, None).unwrap();
    (context, scope)
}

fn int_array(context: &mut Context, scope: ScopeId, name: &str, extent: i64) -> DeclId {
    let spec = Spec::new(TypeKind::Integer).with_array(ArrayShape::from_extents(&[extent]).unwrap());
    context.declare_spec(scope, name, &spec, no_range()).unwrap()
}

fn initial_values(context: &Context, decl: DeclId, count: u64) -> Vec<Option<i128>> {
    let decl = context.decl(decl).unwrap();
    (0..count)
        .map(|offset| decl.init_at(offset).and_then(|v| v.as_integer()))
        .collect()
}

#[test]
fn test_array_elements_initialized_separately() {
    let (mut context, scope) = setup();
    let a = int_array(&mut context, scope, "A", 3);
    let five = resolve_spec_expr(&mut context, scope, &int("5")).unwrap();
    let seven = resolve_spec_expr(&mut context, scope, &int("7")).unwrap();
    context.decl_init_offset(a, 1, &five).unwrap();
    context.decl_init_offset(a, 2, &seven).unwrap();
    assert_eq!(initial_values(&context, a, 4), [None, Some(5), Some(7), None]);
    assert_eq!(context.decl_elem_count(a).unwrap(), 3);
    assert_eq!(context.decl_size(a).unwrap(), 12);
    let err = context.decl_init_offset(a, 3, &five).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::SubscriptError(_)));
}

#[test]
fn test_reinitialization() {
    let (mut context, scope) = setup();
    let a = int_array(&mut context, scope, "A", 2);
    let one = resolve_spec_expr(&mut context, scope, &int("1")).unwrap();
    let two = resolve_spec_expr(&mut context, scope, &int("2")).unwrap();
    context.decl_init_offset(a, 0, &one).unwrap();
    context.decl_init_offset(a, 0, &one).unwrap();
    let err = context.decl_init_offset(a, 0, &two).unwrap_err();
    assert_eq!(err.kind(), &SemanticErrorKind::AlreadyInitialized("A".into()));
    // A failed full initialization leaves the array as it was.
    assert!(context.decl_init_array(a, &[two.clone(), two]).is_err());
    assert_eq!(initial_values(&context, a, 2), [Some(1), None]);
}

#[test]
fn test_scalar_initializer_broadcasts() {
    let (mut context, scope) = setup();
    let a = int_array(&mut context, scope, "A", 3);
    let zero = resolve_spec_expr(&mut context, scope, &int("0")).unwrap();
    context.decl_init(a, &zero).unwrap();
    assert_eq!(initial_values(&context, a, 3), [Some(0), Some(0), Some(0)]);
    match context.decl(a).unwrap().initializer() {
        Some(Initializer::Array(values)) => assert_eq!(values.len(), 3),
        other => panic!("unexpected initializer {other:?}"),
    }
}

#[test]
fn test_broadcast_too_large_to_store() {
    let (mut context, scope) = setup();
    let a = int_array(&mut context, scope, "A", 1 << 60);
    let zero = resolve_spec_expr(&mut context, scope, &int("0")).unwrap();
    let err = context.decl_init(a, &zero).unwrap_err();
    assert_eq!(err.kind(), &SemanticErrorKind::AllocationFailure);
    assert!(!context.decl(a).unwrap().has_initializer());
}

#[test]
fn test_initializer_is_converted() {
    let (mut context, scope) = setup();
    let x = context
        .declare_spec(scope, "X", &Spec::new(TypeKind::Real).with_kind(8), no_range())
        .unwrap();
    let three = resolve_spec_expr(&mut context, scope, &int("3")).unwrap();
    context.decl_init(x, &three).unwrap();
    let value = context.decl(x).unwrap().constant_value().cloned();
    let value = value.unwrap();
    assert_eq!(value.as_real(), Some(3.0));
    assert_eq!(value.get_type().to_string(), "REAL(KIND=8)");
}

#[test]
fn test_initializer_type_mismatch() {
    let (mut context, scope) = setup();
    let i = context
        .declare_spec(scope, "I", &Spec::new(TypeKind::Integer), no_range())
        .unwrap();
    let text = resolve_spec_expr(&mut context, scope, &character("ABC")).unwrap();
    let err = context.decl_init(i, &text).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::TypeMismatch(_)));
    assert!(!context.decl(i).unwrap().has_initializer());
    let variable = resolve_spec_expr(&mut context, scope, &var("Y")).unwrap();
    let err = context.decl_init(i, &variable).unwrap_err();
    assert_eq!(err.kind(), &SemanticErrorKind::NotConstant);
}

#[test]
fn test_character_initializer_is_padded() {
    let (mut context, scope) = setup();
    let spec = Spec::new(TypeKind::Character).with_len(CharLen::Known(5));
    let s = context.declare_spec(scope, "S", &spec, no_range()).unwrap();
    let text = resolve_spec_expr(&mut context, scope, &character("AB")).unwrap();
    context.decl_init(s, &text).unwrap();
    let value = context.decl(s).unwrap().constant_value().unwrap();
    assert_eq!(value.as_str(), Some("AB   "));
}

#[test]
fn test_procedures_cannot_be_initialized() {
    let (mut context, scope) = setup();
    let f = context.declare_function(scope, "F", None, no_range()).unwrap();
    let one = resolve_spec_expr(&mut context, scope, &int("1")).unwrap();
    let err = context.decl_init(f, &one).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::InvalidDeclaration(_)));
}

#[test]
fn test_spec_types() {
    let (mut context, _) = setup();
    let cases = [
        (Spec::new(TypeKind::Integer).with_kind(8), "INTEGER(KIND=8)"),
        (Spec::new(TypeKind::Complex).with_kind(8), "COMPLEX(KIND=8)"),
        (Spec::new(TypeKind::Byte), "BYTE"),
        (Spec::new(TypeKind::Character), "CHARACTER(LEN=1)"),
        (
            Spec::new(TypeKind::Character).with_len(CharLen::Assumed),
            "CHARACTER(LEN=*)",
        ),
        (Spec::new(TypeKind::Logical).with_kind(1), "LOGICAL(KIND=1)"),
    ];
    for (spec, expected) in cases {
        let ty = context.type_from_spec(&spec).unwrap();
        assert_eq!(ty.to_string(), expected);
    }
    let bad = [
        Spec::new(TypeKind::Integer).with_kind(3),
        Spec::new(TypeKind::Real).with_kind(2),
        Spec::new(TypeKind::Integer).with_len(CharLen::Known(2)),
        Spec::new(TypeKind::Subroutine).with_array(ArrayShape::from_extents(&[2]).unwrap()),
    ];
    for spec in bad {
        let err = context.type_from_spec(&spec).unwrap_err();
        assert!(
            matches!(err.kind(), SemanticErrorKind::InvalidDeclaration(_)),
            "{spec:?}"
        );
    }
}

#[test]
fn test_non_constant_bounds() {
    let (mut context, scope) = setup();
    let shape = ArrayShape::new(vec![ArrayDim {
        lower: Bound::Const(1),
        upper: Bound::Adjustable,
    }])
    .unwrap();
    let spec = Spec::new(TypeKind::Real).with_array(shape);
    let a = context.declare_spec(scope, "A", &spec, no_range()).unwrap();
    let err = context.decl_elem_count(a).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::InvalidType(_)));
}

#[test]
fn test_flags() {
    let (mut context, scope) = setup();
    let x = context.declare_implicit(scope, "X", no_range()).unwrap();
    context.decl_add_flags(x, DeclFlags::VOLATILE | DeclFlags::TARGET, no_range()).unwrap();
    let decl = context.decl(x).unwrap();
    assert!(decl.is_volatile() && decl.is_target() && decl.is_implicit());
    let err = context
        .decl_add_flags(x, DeclFlags::PARAMETER, no_range())
        .unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::InvalidDeclaration(_)));
    assert!(!context.decl(x).unwrap().is_parameter());
}
