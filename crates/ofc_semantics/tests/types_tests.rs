// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use expect_test::expect;
use ofc_semantics::semantic_error::SemanticErrorKind;
use ofc_semantics::types::{
    cast_is_lossless, ArrayDim, ArrayShape, Bound, CaseSensitive, CharLen, StructureMember,
    StructureRef, TypeInterner, TypeKind, TypeRef,
};

fn hash_of(ty: &TypeRef) -> u64 {
    let mut hasher = DefaultHasher::new();
    ty.hash(&mut hasher);
    hasher.finish()
}

fn sample_types(types: &mut TypeInterner) -> Vec<TypeRef> {
    let int = types.integer();
    let real8 = types.double();
    let vector = types.array(&int, ArrayShape::from_extents(&[3]).unwrap()).unwrap();
    let matrix = types
        .array(&real8, ArrayShape::from_extents(&[2, 2]).unwrap())
        .unwrap();
    let ptr = types.pointer(&vector);
    let ptr_ptr = types.pointer(&ptr);
    vec![
        int.clone(),
        types.primitive(TypeKind::Integer, 8).unwrap(),
        real8,
        types.complex(),
        types.logical(),
        types.character(1, CharLen::Known(10)),
        vector,
        matrix,
        ptr,
        ptr_ptr,
        types.function(&int).unwrap(),
        types.subroutine(),
    ]
}

#[test]
fn test_type_equality_is_an_equivalence() {
    let mut types = TypeInterner::new();
    let first = sample_types(&mut types);
    // A second, independent pool builds structurally equal types.
    let mut other = TypeInterner::new();
    let second = sample_types(&mut other);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(hash_of(a), hash_of(b));
    }
    for (i, a) in first.iter().enumerate() {
        for (j, b) in first.iter().enumerate() {
            assert_eq!(i == j, a == b, "{a} vs {b}");
        }
    }
}

#[test]
fn test_interning_shares_instances() {
    let mut types = TypeInterner::new();
    let a = types.primitive(TypeKind::Real, 8).unwrap();
    let b = types.double();
    assert!(std::rc::Rc::ptr_eq(&a, &b));
}

#[test]
fn test_promote_is_commutative() {
    let mut types = TypeInterner::new();
    let mut numeric = Vec::new();
    for (kind, widths) in [
        (TypeKind::Logical, &[1, 2, 4, 8][..]),
        (TypeKind::Byte, &[1][..]),
        (TypeKind::Integer, &[1, 2, 4, 8, 16][..]),
        (TypeKind::Real, &[4, 8, 10, 16][..]),
        (TypeKind::Complex, &[4, 8, 10, 16][..]),
    ] {
        for width in widths {
            numeric.push(types.primitive(kind, *width).unwrap());
        }
    }
    for a in &numeric {
        for b in &numeric {
            let ab = types.promote(a, b).unwrap();
            let ba = types.promote(b, a).unwrap();
            assert_eq!(ab, ba, "promote({a}, {b})");
        }
    }
}

#[test]
fn test_promote_ranks() {
    let mut types = TypeInterner::new();
    let int = types.integer();
    let real = types.real();
    let double = types.double();
    let complex = types.complex();
    assert_eq!(types.promote(&int, &real).unwrap(), real);
    assert_eq!(types.promote(&real, &double).unwrap(), double);
    let dcomplex = types.promote(&double, &complex).unwrap();
    assert_eq!(dcomplex.to_string(), "COMPLEX(KIND=8)");
}

#[test]
fn test_promote_character_with_integer_fails() {
    let mut types = TypeInterner::new();
    let chars = types.character(1, CharLen::Known(4));
    let int = types.integer();
    let err = types.promote(&chars, &int).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::TypeMismatch(_)));
    let sub = types.subroutine();
    assert!(types.promote(&sub, &sub).is_ok());
    assert!(types.promote(&sub, &int).is_err());
}

#[test]
fn test_promote_arrays() {
    let mut types = TypeInterner::new();
    let int = types.integer();
    let real = types.real();
    let v3 = types.array(&int, ArrayShape::from_extents(&[3]).unwrap()).unwrap();
    let v4 = types.array(&real, ArrayShape::from_extents(&[4]).unwrap()).unwrap();
    let promoted = types.promote(&v3, &real).unwrap();
    assert_eq!(promoted.to_string(), "REAL(1:3)");
    assert!(types.promote(&v3, &v4).is_err());
}

#[test]
fn test_cast_is_lossless() {
    let mut types = TypeInterner::new();
    let int4 = types.integer();
    let int8 = types.primitive(TypeKind::Integer, 8).unwrap();
    let real4 = types.real();
    let real8 = types.double();
    assert!(cast_is_lossless(&int4, &real8));
    assert!(!cast_is_lossless(&real8, &int4));
    assert!(!cast_is_lossless(&int4, &real4));
    assert!(!cast_is_lossless(&int8, &real8));
    assert!(cast_is_lossless(&int4, &int8));
    let chars = types.character(1, CharLen::Known(4));
    assert!(!cast_is_lossless(&int4, &chars));
}

#[test]
fn test_size_and_elem_count() {
    let mut types = TypeInterner::new();
    let int = types.integer();
    let shape = ArrayShape::new(vec![ArrayDim::new(0, 9), ArrayDim::new(1, 2)]).unwrap();
    let array = types.array(&int, shape).unwrap();
    assert_eq!(array.elem_count().unwrap(), 20);
    assert_eq!(array.size(8).unwrap(), 80);
    assert_eq!(types.complex().size(8).unwrap(), 8);
    assert_eq!(types.character(1, CharLen::Known(7)).size(8).unwrap(), 7);
    let ptr = types.pointer(&int);
    assert_eq!(ptr.size(4).unwrap(), 4);

    let sub = types.subroutine();
    let err = sub.size(8).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::InvalidType(_)));
    let adjustable = ArrayShape::new(vec![ArrayDim {
        lower: Bound::Const(1),
        upper: Bound::Adjustable,
    }])
    .unwrap();
    let dummy = types.array(&int, adjustable).unwrap();
    assert!(matches!(
        dummy.elem_count().unwrap_err().kind(),
        SemanticErrorKind::InvalidType(_)
    ));
}

#[test]
fn test_array_shape_rules() {
    assert!(ArrayShape::new(vec![]).is_err());
    assert!(ArrayShape::new(vec![ArrayDim::new(5, 4)]).is_err());
    let assumed_first = vec![
        ArrayDim {
            lower: Bound::Const(1),
            upper: Bound::Assumed,
        },
        ArrayDim::new(1, 2),
    ];
    assert!(ArrayShape::new(assumed_first).is_err());
    let shape = ArrayShape::new(vec![ArrayDim::new(1, 3), ArrayDim::new(0, 1)]).unwrap();
    assert_eq!(shape.linear_offset(&[1, 0]), Some(0));
    assert_eq!(shape.linear_offset(&[3, 0]), Some(2));
    assert_eq!(shape.linear_offset(&[1, 1]), Some(3));
    assert_eq!(shape.linear_offset(&[4, 1]), None);
    assert_eq!(shape.linear_offset(&[1]), None);
}

#[test]
fn test_array_of_procedure_is_invalid() {
    let mut types = TypeInterner::new();
    let sub = types.subroutine();
    let err = types
        .array(&sub, ArrayShape::from_extents(&[2]).unwrap())
        .unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::InvalidDeclaration(_)));
    assert!(types.primitive(TypeKind::Integer, 3).is_err());
    assert!(types.primitive(TypeKind::Character, 1).is_err());
}

#[test]
fn test_structure_identity() {
    let mut types = TypeInterner::new();
    let members = |types: &mut TypeInterner| {
        vec![StructureMember {
            name: "X".into(),
            ty: types.real(),
        }]
    };
    let m1 = members(&mut types);
    let m2 = members(&mut types);
    let a = StructureRef::new("POINT", m1, CaseSensitive::False).unwrap();
    let b = StructureRef::new("POINT", m2, CaseSensitive::False).unwrap();
    let ta = types.structure(&a);
    let ta2 = types.structure(&a.clone());
    let tb = types.structure(&b);
    assert_eq!(ta, ta2);
    assert_ne!(ta, tb);
}

#[test]
fn test_predicates() {
    let mut types = TypeInterner::new();
    let int = types.integer();
    let array = types.array(&int, ArrayShape::from_extents(&[2]).unwrap()).unwrap();
    let func = types.function(&int).unwrap();
    assert!(int.is_integer() && int.is_scalar() && !int.is_composite());
    assert!(array.is_array() && array.is_composite() && array.is_integer());
    assert!(func.is_function() && func.is_procedure() && !func.is_subroutine());
    assert!(types.logical().is_logical());
    assert!(types.character(1, CharLen::Assumed).is_character());
}

#[test]
fn test_type_strings() {
    let mut types = TypeInterner::new();
    let int = types.integer();
    let real8 = types.double();
    let shape = ArrayShape::new(vec![ArrayDim::new(1, 3), ArrayDim::new(0, 9)]).unwrap();
    let matrix = types.array(&real8, shape).unwrap();
    let text = [
        int.to_string(),
        matrix.to_string(),
        types.character(1, CharLen::Known(10)).to_string(),
        types.character(1, CharLen::Assumed).to_string(),
        types.pointer(&int).to_string(),
        types.function(&real8).unwrap().to_string(),
        types.subroutine().to_string(),
    ]
    .join("\n");
    expect![[r#"
        INTEGER
        REAL(KIND=8)(1:3,0:9)
        CHARACTER(LEN=10)
        CHARACTER(LEN=*)
        POINTER(INTEGER)
        FUNCTION(REAL(KIND=8))
        SUBROUTINE"#]]
    .assert_eq(&text);
}
