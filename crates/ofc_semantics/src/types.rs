// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// Data structures for the types that annotate declarations and typed expressions.
// All code that reasons about types alone lives here, in particular promotion and
// the cast-losslessness rules. Building cast nodes involves the typed tree and is
// done by the expression resolver.
//
// Types are immutable and shared through `TypeRef`. Equality and hashing are
// structural, except that STRUCTURE types compare by identity of their definition.
// The `TypeInterner` hands out one shared instance per distinct type, but nothing
// depends on that: two structurally equal types always compare equal.

use boolenum::BoolEnum;
use hashbrown::HashSet;
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::semantic_error::{invalid_declaration, type_mismatch, SemaResult, SemanticErrorKind};

/// Storage-width selector of a numeric, logical or character type.
pub type Kind = u32;

pub type TypeRef = Rc<Type>;

#[derive(BoolEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaseSensitive {
    True,
    False,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    Logical,
    Integer,
    Real,
    Complex,
    Byte,
    Character,
    Structure,
    Pointer,
    Function,
    Subroutine,
}

impl TypeKind {
    // LOGICAL < BYTE < INTEGER < REAL < COMPLEX. Other kinds never promote.
    fn promotion_rank(self) -> Option<u8> {
        match self {
            TypeKind::Logical => Some(0),
            TypeKind::Byte => Some(1),
            TypeKind::Integer => Some(2),
            TypeKind::Real => Some(3),
            TypeKind::Complex => Some(4),
            _ => None,
        }
    }

    pub fn default_kind(self) -> Option<Kind> {
        match self {
            TypeKind::Logical | TypeKind::Integer | TypeKind::Real | TypeKind::Complex => Some(4),
            TypeKind::Byte | TypeKind::Character => Some(1),
            _ => None,
        }
    }

    pub fn is_valid_kind(self, kind: Kind) -> bool {
        match self {
            TypeKind::Logical => matches!(kind, 1 | 2 | 4 | 8),
            TypeKind::Integer => matches!(kind, 1 | 2 | 4 | 8 | 16),
            TypeKind::Real | TypeKind::Complex => matches!(kind, 4 | 8 | 10 | 16),
            TypeKind::Byte | TypeKind::Character => kind == 1,
            _ => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeKind::Logical => "LOGICAL",
            TypeKind::Integer => "INTEGER",
            TypeKind::Real => "REAL",
            TypeKind::Complex => "COMPLEX",
            TypeKind::Byte => "BYTE",
            TypeKind::Character => "CHARACTER",
            TypeKind::Structure => "TYPE",
            TypeKind::Pointer => "POINTER",
            TypeKind::Function => "FUNCTION",
            TypeKind::Subroutine => "SUBROUTINE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharLen {
    Known(u32),
    /// `*(*)`, taken from the actual argument.
    Assumed,
    /// Computed at run time, e.g. the concatenation of non-constant strings.
    Unknown,
}

impl CharLen {
    pub fn known(self) -> Option<u32> {
        match self {
            CharLen::Known(len) => Some(len),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bound {
    Const(i64),
    /// Depends on a dummy argument or other run-time value.
    Adjustable,
    /// `*`, the last upper bound of an assumed-size dummy array.
    Assumed,
}

impl Bound {
    pub fn value(self) -> Option<i64> {
        match self {
            Bound::Const(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArrayDim {
    pub lower: Bound,
    pub upper: Bound,
}

impl ArrayDim {
    pub fn new(lower: i64, upper: i64) -> ArrayDim {
        ArrayDim {
            lower: Bound::Const(lower),
            upper: Bound::Const(upper),
        }
    }

    /// Number of elements along this dimension, if the bounds are constant.
    pub fn extent(&self) -> Option<u64> {
        let (lower, upper) = (self.lower.value()?, self.upper.value()?);
        u64::try_from(i128::from(upper) - i128::from(lower) + 1).ok()
    }
}

/// Rank and per-dimension bounds, column-major like the storage it describes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArrayShape {
    dims: Vec<ArrayDim>,
}

impl ArrayShape {
    /// Fail if there are no dimensions, if a constant upper bound is below its lower
    /// bound, or if an assumed-size bound is anywhere but the last upper bound.
    pub fn new(dims: Vec<ArrayDim>) -> SemaResult<ArrayShape> {
        if dims.is_empty() {
            return Err(invalid_declaration("array shape with no dimensions"));
        }
        let last = dims.len() - 1;
        for (i, dim) in dims.iter().enumerate() {
            if dim.lower == Bound::Assumed || (dim.upper == Bound::Assumed && i != last) {
                return Err(invalid_declaration(
                    "assumed size `*` is only allowed as the last upper bound",
                ));
            }
            if let (Bound::Const(lower), Bound::Const(upper)) = (dim.lower, dim.upper) {
                if upper < lower {
                    return Err(invalid_declaration(format!(
                        "array bounds {lower}:{upper} are empty"
                    )));
                }
            }
        }
        Ok(ArrayShape { dims })
    }

    /// `(1:e1, 1:e2, ...)`
    pub fn from_extents(extents: &[i64]) -> SemaResult<ArrayShape> {
        ArrayShape::new(extents.iter().map(|e| ArrayDim::new(1, *e)).collect())
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[ArrayDim] {
        &self.dims
    }

    pub fn is_constant(&self) -> bool {
        self.elem_count().is_some()
    }

    pub fn elem_count(&self) -> Option<u64> {
        self.dims
            .iter()
            .try_fold(1u64, |acc, dim| acc.checked_mul(dim.extent()?))
    }

    /// Column-major linear offset of the element at `subscripts`. `None` if the rank
    /// differs, a subscript is out of bounds, or the bounds are not constant.
    pub fn linear_offset(&self, subscripts: &[i64]) -> Option<u64> {
        if subscripts.len() != self.rank() {
            return None;
        }
        let mut offset = 0u64;
        let mut stride = 1u64;
        for (dim, sub) in self.dims.iter().zip(subscripts) {
            let lower = dim.lower.value()?;
            let upper = dim.upper.value()?;
            if *sub < lower || *sub > upper {
                return None;
            }
            let delta = u64::try_from(sub.checked_sub(lower)?).ok()?;
            offset = offset.checked_add(delta.checked_mul(stride)?)?;
            stride = stride.checked_mul(dim.extent()?)?;
        }
        Some(offset)
    }
}

impl fmt::Display for ArrayShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Bound| match b {
            Bound::Const(v) => v.to_string(),
            Bound::Adjustable => "?".to_string(),
            Bound::Assumed => "*".to_string(),
        };
        f.write_str("(")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", bound(dim.lower), bound(dim.upper))?;
        }
        f.write_str(")")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructureMember {
    pub name: SmolStr,
    pub ty: TypeRef,
}

#[derive(Debug)]
pub struct StructureDef {
    name: SmolStr,
    members: Vec<StructureMember>,
}

impl StructureDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[StructureMember] {
        &self.members
    }

    /// Position and description of the member called `name`.
    pub fn member(&self, name: &str, case: CaseSensitive) -> Option<(usize, &StructureMember)> {
        self.members.iter().enumerate().find(|(_, m)| match case {
            CaseSensitive::True => m.name == name,
            CaseSensitive::False => m.name.eq_ignore_ascii_case(name),
        })
    }
}

/// Shared handle to a structure definition. Two handles are the same type only if
/// they point to the same definition.
#[derive(Clone, Debug)]
pub struct StructureRef(Rc<StructureDef>);

impl StructureRef {
    /// Fails with `DuplicateName` if two members share a name under `case`.
    pub fn new<T: Into<SmolStr>>(
        name: T,
        members: Vec<StructureMember>,
        case: CaseSensitive,
    ) -> SemaResult<StructureRef> {
        for (i, member) in members.iter().enumerate() {
            let clash = members[..i].iter().any(|m| match case {
                CaseSensitive::True => m.name == member.name,
                CaseSensitive::False => m.name.eq_ignore_ascii_case(&member.name),
            });
            if clash {
                return Err(SemanticErrorKind::DuplicateName(member.name.clone()).into());
            }
        }
        Ok(StructureRef(Rc::new(StructureDef {
            name: name.into(),
            members,
        })))
    }

    pub fn def(&self) -> &StructureDef {
        &self.0
    }
}

impl PartialEq for StructureRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for StructureRef {}

impl Hash for StructureRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Logical(Kind),
    Integer(Kind),
    Real(Kind),
    /// Kind is the width of one component.
    Complex(Kind),
    Byte(Kind),
    Character { kind: Kind, len: CharLen },
    Structure(StructureRef),
    Pointer(TypeRef),
    /// Return type of the function.
    Function(TypeRef),
    Subroutine,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Type {
    data: TypeData,
    array: Option<ArrayShape>,
}

impl Type {
    pub fn new(data: TypeData, array: Option<ArrayShape>) -> Type {
        Type { data, array }
    }

    pub fn scalar(data: TypeData) -> Type {
        Type { data, array: None }
    }

    pub fn data(&self) -> &TypeData {
        &self.data
    }

    pub fn array(&self) -> Option<&ArrayShape> {
        self.array.as_ref()
    }

    pub fn type_kind(&self) -> TypeKind {
        match &self.data {
            TypeData::Logical(_) => TypeKind::Logical,
            TypeData::Integer(_) => TypeKind::Integer,
            TypeData::Real(_) => TypeKind::Real,
            TypeData::Complex(_) => TypeKind::Complex,
            TypeData::Byte(_) => TypeKind::Byte,
            TypeData::Character { .. } => TypeKind::Character,
            TypeData::Structure(_) => TypeKind::Structure,
            TypeData::Pointer(_) => TypeKind::Pointer,
            TypeData::Function(_) => TypeKind::Function,
            TypeData::Subroutine => TypeKind::Subroutine,
        }
    }

    /// Kind selector of numeric, logical and character types.
    pub fn kind(&self) -> Option<Kind> {
        match &self.data {
            TypeData::Logical(k)
            | TypeData::Integer(k)
            | TypeData::Real(k)
            | TypeData::Complex(k)
            | TypeData::Byte(k)
            | TypeData::Character { kind: k, .. } => Some(*k),
            _ => None,
        }
    }

    pub fn char_len(&self) -> Option<CharLen> {
        match &self.data {
            TypeData::Character { len, .. } => Some(*len),
            _ => None,
        }
    }

    pub fn structure(&self) -> Option<&StructureRef> {
        match &self.data {
            TypeData::Structure(def) => Some(def),
            _ => None,
        }
    }

    /// Return type of a FUNCTION type.
    pub fn return_type(&self) -> Option<&TypeRef> {
        match &self.data {
            TypeData::Function(ret) => Some(ret),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.array.is_none()
    }

    pub fn is_array(&self) -> bool {
        self.array.is_some()
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.data, TypeData::Integer(_) | TypeData::Byte(_))
    }

    pub fn is_real(&self) -> bool {
        matches!(self.data, TypeData::Real(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.data, TypeData::Complex(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.data,
            TypeData::Integer(_) | TypeData::Real(_) | TypeData::Complex(_) | TypeData::Byte(_)
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self.data, TypeData::Logical(_))
    }

    pub fn is_character(&self) -> bool {
        matches!(self.data, TypeData::Character { .. })
    }

    pub fn is_structure(&self) -> bool {
        matches!(self.data, TypeData::Structure(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.data, TypeData::Pointer(_))
    }

    pub fn is_composite(&self) -> bool {
        self.is_array() || self.is_structure()
    }

    pub fn is_function(&self) -> bool {
        matches!(self.data, TypeData::Function(_))
    }

    pub fn is_subroutine(&self) -> bool {
        matches!(self.data, TypeData::Subroutine)
    }

    pub fn is_procedure(&self) -> bool {
        self.is_function() || self.is_subroutine()
    }

    /// Number of elements, 1 for scalars.
    pub fn elem_count(&self) -> SemaResult<u64> {
        if self.is_procedure() {
            return Err(SemanticErrorKind::InvalidType(format!("{self} has no storage")).into());
        }
        match &self.array {
            None => Ok(1),
            Some(shape) => shape.elem_count().ok_or_else(|| {
                SemanticErrorKind::InvalidType(format!("{self} has non-constant bounds")).into()
            }),
        }
    }

    /// Storage size in bytes.
    pub fn size(&self, pointer_size: u32) -> SemaResult<u64> {
        let overflow = || SemanticErrorKind::InvalidType(format!("size of {self} overflows"));
        let elem_size: u64 = match &self.data {
            TypeData::Logical(k) | TypeData::Integer(k) | TypeData::Real(k) | TypeData::Byte(k) => {
                u64::from(*k)
            }
            TypeData::Complex(k) => 2 * u64::from(*k),
            TypeData::Character { kind, len } => match len {
                CharLen::Known(len) => u64::from(*kind) * u64::from(*len),
                _ => {
                    return Err(SemanticErrorKind::InvalidType(format!(
                        "{self} has no constant length"
                    ))
                    .into())
                }
            },
            TypeData::Structure(def) => {
                let mut total = 0u64;
                for member in def.def().members() {
                    total = total
                        .checked_add(member.ty.size(pointer_size)?)
                        .ok_or_else(overflow)?;
                }
                total
            }
            TypeData::Pointer(_) => u64::from(pointer_size),
            TypeData::Function(_) | TypeData::Subroutine => {
                return Err(SemanticErrorKind::InvalidType(format!("{self} has no storage")).into())
            }
        };
        Ok(elem_size
            .checked_mul(self.elem_count()?)
            .ok_or_else(overflow)?)
    }

    /// Name of the conversion intrinsic that produces this type, and the KIND argument
    /// it needs, if any. Used when printing implicit casts.
    pub(crate) fn conversion_intrinsic(&self) -> (&'static str, Option<Kind>) {
        match &self.data {
            TypeData::Real(8) => ("DBLE", None),
            TypeData::Real(k) => ("REAL", (*k != 4).then_some(*k)),
            TypeData::Complex(k) => ("CMPLX", (*k != 4).then_some(*k)),
            TypeData::Integer(k) => ("INT", (*k != 4).then_some(*k)),
            TypeData::Byte(_) => ("INT", Some(1)),
            TypeData::Logical(k) => ("LOGICAL", (*k != 4).then_some(*k)),
            TypeData::Character { .. } => ("CHAR", None),
            _ => ("TRANSFER", None),
        }
    }
}

fn fmt_kinded(f: &mut fmt::Formatter<'_>, kind: TypeKind, k: Kind) -> fmt::Result {
    if Some(k) == kind.default_kind() {
        f.write_str(kind.name())
    } else {
        write!(f, "{}(KIND={k})", kind.name())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            TypeData::Logical(k)
            | TypeData::Integer(k)
            | TypeData::Real(k)
            | TypeData::Complex(k)
            | TypeData::Byte(k) => fmt_kinded(f, self.type_kind(), *k)?,
            TypeData::Character { kind, len } => {
                let len = match len {
                    CharLen::Known(n) => n.to_string(),
                    CharLen::Assumed => "*".to_string(),
                    CharLen::Unknown => ":".to_string(),
                };
                if *kind == 1 {
                    write!(f, "CHARACTER(LEN={len})")?
                } else {
                    write!(f, "CHARACTER(KIND={kind},LEN={len})")?
                }
            }
            TypeData::Structure(def) => write!(f, "TYPE({})", def.def().name())?,
            TypeData::Pointer(target) => write!(f, "POINTER({target})")?,
            TypeData::Function(ret) => write!(f, "FUNCTION({ret})")?,
            TypeData::Subroutine => f.write_str("SUBROUTINE")?,
        }
        if let Some(shape) = &self.array {
            write!(f, "{shape}")?;
        }
        Ok(())
    }
}

//
// Promotion
//

fn promote_shape(a: Option<&ArrayShape>, b: Option<&ArrayShape>) -> SemaResult<Option<ArrayShape>> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(shape), None) | (None, Some(shape)) => Ok(Some(shape.clone())),
        (Some(sa), Some(sb)) if sa == sb => Ok(Some(sa.clone())),
        (Some(sa), Some(sb)) => Err(type_mismatch(format!(
            "array shapes {sa} and {sb} do not conform"
        ))),
    }
}

fn promote_char_len(a: CharLen, b: CharLen) -> CharLen {
    match (a, b) {
        (CharLen::Known(a), CharLen::Known(b)) => CharLen::Known(a.max(b)),
        _ => CharLen::Unknown,
    }
}

fn with_kind(kind: TypeKind, k: Kind) -> TypeData {
    match kind {
        TypeKind::Logical => TypeData::Logical(k),
        TypeKind::Integer => TypeData::Integer(k),
        TypeKind::Real => TypeData::Real(k),
        TypeKind::Complex => TypeData::Complex(k),
        _ => TypeData::Byte(k),
    }
}

fn promote_data(ty1: &Type, ty2: &Type) -> SemaResult<TypeData> {
    use TypeData::*;
    if let (Character { kind: k1, len: l1 }, Character { kind: k2, len: l2 }) = (&ty1.data, &ty2.data)
    {
        if k1 != k2 {
            return Err(type_mismatch(format!("cannot combine {ty1} and {ty2}")));
        }
        return Ok(Character {
            kind: *k1,
            len: promote_char_len(*l1, *l2),
        });
    }
    let (kind1, kind2) = (ty1.type_kind(), ty2.type_kind());
    let (Some(rank1), Some(rank2)) = (kind1.promotion_rank(), kind2.promotion_rank()) else {
        return Err(type_mismatch(format!("cannot promote {ty1} and {ty2}")));
    };
    // Both have a kind selector once they have a promotion rank.
    let (w1, w2) = (ty1.kind().unwrap_or(4), ty2.kind().unwrap_or(4));
    let floating = |k: TypeKind| matches!(k, TypeKind::Real | TypeKind::Complex);
    let data = if rank1 == rank2 {
        with_kind(kind1, w1.max(w2))
    } else {
        let (kind, width) = if rank1 > rank2 { (kind1, w1) } else { (kind2, w2) };
        if floating(kind1) && floating(kind2) {
            with_kind(kind, w1.max(w2))
        } else {
            with_kind(kind, width)
        }
    };
    Ok(data)
}

/// The type resulting from combining operands of type `ty1` and `ty2` in a binary
/// numeric, logical or character operation. Commutative.
pub fn promote_types(ty1: &Type, ty2: &Type) -> SemaResult<Type> {
    if ty1 == ty2 {
        return Ok(ty1.clone());
    }
    let array = promote_shape(ty1.array(), ty2.array())?;
    let data = promote_data(ty1, ty2)?;
    Ok(Type { data, array })
}

//
// Casts
//

fn integer_bits(k: Kind) -> u32 {
    8 * k - 1
}

fn real_mantissa_bits(k: Kind) -> u32 {
    match k {
        4 => 24,
        8 => 53,
        10 => 64,
        _ => 113,
    }
}

/// True iff every value of `base` converts to `target` without losing information.
/// Array shapes are ignored; only element types are compared.
pub fn cast_is_lossless(base: &Type, target: &Type) -> bool {
    use TypeData::*;
    if base.data == target.data {
        return true;
    }
    match (&base.data, &target.data) {
        (Integer(a) | Byte(a), Integer(b) | Byte(b)) => a <= b,
        (Integer(a) | Byte(a), Real(r) | Complex(r)) => integer_bits(*a) <= real_mantissa_bits(*r),
        (Real(a), Real(b) | Complex(b)) | (Complex(a), Complex(b)) => {
            real_mantissa_bits(*a) <= real_mantissa_bits(*b)
        }
        (Logical(a), Logical(b)) => a <= b,
        (Character { kind: k1, len: l1 }, Character { kind: k2, len: l2 }) => {
            k1 == k2
                && match (l1, l2) {
                    (CharLen::Known(a), CharLen::Known(b)) => a <= b,
                    (_, CharLen::Assumed | CharLen::Unknown) => true,
                    _ => false,
                }
        }
        _ => false,
    }
}

/// True if a value of `from` may be converted to `to` at all, lossy or not.
pub fn can_cast(from: &Type, to: &Type) -> bool {
    (from.is_numeric() && to.is_numeric())
        || (from.is_logical() && to.is_logical())
        || (from.is_character() && to.is_character() && from.kind() == to.kind())
}

//
// Interning
//

/// Pool of canonical types. Constructors return the shared instance for each
/// distinct type.
#[derive(Debug, Default)]
pub struct TypeInterner {
    pool: HashSet<TypeRef>,
}

impl TypeInterner {
    pub fn new() -> TypeInterner {
        TypeInterner::default()
    }

    pub fn intern(&mut self, ty: Type) -> TypeRef {
        if let Some(existing) = self.pool.get(&ty) {
            return existing.clone();
        }
        let ty = Rc::new(ty);
        self.pool.insert(ty.clone());
        ty
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// A scalar LOGICAL, INTEGER, REAL, COMPLEX or BYTE of the given kind.
    pub fn primitive(&mut self, kind: TypeKind, width: Kind) -> SemaResult<TypeRef> {
        if !matches!(
            kind,
            TypeKind::Logical | TypeKind::Integer | TypeKind::Real | TypeKind::Complex | TypeKind::Byte
        ) {
            return Err(invalid_declaration(format!("{} is not a primitive type", kind.name())));
        }
        if !kind.is_valid_kind(width) {
            return Err(invalid_declaration(format!(
                "KIND={width} is not valid for {}",
                kind.name()
            )));
        }
        Ok(self.intern(Type::scalar(with_kind(kind, width))))
    }

    pub fn logical(&mut self) -> TypeRef {
        self.intern(Type::scalar(TypeData::Logical(4)))
    }

    pub fn integer(&mut self) -> TypeRef {
        self.intern(Type::scalar(TypeData::Integer(4)))
    }

    pub fn real(&mut self) -> TypeRef {
        self.intern(Type::scalar(TypeData::Real(4)))
    }

    pub fn double(&mut self) -> TypeRef {
        self.intern(Type::scalar(TypeData::Real(8)))
    }

    pub fn complex(&mut self) -> TypeRef {
        self.intern(Type::scalar(TypeData::Complex(4)))
    }

    pub fn character(&mut self, kind: Kind, len: CharLen) -> TypeRef {
        self.intern(Type::scalar(TypeData::Character { kind, len }))
    }

    pub fn pointer(&mut self, target: &TypeRef) -> TypeRef {
        self.intern(Type::scalar(TypeData::Pointer(target.clone())))
    }

    pub fn function(&mut self, ret: &TypeRef) -> SemaResult<TypeRef> {
        if ret.is_procedure() || ret.is_array() {
            return Err(invalid_declaration(format!("a FUNCTION cannot return {ret}")));
        }
        Ok(self.intern(Type::scalar(TypeData::Function(ret.clone()))))
    }

    pub fn subroutine(&mut self) -> TypeRef {
        self.intern(Type::scalar(TypeData::Subroutine))
    }

    pub fn structure(&mut self, def: &StructureRef) -> TypeRef {
        self.intern(Type::scalar(TypeData::Structure(def.clone())))
    }

    /// An array of `base`, which must be a scalar non-procedure type.
    pub fn array(&mut self, base: &TypeRef, shape: ArrayShape) -> SemaResult<TypeRef> {
        if base.is_procedure() {
            return Err(invalid_declaration(format!("array of {base}")));
        }
        if base.is_array() {
            return Err(invalid_declaration(format!("{base} already has a shape")));
        }
        Ok(self.intern(Type::new(base.data.clone(), Some(shape))))
    }

    /// The element type of an array, or `ty` itself for scalars.
    pub fn element(&mut self, ty: &TypeRef) -> TypeRef {
        if ty.is_scalar() {
            return ty.clone();
        }
        self.intern(Type::scalar(ty.data.clone()))
    }

    /// `ty` with the element type replaced by `elem`'s, keeping any shape.
    pub fn with_element(&mut self, ty: &TypeRef, elem: &TypeRef) -> TypeRef {
        self.intern(Type::new(elem.data.clone(), ty.array.clone()))
    }

    pub fn promote(&mut self, ty1: &TypeRef, ty2: &TypeRef) -> SemaResult<TypeRef> {
        if ty1 == ty2 {
            return Ok(ty1.clone());
        }
        Ok(self.intern(promote_types(ty1, ty2)?))
    }
}

#[test]
fn test_type_display() {
    let mut types = TypeInterner::new();
    let int8 = types.primitive(TypeKind::Integer, 8).unwrap();
    assert_eq!(int8.to_string(), "INTEGER(KIND=8)");
    assert_eq!(types.integer().to_string(), "INTEGER");
    let shape = ArrayShape::new(vec![ArrayDim::new(1, 3), ArrayDim::new(0, 9)]).unwrap();
    let real = types.real();
    let arr = types.array(&real, shape).unwrap();
    assert_eq!(arr.to_string(), "REAL(1:3,0:9)");
    let ch = types.character(1, CharLen::Assumed);
    assert_eq!(ch.to_string(), "CHARACTER(LEN=*)");
}

#[test]
fn test_interning_shares_instances() {
    let mut types = TypeInterner::new();
    let a = types.double();
    let b = types.primitive(TypeKind::Real, 8).unwrap();
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(types.len(), 1);
}

#[test]
fn test_linear_offset_column_major() {
    let shape = ArrayShape::new(vec![ArrayDim::new(1, 2), ArrayDim::new(1, 3)]).unwrap();
    assert_eq!(shape.linear_offset(&[1, 1]), Some(0));
    assert_eq!(shape.linear_offset(&[2, 1]), Some(1));
    assert_eq!(shape.linear_offset(&[1, 2]), Some(2));
    assert_eq!(shape.linear_offset(&[3, 1]), None);
    assert_eq!(shape.elem_count(), Some(6));
}

#[test]
fn test_real_double_complex_promotes_wide() {
    let mut types = TypeInterner::new();
    let double = types.double();
    let complex = types.complex();
    let ty = types.promote(&double, &complex).unwrap();
    assert_eq!(*ty.data(), TypeData::Complex(8));
}
