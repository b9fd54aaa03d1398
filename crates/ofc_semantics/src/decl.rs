// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// Declarations and the per-scope tables that name them.
//
// Every `Declaration` lives in the `DeclArena` of the `Context` and is addressed by
// a `DeclId`. A `DeclList` maps names to ids. An owning list is the one place a
// declaration is reachable from its scope; a reference list (COMMON layouts) only
// borrows ids owned by some scope's list.

use bitflags::bitflags;
use hashbrown::HashMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::asg::TExpr;
use crate::context::Context;
use crate::equiv::{EquivalenceGroups, GroupId};
use crate::scope::ScopeId;
use crate::semantic_error::{invalid_declaration, SemaResult, SemanticError};
use crate::semantic_error::SemanticErrorKind::{self, *};
use crate::types::{
    cast_is_lossless, can_cast, ArrayShape, CaseSensitive, CharLen, Kind, StructureRef, Type,
    TypeKind, TypeRef,
};
use crate::typeval::TypedValue;
use crate::TextRange;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DeclFlags: u16 {
        const STATIC = 1 << 0;
        const AUTOMATIC = 1 << 1;
        const VOLATILE = 1 << 2;
        const INTRINSIC = 1 << 3;
        const EXTERNAL = 1 << 4;
        const TARGET = 1 << 5;
        const PARAMETER = 1 << 6;
        /// Typed by the implicit rule rather than by a declaration statement.
        const IMPLICIT = 1 << 7;
        /// Dummy argument of the procedure owning the scope.
        const DUMMY = 1 << 8;
    }
}

impl DeclFlags {
    /// Reject attribute combinations no declaration can have.
    pub fn check(self) -> SemaResult<()> {
        let conflicts = [
            (DeclFlags::STATIC, DeclFlags::AUTOMATIC),
            (DeclFlags::INTRINSIC, DeclFlags::EXTERNAL),
            (DeclFlags::PARAMETER, DeclFlags::EXTERNAL),
            (DeclFlags::PARAMETER, DeclFlags::INTRINSIC),
            (DeclFlags::PARAMETER, DeclFlags::DUMMY),
            (DeclFlags::PARAMETER, DeclFlags::VOLATILE),
        ];
        let name = |flag: DeclFlags| flag.iter_names().next().map_or("?", |(name, _)| name);
        for (a, b) in conflicts {
            if self.contains(a | b) {
                return Err(invalid_declaration(format!(
                    "{} and {} are mutually exclusive",
                    name(a),
                    name(b)
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(usize);

impl From<DeclId> for usize {
    fn from(id: DeclId) -> usize {
        id.0
    }
}

/// Constant initial value of a declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Initializer {
    Scalar(TypedValue),
    /// One slot per element in storage order; `None` is not initialized.
    Array(Vec<Option<TypedValue>>),
}

#[derive(Clone, Debug)]
pub struct Declaration {
    name: SmolStr,
    ty: TypeRef,
    func: Option<ScopeId>,
    init: Option<Initializer>,
    flags: DeclFlags,
    equiv: Option<GroupId>,
    common: Option<SmolStr>,
    used: bool,
    range: TextRange,
}

impl Declaration {
    pub fn new<T: Into<SmolStr>>(
        name: T,
        ty: TypeRef,
        flags: DeclFlags,
        range: TextRange,
    ) -> Declaration {
        Declaration {
            name: name.into(),
            ty,
            func: None,
            init: None,
            flags,
            equiv: None,
            common: None,
            used: false,
            range,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_type(&self) -> &TypeRef {
        &self.ty
    }

    /// Scope of the body, for FUNCTION and SUBROUTINE declarations.
    pub fn func(&self) -> Option<ScopeId> {
        self.func
    }

    pub fn flags(&self) -> DeclFlags {
        self.flags
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(DeclFlags::STATIC)
    }

    pub fn is_automatic(&self) -> bool {
        self.flags.contains(DeclFlags::AUTOMATIC)
    }

    pub fn is_volatile(&self) -> bool {
        self.flags.contains(DeclFlags::VOLATILE)
    }

    pub fn is_intrinsic(&self) -> bool {
        self.flags.contains(DeclFlags::INTRINSIC)
    }

    pub fn is_external(&self) -> bool {
        self.flags.contains(DeclFlags::EXTERNAL)
    }

    pub fn is_target(&self) -> bool {
        self.flags.contains(DeclFlags::TARGET)
    }

    pub fn is_parameter(&self) -> bool {
        self.flags.contains(DeclFlags::PARAMETER)
    }

    pub fn is_implicit(&self) -> bool {
        self.flags.contains(DeclFlags::IMPLICIT)
    }

    pub fn is_dummy(&self) -> bool {
        self.flags.contains(DeclFlags::DUMMY)
    }

    pub fn is_used(&self) -> bool {
        self.used
    }

    pub fn is_array(&self) -> bool {
        self.ty.is_array()
    }

    pub fn is_composite(&self) -> bool {
        self.ty.is_composite()
    }

    pub fn is_function(&self) -> bool {
        self.ty.is_function()
    }

    pub fn is_subroutine(&self) -> bool {
        self.ty.is_subroutine()
    }

    pub fn is_procedure(&self) -> bool {
        self.ty.is_procedure()
    }

    pub fn initializer(&self) -> Option<&Initializer> {
        self.init.as_ref()
    }

    pub fn has_initializer(&self) -> bool {
        self.init.is_some()
    }

    /// The initial value of the element at linear `offset`. Offset 0 of a scalar is
    /// the scalar itself.
    pub fn init_at(&self, offset: u64) -> Option<&TypedValue> {
        match self.init.as_ref()? {
            Initializer::Scalar(value) => (offset == 0).then_some(value),
            Initializer::Array(values) => values
                .get(usize::try_from(offset).ok()?)
                .and_then(Option::as_ref),
        }
    }

    /// The scalar initial value, e.g. the value of a PARAMETER.
    pub fn constant_value(&self) -> Option<&TypedValue> {
        match self.init.as_ref()? {
            Initializer::Scalar(value) => Some(value),
            Initializer::Array(_) => None,
        }
    }

    pub fn equivalence_group(&self) -> Option<GroupId> {
        self.equiv
    }

    /// Name of the COMMON block holding this declaration, `""` for blank common.
    pub fn common_block(&self) -> Option<&str> {
        self.common.as_deref()
    }

    pub fn elem_count(&self) -> SemaResult<u64> {
        self.ty.elem_count()
    }

    pub fn size(&self, pointer_size: u32) -> SemaResult<u64> {
        self.ty.size(pointer_size)
    }

    pub(crate) fn set_type(&mut self, ty: TypeRef) {
        self.ty = ty;
    }

    pub(crate) fn set_func(&mut self, func: ScopeId) {
        self.func = Some(func);
    }

    pub(crate) fn set_flags(&mut self, flags: DeclFlags) {
        self.flags = flags;
    }

    pub(crate) fn mark_used(&mut self) {
        self.used = true;
    }

    pub(crate) fn set_common(&mut self, block: SmolStr) {
        self.common = Some(block);
    }

    pub(crate) fn set_equivalence_group(&mut self, group: Option<GroupId>) {
        self.equiv = group;
    }

    pub(crate) fn take_equivalence_group(&mut self) -> Option<GroupId> {
        self.equiv.take()
    }
}

/// Storage for every declaration of a `Context`.
#[derive(Clone, Debug, Default)]
pub struct DeclArena {
    decls: Vec<Option<Declaration>>,
}

impl DeclArena {
    pub fn new() -> DeclArena {
        DeclArena::default()
    }

    pub fn insert(&mut self, decl: Declaration) -> SemaResult<DeclId> {
        self.decls.try_reserve(1)?;
        let id = DeclId(self.decls.len());
        self.decls.push(Some(decl));
        Ok(id)
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        self.decls.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn remove(&mut self, id: DeclId) -> Option<Declaration> {
        self.decls.get_mut(id.0).and_then(Option::take)
    }

    /// Number of live declarations.
    pub fn len(&self) -> usize {
        self.decls.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Indexing is for ids that are known to be live: those held by an owning list.
impl std::ops::Index<DeclId> for DeclArena {
    type Output = Declaration;

    fn index(&self, id: DeclId) -> &Declaration {
        self.get(id).expect("declaration was destroyed")
    }
}

impl std::ops::IndexMut<DeclId> for DeclArena {
    fn index_mut(&mut self, id: DeclId) -> &mut Declaration {
        self.get_mut(id).expect("declaration was destroyed")
    }
}

/// A name to declaration map with a case policy fixed at construction.
#[derive(Clone, Debug)]
pub struct DeclList {
    case: CaseSensitive,
    is_ref: bool,
    order: Vec<DeclId>,
    map: HashMap<SmolStr, DeclId>,
}

impl DeclList {
    /// An owning list: its declarations are destroyed with it.
    pub fn new(case: CaseSensitive) -> DeclList {
        DeclList {
            case,
            is_ref: false,
            order: Vec::new(),
            map: HashMap::new(),
        }
    }

    /// A reference list, naming declarations owned by other lists.
    pub fn new_ref(case: CaseSensitive) -> DeclList {
        DeclList {
            is_ref: true,
            ..DeclList::new(case)
        }
    }

    pub fn is_ref(&self) -> bool {
        self.is_ref
    }

    pub fn case_sensitive(&self) -> CaseSensitive {
        self.case
    }

    fn key(&self, name: &str) -> SmolStr {
        match self.case {
            CaseSensitive::True => SmolStr::from(name),
            CaseSensitive::False => SmolStr::from(name.to_ascii_uppercase()),
        }
    }

    fn reserve_for(&mut self, name: &str) -> SemaResult<SmolStr> {
        let key = self.key(name);
        if self.map.contains_key(&key) {
            return Err(DuplicateName(name.into()).into());
        }
        self.order.try_reserve(1)?;
        self.map.try_reserve(1)?;
        Ok(key)
    }

    /// Move `decl` into `arena` and name it here. Fails with `DuplicateName`,
    /// leaving the arena untouched, if the name is taken.
    pub fn add(&mut self, arena: &mut DeclArena, decl: Declaration) -> SemaResult<DeclId> {
        if self.is_ref {
            return Err(invalid_declaration("cannot add an owned declaration to a reference list"));
        }
        let range = decl.range();
        let key = self.reserve_for(decl.name()).map_err(|e| e.or_range(range))?;
        let id = arena.insert(decl)?;
        self.order.push(id);
        self.map.insert(key, id);
        Ok(id)
    }

    /// Name a declaration owned elsewhere.
    pub fn add_ref(&mut self, arena: &DeclArena, id: DeclId) -> SemaResult<()> {
        let decl = arena
            .get(id)
            .ok_or_else(|| invalid_declaration("reference to a destroyed declaration"))?;
        let key = self.reserve_for(decl.name())?;
        self.order.push(id);
        self.map.insert(key, id);
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<DeclId> {
        self.map.get(&self.key(name)).copied()
    }

    pub fn find_decl<'a>(&self, arena: &'a DeclArena, name: &str) -> Option<&'a Declaration> {
        arena.get(self.find(name)?)
    }

    /// Mutable lookup. Reference lists do not own their entries and never hand out
    /// mutable access.
    pub fn find_modify<'a>(
        &self,
        arena: &'a mut DeclArena,
        name: &str,
    ) -> Option<&'a mut Declaration> {
        if self.is_ref {
            return None;
        }
        arena.get_mut(self.find(name)?)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> &[DeclId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Destroy the list. An owning list also destroys its declarations, taking each
    /// out of its equivalence group first. Returns the body scopes of destroyed
    /// procedure declarations, which the caller must destroy in turn.
    pub fn delete(
        self,
        arena: &mut DeclArena,
        equivalences: &mut EquivalenceGroups,
    ) -> Vec<ScopeId> {
        if self.is_ref {
            return Vec::new();
        }
        let mut bodies = Vec::new();
        for id in self.order {
            equivalences.remove(arena, id);
            if let Some(decl) = arena.remove(id) {
                bodies.extend(decl.func);
            }
        }
        bodies
    }
}

/// A resolved type specification: what a declaration statement says about the
/// entities it declares.
#[derive(Clone, Debug, PartialEq)]
pub struct Spec {
    pub type_kind: TypeKind,
    /// KIND selector, `None` for the default of `type_kind`.
    pub kind: Option<Kind>,
    /// Length of CHARACTER, `None` for 1.
    pub len: Option<CharLen>,
    pub structure: Option<StructureRef>,
    pub flags: DeclFlags,
    pub array: Option<ArrayShape>,
}

impl Spec {
    pub fn new(type_kind: TypeKind) -> Spec {
        Spec {
            type_kind,
            kind: None,
            len: None,
            structure: None,
            flags: DeclFlags::empty(),
            array: None,
        }
    }

    pub fn with_kind(self, kind: Kind) -> Spec {
        Spec {
            kind: Some(kind),
            ..self
        }
    }

    pub fn with_len(self, len: CharLen) -> Spec {
        Spec {
            len: Some(len),
            ..self
        }
    }

    pub fn with_flags(self, flags: DeclFlags) -> Spec {
        Spec {
            flags: self.flags | flags,
            ..self
        }
    }

    pub fn with_array(self, shape: ArrayShape) -> Spec {
        Spec {
            array: Some(shape),
            ..self
        }
    }

    pub fn structure(def: StructureRef) -> Spec {
        Spec {
            structure: Some(def),
            ..Spec::new(TypeKind::Structure)
        }
    }
}

impl Context {
    /// The canonical type described by `spec`. Fails with `InvalidDeclaration` if the
    /// specification contradicts itself.
    pub fn type_from_spec(&mut self, spec: &Spec) -> SemaResult<TypeRef> {
        spec.flags.check()?;
        if spec.len.is_some() && spec.type_kind != TypeKind::Character {
            return Err(invalid_declaration(format!(
                "{} has no length",
                spec.type_kind.name()
            )));
        }
        let base = match spec.type_kind {
            TypeKind::Character => {
                let kind = spec.kind.unwrap_or(1);
                if !TypeKind::Character.is_valid_kind(kind) {
                    return Err(invalid_declaration(format!("KIND={kind} for CHARACTER")));
                }
                self.types
                    .character(kind, spec.len.unwrap_or(CharLen::Known(1)))
            }
            TypeKind::Structure => {
                let def = spec
                    .structure
                    .as_ref()
                    .ok_or_else(|| invalid_declaration("TYPE without a structure"))?;
                self.types.structure(def)
            }
            TypeKind::Subroutine => self.types.subroutine(),
            TypeKind::Pointer | TypeKind::Function => {
                return Err(invalid_declaration(format!(
                    "{} is not a declaration type",
                    spec.type_kind.name()
                )))
            }
            kind => {
                let width = spec
                    .kind
                    .or(kind.default_kind())
                    .ok_or_else(|| invalid_declaration("missing KIND"))?;
                self.types.primitive(kind, width)?
            }
        };
        match &spec.array {
            Some(shape) => self.types.array(&base, shape.clone()),
            None => Ok(base),
        }
    }

    /// Add `decl` to the table of `scope`.
    pub fn declare(&mut self, scope: ScopeId, decl: Declaration) -> SemaResult<DeclId> {
        let name = decl.name.clone();
        let (scope_ref, arena) = self.scope_and_decls(scope)?;
        let id = scope_ref.decls_mut().add(arena, decl)?;
        debug!(name = %name, ty = %self.decls[id].ty, "declared");
        Ok(id)
    }

    /// Declare `name` in `scope` as described by `spec`.
    ///
    /// A name that already exists may be declared again only if the existing
    /// declaration was made implicitly and either has not been used yet or already
    /// has the same type, or if it is identical to the new one. An implicit array
    /// keeps its shape when the new specification gives none, so `DIMENSION A(3)`
    /// followed by `REAL A` declares one array; giving it a second shape is
    /// `InvalidDeclaration`.
    pub fn declare_spec(
        &mut self,
        scope: ScopeId,
        name: &str,
        spec: &Spec,
        range: TextRange,
    ) -> SemaResult<DeclId> {
        let ty = self.type_from_spec(spec).map_err(|e| e.or_range(range))?;
        let Some(id) = self.scope(scope)?.decls().find(name) else {
            return self.declare(scope, Declaration::new(name, ty, spec.flags, range));
        };
        let existing = &self.decls[id];
        if existing.is_implicit() {
            if existing.is_array() && ty.is_array() {
                return Err(SemanticError::new(
                    InvalidDeclaration(format!("`{name}` already has dimensions")),
                    range,
                ));
            }
            let keep_shape = ty.is_scalar() && existing.is_array();
            let ty = if keep_shape {
                let old = existing.ty.clone();
                self.types.with_element(&old, &ty)
            } else {
                ty
            };
            let existing = &self.decls[id];
            if !existing.used || existing.ty == ty {
                if existing.has_initializer() && existing.ty != ty {
                    return Err(SemanticError::new(DuplicateName(name.into()), range));
                }
                let flags = (existing.flags - DeclFlags::IMPLICIT) | spec.flags;
                flags.check().map_err(|e| e.or_range(range))?;
                let decl = &mut self.decls[id];
                decl.set_type(ty);
                decl.set_flags(flags);
                debug!(name, ty = %decl.ty, "implicit declaration made explicit");
                return Ok(id);
            }
        } else if existing.ty == ty && existing.flags - DeclFlags::DUMMY == spec.flags {
            return Ok(id);
        }
        Err(SemanticError::new(DuplicateName(name.into()), range))
    }

    /// Declare `name` in `scope` by the implicit-typing rule of `scope`. Declares it at
    /// most once: an existing local declaration is returned as is.
    pub fn declare_implicit(
        &mut self,
        scope: ScopeId,
        name: &str,
        range: TextRange,
    ) -> SemaResult<DeclId> {
        let local = self.scope(scope)?;
        if let Some(id) = local.decls().find(name) {
            return Ok(id);
        }
        let ty = local
            .implicit()
            .type_for(name)
            .cloned()
            .ok_or_else(|| SemanticError::new(UndeclaredReference(name.into()), range))?;
        let id = self.declare(scope, Declaration::new(name, ty, DeclFlags::IMPLICIT, range))?;
        debug!(name, "implicit declaration");
        Ok(id)
    }

    /// Declare an external function known only by being called, typed by the
    /// implicit rule.
    pub fn declare_implicit_function(
        &mut self,
        scope: ScopeId,
        name: &str,
        range: TextRange,
    ) -> SemaResult<DeclId> {
        let ret = self
            .scope(scope)?
            .implicit()
            .type_for(name)
            .cloned()
            .ok_or_else(|| SemanticError::new(UndeclaredReference(name.into()), range))?;
        let ty = self.types.function(&ret)?;
        let flags = DeclFlags::IMPLICIT | DeclFlags::EXTERNAL;
        self.declare(scope, Declaration::new(name, ty, flags, range))
    }

    /// Declare a FUNCTION in `scope` together with a new scope for its body. The body
    /// scope holds the result variable, of the same name. `ret` gives the result type;
    /// without one the implicit rule of `scope` applies.
    pub fn declare_function(
        &mut self,
        scope: ScopeId,
        name: &str,
        ret: Option<&Spec>,
        range: TextRange,
    ) -> SemaResult<DeclId> {
        let (ret_ty, ret_flags) = match ret {
            Some(spec) => (self.type_from_spec(spec)?, DeclFlags::empty()),
            None => {
                let ty = self
                    .scope(scope)?
                    .implicit()
                    .type_for(name)
                    .cloned()
                    .ok_or_else(|| SemanticError::new(UndeclaredReference(name.into()), range))?;
                (ty, DeclFlags::IMPLICIT)
            }
        };
        let ty = self.types.function(&ret_ty).map_err(|e| e.or_range(range))?;
        self.declare_procedure(scope, name, ty, range, |ctx, body| {
            let result = Declaration::new(name, ret_ty, ret_flags, range);
            let id = ctx.declare(body, result)?;
            ctx.scope_mut(body)?.set_result(id);
            Ok(())
        })
    }

    /// Declare a SUBROUTINE in `scope` together with a new scope for its body.
    pub fn declare_subroutine(
        &mut self,
        scope: ScopeId,
        name: &str,
        range: TextRange,
    ) -> SemaResult<DeclId> {
        let ty = self.types.subroutine();
        self.declare_procedure(scope, name, ty, range, |_, _| Ok(()))
    }

    fn declare_procedure<F>(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: TypeRef,
        range: TextRange,
        populate: F,
    ) -> SemaResult<DeclId>
    where
        F: FnOnce(&mut Context, ScopeId) -> SemaResult<()>,
    {
        if self.scope(scope)?.decls().contains(name) {
            return Err(SemanticError::new(DuplicateName(name.into()), range));
        }
        let kind = if ty.is_function() {
            crate::scope::ScopeKind::Function
        } else {
            crate::scope::ScopeKind::Subroutine
        };
        let parent = self.options().host_association.then_some(scope);
        let body = self.create_scope(kind, Some(name), parent)?;
        let declared = populate(self, body).and_then(|()| {
            let mut decl = Declaration::new(name, ty, DeclFlags::empty(), range);
            decl.set_func(body);
            self.declare(scope, decl)
        });
        if declared.is_err() {
            self.destroy_scope(body);
        }
        declared
    }

    /// Attach the value of the constant expression `value` to `decl`. On an array the
    /// value is given to every element.
    pub fn decl_init(&mut self, decl: DeclId, value: &TExpr) -> SemaResult<()> {
        let value = self.init_value(decl, value)?;
        let count = self.init_slots(decl)?.unwrap_or(1);
        let len = usize::try_from(count).map_err(|_| SemanticErrorKind::AllocationFailure)?;
        let mut writes = Vec::new();
        writes.try_reserve(len)?;
        writes.extend((0..count).map(|offset| (offset, value.clone())));
        self.apply_init(decl, writes)
    }

    /// Initialize the element at linear `offset` of an array, or offset 0 of a scalar.
    pub fn decl_init_offset(&mut self, decl: DeclId, offset: u64, value: &TExpr) -> SemaResult<()> {
        let value = self.init_value(decl, value)?;
        let count = self.init_slots(decl)?.unwrap_or(1);
        if offset >= count {
            return Err(SemanticError::new(
                SubscriptError(format!(
                    "offset {offset} is outside `{}`",
                    self.decls[decl].name
                )),
                value_range(&self.decls[decl]),
            ));
        }
        self.apply_init(decl, vec![(offset, value)])
    }

    /// Initialize every element of `decl`, in storage order. Either all elements are
    /// set or, on failure, none is.
    pub fn decl_init_array(&mut self, decl: DeclId, values: &[TExpr]) -> SemaResult<()> {
        let count = self.init_slots(decl)?.unwrap_or(1);
        if values.len() as u64 != count {
            return Err(SemanticError::new(
                InvalidDeclaration(format!(
                    "{} values for the {count} elements of `{}`",
                    values.len(),
                    self.decls[decl].name
                )),
                value_range(&self.decls[decl]),
            ));
        }
        let mut writes = Vec::new();
        writes.try_reserve(values.len())?;
        for (offset, value) in values.iter().enumerate() {
            writes.push((offset as u64, self.init_value(decl, value)?));
        }
        self.apply_init(decl, writes)
    }

    /// Number of elements of an initializable array, `None` for a scalar.
    fn init_slots(&self, decl: DeclId) -> SemaResult<Option<u64>> {
        let d = self.decl(decl)?;
        if d.is_procedure() {
            return Err(SemanticError::new(
                InvalidDeclaration(format!("procedure `{}` cannot be initialized", d.name)),
                d.range,
            ));
        }
        if d.is_dummy() {
            return Err(SemanticError::new(
                InvalidDeclaration(format!("dummy argument `{}` cannot be initialized", d.name)),
                d.range,
            ));
        }
        if d.is_array() {
            return d.elem_count().map(Some).map_err(|e| e.or_range(d.range));
        }
        Ok(None)
    }

    /// Resolve `value` and convert it to the element type of `decl`.
    fn init_value(&mut self, decl: DeclId, value: &TExpr) -> SemaResult<TypedValue> {
        let constant = value.resolve()?;
        let target = self.decl(decl)?.ty.clone();
        let elem = self.types.element(&target);
        self.convert_constant(&constant, &elem, value.range())
    }

    /// Convert a constant for storage in a variable of type `target`, warning when the
    /// conversion can lose information.
    pub(crate) fn convert_constant(
        &mut self,
        value: &TypedValue,
        target: &TypeRef,
        range: TextRange,
    ) -> SemaResult<TypedValue> {
        let from = value.get_type().clone();
        if !can_cast(&from, target) {
            return Err(SemanticError::new(
                TypeMismatch(format!("cannot assign {from} to {target}")),
                range,
            ));
        }
        self.warn_if_lossy(&from, target, range);
        value.cast(target).map_err(|e| e.or_range(range))
    }

    pub(crate) fn warn_if_lossy(&mut self, from: &Type, to: &Type, range: TextRange) {
        if self.options().warn_lossy_casts && !cast_is_lossless(from, to) {
            self.warning(range, format!("implicit conversion from {from} to {to} may lose information"));
        }
    }

    fn apply_init(&mut self, decl: DeclId, writes: Vec<(u64, TypedValue)>) -> SemaResult<()> {
        let count = self.init_slots(decl)?;
        let d = &self.decls[decl];
        let conflict = || SemanticError::new(AlreadyInitialized(d.name.clone()), d.range);
        for (offset, value) in &writes {
            if let Some(existing) = d.init_at(*offset) {
                if existing != value {
                    return Err(conflict());
                }
            }
        }
        let d = &mut self.decls[decl];
        match count {
            None => {
                if let Some((_, value)) = writes.into_iter().next() {
                    d.init = Some(Initializer::Scalar(value));
                }
            }
            Some(count) => {
                if d.init.is_none() {
                    let len = usize::try_from(count).map_err(|_| SemanticErrorKind::AllocationFailure)?;
                    let mut slots = Vec::new();
                    slots.try_reserve(len)?;
                    slots.resize(len, None);
                    d.init = Some(Initializer::Array(slots));
                }
                if let Some(Initializer::Array(slots)) = &mut d.init {
                    for (offset, value) in writes {
                        // Offsets were checked against the element count by the callers.
                        slots[offset as usize] = Some(value);
                    }
                }
            }
        }
        debug!(name = %d.name, "initialized");
        Ok(())
    }

    /// Put `a` and `b` in the same EQUIVALENCE group.
    pub fn equivalence(&mut self, a: DeclId, b: DeclId) -> SemaResult<()> {
        self.equivalences.merge(&mut self.decls, a, b)
    }

    /// Mark a declaration as referenced by an executable statement or expression.
    pub(crate) fn mark_used(&mut self, decl: DeclId) {
        if let Some(d) = self.decls.get_mut(decl) {
            d.mark_used();
        }
    }

    /// Attach `shape` to a declaration that has none yet, as a DIMENSION statement does.
    pub fn decl_set_shape(&mut self, decl: DeclId, shape: ArrayShape, range: TextRange) -> SemaResult<()> {
        let d = self.decl(decl)?;
        if d.is_array() {
            return Err(SemanticError::new(
                InvalidDeclaration(format!("`{}` already has dimensions", d.name)),
                range,
            ));
        }
        if d.has_initializer() {
            return Err(SemanticError::new(
                InvalidDeclaration(format!("`{}` is initialized as a scalar", d.name)),
                range,
            ));
        }
        let ty = d.ty.clone();
        let ty = self.types.array(&ty, shape).map_err(|e| e.or_range(range))?;
        self.decls[decl].set_type(ty);
        Ok(())
    }

    /// Add `flags` to a declaration, as EXTERNAL, INTRINSIC and SAVE statements do.
    pub fn decl_add_flags(&mut self, decl: DeclId, flags: DeclFlags, range: TextRange) -> SemaResult<()> {
        let d = self.decl(decl)?;
        let combined = d.flags | flags;
        combined.check().map_err(|e| e.or_range(range))?;
        self.decls[decl].set_flags(combined);
        Ok(())
    }

    /// Make `decl` a named constant with the value of `value`. The declaration is
    /// left as it was if either the flags or the value are rejected.
    pub fn decl_init_parameter(&mut self, decl: DeclId, value: &TExpr, range: TextRange) -> SemaResult<()> {
        let combined = self.decl(decl)?.flags | DeclFlags::PARAMETER;
        combined.check().map_err(|e| e.or_range(range))?;
        self.decl_init(decl, value)?;
        self.decls[decl].set_flags(combined);
        Ok(())
    }

    pub fn decl_size(&self, decl: DeclId) -> SemaResult<u64> {
        self.decl(decl)?.size(self.options().pointer_size)
    }

    pub fn decl_elem_count(&self, decl: DeclId) -> SemaResult<u64> {
        self.decl(decl)?.elem_count()
    }
}

fn value_range(decl: &Declaration) -> TextRange {
    decl.range
}
