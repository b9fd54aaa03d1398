// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// Scopes: the naming environment of one program unit or procedure body.
//
// Scopes are held by the `Context` and addressed by `ScopeId`. Lookup consults the
// local table first and then the parent, if any. Implicit-typing rules are never
// inherited from the parent.

use hashbrown::HashMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::context::Context;
use crate::decl::{DeclFlags, DeclId, DeclList};
use crate::implicit::ImplicitRules;
use crate::semantic_error::{SemaResult, SemanticErrorKind};
use crate::types::{CaseSensitive, StructureRef, TypeRef};

// Scope 0 is always the global scope of a `Context`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl From<ScopeId> for usize {
    fn from(id: ScopeId) -> usize {
        id.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Holds the external procedures of a source file.
    Global,
    Program,
    Subroutine,
    Function,
    BlockData,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DummyArgument {
    Decl(DeclId),
    /// `*` in a SUBROUTINE argument list.
    AltReturn,
}

#[derive(Clone, Debug)]
pub struct Scope {
    kind: ScopeKind,
    name: Option<SmolStr>,
    parent: Option<ScopeId>,
    decls: DeclList,
    implicit: ImplicitRules,
    structures: HashMap<SmolStr, StructureRef>,
    args: Vec<DummyArgument>,
    result: Option<DeclId>,
    save_all: bool,
}

impl Scope {
    fn new(
        kind: ScopeKind,
        name: Option<SmolStr>,
        parent: Option<ScopeId>,
        case: CaseSensitive,
        implicit: ImplicitRules,
    ) -> Scope {
        Scope {
            kind,
            name,
            parent,
            decls: DeclList::new(case),
            implicit,
            structures: HashMap::new(),
            args: Vec::new(),
            result: None,
            save_all: false,
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn decls(&self) -> &DeclList {
        &self.decls
    }

    pub(crate) fn decls_mut(&mut self) -> &mut DeclList {
        &mut self.decls
    }

    pub fn implicit(&self) -> &ImplicitRules {
        &self.implicit
    }

    /// Dummy arguments in order.
    pub fn args(&self) -> &[DummyArgument] {
        &self.args
    }

    pub(crate) fn push_arg(&mut self, arg: DummyArgument) -> SemaResult<()> {
        self.args.try_reserve(1)?;
        self.args.push(arg);
        Ok(())
    }

    /// Result variable of a FUNCTION body.
    pub fn result(&self) -> Option<DeclId> {
        self.result
    }

    pub(crate) fn set_result(&mut self, id: DeclId) {
        self.result = Some(id);
    }

    /// True after a SAVE statement with no list.
    pub fn save_all(&self) -> bool {
        self.save_all
    }

    pub(crate) fn set_save_all(&mut self) {
        self.save_all = true;
    }

    fn structure_key(&self, name: &str) -> SmolStr {
        match self.decls.case_sensitive() {
            CaseSensitive::True => SmolStr::from(name),
            CaseSensitive::False => SmolStr::from(name.to_ascii_uppercase()),
        }
    }

    pub fn structure(&self, name: &str) -> Option<&StructureRef> {
        self.structures.get(&self.structure_key(name))
    }

    pub(crate) fn add_structure(&mut self, def: StructureRef) -> SemaResult<()> {
        let key = self.structure_key(def.def().name());
        if self.structures.contains_key(&key) {
            return Err(SemanticErrorKind::DuplicateName(def.def().name().into()).into());
        }
        self.structures.try_reserve(1)?;
        self.structures.insert(key, def);
        Ok(())
    }
}

impl Context {
    /// Create a scope with the default implicit rule of the context's options.
    pub fn create_scope(
        &mut self,
        kind: ScopeKind,
        name: Option<&str>,
        parent: Option<ScopeId>,
    ) -> SemaResult<ScopeId> {
        let implicit = if self.options().implicit_none {
            ImplicitRules::none()
        } else {
            ImplicitRules::standard(&mut self.types)
        };
        let scope = Scope::new(
            kind,
            name.map(SmolStr::from),
            parent,
            self.options().case_sensitive,
            implicit,
        );
        let id = ScopeId(self.scopes.len());
        self.scopes.try_reserve(1)?;
        self.scopes.push(Some(scope));
        debug!(scope = id.0, ?kind, name, "created scope");
        Ok(id)
    }

    /// Destroy a scope, every declaration it owns, and the bodies of the procedures
    /// it declares. Declarations it merely references stay valid.
    pub fn destroy_scope(&mut self, id: ScopeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let Some(scope) = self.scopes.get_mut(id.0).and_then(Option::take) else {
                continue;
            };
            self.commons.remove_scope(id);
            pending.extend(scope.decls.delete(&mut self.decls, &mut self.equivalences));
            debug!(scope = id.0, "destroyed scope");
        }
    }

    /// Find `name` in `scope` or, failing that, in its ancestors.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0)?.as_ref()?;
            if let Some(decl) = scope.decls.find(name) {
                return Some(decl);
            }
            current = scope.parent;
        }
        None
    }

    pub fn lookup_structure(&self, scope: ScopeId, name: &str) -> Option<StructureRef> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0)?.as_ref()?;
            if let Some(def) = scope.structure(name) {
                return Some(def.clone());
            }
            current = scope.parent;
        }
        None
    }

    /// Give the letters `start..=end` the implicit type `ty` in `scope`. Declarations
    /// already made implicitly and not yet used are retyped to match.
    pub fn set_implicit(
        &mut self,
        scope: ScopeId,
        start: char,
        end: char,
        ty: &TypeRef,
    ) -> SemaResult<()> {
        self.scope_mut(scope)?.implicit.set_range(start, end, ty)?;
        self.retype_implicit_decls(scope);
        Ok(())
    }

    /// `IMPLICIT NONE`.
    pub fn set_implicit_none(&mut self, scope: ScopeId) -> SemaResult<()> {
        self.scope_mut(scope)?.implicit = ImplicitRules::none();
        Ok(())
    }

    fn retype_implicit_decls(&mut self, scope: ScopeId) {
        let Some(scope) = self.scopes.get(scope.0).and_then(Option::as_ref) else {
            return;
        };
        let mut updates = Vec::new();
        for id in scope.decls.ids() {
            let decl = &self.decls[*id];
            if !decl.flags().contains(DeclFlags::IMPLICIT) || decl.is_used() || decl.is_procedure() {
                continue;
            }
            if let Some(ty) = scope.implicit.type_for(decl.name()) {
                if ty.data() != decl.get_type().data() {
                    updates.push((*id, ty.clone()));
                }
            }
        }
        for (id, elem) in updates {
            let old = self.decls[id].get_type().clone();
            let ty = self.types.with_element(&old, &elem);
            debug!(name = self.decls[id].name(), ty = %ty, "retyped by IMPLICIT");
            self.decls[id].set_type(ty);
        }
    }
}
