// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

use ofc_source_file::{DiagnosticList, DiagnosticSink};

use crate::common::CommonBlocks;
use crate::decl::{DeclArena, DeclId, Declaration};
use crate::equiv::EquivalenceGroups;
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::semantic_error::{SemaResult, SemanticErrorKind};
use crate::types::{CaseSensitive, TypeInterner};
use crate::TextRange;

/// Language options, fixed for the lifetime of a `Context`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LangOptions {
    /// Applies to every symbol table the context creates.
    pub case_sensitive: CaseSensitive,
    /// New scopes start with no implicit typing.
    pub implicit_none: bool,
    /// Procedure bodies see the declarations of the unit that declares them.
    pub host_association: bool,
    /// Warn on implicit conversions that may lose information.
    pub warn_lossy_casts: bool,
    /// Size of a POINTER in bytes.
    pub pointer_size: u32,
}

impl Default for LangOptions {
    fn default() -> Self {
        LangOptions {
            case_sensitive: CaseSensitive::False,
            implicit_none: false,
            host_association: false,
            warn_lossy_casts: true,
            pointer_size: 8,
        }
    }
}

impl LangOptions {
    pub fn new() -> LangOptions {
        LangOptions::default()
    }

    pub fn case_sensitive(self, case_sensitive: bool) -> LangOptions {
        LangOptions {
            case_sensitive: CaseSensitive::from(case_sensitive),
            ..self
        }
    }

    pub fn implicit_none(self, implicit_none: bool) -> LangOptions {
        LangOptions {
            implicit_none,
            ..self
        }
    }

    pub fn host_association(self, host_association: bool) -> LangOptions {
        LangOptions {
            host_association,
            ..self
        }
    }

    pub fn warn_lossy_casts(self, warn_lossy_casts: bool) -> LangOptions {
        LangOptions {
            warn_lossy_casts,
            ..self
        }
    }

    pub fn pointer_size(self, pointer_size: u32) -> LangOptions {
        LangOptions {
            pointer_size,
            ..self
        }
    }
}

/// Everything the analysis of one source file creates: types, declarations, scopes,
/// equivalence groups, COMMON blocks and warnings.
#[derive(Debug)]
pub struct Context {
    options: LangOptions,
    pub types: TypeInterner,
    pub(crate) decls: DeclArena,
    pub(crate) scopes: Vec<Option<Scope>>,
    pub(crate) equivalences: EquivalenceGroups,
    pub(crate) commons: CommonBlocks,
    diagnostics: DiagnosticList,
    global: ScopeId,
}

impl Context {
    pub fn new(options: LangOptions) -> SemaResult<Context> {
        let commons = CommonBlocks::new(options.case_sensitive);
        let mut context = Context {
            options,
            types: TypeInterner::new(),
            decls: DeclArena::new(),
            scopes: Vec::new(),
            equivalences: EquivalenceGroups::new(),
            commons,
            diagnostics: DiagnosticList::new(),
            global: Default::default(),
        };
        context.global = context.create_scope(ScopeKind::Global, None, None)?;
        Ok(context)
    }

    pub fn options(&self) -> &LangOptions {
        &self.options
    }

    /// The scope holding the external procedures of the file.
    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    fn no_scope(id: ScopeId) -> SemanticErrorKind {
        SemanticErrorKind::InvalidDeclaration(format!("scope {} was destroyed", usize::from(id)))
    }

    pub fn scope(&self, id: ScopeId) -> SemaResult<&Scope> {
        self.scopes
            .get(usize::from(id))
            .and_then(Option::as_ref)
            .ok_or_else(|| Context::no_scope(id).into())
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> SemaResult<&mut Scope> {
        self.scopes
            .get_mut(usize::from(id))
            .and_then(Option::as_mut)
            .ok_or_else(|| Context::no_scope(id).into())
    }

    /// A scope together with the declaration storage, for adding to its table.
    pub(crate) fn scope_and_decls(&mut self, id: ScopeId) -> SemaResult<(&mut Scope, &mut DeclArena)> {
        let scope = self
            .scopes
            .get_mut(usize::from(id))
            .and_then(Option::as_mut)
            .ok_or_else(|| Context::no_scope(id))?;
        Ok((scope, &mut self.decls))
    }

    pub fn decl(&self, id: DeclId) -> SemaResult<&Declaration> {
        self.decls.get(id).ok_or_else(|| {
            SemanticErrorKind::InvalidDeclaration(format!(
                "declaration {} was destroyed",
                usize::from(id)
            ))
            .into()
        })
    }

    pub fn decls(&self) -> &DeclArena {
        &self.decls
    }

    pub fn equivalences(&self) -> &EquivalenceGroups {
        &self.equivalences
    }

    pub fn commons(&self) -> &CommonBlocks {
        &self.commons
    }

    /// Find `name` among the declarations of `scope` only.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        self.scope(scope).ok()?.decls().find(name)
    }

    pub fn diagnostics(&self) -> &DiagnosticList {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticList {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn warning<T: ToString>(&mut self, range: TextRange, message: T) -> bool {
        self.diagnostics.warning(range, message)
    }
}
