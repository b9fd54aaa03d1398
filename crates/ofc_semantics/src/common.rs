// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// COMMON blocks. Each program unit that names a block contributes a layout: a
// reference list of its own declarations in the order they appear. Storage is
// associated by position across layouts.

use smol_str::SmolStr;
use tracing::debug;

use crate::context::Context;
use crate::decl::{DeclId, DeclList};
use crate::scope::ScopeId;
use crate::semantic_error::{SemaResult, SemanticError, SemanticErrorKind};
use crate::types::CaseSensitive;
use crate::TextRange;

#[derive(Clone, Debug)]
pub struct CommonLayout {
    scope: ScopeId,
    members: DeclList,
}

impl CommonLayout {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn members(&self) -> &DeclList {
        &self.members
    }
}

#[derive(Clone, Debug)]
pub struct CommonBlock {
    name: SmolStr,
    layouts: Vec<CommonLayout>,
}

impl CommonBlock {
    /// `""` is blank common.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layouts(&self) -> &[CommonLayout] {
        &self.layouts
    }

    pub fn layout(&self, scope: ScopeId) -> Option<&CommonLayout> {
        self.layouts.iter().find(|l| l.scope == scope)
    }
}

#[derive(Clone, Debug)]
pub struct CommonBlocks {
    case: CaseSensitive,
    blocks: Vec<CommonBlock>,
}

impl CommonBlocks {
    pub fn new(case: CaseSensitive) -> CommonBlocks {
        CommonBlocks {
            case,
            blocks: Vec::new(),
        }
    }

    fn same_name(&self, a: &str, b: &str) -> bool {
        match self.case {
            CaseSensitive::True => a == b,
            CaseSensitive::False => a.eq_ignore_ascii_case(b),
        }
    }

    pub fn find(&self, name: &str) -> Option<&CommonBlock> {
        self.blocks.iter().find(|b| self.same_name(&b.name, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommonBlock> {
        self.blocks.iter()
    }

    fn layout_mut(&mut self, name: &str, scope: ScopeId) -> SemaResult<&mut CommonLayout> {
        let index = match self.blocks.iter().position(|b| self.same_name(&b.name, name)) {
            Some(index) => index,
            None => {
                self.blocks.try_reserve(1)?;
                self.blocks.push(CommonBlock {
                    name: name.into(),
                    layouts: Vec::new(),
                });
                self.blocks.len() - 1
            }
        };
        let case = self.case;
        let block = &mut self.blocks[index];
        let layout = match block.layouts.iter().position(|l| l.scope == scope) {
            Some(layout) => layout,
            None => {
                block.layouts.try_reserve(1)?;
                block.layouts.push(CommonLayout {
                    scope,
                    members: DeclList::new_ref(case),
                });
                block.layouts.len() - 1
            }
        };
        Ok(&mut block.layouts[layout])
    }

    /// Drop the layouts contributed by `scope`, and any block left without layouts.
    pub(crate) fn remove_scope(&mut self, scope: ScopeId) {
        for block in &mut self.blocks {
            block.layouts.retain(|l| l.scope != scope);
        }
        self.blocks.retain(|b| !b.layouts.is_empty());
    }
}

impl Context {
    /// Append `decl`, declared in `scope`, to COMMON block `block` (`""` for blank
    /// common). A declaration may be in at most one block, once.
    pub fn common_add(
        &mut self,
        scope: ScopeId,
        block: &str,
        decl: DeclId,
        range: TextRange,
    ) -> SemaResult<()> {
        let d = self.decl(decl)?;
        let invalid = |detail: String| {
            SemanticError::new(SemanticErrorKind::InvalidDeclaration(detail), range)
        };
        if d.is_dummy() || d.is_parameter() || d.is_procedure() {
            return Err(invalid(format!("`{}` cannot be in COMMON", d.name())));
        }
        if let Some(existing) = d.common_block() {
            return Err(invalid(format!(
                "`{}` is already in COMMON /{existing}/",
                d.name()
            )));
        }
        let layout = self.commons.layout_mut(block, scope)?;
        layout
            .members
            .add_ref(&self.decls, decl)
            .map_err(|e| e.or_range(range))?;
        let name = self.decls[decl].name().to_string();
        self.decls[decl].set_common(block.into());
        debug!(name, block, "added to COMMON");
        Ok(())
    }

    pub fn common_block(&self, name: &str) -> Option<&CommonBlock> {
        self.commons.find(name)
    }
}
