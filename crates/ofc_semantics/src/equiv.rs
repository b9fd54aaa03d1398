// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// EQUIVALENCE groups: sets of declarations that share storage.
//
// Groups live in a registry indexed by `GroupId`. A declaration refers to its group
// by id and the group lists its members, so both directions must be updated
// together. Every mutation of a group goes through `EquivalenceGroups`, and no
// member is ever listed in two live groups.

use tracing::debug;

use crate::decl::{DeclArena, DeclId};
use crate::semantic_error::{SemaResult, SemanticErrorKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

impl From<GroupId> for usize {
    fn from(id: GroupId) -> usize {
        id.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EquivalenceGroup {
    members: Vec<DeclId>,
}

impl EquivalenceGroup {
    pub fn members(&self) -> &[DeclId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: DeclId) -> bool {
        self.members.contains(&id)
    }
}

#[derive(Clone, Debug, Default)]
pub struct EquivalenceGroups {
    groups: Vec<Option<EquivalenceGroup>>,
}

fn stale(id: DeclId) -> SemanticErrorKind {
    SemanticErrorKind::InvalidDeclaration(format!("declaration {} no longer exists", usize::from(id)))
}

impl EquivalenceGroups {
    pub fn new() -> EquivalenceGroups {
        EquivalenceGroups::default()
    }

    pub fn group(&self, id: GroupId) -> Option<&EquivalenceGroup> {
        self.groups.get(id.0).and_then(Option::as_ref)
    }

    /// The group containing `decl`, if any.
    pub fn find(&self, decls: &DeclArena, decl: DeclId) -> Option<GroupId> {
        decls.get(decl).and_then(|d| d.equivalence_group())
    }

    /// Number of live groups.
    pub fn len(&self) -> usize {
        self.groups.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &EquivalenceGroup)> {
        self.groups
            .iter()
            .enumerate()
            .filter_map(|(i, g)| g.as_ref().map(|g| (GroupId(i), g)))
    }

    fn group_mut(&mut self, id: GroupId) -> &mut EquivalenceGroup {
        // Ids held by declarations always name live groups; see `remove`.
        self.groups[id.0]
            .as_mut()
            .expect("declaration refers to a deleted equivalence group")
    }

    /// Put `a` and `b` in the same group. Merging two members of one group is a
    /// no-op, and so is equivalencing a declaration with itself.
    pub fn merge(&mut self, decls: &mut DeclArena, a: DeclId, b: DeclId) -> SemaResult<()> {
        let ga = decls.get(a).ok_or_else(|| stale(a))?.equivalence_group();
        let gb = decls.get(b).ok_or_else(|| stale(b))?.equivalence_group();
        match (ga, gb) {
            (None, None) => {
                if a == b {
                    return Ok(());
                }
                self.groups.try_reserve(1)?;
                let mut members = Vec::new();
                members.try_reserve(2)?;
                members.extend([a, b]);
                let id = GroupId(self.groups.len());
                self.groups.push(Some(EquivalenceGroup { members }));
                decls[a].set_equivalence_group(Some(id));
                decls[b].set_equivalence_group(Some(id));
                debug!(group = id.0, "new equivalence group");
            }
            (Some(id), None) | (None, Some(id)) => {
                let joining = if ga.is_some() { b } else { a };
                let group = self.group_mut(id);
                group.members.try_reserve(1)?;
                group.members.push(joining);
                decls[joining].set_equivalence_group(Some(id));
                debug!(group = id.0, "joined equivalence group");
            }
            (Some(g1), Some(g2)) if g1 == g2 => {}
            (Some(g1), Some(g2)) => {
                let (survivor, absorbed) = (g1.min(g2), g1.max(g2));
                let incoming = self.group_mut(absorbed).len();
                self.group_mut(survivor).members.try_reserve(incoming)?;
                let moved = self.groups[absorbed.0]
                    .take()
                    .map(|g| g.members)
                    .unwrap_or_default();
                for member in &moved {
                    decls[*member].set_equivalence_group(Some(survivor));
                }
                self.group_mut(survivor).members.extend(moved);
                debug!(
                    survivor = survivor.0,
                    absorbed = absorbed.0,
                    "merged equivalence groups"
                );
            }
        }
        Ok(())
    }

    /// Take `decl` out of its group. A group left with one member is dissolved and
    /// a group left empty is deleted.
    pub fn remove(&mut self, decls: &mut DeclArena, decl: DeclId) {
        let Some(id) = decls.get_mut(decl).and_then(|d| d.take_equivalence_group()) else {
            return;
        };
        let group = self.group_mut(id);
        group.members.retain(|m| *m != decl);
        match group.members.as_slice() {
            [] => {
                self.groups[id.0] = None;
                debug!(group = id.0, "deleted empty equivalence group");
            }
            [last] => {
                let last = *last;
                if let Some(d) = decls.get_mut(last) {
                    d.set_equivalence_group(None);
                }
                self.groups[id.0] = None;
                debug!(group = id.0, "dissolved equivalence group");
            }
            _ => {}
        }
    }
}
