// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

use crate::ast::decl::{
    CommonGroup, DataEntry, DeclStmt, DimensionEntity, ImplicitStmt, ParameterAssign,
    StructureDef, TypeSpec,
};
use crate::ast::expr::{CallArg, Expr, Lhs, Name};
use rowan::TextRange;

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    // Specification statements
    Decl(DeclStmt),
    Implicit(ImplicitStmt),
    Dimension(Vec<DimensionEntity>),
    /// Each inner list is one parenthesized equivalence set.
    Equivalence(Vec<Vec<Lhs>>),
    Common(Vec<CommonGroup>),
    Parameter(Vec<ParameterAssign>),
    Data(Vec<DataEntry>),
    External(Vec<Name>),
    Intrinsic(Vec<Name>),
    /// An empty list saves every local variable.
    Save(Vec<Name>),
    Structure(StructureDef),

    // Executable statements
    Assignment { lhs: Lhs, rhs: Expr },
    Call { name: Name, args: Vec<CallArg> },
    /// Logical IF, `IF (cond) stmt`.
    If { cond: Expr, then: Box<Stmt> },
    Continue,
    GoTo(u32),
    Return(Option<Expr>),
    Stop(Option<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub label: Option<u32>,
    pub kind: StmtKind,
    pub range: TextRange,
}

impl Stmt {
    pub fn is_executable(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::Assignment { .. }
                | StmtKind::Call { .. }
                | StmtKind::If { .. }
                | StmtKind::Continue
                | StmtKind::GoTo(_)
                | StmtKind::Return(_)
                | StmtKind::Stop(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum UnitKind {
    Program,
    Subroutine,
    /// The optional prefix type, `REAL FUNCTION F(X)`.
    Function(Option<TypeSpec>),
    BlockData,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DummyArg {
    Name(Name),
    /// Alternate return placeholder in a SUBROUTINE argument list.
    Asterisk(TextRange),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgramUnit {
    pub kind: UnitKind,
    pub name: Option<Name>,
    pub args: Vec<DummyArg>,
    pub body: Vec<Stmt>,
    pub range: TextRange,
}

/// Everything the parser produced for one source file, in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceFile {
    pub units: Vec<ProgramUnit>,
}

impl SourceFile {
    pub fn units(&self) -> &[ProgramUnit] {
        &self.units
    }
}
