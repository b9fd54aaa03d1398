// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// Specification statements: type declarations and the statements that amend them.

use crate::ast::expr::{Expr, Lhs, Name};
use rowan::TextRange;

#[derive(Clone, Debug, PartialEq)]
pub enum BaseType {
    Logical,
    Integer,
    Real,
    DoublePrecision,
    Complex,
    DoubleComplex,
    Byte,
    Character,
    /// `TYPE(name)` or a DEC `RECORD /name/`.
    Type(Name),
}

/// A length or star-kind selector: `*8`, `*(N+1)`, `*(*)`.
#[derive(Clone, Debug, PartialEq)]
pub enum LenSpec {
    Expr(Expr),
    Star,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DimBound {
    Expr(Expr),
    /// Assumed size, only legal as the last upper bound.
    Star,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayDim {
    /// Defaults to 1 when absent.
    pub lower: Option<Expr>,
    pub upper: DimBound,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArraySpec {
    pub dims: Vec<ArrayDim>,
    pub range: TextRange,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes {
    pub is_static: bool,
    pub is_automatic: bool,
    pub is_volatile: bool,
    pub is_external: bool,
    pub is_intrinsic: bool,
    pub is_target: bool,
    pub is_parameter: bool,
    /// `DIMENSION(...)` attribute, applying to every entity of the statement.
    pub dimension: Option<ArraySpec>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeSpec {
    pub base: BaseType,
    /// `KIND=` selector, e.g. `INTEGER(KIND=8)` or `INTEGER(8)`.
    pub kind: Option<Expr>,
    /// `LEN=` selector of CHARACTER.
    pub len: Option<LenSpec>,
    /// Legacy `*N` suffix on the type keyword.
    pub star_len: Option<LenSpec>,
    pub attributes: Attributes,
    pub range: TextRange,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClistEntry {
    /// `3*0` repeats the value three times.
    pub repeat: Option<u32>,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Init {
    /// `= expr`
    Expr(Expr),
    /// `/1, 2, 3*0/`
    Clist(Vec<ClistEntry>),
}

/// One entity of a declaration statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Decl {
    pub name: Name,
    pub dims: Option<ArraySpec>,
    /// Per-entity `*N` override, e.g. `CHARACTER A*5`.
    pub star_len: Option<LenSpec>,
    pub init: Option<Init>,
    pub range: TextRange,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeclStmt {
    pub ty: TypeSpec,
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LetterRange {
    pub start: char,
    pub end: char,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImplicitRule {
    pub ty: TypeSpec,
    pub letters: Vec<LetterRange>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ImplicitStmt {
    None,
    Rules(Vec<ImplicitRule>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DimensionEntity {
    pub name: Name,
    pub dims: ArraySpec,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommonGroup {
    /// `None` is blank common.
    pub group: Option<Name>,
    pub names: Vec<Lhs>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterAssign {
    pub name: Name,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataEntry {
    pub targets: Vec<Lhs>,
    pub values: Vec<ClistEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructureDef {
    pub name: Name,
    pub members: Vec<DeclStmt>,
    pub range: TextRange,
}
