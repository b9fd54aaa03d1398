// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

//! Parse-tree node definitions.

mod decl;
mod expr;
pub mod make;
mod operators;
mod stmt;

pub use decl::{
    ArrayDim, ArraySpec, Attributes, BaseType, ClistEntry, CommonGroup, DataEntry, Decl,
    DeclStmt, DimBound, DimensionEntity, ImplicitRule, ImplicitStmt, Init, LenSpec,
    LetterRange, ParameterAssign, StructureDef, TypeSpec,
};
pub use expr::{
    BinExpr, CallArg, CallArgKind, Expr, Lhs, LhsArray, LhsMember, Literal, LiteralKind, Name,
    ParenExpr, PrefixExpr,
};
pub use operators::{ArithOp, BinaryOp, CmpOp, LogicOp, Ordering, UnaryOp};
pub use stmt::{DummyArg, ProgramUnit, SourceFile, Stmt, StmtKind, UnitKind};
