// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

use crate::ast::operators::{BinaryOp, UnaryOp};
use rowan::TextRange;
use smol_str::SmolStr;

/// An identifier exactly as spelled in the source. Case folding, if any, is the
/// business of the symbol table that looks it up.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name {
    pub text: SmolStr,
    pub range: TextRange,
}

impl Name {
    pub fn new<T: Into<SmolStr>>(text: T, range: TextRange) -> Name {
        Name {
            text: text.into(),
            range,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralKind {
    /// Digits only. The sign of a negative literal is a separate `PrefixExpr`.
    Integer { digits: SmolStr, kind: Option<u32> },
    /// Source text of a real literal, e.g. `1.5`, `2E10`, `1.0D0`.
    /// A `D` exponent makes it DOUBLE PRECISION.
    Real { text: SmolStr, kind: Option<u32> },
    /// `(re, im)`. Each part is a possibly-signed integer or real literal.
    Complex { real: Box<Expr>, imag: Box<Expr> },
    Logical { value: bool, kind: Option<u32> },
    Character(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub range: TextRange,
}

/// A reference to storage, or something that looks like one: `F(X)` is either an
/// array element or a function call and only the symbol table can tell which.
#[derive(Clone, Debug, PartialEq)]
pub enum Lhs {
    Variable(Name),
    Array(Box<LhsArray>),
    Member(Box<LhsMember>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LhsArray {
    pub parent: Lhs,
    pub args: Vec<CallArg>,
    pub range: TextRange,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LhsMember {
    pub parent: Lhs,
    pub member: Name,
    pub range: TextRange,
}

impl Lhs {
    pub fn range(&self) -> TextRange {
        match self {
            Lhs::Variable(name) => name.range,
            Lhs::Array(array) => array.range,
            Lhs::Member(member) => member.range,
        }
    }

    /// The variable at the root of the reference, `A` in `A(1)%B`.
    pub fn base_name(&self) -> &Name {
        match self {
            Lhs::Variable(name) => name,
            Lhs::Array(array) => array.parent.base_name(),
            Lhs::Member(member) => member.parent.base_name(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CallArgKind {
    Expr(Expr),
    /// `*10` or `&10`: alternate return to label 10.
    Return(u32),
    /// A bare `*`, as in the dummy argument list of a subroutine.
    Asterisk,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CallArg {
    /// Keyword for `NAME=expr` arguments.
    pub name: Option<Name>,
    pub kind: CallArgKind,
    pub range: TextRange,
}

impl CallArg {
    pub fn expr(&self) -> Option<&Expr> {
        match &self.kind {
            CallArgKind::Expr(expr) => Some(expr),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Lhs(Lhs),
    BinExpr(Box<BinExpr>),
    PrefixExpr(Box<PrefixExpr>),
    ParenExpr(Box<ParenExpr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinExpr {
    pub op: BinaryOp,
    pub lhs: Expr,
    pub rhs: Expr,
    pub range: TextRange,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrefixExpr {
    pub op: UnaryOp,
    pub expr: Expr,
    pub range: TextRange,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParenExpr {
    pub expr: Expr,
    pub range: TextRange,
}

impl Expr {
    pub fn range(&self) -> TextRange {
        match self {
            Expr::Literal(literal) => literal.range,
            Expr::Lhs(lhs) => lhs.range(),
            Expr::BinExpr(bin_expr) => bin_expr.range,
            Expr::PrefixExpr(prefix_expr) => prefix_expr.range,
            Expr::ParenExpr(paren_expr) => paren_expr.range,
        }
    }
}
