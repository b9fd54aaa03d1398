// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

//! Data-less enums for unary and binary operators.
//!
//! Types here don't know about the tree, so the typed expressions of the
//! semantic crate reuse them.
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `.NOT.`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    LogicOp(LogicOp),
    ArithOp(ArithOp),
    CmpOp(CmpOp),
    ConcatenationOp,
    PowerOp,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogicOp {
    And,
    Or,
    Eqv,
    Neqv,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq { negated: bool },
    Ord { ordering: Ordering, strict: bool },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ordering {
    Less,
    Greater,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Mul,
    Sub,
    Div,
}

impl BinaryOp {
    /// Binding strength, higher binds tighter. Used when regenerating source.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::PowerOp => 9,
            BinaryOp::ArithOp(ArithOp::Mul | ArithOp::Div) => 8,
            BinaryOp::ArithOp(ArithOp::Add | ArithOp::Sub) => 7,
            BinaryOp::ConcatenationOp => 6,
            BinaryOp::CmpOp(_) => 5,
            BinaryOp::LogicOp(LogicOp::And) => 3,
            BinaryOp::LogicOp(LogicOp::Or) => 2,
            BinaryOp::LogicOp(LogicOp::Eqv | LogicOp::Neqv) => 1,
        }
    }

    pub fn is_relational(&self) -> bool {
        matches!(self, BinaryOp::CmpOp(_))
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LogicOp(_))
    }
}

impl UnaryOp {
    pub fn precedence(&self) -> u8 {
        match self {
            UnaryOp::Not => 4,
            UnaryOp::Neg | UnaryOp::Plus => 7,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let res = match self {
            UnaryOp::Not => ".NOT.",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
        };
        f.write_str(res)
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let res = match self {
            LogicOp::And => ".AND.",
            LogicOp::Or => ".OR.",
            LogicOp::Eqv => ".EQV.",
            LogicOp::Neqv => ".NEQV.",
        };
        f.write_str(res)
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let res = match self {
            ArithOp::Add => "+",
            ArithOp::Mul => "*",
            ArithOp::Sub => "-",
            ArithOp::Div => "/",
        };
        f.write_str(res)
    }
}

// FORTRAN 77 spellings. The F90 symbolic forms (`==`, `/=`, ...) parse to the same ops.
impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let res = match self {
            CmpOp::Eq { negated: false } => ".EQ.",
            CmpOp::Eq { negated: true } => ".NE.",
            CmpOp::Ord {
                ordering: Ordering::Less,
                strict: false,
            } => ".LE.",
            CmpOp::Ord {
                ordering: Ordering::Less,
                strict: true,
            } => ".LT.",
            CmpOp::Ord {
                ordering: Ordering::Greater,
                strict: false,
            } => ".GE.",
            CmpOp::Ord {
                ordering: Ordering::Greater,
                strict: true,
            } => ".GT.",
        };
        f.write_str(res)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::LogicOp(op) => fmt::Display::fmt(op, f),
            BinaryOp::ArithOp(op) => fmt::Display::fmt(op, f),
            BinaryOp::CmpOp(op) => fmt::Display::fmt(op, f),
            BinaryOp::ConcatenationOp => fmt::Display::fmt("//", f),
            BinaryOp::PowerOp => fmt::Display::fmt("**", f),
        }
    }
}
