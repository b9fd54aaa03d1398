// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

//! Free-standing functions for assembling parse-tree fragments out of smaller
//! pieces.
//!
//! These are stupid constructors: every node gets an empty `TextRange`. A real
//! parser fills in ranges itself. Drivers and tests use these to feed the
//! analyzer without going through source text.

use crate::ast::{
    ArithOp, ArrayDim, ArraySpec, Attributes, BaseType, BinExpr, BinaryOp, CallArg, CallArgKind,
    ClistEntry, CmpOp, Decl, DeclStmt, DimBound, Expr, Init, LenSpec, Lhs, LhsArray, LhsMember,
    Literal, LiteralKind, LogicOp, Name, Ordering, ParenExpr, PrefixExpr, ProgramUnit, Stmt,
    StmtKind, TypeSpec, UnaryOp, UnitKind,
};
use rowan::TextRange;

fn no_range() -> TextRange {
    TextRange::default()
}

pub fn name(text: &str) -> Name {
    Name::new(text, no_range())
}

pub fn int(digits: &str) -> Expr {
    Expr::Literal(Literal {
        kind: LiteralKind::Integer {
            digits: digits.into(),
            kind: None,
        },
        range: no_range(),
    })
}

pub fn int_kind(digits: &str, kind: u32) -> Expr {
    Expr::Literal(Literal {
        kind: LiteralKind::Integer {
            digits: digits.into(),
            kind: Some(kind),
        },
        range: no_range(),
    })
}

pub fn real(text: &str) -> Expr {
    Expr::Literal(Literal {
        kind: LiteralKind::Real {
            text: text.into(),
            kind: None,
        },
        range: no_range(),
    })
}

pub fn complex(real: Expr, imag: Expr) -> Expr {
    Expr::Literal(Literal {
        kind: LiteralKind::Complex {
            real: Box::new(real),
            imag: Box::new(imag),
        },
        range: no_range(),
    })
}

pub fn logical(value: bool) -> Expr {
    Expr::Literal(Literal {
        kind: LiteralKind::Logical { value, kind: None },
        range: no_range(),
    })
}

pub fn character(text: &str) -> Expr {
    Expr::Literal(Literal {
        kind: LiteralKind::Character(text.to_string()),
        range: no_range(),
    })
}

pub fn lhs_var(text: &str) -> Lhs {
    Lhs::Variable(name(text))
}

pub fn var(text: &str) -> Expr {
    Expr::Lhs(lhs_var(text))
}

pub fn arg(expr: Expr) -> CallArg {
    CallArg {
        name: None,
        kind: CallArgKind::Expr(expr),
        range: no_range(),
    }
}

pub fn named_arg(keyword: &str, expr: Expr) -> CallArg {
    CallArg {
        name: Some(name(keyword)),
        kind: CallArgKind::Expr(expr),
        range: no_range(),
    }
}

pub fn alt_return(label: u32) -> CallArg {
    CallArg {
        name: None,
        kind: CallArgKind::Return(label),
        range: no_range(),
    }
}

/// `text(args...)`, an array element or a function reference.
pub fn lhs_index(text: &str, args: Vec<Expr>) -> Lhs {
    Lhs::Array(Box::new(LhsArray {
        parent: lhs_var(text),
        args: args.into_iter().map(arg).collect(),
        range: no_range(),
    }))
}

pub fn index(text: &str, args: Vec<Expr>) -> Expr {
    Expr::Lhs(lhs_index(text, args))
}

pub fn call(text: &str, args: Vec<CallArg>) -> Expr {
    Expr::Lhs(Lhs::Array(Box::new(LhsArray {
        parent: lhs_var(text),
        args,
        range: no_range(),
    })))
}

pub fn lhs_member(parent: Lhs, member: &str) -> Lhs {
    Lhs::Member(Box::new(LhsMember {
        parent,
        member: name(member),
        range: no_range(),
    }))
}

pub fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::BinExpr(Box::new(BinExpr {
        op,
        lhs,
        rhs,
        range: no_range(),
    }))
}

pub fn add(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinaryOp::ArithOp(ArithOp::Add), lhs, rhs)
}

pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinaryOp::ArithOp(ArithOp::Sub), lhs, rhs)
}

pub fn mul(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinaryOp::ArithOp(ArithOp::Mul), lhs, rhs)
}

pub fn div(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinaryOp::ArithOp(ArithOp::Div), lhs, rhs)
}

pub fn pow(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinaryOp::PowerOp, lhs, rhs)
}

pub fn concat(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinaryOp::ConcatenationOp, lhs, rhs)
}

pub fn and(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinaryOp::LogicOp(LogicOp::And), lhs, rhs)
}

pub fn or(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinaryOp::LogicOp(LogicOp::Or), lhs, rhs)
}

pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
    bin(BinaryOp::CmpOp(CmpOp::Eq { negated: false }), lhs, rhs)
}

pub fn lt(lhs: Expr, rhs: Expr) -> Expr {
    let op = CmpOp::Ord {
        ordering: Ordering::Less,
        strict: true,
    };
    bin(BinaryOp::CmpOp(op), lhs, rhs)
}

pub fn neg(expr: Expr) -> Expr {
    prefix(UnaryOp::Neg, expr)
}

pub fn not(expr: Expr) -> Expr {
    prefix(UnaryOp::Not, expr)
}

pub fn prefix(op: UnaryOp, expr: Expr) -> Expr {
    Expr::PrefixExpr(Box::new(PrefixExpr {
        op,
        expr,
        range: no_range(),
    }))
}

pub fn paren(expr: Expr) -> Expr {
    Expr::ParenExpr(Box::new(ParenExpr {
        expr,
        range: no_range(),
    }))
}

pub fn type_spec(base: BaseType) -> TypeSpec {
    TypeSpec {
        base,
        kind: None,
        len: None,
        star_len: None,
        attributes: Attributes::default(),
        range: no_range(),
    }
}

pub fn type_spec_kind(base: BaseType, kind: u32) -> TypeSpec {
    TypeSpec {
        kind: Some(int(&kind.to_string())),
        ..type_spec(base)
    }
}

pub fn character_spec(len: u32) -> TypeSpec {
    TypeSpec {
        len: Some(LenSpec::Expr(int(&len.to_string()))),
        ..type_spec(BaseType::Character)
    }
}

/// `(1:upper_1, 1:upper_2, ...)`
pub fn array_spec(uppers: &[i64]) -> ArraySpec {
    ArraySpec {
        dims: uppers
            .iter()
            .map(|upper| ArrayDim {
                lower: None,
                upper: DimBound::Expr(int(&upper.to_string())),
            })
            .collect(),
        range: no_range(),
    }
}

pub fn bounds_spec(bounds: &[(i64, i64)]) -> ArraySpec {
    let signed = |value: i64| {
        if value < 0 {
            neg(int(&value.unsigned_abs().to_string()))
        } else {
            int(&value.to_string())
        }
    };
    ArraySpec {
        dims: bounds
            .iter()
            .map(|(lower, upper)| ArrayDim {
                lower: Some(signed(*lower)),
                upper: DimBound::Expr(signed(*upper)),
            })
            .collect(),
        range: no_range(),
    }
}

pub fn decl(text: &str) -> Decl {
    Decl {
        name: name(text),
        dims: None,
        star_len: None,
        init: None,
        range: no_range(),
    }
}

pub fn decl_array(text: &str, dims: ArraySpec) -> Decl {
    Decl {
        dims: Some(dims),
        ..decl(text)
    }
}

pub fn decl_init(text: &str, init: Expr) -> Decl {
    Decl {
        init: Some(Init::Expr(init)),
        ..decl(text)
    }
}

pub fn clist(values: Vec<(Option<u32>, Expr)>) -> Init {
    Init::Clist(
        values
            .into_iter()
            .map(|(repeat, value)| ClistEntry { repeat, value })
            .collect(),
    )
}

pub fn decl_stmt(ty: TypeSpec, decls: Vec<Decl>) -> DeclStmt {
    DeclStmt { ty, decls }
}

pub fn stmt(kind: StmtKind) -> Stmt {
    Stmt {
        label: None,
        kind,
        range: no_range(),
    }
}

pub fn labeled(label: u32, kind: StmtKind) -> Stmt {
    Stmt {
        label: Some(label),
        kind,
        range: no_range(),
    }
}

pub fn assign(lhs: Lhs, rhs: Expr) -> Stmt {
    stmt(StmtKind::Assignment { lhs, rhs })
}

pub fn unit(kind: UnitKind, unit_name: Option<&str>, body: Vec<Stmt>) -> ProgramUnit {
    ProgramUnit {
        kind,
        name: unit_name.map(name),
        args: Vec::new(),
        body,
        range: no_range(),
    }
}
