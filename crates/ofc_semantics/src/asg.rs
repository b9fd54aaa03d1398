// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// The definition of the abstract semantic graph (ASG) as well as the API for using it.
// Construction of this typed ASG from the parse tree is in syntax_to_semantics.rs and
// expr_resolver.rs.
//
// Names are held as `DeclId`s into the `Context` that built the tree, so printing an
// expression needs that context.

use ofc_syntax::ast::{BinaryOp, UnaryOp};
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::context::Context;
use crate::decl::DeclId;
use crate::intrinsics::Intrinsic;
use crate::scope::{ScopeId, ScopeKind};
use crate::semantic_error::{SemaResult, SemanticErrorKind};
use crate::types::TypeRef;
use crate::typeval::{fold_binary, fold_unary, TypedValue};
use crate::TextRange;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    units: Vec<ProgramUnit>,
}

impl Program {
    pub fn new() -> Program {
        Program { units: Vec::new() }
    }

    pub fn units(&self) -> &[ProgramUnit] {
        &self.units
    }

    pub fn insert_unit(&mut self, unit: ProgramUnit) {
        self.units.push(unit);
    }

    /// Print the ASG using the pretty print `Debug` trait.
    pub fn print_asg_debug_pretty(&self) {
        for unit in self.units.iter() {
            println!("{unit:#?}");
        }
    }
}

// One way to forward methods for Iterator to Program units.
impl std::ops::Deref for Program {
    type Target = Vec<ProgramUnit>;

    fn deref(&self) -> &Self::Target {
        &self.units
    }
}

/// The executable part of one PROGRAM, SUBROUTINE, FUNCTION or BLOCK DATA. The
/// declarations live in the unit's scope.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramUnit {
    kind: ScopeKind,
    name: Option<SmolStr>,
    scope: ScopeId,
    stmts: Vec<LabeledStmt>,
}

impl ProgramUnit {
    pub fn new(kind: ScopeKind, name: Option<SmolStr>, scope: ScopeId) -> ProgramUnit {
        ProgramUnit {
            kind,
            name,
            scope,
            stmts: Vec::new(),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn stmts(&self) -> &[LabeledStmt] {
        &self.stmts
    }

    pub fn insert_stmt(&mut self, stmt: LabeledStmt) {
        self.stmts.push(stmt);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabeledStmt {
    label: Option<u32>,
    stmt: Stmt,
    range: TextRange,
}

impl LabeledStmt {
    pub fn new(label: Option<u32>, stmt: Stmt, range: TextRange) -> LabeledStmt {
        LabeledStmt { label, stmt, range }
    }

    pub fn label(&self) -> Option<u32> {
        self.label
    }

    pub fn stmt(&self) -> &Stmt {
        &self.stmt
    }

    pub fn range(&self) -> TextRange {
        self.range
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Assignment(Assignment),
    Call(CallStmt),
    If(Box<If>),
    Continue,
    GoTo(u32),
    /// The optional expression selects an alternate return.
    Return(Option<TExpr>),
    Stop(Option<TExpr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    lvalue: TExpr,
    rvalue: TExpr,
}

impl Assignment {
    /// `rvalue` must already be converted for storage in `lvalue`.
    pub fn new(lvalue: TExpr, rvalue: TExpr) -> Assignment {
        Assignment { lvalue, rvalue }
    }

    pub fn lvalue(&self) -> &TExpr {
        &self.lvalue
    }

    pub fn rvalue(&self) -> &TExpr {
        &self.rvalue
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::Assignment(self)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CallStmt {
    decl: DeclId,
    args: Vec<CallArgument>,
}

impl CallStmt {
    pub fn new(decl: DeclId, args: Vec<CallArgument>) -> CallStmt {
        CallStmt { decl, args }
    }

    pub fn decl(&self) -> DeclId {
        self.decl
    }

    pub fn args(&self) -> &[CallArgument] {
        &self.args
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::Call(self)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct If {
    condition: TExpr,
    then: LabeledStmt,
}

impl If {
    pub fn new(condition: TExpr, then: LabeledStmt) -> If {
        If { condition, then }
    }

    pub fn condition(&self) -> &TExpr {
        &self.condition
    }

    pub fn then_branch(&self) -> &LabeledStmt {
        &self.then
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::If(Box::new(self))
    }
}

// Variants have the form XXX(XXX)
// The outer name XXX is the name of the variant
// The inner name XXX is the name of the struct expressing the structure of the expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    Constant(TypedValue),
    Lhs(LValue),
    /// Conversion of the operand to the type of the node.
    Cast(Box<TExpr>),
    Intrinsic(IntrinsicCall),
    Function(FunctionCall),
    /// `*label`, only as an argument of CALL.
    AltReturn(u32),
    Binary(Box<BinaryExpr>),
    Unary(Box<UnaryExpr>),
}

/// Typed expression implemented by tagging an `Expr` with a `Type`.
///
/// Besides the type, a node records whether it was written in parentheses, which
/// matters only when printing, and the value of the subtree when it could be folded
/// while the tree was built.
///
/// Two nodes are equal when both fold to the same constant, or when they have the
/// same type and structurally equal expressions. Parentheses and source ranges are
/// ignored.
#[derive(Clone, Debug)]
pub struct TExpr {
    expression: Expr,
    ty: TypeRef,
    brackets: bool,
    constant: Option<TypedValue>,
    range: TextRange,
}

impl TExpr {
    pub(crate) fn new(expression: Expr, ty: TypeRef, range: TextRange) -> TExpr {
        TExpr {
            expression,
            ty,
            brackets: false,
            constant: None,
            range,
        }
    }

    pub fn constant(value: TypedValue, range: TextRange) -> TExpr {
        let ty = value.get_type().clone();
        TExpr {
            expression: Expr::Constant(value.clone()),
            ty,
            brackets: false,
            constant: Some(value),
            range,
        }
    }

    pub fn get_type(&self) -> &TypeRef {
        &self.ty
    }

    pub fn expression(&self) -> &Expr {
        &self.expression
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn is_bracketed(&self) -> bool {
        self.brackets
    }

    pub fn set_bracketed(&mut self) {
        self.brackets = true;
    }

    /// The value cached when the tree was built, if the subtree folded.
    pub fn constant_value(&self) -> Option<&TypedValue> {
        self.constant.as_ref()
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }

    pub(crate) fn set_constant(&mut self, value: TypedValue) {
        self.constant = Some(value);
    }

    /// The lvalue this node refers to, if it is a reference to storage.
    pub fn lvalue(&self) -> Option<&LValue> {
        match &self.expression {
            Expr::Lhs(lvalue) => Some(lvalue),
            _ => None,
        }
    }

    /// Reduce the tree to a single value. Fails with `NotConstant` if any leaf is a
    /// run-time value, and with `DivideByZero` or `Overflow` if an operation cannot
    /// be carried out in the type of its node.
    pub fn resolve(&self) -> SemaResult<TypedValue> {
        if let Some(value) = &self.constant {
            return Ok(value.clone());
        }
        self.evaluate().map_err(|e| e.or_range(self.range))
    }

    fn evaluate(&self) -> SemaResult<TypedValue> {
        match &self.expression {
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Cast(operand) => operand.resolve()?.cast(&self.ty),
            Expr::Binary(binary) => {
                let left = binary.left.resolve()?;
                let right = binary.right.resolve()?;
                fold_binary(binary.op, &left, &right, &self.ty)
            }
            Expr::Unary(unary) => fold_unary(unary.op, &unary.operand.resolve()?, &self.ty),
            Expr::Intrinsic(call) => {
                let args = call
                    .args
                    .iter()
                    .map(TExpr::resolve)
                    .collect::<SemaResult<Vec<_>>>()?;
                call.intrinsic.fold(&args, &self.ty)
            }
            Expr::Lhs(_) | Expr::Function(_) | Expr::AltReturn(_) => {
                Err(SemanticErrorKind::NotConstant.into())
            }
        }
    }

    /// An adapter that prints the expression as Fortran source.
    pub fn display<'a>(&'a self, context: &'a Context) -> ExprDisplay<'a> {
        ExprDisplay {
            expr: self,
            context,
        }
    }
}

impl PartialEq for TExpr {
    fn eq(&self, other: &Self) -> bool {
        match (&self.constant, &other.constant) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.ty == other.ty && self.expression == other.expression,
            _ => false,
        }
    }
}

impl Eq for TExpr {}

impl Hash for TExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.constant {
            Some(value) => value.hash(state),
            None => {
                self.ty.hash(state);
                self.expression.hash(state);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LValue {
    Variable(DeclId),
    Element(Box<ArrayElement>),
    Member(Box<MemberAccess>),
}

impl LValue {
    /// The declaration at the root of the reference, `A` in `A(1)%B`.
    pub fn decl(&self) -> Option<DeclId> {
        match self {
            LValue::Variable(id) => Some(*id),
            LValue::Element(element) => element.base.lvalue()?.decl(),
            LValue::Member(member) => member.base.lvalue()?.decl(),
        }
    }

    pub fn to_expr(self) -> Expr {
        Expr::Lhs(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArrayElement {
    base: TExpr,
    subscripts: Vec<TExpr>,
}

impl ArrayElement {
    pub fn new(base: TExpr, subscripts: Vec<TExpr>) -> ArrayElement {
        ArrayElement { base, subscripts }
    }

    pub fn base(&self) -> &TExpr {
        &self.base
    }

    pub fn subscripts(&self) -> &[TExpr] {
        &self.subscripts
    }

    pub fn to_lvalue(self) -> LValue {
        LValue::Element(Box::new(self))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberAccess {
    base: TExpr,
    member: SmolStr,
    index: usize,
}

impl MemberAccess {
    pub fn new(base: TExpr, member: SmolStr, index: usize) -> MemberAccess {
        MemberAccess {
            base,
            member,
            index,
        }
    }

    pub fn base(&self) -> &TExpr {
        &self.base
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    /// Position of the member in its structure definition.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn to_lvalue(self) -> LValue {
        LValue::Member(Box::new(self))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IntrinsicCall {
    intrinsic: &'static Intrinsic,
    args: Vec<TExpr>,
}

impl IntrinsicCall {
    pub fn new(intrinsic: &'static Intrinsic, args: Vec<TExpr>) -> IntrinsicCall {
        IntrinsicCall { intrinsic, args }
    }

    pub fn intrinsic(&self) -> &'static Intrinsic {
        self.intrinsic
    }

    pub fn args(&self) -> &[TExpr] {
        &self.args
    }

    pub fn to_expr(self) -> Expr {
        Expr::Intrinsic(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallArgument {
    keyword: Option<SmolStr>,
    expr: TExpr,
}

impl CallArgument {
    pub fn new(keyword: Option<SmolStr>, expr: TExpr) -> CallArgument {
        CallArgument { keyword, expr }
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn expr(&self) -> &TExpr {
        &self.expr
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionCall {
    decl: DeclId,
    args: Vec<CallArgument>,
}

impl FunctionCall {
    pub fn new(decl: DeclId, args: Vec<CallArgument>) -> FunctionCall {
        FunctionCall { decl, args }
    }

    pub fn decl(&self) -> DeclId {
        self.decl
    }

    pub fn args(&self) -> &[CallArgument] {
        &self.args
    }

    pub fn to_expr(self) -> Expr {
        Expr::Function(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BinaryExpr {
    op: BinaryOp,
    left: TExpr,
    right: TExpr,
}

impl BinaryExpr {
    pub fn new(op: BinaryOp, left: TExpr, right: TExpr) -> BinaryExpr {
        BinaryExpr { op, left, right }
    }

    pub fn op(&self) -> BinaryOp {
        self.op
    }

    pub fn left(&self) -> &TExpr {
        &self.left
    }

    pub fn right(&self) -> &TExpr {
        &self.right
    }

    pub fn to_expr(self) -> Expr {
        Expr::Binary(Box::new(self))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnaryExpr {
    op: UnaryOp,
    operand: TExpr,
}

impl UnaryExpr {
    pub fn new(op: UnaryOp, operand: TExpr) -> UnaryExpr {
        UnaryExpr { op, operand }
    }

    pub fn op(&self) -> UnaryOp {
        self.op
    }

    pub fn operand(&self) -> &TExpr {
        &self.operand
    }

    pub fn to_expr(self) -> Expr {
        Expr::Unary(Box::new(self))
    }
}

//
// Printing as Fortran source
//

pub struct ExprDisplay<'a> {
    expr: &'a TExpr,
    context: &'a Context,
}

impl ExprDisplay<'_> {
    fn child<'b>(&'b self, expr: &'b TExpr) -> ExprDisplay<'b> {
        ExprDisplay {
            expr,
            context: self.context,
        }
    }

    fn name(&self, id: DeclId) -> &str {
        self.context.decl(id).map(|d| d.name()).unwrap_or("<destroyed>")
    }

    fn write_list(&self, f: &mut fmt::Formatter<'_>, args: &[TExpr]) -> fmt::Result {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.child(arg))?;
        }
        Ok(())
    }

    fn write_call_args(&self, f: &mut fmt::Formatter<'_>, args: &[CallArgument]) -> fmt::Result {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if let Some(keyword) = &arg.keyword {
                write!(f, "{keyword}=")?;
            }
            write!(f, "{}", self.child(&arg.expr))?;
        }
        Ok(())
    }

    // An operand is wrapped when it binds more loosely than its operator, or equally
    // on the side that the operator does not associate to.
    fn write_operand(
        &self,
        f: &mut fmt::Formatter<'_>,
        operand: &TExpr,
        parent: u8,
        right_assoc: bool,
        is_right: bool,
    ) -> fmt::Result {
        let own = match &operand.expression {
            Expr::Binary(binary) if !operand.brackets => Some(binary.op.precedence()),
            Expr::Unary(unary) if !operand.brackets => Some(unary.op.precedence()),
            _ => None,
        };
        let wrap = match own {
            Some(own) => own < parent || (own == parent && is_right != right_assoc),
            None => false,
        };
        if wrap {
            write!(f, "({})", self.child(operand))
        } else {
            write!(f, "{}", self.child(operand))
        }
    }

    fn write_unbracketed(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expr.expression {
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Lhs(LValue::Variable(id)) => f.write_str(self.name(*id)),
            Expr::Lhs(LValue::Element(element)) => {
                write!(f, "{}(", self.child(&element.base))?;
                self.write_list(f, &element.subscripts)?;
                f.write_str(")")
            }
            Expr::Lhs(LValue::Member(member)) => {
                write!(f, "{}%{}", self.child(&member.base), member.member)
            }
            Expr::Cast(operand) => {
                let (name, kind) = self.expr.ty.conversion_intrinsic();
                write!(f, "{name}({}", self.child(operand))?;
                if let Some(kind) = kind {
                    write!(f, ", KIND={kind}")?;
                }
                f.write_str(")")
            }
            Expr::Intrinsic(call) => {
                write!(f, "{}(", call.intrinsic)?;
                self.write_list(f, &call.args)?;
                f.write_str(")")
            }
            Expr::Function(call) => {
                write!(f, "{}(", self.name(call.decl))?;
                self.write_call_args(f, &call.args)?;
                f.write_str(")")
            }
            Expr::AltReturn(label) => write!(f, "*{label}"),
            Expr::Binary(binary) => {
                let prec = binary.op.precedence();
                let right_assoc = binary.op == BinaryOp::PowerOp;
                self.write_operand(f, &binary.left, prec, right_assoc, false)?;
                if right_assoc {
                    write!(f, "{}", binary.op)?;
                } else {
                    write!(f, " {} ", binary.op)?;
                }
                self.write_operand(f, &binary.right, prec, right_assoc, true)
            }
            Expr::Unary(unary) => {
                match unary.op {
                    UnaryOp::Not => f.write_str(".NOT. ")?,
                    op => write!(f, "{op}")?,
                }
                self.write_operand(f, &unary.operand, unary.op.precedence(), false, true)
            }
        }
    }
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expr.brackets {
            f.write_str("(")?;
            self.write_unbracketed(f)?;
            f.write_str(")")
        } else {
            self.write_unbracketed(f)
        }
    }
}
