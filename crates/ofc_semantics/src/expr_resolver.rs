// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// Resolution of parse-tree expressions into typed expressions.
//
// Names are resolved in the scope the expression appears in, declaring them
// implicitly when first seen. Operands of mixed type are wrapped in `Cast` nodes so
// that every node has the type its operator gives it. Subtrees that are constant are
// folded as they are built and the value is cached on the node.

use ofc_syntax::ast;
use ofc_syntax::ast::{BinaryOp, CmpOp, UnaryOp};
use ordered_float::OrderedFloat;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::asg::{
    ArrayElement, BinaryExpr, CallArgument, Expr, FunctionCall, IntrinsicCall, LValue,
    MemberAccess, TExpr, UnaryExpr,
};
use crate::context::Context;
use crate::decl::{DeclFlags, DeclId, Declaration};
use crate::intrinsics::{self, Intrinsic};
use crate::scope::{DummyArgument, ScopeId};
use crate::semantic_error::{SemaResult, SemanticError, SemanticErrorKind};
use crate::types::{Bound, CaseSensitive, CharLen, Kind, TypeData, TypeKind, TypeRef};
use crate::typeval::{TypedValue, Value};
use crate::TextRange;

use SemanticErrorKind::*;

/// Resolve an expression of an executable statement. References mark their
/// declarations as used.
pub fn resolve_expr(context: &mut Context, scope: ScopeId, expr: &ast::Expr) -> SemaResult<TExpr> {
    Resolver::new(context, scope, true).from_expr(expr)
}

/// Resolve an expression of a specification statement: a KIND, a length, an array
/// bound or an initial value. Implicit declarations made here can still be retyped
/// by later declarations.
pub fn resolve_spec_expr(
    context: &mut Context,
    scope: ScopeId,
    expr: &ast::Expr,
) -> SemaResult<TExpr> {
    Resolver::new(context, scope, false).from_expr(expr)
}

/// Resolve a specification expression and reduce it to its value.
pub fn resolve_constant(
    context: &mut Context,
    scope: ScopeId,
    expr: &ast::Expr,
) -> SemaResult<TypedValue> {
    resolve_spec_expr(context, scope, expr)?.resolve()
}

/// Resolve the target of an assignment.
pub fn resolve_lvalue(context: &mut Context, scope: ScopeId, lhs: &ast::Lhs) -> SemaResult<TExpr> {
    Resolver::new(context, scope, true).from_lhs(lhs, LhsMode::Target)
}

/// Resolve a reference to storage in a specification statement (DATA, EQUIVALENCE),
/// without marking it used.
pub fn resolve_spec_lvalue(
    context: &mut Context,
    scope: ScopeId,
    lhs: &ast::Lhs,
) -> SemaResult<TExpr> {
    Resolver::new(context, scope, false).from_lhs(lhs, LhsMode::Target)
}

/// Resolve the callee and arguments of `CALL name(args)`.
pub fn resolve_call(
    context: &mut Context,
    scope: ScopeId,
    name: &ast::Name,
    args: &[ast::CallArg],
) -> SemaResult<(DeclId, Vec<CallArgument>)> {
    let mut resolver = Resolver::new(context, scope, true);
    let decl = resolver.subroutine_decl(name)?;
    let args = resolver.from_call_args(args, true)?;
    let args = resolver.match_signature(decl, args, name.range)?;
    Ok((decl, args))
}

/// Convert `expr` to `ty` with a `Cast` node, warning when the conversion may lose
/// information. Returns `expr` itself if it already has type `ty`.
pub fn cast_to(context: &mut Context, expr: TExpr, ty: &TypeRef) -> SemaResult<TExpr> {
    Resolver::new(context, ScopeId::default(), true).cast(expr, ty)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LhsMode {
    /// The value of the reference; `F(X)` may be a function call.
    Value,
    /// Storage that is written to.
    Target,
}

struct Resolver<'a> {
    context: &'a mut Context,
    scope: ScopeId,
    executable: bool,
}

impl<'a> Resolver<'a> {
    fn new(context: &'a mut Context, scope: ScopeId, executable: bool) -> Resolver<'a> {
        Resolver {
            context,
            scope,
            executable,
        }
    }

    fn from_expr(&mut self, expr: &ast::Expr) -> SemaResult<TExpr> {
        let texpr = match expr {
            ast::Expr::Literal(literal) => self.from_literal(literal)?,
            ast::Expr::Lhs(lhs) => self.from_lhs(lhs, LhsMode::Value)?,
            ast::Expr::BinExpr(bin_expr) => {
                let left = self.from_expr(&bin_expr.lhs)?;
                let right = self.from_expr(&bin_expr.rhs)?;
                self.binary(bin_expr.op, left, right, bin_expr.range)?
            }
            ast::Expr::PrefixExpr(prefix_expr) => {
                let operand = self.from_expr(&prefix_expr.expr)?;
                self.unary(prefix_expr.op, operand, prefix_expr.range)?
            }
            ast::Expr::ParenExpr(paren_expr) => {
                let mut inner = self.from_expr(&paren_expr.expr)?;
                inner.set_bracketed();
                inner
            }
        };
        trace!(ty = %texpr.get_type(), constant = texpr.is_constant(), "resolved expression");
        Ok(texpr)
    }

    //
    // Literals
    //

    fn from_literal(&mut self, literal: &ast::Literal) -> SemaResult<TExpr> {
        let range = literal.range;
        let types = &mut self.context.types;
        let value = match &literal.kind {
            ast::LiteralKind::Integer { digits, kind } => {
                let ty = types.primitive(TypeKind::Integer, kind.unwrap_or(4))?;
                // More digits than an i128 holds is out of range for every kind.
                let value = digits.parse::<i128>().map_err(|_| Overflow)?;
                TypedValue::new(ty, Value::Integer(value))
            }
            ast::LiteralKind::Real { text, kind } => {
                let double = text.contains(['D', 'd']);
                let width = kind.unwrap_or(if double { 8 } else { 4 });
                let ty = types.primitive(TypeKind::Real, width)?;
                let value = parse_real(text)?;
                TypedValue::new(ty, Value::Real(OrderedFloat(value)))
            }
            ast::LiteralKind::Complex { real, imag } => {
                let re = self.from_expr(real)?.resolve()?;
                let im = self.from_expr(imag)?.resolve()?;
                let width = complex_part_kind(&re)?.max(complex_part_kind(&im)?);
                let ty = self.context.types.primitive(TypeKind::Complex, width)?;
                let part = |v: &TypedValue| v.as_real().or(v.as_integer().map(|i| i as f64));
                let (Some(re), Some(im)) = (part(&re), part(&im)) else {
                    return Err(SemanticError::new(
                        TypeMismatch("parts of a COMPLEX literal must be INTEGER or REAL".into()),
                        range,
                    ));
                };
                TypedValue::new(ty, Value::Complex(OrderedFloat(re), OrderedFloat(im)))
            }
            ast::LiteralKind::Logical { value, kind } => {
                let ty = types.primitive(TypeKind::Logical, kind.unwrap_or(4))?;
                TypedValue::new(ty, Value::Logical(*value))
            }
            ast::LiteralKind::Character(text) => Ok(TypedValue::character(types, text)),
        };
        let value = value.map_err(|e| e.or_range(range))?;
        Ok(TExpr::constant(value, range))
    }

    //
    // References
    //

    fn case(&self) -> CaseSensitive {
        self.context.options().case_sensitive
    }

    fn use_decl(&mut self, id: DeclId) {
        if self.executable {
            self.context.mark_used(id);
        }
    }

    fn variable(&mut self, id: DeclId, range: TextRange) -> SemaResult<TExpr> {
        let decl = self.context.decl(id)?;
        let ty = decl.get_type().clone();
        let constant = decl.is_parameter().then(|| decl.constant_value().cloned()).flatten();
        let mut texpr = TExpr::new(LValue::Variable(id).to_expr(), ty, range);
        if let Some(value) = constant {
            texpr.set_constant(value);
        }
        self.use_decl(id);
        Ok(texpr)
    }

    /// Find `name`, declaring it implicitly if it has not been seen.
    fn lookup_or_implicit(&mut self, name: &ast::Name) -> SemaResult<DeclId> {
        match self.context.lookup(self.scope, name.text()) {
            Some(id) => Ok(id),
            None => self.context.declare_implicit(self.scope, name.text(), name.range),
        }
    }

    fn from_lhs(&mut self, lhs: &ast::Lhs, mode: LhsMode) -> SemaResult<TExpr> {
        match lhs {
            ast::Lhs::Variable(name) => {
                let id = self.lookup_or_implicit(name)?;
                if mode == LhsMode::Target {
                    self.check_assignable(id, name.range)?;
                }
                self.variable(id, name.range)
            }
            ast::Lhs::Array(array) => {
                if let (ast::Lhs::Variable(name), LhsMode::Value) = (&array.parent, mode) {
                    if let Some(call) = self.try_call(name, &array.args, array.range)? {
                        return Ok(call);
                    }
                }
                let base = self.from_lhs(&array.parent, mode)?;
                self.element(base, &array.args, array.range)
            }
            ast::Lhs::Member(member) => {
                let base = self.from_lhs(&member.parent, mode)?;
                self.member(base, &member.member, member.range)
            }
        }
    }

    fn check_assignable(&self, id: DeclId, range: TextRange) -> SemaResult<()> {
        let decl = self.context.decl(id)?;
        let problem = if decl.is_parameter() {
            "PARAMETER"
        } else if decl.is_procedure() {
            "procedure"
        } else {
            return Ok(());
        };
        Err(SemanticError::new(
            TypeMismatch(format!("cannot assign to {problem} `{}`", decl.name())),
            range,
        ))
    }

    fn element(
        &mut self,
        base: TExpr,
        args: &[ast::CallArg],
        range: TextRange,
    ) -> SemaResult<TExpr> {
        let ty = base.get_type().clone();
        let name = self.describe(&base);
        let Some(shape) = ty.array() else {
            return Err(SemanticError::new(
                SubscriptError(format!("`{name}` is not an array")),
                range,
            ));
        };
        if args.len() != shape.rank() {
            return Err(SemanticError::new(
                SubscriptError(format!(
                    "`{name}` has {} dimensions, not {}",
                    shape.rank(),
                    args.len()
                )),
                range,
            ));
        }
        let mut subscripts = Vec::with_capacity(args.len());
        for (arg, dim) in args.iter().zip(shape.dims()) {
            let expr = match (&arg.name, arg.expr()) {
                (None, Some(expr)) => expr,
                _ => {
                    return Err(SemanticError::new(
                        SubscriptError(format!("malformed subscript of `{name}`")),
                        arg.range,
                    ))
                }
            };
            let subscript = self.from_expr(expr)?;
            if !subscript.get_type().is_integer() || subscript.get_type().is_array() {
                return Err(SemanticError::new(
                    TypeMismatch(format!(
                        "subscript of `{name}` is {}, not INTEGER",
                        subscript.get_type()
                    )),
                    arg.range,
                ));
            }
            if let Some(value) = subscript.constant_value().and_then(TypedValue::as_integer) {
                let below = matches!(dim.lower, Bound::Const(l) if value < i128::from(l));
                let above = matches!(dim.upper, Bound::Const(u) if value > i128::from(u));
                if below || above {
                    return Err(SemanticError::new(
                        SubscriptError(format!("subscript {value} is outside the bounds of `{name}`")),
                        arg.range,
                    ));
                }
            }
            subscripts.push(subscript);
        }
        let elem = self.context.types.element(&ty);
        let lvalue = ArrayElement::new(base, subscripts).to_lvalue();
        Ok(TExpr::new(lvalue.to_expr(), elem, range))
    }

    fn member(&mut self, base: TExpr, member: &ast::Name, range: TextRange) -> SemaResult<TExpr> {
        let name = self.describe(&base);
        let ty = base.get_type().clone();
        let structure = match (ty.structure(), ty.is_scalar()) {
            (Some(structure), true) => structure.clone(),
            _ => {
                return Err(SemanticError::new(
                    TypeMismatch(format!("`{name}` of type {ty} has no members")),
                    range,
                ))
            }
        };
        let Some((index, found)) = structure.def().member(member.text(), self.case()) else {
            return Err(SemanticError::new(
                UndeclaredReference(SmolStr::from(format!("{name}%{}", member.text()))),
                member.range,
            ));
        };
        let member_ty = found.ty.clone();
        let lvalue = MemberAccess::new(base, found.name.clone(), index).to_lvalue();
        Ok(TExpr::new(lvalue.to_expr(), member_ty, range))
    }

    fn describe(&self, expr: &TExpr) -> String {
        expr.lvalue()
            .and_then(LValue::decl)
            .and_then(|id| self.context.decl(id).ok())
            .map_or_else(|| "expression".to_string(), |d| d.name().to_string())
    }

    //
    // Calls
    //

    /// `name(args)` as a function or intrinsic call, or `None` if `name` is an array.
    fn try_call(
        &mut self,
        name: &ast::Name,
        args: &[ast::CallArg],
        range: TextRange,
    ) -> SemaResult<Option<TExpr>> {
        let local = self.context.lookup(self.scope, name.text());
        let callee = match local {
            Some(id) => {
                let decl = self.context.decl(id)?;
                if decl.is_array() {
                    return Ok(None);
                }
                if decl.is_intrinsic() {
                    match intrinsics::lookup(name.text()) {
                        Some(intrinsic) => {
                            return self.intrinsic_call(intrinsic, args, range).map(Some)
                        }
                        None => {
                            return Err(SemanticError::new(
                                UndeclaredReference(name.text.clone()),
                                name.range,
                            ))
                        }
                    }
                }
                self.as_function(id, name.range)?
            }
            None => {
                if let Some(intrinsic) = intrinsics::lookup(name.text()) {
                    return self.intrinsic_call(intrinsic, args, range).map(Some);
                }
                match self.global_procedure(name.text()) {
                    Some(id) => id,
                    None => self
                        .context
                        .declare_implicit_function(self.scope, name.text(), name.range)?,
                }
            }
        };
        let decl = self.context.decl(callee)?;
        let Some(ret) = decl.get_type().return_type().cloned() else {
            return Err(SemanticError::new(
                TypeMismatch(format!("subroutine `{}` used as a function", decl.name())),
                name.range,
            ));
        };
        let args = self.from_call_args(args, false)?;
        let args = self.match_signature(callee, args, range)?;
        self.use_decl(callee);
        let call = FunctionCall::new(callee, args);
        Ok(Some(TExpr::new(call.to_expr(), ret, range)))
    }

    /// A procedure declared in the global scope, which body scopes see even without
    /// host association.
    fn global_procedure(&self, name: &str) -> Option<DeclId> {
        let id = self.context.lookup_local(self.context.global_scope(), name)?;
        self.context.decl(id).ok()?.is_procedure().then_some(id)
    }

    /// Turn a local declaration into a function, if it can still become one: a name
    /// declared EXTERNAL, or a scalar declared implicitly and not yet used.
    fn as_function(&mut self, id: DeclId, range: TextRange) -> SemaResult<DeclId> {
        let decl = self.context.decl(id)?;
        if decl.is_procedure() {
            return Ok(id);
        }
        let convertible = !decl.is_array()
            && !decl.is_parameter()
            && !decl.has_initializer()
            && (decl.is_external() || (decl.is_implicit() && !decl.is_used()));
        if !convertible {
            return Err(SemanticError::new(
                SubscriptError(format!("`{}` is not an array or a function", decl.name())),
                range,
            ));
        }
        let ret = decl.get_type().clone();
        let ty = self.context.types.function(&ret)?;
        self.retype_procedure(id, ty);
        Ok(id)
    }

    fn retype_procedure(&mut self, id: DeclId, ty: TypeRef) {
        let decl = &mut self.context.decls[id];
        let mut flags = decl.flags();
        if !flags.contains(DeclFlags::DUMMY) {
            flags |= DeclFlags::EXTERNAL;
        }
        decl.set_flags(flags);
        decl.set_type(ty);
        debug!(name = decl.name(), ty = %decl.get_type(), "declared as procedure by use");
    }

    fn subroutine_decl(&mut self, name: &ast::Name) -> SemaResult<DeclId> {
        let id = match self.context.lookup(self.scope, name.text()) {
            Some(id) => id,
            None => match self.global_procedure(name.text()) {
                Some(id) => id,
                None => {
                    let ty = self.context.types.subroutine();
                    let decl = Declaration::new(name.text(), ty, DeclFlags::EXTERNAL, name.range);
                    self.context.declare(self.scope, decl)?
                }
            },
        };
        let decl = self.context.decl(id)?;
        if decl.is_subroutine() {
            self.use_decl(id);
            return Ok(id);
        }
        let convertible = !decl.is_procedure()
            && !decl.is_array()
            && (decl.is_external() || (decl.is_implicit() && !decl.is_used()));
        if !convertible {
            return Err(SemanticError::new(
                TypeMismatch(format!("`{}` is not a subroutine", decl.name())),
                name.range,
            ));
        }
        let ty = self.context.types.subroutine();
        self.retype_procedure(id, ty);
        self.use_decl(id);
        Ok(id)
    }

    fn from_call_args(
        &mut self,
        args: &[ast::CallArg],
        allow_alt_return: bool,
    ) -> SemaResult<Vec<CallArgument>> {
        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            let keyword = arg.name.as_ref().map(|n| n.text.clone());
            let expr = match &arg.kind {
                ast::CallArgKind::Expr(expr) => self.from_expr(expr)?,
                ast::CallArgKind::Return(label) if allow_alt_return => {
                    let ty = self.context.types.integer();
                    TExpr::new(Expr::AltReturn(*label), ty, arg.range)
                }
                ast::CallArgKind::Return(_) | ast::CallArgKind::Asterisk => {
                    return Err(SemanticError::new(
                        ArgumentMismatch("alternate return outside a CALL argument list".into()),
                        arg.range,
                    ))
                }
            };
            resolved.push(CallArgument::new(keyword, expr));
        }
        Ok(resolved)
    }

    fn same_name(&self, a: &str, b: &str) -> bool {
        match self.case() {
            CaseSensitive::True => a == b,
            CaseSensitive::False => a.eq_ignore_ascii_case(b),
        }
    }

    /// Put `args` in the order of the dummy arguments of `callee` and check each
    /// against its dummy. Procedures without a body in this file are not checked.
    fn match_signature(
        &self,
        callee: DeclId,
        args: Vec<CallArgument>,
        range: TextRange,
    ) -> SemaResult<Vec<CallArgument>> {
        let decl = self.context.decl(callee)?;
        let name = decl.name().to_string();
        let Some(body) = decl.func() else {
            return Ok(args);
        };
        let params = self.context.scope(body)?.args().to_vec();
        let mismatch = |detail: String| SemanticError::new(ArgumentMismatch(detail), range);
        let mut slots: Vec<Option<CallArgument>> = vec![None; params.len()];
        let mut position = 0;
        let mut seen_keyword = false;
        for arg in args {
            let index = match arg.keyword() {
                None => {
                    if seen_keyword {
                        return Err(mismatch(format!(
                            "positional argument after a keyword argument in call to `{name}`"
                        )));
                    }
                    position += 1;
                    position - 1
                }
                Some(keyword) => {
                    seen_keyword = true;
                    params
                        .iter()
                        .position(|p| match p {
                            DummyArgument::Decl(d) => self
                                .context
                                .decl(*d)
                                .is_ok_and(|d| self.same_name(d.name(), keyword)),
                            DummyArgument::AltReturn => false,
                        })
                        .ok_or_else(|| {
                            mismatch(format!("`{name}` has no argument called `{keyword}`"))
                        })?
                }
            };
            let Some(slot) = slots.get_mut(index) else {
                return Err(mismatch(format!(
                    "too many arguments in call to `{name}`, it takes {}",
                    params.len()
                )));
            };
            if slot.is_some() {
                return Err(mismatch(format!(
                    "argument {} of `{name}` is given twice",
                    index + 1
                )));
            }
            *slot = Some(arg);
        }
        let mut ordered = Vec::with_capacity(params.len());
        for (i, (param, slot)) in params.iter().zip(slots).enumerate() {
            let Some(arg) = slot else {
                return Err(mismatch(format!("argument {} of `{name}` is missing", i + 1)));
            };
            self.check_argument(&name, i, param, &arg)
                .map_err(mismatch)?;
            ordered.push(arg);
        }
        Ok(ordered)
    }

    fn check_argument(
        &self,
        callee: &str,
        index: usize,
        param: &DummyArgument,
        arg: &CallArgument,
    ) -> Result<(), String> {
        let position = index + 1;
        let param = match (param, arg.expr().expression()) {
            (DummyArgument::AltReturn, Expr::AltReturn(_)) => return Ok(()),
            (DummyArgument::AltReturn, _) => {
                return Err(format!("argument {position} of `{callee}` must be an alternate return"))
            }
            (DummyArgument::Decl(_), Expr::AltReturn(_)) => {
                return Err(format!("argument {position} of `{callee}` is not an alternate return"))
            }
            (DummyArgument::Decl(id), _) => match self.context.decl(*id) {
                Ok(param) => param,
                Err(_) => return Ok(()),
            },
        };
        let (pty, aty) = (param.get_type(), arg.expr().get_type());
        // A dummy used only as a procedure is typed when the body calls it.
        if aty.is_procedure() {
            if pty.is_procedure() || (param.is_implicit() && !param.is_used()) {
                return Ok(());
            }
            return Err(format!("argument {position} of `{callee}` is not a procedure"));
        }
        let elements_match = pty.type_kind() == aty.type_kind() && pty.kind() == aty.kind();
        let is_element = matches!(arg.expr().lvalue(), Some(LValue::Element(_)));
        let shapes_match = match (pty.is_array(), aty.is_array()) {
            (true, false) => is_element,
            (false, true) => false,
            _ => true,
        };
        if elements_match && shapes_match && !pty.is_procedure() {
            return Ok(());
        }
        Err(format!(
            "argument {position} of `{callee}` is {aty}, expected {pty}"
        ))
    }

    fn intrinsic_call(
        &mut self,
        intrinsic: &'static Intrinsic,
        args: &[ast::CallArg],
        range: TextRange,
    ) -> SemaResult<TExpr> {
        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            match (&arg.name, arg.expr()) {
                (None, Some(expr)) => resolved.push(self.from_expr(expr)?),
                _ => {
                    return Err(SemanticError::new(
                        ArgumentMismatch(format!("malformed argument to {intrinsic}")),
                        arg.range,
                    ))
                }
            }
        }
        let arg_types: Vec<TypeRef> = resolved.iter().map(|a| a.get_type().clone()).collect();
        let arg_refs: Vec<&crate::types::Type> = arg_types.iter().map(|t| t.as_ref()).collect();
        intrinsic
            .check_args(&arg_refs)
            .map_err(|e| e.or_range(range))?;
        let mut common = arg_types[0].clone();
        if intrinsic.promotes_args() {
            for ty in &arg_types[1..] {
                common = self
                    .context
                    .types
                    .promote(&common, ty)
                    .map_err(|e| e.or_range(range))?;
            }
            resolved = resolved
                .into_iter()
                .map(|arg| self.cast(arg, &common))
                .collect::<SemaResult<_>>()?;
        }
        let result = intrinsic.result_type(&mut self.context.types, &common)?;
        // LEN of a variable of known length is known without its value.
        let known_len = match (intrinsic.name(), common.char_len()) {
            ("LEN", Some(CharLen::Known(len))) => Some(len),
            _ => None,
        };
        let call = IntrinsicCall::new(intrinsic, resolved);
        let mut texpr = TExpr::new(call.to_expr(), result.clone(), range);
        if let Some(len) = known_len {
            texpr.set_constant(TypedValue::new(result, Value::Integer(i128::from(len)))?);
            return Ok(texpr);
        }
        Ok(self.fold(texpr))
    }

    //
    // Operators
    //

    /// Wrap `expr` in a conversion to `ty`, unless it already has that type.
    fn cast(&mut self, expr: TExpr, ty: &TypeRef) -> SemaResult<TExpr> {
        if expr.get_type() == ty {
            return Ok(expr);
        }
        let range = expr.range();
        self.context.warn_if_lossy(expr.get_type(), ty, range);
        let texpr = TExpr::new(Expr::Cast(Box::new(expr)), ty.clone(), range);
        Ok(self.fold(texpr))
    }

    /// Cache the value of `texpr` if it can be computed now. An operation that can
    /// never succeed is reported as a warning; the error itself surfaces if the value
    /// is required.
    fn fold(&mut self, mut texpr: TExpr) -> TExpr {
        match texpr.resolve() {
            Ok(value) => texpr.set_constant(value),
            Err(err) if matches!(err.kind(), DivideByZero | Overflow) && self.executable => {
                self.context.warning(texpr.range(), err.kind());
            }
            Err(err) => trace!(error = %err, "not folded"),
        }
        texpr
    }

    fn operand_mismatch(op: impl std::fmt::Display, left: &TExpr, right: &TExpr, range: TextRange) -> SemanticError {
        SemanticError::new(
            TypeMismatch(format!(
                "`{op}` cannot combine {} and {}",
                left.get_type(),
                right.get_type()
            )),
            range,
        )
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        left: TExpr,
        right: TExpr,
        range: TextRange,
    ) -> SemaResult<TExpr> {
        let (lty, rty) = (left.get_type().clone(), right.get_type().clone());
        if lty.is_procedure() || rty.is_procedure() {
            return Err(Self::operand_mismatch(op, &left, &right, range));
        }
        let (left, right, ty) = match op {
            BinaryOp::ArithOp(_) | BinaryOp::PowerOp => {
                if !lty.is_numeric() || !rty.is_numeric() {
                    return Err(Self::operand_mismatch(op, &left, &right, range));
                }
                // A whole-number exponent is applied as repeated multiplication and is
                // not converted.
                if op == BinaryOp::PowerOp && rty.is_integer() && !lty.is_integer() && rty.is_scalar() {
                    (left, right, lty)
                } else {
                    let ty = self.promote(&left, &right, op, range)?;
                    (self.cast(left, &ty)?, self.cast(right, &ty)?, ty)
                }
            }
            BinaryOp::ConcatenationOp => {
                let (Some(llen), Some(rlen)) = (lty.char_len(), rty.char_len()) else {
                    return Err(Self::operand_mismatch(op, &left, &right, range));
                };
                if lty.kind() != rty.kind() || lty.is_array() || rty.is_array() {
                    return Err(Self::operand_mismatch(op, &left, &right, range));
                }
                let len = match (llen, rlen) {
                    (CharLen::Known(a), CharLen::Known(b)) => {
                        CharLen::Known(a.checked_add(b).ok_or(Overflow)?)
                    }
                    _ => CharLen::Unknown,
                };
                let ty = self.context.types.character(lty.kind().unwrap_or(1), len);
                (left, right, ty)
            }
            BinaryOp::CmpOp(cmp) => {
                let operand_ty = if lty.is_character() && rty.is_character() {
                    if lty.kind() != rty.kind() {
                        return Err(Self::operand_mismatch(op, &left, &right, range));
                    }
                    None
                } else if lty.is_numeric() && rty.is_numeric() {
                    let ty = self.promote(&left, &right, op, range)?;
                    if ty.is_complex() && !matches!(cmp, CmpOp::Eq { .. }) {
                        return Err(Self::operand_mismatch(op, &left, &right, range));
                    }
                    Some(ty)
                } else {
                    return Err(Self::operand_mismatch(op, &left, &right, range));
                };
                let (left, right) = match &operand_ty {
                    Some(ty) => (self.cast(left, ty)?, self.cast(right, ty)?),
                    None => (left, right),
                };
                let logical = self.context.types.logical();
                let shape = left.get_type().array().or(right.get_type().array()).cloned();
                let ty = match shape {
                    Some(shape) => self.context.types.array(&logical, shape)?,
                    None => logical,
                };
                (left, right, ty)
            }
            BinaryOp::LogicOp(_) => {
                if !lty.is_logical() || !rty.is_logical() {
                    return Err(Self::operand_mismatch(op, &left, &right, range));
                }
                let ty = self.promote(&left, &right, op, range)?;
                (self.cast(left, &ty)?, self.cast(right, &ty)?, ty)
            }
        };
        let texpr = TExpr::new(BinaryExpr::new(op, left, right).to_expr(), ty, range);
        Ok(self.fold(texpr))
    }

    fn promote(
        &mut self,
        left: &TExpr,
        right: &TExpr,
        op: BinaryOp,
        range: TextRange,
    ) -> SemaResult<TypeRef> {
        self.context
            .types
            .promote(left.get_type(), right.get_type())
            .map_err(|_| Self::operand_mismatch(op, left, right, range))
    }

    fn unary(&mut self, op: UnaryOp, operand: TExpr, range: TextRange) -> SemaResult<TExpr> {
        let ty = operand.get_type().clone();
        let valid = match op {
            UnaryOp::Not => ty.is_logical(),
            UnaryOp::Neg | UnaryOp::Plus => ty.is_numeric(),
        };
        if !valid {
            return Err(SemanticError::new(
                TypeMismatch(format!("`{op}` cannot be applied to {ty}")),
                range,
            ));
        }
        if op == UnaryOp::Plus {
            return Ok(operand);
        }
        let texpr = TExpr::new(UnaryExpr::new(op, operand).to_expr(), ty, range);
        Ok(self.fold(texpr))
    }
}

fn parse_real(text: &str) -> SemaResult<f64> {
    let normalized: String = text
        .chars()
        .map(|c| if c == 'D' || c == 'd' { 'E' } else { c })
        .collect();
    normalized
        .parse::<f64>()
        .map_err(|_| InvalidType(format!("malformed REAL literal `{text}`")).into())
}

/// KIND of the COMPLEX literal a part of type `value` calls for.
fn complex_part_kind(value: &TypedValue) -> SemaResult<Kind> {
    match value.get_type().data() {
        TypeData::Real(k) => Ok(*k),
        TypeData::Integer(_) => Ok(4),
        _ => Err(TypeMismatch(format!(
            "{} cannot be part of a COMPLEX literal",
            value.get_type()
        ))
        .into()),
    }
}
