// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// Build the ASG defined in asg.rs from the parse tree of crate ofc_syntax.
//
// A source file is analyzed in three passes. The first declares every program unit,
// so that calls can be checked against procedures defined later in the file. The
// second runs the specification statements of every unit and the third the
// executable statements. A statement that fails is recorded in the error list and
// analysis continues with the next one.

use hashbrown::HashMap;
use ofc_source_file::{DiagnosticList, SourceString};
use ofc_syntax::ast as synast; // Syntactic AST
use smol_str::SmolStr;
use tracing::{debug, instrument};

use crate::asg;
use crate::asg::{Expr, LValue, TExpr};
use crate::context::{Context, LangOptions};
use crate::decl::{DeclFlags, DeclId, Declaration, Spec};
use crate::expr_resolver::{
    cast_to, resolve_call, resolve_constant, resolve_expr, resolve_lvalue, resolve_spec_expr,
    resolve_spec_lvalue,
};
use crate::intrinsics;
use crate::scope::{DummyArgument, ScopeId, ScopeKind};
use crate::semantic_error::{SemaResult, SemanticError, SemanticErrorKind::*, SemanticErrorList};
use crate::types::{can_cast, ArrayDim, ArrayShape, Bound, CharLen, Kind, StructureMember, StructureRef, TypeKind};
use crate::TextRange;

pub struct ParseResult {
    context: Context,
    program: asg::Program,
    errors: SemanticErrorList,
}

impl ParseResult {
    pub fn any_semantic_errors(&self) -> bool {
        self.errors.any_semantic_errors()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn take_context(self) -> Context {
        self.context
    }

    pub fn program(&self) -> &asg::Program {
        &self.program
    }

    pub fn errors(&self) -> &SemanticErrorList {
        &self.errors
    }

    pub fn warnings(&self) -> &DiagnosticList {
        self.context.diagnostics()
    }

    /// Print errors and warnings against the text the parse tree was built from.
    pub fn print_errors(&self, source: &SourceString) {
        self.errors.print_errors(source);
        source.print_errors(self.context.diagnostics());
    }
}

/// What the first pass learns about a program unit.
struct UnitInfo {
    kind: ScopeKind,
    name: Option<SmolStr>,
    scope: ScopeId,
    /// The FUNCTION or SUBROUTINE declaration in the global scope.
    decl: Option<DeclId>,
}

/// Analyze every program unit of `source`. Fails only if the `Context` itself cannot
/// be created; everything else ends up in the error list of the result.
#[instrument(skip_all, fields(units = source.units().len()))]
pub fn analyze_source(source: &synast::SourceFile, options: LangOptions) -> SemaResult<ParseResult> {
    let mut context = Context::new(options)?;
    let mut errors = SemanticErrorList::new();

    let infos: Vec<Option<UnitInfo>> = source
        .units()
        .iter()
        .map(|unit| match declare_unit(&mut context, unit) {
            Ok(info) => Some(info),
            Err(err) => {
                errors.insert(err.or_range(unit.range));
                None
            }
        })
        .collect();

    for (unit, info) in source.units().iter().zip(&infos) {
        if let Some(info) = info {
            from_specification_part(&mut context, &mut errors, unit, info);
        }
    }

    let mut program = asg::Program::new();
    for (unit, info) in source.units().iter().zip(infos) {
        if let Some(info) = info {
            program.insert_unit(from_execution_part(&mut context, &mut errors, unit, info));
        }
    }
    debug!(errors = errors.len(), "analysis done");
    Ok(ParseResult {
        context,
        program,
        errors,
    })
}

//
// Pass 1: program units and their dummy arguments.
//

fn declare_unit(context: &mut Context, unit: &synast::ProgramUnit) -> SemaResult<UnitInfo> {
    let name = unit.name.as_ref().map(|n| n.text.clone());
    let global = context.global_scope();
    let procedure_name = || {
        unit.name.as_ref().ok_or_else(|| {
            SemanticError::new(
                InvalidDeclaration("procedure without a name".to_string()),
                unit.range,
            )
        })
    };
    let (kind, scope, decl) = match &unit.kind {
        synast::UnitKind::Program => (
            ScopeKind::Program,
            context.create_scope(ScopeKind::Program, name.as_deref(), None)?,
            None,
        ),
        synast::UnitKind::BlockData => (
            ScopeKind::BlockData,
            context.create_scope(ScopeKind::BlockData, name.as_deref(), None)?,
            None,
        ),
        synast::UnitKind::Subroutine => {
            let name = procedure_name()?;
            let decl = context.declare_subroutine(global, name.text(), name.range)?;
            (ScopeKind::Subroutine, body_of(context, decl)?, Some(decl))
        }
        synast::UnitKind::Function(prefix) => {
            let name = procedure_name()?;
            let ret = match prefix {
                Some(type_spec) => Some(spec_from_type_spec(context, global, type_spec)?),
                None => None,
            };
            let decl = context.declare_function(global, name.text(), ret.as_ref(), name.range)?;
            (ScopeKind::Function, body_of(context, decl)?, Some(decl))
        }
    };
    for arg in &unit.args {
        declare_dummy(context, scope, kind, arg)?;
    }
    debug!(?kind, name = name.as_deref(), "declared program unit");
    Ok(UnitInfo {
        kind,
        name,
        scope,
        decl,
    })
}

fn body_of(context: &Context, decl: DeclId) -> SemaResult<ScopeId> {
    context
        .decl(decl)?
        .func()
        .ok_or_else(|| InvalidDeclaration("procedure without a body".to_string()).into())
}

fn declare_dummy(
    context: &mut Context,
    scope: ScopeId,
    kind: ScopeKind,
    arg: &synast::DummyArg,
) -> SemaResult<()> {
    let dummy = match arg {
        synast::DummyArg::Name(name) => {
            // Without an implicit rule the dummy must be typed by a later declaration.
            let ty = match context.scope(scope)?.implicit().type_for(name.text()) {
                Some(ty) => ty.clone(),
                None => context.types.real(),
            };
            let flags = DeclFlags::IMPLICIT | DeclFlags::DUMMY;
            let decl = Declaration::new(name.text(), ty, flags, name.range);
            DummyArgument::Decl(context.declare(scope, decl)?)
        }
        synast::DummyArg::Asterisk(range) => {
            if kind != ScopeKind::Subroutine {
                return Err(SemanticError::new(
                    InvalidDeclaration("alternate return in a FUNCTION".to_string()),
                    *range,
                ));
            }
            DummyArgument::AltReturn
        }
    };
    context.scope_mut(scope)?.push_arg(dummy)
}

//
// Pass 2: specification statements.
//

#[instrument(skip_all, fields(unit = info.name.as_deref()))]
fn from_specification_part(
    context: &mut Context,
    errors: &mut SemanticErrorList,
    unit: &synast::ProgramUnit,
    info: &UnitInfo,
) {
    for stmt in unit.body.iter().filter(|s| !s.is_executable()) {
        if let Err(err) = from_spec_stmt(context, info.scope, stmt) {
            errors.insert(err.or_range(stmt.range));
        }
    }
    if let Err(err) = finish_declarations(context, info) {
        errors.insert(err.or_range(unit.range));
    }
}

/// Check that implicit dummies and results still have a type now that all IMPLICIT
/// statements are in, and give the FUNCTION the type of its result variable.
fn finish_declarations(context: &mut Context, info: &UnitInfo) -> SemaResult<()> {
    let scope = context.scope(info.scope)?;
    let mut untyped = scope.result().into_iter().chain(scope.args().iter().filter_map(|a| match a {
        DummyArgument::Decl(id) => Some(*id),
        DummyArgument::AltReturn => None,
    }));
    let missing = untyped.find(|id| {
        context.decl(*id).is_ok_and(|d| d.is_implicit() && scope.implicit().type_for(d.name()).is_none())
    });
    if let Some(id) = missing {
        let decl = context.decl(id)?;
        return Err(SemanticError::new(UndeclaredReference(decl.name().into()), decl.range()));
    }
    if let (Some(decl), Some(result)) = (info.decl, scope.result()) {
        let result = context.decl(result)?;
        let (ret, range) = (result.get_type().clone(), result.range());
        let ty = context.types.function(&ret).map_err(|e| e.or_range(range))?;
        context.decls[decl].set_type(ty);
    }
    Ok(())
}

fn from_spec_stmt(context: &mut Context, scope: ScopeId, stmt: &synast::Stmt) -> SemaResult<()> {
    match &stmt.kind {
        synast::StmtKind::Decl(decl_stmt) => from_decl_stmt(context, scope, decl_stmt),
        synast::StmtKind::Implicit(implicit) => from_implicit_stmt(context, scope, implicit),
        synast::StmtKind::Dimension(entities) => {
            for entity in entities {
                let id = local_or_implicit(context, scope, &entity.name)?;
                let is_dummy = context.decl(id)?.is_dummy();
                let shape = shape_from_array_spec(context, scope, &entity.dims, is_dummy)?;
                context.decl_set_shape(id, shape, entity.name.range)?;
            }
            Ok(())
        }
        synast::StmtKind::Equivalence(sets) => {
            for set in sets {
                let mut members = Vec::with_capacity(set.len());
                for lhs in set {
                    members.push(storage_decl(context, scope, lhs)?);
                }
                if let Some((first, rest)) = members.split_first() {
                    for other in rest {
                        context.equivalence(*first, *other)?;
                    }
                }
            }
            Ok(())
        }
        synast::StmtKind::Common(groups) => {
            for group in groups {
                let block = group.group.as_ref().map_or("", |g| g.text());
                for lhs in &group.names {
                    let id = from_common_entity(context, scope, lhs)?;
                    context.common_add(scope, block, id, lhs.range())?;
                }
            }
            Ok(())
        }
        synast::StmtKind::Parameter(assigns) => {
            for assign in assigns {
                let value = resolve_spec_expr(context, scope, &assign.value)?;
                let id = local_or_implicit(context, scope, &assign.name)?;
                context.decl_init_parameter(id, &value, assign.name.range)?;
            }
            Ok(())
        }
        synast::StmtKind::Data(entries) => {
            for entry in entries {
                from_data_entry(context, scope, entry)?;
            }
            Ok(())
        }
        synast::StmtKind::External(names) => {
            for name in names {
                let id = match context.lookup_local(scope, name.text()) {
                    Some(id) => id,
                    None => declare_external(context, scope, name)?,
                };
                context.decl_add_flags(id, DeclFlags::EXTERNAL, name.range)?;
            }
            Ok(())
        }
        synast::StmtKind::Intrinsic(names) => {
            for name in names {
                if intrinsics::lookup(name.text()).is_none() {
                    return Err(SemanticError::new(UndeclaredReference(name.text.clone()), name.range));
                }
                let id = match context.lookup_local(scope, name.text()) {
                    Some(id) => id,
                    None => declare_external(context, scope, name)?,
                };
                context.decl_add_flags(id, DeclFlags::INTRINSIC, name.range)?;
            }
            Ok(())
        }
        synast::StmtKind::Save(names) => {
            if names.is_empty() {
                context.scope_mut(scope)?.set_save_all();
            }
            for name in names {
                let id = local_or_implicit(context, scope, name)?;
                context.decl_add_flags(id, DeclFlags::STATIC, name.range)?;
            }
            Ok(())
        }
        synast::StmtKind::Structure(def) => from_structure_def(context, scope, def),
        _ => Ok(()),
    }
}

fn local_or_implicit(context: &mut Context, scope: ScopeId, name: &synast::Name) -> SemaResult<DeclId> {
    match context.lookup_local(scope, name.text()) {
        Some(id) => Ok(id),
        None => context.declare_implicit(scope, name.text(), name.range),
    }
}

/// A name declared EXTERNAL or INTRINSIC before anything else is known about it.
/// Its type is settled by how it is used.
fn declare_external(context: &mut Context, scope: ScopeId, name: &synast::Name) -> SemaResult<DeclId> {
    let implicit = context.scope(scope)?.implicit().type_for(name.text()).cloned();
    let ty = match implicit {
        Some(ty) => ty,
        None => context.types.subroutine(),
    };
    let decl = Declaration::new(name.text(), ty, DeclFlags::IMPLICIT, name.range);
    context.declare(scope, decl)
}

fn storage_decl(context: &mut Context, scope: ScopeId, lhs: &synast::Lhs) -> SemaResult<DeclId> {
    let texpr = resolve_spec_lvalue(context, scope, lhs)?;
    texpr
        .lvalue()
        .and_then(LValue::decl)
        .ok_or_else(|| SemanticError::new(InvalidDeclaration("not a variable".to_string()), lhs.range()))
}

/// `A` or `A(10)` in a COMMON statement; the second form also gives `A` its shape.
fn from_common_entity(context: &mut Context, scope: ScopeId, lhs: &synast::Lhs) -> SemaResult<DeclId> {
    match lhs {
        synast::Lhs::Variable(name) => local_or_implicit(context, scope, name),
        synast::Lhs::Array(array) => {
            let synast::Lhs::Variable(name) = &array.parent else {
                return Err(SemanticError::new(
                    InvalidDeclaration("malformed COMMON entity".to_string()),
                    array.range,
                ));
            };
            let id = local_or_implicit(context, scope, name)?;
            let mut dims = Vec::with_capacity(array.args.len());
            for arg in &array.args {
                let upper = arg.expr().ok_or_else(|| {
                    SemanticError::new(InvalidDeclaration("malformed bound".to_string()), arg.range)
                })?;
                dims.push(ArrayDim {
                    lower: Bound::Const(1),
                    upper: Bound::Const(constant_i64(context, scope, upper)?),
                });
            }
            let shape = ArrayShape::new(dims).map_err(|e| e.or_range(array.range))?;
            context.decl_set_shape(id, shape, array.range)?;
            Ok(id)
        }
        synast::Lhs::Member(member) => Err(SemanticError::new(
            InvalidDeclaration("structure member in COMMON".to_string()),
            member.range,
        )),
    }
}

fn from_implicit_stmt(
    context: &mut Context,
    scope: ScopeId,
    implicit: &synast::ImplicitStmt,
) -> SemaResult<()> {
    match implicit {
        synast::ImplicitStmt::None => context.set_implicit_none(scope),
        synast::ImplicitStmt::Rules(rules) => {
            for rule in rules {
                let spec = spec_from_type_spec(context, scope, &rule.ty)?;
                let ty = context.type_from_spec(&spec).map_err(|e| e.or_range(rule.ty.range))?;
                for letters in &rule.letters {
                    context
                        .set_implicit(scope, letters.start, letters.end, &ty)
                        .map_err(|e| e.or_range(rule.ty.range))?;
                }
            }
            Ok(())
        }
    }
}

fn from_decl_stmt(context: &mut Context, scope: ScopeId, decl_stmt: &synast::DeclStmt) -> SemaResult<()> {
    let base = spec_from_type_spec(context, scope, &decl_stmt.ty)?;
    for entity in &decl_stmt.decls {
        let existing = context.lookup_local(scope, entity.name.text());
        let is_dummy = existing
            .and_then(|id| context.decl(id).ok())
            .is_some_and(|d| d.is_dummy());
        let mut spec = base.clone();
        if let Some(star) = &entity.star_len {
            spec = apply_star_len(context, scope, spec, star)?;
        }
        let dims = entity.dims.as_ref().or(decl_stmt.ty.attributes.dimension.as_ref());
        if let Some(dims) = dims {
            spec = spec.with_array(shape_from_array_spec(context, scope, dims, is_dummy)?);
        }
        let id = context.declare_spec(scope, entity.name.text(), &spec, entity.range)?;
        match &entity.init {
            None => {}
            Some(synast::Init::Expr(expr)) => {
                let value = resolve_spec_expr(context, scope, expr)?;
                context.decl_init(id, &value)?;
            }
            Some(synast::Init::Clist(entries)) => {
                let values = from_clist(context, scope, entries)?;
                match values.as_slice() {
                    [value] if !context.decl(id)?.is_array() => context.decl_init(id, value)?,
                    _ => context.decl_init_array(id, &values)?,
                }
            }
        }
    }
    Ok(())
}

fn from_clist(
    context: &mut Context,
    scope: ScopeId,
    entries: &[synast::ClistEntry],
) -> SemaResult<Vec<TExpr>> {
    let mut values = Vec::new();
    for entry in entries {
        let value = resolve_spec_expr(context, scope, &entry.value)?;
        let repeat = usize::try_from(entry.repeat.unwrap_or(1))
            .map_err(|_| AllocationFailure)?;
        values.try_reserve(repeat)?;
        values.extend(std::iter::repeat(value).take(repeat));
    }
    Ok(values)
}

/// Where the values of a DATA statement go.
enum DataTarget {
    Whole(DeclId, u64),
    Element(DeclId, u64),
}

fn from_data_entry(context: &mut Context, scope: ScopeId, entry: &synast::DataEntry) -> SemaResult<()> {
    let mut targets = Vec::with_capacity(entry.targets.len());
    let mut needed: u64 = 0;
    for lhs in &entry.targets {
        let texpr = resolve_spec_lvalue(context, scope, lhs)?;
        let target = match texpr.lvalue() {
            Some(LValue::Variable(id)) => {
                let decl = context.decl(*id)?;
                let count = if decl.is_array() {
                    decl.elem_count().map_err(|e| e.or_range(lhs.range()))?
                } else {
                    1
                };
                DataTarget::Whole(*id, count)
            }
            Some(LValue::Element(element)) => {
                let offset = element_offset(element, lhs.range())?;
                let id = element.base().lvalue().and_then(LValue::decl).ok_or_else(|| {
                    SemanticError::new(InvalidDeclaration("malformed DATA target".to_string()), lhs.range())
                })?;
                DataTarget::Element(id, offset)
            }
            _ => {
                return Err(SemanticError::new(
                    InvalidDeclaration("DATA target must be a variable or array element".to_string()),
                    lhs.range(),
                ))
            }
        };
        needed += match target {
            DataTarget::Whole(_, count) => count,
            DataTarget::Element(..) => 1,
        };
        targets.push(target);
    }
    let values = from_clist(context, scope, &entry.values)?;
    if values.len() as u64 != needed {
        let range = entry.targets.first().map_or_else(TextRange::default, |t| t.range());
        return Err(SemanticError::new(
            InvalidDeclaration(format!("DATA has {} values for {needed} targets", values.len())),
            range,
        ));
    }
    let mut rest = values.as_slice();
    for target in targets {
        match target {
            DataTarget::Whole(id, count) => {
                let (now, later) = rest.split_at(count as usize);
                if context.decl(id)?.is_array() {
                    context.decl_init_array(id, now)?;
                } else {
                    context.decl_init(id, &now[0])?;
                }
                rest = later;
            }
            DataTarget::Element(id, offset) => {
                context.decl_init_offset(id, offset, &rest[0])?;
                rest = &rest[1..];
            }
        }
    }
    Ok(())
}

/// Storage offset of an array element with constant subscripts.
fn element_offset(element: &asg::ArrayElement, range: TextRange) -> SemaResult<u64> {
    let mut subscripts = Vec::with_capacity(element.subscripts().len());
    for subscript in element.subscripts() {
        let value = subscript
            .constant_value()
            .and_then(|v| v.as_integer())
            .and_then(|i| i64::try_from(i).ok())
            .ok_or_else(|| SemanticError::new(NotConstant, subscript.range()))?;
        subscripts.push(value);
    }
    let base = element.base().get_type();
    let shape = base.array().ok_or_else(|| {
        SemanticError::new(SubscriptError("element of a scalar".to_string()), range)
    })?;
    shape
        .linear_offset(&subscripts)
        .ok_or_else(|| SemanticError::new(SubscriptError("subscript out of bounds".to_string()), range))
}

fn from_structure_def(context: &mut Context, scope: ScopeId, def: &synast::StructureDef) -> SemaResult<()> {
    let mut members = Vec::new();
    for decl_stmt in &def.members {
        let base = spec_from_type_spec(context, scope, &decl_stmt.ty)?;
        for entity in &decl_stmt.decls {
            if entity.init.is_some() {
                return Err(SemanticError::new(
                    InvalidDeclaration(format!("member `{}` has an initializer", entity.name.text())),
                    entity.range,
                ));
            }
            let mut spec = base.clone();
            if let Some(star) = &entity.star_len {
                spec = apply_star_len(context, scope, spec, star)?;
            }
            if let Some(dims) = entity.dims.as_ref().or(decl_stmt.ty.attributes.dimension.as_ref()) {
                spec = spec.with_array(shape_from_array_spec(context, scope, dims, false)?);
            }
            let ty = context.type_from_spec(&spec).map_err(|e| e.or_range(entity.range))?;
            members.push(StructureMember {
                name: entity.name.text.clone(),
                ty,
            });
        }
    }
    let case = context.options().case_sensitive;
    let structure = StructureRef::new(def.name.text.clone(), members, case).map_err(|e| e.or_range(def.range))?;
    context
        .scope_mut(scope)?
        .add_structure(structure)
        .map_err(|e| e.or_range(def.name.range))
}

//
// Type specifications
//

fn spec_from_type_spec(context: &mut Context, scope: ScopeId, ts: &synast::TypeSpec) -> SemaResult<Spec> {
    let mut spec = match &ts.base {
        synast::BaseType::Logical => Spec::new(TypeKind::Logical),
        synast::BaseType::Integer => Spec::new(TypeKind::Integer),
        synast::BaseType::Real => Spec::new(TypeKind::Real),
        synast::BaseType::DoublePrecision => Spec::new(TypeKind::Real).with_kind(8),
        synast::BaseType::Complex => Spec::new(TypeKind::Complex),
        synast::BaseType::DoubleComplex => Spec::new(TypeKind::Complex).with_kind(8),
        synast::BaseType::Byte => Spec::new(TypeKind::Byte),
        synast::BaseType::Character => Spec::new(TypeKind::Character),
        synast::BaseType::Type(name) => {
            let def = context
                .lookup_structure(scope, name.text())
                .ok_or_else(|| SemanticError::new(UndeclaredReference(name.text.clone()), name.range))?;
            Spec::structure(def)
        }
    };
    let double = matches!(
        ts.base,
        synast::BaseType::DoublePrecision | synast::BaseType::DoubleComplex
    );
    if let Some(kind) = &ts.kind {
        if double {
            return Err(SemanticError::new(
                InvalidDeclaration("DOUBLE types take no KIND".to_string()),
                ts.range,
            ));
        }
        spec = spec.with_kind(constant_kind(context, scope, kind)?);
    }
    if let Some(len) = &ts.len {
        spec = spec.with_len(char_len(context, scope, len)?);
    }
    if let Some(star) = &ts.star_len {
        if double {
            return Err(SemanticError::new(
                InvalidDeclaration("DOUBLE types take no length".to_string()),
                ts.range,
            ));
        }
        spec = apply_star_len(context, scope, spec, star)?;
    }
    Ok(spec.with_flags(flags_from_attributes(&ts.attributes)))
}

fn flags_from_attributes(attributes: &synast::Attributes) -> DeclFlags {
    let mut flags = DeclFlags::empty();
    flags.set(DeclFlags::STATIC, attributes.is_static);
    flags.set(DeclFlags::AUTOMATIC, attributes.is_automatic);
    flags.set(DeclFlags::VOLATILE, attributes.is_volatile);
    flags.set(DeclFlags::EXTERNAL, attributes.is_external);
    flags.set(DeclFlags::INTRINSIC, attributes.is_intrinsic);
    flags.set(DeclFlags::TARGET, attributes.is_target);
    flags.set(DeclFlags::PARAMETER, attributes.is_parameter);
    flags
}

/// `*N` is the length of a CHARACTER and the byte size of anything else. COMPLEX*8
/// is two REAL(4) parts.
fn apply_star_len(context: &mut Context, scope: ScopeId, spec: Spec, star: &synast::LenSpec) -> SemaResult<Spec> {
    if spec.type_kind == TypeKind::Character {
        let len = char_len(context, scope, star)?;
        return Ok(spec.with_len(len));
    }
    let synast::LenSpec::Expr(expr) = star else {
        return Err(invalid_kind_selector(spec.type_kind));
    };
    let bytes = constant_kind(context, scope, expr)?;
    let kind = match spec.type_kind {
        TypeKind::Complex if bytes % 2 == 0 => bytes / 2,
        TypeKind::Complex => return Err(invalid_kind_selector(TypeKind::Complex)),
        _ => bytes,
    };
    Ok(spec.with_kind(kind))
}

fn invalid_kind_selector(kind: TypeKind) -> SemanticError {
    InvalidDeclaration(format!("invalid size selector for {}", kind.name())).into()
}

fn constant_i64(context: &mut Context, scope: ScopeId, expr: &synast::Expr) -> SemaResult<i64> {
    let value = resolve_constant(context, scope, expr).map_err(|e| e.or_range(expr.range()))?;
    value
        .as_integer()
        .and_then(|i| i64::try_from(i).ok())
        .ok_or_else(|| {
            SemanticError::new(
                InvalidDeclaration(format!("expected an INTEGER constant, not {}", value.get_type())),
                expr.range(),
            )
        })
}

fn constant_kind(context: &mut Context, scope: ScopeId, expr: &synast::Expr) -> SemaResult<Kind> {
    let value = constant_i64(context, scope, expr)?;
    Kind::try_from(value).map_err(|_| {
        SemanticError::new(InvalidDeclaration(format!("KIND={value}")), expr.range())
    })
}

/// A negative length declares an empty string.
fn char_len(context: &mut Context, scope: ScopeId, len: &synast::LenSpec) -> SemaResult<CharLen> {
    match len {
        synast::LenSpec::Star => Ok(CharLen::Assumed),
        synast::LenSpec::Expr(expr) => {
            let len = constant_i64(context, scope, expr)?;
            Ok(CharLen::Known(u32::try_from(len.max(0)).unwrap_or(u32::MAX)))
        }
    }
}

/// Resolve array bounds. Only a dummy argument may have bounds that are not
/// constant, or an assumed size.
fn shape_from_array_spec(
    context: &mut Context,
    scope: ScopeId,
    spec: &synast::ArraySpec,
    is_dummy: bool,
) -> SemaResult<ArrayShape> {
    let mut dims = Vec::with_capacity(spec.dims.len());
    for dim in &spec.dims {
        let lower = match &dim.lower {
            Some(expr) => bound(context, scope, expr)?,
            None => Bound::Const(1),
        };
        let upper = match &dim.upper {
            synast::DimBound::Expr(expr) => bound(context, scope, expr)?,
            synast::DimBound::Star => Bound::Assumed,
        };
        dims.push(ArrayDim { lower, upper });
    }
    let shape = ArrayShape::new(dims).map_err(|e| e.or_range(spec.range))?;
    if !shape.is_constant() && !is_dummy {
        return Err(SemanticError::new(
            InvalidDeclaration("only dummy arguments can have bounds that are not constant".to_string()),
            spec.range,
        ));
    }
    Ok(shape)
}

fn bound(context: &mut Context, scope: ScopeId, expr: &synast::Expr) -> SemaResult<Bound> {
    let texpr = resolve_spec_expr(context, scope, expr)?;
    if !texpr.get_type().is_integer() || texpr.get_type().is_array() {
        return Err(SemanticError::new(
            TypeMismatch(format!("array bound of type {}", texpr.get_type())),
            expr.range(),
        ));
    }
    match texpr.resolve() {
        Ok(value) => value
            .as_integer()
            .and_then(|i| i64::try_from(i).ok())
            .map(Bound::Const)
            .ok_or_else(|| SemanticError::new(Overflow, expr.range())),
        Err(err) if *err.kind() == NotConstant => Ok(Bound::Adjustable),
        Err(err) => Err(err),
    }
}

//
// Pass 3: executable statements.
//

#[instrument(skip_all, fields(unit = info.name.as_deref()))]
fn from_execution_part(
    context: &mut Context,
    errors: &mut SemanticErrorList,
    unit: &synast::ProgramUnit,
    info: UnitInfo,
) -> asg::ProgramUnit {
    let mut program_unit = asg::ProgramUnit::new(info.kind, info.name.clone(), info.scope);
    let mut labels: HashMap<u32, TextRange> = HashMap::new();
    for stmt in &unit.body {
        if let Some(label) = stmt.label {
            if labels.insert(label, stmt.range).is_some() {
                errors.insert(SemanticError::new(DuplicateName(label.to_string().into()), stmt.range));
            }
        }
    }
    let alt_returns = has_alt_returns(context, info.scope);
    for stmt in unit.body.iter().filter(|s| s.is_executable()) {
        let analyzed = from_exec_stmt(context, info.scope, info.kind, alt_returns, stmt)
            .and_then(|s| check_label_refs(&s, &labels).map(|()| s));
        match analyzed {
            Ok(stmt) => program_unit.insert_stmt(stmt),
            Err(err) => errors.insert(err.or_range(stmt.range)),
        }
    }
    program_unit
}

fn has_alt_returns(context: &Context, scope: ScopeId) -> bool {
    context
        .scope(scope)
        .is_ok_and(|s| s.args().contains(&DummyArgument::AltReturn))
}

fn from_exec_stmt(
    context: &mut Context,
    scope: ScopeId,
    kind: ScopeKind,
    alt_returns: bool,
    stmt: &synast::Stmt,
) -> SemaResult<asg::LabeledStmt> {
    let analyzed = match &stmt.kind {
        synast::StmtKind::Assignment { lhs, rhs } => from_assignment(context, scope, lhs, rhs)?,
        synast::StmtKind::Call { name, args } => {
            let (decl, args) = resolve_call(context, scope, name, args)?;
            asg::CallStmt::new(decl, args).to_stmt()
        }
        synast::StmtKind::If { cond, then } => {
            let condition = resolve_expr(context, scope, cond)?;
            let ty = condition.get_type();
            if !ty.is_logical() || ty.is_array() {
                return Err(SemanticError::new(
                    TypeMismatch(format!("IF condition is {ty}, not LOGICAL")),
                    cond.range(),
                ));
            }
            if matches!(then.kind, synast::StmtKind::If { .. }) || !then.is_executable() {
                return Err(SemanticError::new(
                    InvalidDeclaration("statement not allowed in a logical IF".to_string()),
                    then.range,
                ));
            }
            let then = from_exec_stmt(context, scope, kind, alt_returns, then)?;
            asg::If::new(condition, then).to_stmt()
        }
        synast::StmtKind::Continue => asg::Stmt::Continue,
        synast::StmtKind::GoTo(label) => asg::Stmt::GoTo(*label),
        synast::StmtKind::Return(value) => {
            let value = match value {
                None => None,
                Some(expr) => {
                    if !alt_returns {
                        return Err(SemanticError::new(
                            ArgumentMismatch(format!(
                                "alternate RETURN in a {kind:?} without alternate return arguments"
                            )),
                            expr.range(),
                        ));
                    }
                    Some(scalar_of(context, scope, expr, |t| t.is_integer(), "INTEGER")?)
                }
            };
            asg::Stmt::Return(value)
        }
        synast::StmtKind::Stop(code) => {
            let code = match code {
                None => None,
                Some(expr) => Some(scalar_of(
                    context,
                    scope,
                    expr,
                    |t| t.is_integer() || t.is_character(),
                    "INTEGER or CHARACTER",
                )?),
            };
            asg::Stmt::Stop(code)
        }
        _ => {
            return Err(SemanticError::new(
                InvalidDeclaration("specification statement among executable statements".to_string()),
                stmt.range,
            ))
        }
    };
    Ok(asg::LabeledStmt::new(stmt.label, analyzed, stmt.range))
}

fn scalar_of(
    context: &mut Context,
    scope: ScopeId,
    expr: &synast::Expr,
    accept: impl Fn(&crate::types::Type) -> bool,
    expected: &str,
) -> SemaResult<TExpr> {
    let texpr = resolve_expr(context, scope, expr)?;
    let ty = texpr.get_type();
    if !accept(ty) || ty.is_array() {
        return Err(SemanticError::new(
            TypeMismatch(format!("expected {expected}, not {ty}")),
            expr.range(),
        ));
    }
    Ok(texpr)
}

/// Assignment converts the value to the type of the target. A scalar may be assigned
/// to a whole array.
fn from_assignment(
    context: &mut Context,
    scope: ScopeId,
    lhs: &synast::Lhs,
    rhs: &synast::Expr,
) -> SemaResult<asg::Stmt> {
    let target = resolve_lvalue(context, scope, lhs)?;
    let value = resolve_expr(context, scope, rhs)?;
    let (tty, vty) = (target.get_type().clone(), value.get_type().clone());
    let mismatch = || {
        SemanticError::new(
            TypeMismatch(format!("cannot assign {vty} to {tty}")),
            rhs.range(),
        )
    };
    if vty.is_array() && vty.array() != tty.array() {
        return Err(mismatch());
    }
    let elem = context.types.element(&tty);
    let value_elem = context.types.element(&vty);
    let value = if elem == value_elem {
        value
    } else if elem.is_character() && value_elem.is_character() {
        // Lengths differ: the value is padded or truncated on assignment.
        if elem.kind() != value_elem.kind() {
            return Err(mismatch());
        }
        value
    } else if can_cast(&value_elem, &elem) {
        let target_ty = if vty.is_array() { tty.clone() } else { elem };
        cast_to(context, value, &target_ty)?
    } else {
        return Err(mismatch());
    };
    Ok(asg::Assignment::new(target, value).to_stmt())
}

fn check_label_refs(stmt: &asg::LabeledStmt, labels: &HashMap<u32, TextRange>) -> SemaResult<()> {
    let undefined = |label: u32| {
        SemanticError::new(UndeclaredReference(format!("label {label}").into()), stmt.range())
    };
    match stmt.stmt() {
        asg::Stmt::GoTo(label) if !labels.contains_key(label) => Err(undefined(*label)),
        asg::Stmt::Call(call) => {
            for arg in call.args() {
                if let Expr::AltReturn(label) = arg.expr().expression() {
                    if !labels.contains_key(label) {
                        return Err(undefined(*label));
                    }
                }
            }
            Ok(())
        }
        asg::Stmt::If(if_stmt) => check_label_refs(if_stmt.then_branch(), labels),
        _ => Ok(()),
    }
}
