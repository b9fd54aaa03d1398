// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// Signature table of the intrinsic procedures, with the constant folders for those
// whose value does not depend on the target's math library.

use ordered_float::OrderedFloat;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::semantic_error::{SemaResult, SemanticErrorKind};
use crate::types::{CharLen, Kind, Type, TypeData, TypeInterner, TypeKind, TypeRef};
use crate::typeval::{TypedValue, Value};

/// What each argument of an intrinsic must be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgClass {
    Numeric,
    Integer,
    /// INTEGER or REAL.
    IntegerOrReal,
    /// REAL or COMPLEX.
    Float,
    Real,
    Complex,
    Character,
}

impl ArgClass {
    fn accepts(self, ty: &Type) -> bool {
        match self {
            ArgClass::Numeric => ty.is_numeric(),
            ArgClass::Integer => ty.is_integer(),
            ArgClass::IntegerOrReal => ty.is_integer() || ty.is_real(),
            ArgClass::Float => ty.is_real() || ty.is_complex(),
            ArgClass::Real => ty.is_real(),
            ArgClass::Complex => ty.is_complex(),
            ArgClass::Character => ty.is_character(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ArgClass::Numeric => "numeric",
            ArgClass::Integer => "INTEGER",
            ArgClass::IntegerOrReal => "INTEGER or REAL",
            ArgClass::Float => "REAL or COMPLEX",
            ArgClass::Real => "REAL",
            ArgClass::Complex => "COMPLEX",
            ArgClass::Character => "CHARACTER",
        }
    }
}

/// How the result type follows from the (promoted) argument type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultRule {
    SameAsArg,
    /// REAL of the argument's kind for COMPLEX arguments, else the argument type.
    RealPart,
    /// A fixed type, the default kind when no kind is given.
    Fixed(TypeKind, Option<Kind>),
    /// CHARACTER of length 1.
    Char1,
}

type FoldFn = fn(&[TypedValue], &TypeRef) -> SemaResult<Value>;

#[derive(Debug)]
pub struct Intrinsic {
    name: &'static str,
    min_args: usize,
    max_args: usize,
    arg_class: ArgClass,
    result: ResultRule,
    fold: Option<FoldFn>,
}

impl Intrinsic {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn min_args(&self) -> usize {
        self.min_args
    }

    pub fn max_args(&self) -> usize {
        self.max_args
    }

    pub fn arg_class(&self) -> ArgClass {
        self.arg_class
    }

    pub fn is_foldable(&self) -> bool {
        self.fold.is_some()
    }

    /// Arguments of all multi-argument intrinsics except CMPLX share one type.
    pub fn promotes_args(&self) -> bool {
        self.max_args > 1 && self.name != "CMPLX"
    }

    /// Check arity and argument classes, returning a description of the first
    /// violation as an `ArgumentMismatch`. `CMPLX(Z, Y)` with a COMPLEX `Z` is a
    /// `TypeMismatch`.
    pub fn check_args(&self, args: &[&Type]) -> SemaResult<()> {
        let mismatch = |detail: String| SemanticErrorKind::ArgumentMismatch(detail).into();
        if args.len() < self.min_args || args.len() > self.max_args {
            let expected = if self.min_args == self.max_args {
                self.min_args.to_string()
            } else if self.max_args == usize::MAX {
                format!("at least {}", self.min_args)
            } else {
                format!("{} to {}", self.min_args, self.max_args)
            };
            return Err(mismatch(format!(
                "{} takes {expected} arguments, got {}",
                self.name,
                args.len()
            )));
        }
        if self.name == "CMPLX" && args.len() == 2 && args[0].is_complex() {
            return Err(SemanticErrorKind::TypeMismatch(format!(
                "CMPLX of COMPLEX {} takes no imaginary part",
                args[0]
            ))
            .into());
        }
        for (i, ty) in args.iter().enumerate() {
            if ty.is_array() {
                return Err(mismatch(format!("argument {} of {} is an array", i + 1, self.name)));
            }
            // The imaginary part of CMPLX(X, Y) cannot itself be complex.
            let class = if self.name == "CMPLX" && i == 1 {
                ArgClass::IntegerOrReal
            } else {
                self.arg_class
            };
            if !class.accepts(ty) {
                return Err(mismatch(format!(
                    "argument {} of {} must be {}, not {ty}",
                    i + 1,
                    self.name,
                    class.describe()
                )));
            }
        }
        Ok(())
    }

    /// Result type for arguments of (promoted) type `arg`.
    pub fn result_type(&self, types: &mut TypeInterner, arg: &TypeRef) -> SemaResult<TypeRef> {
        let ty = match self.result {
            ResultRule::SameAsArg => arg.clone(),
            ResultRule::RealPart => match arg.data() {
                TypeData::Complex(k) => types.primitive(TypeKind::Real, *k)?,
                _ => arg.clone(),
            },
            ResultRule::Fixed(kind, width) => {
                let width = width.or(kind.default_kind()).unwrap_or(4);
                types.primitive(kind, width)?
            }
            ResultRule::Char1 => types.character(1, CharLen::Known(1)),
        };
        Ok(ty)
    }

    /// Evaluate on constant arguments, already converted to their promoted type.
    pub fn fold(&self, args: &[TypedValue], result: &TypeRef) -> SemaResult<TypedValue> {
        let fold = self.fold.ok_or(SemanticErrorKind::NotConstant)?;
        TypedValue::new(result.clone(), fold(args, result)?)
    }
}

impl PartialEq for Intrinsic {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Intrinsic {}

impl Hash for Intrinsic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

const fn intrinsic(
    name: &'static str,
    min_args: usize,
    max_args: usize,
    arg_class: ArgClass,
    result: ResultRule,
    fold: Option<FoldFn>,
) -> Intrinsic {
    Intrinsic {
        name,
        min_args,
        max_args,
        arg_class,
        result,
        fold,
    }
}

use ArgClass::*;
use ResultRule::*;

static INTRINSICS: &[Intrinsic] = &[
    intrinsic("ABS", 1, 1, Numeric, RealPart, Some(fold_abs)),
    intrinsic("MOD", 2, 2, IntegerOrReal, SameAsArg, Some(fold_mod)),
    intrinsic("MAX", 2, usize::MAX, IntegerOrReal, SameAsArg, Some(fold_max)),
    intrinsic("MIN", 2, usize::MAX, IntegerOrReal, SameAsArg, Some(fold_min)),
    intrinsic("SQRT", 1, 1, Float, SameAsArg, Some(fold_sqrt)),
    intrinsic("EXP", 1, 1, Float, SameAsArg, None),
    intrinsic("LOG", 1, 1, Float, SameAsArg, None),
    intrinsic("SIN", 1, 1, Float, SameAsArg, None),
    intrinsic("COS", 1, 1, Float, SameAsArg, None),
    intrinsic("TAN", 1, 1, Real, SameAsArg, None),
    intrinsic("ATAN", 1, 1, Real, SameAsArg, None),
    intrinsic("INT", 1, 1, Numeric, Fixed(TypeKind::Integer, None), Some(fold_convert)),
    intrinsic("NINT", 1, 1, Real, Fixed(TypeKind::Integer, None), Some(fold_nint)),
    intrinsic("REAL", 1, 1, Numeric, Fixed(TypeKind::Real, None), Some(fold_convert)),
    intrinsic("DBLE", 1, 1, Numeric, Fixed(TypeKind::Real, Some(8)), Some(fold_convert)),
    intrinsic("CMPLX", 1, 2, Numeric, Fixed(TypeKind::Complex, None), Some(fold_cmplx)),
    intrinsic("AIMAG", 1, 1, Complex, RealPart, Some(fold_aimag)),
    intrinsic("CONJG", 1, 1, Complex, SameAsArg, Some(fold_conjg)),
    intrinsic("LEN", 1, 1, Character, Fixed(TypeKind::Integer, None), Some(fold_len)),
    intrinsic("ICHAR", 1, 1, Character, Fixed(TypeKind::Integer, None), Some(fold_ichar)),
    intrinsic("CHAR", 1, 1, Integer, Char1, Some(fold_char)),
];

/// Find an intrinsic by name, ignoring case.
pub fn lookup(name: &str) -> Option<&'static Intrinsic> {
    INTRINSICS.iter().find(|i| i.name.eq_ignore_ascii_case(name))
}

pub fn all() -> &'static [Intrinsic] {
    INTRINSICS
}

//
// Folders
//

fn not_foldable() -> SemanticErrorKind {
    SemanticErrorKind::NotConstant
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Real(x) => Some(x.0),
        _ => None,
    }
}

fn fold_abs(args: &[TypedValue], _: &TypeRef) -> SemaResult<Value> {
    let value = match args[0].value() {
        Value::Integer(i) => Value::Integer(i.checked_abs().ok_or(SemanticErrorKind::Overflow)?),
        Value::Real(x) => Value::Real(OrderedFloat(x.0.abs())),
        Value::Complex(re, im) => Value::Real(OrderedFloat(re.0.hypot(im.0))),
        _ => return Err(not_foldable().into()),
    };
    Ok(value)
}

fn fold_mod(args: &[TypedValue], _: &TypeRef) -> SemaResult<Value> {
    let value = match (args[0].value(), args[1].value()) {
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                return Err(SemanticErrorKind::DivideByZero.into());
            }
            // The sign follows the first argument, as with Rust's `%`.
            Value::Integer(a.checked_rem(*b).ok_or(SemanticErrorKind::Overflow)?)
        }
        (Value::Real(a), Value::Real(b)) => {
            if b.0 == 0.0 {
                return Err(SemanticErrorKind::DivideByZero.into());
            }
            Value::Real(OrderedFloat(a.0 % b.0))
        }
        _ => return Err(not_foldable().into()),
    };
    Ok(value)
}

fn fold_extreme(args: &[TypedValue], pick_greater: bool) -> SemaResult<Value> {
    let mut best = args.first().ok_or_else(not_foldable)?.value().clone();
    for arg in &args[1..] {
        let replace = match (&best, arg.value()) {
            (Value::Integer(a), Value::Integer(b)) => (b > a) == pick_greater && b != a,
            (Value::Real(a), Value::Real(b)) => (b > a) == pick_greater && b != a,
            _ => return Err(not_foldable().into()),
        };
        if replace {
            best = arg.value().clone();
        }
    }
    Ok(best)
}

fn fold_max(args: &[TypedValue], _: &TypeRef) -> SemaResult<Value> {
    fold_extreme(args, true)
}

fn fold_min(args: &[TypedValue], _: &TypeRef) -> SemaResult<Value> {
    fold_extreme(args, false)
}

fn fold_sqrt(args: &[TypedValue], _: &TypeRef) -> SemaResult<Value> {
    let value = match args[0].value() {
        // SQRT of a negative REAL is left for run time to report.
        Value::Real(x) if x.0 < 0.0 => return Err(not_foldable().into()),
        Value::Real(x) => Value::Real(OrderedFloat(x.0.sqrt())),
        Value::Complex(re, im) => {
            let r = re.0.hypot(im.0);
            let real = ((r + re.0) / 2.0).sqrt();
            let imag = ((r - re.0) / 2.0).sqrt().copysign(im.0);
            Value::Complex(OrderedFloat(real), OrderedFloat(imag))
        }
        _ => return Err(not_foldable().into()),
    };
    Ok(value)
}

fn fold_convert(args: &[TypedValue], result: &TypeRef) -> SemaResult<Value> {
    Ok(args[0].cast(result)?.value().clone())
}

fn fold_nint(args: &[TypedValue], result: &TypeRef) -> SemaResult<Value> {
    let x = args[0].as_real().ok_or_else(not_foldable)?;
    // f64::round rounds half away from zero, like NINT.
    let rounded = TypedValue::new(args[0].get_type().clone(), Value::Real(OrderedFloat(x.round())))?;
    fold_convert(&[rounded], result)
}

fn fold_cmplx(args: &[TypedValue], result: &TypeRef) -> SemaResult<Value> {
    match args {
        [x] => fold_convert(args, result).or_else(|_| {
            let re = as_f64(x.value()).ok_or_else(not_foldable)?;
            Ok(Value::Complex(OrderedFloat(re), OrderedFloat(0.0)))
        }),
        [x, y] => {
            let re = as_f64(x.value()).ok_or_else(not_foldable)?;
            let im = as_f64(y.value()).ok_or_else(not_foldable)?;
            Ok(Value::Complex(OrderedFloat(re), OrderedFloat(im)))
        }
        _ => Err(not_foldable().into()),
    }
}

fn fold_aimag(args: &[TypedValue], _: &TypeRef) -> SemaResult<Value> {
    match args[0].value() {
        Value::Complex(_, im) => Ok(Value::Real(*im)),
        _ => Err(not_foldable().into()),
    }
}

fn fold_conjg(args: &[TypedValue], _: &TypeRef) -> SemaResult<Value> {
    match args[0].value() {
        Value::Complex(re, im) => Ok(Value::Complex(*re, -*im)),
        _ => Err(not_foldable().into()),
    }
}

fn fold_len(args: &[TypedValue], _: &TypeRef) -> SemaResult<Value> {
    let text = args[0].as_str().ok_or_else(not_foldable)?;
    Ok(Value::Integer(text.chars().count() as i128))
}

fn fold_ichar(args: &[TypedValue], _: &TypeRef) -> SemaResult<Value> {
    let text = args[0].as_str().ok_or_else(not_foldable)?;
    let first = text.chars().next().ok_or_else(|| {
        SemanticErrorKind::ArgumentMismatch("ICHAR of an empty string".to_string())
    })?;
    Ok(Value::Integer(i128::from(u32::from(first))))
}

fn fold_char(args: &[TypedValue], _: &TypeRef) -> SemaResult<Value> {
    let code = args[0].as_integer().ok_or_else(not_foldable)?;
    let byte = u8::try_from(code).map_err(|_| SemanticErrorKind::Overflow)?;
    Ok(Value::Character(char::from(byte).to_string()))
}

#[test]
fn test_lookup_ignores_case() {
    assert_eq!(lookup("sqrt").map(Intrinsic::name), Some("SQRT"));
    assert!(lookup("SQRTX").is_none());
}

#[test]
fn test_arity_is_checked() {
    let mut types = TypeInterner::new();
    let int = types.integer();
    let err = lookup("MOD").unwrap().check_args(&[&int]).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::ArgumentMismatch(_)));
    assert!(lookup("MAX").unwrap().check_args(&[&int, &int, &int]).is_ok());
}

#[test]
fn test_cmplx_of_complex_takes_one_argument() {
    let mut types = TypeInterner::new();
    let real = types.real();
    let complex = types.primitive(TypeKind::Complex, 4).unwrap();
    let cmplx = lookup("CMPLX").unwrap();
    let err = cmplx.check_args(&[&complex, &real]).unwrap_err();
    assert!(matches!(err.kind(), SemanticErrorKind::TypeMismatch(_)));
    assert!(cmplx.check_args(&[&complex]).is_ok());
    assert!(cmplx.check_args(&[&real, &real]).is_ok());
}
