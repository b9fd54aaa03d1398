// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

// Compile-time values and the operator semantics used to fold constant expressions.
//
// Integers are held in an `i128` and range-checked against their KIND after every
// operation. REAL(4) results are rounded through `f32`; wider kinds are computed in
// `f64`. Neither LOGICAL operator short-circuits: both operands are always values by
// the time they get here.

use ofc_syntax::ast::{ArithOp, BinaryOp, CmpOp, LogicOp, Ordering, UnaryOp};
use ordered_float::OrderedFloat;
use std::cmp;
use std::fmt;

use crate::semantic_error::{type_mismatch, SemaResult, SemanticErrorKind};
use crate::types::{CharLen, Kind, TypeData, TypeInterner, TypeKind, TypeRef};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Logical(bool),
    /// Also the representation of BYTE.
    Integer(i128),
    Real(OrderedFloat<f64>),
    Complex(OrderedFloat<f64>, OrderedFloat<f64>),
    Character(String),
}

/// A scalar constant together with its type. The value always matches the type:
/// integers are within range of their KIND, reals are rounded to it and characters
/// of known length have exactly that many characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypedValue {
    ty: TypeRef,
    value: Value,
}

fn overflow() -> SemanticErrorKind {
    SemanticErrorKind::Overflow
}

fn check_integer_range(value: i128, kind: Kind) -> SemaResult<i128> {
    let bits = (8 * kind).min(128);
    if bits == 128 {
        return Ok(value);
    }
    let max = (1i128 << (bits - 1)) - 1;
    let min = -max - 1;
    if value < min || value > max {
        return Err(overflow().into());
    }
    Ok(value)
}

fn round_real(value: f64, kind: Kind) -> SemaResult<OrderedFloat<f64>> {
    let rounded = if kind == 4 {
        f64::from(value as f32)
    } else {
        value
    };
    if !rounded.is_finite() {
        return Err(overflow().into());
    }
    Ok(OrderedFloat(rounded))
}

fn fit_char_len(text: &str, len: CharLen) -> String {
    match len {
        CharLen::Known(len) => {
            let len = len as usize;
            let mut fitted: String = text.chars().take(len).collect();
            let short = len.saturating_sub(fitted.chars().count());
            fitted.extend(std::iter::repeat(' ').take(short));
            fitted
        }
        CharLen::Assumed | CharLen::Unknown => text.to_string(),
    }
}

impl TypedValue {
    /// Build a value of type `ty`, bringing `value` to the precision of the type.
    /// Fails with `Overflow` if it does not fit and `TypeMismatch` if the value is
    /// of another kind of type altogether.
    pub fn new(ty: TypeRef, value: Value) -> SemaResult<TypedValue> {
        if ty.is_array() {
            return Err(type_mismatch(format!("constant of array type {ty}")));
        }
        let value = match (ty.data(), value) {
            (TypeData::Logical(_), Value::Logical(b)) => Value::Logical(b),
            (TypeData::Integer(k) | TypeData::Byte(k), Value::Integer(i)) => {
                Value::Integer(check_integer_range(i, *k)?)
            }
            (TypeData::Real(k), Value::Real(x)) => Value::Real(round_real(x.0, *k)?),
            (TypeData::Complex(k), Value::Complex(re, im)) => {
                Value::Complex(round_real(re.0, *k)?, round_real(im.0, *k)?)
            }
            (TypeData::Character { len, .. }, Value::Character(s)) => {
                Value::Character(fit_char_len(&s, *len))
            }
            (_, value) => {
                return Err(type_mismatch(format!("{value:?} is not a value of {ty}")));
            }
        };
        Ok(TypedValue { ty, value })
    }

    pub fn logical(types: &mut TypeInterner, value: bool) -> TypedValue {
        TypedValue {
            ty: types.logical(),
            value: Value::Logical(value),
        }
    }

    /// A default INTEGER. Fails with `Overflow` outside the range of INTEGER(4).
    pub fn integer(types: &mut TypeInterner, value: i128) -> SemaResult<TypedValue> {
        TypedValue::new(types.integer(), Value::Integer(value))
    }

    pub fn real(types: &mut TypeInterner, value: f64) -> SemaResult<TypedValue> {
        TypedValue::new(types.real(), Value::Real(OrderedFloat(value)))
    }

    pub fn character(types: &mut TypeInterner, text: &str) -> TypedValue {
        let len = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        TypedValue {
            ty: types.character(1, CharLen::Known(len)),
            value: Value::Character(text.to_string()),
        }
    }

    pub fn get_type(&self) -> &TypeRef {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self.value {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_logical(&self) -> Option<bool> {
        match self.value {
            Value::Logical(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self.value {
            Value::Real(x) => Some(x.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::Character(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to `target` the way an assignment would.
    pub fn cast(&self, target: &TypeRef) -> SemaResult<TypedValue> {
        if self.ty == *target {
            return Ok(self.clone());
        }
        let mismatch = || type_mismatch(format!("cannot convert {} to {target}", self.ty));
        let value = match (&self.value, target.data()) {
            (Value::Logical(b), TypeData::Logical(_)) => Value::Logical(*b),
            (Value::Integer(i), TypeData::Integer(_) | TypeData::Byte(_)) => Value::Integer(*i),
            (Value::Integer(i), TypeData::Real(_)) => Value::Real(OrderedFloat(*i as f64)),
            (Value::Integer(i), TypeData::Complex(_)) => {
                Value::Complex(OrderedFloat(*i as f64), OrderedFloat(0.0))
            }
            (Value::Real(x), TypeData::Integer(_) | TypeData::Byte(_)) => {
                Value::Integer(truncate(x.0)?)
            }
            (Value::Real(x), TypeData::Real(_)) => Value::Real(*x),
            (Value::Real(x), TypeData::Complex(_)) => Value::Complex(*x, OrderedFloat(0.0)),
            (Value::Complex(re, _), TypeData::Integer(_) | TypeData::Byte(_)) => {
                Value::Integer(truncate(re.0)?)
            }
            (Value::Complex(re, _), TypeData::Real(_)) => Value::Real(*re),
            (Value::Complex(re, im), TypeData::Complex(_)) => Value::Complex(*re, *im),
            (Value::Character(s), TypeData::Character { kind, .. })
                if Some(*kind) == self.ty.kind() =>
            {
                Value::Character(s.clone())
            }
            _ => return Err(mismatch()),
        };
        TypedValue::new(target.clone(), value)
    }
}

fn truncate(x: f64) -> SemaResult<i128> {
    // 2^127 is exactly representable, so the comparison is exact.
    if !x.is_finite() || x.abs() >= 2f64.powi(127) {
        return Err(overflow().into());
    }
    Ok(x.trunc() as i128)
}

//
// Complex helpers, on (re, im) pairs.
//

type Cplx = (f64, f64);

fn cmul(a: Cplx, b: Cplx) -> Cplx {
    (a.0 * b.0 - a.1 * b.1, a.0 * b.1 + a.1 * b.0)
}

fn cdiv(a: Cplx, b: Cplx) -> SemaResult<Cplx> {
    let denom = b.0 * b.0 + b.1 * b.1;
    if denom == 0.0 {
        return Err(SemanticErrorKind::DivideByZero.into());
    }
    Ok((
        (a.0 * b.0 + a.1 * b.1) / denom,
        (a.1 * b.0 - a.0 * b.1) / denom,
    ))
}

fn cpowi(z: Cplx, n: i128) -> SemaResult<Cplx> {
    let mut result = (1.0, 0.0);
    let mut base = z;
    let mut e = n.unsigned_abs();
    while e > 0 {
        if e & 1 == 1 {
            result = cmul(result, base);
        }
        base = cmul(base, base);
        e >>= 1;
    }
    if n < 0 {
        return cdiv((1.0, 0.0), result);
    }
    Ok(result)
}

fn cpow(z: Cplx, w: Cplx) -> SemaResult<Cplx> {
    if z == (0.0, 0.0) {
        if w.0 > 0.0 {
            return Ok((0.0, 0.0));
        }
        return Err(SemanticErrorKind::DivideByZero.into());
    }
    let ln = (z.0.hypot(z.1).ln(), z.1.atan2(z.0));
    let t = cmul(w, ln);
    let scale = t.0.exp();
    Ok((scale * t.1.cos(), scale * t.1.sin()))
}

fn int_pow(base: i128, exp: i128) -> SemaResult<i128> {
    match (base, exp) {
        (0, e) if e < 0 => Err(SemanticErrorKind::DivideByZero.into()),
        (1, _) => Ok(1),
        (-1, e) => Ok(if e % 2 == 0 { 1 } else { -1 }),
        (_, e) if e < 0 => Ok(0),
        (0, _) => Ok(if exp == 0 { 1 } else { 0 }),
        (b, e) => {
            let e = u32::try_from(e).map_err(|_| overflow())?;
            b.checked_pow(e).ok_or_else(|| overflow().into())
        }
    }
}

fn arith(op: ArithOp, lhs: &Value, rhs: &Value) -> SemaResult<Value> {
    let int_result = |v: Option<i128>| v.map(Value::Integer).ok_or_else(overflow);
    let value = match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => match op {
            ArithOp::Add => int_result(a.checked_add(*b))?,
            ArithOp::Sub => int_result(a.checked_sub(*b))?,
            ArithOp::Mul => int_result(a.checked_mul(*b))?,
            ArithOp::Div => {
                if *b == 0 {
                    return Err(SemanticErrorKind::DivideByZero.into());
                }
                // Rust integer division already truncates toward zero.
                int_result(a.checked_div(*b))?
            }
        },
        (Value::Real(a), Value::Real(b)) => {
            let (a, b) = (a.0, b.0);
            let x = match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => {
                    if b == 0.0 {
                        return Err(SemanticErrorKind::DivideByZero.into());
                    }
                    a / b
                }
            };
            Value::Real(OrderedFloat(x))
        }
        (Value::Complex(ar, ai), Value::Complex(br, bi)) => {
            let (a, b) = ((ar.0, ai.0), (br.0, bi.0));
            let (re, im) = match op {
                ArithOp::Add => (a.0 + b.0, a.1 + b.1),
                ArithOp::Sub => (a.0 - b.0, a.1 - b.1),
                ArithOp::Mul => cmul(a, b),
                ArithOp::Div => cdiv(a, b)?,
            };
            Value::Complex(OrderedFloat(re), OrderedFloat(im))
        }
        _ => return Err(type_mismatch(format!("operands of `{op}` differ in type"))),
    };
    Ok(value)
}

fn power(lhs: &Value, rhs: &Value) -> SemaResult<Value> {
    let value = match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Value::Integer(int_pow(*a, *b)?),
        (Value::Real(a), Value::Integer(b)) => {
            if a.0 == 0.0 && *b < 0 {
                return Err(SemanticErrorKind::DivideByZero.into());
            }
            let x = match i32::try_from(*b) {
                Ok(b) => a.0.powi(b),
                Err(_) => a.0.powf(*b as f64),
            };
            Value::Real(OrderedFloat(x))
        }
        (Value::Real(a), Value::Real(b)) => {
            if a.0 == 0.0 && b.0 < 0.0 {
                return Err(SemanticErrorKind::DivideByZero.into());
            }
            Value::Real(OrderedFloat(a.0.powf(b.0)))
        }
        (Value::Complex(re, im), Value::Integer(n)) => {
            let (re, im) = cpowi((re.0, im.0), *n)?;
            Value::Complex(OrderedFloat(re), OrderedFloat(im))
        }
        (Value::Complex(ar, ai), Value::Complex(br, bi)) => {
            let (re, im) = cpow((ar.0, ai.0), (br.0, bi.0))?;
            Value::Complex(OrderedFloat(re), OrderedFloat(im))
        }
        _ => return Err(type_mismatch("operands of `**` are not numeric")),
    };
    Ok(value)
}

fn padded(text: &str, len: usize) -> impl Iterator<Item = char> + '_ {
    text.chars().chain(std::iter::repeat(' ')).take(len)
}

/// Character comparison pads the shorter operand with blanks.
fn compare_blank_padded(a: &str, b: &str) -> cmp::Ordering {
    let len = a.chars().count().max(b.chars().count());
    padded(a, len).cmp(padded(b, len))
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> SemaResult<bool> {
    let ordering = match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        // Unordered (NaN) operands compare false, except under `.NE.`.
        (Value::Real(a), Value::Real(b)) => a.0.partial_cmp(&b.0),
        (Value::Character(a), Value::Character(b)) => Some(compare_blank_padded(a, b)),
        (Value::Complex(ar, ai), Value::Complex(br, bi)) => match op {
            CmpOp::Eq { negated } => {
                let equal = ar.0 == br.0 && ai.0 == bi.0;
                return Ok(equal != negated);
            }
            CmpOp::Ord { .. } => return Err(type_mismatch("COMPLEX values are not ordered")),
        },
        _ => return Err(type_mismatch(format!("cannot compare with `{op}`"))),
    };
    let result = match op {
        CmpOp::Eq { negated } => (ordering == Some(cmp::Ordering::Equal)) != negated,
        CmpOp::Ord { ordering: dir, strict } => match ordering {
            None => false,
            Some(o) => match (dir, strict) {
                (Ordering::Less, true) => o.is_lt(),
                (Ordering::Less, false) => o.is_le(),
                (Ordering::Greater, true) => o.is_gt(),
                (Ordering::Greater, false) => o.is_ge(),
            },
        },
    };
    Ok(result)
}

fn logic(op: LogicOp, lhs: &Value, rhs: &Value) -> SemaResult<bool> {
    let (Value::Logical(a), Value::Logical(b)) = (lhs, rhs) else {
        return Err(type_mismatch(format!("operands of `{op}` must be LOGICAL")));
    };
    Ok(match op {
        LogicOp::And => *a && *b,
        LogicOp::Or => *a || *b,
        LogicOp::Eqv => a == b,
        LogicOp::Neqv => a != b,
    })
}

/// Evaluate `lhs op rhs` into a value of type `result`. The operands have already been
/// converted to the operand type of the operation.
pub fn fold_binary(
    op: BinaryOp,
    lhs: &TypedValue,
    rhs: &TypedValue,
    result: &TypeRef,
) -> SemaResult<TypedValue> {
    let value = match op {
        BinaryOp::ArithOp(op) => arith(op, &lhs.value, &rhs.value)?,
        BinaryOp::PowerOp => power(&lhs.value, &rhs.value)?,
        BinaryOp::ConcatenationOp => match (&lhs.value, &rhs.value) {
            (Value::Character(a), Value::Character(b)) => Value::Character(format!("{a}{b}")),
            _ => return Err(type_mismatch("operands of `//` must be CHARACTER")),
        },
        BinaryOp::CmpOp(op) => Value::Logical(compare(op, &lhs.value, &rhs.value)?),
        BinaryOp::LogicOp(op) => Value::Logical(logic(op, &lhs.value, &rhs.value)?),
    };
    TypedValue::new(result.clone(), value)
}

pub fn fold_unary(op: UnaryOp, operand: &TypedValue, result: &TypeRef) -> SemaResult<TypedValue> {
    let value = match (op, &operand.value) {
        (UnaryOp::Plus, value) => value.clone(),
        (UnaryOp::Neg, Value::Integer(i)) => Value::Integer(i.checked_neg().ok_or_else(overflow)?),
        (UnaryOp::Neg, Value::Real(x)) => Value::Real(-*x),
        (UnaryOp::Neg, Value::Complex(re, im)) => Value::Complex(-*re, -*im),
        (UnaryOp::Not, Value::Logical(b)) => Value::Logical(!b),
        (op, _) => {
            return Err(type_mismatch(format!(
                "`{op}` cannot be applied to {}",
                operand.ty
            )))
        }
    };
    TypedValue::new(result.clone(), value)
}

//
// Printing as Fortran literals.
//

fn fmt_real(f: &mut fmt::Formatter<'_>, x: f64, kind: Kind) -> fmt::Result {
    match kind {
        4 => write!(f, "{}", format!("{:?}", x as f32).replace('e', "E")),
        8 => {
            let text = format!("{x:?}");
            if text.contains('e') {
                write!(f, "{}", text.replace('e', "D"))
            } else {
                write!(f, "{text}D0")
            }
        }
        k => write!(f, "{x:?}_{k}"),
    }
}

fn kind_suffix(ty: &TypeRef) -> String {
    match ty.kind() {
        Some(k) if Some(k) != ty.type_kind().default_kind() => format!("_{k}"),
        _ => String::new(),
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.ty.kind().unwrap_or(4);
        match &self.value {
            Value::Logical(true) => write!(f, ".TRUE.{}", kind_suffix(&self.ty)),
            Value::Logical(false) => write!(f, ".FALSE.{}", kind_suffix(&self.ty)),
            Value::Integer(i) if self.ty.type_kind() == TypeKind::Byte => write!(f, "{i}_1"),
            Value::Integer(i) => write!(f, "{i}{}", kind_suffix(&self.ty)),
            Value::Real(x) => fmt_real(f, x.0, kind),
            Value::Complex(re, im) => {
                f.write_str("(")?;
                fmt_real(f, re.0, kind)?;
                f.write_str(", ")?;
                fmt_real(f, im.0, kind)?;
                f.write_str(")")
            }
            Value::Character(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}
