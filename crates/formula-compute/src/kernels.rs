//! Scalar functions and null rules for every operator.
//!
//! Operands arrive already converted to the instruction's compute type, so both sides of a binary
//! operator share a lane. Values are always computed, whether or not the result is valid.

use crate::operator::Operator;
use crate::value::Value;
use std::cmp::Ordering;

/// Apply a unary operator. Returns the result value and its validity.
#[inline]
pub fn unary(op: Operator, v: Value, valid: bool) -> (Value, bool) {
    match op {
        Operator::IsNull => (Value::Bool(!valid), true),
        Operator::IsValid => (Value::Bool(valid), true),
        _ => (unary_value(op, v), valid),
    }
}

/// Apply a binary operator. Returns the result value and its validity.
#[inline]
pub fn binary(op: Operator, a: Value, a_valid: bool, b: Value, b_valid: bool) -> (Value, bool) {
    match op {
        Operator::NullEqual => {
            let eq = match (a_valid, b_valid) {
                (true, true) => compare(a, b) == Some(Ordering::Equal),
                (false, false) => true,
                _ => false,
            };
            (Value::Bool(eq), true)
        }
        Operator::NullLogicalAnd => {
            let (x, y) = (a.truthy(), b.truthy());
            if (a_valid && !x) || (b_valid && !y) {
                (Value::Bool(false), true)
            } else {
                (Value::Bool(x && y), a_valid && b_valid)
            }
        }
        Operator::NullLogicalOr => {
            let (x, y) = (a.truthy(), b.truthy());
            if (a_valid && x) || (b_valid && y) {
                (Value::Bool(true), true)
            } else {
                (Value::Bool(x || y), a_valid && b_valid)
            }
        }
        Operator::Coalesce => {
            if a_valid || !b_valid {
                (a, a_valid)
            } else {
                (b, true)
            }
        }
        _ => (binary_value(op, a, b), a_valid && b_valid),
    }
}

fn unary_value(op: Operator, v: Value) -> Value {
    match op {
        Operator::Identity
        | Operator::CastToInt64
        | Operator::CastToUInt64
        | Operator::CastToFloat64 => v,
        Operator::Not => Value::Bool(!v.truthy()),
        Operator::BitInvert => match v {
            Value::Bool(b) => Value::Bool(!b),
            Value::Int(x) => Value::Int(!x),
            Value::UInt(x) => Value::UInt(!x),
            Value::Float(_) => v,
        },
        Operator::Negate => match v {
            Value::Int(x) => Value::Int(x.wrapping_neg()),
            Value::UInt(x) => Value::UInt(x.wrapping_neg()),
            Value::Float(x) => Value::Float(-x),
            Value::Bool(_) => v,
        },
        Operator::Abs => match v {
            Value::Int(x) => Value::Int(x.wrapping_abs()),
            Value::Float(x) => Value::Float(x.abs()),
            Value::UInt(_) | Value::Bool(_) => v,
        },
        Operator::Ceil | Operator::Floor | Operator::Rint => match v {
            Value::Float(x) => Value::Float(match op {
                Operator::Ceil => x.ceil(),
                Operator::Floor => x.floor(),
                _ => x.round_ties_even(),
            }),
            _ => v,
        },
        _ => {
            let x = v.to_f64();
            Value::Float(match op {
                Operator::Sqrt => x.sqrt(),
                Operator::Cbrt => x.cbrt(),
                Operator::Exp => x.exp(),
                Operator::Log => x.ln(),
                Operator::Sin => x.sin(),
                Operator::Cos => x.cos(),
                Operator::Tan => x.tan(),
                Operator::ArcSin => x.asin(),
                Operator::ArcCos => x.acos(),
                Operator::ArcTan => x.atan(),
                Operator::Sinh => x.sinh(),
                Operator::Cosh => x.cosh(),
                Operator::Tanh => x.tanh(),
                Operator::ArcSinh => x.asinh(),
                Operator::ArcCosh => x.acosh(),
                Operator::ArcTanh => x.atanh(),
                _ => x,
            })
        }
    }
}

fn binary_value(op: Operator, a: Value, b: Value) -> Value {
    match op {
        Operator::Add
        | Operator::Sub
        | Operator::Mul
        | Operator::Div
        | Operator::FloorDiv
        | Operator::Mod
        | Operator::PyMod
        | Operator::Pow => match (a, b) {
            (Value::Int(x), Value::Int(y)) => Value::Int(int_arith(op, x, y)),
            (Value::UInt(x), Value::UInt(y)) => Value::UInt(uint_arith(op, x, y)),
            _ => Value::Float(float_arith(op, a.to_f64(), b.to_f64())),
        },
        Operator::TrueDiv => Value::Float(a.to_f64() / b.to_f64()),
        Operator::Equal => Value::Bool(compare(a, b) == Some(Ordering::Equal)),
        Operator::NotEqual => Value::Bool(compare(a, b) != Some(Ordering::Equal)),
        Operator::Less => Value::Bool(compare(a, b) == Some(Ordering::Less)),
        Operator::Greater => Value::Bool(compare(a, b) == Some(Ordering::Greater)),
        Operator::LessEqual => Value::Bool(matches!(
            compare(a, b),
            Some(Ordering::Less | Ordering::Equal)
        )),
        Operator::GreaterEqual => Value::Bool(matches!(
            compare(a, b),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        Operator::BitwiseAnd | Operator::BitwiseOr | Operator::BitwiseXor => bitwise(op, a, b),
        Operator::LogicalAnd => Value::Bool(a.truthy() & b.truthy()),
        Operator::LogicalOr => Value::Bool(a.truthy() | b.truthy()),
        Operator::Mean | Operator::Variance | Operator::StdDev => {
            let (x, y) = (a.to_f64(), b.to_f64());
            Value::Float(match op {
                Operator::Mean => (x + y) / 2.0,
                Operator::Variance => ((x - y) / 2.0).powi(2),
                _ => (x - y).abs() / 2.0,
            })
        }
        _ => a,
    }
}

fn compare(a: Value, b: Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(&y)),
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(&y)),
        (Value::UInt(x), Value::UInt(y)) => Some(x.cmp(&y)),
        (Value::Int(x), Value::UInt(y)) => Some(i128::from(x).cmp(&i128::from(y))),
        (Value::UInt(x), Value::Int(y)) => Some(i128::from(x).cmp(&i128::from(y))),
        _ => a.to_f64().partial_cmp(&b.to_f64()),
    }
}

fn bitwise(op: Operator, a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Value::Bool(match op {
            Operator::BitwiseAnd => x & y,
            Operator::BitwiseOr => x | y,
            _ => x ^ y,
        }),
        (Value::UInt(x), Value::UInt(y)) => Value::UInt(match op {
            Operator::BitwiseAnd => x & y,
            Operator::BitwiseOr => x | y,
            _ => x ^ y,
        }),
        _ => {
            let (x, y) = (a.to_i64(), b.to_i64());
            Value::Int(match op {
                Operator::BitwiseAnd => x & y,
                Operator::BitwiseOr => x | y,
                _ => x ^ y,
            })
        }
    }
}

// Division and remainder by zero produce 0.
fn int_arith(op: Operator, x: i64, y: i64) -> i64 {
    match op {
        Operator::Add => x.wrapping_add(y),
        Operator::Sub => x.wrapping_sub(y),
        Operator::Mul => x.wrapping_mul(y),
        Operator::Pow => int_pow(x, y),
        _ if y == 0 => 0,
        Operator::Div => x.wrapping_div(y),
        Operator::FloorDiv => {
            let q = x.wrapping_div(y);
            if x.wrapping_rem(y) != 0 && ((x < 0) != (y < 0)) {
                q.wrapping_sub(1)
            } else {
                q
            }
        }
        Operator::Mod => x.wrapping_rem(y),
        Operator::PyMod => {
            let r = x.wrapping_rem(y);
            if r != 0 && ((r < 0) != (y < 0)) {
                r.wrapping_add(y)
            } else {
                r
            }
        }
        _ => x,
    }
}

fn uint_arith(op: Operator, x: u64, y: u64) -> u64 {
    match op {
        Operator::Add => x.wrapping_add(y),
        Operator::Sub => x.wrapping_sub(y),
        Operator::Mul => x.wrapping_mul(y),
        Operator::Pow => wrapping_pow(x, y),
        _ if y == 0 => 0,
        Operator::Div | Operator::FloorDiv => x / y,
        Operator::Mod | Operator::PyMod => x % y,
        _ => x,
    }
}

fn float_arith(op: Operator, x: f64, y: f64) -> f64 {
    match op {
        Operator::Add => x + y,
        Operator::Sub => x - y,
        Operator::Mul => x * y,
        Operator::Div => x / y,
        Operator::FloorDiv => (x / y).floor(),
        Operator::Mod => x % y,
        Operator::PyMod => {
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                r + y
            } else {
                r
            }
        }
        Operator::Pow => x.powf(y),
        _ => x,
    }
}

fn int_pow(base: i64, exp: i64) -> i64 {
    if exp < 0 {
        return match base {
            1 => 1,
            -1 if exp % 2 == 0 => 1,
            -1 => -1,
            _ => 0,
        };
    }
    wrapping_pow(base as u64, exp as u64) as i64
}

// Square-and-multiply modulo 2^64; identical bit pattern for signed and unsigned bases.
fn wrapping_pow(mut base: u64, mut exp: u64) -> u64 {
    let mut acc = 1u64;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    acc
}
