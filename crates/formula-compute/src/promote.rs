//! Operand/result type rules for every operator.
//!
//! [`promote`] is a total function of the operator and its operand types: it either produces a
//! [`Promotion`] or a `TypeMismatch`. Nothing here depends on row values.

use crate::aggregate::reduction_output_type;
use crate::error::{ComputeError, ComputeResult};
use crate::operator::Operator;
use formula_columnar::DataType;

/// `compute` is the type every operand is converted to before the scalar function runs;
/// `output` is the type of the instruction's result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Promotion {
    pub compute: DataType,
    pub output: DataType,
}

impl Promotion {
    fn same(ty: DataType) -> Self {
        Self {
            compute: ty,
            output: ty,
        }
    }

    fn new(compute: DataType, output: DataType) -> Self {
        Self { compute, output }
    }
}

/// The smallest type both `a` and `b` convert into without changing meaning, if there is one.
pub fn common_type(a: DataType, b: DataType) -> Option<DataType> {
    if !a.is_fixed_width() || !b.is_fixed_width() {
        return None;
    }
    if a == b {
        return Some(a);
    }
    match (a, b) {
        (DataType::Bool, other) | (other, DataType::Bool) if other.is_numeric() => Some(other),
        (x, y) if x.is_integer() && y.is_integer() => Some(common_integer(x, y)),
        (x, y) if x.is_floating() && y.is_floating() => Some(DataType::Float64),
        (DataType::Float32, int) | (int, DataType::Float32) if int.is_integer() => {
            if bits(int) <= 16 {
                Some(DataType::Float32)
            } else {
                Some(DataType::Float64)
            }
        }
        (DataType::Float64, int) | (int, DataType::Float64) if int.is_integer() => {
            Some(DataType::Float64)
        }
        _ => None,
    }
}

fn bits(ty: DataType) -> u32 {
    ty.bit_width().unwrap_or(64)
}

fn common_integer(a: DataType, b: DataType) -> DataType {
    if a.is_signed_integer() == b.is_signed_integer() {
        return if bits(a) >= bits(b) { a } else { b };
    }
    let (signed, unsigned) = if a.is_signed_integer() { (a, b) } else { (b, a) };
    if bits(unsigned) < bits(signed) {
        return signed;
    }
    DataType::signed_of_width(bits(unsigned) * 2).unwrap_or(DataType::Float64)
}

fn is_truthy_kind(ty: DataType) -> bool {
    ty == DataType::Bool || ty.is_numeric()
}

fn is_bitwise_kind(ty: DataType) -> bool {
    ty == DataType::Bool || ty.is_integer()
}

fn float_result(ty: DataType) -> DataType {
    if ty.is_floating() {
        ty
    } else {
        DataType::Float64
    }
}

pub fn promote(operator: Operator, operands: &[DataType]) -> ComputeResult<Promotion> {
    let mismatch = || ComputeError::TypeMismatch {
        operator,
        operands: operands.to_vec(),
    };

    match *operands {
        [ty] if operator.is_unary() => promote_unary(operator, ty).ok_or_else(mismatch),
        [lhs, rhs] if !operator.is_unary() => {
            promote_binary(operator, lhs, rhs).ok_or_else(mismatch)
        }
        _ => Err(mismatch()),
    }
}

fn promote_unary(operator: Operator, ty: DataType) -> Option<Promotion> {
    if !ty.is_fixed_width() {
        return None;
    }
    use Operator::*;
    match operator {
        Identity => Some(Promotion::same(ty)),
        IsNull | IsValid => Some(Promotion::new(ty, DataType::Bool)),
        Not if is_truthy_kind(ty) => Some(Promotion::same(DataType::Bool)),
        BitInvert if is_bitwise_kind(ty) => Some(Promotion::same(ty)),
        Negate | Abs | Ceil | Floor | Rint if ty.is_numeric() => Some(Promotion::same(ty)),
        Sqrt | Cbrt | Exp | Log | Sin | Cos | Tan | ArcSin | ArcCos | ArcTan | Sinh | Cosh
        | Tanh | ArcSinh | ArcCosh | ArcTanh
            if is_truthy_kind(ty) =>
        {
            Some(Promotion::same(float_result(ty)))
        }
        CastToInt64 if is_truthy_kind(ty) || ty.is_timestamp() => {
            Some(Promotion::new(ty, DataType::Int64))
        }
        CastToUInt64 if is_truthy_kind(ty) => Some(Promotion::new(ty, DataType::UInt64)),
        CastToFloat64 if is_truthy_kind(ty) => Some(Promotion::new(ty, DataType::Float64)),
        _ => None,
    }
}

fn promote_binary(operator: Operator, lhs: DataType, rhs: DataType) -> Option<Promotion> {
    use Operator::*;
    match operator {
        Add | Sub | Mul | Div | FloorDiv | Mod | PyMod | Pow => {
            if lhs.is_timestamp() || rhs.is_timestamp() {
                return promote_timestamp_arithmetic(operator, lhs, rhs);
            }
            let common = common_type(lhs, rhs).filter(|ty| ty.is_numeric())?;
            Some(Promotion::same(common))
        }
        TrueDiv => {
            let common = common_type(lhs, rhs).filter(|ty| ty.is_numeric())?;
            if common == DataType::Float32 {
                Some(Promotion::same(DataType::Float32))
            } else {
                Some(Promotion::same(DataType::Float64))
            }
        }
        Equal | NotEqual | Less | Greater | LessEqual | GreaterEqual | NullEqual => {
            let common = common_type(lhs, rhs)?;
            Some(Promotion::new(common, DataType::Bool))
        }
        BitwiseAnd | BitwiseOr | BitwiseXor => {
            let common = common_type(lhs, rhs).filter(|ty| is_bitwise_kind(*ty))?;
            Some(Promotion::same(common))
        }
        LogicalAnd | LogicalOr | NullLogicalAnd | NullLogicalOr => {
            (is_truthy_kind(lhs) && is_truthy_kind(rhs)).then(|| Promotion::same(DataType::Bool))
        }
        Coalesce => common_type(lhs, rhs).map(Promotion::same),
        Mean | Variance | StdDev => {
            let kind = operator.aggregate_kind()?;
            let common = common_type(lhs, rhs).filter(|ty| is_truthy_kind(*ty))?;
            Some(Promotion::same(reduction_output_type(kind, common)))
        }
        _ => None,
    }
}

fn promote_timestamp_arithmetic(
    operator: Operator,
    lhs: DataType,
    rhs: DataType,
) -> Option<Promotion> {
    match (operator, lhs, rhs) {
        (Operator::Add, ts @ DataType::Timestamp(_), int)
        | (Operator::Add, int, ts @ DataType::Timestamp(_))
        | (Operator::Sub, ts @ DataType::Timestamp(_), int)
            if int.is_integer() =>
        {
            Some(Promotion::same(ts))
        }
        (Operator::Sub, DataType::Timestamp(a), DataType::Timestamp(b)) if a == b => Some(
            Promotion::new(DataType::Timestamp(a), DataType::Int64),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use formula_columnar::TimeUnit;

    const FIXED: &[DataType] = &[
        DataType::Bool,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::UInt8,
        DataType::UInt16,
        DataType::UInt32,
        DataType::UInt64,
        DataType::Float32,
        DataType::Float64,
        DataType::Timestamp(TimeUnit::Second),
        DataType::Timestamp(TimeUnit::Nanosecond),
    ];

    #[test]
    fn common_type_is_symmetric() {
        for &a in FIXED {
            for &b in FIXED {
                assert_eq!(common_type(a, b), common_type(b, a), "{a} / {b}");
            }
        }
    }

    #[test]
    fn integer_mixing_follows_width_and_sign() {
        assert_eq!(
            common_type(DataType::Int8, DataType::Int32),
            Some(DataType::Int32)
        );
        assert_eq!(
            common_type(DataType::UInt8, DataType::Int16),
            Some(DataType::Int16)
        );
        assert_eq!(
            common_type(DataType::UInt16, DataType::Int16),
            Some(DataType::Int32)
        );
        assert_eq!(
            common_type(DataType::UInt32, DataType::Int8),
            Some(DataType::Int64)
        );
        assert_eq!(
            common_type(DataType::UInt64, DataType::Int64),
            Some(DataType::Float64)
        );
    }

    #[test]
    fn floats_absorb_integers() {
        assert_eq!(
            common_type(DataType::Int32, DataType::Float64),
            Some(DataType::Float64)
        );
        assert_eq!(
            common_type(DataType::Int16, DataType::Float32),
            Some(DataType::Float32)
        );
        assert_eq!(
            common_type(DataType::Int32, DataType::Float32),
            Some(DataType::Float64)
        );
        assert_eq!(
            common_type(DataType::Bool, DataType::Float32),
            Some(DataType::Float32)
        );
    }

    #[test]
    fn timestamps_only_combine_with_the_same_unit() {
        let s = DataType::Timestamp(TimeUnit::Second);
        let ns = DataType::Timestamp(TimeUnit::Nanosecond);
        assert_eq!(common_type(s, s), Some(s));
        assert_eq!(common_type(s, ns), None);
        assert_eq!(common_type(s, DataType::Int64), None);
    }

    #[test]
    fn comparisons_and_logic_always_yield_bool() {
        for &a in FIXED {
            for &b in FIXED {
                if let Ok(p) = promote(Operator::Less, &[a, b]) {
                    assert_eq!(p.output, DataType::Bool);
                }
                if let Ok(p) = promote(Operator::NullLogicalOr, &[a, b]) {
                    assert_eq!(p.output, DataType::Bool);
                }
            }
        }
        let p = promote(Operator::Equal, &[DataType::Int8, DataType::Float64]).unwrap();
        assert_eq!(p.compute, DataType::Float64);
    }

    #[test]
    fn aggregate_style_operators_promote_to_float64() {
        for &a in FIXED.iter().filter(|t| !t.is_timestamp()) {
            for op in [Operator::Mean, Operator::Variance, Operator::StdDev] {
                let p = promote(op, &[a, a]).unwrap();
                assert_eq!(p.output, DataType::Float64, "{op} over {a}");
            }
        }
    }

    #[test]
    fn timestamp_arithmetic() {
        let ms = DataType::Timestamp(TimeUnit::Millisecond);
        assert_eq!(
            promote(Operator::Add, &[DataType::Int32, ms]).unwrap(),
            Promotion::same(ms)
        );
        assert_eq!(
            promote(Operator::Sub, &[ms, ms]).unwrap(),
            Promotion::new(ms, DataType::Int64)
        );
        assert!(promote(Operator::Sub, &[DataType::Int32, ms]).is_err());
        assert!(promote(Operator::Mul, &[ms, DataType::Int32]).is_err());
    }

    #[test]
    fn unsupported_combinations_are_type_mismatches() {
        let err = promote(Operator::Add, &[DataType::Bool, DataType::Bool]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(promote(Operator::BitwiseAnd, &[DataType::Float32, DataType::Int8]).is_err());
        assert!(promote(Operator::Add, &[DataType::Utf8, DataType::Int8]).is_err());
        assert!(promote(Operator::Negate, &[DataType::Int8, DataType::Int8]).is_err());
    }

    #[test]
    fn unary_math_widens_integers_to_float64() {
        assert_eq!(
            promote(Operator::Sqrt, &[DataType::Int32]).unwrap(),
            Promotion::same(DataType::Float64)
        );
        assert_eq!(
            promote(Operator::Sin, &[DataType::Float32]).unwrap(),
            Promotion::same(DataType::Float32)
        );
        assert_eq!(
            promote(Operator::Abs, &[DataType::Int8]).unwrap(),
            Promotion::same(DataType::Int8)
        );
        assert_eq!(
            promote(Operator::IsNull, &[DataType::Float32]).unwrap(),
            Promotion::new(DataType::Float32, DataType::Bool)
        );
    }
}
