#![forbid(unsafe_code)]

use crate::error::ColumnarError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Resolution of a timestamp column. Values are ticks since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Day,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Day => "D",
            TimeUnit::Second => "s",
            TimeUnit::Millisecond => "ms",
            TimeUnit::Microsecond => "us",
            TimeUnit::Nanosecond => "ns",
        }
    }
}

/// Logical type tag carried by every column.
///
/// `Utf8` and `List` exist so the storage layer can describe string and nested columns; the
/// compute layer only accepts the fixed-width kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    Float32,
    Float64,
    Timestamp(TimeUnit),
    Utf8,
    List,
}

impl DataType {
    pub fn is_fixed_width(self) -> bool {
        !matches!(self, DataType::Utf8 | DataType::List)
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_floating(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn is_timestamp(self) -> bool {
        matches!(self, DataType::Timestamp(_))
    }

    /// Integers and floats. Booleans and timestamps are not numeric for promotion purposes.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_floating()
    }

    /// Width of one value in bits, or `None` for variable-width kinds.
    pub fn bit_width(self) -> Option<u32> {
        match self {
            DataType::Bool | DataType::Int8 | DataType::UInt8 => Some(8),
            DataType::Int16 | DataType::UInt16 => Some(16),
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => Some(32),
            DataType::Int64 | DataType::UInt64 | DataType::Float64 | DataType::Timestamp(_) => {
                Some(64)
            }
            DataType::Utf8 | DataType::List => None,
        }
    }

    /// Signed integer type of the given width.
    pub fn signed_of_width(bits: u32) -> Option<DataType> {
        match bits {
            8 => Some(DataType::Int8),
            16 => Some(DataType::Int16),
            32 => Some(DataType::Int32),
            64 => Some(DataType::Int64),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Timestamp(_) => "timestamp",
            DataType::Utf8 => "utf8",
            DataType::List => "list",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Timestamp(unit) => write!(f, "timestamp[{}]", unit.suffix()),
            other => f.write_str(other.name()),
        }
    }
}

/// Untyped payload of a [`Scalar`].
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Utf8(Arc<str>),
}

/// A typed constant. `value == None` is an explicit null of `data_type`.
#[derive(Clone, Debug, PartialEq)]
pub struct Scalar {
    data_type: DataType,
    value: Option<ScalarValue>,
}

impl Scalar {
    /// Build a scalar, checking that `value` is representable in `data_type`.
    ///
    /// Integer payloads are range-checked against the declared width; `Int` and `UInt` payloads
    /// are interchangeable as long as the value fits.
    pub fn new(data_type: DataType, value: ScalarValue) -> Result<Self, ColumnarError> {
        let value = fit_scalar(data_type, value)?;
        Ok(Self {
            data_type,
            value: Some(value),
        })
    }

    pub fn null(data_type: DataType) -> Self {
        Self {
            data_type,
            value: None,
        }
    }

    pub fn bool(v: bool) -> Self {
        Self::typed(DataType::Bool, ScalarValue::Bool(v))
    }

    pub fn int8(v: i8) -> Self {
        Self::typed(DataType::Int8, ScalarValue::Int(v.into()))
    }

    pub fn int16(v: i16) -> Self {
        Self::typed(DataType::Int16, ScalarValue::Int(v.into()))
    }

    pub fn int32(v: i32) -> Self {
        Self::typed(DataType::Int32, ScalarValue::Int(v.into()))
    }

    pub fn int64(v: i64) -> Self {
        Self::typed(DataType::Int64, ScalarValue::Int(v))
    }

    pub fn uint8(v: u8) -> Self {
        Self::typed(DataType::UInt8, ScalarValue::UInt(v.into()))
    }

    pub fn uint16(v: u16) -> Self {
        Self::typed(DataType::UInt16, ScalarValue::UInt(v.into()))
    }

    pub fn uint32(v: u32) -> Self {
        Self::typed(DataType::UInt32, ScalarValue::UInt(v.into()))
    }

    pub fn uint64(v: u64) -> Self {
        Self::typed(DataType::UInt64, ScalarValue::UInt(v))
    }

    pub fn float32(v: f32) -> Self {
        Self::typed(DataType::Float32, ScalarValue::Float(v.into()))
    }

    pub fn float64(v: f64) -> Self {
        Self::typed(DataType::Float64, ScalarValue::Float(v))
    }

    pub fn timestamp(unit: TimeUnit, ticks: i64) -> Self {
        Self::typed(DataType::Timestamp(unit), ScalarValue::Int(ticks))
    }

    pub fn utf8(s: impl Into<Arc<str>>) -> Self {
        Self::typed(DataType::Utf8, ScalarValue::Utf8(s.into()))
    }

    // Callers guarantee the payload already fits.
    fn typed(data_type: DataType, value: ScalarValue) -> Self {
        Self {
            data_type,
            value: Some(value),
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn value(&self) -> Option<&ScalarValue> {
        self.value.as_ref()
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

fn fit_scalar(data_type: DataType, value: ScalarValue) -> Result<ScalarValue, ColumnarError> {
    let mismatch = |value: &ScalarValue| ColumnarError::ScalarMismatch {
        data_type,
        value: format!("{value:?}"),
    };

    let signed_range = |bits: u32| -> (i128, i128) {
        let max = (1i128 << (bits - 1)) - 1;
        (-max - 1, max)
    };

    match data_type {
        DataType::Bool => match value {
            ScalarValue::Bool(_) => Ok(value),
            other => Err(mismatch(&other)),
        },
        DataType::Float32 | DataType::Float64 => match value {
            ScalarValue::Float(_) => Ok(value),
            other => Err(mismatch(&other)),
        },
        DataType::Utf8 => match value {
            ScalarValue::Utf8(_) => Ok(value),
            other => Err(mismatch(&other)),
        },
        DataType::List => Err(mismatch(&value)),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let bits = data_type.bit_width().unwrap_or(64);
            let wide = match &value {
                ScalarValue::Int(v) => i128::from(*v),
                ScalarValue::UInt(v) => i128::from(*v),
                other => return Err(mismatch(other)),
            };
            let (min, max) = signed_range(bits);
            if wide < min || wide > max {
                return Err(mismatch(&value));
            }
            Ok(ScalarValue::Int(wide as i64))
        }
        DataType::Timestamp(_) => match value {
            ScalarValue::Int(_) => Ok(value),
            ScalarValue::UInt(v) => i64::try_from(v)
                .map(ScalarValue::Int)
                .map_err(|_| mismatch(&ScalarValue::UInt(v))),
            other => Err(mismatch(&other)),
        },
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let bits = data_type.bit_width().unwrap_or(64);
            let wide = match &value {
                ScalarValue::Int(v) => i128::from(*v),
                ScalarValue::UInt(v) => i128::from(*v),
                other => return Err(mismatch(other)),
            };
            if wide < 0 || wide > (1i128 << bits) - 1 {
                return Err(mismatch(&value));
            }
            Ok(ScalarValue::UInt(wide as u64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_scalars_are_range_checked_against_declared_width() {
        assert!(Scalar::new(DataType::Int8, ScalarValue::Int(127)).is_ok());
        assert!(Scalar::new(DataType::Int8, ScalarValue::Int(128)).is_err());
        assert!(Scalar::new(DataType::UInt8, ScalarValue::Int(-1)).is_err());
        assert_eq!(
            Scalar::new(DataType::Int16, ScalarValue::UInt(7)).unwrap(),
            Scalar::int16(7)
        );
        assert_eq!(
            Scalar::new(DataType::UInt64, ScalarValue::UInt(u64::MAX))
                .unwrap()
                .value(),
            Some(&ScalarValue::UInt(u64::MAX))
        );
    }

    #[test]
    fn scalar_kind_must_match_declared_type() {
        assert!(Scalar::new(DataType::Float64, ScalarValue::Int(1)).is_err());
        assert!(Scalar::new(DataType::Bool, ScalarValue::Float(1.0)).is_err());
        assert!(Scalar::new(DataType::List, ScalarValue::Bool(true)).is_err());
        assert!(Scalar::null(DataType::List).is_null());
    }

    #[test]
    fn display_uses_lowercase_names() {
        assert_eq!(DataType::Float64.to_string(), "float64");
        assert_eq!(
            DataType::Timestamp(TimeUnit::Millisecond).to_string(),
            "timestamp[ms]"
        );
    }
}
