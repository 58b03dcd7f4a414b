use formula_columnar::{ColumnData, DataType, ScalarValue};

/// A scalar held in one of four evaluation lanes.
///
/// Signed integers and timestamps use `Int`, unsigned integers `UInt`, both float widths `Float`.
/// The declared width lives in the plan, and [`Value::cast`] normalises a lane value to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl Value {
    /// Read row `row` of a fixed-width column.
    ///
    /// String and list columns are rejected before evaluation starts; they load as zero.
    #[inline]
    pub fn load(data: &ColumnData, row: usize) -> Value {
        match data {
            ColumnData::Bool(v) => Value::Bool(v[row]),
            ColumnData::Int8(v) => Value::Int(v[row].into()),
            ColumnData::Int16(v) => Value::Int(v[row].into()),
            ColumnData::Int32(v) => Value::Int(v[row].into()),
            ColumnData::Int64(v) => Value::Int(v[row]),
            ColumnData::UInt8(v) => Value::UInt(v[row].into()),
            ColumnData::UInt16(v) => Value::UInt(v[row].into()),
            ColumnData::UInt32(v) => Value::UInt(v[row].into()),
            ColumnData::UInt64(v) => Value::UInt(v[row]),
            ColumnData::Float32(v) => Value::Float(v[row].into()),
            ColumnData::Float64(v) => Value::Float(v[row]),
            ColumnData::Timestamp(_, v) => Value::Int(v[row]),
            ColumnData::Utf8(_) | ColumnData::List { .. } => Value::default(),
        }
    }

    /// Lane value of a literal; `None` (null) becomes the zero of `data_type`.
    pub fn from_scalar(value: Option<&ScalarValue>, data_type: DataType) -> Value {
        match value {
            Some(ScalarValue::Bool(v)) => Value::Bool(*v),
            Some(ScalarValue::Int(v)) => Value::Int(*v),
            Some(ScalarValue::UInt(v)) => Value::UInt(*v),
            Some(ScalarValue::Float(v)) => Value::Float(*v),
            Some(ScalarValue::Utf8(_)) | None => Value::zero(data_type),
        }
        .cast(data_type)
    }

    pub fn zero(data_type: DataType) -> Value {
        match data_type {
            DataType::Bool => Value::Bool(false),
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
                Value::UInt(0)
            }
            DataType::Float32 | DataType::Float64 => Value::Float(0.0),
            _ => Value::Int(0),
        }
    }

    /// Convert into `to`'s lane and wrap to its width.
    ///
    /// Integer narrowing wraps; float-to-integer conversion saturates with NaN mapping to zero;
    /// `Float32` results are rounded through `f32`.
    #[inline]
    pub fn cast(self, to: DataType) -> Value {
        match to {
            DataType::Bool => Value::Bool(self.truthy()),
            DataType::Int8 => Value::Int(match self {
                Value::Float(f) => (f as i8).into(),
                other => (other.to_i64() as i8).into(),
            }),
            DataType::Int16 => Value::Int(match self {
                Value::Float(f) => (f as i16).into(),
                other => (other.to_i64() as i16).into(),
            }),
            DataType::Int32 => Value::Int(match self {
                Value::Float(f) => (f as i32).into(),
                other => (other.to_i64() as i32).into(),
            }),
            DataType::Int64 | DataType::Timestamp(_) => Value::Int(self.to_i64()),
            DataType::UInt8 => Value::UInt(match self {
                Value::Float(f) => (f as u8).into(),
                other => (other.to_u64() as u8).into(),
            }),
            DataType::UInt16 => Value::UInt(match self {
                Value::Float(f) => (f as u16).into(),
                other => (other.to_u64() as u16).into(),
            }),
            DataType::UInt32 => Value::UInt(match self {
                Value::Float(f) => (f as u32).into(),
                other => (other.to_u64() as u32).into(),
            }),
            DataType::UInt64 => Value::UInt(self.to_u64()),
            DataType::Float32 => Value::Float(f64::from(self.to_f64() as f32)),
            DataType::Float64 => Value::Float(self.to_f64()),
            DataType::Utf8 | DataType::List => self,
        }
    }

    #[inline]
    pub fn truthy(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Int(v) => v != 0,
            Value::UInt(v) => v != 0,
            Value::Float(v) => v != 0.0,
        }
    }

    /// Two's-complement reinterpretation for integers, saturating for floats.
    #[inline]
    pub fn to_i64(self) -> i64 {
        match self {
            Value::Bool(b) => i64::from(b),
            Value::Int(v) => v,
            Value::UInt(v) => v as i64,
            Value::Float(v) => v as i64,
        }
    }

    #[inline]
    pub fn to_u64(self) -> u64 {
        match self {
            Value::Bool(b) => u64::from(b),
            Value::Int(v) => v as u64,
            Value::UInt(v) => v,
            Value::Float(v) => v as u64,
        }
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        match self {
            Value::Bool(b) => f64::from(u8::from(b)),
            Value::Int(v) => v as f64,
            Value::UInt(v) => v as f64,
            Value::Float(v) => v,
        }
    }
}
