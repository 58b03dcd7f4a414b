#![forbid(unsafe_code)]

use crate::bitmap::BitVec;
use crate::error::ColumnarError;
use crate::types::{DataType, ScalarValue, TimeUnit};
use std::sync::Arc;

/// Physical values of a column, one `Vec` per storage kind.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Timestamp(TimeUnit, Vec<i64>),
    Utf8(Vec<Arc<str>>),
    /// `offsets` has one more entry than there are rows; row `i` spans
    /// `values[offsets[i]..offsets[i + 1]]`.
    List {
        offsets: Vec<u32>,
        values: Box<Column>,
    },
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Bool(v) => v.len(),
            ColumnData::Int8(v) => v.len(),
            ColumnData::Int16(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::UInt8(v) => v.len(),
            ColumnData::UInt16(v) => v.len(),
            ColumnData::UInt32(v) => v.len(),
            ColumnData::UInt64(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::Timestamp(_, v) => v.len(),
            ColumnData::Utf8(v) => v.len(),
            ColumnData::List { offsets, .. } => offsets.len().saturating_sub(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::Bool(_) => DataType::Bool,
            ColumnData::Int8(_) => DataType::Int8,
            ColumnData::Int16(_) => DataType::Int16,
            ColumnData::Int32(_) => DataType::Int32,
            ColumnData::Int64(_) => DataType::Int64,
            ColumnData::UInt8(_) => DataType::UInt8,
            ColumnData::UInt16(_) => DataType::UInt16,
            ColumnData::UInt32(_) => DataType::UInt32,
            ColumnData::UInt64(_) => DataType::UInt64,
            ColumnData::Float32(_) => DataType::Float32,
            ColumnData::Float64(_) => DataType::Float64,
            ColumnData::Timestamp(unit, _) => DataType::Timestamp(*unit),
            ColumnData::Utf8(_) => DataType::Utf8,
            ColumnData::List { .. } => DataType::List,
        }
    }

    /// Value stored at `row`, ignoring validity. Nested lists have no scalar form.
    pub fn value(&self, row: usize) -> Option<ScalarValue> {
        Some(match self {
            ColumnData::Bool(v) => ScalarValue::Bool(*v.get(row)?),
            ColumnData::Int8(v) => ScalarValue::Int((*v.get(row)?).into()),
            ColumnData::Int16(v) => ScalarValue::Int((*v.get(row)?).into()),
            ColumnData::Int32(v) => ScalarValue::Int((*v.get(row)?).into()),
            ColumnData::Int64(v) => ScalarValue::Int(*v.get(row)?),
            ColumnData::UInt8(v) => ScalarValue::UInt((*v.get(row)?).into()),
            ColumnData::UInt16(v) => ScalarValue::UInt((*v.get(row)?).into()),
            ColumnData::UInt32(v) => ScalarValue::UInt((*v.get(row)?).into()),
            ColumnData::UInt64(v) => ScalarValue::UInt(*v.get(row)?),
            ColumnData::Float32(v) => ScalarValue::Float((*v.get(row)?).into()),
            ColumnData::Float64(v) => ScalarValue::Float(*v.get(row)?),
            ColumnData::Timestamp(_, v) => ScalarValue::Int(*v.get(row)?),
            ColumnData::Utf8(v) => ScalarValue::Utf8(v.get(row)?.clone()),
            ColumnData::List { .. } => return None,
        })
    }
}

/// A typed, fixed-length buffer plus an optional validity mask (absent ⇒ every row is valid).
#[derive(Clone, Debug)]
pub struct Column {
    data: ColumnData,
    validity: Option<BitVec>,
}

/// Logical equality: same type, length and per-row validity, and equal values on valid rows.
/// Payloads under null rows are ignored, and a missing mask equals an all-valid one.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        if self.data_type() != other.data_type() || self.len() != other.len() {
            return false;
        }
        let same_validity = (0..self.len()).all(|row| self.is_valid(row) == other.is_valid(row));
        if !same_validity {
            return false;
        }
        if let ColumnData::List { .. } = self.data {
            return self.data == other.data;
        }
        (0..self.len())
            .filter(|&row| self.is_valid(row))
            .all(|row| self.data.value(row) == other.data.value(row))
    }
}

impl Column {
    pub fn new(data: ColumnData) -> Self {
        Self {
            data,
            validity: None,
        }
    }

    pub fn with_validity(data: ColumnData, validity: BitVec) -> Result<Self, ColumnarError> {
        if validity.len() != data.len() {
            return Err(ColumnarError::LengthMismatch {
                expected: data.len(),
                actual: validity.len(),
            });
        }
        Ok(Self {
            data,
            validity: Some(validity),
        })
    }

    /// Assemble a column whose mask is known to match the data length.
    pub(crate) fn from_parts(data: ColumnData, validity: Option<BitVec>) -> Self {
        debug_assert!(validity.as_ref().map_or(true, |v| v.len() == data.len()));
        Self { data, validity }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn validity(&self) -> Option<&BitVec> {
        self.validity.as_ref()
    }

    /// True when the column carries a validity mask, whether or not any bit is cleared.
    pub fn is_nullable(&self) -> bool {
        self.validity.is_some()
    }

    #[inline]
    pub fn is_valid(&self, row: usize) -> bool {
        self.validity.as_ref().map_or(true, |v| v.get(row))
    }

    pub fn null_count(&self) -> usize {
        self.validity.as_ref().map_or(0, BitVec::count_zeros)
    }

    /// Value at `row`, or `None` for a null or out-of-range row.
    pub fn get(&self, row: usize) -> Option<ScalarValue> {
        if row >= self.len() || !self.is_valid(row) {
            return None;
        }
        self.data.value(row)
    }

    pub fn into_parts(self) -> (ColumnData, Option<BitVec>) {
        (self.data, self.validity)
    }

    pub fn list(offsets: Vec<u32>, values: Column) -> Self {
        Self::new(ColumnData::List {
            offsets,
            values: Box::new(values),
        })
    }
}

fn split_options<T: Default>(
    values: impl IntoIterator<Item = Option<T>>,
) -> (Vec<T>, Option<BitVec>) {
    let iter = values.into_iter();
    let mut out = Vec::with_capacity(iter.size_hint().0);
    let mut validity = BitVec::with_capacity_bits(iter.size_hint().0);
    for v in iter {
        validity.push(v.is_some());
        out.push(v.unwrap_or_default());
    }
    let validity = if validity.all_true() {
        None
    } else {
        Some(validity)
    };
    (out, validity)
}

macro_rules! column_constructors {
    ($($plain:ident, $opt:ident, $variant:ident, $ty:ty;)*) => {
        impl Column {
            $(
                pub fn $plain(values: impl IntoIterator<Item = $ty>) -> Self {
                    Self::new(ColumnData::$variant(values.into_iter().collect()))
                }

                /// Build from optional values; a mask is only allocated if some row is `None`.
                pub fn $opt(values: impl IntoIterator<Item = Option<$ty>>) -> Self {
                    let (data, validity) = split_options(values);
                    Self {
                        data: ColumnData::$variant(data),
                        validity,
                    }
                }
            )*
        }
    };
}

column_constructors! {
    from_bool, from_bool_options, Bool, bool;
    from_i8, from_i8_options, Int8, i8;
    from_i16, from_i16_options, Int16, i16;
    from_i32, from_i32_options, Int32, i32;
    from_i64, from_i64_options, Int64, i64;
    from_u8, from_u8_options, UInt8, u8;
    from_u16, from_u16_options, UInt16, u16;
    from_u32, from_u32_options, UInt32, u32;
    from_u64, from_u64_options, UInt64, u64;
    from_f32, from_f32_options, Float32, f32;
    from_f64, from_f64_options, Float64, f64;
}

impl Column {
    pub fn from_timestamps(unit: TimeUnit, ticks: impl IntoIterator<Item = i64>) -> Self {
        Self::new(ColumnData::Timestamp(unit, ticks.into_iter().collect()))
    }

    pub fn from_strs<S: Into<Arc<str>>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(ColumnData::Utf8(values.into_iter().map(Into::into).collect()))
    }
}
