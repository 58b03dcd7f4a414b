//! Output buffers: allocated before any row runs, filled in place by the evaluator, then handed
//! over as a [`Column`].

use crate::error::{ComputeError, ComputeResult};
use crate::value::Value;
use formula_columnar::{BitVec, Column, ColumnData, DataType};

fn zeroed<T: Copy + Default>(rows: usize, what: &str) -> ComputeResult<Vec<T>> {
    let mut out: Vec<T> = Vec::new();
    out.try_reserve_exact(rows).map_err(|err| {
        ComputeError::AllocationFailure(format!("{what} for {rows} rows: {err}"))
    })?;
    out.resize(rows, T::default());
    Ok(out)
}

/// Element type of an output buffer. The root value arrives already cast to the output type, so
/// conversion only narrows the lane to the stored width.
pub(crate) trait OutputLane: Copy + Send {
    fn from_value(value: Value) -> Self;
}

macro_rules! output_lane {
    ($($ty:ty => |$v:ident| $conv:expr;)*) => {
        $(
            impl OutputLane for $ty {
                #[inline]
                fn from_value($v: Value) -> Self {
                    $conv
                }
            }
        )*
    };
}

output_lane! {
    bool => |v| v.truthy();
    i8 => |v| v.to_i64() as i8;
    i16 => |v| v.to_i64() as i16;
    i32 => |v| v.to_i64() as i32;
    i64 => |v| v.to_i64();
    u8 => |v| v.to_u64() as u8;
    u16 => |v| v.to_u64() as u16;
    u32 => |v| v.to_u64() as u32;
    u64 => |v| v.to_u64();
    f32 => |v| v.to_f64() as f32;
    f64 => |v| v.to_f64();
}

/// Typed output storage, reserved up front.
///
/// The validity mask only exists for nullable roots and is kept as packed words so tasks that own
/// whole words can fill it concurrently.
#[derive(Debug)]
pub struct OutputColumn {
    data: ColumnData,
    validity: Option<Vec<u64>>,
    rows: usize,
}

impl OutputColumn {
    pub fn allocate(data_type: DataType, nullable: bool, rows: usize) -> ComputeResult<Self> {
        const WHAT: &str = "output buffer";
        let data = match data_type {
            DataType::Bool => ColumnData::Bool(zeroed(rows, WHAT)?),
            DataType::Int8 => ColumnData::Int8(zeroed(rows, WHAT)?),
            DataType::Int16 => ColumnData::Int16(zeroed(rows, WHAT)?),
            DataType::Int32 => ColumnData::Int32(zeroed(rows, WHAT)?),
            DataType::Int64 => ColumnData::Int64(zeroed(rows, WHAT)?),
            DataType::UInt8 => ColumnData::UInt8(zeroed(rows, WHAT)?),
            DataType::UInt16 => ColumnData::UInt16(zeroed(rows, WHAT)?),
            DataType::UInt32 => ColumnData::UInt32(zeroed(rows, WHAT)?),
            DataType::UInt64 => ColumnData::UInt64(zeroed(rows, WHAT)?),
            DataType::Float32 => ColumnData::Float32(zeroed(rows, WHAT)?),
            DataType::Float64 => ColumnData::Float64(zeroed(rows, WHAT)?),
            DataType::Timestamp(unit) => ColumnData::Timestamp(unit, zeroed(rows, WHAT)?),
            DataType::Utf8 | DataType::List => {
                return Err(ComputeError::UnsupportedType(data_type));
            }
        };
        let validity = if nullable {
            Some(zeroed(rows.div_ceil(64), "null mask")?)
        } else {
            None
        };
        Ok(Self {
            data,
            validity,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn is_nullable(&self) -> bool {
        self.validity.is_some()
    }

    /// Value storage and mask words, for the evaluator to write into.
    pub(crate) fn parts_mut(&mut self) -> (&mut ColumnData, Option<&mut [u64]>) {
        (&mut self.data, self.validity.as_deref_mut())
    }

    /// Hand the filled buffers over as a column.
    pub fn finish(self) -> ComputeResult<Column> {
        match self.validity {
            None => Ok(Column::new(self.data)),
            Some(words) => Column::with_validity(self.data, BitVec::from_words(words, self.rows))
                .map_err(|err| ComputeError::AllocationFailure(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_columnar::ScalarValue;

    fn fill<T: OutputLane>(out: &mut [T], values: &[Value]) {
        for (slot, v) in out.iter_mut().zip(values) {
            *slot = T::from_value(*v);
        }
    }

    #[test]
    fn non_nullable_output_has_no_mask() {
        let mut out = OutputColumn::allocate(DataType::Int16, false, 3).unwrap();
        assert!(!out.is_nullable());
        match out.parts_mut() {
            (ColumnData::Int16(values), None) => {
                fill(values.as_mut_slice(), &[Value::Int(1), Value::Int(-2), Value::Int(3)])
            }
            other => panic!("unexpected buffers {other:?}"),
        }
        let col = out.finish().unwrap();
        assert_eq!(col, Column::from_i16([1, -2, 3]));
        assert!(col.validity().is_none());
    }

    #[test]
    fn nullable_output_starts_all_null() {
        let mut out = OutputColumn::allocate(DataType::Float32, true, 2).unwrap();
        match out.parts_mut() {
            (ColumnData::Float32(values), Some(words)) => {
                fill(values.as_mut_slice(), &[Value::Float(1.5), Value::Float(0.0)]);
                words[0] |= 0b01;
            }
            other => panic!("unexpected buffers {other:?}"),
        }
        let col = out.finish().unwrap();
        assert_eq!(col.null_count(), 1);
        assert_eq!(col.get(0), Some(ScalarValue::Float(1.5)));
        assert_eq!(col.get(1), None);
    }

    #[test]
    fn lanes_narrow_to_the_stored_width() {
        assert_eq!(u8::from_value(Value::UInt(258)), 2);
        assert_eq!(i16::from_value(Value::Int(-3)), -3);
        assert!(bool::from_value(Value::Int(7)));
        assert_eq!(f32::from_value(Value::Float(0.5)), 0.5);
    }

    #[test]
    fn string_output_is_rejected_before_allocation() {
        let err = OutputColumn::allocate(DataType::Utf8, false, 10).unwrap_err();
        assert_eq!(err, ComputeError::UnsupportedType(DataType::Utf8));
    }

    #[test]
    fn impossible_reservation_reports_allocation_failure() {
        let err = OutputColumn::allocate(DataType::Int64, false, usize::MAX).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::AllocationFailure);
    }
}
