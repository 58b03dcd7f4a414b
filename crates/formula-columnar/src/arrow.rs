//! Arrow interoperability for primitive columns.
//!
//! Only the fixed-width kinds plus `Utf8` round-trip. Nested columns and day-resolution
//! timestamps have no direct Arrow counterpart here and are rejected.

#![forbid(unsafe_code)]

use crate::column::{Column, ColumnData};
use crate::error::ColumnarError;
use crate::table::Table;
use crate::types::TimeUnit;
use arrow_array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, Int8Array, RecordBatch, StringArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray, UInt16Array,
    UInt32Array, UInt64Array, UInt8Array,
};
use arrow_schema::{DataType as ArrowType, Field, Schema, TimeUnit as ArrowTimeUnit};
use std::sync::Arc;

fn options<T: Copy>(values: &[T], column: &Column) -> Vec<Option<T>> {
    values
        .iter()
        .enumerate()
        .map(|(row, v)| column.is_valid(row).then_some(*v))
        .collect()
}

/// Convert one column into an Arrow array.
pub fn column_to_array(column: &Column) -> Result<ArrayRef, ColumnarError> {
    let array: ArrayRef = match column.data() {
        ColumnData::Bool(v) => Arc::new(BooleanArray::from(options(v, column))),
        ColumnData::Int8(v) => Arc::new(Int8Array::from(options(v, column))),
        ColumnData::Int16(v) => Arc::new(Int16Array::from(options(v, column))),
        ColumnData::Int32(v) => Arc::new(Int32Array::from(options(v, column))),
        ColumnData::Int64(v) => Arc::new(Int64Array::from(options(v, column))),
        ColumnData::UInt8(v) => Arc::new(UInt8Array::from(options(v, column))),
        ColumnData::UInt16(v) => Arc::new(UInt16Array::from(options(v, column))),
        ColumnData::UInt32(v) => Arc::new(UInt32Array::from(options(v, column))),
        ColumnData::UInt64(v) => Arc::new(UInt64Array::from(options(v, column))),
        ColumnData::Float32(v) => Arc::new(Float32Array::from(options(v, column))),
        ColumnData::Float64(v) => Arc::new(Float64Array::from(options(v, column))),
        ColumnData::Timestamp(unit, v) => {
            let ticks = options(v, column);
            match unit {
                TimeUnit::Second => Arc::new(TimestampSecondArray::from(ticks)),
                TimeUnit::Millisecond => Arc::new(TimestampMillisecondArray::from(ticks)),
                TimeUnit::Microsecond => Arc::new(TimestampMicrosecondArray::from(ticks)),
                TimeUnit::Nanosecond => Arc::new(TimestampNanosecondArray::from(ticks)),
                TimeUnit::Day => {
                    return Err(ColumnarError::UnsupportedArrowType(
                        column.data_type().to_string(),
                    ))
                }
            }
        }
        ColumnData::Utf8(v) => {
            let strs: Vec<Option<&str>> = v
                .iter()
                .enumerate()
                .map(|(row, s)| column.is_valid(row).then_some(s.as_ref()))
                .collect();
            Arc::new(StringArray::from(strs))
        }
        ColumnData::List { .. } => {
            return Err(ColumnarError::UnsupportedArrowType(
                column.data_type().to_string(),
            ))
        }
    };
    Ok(array)
}

macro_rules! downcast_options {
    ($array:expr, $ty:ty) => {{
        let arr = $array
            .as_any()
            .downcast_ref::<$ty>()
            .ok_or_else(|| {
                ColumnarError::UnsupportedArrowType(format!("{:?}", $array.data_type()))
            })?;
        (0..arr.len())
            .map(|i| arr.is_valid(i).then(|| arr.value(i)))
            .collect::<Vec<_>>()
    }};
}

/// Convert an Arrow array into a column. A mask is only kept if the array has nulls.
pub fn array_to_column(array: &dyn Array) -> Result<Column, ColumnarError> {
    let ts = |unit: TimeUnit, values: Vec<Option<i64>>| -> Column {
        let (ticks, valid): (Vec<i64>, Vec<bool>) = values
            .into_iter()
            .map(|v| (v.unwrap_or_default(), v.is_some()))
            .unzip();
        let data = ColumnData::Timestamp(unit, ticks);
        if valid.iter().all(|&v| v) {
            Column::new(data)
        } else {
            Column::from_parts(data, Some(crate::BitVec::from_bools(&valid)))
        }
    };

    Ok(match array.data_type() {
        ArrowType::Boolean => Column::from_bool_options(downcast_options!(array, BooleanArray)),
        ArrowType::Int8 => Column::from_i8_options(downcast_options!(array, Int8Array)),
        ArrowType::Int16 => Column::from_i16_options(downcast_options!(array, Int16Array)),
        ArrowType::Int32 => Column::from_i32_options(downcast_options!(array, Int32Array)),
        ArrowType::Int64 => Column::from_i64_options(downcast_options!(array, Int64Array)),
        ArrowType::UInt8 => Column::from_u8_options(downcast_options!(array, UInt8Array)),
        ArrowType::UInt16 => Column::from_u16_options(downcast_options!(array, UInt16Array)),
        ArrowType::UInt32 => Column::from_u32_options(downcast_options!(array, UInt32Array)),
        ArrowType::UInt64 => Column::from_u64_options(downcast_options!(array, UInt64Array)),
        ArrowType::Float32 => Column::from_f32_options(downcast_options!(array, Float32Array)),
        ArrowType::Float64 => Column::from_f64_options(downcast_options!(array, Float64Array)),
        ArrowType::Timestamp(ArrowTimeUnit::Second, _) => ts(
            TimeUnit::Second,
            downcast_options!(array, TimestampSecondArray),
        ),
        ArrowType::Timestamp(ArrowTimeUnit::Millisecond, _) => ts(
            TimeUnit::Millisecond,
            downcast_options!(array, TimestampMillisecondArray),
        ),
        ArrowType::Timestamp(ArrowTimeUnit::Microsecond, _) => ts(
            TimeUnit::Microsecond,
            downcast_options!(array, TimestampMicrosecondArray),
        ),
        ArrowType::Timestamp(ArrowTimeUnit::Nanosecond, _) => ts(
            TimeUnit::Nanosecond,
            downcast_options!(array, TimestampNanosecondArray),
        ),
        ArrowType::Utf8 => {
            let arr = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| ColumnarError::UnsupportedArrowType("Utf8".to_owned()))?;
            let values: Vec<Option<Arc<str>>> = (0..arr.len())
                .map(|i| arr.is_valid(i).then(|| Arc::<str>::from(arr.value(i))))
                .collect();
            let valid: Vec<bool> = values.iter().map(Option::is_some).collect();
            let data = ColumnData::Utf8(
                values
                    .into_iter()
                    .map(|v| v.unwrap_or_else(|| Arc::from("")))
                    .collect(),
            );
            if valid.iter().all(|&v| v) {
                Column::new(data)
            } else {
                Column::with_validity(data, crate::BitVec::from_bools(&valid))?
            }
        }
        other => return Err(ColumnarError::UnsupportedArrowType(format!("{other:?}"))),
    })
}

/// Export a table as a record batch. Columns are named `c0`, `c1`, ….
pub fn table_to_record_batch(table: &Table) -> Result<RecordBatch, ColumnarError> {
    let arrays = table
        .columns()
        .iter()
        .map(column_to_array)
        .collect::<Result<Vec<_>, _>>()?;
    let fields: Vec<Field> = arrays
        .iter()
        .enumerate()
        .map(|(i, a)| Field::new(format!("c{i}"), a.data_type().clone(), true))
        .collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .map_err(|e| ColumnarError::UnsupportedArrowType(e.to_string()))
}

pub fn record_batch_to_table(batch: &RecordBatch) -> Result<Table, ColumnarError> {
    let columns = batch
        .columns()
        .iter()
        .map(|a| array_to_column(a.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Ok(Table::empty(batch.num_rows()));
    }
    Table::new(columns)
}
