//! Deterministic column generators for tests and benchmarks.
//!
//! Values are a simple row sequence; nulls are drawn from a fixed-seed splitmix64 stream so
//! repeated calls (and repeated benchmark runs) see byte-identical tables.

#![forbid(unsafe_code)]

use crate::bitmap::BitVec;
use crate::column::{Column, ColumnData};
use crate::table::Table;
use crate::types::DataType;
use std::sync::Arc;

const NULL_SEED: u64 = 13_377_331;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Validity mask where each row is null with probability `null_probability`.
///
/// A negative probability means "no mask at all".
fn null_mask(rows: usize, null_probability: f64, stream: u64) -> Option<BitVec> {
    if null_probability < 0.0 {
        return None;
    }
    let p = null_probability.min(1.0);
    let mut mask = BitVec::with_capacity_bits(rows);
    let mut state = NULL_SEED ^ splitmix64(stream);
    for _ in 0..rows {
        state = splitmix64(state);
        // Top 53 bits as a uniform double in [0, 1).
        let u = (state >> 11) as f64 / (1u64 << 53) as f64;
        mask.push(u >= p);
    }
    Some(mask)
}

fn sequence_data(data_type: DataType, rows: usize) -> ColumnData {
    let seq = 0..rows;
    match data_type {
        DataType::Bool => ColumnData::Bool(seq.map(|i| i % 2 == 1).collect()),
        DataType::Int8 => ColumnData::Int8(seq.map(|i| i as i8).collect()),
        DataType::Int16 => ColumnData::Int16(seq.map(|i| i as i16).collect()),
        DataType::Int32 => ColumnData::Int32(seq.map(|i| i as i32).collect()),
        DataType::Int64 => ColumnData::Int64(seq.map(|i| i as i64).collect()),
        DataType::UInt8 => ColumnData::UInt8(seq.map(|i| i as u8).collect()),
        DataType::UInt16 => ColumnData::UInt16(seq.map(|i| i as u16).collect()),
        DataType::UInt32 => ColumnData::UInt32(seq.map(|i| i as u32).collect()),
        DataType::UInt64 => ColumnData::UInt64(seq.map(|i| i as u64).collect()),
        DataType::Float32 => ColumnData::Float32(seq.map(|i| i as f32).collect()),
        DataType::Float64 => ColumnData::Float64(seq.map(|i| i as f64).collect()),
        DataType::Timestamp(unit) => ColumnData::Timestamp(unit, seq.map(|i| i as i64).collect()),
        DataType::Utf8 => ColumnData::Utf8(seq.map(|i| Arc::<str>::from(i.to_string())).collect()),
        DataType::List => {
            // One child value per row.
            let offsets = (0..=rows).map(|i| i as u32).collect();
            ColumnData::List {
                offsets,
                values: Box::new(sequence_column(DataType::Int32, rows, -1.0)),
            }
        }
    }
}

fn sequence_column_with_stream(
    data_type: DataType,
    rows: usize,
    null_probability: f64,
    stream: u64,
) -> Column {
    let data = sequence_data(data_type, rows);
    Column::from_parts(data, null_mask(rows, null_probability, stream))
}

/// A column holding `0, 1, 2, …` converted to `data_type`.
pub fn sequence_column(data_type: DataType, rows: usize, null_probability: f64) -> Column {
    sequence_column_with_stream(data_type, rows, null_probability, 0)
}

/// One [`sequence_column`] per entry of `data_types`. Each column gets its own null stream.
pub fn sequence_table(data_types: &[DataType], rows: usize, null_probability: f64) -> Table {
    let columns = data_types
        .iter()
        .enumerate()
        .map(|(i, &dt)| sequence_column_with_stream(dt, rows, null_probability, i as u64))
        .collect();
    Table::from_parts(columns, rows)
}

/// Repeat `types` until `count` entries are produced.
pub fn cycle_types(types: &[DataType], count: usize) -> Vec<DataType> {
    types.iter().copied().cycle().take(count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarValue;

    #[test]
    fn sequence_column_without_mask() {
        let col = sequence_column(DataType::Int32, 4, -1.0);
        assert!(!col.is_nullable());
        assert_eq!(col.get(3), Some(ScalarValue::Int(3)));
    }

    #[test]
    fn null_probability_is_respected_roughly_and_deterministically() {
        let a = sequence_column(DataType::Float64, 10_000, 0.5);
        let b = sequence_column(DataType::Float64, 10_000, 0.5);
        assert_eq!(a, b);
        let nulls = a.null_count();
        assert!((4_000..6_000).contains(&nulls), "nulls={nulls}");

        let none = sequence_column(DataType::Float64, 100, 0.0);
        assert_eq!(none.null_count(), 0);
        assert!(none.is_nullable());

        let all = sequence_column(DataType::Float64, 100, 1.0);
        assert_eq!(all.null_count(), 100);
    }

    #[test]
    fn cycle_types_repeats() {
        let types = cycle_types(&[DataType::Int32, DataType::Float64], 5);
        assert_eq!(
            types,
            vec![
                DataType::Int32,
                DataType::Float64,
                DataType::Int32,
                DataType::Float64,
                DataType::Int32
            ]
        );
        let table = sequence_table(&types, 7, -1.0);
        assert_eq!(table.width(), 5);
        assert_eq!(table.row_count(), 7);
    }
}
