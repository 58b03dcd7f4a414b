//! Host-side columnar storage for Formula's compute layer.
//!
//! This crate focuses on:
//! - Typed, fixed-length column buffers with optional validity masks.
//! - Tables of equal-length columns, addressable by column index and row offset.
//! - Typed scalar constants shared with expression literals.
//! - Deterministic data generators for tests and benchmarks.

#![forbid(unsafe_code)]

#[cfg(feature = "arrow")]
pub mod arrow;
mod bitmap;
mod column;
mod error;
pub mod generate;
mod table;
mod types;

pub use crate::bitmap::BitVec;
pub use crate::column::{Column, ColumnData};
pub use crate::error::ColumnarError;
pub use crate::table::Table;
pub use crate::types::{DataType, Scalar, ScalarValue, TimeUnit};
