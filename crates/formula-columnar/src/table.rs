#![forbid(unsafe_code)]

use crate::column::Column;
use crate::error::ColumnarError;

/// An ordered set of equal-length columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, ColumnarError> {
        let rows = columns.first().map_or(0, Column::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(ColumnarError::LengthMismatch {
                expected: rows,
                actual: bad.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Assemble a table whose columns are known to hold `rows` rows each.
    pub(crate) fn from_parts(columns: Vec<Column>, rows: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.len() == rows));
        Self { columns, rows }
    }

    /// A table with no columns but a fixed row count. Expressions made only of literals evaluate
    /// to `rows` values against it.
    pub fn empty(rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_count(&self) -> usize {
        self.width()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}
