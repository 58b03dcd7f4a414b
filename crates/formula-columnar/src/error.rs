use crate::types::DataType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColumnarError {
    #[error("length mismatch: expected {expected} rows, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("value {value} is not representable as {data_type}")]
    ScalarMismatch { data_type: DataType, value: String },

    #[error("unsupported arrow type: {0}")]
    UnsupportedArrowType(String),
}
