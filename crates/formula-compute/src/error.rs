use crate::operator::Operator;
use formula_columnar::DataType;

pub type ComputeResult<T> = Result<T, ComputeError>;

/// Coarse classification of a [`ComputeError`], convenient for matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Construction,
    OutOfRange,
    InvalidExpression,
    TypeMismatch,
    UnsupportedType,
    AllocationFailure,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComputeError {
    #[error("construction error: {0}")]
    Construction(String),

    #[error("column index {index} is out of range for a table of width {width}")]
    OutOfRange { index: usize, width: usize },

    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    #[error("no type promotion for {operator} over ({})", join_types(.operands))]
    TypeMismatch {
        operator: Operator,
        operands: Vec<DataType>,
    },

    #[error("unsupported type: {0}")]
    UnsupportedType(DataType),

    #[error("allocation failure: {0}")]
    AllocationFailure(String),
}

impl ComputeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComputeError::Construction(_) => ErrorKind::Construction,
            ComputeError::OutOfRange { .. } => ErrorKind::OutOfRange,
            ComputeError::InvalidExpression(_) => ErrorKind::InvalidExpression,
            ComputeError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            ComputeError::UnsupportedType(_) => ErrorKind::UnsupportedType,
            ComputeError::AllocationFailure(_) => ErrorKind::AllocationFailure,
        }
    }
}

fn join_types(types: &[DataType]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
