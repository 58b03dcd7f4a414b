//! Result-type rules shared with whole-column reductions.
//!
//! The row-wise `Mean`/`Variance`/`StdDev` combinators must produce the same type a reduction of
//! the same kind would, so both go through [`reduction_output_type`].

use crate::operator::Operator;
use formula_columnar::DataType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Sum,
    Product,
    Min,
    Max,
    Mean,
    Variance,
    Std,
}

/// Output type of a reduction of `kind` over values of type `input`.
pub fn reduction_output_type(kind: AggregateKind, input: DataType) -> DataType {
    match kind {
        AggregateKind::Mean | AggregateKind::Variance | AggregateKind::Std => DataType::Float64,
        AggregateKind::Sum | AggregateKind::Product | AggregateKind::Min | AggregateKind::Max => {
            input
        }
    }
}

impl Operator {
    /// The reduction this operator mirrors, if any.
    pub fn aggregate_kind(self) -> Option<AggregateKind> {
        match self {
            Operator::Mean => Some(AggregateKind::Mean),
            Operator::Variance => Some(AggregateKind::Variance),
            Operator::StdDev => Some(AggregateKind::Std),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moment_reductions_always_widen_to_float64() {
        for input in [DataType::Int8, DataType::UInt32, DataType::Float32, DataType::Bool] {
            for kind in [AggregateKind::Mean, AggregateKind::Variance, AggregateKind::Std] {
                assert_eq!(reduction_output_type(kind, input), DataType::Float64);
            }
            assert_eq!(reduction_output_type(AggregateKind::Max, input), input);
        }
    }

    #[test]
    fn only_moment_operators_map_to_reductions() {
        assert_eq!(Operator::StdDev.aggregate_kind(), Some(AggregateKind::Std));
        assert_eq!(Operator::Add.aggregate_kind(), None);
    }
}
