use crate::error::{ComputeError, ComputeResult};
use crate::operator::Operator;
use formula_columnar::{DataType, Scalar, ScalarValue};
use smallvec::SmallVec;
use std::fmt;

/// Stable handle to a node in a [`NodeStore`].
///
/// Handles are plain indices into the store's arena; later insertions never invalidate them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColumnReference {
    index: usize,
}

impl ColumnReference {
    /// Reference the column at `index`. Range is checked against the table at evaluation time.
    pub fn new(index: i64) -> ComputeResult<Self> {
        let index = usize::try_from(index).map_err(|_| {
            ComputeError::Construction(format!("column index must be non-negative, got {index}"))
        })?;
        Ok(Self { index })
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    scalar: Scalar,
}

impl Literal {
    pub fn new(value: ScalarValue, data_type: DataType) -> ComputeResult<Self> {
        let scalar = Scalar::new(data_type, value)
            .map_err(|err| ComputeError::Construction(err.to_string()))?;
        Ok(Self { scalar })
    }

    pub fn null(data_type: DataType) -> Self {
        Self {
            scalar: Scalar::null(data_type),
        }
    }

    pub fn scalar(&self) -> &Scalar {
        &self.scalar
    }

    pub fn data_type(&self) -> DataType {
        self.scalar.data_type()
    }

    pub fn is_null(&self) -> bool {
        self.scalar.is_null()
    }
}

impl From<Scalar> for Literal {
    fn from(scalar: Scalar) -> Self {
        Self { scalar }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    operator: Operator,
    operands: SmallVec<[NodeId; 2]>,
}

impl Operation {
    /// Build an operation, rejecting an operand count that differs from the operator's arity.
    pub fn new(
        operator: Operator,
        operands: impl IntoIterator<Item = NodeId>,
    ) -> ComputeResult<Self> {
        let operands: SmallVec<[NodeId; 2]> = operands.into_iter().collect();
        if operands.len() != operator.arity() {
            return Err(ComputeError::Construction(format!(
                "{operator} takes {} operand(s), got {}",
                operator.arity(),
                operands.len()
            )));
        }
        Ok(Self { operator, operands })
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operands(&self) -> &[NodeId] {
        &self.operands
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    ColumnReference(ColumnReference),
    Literal(Literal),
    Operation(Operation),
}

impl From<ColumnReference> for Node {
    fn from(value: ColumnReference) -> Self {
        Node::ColumnReference(value)
    }
}

impl From<Literal> for Node {
    fn from(value: Literal) -> Self {
        Node::Literal(value)
    }
}

impl From<Operation> for Node {
    fn from(value: Operation) -> Self {
        Node::Operation(value)
    }
}

/// Append-only arena of expression nodes.
///
/// A slot is either defined or reserved. Reserved slots come from [`NodeStore::reserve`] and must
/// be filled exactly once with [`NodeStore::define`]; that is also the only way to tie a node back
/// to one of its own ancestors.
#[derive(Clone, Debug, Default)]
pub struct NodeStore {
    nodes: Vec<Option<Node>>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, node: impl Into<Node>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node.into()));
        id
    }

    pub fn column(&mut self, index: i64) -> ComputeResult<NodeId> {
        Ok(self.add(ColumnReference::new(index)?))
    }

    pub fn literal(&mut self, scalar: Scalar) -> NodeId {
        self.add(Literal::from(scalar))
    }

    pub fn operation(
        &mut self,
        operator: Operator,
        operands: impl IntoIterator<Item = NodeId>,
    ) -> ComputeResult<NodeId> {
        Ok(self.add(Operation::new(operator, operands)?))
    }

    /// Hand out a handle whose node is supplied later via [`NodeStore::define`].
    pub fn reserve(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(None);
        id
    }

    pub fn define(&mut self, id: NodeId, node: impl Into<Node>) -> ComputeResult<()> {
        match self.nodes.get_mut(id.0) {
            Some(slot @ None) => {
                *slot = Some(node.into());
                Ok(())
            }
            Some(Some(_)) => Err(ComputeError::Construction(format!(
                "node {id} is already defined"
            ))),
            None => Err(ComputeError::Construction(format!(
                "node {id} does not belong to this store"
            ))),
        }
    }

    /// The node behind `id`, or `None` for foreign handles and reserved-but-undefined slots.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn negative_column_index_is_a_construction_error() {
        let err = ColumnReference::new(-1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert_eq!(ColumnReference::new(3).unwrap().index(), 3);
    }

    #[test]
    fn operation_checks_arity_at_construction() {
        let mut store = NodeStore::new();
        let a = store.column(0).unwrap();
        let err = Operation::new(Operator::Add, [a]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        let err = Operation::new(Operator::Negate, [a, a]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert!(Operation::new(Operator::Add, [a, a]).is_ok());
    }

    #[test]
    fn literal_rejects_value_outside_declared_type() {
        let err = Literal::new(ScalarValue::Int(300), DataType::Int8).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        let lit = Literal::null(DataType::Float64);
        assert!(lit.is_null());
        assert_eq!(lit.data_type(), DataType::Float64);
    }

    #[test]
    fn handles_stay_valid_across_insertions() {
        let mut store = NodeStore::new();
        let a = store.column(0).unwrap();
        let sum = store.operation(Operator::Add, [a, a]).unwrap();
        for i in 0..100 {
            store.column(i).unwrap();
        }
        assert_eq!(
            store.get(a),
            Some(&Node::ColumnReference(ColumnReference::new(0).unwrap()))
        );
        match store.get(sum) {
            Some(Node::Operation(op)) => assert_eq!(op.operands(), &[a, a]),
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn reserved_slot_is_defined_exactly_once() {
        let mut store = NodeStore::new();
        let id = store.reserve();
        assert!(store.get(id).is_none());
        store.define(id, ColumnReference::new(0).unwrap()).unwrap();
        assert!(store.get(id).is_some());
        let err = store
            .define(id, ColumnReference::new(1).unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }
}
