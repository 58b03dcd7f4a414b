//! Flattening of a node graph into a linear instruction sequence.

use crate::error::{ComputeError, ComputeResult};
use crate::node::{Node, NodeId, NodeStore};
use crate::operator::Operator;
use ahash::AHashMap;
use formula_columnar::{Scalar, ScalarValue, Table};
use smallvec::SmallVec;
use std::fmt;

/// One entry of a [`Plan`]. Operand slots always precede the instruction's own slot.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    ColumnReference {
        column: usize,
    },
    Literal(Scalar),
    Operation {
        operator: Operator,
        operands: SmallVec<[usize; 2]>,
    },
}

impl Instruction {
    pub fn operands(&self) -> &[usize] {
        match self {
            Instruction::Operation { operands, .. } => operands,
            Instruction::ColumnReference { .. } | Instruction::Literal(_) => &[],
        }
    }
}

/// Post-order instruction sequence for one root. The last slot is the root's.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    instructions: Vec<Instruction>,
    shared_hits: usize,
}

/// Scratch-register assignment for a plan: `slots[i]` is the register slot `i` writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers {
    pub slots: Vec<usize>,
    pub count: usize,
}

#[derive(Clone, Copy)]
enum Mark {
    OnPath,
    Done(usize),
}

impl Plan {
    /// Flatten the graph reachable from `root`.
    ///
    /// Each node is emitted once; a node reached again through another parent reuses its slot.
    /// Column indices are checked against `table`'s width here.
    pub fn build(store: &NodeStore, root: NodeId, table: &Table) -> ComputeResult<Plan> {
        if store.is_empty() {
            return Err(ComputeError::InvalidExpression(
                "expression has no nodes".to_string(),
            ));
        }
        let lookup = move |id: NodeId| {
            store.get(id).ok_or_else(|| {
                ComputeError::InvalidExpression(format!("node {id} is not defined in this store"))
            })
        };
        lookup(root)?;

        let mut marks: AHashMap<NodeId, Mark> = AHashMap::new();
        let mut instructions: Vec<Instruction> = Vec::new();
        let mut shared_hits = 0usize;
        // (node, index of the next operand to visit)
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::OnPath);

        while let Some(&(id, next)) = stack.last() {
            let node = lookup(id)?;
            let operands: &[NodeId] = match node {
                Node::Operation(op) => op.operands(),
                Node::ColumnReference(_) | Node::Literal(_) => &[],
            };

            if let Some(&child) = operands.get(next) {
                if let Some(frame) = stack.last_mut() {
                    frame.1 += 1;
                }
                match marks.get(&child) {
                    Some(Mark::OnPath) => {
                        return Err(ComputeError::InvalidExpression(format!(
                            "node {child} is its own operand (reference cycle)"
                        )));
                    }
                    Some(Mark::Done(_)) => shared_hits += 1,
                    None => {
                        lookup(child)?;
                        marks.insert(child, Mark::OnPath);
                        stack.push((child, 0));
                    }
                }
                continue;
            }

            stack.pop();
            let instruction = match node {
                Node::ColumnReference(col) => {
                    let width = table.width();
                    if col.index() >= width {
                        return Err(ComputeError::OutOfRange {
                            index: col.index(),
                            width,
                        });
                    }
                    Instruction::ColumnReference {
                        column: col.index(),
                    }
                }
                Node::Literal(lit) => Instruction::Literal(lit.scalar().clone()),
                Node::Operation(op) => {
                    let mut slots = SmallVec::new();
                    for operand in op.operands() {
                        match marks.get(operand) {
                            Some(Mark::Done(slot)) => slots.push(*slot),
                            _ => {
                                return Err(ComputeError::InvalidExpression(format!(
                                    "operand {operand} of node {id} was not flattened"
                                )));
                            }
                        }
                    }
                    Instruction::Operation {
                        operator: op.operator(),
                        operands: slots,
                    }
                }
            };
            marks.insert(id, Mark::Done(instructions.len()));
            instructions.push(instruction);
        }

        Ok(Plan {
            instructions,
            shared_hits,
        })
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn root_slot(&self) -> usize {
        self.instructions.len().saturating_sub(1)
    }

    /// Number of times an already-flattened node was reached through another parent.
    pub fn shared_hits(&self) -> usize {
        self.shared_hits
    }

    /// For each slot, the slot of its last consumer. `None` means nothing reads it (the root).
    pub fn last_uses(&self) -> Vec<Option<usize>> {
        let mut last = vec![None; self.instructions.len()];
        for (slot, instruction) in self.instructions.iter().enumerate() {
            for &operand in instruction.operands() {
                last[operand] = Some(slot);
            }
        }
        last
    }

    /// Linear-scan register assignment.
    ///
    /// A register is released as soon as the last consumer of its value has been assigned, and
    /// that consumer may write its own result into it (operands are read before the write).
    pub fn allocate_registers(&self) -> Registers {
        let last_uses = self.last_uses();
        let mut slots = Vec::with_capacity(self.instructions.len());
        let mut free: Vec<usize> = Vec::new();
        let mut count = 0usize;

        for (slot, instruction) in self.instructions.iter().enumerate() {
            let operands = instruction.operands();
            for (i, &operand) in operands.iter().enumerate() {
                // `x op x` releases `x` once.
                if operands[..i].contains(&operand) {
                    continue;
                }
                if last_uses[operand] == Some(slot) {
                    free.push(slots[operand]);
                }
            }
            let register = free.pop().unwrap_or_else(|| {
                count += 1;
                count - 1
            });
            slots.push(register);
        }

        Registers { slots, count }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (slot, instruction) in self.instructions.iter().enumerate() {
            write!(f, "%{slot} = ")?;
            match instruction {
                Instruction::ColumnReference { column } => write!(f, "col {column}")?,
                Instruction::Literal(scalar) => {
                    write!(f, "lit {} ", scalar.data_type())?;
                    match scalar.value() {
                        None => f.write_str("null")?,
                        Some(ScalarValue::Bool(v)) => write!(f, "{v}")?,
                        Some(ScalarValue::Int(v)) => write!(f, "{v}")?,
                        Some(ScalarValue::UInt(v)) => write!(f, "{v}")?,
                        Some(ScalarValue::Float(v)) => write!(f, "{v}")?,
                        Some(ScalarValue::Utf8(v)) => write!(f, "{v:?}")?,
                    }
                }
                Instruction::Operation { operator, operands } => {
                    write!(f, "{operator}")?;
                    for (i, operand) in operands.iter().enumerate() {
                        let sep = if i == 0 { " " } else { ", " };
                        write!(f, "{sep}%{operand}")?;
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::node::{ColumnReference, Operation};
    use formula_columnar::Column;
    use pretty_assertions::assert_eq;

    fn table(width: usize) -> Table {
        Table::new((0..width).map(|_| Column::from_i32([1, 2, 3])).collect()).unwrap()
    }

    #[test]
    fn shared_node_is_flattened_once() {
        let mut store = NodeStore::new();
        let a = store.column(0).unwrap();
        let b = store.column(1).unwrap();
        let ab = store.operation(Operator::Add, [a, b]).unwrap();
        let root = store.operation(Operator::Mul, [ab, ab]).unwrap();

        let plan = Plan::build(&store, root, &table(2)).unwrap();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.shared_hits(), 1);
        assert_eq!(plan.root_slot(), 3);
        assert_eq!(
            plan.instructions()[3],
            Instruction::Operation {
                operator: Operator::Mul,
                operands: SmallVec::from_slice(&[2, 2]),
            }
        );
        assert_eq!(
            plan.to_string(),
            "%0 = col 0\n%1 = col 1\n%2 = ADD %0, %1\n%3 = MUL %2, %2\n"
        );
    }

    #[test]
    fn operands_precede_their_consumers() {
        let mut store = NodeStore::new();
        let col = store.column(0).unwrap();
        let mut root = store.operation(Operator::Add, [col, col]).unwrap();
        for _ in 0..50 {
            root = store.operation(Operator::Add, [root, col]).unwrap();
        }
        let plan = Plan::build(&store, root, &table(1)).unwrap();
        assert_eq!(plan.len(), 52);
        for (slot, ins) in plan.instructions().iter().enumerate() {
            assert!(ins.operands().iter().all(|&o| o < slot));
        }
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let mut store = NodeStore::new();
        let col = store.column(0).unwrap();
        let mut root = col;
        for _ in 0..200_000 {
            root = store.operation(Operator::Negate, [root]).unwrap();
        }
        let plan = Plan::build(&store, root, &table(1)).unwrap();
        assert_eq!(plan.len(), 200_001);
        assert_eq!(plan.allocate_registers().count, 1);
    }

    #[test]
    fn column_index_is_checked_against_table_width() {
        let mut store = NodeStore::new();
        let root = store.column(2).unwrap();
        let err = Plan::build(&store, root, &table(2)).unwrap_err();
        assert_eq!(err, ComputeError::OutOfRange { index: 2, width: 2 });
    }

    #[test]
    fn cycle_is_rejected() {
        let mut store = NodeStore::new();
        let a = store.column(0).unwrap();
        let fwd = store.reserve();
        let sum = store.operation(Operator::Add, [a, fwd]).unwrap();
        store
            .define(fwd, Operation::new(Operator::Negate, [sum]).unwrap())
            .unwrap();
        let err = Plan::build(&store, sum, &table(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidExpression);
    }

    #[test]
    fn undefined_or_foreign_handles_are_rejected() {
        let mut store = NodeStore::new();
        let a = store.column(0).unwrap();
        let hole = store.reserve();
        let root = store.operation(Operator::Add, [a, hole]).unwrap();
        let err = Plan::build(&store, root, &table(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidExpression);

        let empty = NodeStore::new();
        let err = Plan::build(&empty, a, &table(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidExpression);

        let mut other = NodeStore::new();
        other.add(ColumnReference::new(0).unwrap());
        let err = Plan::build(&other, root, &table(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidExpression);
    }

    #[test]
    fn registers_are_recycled_after_last_use() {
        let mut store = NodeStore::new();
        let a = store.column(0).unwrap();
        let b = store.column(1).unwrap();
        let c = store.column(2).unwrap();
        let ab = store.operation(Operator::Add, [a, b]).unwrap();
        let root = store.operation(Operator::Add, [ab, c]).unwrap();
        let plan = Plan::build(&store, root, &table(3)).unwrap();

        assert_eq!(
            plan.last_uses(),
            vec![Some(2), Some(2), Some(4), Some(4), None]
        );
        let regs = plan.allocate_registers();
        // a+b reuses a register freed by its operands and c takes the other one.
        assert_eq!(regs.count, 2);
        assert_ne!(regs.slots[2], regs.slots[3]);
    }
}
