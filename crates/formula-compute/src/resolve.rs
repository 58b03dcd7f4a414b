//! Bottom-up type and nullability resolution.
//!
//! Runs once per call, in slot order, and lowers the [`Plan`] into register-addressed [`Step`]s
//! that the row evaluator executes without further type dispatch decisions.

use crate::error::{ComputeError, ComputeResult};
use crate::operator::Operator;
use crate::plan::{Instruction, Plan};
use crate::promote::promote;
use crate::value::Value;
use formula_columnar::{DataType, Table};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedType {
    pub data_type: DataType,
    pub nullable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StepKind {
    Load { column: usize },
    Constant { value: Value, valid: bool },
    Unary { operator: Operator, operand: usize },
    Binary { operator: Operator, lhs: usize, rhs: usize },
    /// Comparison of two integer operands. Each side stays in its own lane, so signed and
    /// unsigned 64-bit values compare exactly instead of meeting in `Float64`.
    Compare { operator: Operator, lhs: usize, rhs: usize },
}

/// One typed instruction. Operand and destination fields are register indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub kind: StepKind,
    pub dest: usize,
    pub compute: DataType,
    pub output: DataType,
    pub nullable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypedPlan {
    steps: Vec<Step>,
    resolved: Vec<ResolvedType>,
    register_count: usize,
    shared_hits: usize,
}

impl TypedPlan {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Type and nullability of every slot, in slot order.
    pub fn resolved(&self) -> &[ResolvedType] {
        &self.resolved
    }

    pub fn register_count(&self) -> usize {
        self.register_count
    }

    pub fn shared_hits(&self) -> usize {
        self.shared_hits
    }

    pub fn root(&self) -> ResolvedType {
        self.resolved.last().copied().unwrap_or(ResolvedType {
            data_type: DataType::Bool,
            nullable: false,
        })
    }

    pub fn root_register(&self) -> usize {
        self.steps.last().map_or(0, |step| step.dest)
    }

    pub fn output_type(&self) -> DataType {
        self.root().data_type
    }

    pub fn output_nullable(&self) -> bool {
        self.root().nullable
    }
}

fn check_supported(data_type: DataType) -> ComputeResult<DataType> {
    if data_type.is_fixed_width() {
        Ok(data_type)
    } else {
        Err(ComputeError::UnsupportedType(data_type))
    }
}

fn nullability(operator: Operator, operands: &[bool]) -> bool {
    let any_nullable = operands.iter().any(|&n| n);
    if !operator.is_null_safe() {
        return any_nullable;
    }
    match operator {
        Operator::IsNull | Operator::IsValid | Operator::NullEqual => false,
        Operator::Coalesce => operands.iter().all(|&n| n),
        // Kleene AND/OR are null when the deciding operand is null.
        _ => any_nullable,
    }
}

/// Assign a type and nullability to every instruction of `plan` and lower it to steps.
pub fn resolve(plan: &Plan, table: &Table) -> ComputeResult<TypedPlan> {
    let registers = plan.allocate_registers();
    let mut steps = Vec::with_capacity(plan.len());
    let mut resolved: Vec<ResolvedType> = Vec::with_capacity(plan.len());

    for (slot, instruction) in plan.instructions().iter().enumerate() {
        let dest = registers.slots[slot];
        let step = match instruction {
            Instruction::ColumnReference { column } => {
                let col = table.column(*column).ok_or(ComputeError::OutOfRange {
                    index: *column,
                    width: table.width(),
                })?;
                let data_type = check_supported(col.data_type())?;
                Step {
                    kind: StepKind::Load { column: *column },
                    dest,
                    compute: data_type,
                    output: data_type,
                    nullable: col.is_nullable(),
                }
            }
            Instruction::Literal(scalar) => {
                let data_type = check_supported(scalar.data_type())?;
                Step {
                    kind: StepKind::Constant {
                        value: Value::from_scalar(scalar.value(), data_type),
                        valid: !scalar.is_null(),
                    },
                    dest,
                    compute: data_type,
                    output: data_type,
                    nullable: scalar.is_null(),
                }
            }
            Instruction::Operation { operator, operands } => {
                let types: Vec<DataType> = operands
                    .iter()
                    .map(|&o| check_supported(resolved[o].data_type))
                    .collect::<ComputeResult<_>>()?;
                let nullable: Vec<bool> = operands.iter().map(|&o| resolved[o].nullable).collect();
                let promotion = promote(*operator, &types)?;
                let kind = match operands.as_slice() {
                    [operand] => StepKind::Unary {
                        operator: *operator,
                        operand: registers.slots[*operand],
                    },
                    [lhs, rhs]
                        if operator.is_comparison() && types.iter().all(|t| t.is_integer()) =>
                    {
                        StepKind::Compare {
                            operator: *operator,
                            lhs: registers.slots[*lhs],
                            rhs: registers.slots[*rhs],
                        }
                    }
                    [lhs, rhs] => StepKind::Binary {
                        operator: *operator,
                        lhs: registers.slots[*lhs],
                        rhs: registers.slots[*rhs],
                    },
                    _ => {
                        return Err(ComputeError::InvalidExpression(format!(
                            "{operator} with {} operands",
                            operands.len()
                        )));
                    }
                };
                Step {
                    kind,
                    dest,
                    compute: promotion.compute,
                    output: promotion.output,
                    nullable: nullability(*operator, &nullable),
                }
            }
        };
        resolved.push(ResolvedType {
            data_type: step.output,
            nullable: step.nullable,
        });
        steps.push(step);
    }

    if steps.is_empty() {
        return Err(ComputeError::InvalidExpression(
            "expression has no root".to_string(),
        ));
    }

    Ok(TypedPlan {
        steps,
        resolved,
        register_count: registers.count,
        shared_hits: plan.shared_hits(),
    })
}
