use crate::kernels;
use crate::materialize::{OutputColumn, OutputLane};
use crate::options::ComputeOptions;
use crate::resolve::{StepKind, TypedPlan};
use crate::value::Value;
use formula_columnar::{Column, ColumnData, Table};

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use crate::parallel::row_pool;
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use rayon::prelude::*;

/// Register file for running a [`TypedPlan`] one row at a time.
///
/// Every step runs on every row; validity only decides the output bit, never which steps execute.
pub struct RowVm<'a> {
    plan: &'a TypedPlan,
    columns: &'a [Column],
    registers: Vec<(Value, bool)>,
}

impl<'a> RowVm<'a> {
    pub fn new(plan: &'a TypedPlan, table: &'a Table) -> Self {
        Self {
            plan,
            columns: table.columns(),
            registers: vec![(Value::default(), false); plan.register_count().max(1)],
        }
    }

    /// Value and validity of the root for `row`.
    #[inline]
    pub fn eval_row(&mut self, row: usize) -> (Value, bool) {
        for step in self.plan.steps() {
            let result = match step.kind {
                StepKind::Load { column } => {
                    let col = &self.columns[column];
                    (Value::load(col.data(), row), col.is_valid(row))
                }
                StepKind::Constant { value, valid } => (value, valid),
                StepKind::Unary { operator, operand } => {
                    let (v, valid) = self.registers[operand];
                    let (out, valid) = kernels::unary(operator, v.cast(step.compute), valid);
                    (out.cast(step.output), valid)
                }
                StepKind::Binary { operator, lhs, rhs } => {
                    let (a, a_valid) = self.registers[lhs];
                    let (b, b_valid) = self.registers[rhs];
                    let (out, valid) = kernels::binary(
                        operator,
                        a.cast(step.compute),
                        a_valid,
                        b.cast(step.compute),
                        b_valid,
                    );
                    (out.cast(step.output), valid)
                }
                StepKind::Compare { operator, lhs, rhs } => {
                    let (a, a_valid) = self.registers[lhs];
                    let (b, b_valid) = self.registers[rhs];
                    kernels::binary(operator, a, a_valid, b, b_valid)
                }
            };
            debug_assert!(step.nullable || result.1, "non-nullable step produced a null");
            self.registers[step.dest] = result;
        }
        self.registers[self.plan.root_register()]
    }

    /// Evaluate rows `start..start + values.len()` into typed output slots.
    ///
    /// `mask` holds the words for exactly these rows, so `start` must be word aligned when it is
    /// given. Words arrive zeroed; only valid rows set their bit.
    pub(crate) fn eval_into<T: OutputLane>(
        &mut self,
        start: usize,
        values: &mut [T],
        mut mask: Option<&mut [u64]>,
    ) {
        debug_assert!(mask.is_none() || start % 64 == 0, "mask slice is not word aligned");
        for (i, slot) in values.iter_mut().enumerate() {
            let (value, valid) = self.eval_row(start + i);
            *slot = T::from_value(value);
            if let Some(words) = mask.as_deref_mut() {
                words[i / 64] |= u64::from(valid) << (i % 64);
            }
        }
    }
}

/// Rows per task. Masked outputs use whole mask words per task.
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn task_rows(rows_per_task: usize, masked: bool) -> usize {
    let rows = rows_per_task.max(1);
    if masked {
        rows.next_multiple_of(64)
    } else {
        rows
    }
}

fn evaluate_into<T: OutputLane>(
    plan: &TypedPlan,
    table: &Table,
    options: &ComputeOptions,
    values: &mut [T],
    mask: Option<&mut [u64]>,
) {
    let rows = values.len();
    debug_assert_eq!(rows, table.row_count());

    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    {
        let chunk = task_rows(options.rows_per_task, mask.is_some());
        if options.parallel && rows >= options.min_parallel_rows && rows > chunk {
            if let Some(pool) = row_pool() {
                log::debug!(
                    "evaluating {rows} rows in {} tasks on {} threads",
                    rows.div_ceil(chunk),
                    pool.current_num_threads()
                );
                pool.install(|| match mask {
                    Some(words) => values
                        .par_chunks_mut(chunk)
                        .zip(words.par_chunks_mut(chunk / 64))
                        .enumerate()
                        .for_each_init(
                            || RowVm::new(plan, table),
                            |vm, (task, (values, words))| {
                                vm.eval_into(task * chunk, values, Some(words));
                            },
                        ),
                    None => values.par_chunks_mut(chunk).enumerate().for_each_init(
                        || RowVm::new(plan, table),
                        |vm, (task, values)| vm.eval_into(task * chunk, values, None),
                    ),
                });
                return;
            }
        }
    }
    #[cfg(not(all(feature = "parallel", not(target_arch = "wasm32"))))]
    let _ = options;

    log::debug!("evaluating {rows} rows on the calling thread");
    RowVm::new(plan, table).eval_into(0, values, mask);
}

/// Run `plan` over every row of `table`, writing the root straight into `out`.
///
/// Rows are split into tasks of `options.rows_per_task`; each task owns one [`RowVm`] and writes
/// only its own range of values and mask words.
pub fn evaluate(plan: &TypedPlan, table: &Table, options: &ComputeOptions, out: &mut OutputColumn) {
    let (data, mask) = out.parts_mut();
    match data {
        ColumnData::Bool(v) => evaluate_into(plan, table, options, v.as_mut_slice(), mask),
        ColumnData::Int8(v) => evaluate_into(plan, table, options, v.as_mut_slice(), mask),
        ColumnData::Int16(v) => evaluate_into(plan, table, options, v.as_mut_slice(), mask),
        ColumnData::Int32(v) => evaluate_into(plan, table, options, v.as_mut_slice(), mask),
        ColumnData::Int64(v) | ColumnData::Timestamp(_, v) => {
            evaluate_into(plan, table, options, v.as_mut_slice(), mask)
        }
        ColumnData::UInt8(v) => evaluate_into(plan, table, options, v.as_mut_slice(), mask),
        ColumnData::UInt16(v) => evaluate_into(plan, table, options, v.as_mut_slice(), mask),
        ColumnData::UInt32(v) => evaluate_into(plan, table, options, v.as_mut_slice(), mask),
        ColumnData::UInt64(v) => evaluate_into(plan, table, options, v.as_mut_slice(), mask),
        ColumnData::Float32(v) => evaluate_into(plan, table, options, v.as_mut_slice(), mask),
        ColumnData::Float64(v) => evaluate_into(plan, table, options, v.as_mut_slice(), mask),
        // Refused by `OutputColumn::allocate`.
        ColumnData::Utf8(_) | ColumnData::List { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeStore;
    use crate::operator::Operator;
    use crate::plan::Plan;
    use crate::resolve::resolve;
    use formula_columnar::{DataType, Scalar};

    #[test]
    fn row_vm_evaluates_each_row_independently() {
        let table = Table::new(vec![
            Column::from_i32_options([Some(1), None, Some(3)]),
            Column::from_u8([10, 20, 30]),
        ])
        .unwrap();
        let mut store = NodeStore::new();
        let a = store.column(0).unwrap();
        let b = store.column(1).unwrap();
        let two = store.literal(Scalar::int8(2));
        let ab = store.operation(Operator::Mul, [a, b]).unwrap();
        let root = store.operation(Operator::Sub, [ab, two]).unwrap();
        let plan = resolve(&Plan::build(&store, root, &table).unwrap(), &table).unwrap();
        assert_eq!(plan.output_type(), DataType::Int32);

        let mut vm = RowVm::new(&plan, &table);
        assert_eq!(vm.eval_row(2), (Value::Int(88), true));
        assert_eq!(vm.eval_row(0), (Value::Int(8), true));
        let (_, valid) = vm.eval_row(1);
        assert!(!valid);
    }

    #[test]
    fn narrow_integer_arithmetic_wraps_at_declared_width() {
        let table = Table::new(vec![Column::from_u8([250, 3])]).unwrap();
        let mut store = NodeStore::new();
        let a = store.column(0).unwrap();
        let ten = store.literal(Scalar::uint8(10));
        let root = store.operation(Operator::Add, [a, ten]).unwrap();
        let plan = resolve(&Plan::build(&store, root, &table).unwrap(), &table).unwrap();
        let mut vm = RowVm::new(&plan, &table);
        assert_eq!(vm.eval_row(0), (Value::UInt(4), true));
        assert_eq!(vm.eval_row(1), (Value::UInt(13), true));
    }

    #[test]
    fn eval_into_sets_mask_bits_only_for_valid_rows() {
        let values = (0..70i16).map(|i| (i % 3 != 0).then_some(i));
        let table = Table::new(vec![Column::from_i16_options(values)]).unwrap();
        let mut store = NodeStore::new();
        let a = store.column(0).unwrap();
        let root = store.operation(Operator::Negate, [a]).unwrap();
        let plan = resolve(&Plan::build(&store, root, &table).unwrap(), &table).unwrap();

        let mut out = [0i16; 6];
        let mut words = [0u64; 1];
        RowVm::new(&plan, &table).eval_into(64, &mut out[..], Some(&mut words[..]));
        // Rows 66 and 69 are null.
        assert_eq!(words[0], 0b01_1011);
        assert_eq!(out[..2], [-64, -65]);
    }

    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    #[test]
    fn masked_tasks_cover_whole_mask_words() {
        assert_eq!(task_rows(97, false), 97);
        assert_eq!(task_rows(97, true), 128);
        assert_eq!(task_rows(0, true), 64);
        assert_eq!(task_rows(16_384, true), 16_384);
    }
}
