//! Row-wise expression evaluation over columnar tables.
//!
//! Expressions are built as nodes in a [`NodeStore`] and evaluated with [`compute_column`]:
//!
//! 1. [`Plan::build`] flattens the graph reachable from the root into post-order slots, reusing
//!    the slot of any node reached through more than one parent.
//! 2. [`resolve`](resolve::resolve) assigns a type and nullability to every slot and lowers the
//!    plan to register-addressed steps.
//! 3. The typed output (and a mask, only for nullable roots) is reserved, then every row runs the
//!    steps independently and writes its root straight into it (in parallel with the `parallel`
//!    feature).
//!
//! All failures surface during steps 1 and 2 or the reservation, before any row is evaluated.

#![forbid(unsafe_code)]

pub mod aggregate;
mod error;
mod eval;
mod kernels;
mod materialize;
mod node;
mod operator;
mod options;
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
mod parallel;
mod plan;
pub mod promote;
pub mod resolve;
mod value;

pub use aggregate::{reduction_output_type, AggregateKind};
pub use error::{ComputeError, ComputeResult, ErrorKind};
pub use eval::{evaluate, RowVm};
pub use materialize::OutputColumn;
pub use node::{ColumnReference, Literal, Node, NodeId, NodeStore, Operation};
pub use operator::Operator;
pub use options::ComputeOptions;
pub use plan::{Instruction, Plan, Registers};
pub use promote::{common_type, promote, Promotion};
pub use resolve::{ResolvedType, Step, StepKind, TypedPlan};
pub use value::Value;

use formula_columnar::{Column, Table};

/// Flatten and type the expression rooted at `root` without evaluating it.
pub fn compile(table: &Table, store: &NodeStore, root: NodeId) -> ComputeResult<TypedPlan> {
    let plan = Plan::build(store, root, table)?;
    log::trace!("flattened expression {root}:\n{plan}");
    let typed = resolve::resolve(&plan, table)?;
    log::debug!(
        "compiled expression {root}: {} instructions, {} shared, {} registers, output {}{}",
        plan.len(),
        plan.shared_hits(),
        typed.register_count(),
        typed.output_type(),
        if typed.output_nullable() {
            " (nullable)"
        } else {
            ""
        }
    );
    Ok(typed)
}

/// Evaluate the expression rooted at `root` for every row of `table`.
///
/// On success the returned column has `table.row_count()` rows and a validity mask only when the
/// root can be null. On failure nothing has been evaluated.
pub fn compute_column(table: &Table, store: &NodeStore, root: NodeId) -> ComputeResult<Column> {
    compute_column_with_options(table, store, root, &ComputeOptions::default())
}

pub fn compute_column_with_options(
    table: &Table,
    store: &NodeStore,
    root: NodeId,
    options: &ComputeOptions,
) -> ComputeResult<Column> {
    let plan = compile(table, store, root)?;
    let rows = table.row_count();
    let mut output = OutputColumn::allocate(plan.output_type(), plan.output_nullable(), rows)?;
    evaluate(&plan, table, options, &mut output);
    output.finish()
}
