//! Small dependency-graph executor for pure, synchronous tasks.
//!
//! ```text
//! TaskGraphBuilder → TaskGraph (validated, layered into waves) → execute
//!
//! - Task: named pure function `&S -> Update`, with named dependencies
//! - Wave: every task whose dependencies are complete; runs sequentially or
//!   on scoped threads, then its updates are applied in declaration order
//! ```
//!
//! Because updates are applied in declaration order after each wave joins,
//! parallel and sequential execution always produce the same final state.

mod executor;
mod plan;
mod task;

pub use executor::{execute, GraphRun};
pub use plan::{TaskGraph, TaskGraphBuilder};
pub use task::{ExecutionMode, GraphState};
