/// Statement model, SQL text compiler, and join planner.
///
/// ```text
/// tables + predicate pool
///       ↓
/// Join Planner            (planner.rs)
///       ↓
/// Statement model         (types.rs)
///       ↓
/// SQL Compiler            (compiler.rs)
/// ```
pub mod compiler;
pub mod planner;
pub mod types;

pub use compiler::{compile_delete, compile_insert, compile_select, compile_update};
pub use planner::{plan_joins, JoinPlan};
pub use types::*;
