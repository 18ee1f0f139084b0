//! docview Query - Query engine for materialized views.
//!
//! This crate turns `QueryOptions` into result rows over one view's index:
//!
//! - `options`: Query options with chained setters
//! - `planner`: Range and key-set planning, descending bound swap, prefix match
//! - `executor`: Row assembly, group/reduce, post-filter and paging stages
//! - `reduce`: The reduce function trait and built-in reducers
//! - `context`: Execution context (collation, reducer, document source)
//! - `runner`: Drives a query through the stages above

pub mod context;
pub mod executor;
pub mod options;
pub mod planner;
pub mod reduce;
pub mod row;
pub mod runner;

pub use context::ExecutionContext;
pub use options::{PostFilter, QueryOptions};
pub use planner::{QueryMode, RangeQueryPlanner, ScanPlan};
pub use reduce::{Count, ReduceFunction, Stats, Sum};
pub use row::QueryRow;
pub use runner::QueryRunner;
