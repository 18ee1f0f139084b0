//! Query execution stages.

mod assembler;
mod filter;
mod group;
mod limit;

pub use assembler::{QueryRowAssembler, DEFAULT_LINK_FIELD};
pub use filter::FilterExecutor;
pub use group::{group_key, group_together, ReduceGroupEngine, DEFAULT_REDUCE_BATCH_SIZE};
pub use limit::LimitExecutor;
