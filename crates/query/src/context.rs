//! Execution context for view queries.

use crate::executor::{DEFAULT_LINK_FIELD, DEFAULT_REDUCE_BATCH_SIZE};
use crate::reduce::ReduceFunction;
use docview_core::Collation;
use docview_storage::RevisionLog;

/// Everything a query needs to know about the view besides its index.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub view_name: &'a str,
    pub collation: Collation,
    pub reducer: Option<&'a dyn ReduceFunction>,
    pub documents: &'a dyn RevisionLog,
    pub link_field: &'a str,
    pub reduce_batch_size: usize,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(view_name: &'a str, collation: Collation, documents: &'a dyn RevisionLog) -> Self {
        Self {
            view_name,
            collation,
            reducer: None,
            documents,
            link_field: DEFAULT_LINK_FIELD,
            reduce_batch_size: DEFAULT_REDUCE_BATCH_SIZE,
        }
    }

    pub fn with_reducer(mut self, reducer: Option<&'a dyn ReduceFunction>) -> Self {
        self.reducer = reducer;
        self
    }

    pub fn with_link_field(mut self, link_field: &'a str) -> Self {
        self.link_field = link_field;
        self
    }

    pub fn with_reduce_batch_size(mut self, batch_size: usize) -> Self {
        self.reduce_batch_size = batch_size;
        self
    }
}

impl std::fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("view_name", &self.view_name)
            .field("collation", &self.collation)
            .field("has_reducer", &self.reducer.is_some())
            .field("link_field", &self.link_field)
            .field("reduce_batch_size", &self.reduce_batch_size)
            .finish()
    }
}
