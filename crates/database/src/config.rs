//! Database configuration.

use docview_core::DESIGN_DOC_PREFIX;
use docview_query::executor::{DEFAULT_LINK_FIELD, DEFAULT_REDUCE_BATCH_SIZE};

/// Settings shared by every view of a `Database`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Documents whose id starts with this prefix are never indexed.
    pub design_prefix: String,
    /// Field of an emitted value that links to another document when
    /// documents are included in query results.
    pub link_field: String,
    /// Initial capacity of a reduce batch.
    pub reduce_batch_size: usize,
    /// Row quota per view index; `None` is unbounded.
    pub max_rows_per_view: Option<usize>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            design_prefix: DESIGN_DOC_PREFIX.into(),
            link_field: DEFAULT_LINK_FIELD.into(),
            reduce_batch_size: DEFAULT_REDUCE_BATCH_SIZE,
            max_rows_per_view: None,
        }
    }
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_design_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.design_prefix = prefix.into();
        self
    }

    pub fn with_link_field(mut self, field: impl Into<String>) -> Self {
        self.link_field = field.into();
        self
    }

    pub fn with_reduce_batch_size(mut self, batch_size: usize) -> Self {
        self.reduce_batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_rows_per_view(mut self, max_rows: usize) -> Self {
        self.max_rows_per_view = Some(max_rows);
        self
    }
}
