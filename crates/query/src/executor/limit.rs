//! Limit executor.

use crate::row::QueryRow;

/// Applies skip and limit to a result list.
pub struct LimitExecutor {
    limit: Option<usize>,
    skip: usize,
}

impl LimitExecutor {
    pub fn new(limit: Option<usize>, skip: usize) -> Self {
        Self { limit, skip }
    }

    pub fn execute(&self, mut rows: Vec<QueryRow>) -> Vec<QueryRow> {
        let len = rows.len();
        let start = self.skip.min(len);
        let end = match self.limit {
            Some(limit) => start.saturating_add(limit).min(len),
            None => len,
        };
        rows.truncate(end);
        if start > 0 {
            rows.drain(..start);
        }
        rows
    }
}
