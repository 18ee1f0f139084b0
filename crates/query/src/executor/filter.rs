//! Post-filter executor.

use crate::options::PostFilter;
use crate::row::QueryRow;

/// Drops rows rejected by the caller's predicate.
pub struct FilterExecutor<'a> {
    predicate: Option<&'a PostFilter>,
}

impl<'a> FilterExecutor<'a> {
    pub fn new(predicate: Option<&'a PostFilter>) -> Self {
        Self { predicate }
    }

    pub fn execute(&self, rows: Vec<QueryRow>) -> Vec<QueryRow> {
        match self.predicate {
            Some(predicate) => rows.into_iter().filter(|row| predicate(row)).collect(),
            None => rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docview_core::Value;
    use std::sync::Arc;

    #[test]
    fn test_filter_executor() {
        let rows: Vec<_> = (0..6)
            .map(|i| QueryRow::mapped(Value::from(i), Value::Null, "d", i as u64))
            .collect();
        let even: PostFilter = Arc::new(|row: &QueryRow| row.sequence % 2 == 0);
        let kept = FilterExecutor::new(Some(&even)).execute(rows.clone());
        assert_eq!(kept.len(), 3);
        assert_eq!(FilterExecutor::new(None).execute(rows).len(), 6);
    }
}
