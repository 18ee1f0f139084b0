//! Streaming grouping and reduction.

use crate::reduce::ReduceFunction;
use crate::row::QueryRow;
use docview_core::Value;

/// Default capacity reserved for a reduce batch.
pub const DEFAULT_REDUCE_BATCH_SIZE: usize = 100;

/// Returns true if two adjacent keys fall into the same group at `level`.
///
/// Level 0, or any non-list key, requires full equality. Lists shorter than
/// `level` only group with lists of the same length. Otherwise the first
/// `level` elements must be equal.
pub fn group_together(a: &Value, b: &Value, level: u32) -> bool {
    let (Value::Array(left), Value::Array(right)) = (a, b) else {
        return a == b;
    };
    if level == 0 {
        return a == b;
    }
    let level = level as usize;
    if (left.len() < level || right.len() < level) && left.len() != right.len() {
        return false;
    }
    let end = level.min(left.len()).min(right.len());
    left[..end] == right[..end]
}

/// The key reported for a group: list keys are cut to `level` elements.
pub fn group_key(key: &Value, level: u32) -> Value {
    match key {
        Value::Array(items) if level > 0 && items.len() > level as usize => {
            Value::Array(items[..level as usize].to_vec())
        }
        other => other.clone(),
    }
}

/// Groups an ordered stream of `(key, value)` pairs and reduces each group.
pub struct ReduceGroupEngine<'r> {
    reducer: Option<&'r dyn ReduceFunction>,
    group: bool,
    group_level: u32,
    batch_size: usize,
}

impl<'r> ReduceGroupEngine<'r> {
    pub fn new(reducer: Option<&'r dyn ReduceFunction>, group: bool, group_level: u32) -> Self {
        Self {
            reducer,
            group,
            group_level,
            batch_size: DEFAULT_REDUCE_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Consumes the stream and returns one row per group, in input order.
    /// An empty stream yields no rows.
    pub fn execute(&self, pairs: impl IntoIterator<Item = (Value, Value)>) -> Vec<QueryRow> {
        let mut rows = Vec::new();
        let mut batch = Batch::with_capacity(self.batch_size);

        for (key, value) in pairs {
            if self.group {
                let starts_group = match &batch.first_key {
                    Some(first) => !group_together(&key, first, self.group_level),
                    None => true,
                };
                if starts_group {
                    if let Some(row) = self.flush(&mut batch) {
                        rows.push(row);
                    }
                    batch.first_key = Some(key.clone());
                }
            }
            batch.keys.push(key);
            batch.values.push(value);
        }
        // The trailing group is only emitted here.
        if let Some(row) = self.flush(&mut batch) {
            rows.push(row);
        }
        rows
    }

    fn flush(&self, batch: &mut Batch) -> Option<QueryRow> {
        if batch.keys.is_empty() {
            return None;
        }
        let reduced = match self.reducer {
            Some(reducer) => reducer.reduce(&batch.keys, &batch.values, false),
            None => Value::Null,
        };
        let key = match (self.group, &batch.first_key) {
            (true, Some(first)) => group_key(first, self.group_level),
            _ => Value::Null,
        };
        batch.keys.clear();
        batch.values.clear();
        Some(QueryRow::reduced(key, reduced))
    }
}

struct Batch {
    first_key: Option<Value>,
    keys: Vec<Value>,
    values: Vec<Value>,
}

impl Batch {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            first_key: None,
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }
}
