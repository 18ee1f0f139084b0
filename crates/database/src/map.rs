//! Map functions and view definitions.

use docview_core::{Properties, Sequence, Value};
use docview_query::ReduceFunction;
use std::fmt;
use std::sync::Arc;

/// Deterministic transform from a document to zero or more rows.
pub trait MapFunction: Send + Sync {
    fn map(&self, doc: &Properties, emit: &mut Emitter);
}

impl<F> MapFunction for F
where
    F: Fn(&Properties, &mut Emitter) + Send + Sync,
{
    fn map(&self, doc: &Properties, emit: &mut Emitter) {
        self(doc, emit)
    }
}

/// Emit sink handed to a map function, bound to the sequence of the
/// revision being mapped.
#[derive(Debug)]
pub struct Emitter {
    sequence: Sequence,
    rows: Vec<(Value, Value)>,
}

impl Emitter {
    pub(crate) fn new(sequence: Sequence) -> Self {
        Self {
            sequence,
            rows: Vec::new(),
        }
    }

    /// Emits one row.
    pub fn emit(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        self.rows.push((key.into(), value.into()));
    }

    /// Sequence of the revision being mapped.
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn into_rows(self) -> Vec<(Value, Value)> {
        self.rows
    }
}

/// The delegates of a view: a map function and an optional reducer.
///
/// ```rust
/// use docview_core::Properties;
/// use docview_database::{Emitter, ViewDefinition};
/// use docview_query::Count;
///
/// let by_type = ViewDefinition::new(|doc: &Properties, emit: &mut Emitter| {
///     if let Some(kind) = doc.get("type") {
///         emit.emit(kind.clone(), 1);
///     }
/// })
/// .with_reduce(Count);
/// assert!(by_type.has_map() && by_type.has_reduce());
/// ```
#[derive(Clone, Default)]
pub struct ViewDefinition {
    pub(crate) map: Option<Arc<dyn MapFunction>>,
    pub(crate) reduce: Option<Arc<dyn ReduceFunction>>,
}

impl ViewDefinition {
    pub fn new<F>(map: F) -> Self
    where
        F: Fn(&Properties, &mut Emitter) + Send + Sync + 'static,
    {
        Self {
            map: Some(Arc::new(map)),
            reduce: None,
        }
    }

    pub fn with_reduce(mut self, reduce: impl ReduceFunction + 'static) -> Self {
        self.reduce = Some(Arc::new(reduce));
        self
    }

    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }

    pub fn has_reduce(&self) -> bool {
        self.reduce.is_some()
    }

    pub fn map_function(&self) -> Option<&dyn MapFunction> {
        self.map.as_deref()
    }

    pub fn reduce_function(&self) -> Option<&dyn ReduceFunction> {
        self.reduce.as_deref()
    }
}

impl fmt::Debug for ViewDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewDefinition")
            .field("map", &self.has_map())
            .field("reduce", &self.has_reduce())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docview_query::Sum;

    #[test]
    fn test_emitter_collects_rows() {
        let mut emit = Emitter::new(7);
        assert!(emit.is_empty());
        emit.emit("a", 1);
        emit.emit(Value::Null, vec![Value::from(2)]);
        assert_eq!(emit.sequence(), 7);
        assert_eq!(emit.len(), 2);
        assert_eq!(emit.into_rows()[0], (Value::from("a"), Value::from(1)));
    }

    #[test]
    fn test_definition_runs_map() {
        let def = ViewDefinition::new(|doc: &Properties, emit: &mut Emitter| {
            if let Some(n) = doc.get("n") {
                emit.emit(n.clone(), Value::Null);
            }
        })
        .with_reduce(Sum);

        let mut doc = Properties::new();
        doc.insert("n", 3);
        let mut emit = Emitter::new(1);
        def.map_function().unwrap().map(&doc, &mut emit);
        assert_eq!(emit.into_rows(), vec![(Value::from(3), Value::Null)]);
        assert!(def.reduce_function().is_some());
    }

    #[test]
    fn test_default_has_no_delegates() {
        let def = ViewDefinition::default();
        assert!(!def.has_map());
        assert!(!def.has_reduce());
        assert_eq!(format!("{:?}", def), "ViewDefinition { map: false, reduce: false }");
    }
}
