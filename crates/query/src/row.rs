//! Query result rows.

use docview_core::{Properties, Sequence, Value};

/// One row of a view query.
///
/// Rows produced by a reduce or group query carry no document id and a
/// sequence of 0.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryRow {
    pub key: Value,
    pub value: Value,
    pub doc_id: Option<String>,
    pub sequence: Sequence,
    /// Attached document content, only for `include_docs` queries.
    pub document: Option<Properties>,
}

impl QueryRow {
    /// A row read directly from the index.
    pub fn mapped(key: Value, value: Value, doc_id: impl Into<String>, sequence: Sequence) -> Self {
        Self {
            key,
            value,
            doc_id: Some(doc_id.into()),
            sequence,
            document: None,
        }
    }

    /// A row produced by reducing a group.
    pub fn reduced(key: Value, value: Value) -> Self {
        Self {
            key,
            value,
            doc_id: None,
            sequence: 0,
            document: None,
        }
    }

    pub fn with_document(mut self, document: Option<Properties>) -> Self {
        self.document = document;
        self
    }

    pub fn is_reduced(&self) -> bool {
        self.doc_id.is_none()
    }
}
