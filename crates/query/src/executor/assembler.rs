//! Builds result rows for direct (non-reduced) queries.

use crate::row::QueryRow;
use docview_core::{Properties, Result, Value};
use docview_index::KeyCodec;
use docview_storage::{EntryPosition, RevisionLog};

/// Field of an emitted value that names a linked document.
pub const DEFAULT_LINK_FIELD: &str = "_id";

/// Decodes index entries into `QueryRow`s and attaches documents.
pub struct QueryRowAssembler<'a> {
    codec: KeyCodec,
    documents: Option<&'a dyn RevisionLog>,
    link_field: &'a str,
}

impl<'a> QueryRowAssembler<'a> {
    pub fn new(codec: KeyCodec) -> Self {
        Self {
            codec,
            documents: None,
            link_field: DEFAULT_LINK_FIELD,
        }
    }

    /// Attaches document content from `documents` to every row.
    pub fn with_documents(mut self, documents: &'a dyn RevisionLog, link_field: &'a str) -> Self {
        self.documents = Some(documents);
        self.link_field = link_field;
        self
    }

    pub fn assemble(&self, position: &EntryPosition, value: &Value) -> Result<QueryRow> {
        let key = self.codec.decode(&position.key)?;
        let row = QueryRow::mapped(key, value.clone(), position.doc_id.as_str(), position.sequence);
        match self.documents {
            Some(documents) => {
                let document = self.document_for(documents, position, value)?;
                Ok(row.with_document(document))
            }
            None => Ok(row),
        }
    }

    /// A value that is an object with a string link field joins to that
    /// document; anything else gets the emitting revision's own body.
    fn document_for(
        &self,
        documents: &dyn RevisionLog,
        position: &EntryPosition,
        value: &Value,
    ) -> Result<Option<Properties>> {
        let linked = value
            .as_object()
            .and_then(|obj| obj.get(self.link_field))
            .and_then(Value::as_str);
        match linked {
            Some(doc_id) => documents.document(doc_id),
            None => documents.fetch_body(position.sequence),
        }
    }
}
