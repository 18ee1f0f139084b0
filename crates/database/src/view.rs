//! View handles.

use crate::database::Shared;
use crate::map::ViewDefinition;
use crate::updater::{IndexUpdater, UpdateStatus};
use docview_core::{Collation, Error, Result, Sequence};
use docview_query::{ExecutionContext, QueryOptions, QueryRow, QueryRunner};
use docview_storage::{DumpRow, ViewCatalog, ViewId, ViewRecord};
use std::fmt;
use std::sync::Arc;

/// A handle to one view, resolved when it is opened.
///
/// The handle keeps the view's id; once the view is deleted every call
/// fails with `NotFound`, even if a view of the same name is defined again.
#[derive(Clone)]
pub struct View {
    shared: Arc<Shared>,
    name: String,
    id: ViewId,
    definition: ViewDefinition,
}

impl View {
    pub(crate) fn new(shared: Arc<Shared>, name: &str, id: ViewId, definition: ViewDefinition) -> Self {
        Self {
            shared,
            name: name.to_string(),
            id,
            definition,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &ViewDefinition {
        &self.definition
    }

    fn record<'c>(&self, catalog: &'c ViewCatalog) -> Result<&'c ViewRecord> {
        match catalog.record(&self.name) {
            Some(record) if record.id == self.id => Ok(record),
            _ => Err(Error::not_found(self.name.as_str())),
        }
    }

    /// Brings the index up to the log's current maximum sequence.
    pub fn update_index(&self) -> Result<UpdateStatus> {
        let mut catalog = self.shared.catalog.write();
        self.record(&catalog)?;
        IndexUpdater::new(
            &self.name,
            self.definition.map_function(),
            self.shared.log.as_ref(),
            &self.shared.config,
        )
        .run(&mut catalog)
    }

    /// Runs a query against the last committed index.
    pub fn query(&self, options: &QueryOptions) -> Result<Vec<QueryRow>> {
        let catalog = self.shared.catalog.read();
        let record = self.record(&catalog)?;
        let index = catalog
            .index(record.id)
            .ok_or_else(|| Error::storage(format!("view {} has no index", self.name)))?;
        let ctx = ExecutionContext::new(&self.name, record.collation, self.shared.log.as_ref())
            .with_reducer(self.definition.reduce_function())
            .with_link_field(&self.shared.config.link_field)
            .with_reduce_batch_size(self.shared.config.reduce_batch_size);
        QueryRunner::new(ctx).run(index, options)
    }

    pub fn total_rows(&self) -> Result<usize> {
        Ok(self.record(&self.shared.catalog.read())?.total_rows)
    }

    pub fn last_sequence_indexed(&self) -> Result<Sequence> {
        self.record(&self.shared.catalog.read())?.indexed_through()
    }

    pub fn last_sequence_changed_at(&self) -> Result<Sequence> {
        Ok(self.record(&self.shared.catalog.read())?.last_sequence_changed_at)
    }

    pub fn collation(&self) -> Result<Collation> {
        Ok(self.record(&self.shared.catalog.read())?.collation)
    }

    /// Changes the collation; a change empties the index.
    pub fn set_collation(&self, collation: Collation) -> Result<bool> {
        let mut catalog = self.shared.catalog.write();
        self.record(&catalog)?;
        catalog.set_collation(&self.name, collation)
    }

    /// Removes every row and resets the last indexed sequence.
    pub fn delete_index(&self) -> Result<()> {
        let mut catalog = self.shared.catalog.write();
        self.record(&catalog)?;
        catalog.delete_index(&self.name)
    }

    /// Deletes the view's rows and record.
    pub fn delete(&self) -> Result<()> {
        let mut catalog = self.shared.catalog.write();
        self.record(&catalog)?;
        catalog.delete_view(&self.name)?;
        self.shared.definitions.write().remove(&self.name);
        tracing::debug!(view = self.name.as_str(), "view deleted");
        Ok(())
    }

    /// Recomputes `total_rows` from the stored rows.
    pub fn recount_total_rows(&self) -> Result<usize> {
        let mut catalog = self.shared.catalog.write();
        self.record(&catalog)?;
        catalog.recount_total_rows(&self.name)
    }

    /// Every row of the view in key order.
    pub fn dump(&self) -> Result<Vec<DumpRow>> {
        let catalog = self.shared.catalog.read();
        self.record(&catalog)?;
        catalog.dump(&self.name)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("definition", &self.definition)
            .finish()
    }
}
