//! Transaction management for the view catalog.
//!
//! A transaction applies changes to the catalog immediately and journals
//! them; `rollback` undoes the journal. Exclusivity is the caller's job: the
//! database holds the catalog's write lock for the life of a transaction.

use crate::catalog::{ViewCatalog, ViewId, ViewRecord};
use crate::index_store::IndexEntry;
use crate::journal::{Journal, ViewDiff};
use core::sync::atomic::{AtomicU64, Ordering};
use docview_core::{Error, Result, Sequence};
use std::collections::BTreeMap;

/// Global transaction ID counter.
static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction ID type.
pub type TransactionId = u64;

/// Transaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// A catalog transaction.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    journal: Journal,
    state: TransactionState,
}

impl Transaction {
    /// Starts a new transaction.
    pub fn begin() -> Self {
        Self {
            id: NEXT_TX_ID.fetch_add(1, Ordering::SeqCst),
            journal: Journal::new(),
            state: TransactionState::Active,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::storage("transaction is not active"));
        }
        Ok(())
    }

    fn index_of<'c>(
        catalog: &'c mut ViewCatalog,
        view: ViewId,
    ) -> Result<&'c mut crate::index_store::ViewIndex> {
        catalog
            .index_mut(view)
            .ok_or_else(|| Error::storage(format!("no index for view id {}", view)))
    }

    /// Inserts an index entry.
    pub fn insert(&mut self, catalog: &mut ViewCatalog, view: ViewId, entry: IndexEntry) -> Result<()> {
        self.check_active()?;
        let position = entry.position.clone();
        Self::index_of(catalog, view)?.insert(entry)?;
        self.journal.record_insert(view, position);
        Ok(())
    }

    /// Deletes every entry produced by `sequence`. Returns how many were removed.
    pub fn delete_sequence(&mut self, catalog: &mut ViewCatalog, view: ViewId, sequence: Sequence) -> Result<usize> {
        self.check_active()?;
        let removed = Self::index_of(catalog, view)?.remove_sequence(sequence);
        let count = removed.len();
        for entry in removed {
            self.journal.record_delete(view, entry);
        }
        Ok(count)
    }

    /// Deletes the entries of every listed sequence.
    pub fn delete_sequences(
        &mut self,
        catalog: &mut ViewCatalog,
        view: ViewId,
        sequences: impl IntoIterator<Item = Sequence>,
    ) -> Result<usize> {
        let mut count = 0;
        for sequence in sequences {
            count += self.delete_sequence(catalog, view, sequence)?;
        }
        Ok(count)
    }

    /// Creates an empty index for a new view.
    pub fn create_index(&mut self, catalog: &mut ViewCatalog, view: ViewId) -> Result<()> {
        self.check_active()?;
        let fresh = catalog.new_index();
        let previous = catalog.swap_index(view, Some(fresh));
        self.journal.record_replace(view, previous);
        Ok(())
    }

    /// Removes all entries of a view. Returns how many were removed.
    pub fn clear_index(&mut self, catalog: &mut ViewCatalog, view: ViewId) -> Result<usize> {
        self.check_active()?;
        let fresh = Self::index_of(catalog, view)?.emptied();
        let previous = catalog.swap_index(view, Some(fresh));
        let count = previous.as_ref().map_or(0, |index| index.len());
        self.journal.record_replace(view, previous);
        Ok(count)
    }

    /// Removes a view's index altogether.
    pub fn drop_index(&mut self, catalog: &mut ViewCatalog, view: ViewId) -> Result<()> {
        self.check_active()?;
        let previous = catalog.swap_index(view, None);
        self.journal.record_replace(view, previous);
        Ok(())
    }

    /// Writes a view record, replacing any record with the same name.
    pub fn put_record(&mut self, catalog: &mut ViewCatalog, record: ViewRecord) -> Result<()> {
        self.check_active()?;
        let name = record.name.clone();
        let previous = catalog.write_record(record);
        self.journal.record_metadata(&name, previous);
        Ok(())
    }

    /// Removes a view record.
    pub fn remove_record(&mut self, catalog: &mut ViewCatalog, name: &str) -> Result<()> {
        self.check_active()?;
        let previous = catalog.take_record(name);
        self.journal.record_metadata(name, previous);
        Ok(())
    }

    /// Row changes made to `view` so far.
    pub fn diff(&self, view: ViewId) -> ViewDiff {
        self.journal.diff(view)
    }

    /// Commits the transaction, returning the per-view row changes.
    pub fn commit(mut self) -> Result<BTreeMap<ViewId, ViewDiff>> {
        self.check_active()?;
        self.state = TransactionState::Committed;
        Ok(self.journal.commit())
    }

    /// Rolls back the transaction.
    pub fn rollback(mut self, catalog: &mut ViewCatalog) -> Result<()> {
        self.check_active()?;
        self.state = TransactionState::RolledBack;
        self.journal.rollback(catalog)
    }

    #[cfg(test)]
    pub(crate) fn get_changes(&self) -> &[crate::journal::JournalEntry] {
        self.journal.get_entries()
    }
}
