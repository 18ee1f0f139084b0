//! The view catalog: persisted view records plus their indexes.
//!
//! `ViewCatalog` plays the role of the metadata store. Each view has one
//! `ViewRecord` (keyed by name) and one `ViewIndex` (keyed by id). All
//! lifecycle operations run inside a `Transaction` and are atomic.

use crate::index_store::ViewIndex;
use crate::transaction::Transaction;
use docview_core::{Collation, Error, Result, Sequence, Value};
use docview_index::KeyCodec;
use hashbrown::HashMap;
use std::collections::BTreeMap;

/// Internal id of a view, stable for the life of its record.
pub type ViewId = u32;

/// Persisted per-view metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewRecord {
    pub id: ViewId,
    pub name: String,
    pub version: String,
    /// Last sequence folded into the index. Signed as persisted; negative
    /// values mark a corrupt record.
    pub last_sequence: i64,
    /// Last sequence whose index pass inserted or removed rows.
    pub last_sequence_changed_at: Sequence,
    pub total_rows: usize,
    pub collation: Collation,
}

impl ViewRecord {
    pub fn new(id: ViewId, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            version: version.into(),
            last_sequence: 0,
            last_sequence_changed_at: 0,
            total_rows: 0,
            collation: Collation::default(),
        }
    }

    /// The last indexed sequence, or `CorruptState` if the record is invalid.
    pub fn indexed_through(&self) -> Result<Sequence> {
        Sequence::try_from(self.last_sequence).map_err(|_| {
            Error::corrupt_state(
                self.name.as_str(),
                format!("negative last sequence {}", self.last_sequence),
            )
        })
    }

    /// Marks the index as empty and never built.
    fn reset(&mut self) {
        self.last_sequence = 0;
        self.last_sequence_changed_at = 0;
        self.total_rows = 0;
    }
}

/// One row of a `dump`.
#[derive(Clone, Debug, PartialEq)]
pub struct DumpRow {
    pub sequence: Sequence,
    pub key: Value,
    pub value: Value,
}

/// Catalog of view records and their indexes.
#[derive(Debug, Default)]
pub struct ViewCatalog {
    records: BTreeMap<String, ViewRecord>,
    indexes: HashMap<ViewId, ViewIndex>,
    next_id: ViewId,
    max_rows_per_view: Option<usize>,
}

impl ViewCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps every view's index at `max_rows` entries.
    pub fn with_max_rows_per_view(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows_per_view = max_rows;
        self
    }

    pub fn record(&self, name: &str) -> Option<&ViewRecord> {
        self.records.get(name)
    }

    /// Looks up a record, failing with `NotFound`.
    pub fn require(&self, name: &str) -> Result<&ViewRecord> {
        self.records.get(name).ok_or_else(|| Error::not_found(name))
    }

    pub fn view_names(&self) -> Vec<&str> {
        self.records.keys().map(String::as_str).collect()
    }

    pub fn view_count(&self) -> usize {
        self.records.len()
    }

    pub fn index(&self, view: ViewId) -> Option<&ViewIndex> {
        self.indexes.get(&view)
    }

    pub(crate) fn index_mut(&mut self, view: ViewId) -> Option<&mut ViewIndex> {
        self.indexes.get_mut(&view)
    }

    /// A fresh, empty index honoring the catalog's quota.
    pub(crate) fn new_index(&self) -> ViewIndex {
        ViewIndex::with_max_rows(self.max_rows_per_view)
    }

    /// Counts the rows currently stored for a view.
    pub fn count_rows(&self, view: ViewId) -> usize {
        self.indexes.get(&view).map_or(0, ViewIndex::len)
    }

    pub(crate) fn write_record(&mut self, record: ViewRecord) -> Option<ViewRecord> {
        self.records.insert(record.name.clone(), record)
    }

    pub(crate) fn take_record(&mut self, name: &str) -> Option<ViewRecord> {
        self.records.remove(name)
    }

    pub(crate) fn swap_index(&mut self, view: ViewId, index: Option<ViewIndex>) -> Option<ViewIndex> {
        match index {
            Some(index) => self.indexes.insert(view, index),
            None => self.indexes.remove(&view),
        }
    }

    pub(crate) fn restore_index(&mut self, view: ViewId, previous: Option<ViewIndex>) {
        self.swap_index(view, previous);
    }

    pub(crate) fn restore_record(&mut self, name: &str, previous: Option<ViewRecord>) {
        match previous {
            Some(record) => {
                self.records.insert(name.into(), record);
            }
            None => {
                self.records.remove(name);
            }
        }
    }

    /// Runs `f` in a transaction, committing on success and rolling back
    /// on error.
    pub fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self, &mut Transaction) -> Result<T>,
    ) -> Result<T> {
        let mut tx = Transaction::begin();
        match f(self, &mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                tx.rollback(self)?;
                Err(err)
            }
        }
    }

    /// Creates the view on first call. A different version resets the index
    /// so the next update rebuilds it. Returns false if nothing changed.
    pub fn set_version(&mut self, name: &str, version: &str) -> Result<bool> {
        self.atomically(|catalog, tx| match catalog.records.get(name).cloned() {
            None => {
                let id = catalog.next_id;
                catalog.next_id += 1;
                tx.put_record(catalog, ViewRecord::new(id, name, version))?;
                tx.create_index(catalog, id)?;
                Ok(true)
            }
            Some(record) if record.version == version => Ok(false),
            Some(mut record) => {
                record.version = version.into();
                record.reset();
                let id = record.id;
                tx.put_record(catalog, record)?;
                tx.clear_index(catalog, id)?;
                Ok(true)
            }
        })
    }

    /// Changes the collation of a view. Encoded keys depend on it, so a
    /// change empties the index and resets the view.
    pub fn set_collation(&mut self, name: &str, collation: Collation) -> Result<bool> {
        self.atomically(|catalog, tx| {
            let mut record = catalog.require(name)?.clone();
            if record.collation == collation {
                return Ok(false);
            }
            record.collation = collation;
            record.reset();
            let id = record.id;
            tx.put_record(catalog, record)?;
            tx.clear_index(catalog, id)?;
            Ok(true)
        })
    }

    /// Removes every index entry of the view and resets its last sequence.
    /// Unknown views are ignored.
    pub fn delete_index(&mut self, name: &str) -> Result<()> {
        self.atomically(|catalog, tx| {
            let Some(mut record) = catalog.records.get(name).cloned() else {
                return Ok(());
            };
            record.reset();
            let id = record.id;
            tx.put_record(catalog, record)?;
            tx.clear_index(catalog, id)?;
            Ok(())
        })
    }

    /// Deletes the view's index and its record.
    pub fn delete_view(&mut self, name: &str) -> Result<()> {
        self.atomically(|catalog, tx| {
            let id = catalog.require(name)?.id;
            tx.drop_index(catalog, id)?;
            tx.remove_record(catalog, name)?;
            Ok(())
        })
    }

    /// Recomputes `total_rows` from the stored entries.
    pub fn recount_total_rows(&mut self, name: &str) -> Result<usize> {
        let id = self.require(name)?.id;
        let total = self.count_rows(id);
        if let Some(record) = self.records.get_mut(name) {
            record.total_rows = total;
        }
        Ok(total)
    }

    /// Lists every entry of the view in key order, decoded.
    pub fn dump(&self, name: &str) -> Result<Vec<DumpRow>> {
        let record = self.require(name)?;
        let codec = KeyCodec::new(record.collation);
        let Some(index) = self.indexes.get(&record.id) else {
            return Ok(Vec::new());
        };
        index
            .iter()
            .map(|(position, value)| {
                Ok(DumpRow {
                    sequence: position.sequence,
                    key: codec.decode(&position.key)?,
                    value: value.clone(),
                })
            })
            .collect()
    }
}
