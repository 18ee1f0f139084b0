//! Journal for tracking changes to the view catalog.
//!
//! Every mutation made through a `Transaction` is recorded here before it
//! becomes visible to the caller, so that rollback can undo the pass in
//! reverse order.

use crate::catalog::{ViewCatalog, ViewId, ViewRecord};
use crate::index_store::{EntryPosition, IndexEntry, ViewIndex};
use docview_core::Result;
use std::collections::BTreeMap;

/// A single journal entry representing a change.
#[derive(Debug)]
pub enum JournalEntry {
    /// An index entry was inserted.
    Insert { view: ViewId, position: EntryPosition },
    /// An index entry was removed.
    Delete { view: ViewId, entry: IndexEntry },
    /// A view's whole index was swapped out (cleared, created or dropped).
    ReplaceIndex {
        view: ViewId,
        previous: Option<ViewIndex>,
    },
    /// A view record was written or removed.
    Record {
        name: String,
        previous: Option<ViewRecord>,
    },
}

impl JournalEntry {
    /// Returns the view this entry touches, if it is an index change.
    #[cfg(test)]
    pub(crate) fn view(&self) -> Option<ViewId> {
        match self {
            JournalEntry::Insert { view, .. }
            | JournalEntry::Delete { view, .. }
            | JournalEntry::ReplaceIndex { view, .. } => Some(*view),
            JournalEntry::Record { .. } => None,
        }
    }
}

/// Net row changes of one view within a journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewDiff {
    pub inserted: usize,
    pub removed: usize,
}

impl ViewDiff {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.removed == 0
    }
}

/// Journal for tracking changes within a transaction.
#[derive(Debug, Default)]
pub struct Journal {
    diffs: BTreeMap<ViewId, ViewDiff>,
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_insert(&mut self, view: ViewId, position: EntryPosition) {
        self.diffs.entry(view).or_default().inserted += 1;
        self.entries.push(JournalEntry::Insert { view, position });
    }

    pub fn record_delete(&mut self, view: ViewId, entry: IndexEntry) {
        self.diffs.entry(view).or_default().removed += 1;
        self.entries.push(JournalEntry::Delete { view, entry });
    }

    pub fn record_replace(&mut self, view: ViewId, previous: Option<ViewIndex>) {
        let removed = previous.as_ref().map_or(0, ViewIndex::len);
        self.diffs.entry(view).or_default().removed += removed;
        self.entries.push(JournalEntry::ReplaceIndex { view, previous });
    }

    pub fn record_metadata(&mut self, name: &str, previous: Option<ViewRecord>) {
        self.entries.push(JournalEntry::Record {
            name: name.into(),
            previous,
        });
    }

    pub fn get_entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Returns the row changes recorded for `view`.
    pub fn diff(&self, view: ViewId) -> ViewDiff {
        self.diffs.get(&view).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finalizes the journal. Changes are already applied to the catalog.
    pub fn commit(&mut self) -> BTreeMap<ViewId, ViewDiff> {
        self.entries.clear();
        std::mem::take(&mut self.diffs)
    }

    /// Undoes every recorded change, newest first.
    pub fn rollback(&mut self, catalog: &mut ViewCatalog) -> Result<()> {
        while let Some(entry) = self.entries.pop() {
            match entry {
                JournalEntry::Insert { view, position } => {
                    if let Some(index) = catalog.index_mut(view) {
                        index.remove(&position);
                    }
                }
                JournalEntry::Delete { view, entry } => {
                    if let Some(index) = catalog.index_mut(view) {
                        index.insert_unchecked(entry);
                    }
                }
                JournalEntry::ReplaceIndex { view, previous } => {
                    catalog.restore_index(view, previous);
                }
                JournalEntry::Record { name, previous } => {
                    catalog.restore_record(&name, previous);
                }
            }
        }
        self.diffs.clear();
        Ok(())
    }

    /// Clears the journal without applying changes.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.diffs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docview_core::{Collation, Value};
    use docview_index::KeyCodec;

    fn entry(i: i64, seq: u64) -> IndexEntry {
        let key = KeyCodec::new(Collation::Unicode).encode(&Value::from(i)).unwrap();
        IndexEntry::new(key, "doc", seq, 0, Value::Null)
    }

    #[test]
    fn test_diff_counts() {
        let mut journal = Journal::new();
        journal.record_insert(1, entry(1, 1).position);
        journal.record_insert(1, entry(2, 1).position);
        journal.record_delete(1, entry(3, 2));
        journal.record_delete(2, entry(3, 2));

        assert_eq!(journal.diff(1), ViewDiff { inserted: 2, removed: 1 });
        assert_eq!(journal.diff(2), ViewDiff { inserted: 0, removed: 1 });
        assert!(journal.diff(3).is_empty());
        assert_eq!(journal.get_entries().len(), 4);
        assert_eq!(journal.get_entries()[3].view(), Some(2));
    }

    #[test]
    fn test_commit_drains() {
        let mut journal = Journal::new();
        journal.record_insert(1, entry(1, 1).position);
        let diffs = journal.commit();
        assert_eq!(diffs.get(&1).map(|d| d.inserted), Some(1));
        assert!(journal.is_empty());
    }

    #[test]
    fn test_rollback_restores_catalog() {
        let mut catalog = ViewCatalog::new();
        catalog.set_version("v", "1").unwrap();
        let id = catalog.record("v").unwrap().id;
        catalog.index_mut(id).unwrap().insert(entry(1, 1)).unwrap();

        let mut journal = Journal::new();
        let removed = catalog.index_mut(id).unwrap().remove_sequence(1);
        for e in removed {
            journal.record_delete(id, e);
        }
        let inserted = entry(2, 2);
        catalog.index_mut(id).unwrap().insert(inserted.clone()).unwrap();
        journal.record_insert(id, inserted.position);

        journal.rollback(&mut catalog).unwrap();
        let index = catalog.index(id).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.has_sequence(1));
        assert!(!index.has_sequence(2));
    }
}
