//! Ordered storage of one view's index entries.
//!
//! Entries are kept in a `BTreeMap` ordered by `(key, doc_id, sequence,
//! ordinal)`, with a secondary map from source sequence to the entries it
//! produced so that superseded revisions can be pruned without a scan.

use docview_core::{Error, Result, Sequence, Value};
use docview_index::{EncodedKey, KeyRange, Order};
use hashbrown::HashMap;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Position of an entry in the index; also its identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryPosition {
    pub key: EncodedKey,
    pub doc_id: String,
    pub sequence: Sequence,
    /// Emission order within the sequence.
    pub ordinal: u32,
}

impl EntryPosition {
    /// The first position any entry with `key` can occupy.
    fn first_of(key: EncodedKey) -> Self {
        Self {
            key,
            doc_id: String::new(),
            sequence: 0,
            ordinal: 0,
        }
    }
}

/// A row emitted by a map function, tagged with its source revision.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry {
    pub position: EntryPosition,
    pub value: Value,
}

impl IndexEntry {
    pub fn new(
        key: EncodedKey,
        doc_id: impl Into<String>,
        sequence: Sequence,
        ordinal: u32,
        value: Value,
    ) -> Self {
        Self {
            position: EntryPosition {
                key,
                doc_id: doc_id.into(),
                sequence,
                ordinal,
            },
            value,
        }
    }

    pub fn key(&self) -> &EncodedKey {
        &self.position.key
    }

    pub fn sequence(&self) -> Sequence {
        self.position.sequence
    }
}

/// A bounded, ordered scan over an index.
#[derive(Clone, Debug, Default)]
pub struct ScanRequest {
    pub range: KeyRange,
    /// Restricts the scan to these keys; `range` is ignored when set.
    pub keys: Option<Vec<EncodedKey>>,
    pub order: Order,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl ScanRequest {
    pub fn new(range: KeyRange) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    pub fn with_keys(mut self, keys: Vec<EncodedKey>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

type Entries = BTreeMap<EntryPosition, Value>;

/// The index of a single view.
#[derive(Debug, Default)]
pub struct ViewIndex {
    entries: Entries,
    by_sequence: HashMap<Sequence, Vec<EntryPosition>>,
    max_rows: Option<usize>,
}

impl ViewIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index that refuses to grow beyond `max_rows` entries.
    pub fn with_max_rows(max_rows: Option<usize>) -> Self {
        Self {
            max_rows,
            ..Self::default()
        }
    }

    /// Returns an empty index with the same quota.
    pub fn emptied(&self) -> Self {
        Self::with_max_rows(self.max_rows)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry. Fails with a storage error when the quota is hit
    /// or the position is already occupied.
    pub fn insert(&mut self, entry: IndexEntry) -> Result<()> {
        if let Some(max) = self.max_rows {
            if self.entries.len() >= max {
                return Err(Error::storage(format!(
                    "index row quota of {} exceeded",
                    max
                )));
            }
        }
        if self.entries.contains_key(&entry.position) {
            return Err(Error::storage(format!(
                "duplicate index entry for sequence {}",
                entry.position.sequence
            )));
        }
        self.insert_unchecked(entry);
        Ok(())
    }

    /// Re-inserts an entry removed earlier in a rolled-back pass, bypassing
    /// the quota.
    pub(crate) fn insert_unchecked(&mut self, entry: IndexEntry) {
        self.by_sequence
            .entry(entry.position.sequence)
            .or_default()
            .push(entry.position.clone());
        self.entries.insert(entry.position, entry.value);
    }

    /// Removes the entry at `position`, returning it if present.
    pub fn remove(&mut self, position: &EntryPosition) -> Option<IndexEntry> {
        let value = self.entries.remove(position)?;
        if let Some(positions) = self.by_sequence.get_mut(&position.sequence) {
            positions.retain(|p| p != position);
            if positions.is_empty() {
                self.by_sequence.remove(&position.sequence);
            }
        }
        Some(IndexEntry {
            position: position.clone(),
            value,
        })
    }

    /// Removes every entry produced by `sequence`.
    pub fn remove_sequence(&mut self, sequence: Sequence) -> Vec<IndexEntry> {
        let Some(positions) = self.by_sequence.remove(&sequence) else {
            return Vec::new();
        };
        positions
            .into_iter()
            .filter_map(|position| {
                self.entries
                    .remove(&position)
                    .map(|value| IndexEntry { position, value })
            })
            .collect()
    }

    /// Returns true if any entry was produced by `sequence`.
    #[cfg(test)]
    pub(crate) fn has_sequence(&self, sequence: Sequence) -> bool {
        self.by_sequence.contains_key(&sequence)
    }

    /// Returns the sequences that currently have live entries, ascending.
    #[cfg(test)]
    pub(crate) fn sequences(&self) -> Vec<Sequence> {
        let mut seqs: Vec<_> = self.by_sequence.keys().copied().collect();
        seqs.sort_unstable();
        seqs
    }

    /// Iterates all entries in key order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&EntryPosition, &Value)> {
        self.entries.iter()
    }

    /// Runs a scan, applying bounds, direction, skip and limit.
    pub fn scan<'a>(
        &'a self,
        request: &'a ScanRequest,
    ) -> Box<dyn Iterator<Item = (&'a EntryPosition, &'a Value)> + 'a> {
        let rows: Box<dyn Iterator<Item = (&'a EntryPosition, &'a Value)> + 'a> = match &request.keys {
            Some(keys) => self.scan_keys(keys, request.order),
            None => self.scan_range(&request.range, request.order),
        };
        let rows = rows.skip(request.skip);
        match request.limit {
            Some(limit) => Box::new(rows.take(limit)),
            None => Box::new(rows),
        }
    }

    fn scan_range<'a>(
        &'a self,
        range: &'a KeyRange,
        order: Order,
    ) -> Box<dyn Iterator<Item = (&'a EntryPosition, &'a Value)> + 'a> {
        if range.is_empty() {
            return Box::new(std::iter::empty());
        }
        let lo = match &range.lower {
            Some(b) => Bound::Included(EntryPosition::first_of(b.key.clone())),
            None => Bound::Unbounded,
        };
        let hi = match &range.upper {
            Some(b) => Bound::Excluded(EntryPosition::first_of(b.key.successor())),
            None => Bound::Unbounded,
        };
        let window = self.entries.range((lo, hi));
        let in_range = move |(pos, _): &(&EntryPosition, &Value)| range.contains(&pos.key, &pos.doc_id);
        match order {
            Order::Asc => Box::new(window.filter(in_range)),
            Order::Desc => Box::new(window.rev().filter(in_range)),
        }
    }

    fn scan_keys<'a>(
        &'a self,
        keys: &[EncodedKey],
        order: Order,
    ) -> Box<dyn Iterator<Item = (&'a EntryPosition, &'a Value)> + 'a> {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();
        if order == Order::Desc {
            keys.reverse();
        }
        let entries = &self.entries;
        Box::new(keys.into_iter().flat_map(move |key| {
            let hi = EntryPosition::first_of(key.successor());
            let window = entries.range(EntryPosition::first_of(key)..hi);
            let rows: Box<dyn Iterator<Item = (&'a EntryPosition, &'a Value)> + 'a> = match order {
                Order::Asc => Box::new(window),
                Order::Desc => Box::new(window.rev()),
            };
            rows
        }))
    }
}
