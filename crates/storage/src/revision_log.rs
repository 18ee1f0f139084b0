//! The document-revision log consumed by index maintenance.
//!
//! `RevisionLog` is the read-only collaborator the index updater needs.
//! `MemoryRevisionLog` is an in-process implementation used by embedders
//! without their own document store, and by the tests.

use docview_core::{Object, Properties, Result, Revision, RevisionId, Sequence, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Read access to a document-revision log.
pub trait RevisionLog: Send + Sync {
    /// The highest sequence in the log, 0 if empty.
    fn max_sequence(&self) -> Result<Sequence>;

    /// Current revisions with sequence > `since`, ordered by doc id and then
    /// revision id descending. Deleted revisions are included only when
    /// `include_deleted` is set.
    fn revisions_since(&self, since: Sequence, include_deleted: bool) -> Result<Vec<Revision>>;

    /// Parent sequences, in `(0, since]`, of revisions added after `since`.
    fn parent_sequences_since(&self, since: Sequence) -> Result<Vec<Sequence>>;

    /// Properties of the revision at `sequence`, with `_id` and `_rev` set.
    fn fetch_body(&self, sequence: Sequence) -> Result<Option<Properties>>;

    /// The highest-id current, non-deleted revision of `doc_id` with
    /// sequence <= `max_sequence`.
    fn latest_non_deleted_current(
        &self,
        doc_id: &str,
        max_sequence: Sequence,
    ) -> Result<Option<(RevisionId, Sequence)>>;

    /// Properties of the winning revision of `doc_id`, if it exists and is
    /// not deleted.
    fn document(&self, doc_id: &str) -> Result<Option<Properties>>;
}

#[derive(Clone, Debug)]
struct StoredRevision {
    meta: Revision,
    body: Properties,
}

#[derive(Debug, Default)]
struct LogState {
    revisions: BTreeMap<Sequence, StoredRevision>,
    last_sequence: Sequence,
}

impl LogState {
    fn with_metadata(stored: &StoredRevision) -> Properties {
        let mut props = stored.body.clone();
        props.insert("_id", stored.meta.doc_id.as_str());
        props.insert("_rev", stored.meta.rev_id.as_str());
        if stored.meta.deleted {
            props.insert("_deleted", true);
        }
        props
    }

    fn winner_of(&self, doc_id: &str, max_sequence: Sequence) -> Option<&StoredRevision> {
        self.revisions
            .range(..=max_sequence)
            .map(|(_, rev)| rev)
            .filter(|rev| rev.meta.doc_id == doc_id && rev.meta.current && !rev.meta.deleted)
            .max_by(|a, b| a.meta.rev_id.cmp(&b.meta.rev_id))
    }
}

/// An in-memory revision log.
///
/// The `current` flag of a revision is set when it is written and is not
/// rewritten when children are added; `retire` clears it explicitly.
#[derive(Debug, Default)]
pub struct MemoryRevisionLog {
    state: RwLock<LogState>,
}

impl MemoryRevisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a current revision at the next sequence and returns it.
    pub fn append(
        &self,
        doc_id: &str,
        rev_id: &str,
        parent_sequence: Sequence,
        deleted: bool,
        body: Properties,
    ) -> Sequence {
        let mut state = self.state.write();
        state.last_sequence += 1;
        let sequence = state.last_sequence;
        state.revisions.insert(
            sequence,
            StoredRevision {
                meta: Revision {
                    doc_id: doc_id.into(),
                    rev_id: RevisionId::new(rev_id),
                    sequence,
                    parent_sequence,
                    current: true,
                    deleted,
                },
                body,
            },
        );
        sequence
    }

    /// Appends a new first revision of a document.
    pub fn put(&self, doc_id: &str, rev_id: &str, body: Properties) -> Sequence {
        self.append(doc_id, rev_id, 0, false, body)
    }

    /// Appends a tombstone child of `parent_sequence`.
    pub fn delete(&self, doc_id: &str, rev_id: &str, parent_sequence: Sequence) -> Sequence {
        self.append(doc_id, rev_id, parent_sequence, true, Object::new())
    }

    /// Inserts a fully specified revision, e.g. a replicated conflict.
    /// Sequences beyond the current maximum advance it.
    pub fn insert(&self, revision: Revision, body: Properties) {
        let mut state = self.state.write();
        state.last_sequence = state.last_sequence.max(revision.sequence);
        state.revisions.insert(
            revision.sequence,
            StoredRevision {
                meta: revision,
                body,
            },
        );
    }

    /// Clears the current flag of a revision. Returns false if unknown.
    pub fn retire(&self, sequence: Sequence) -> bool {
        let mut state = self.state.write();
        match state.revisions.get_mut(&sequence) {
            Some(stored) => {
                stored.meta.current = false;
                true
            }
            None => false,
        }
    }

    pub fn revision(&self, sequence: Sequence) -> Option<Revision> {
        self.state.read().revisions.get(&sequence).map(|r| r.meta.clone())
    }

    pub fn len(&self) -> usize {
        self.state.read().revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RevisionLog for MemoryRevisionLog {
    fn max_sequence(&self) -> Result<Sequence> {
        Ok(self.state.read().last_sequence)
    }

    fn revisions_since(&self, since: Sequence, include_deleted: bool) -> Result<Vec<Revision>> {
        let state = self.state.read();
        let mut revs: Vec<Revision> = state
            .revisions
            .range(since.saturating_add(1)..)
            .map(|(_, stored)| &stored.meta)
            .filter(|meta| meta.current && (include_deleted || !meta.deleted))
            .cloned()
            .collect();
        revs.sort_by(|a, b| {
            a.doc_id
                .cmp(&b.doc_id)
                .then_with(|| b.rev_id.cmp(&a.rev_id))
        });
        Ok(revs)
    }

    fn parent_sequences_since(&self, since: Sequence) -> Result<Vec<Sequence>> {
        let state = self.state.read();
        let mut parents: Vec<Sequence> = state
            .revisions
            .range(since.saturating_add(1)..)
            .map(|(_, stored)| stored.meta.parent_sequence)
            .filter(|parent| *parent > 0 && *parent <= since)
            .collect();
        parents.sort_unstable();
        parents.dedup();
        Ok(parents)
    }

    fn fetch_body(&self, sequence: Sequence) -> Result<Option<Properties>> {
        let state = self.state.read();
        Ok(state.revisions.get(&sequence).map(LogState::with_metadata))
    }

    fn latest_non_deleted_current(
        &self,
        doc_id: &str,
        max_sequence: Sequence,
    ) -> Result<Option<(RevisionId, Sequence)>> {
        let state = self.state.read();
        Ok(state
            .winner_of(doc_id, max_sequence)
            .map(|rev| (rev.meta.rev_id.clone(), rev.meta.sequence)))
    }

    fn document(&self, doc_id: &str) -> Result<Option<Properties>> {
        let state = self.state.read();
        Ok(state
            .winner_of(doc_id, Sequence::MAX)
            .map(LogState::with_metadata))
    }
}

/// Builds document properties from `(name, value)` pairs.
pub fn properties<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Properties
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().collect()
}
