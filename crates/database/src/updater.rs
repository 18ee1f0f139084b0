//! Incremental index maintenance.
//!
//! An index pass brings one view up to the revision log's current maximum
//! sequence. The pass runs in a single catalog transaction: rows of
//! superseded revisions are pruned, the winning revision of every document
//! changed since the last pass is mapped, and the view record is advanced.
//! Any error rolls the whole pass back.

use crate::config::DatabaseConfig;
use crate::map::{Emitter, MapFunction};
use docview_core::{Error, Result, Revision, RevisionId, Sequence};
use docview_index::KeyCodec;
use docview_storage::{IndexEntry, RevisionLog, Transaction, ViewCatalog, ViewRecord};

/// Lifecycle of an `IndexUpdater`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdaterState {
    Idle,
    Indexing,
    Committed,
    Aborted,
}

/// Outcome of a successful index pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The view already covered every sequence in the log.
    NotModified,
    Updated {
        last_sequence: Sequence,
        rows_emitted: usize,
        rows_removed: usize,
    },
}

impl UpdateStatus {
    pub fn is_modified(&self) -> bool {
        !matches!(self, UpdateStatus::NotModified)
    }
}

/// Runs one index pass for one view.
pub struct IndexUpdater<'a> {
    view: &'a str,
    map: Option<&'a dyn MapFunction>,
    log: &'a dyn RevisionLog,
    config: &'a DatabaseConfig,
    state: UpdaterState,
}

/// The revision whose rows a document contributes in this pass.
struct Winner {
    rev_id: RevisionId,
    sequence: Sequence,
    deleted: bool,
}

#[derive(Debug, Default)]
struct PassCounters {
    docs_mapped: usize,
    conflicts_skipped: usize,
    retargeted: usize,
}

impl<'a> IndexUpdater<'a> {
    pub fn new(
        view: &'a str,
        map: Option<&'a dyn MapFunction>,
        log: &'a dyn RevisionLog,
        config: &'a DatabaseConfig,
    ) -> Self {
        Self {
            view,
            map,
            log,
            config,
            state: UpdaterState::Idle,
        }
    }

    pub fn state(&self) -> UpdaterState {
        self.state
    }

    /// Brings the view current. The caller must hold the catalog
    /// exclusively for the duration of the call.
    pub fn run(&mut self, catalog: &mut ViewCatalog) -> Result<UpdateStatus> {
        if self.state != UpdaterState::Idle {
            return Err(Error::storage("index updater already ran"));
        }
        let record = catalog.require(self.view)?.clone();
        let map = self.map.ok_or_else(|| Error::map_undefined(self.view))?;
        let last = record.indexed_through()?;
        let max = self.log.max_sequence()?;
        if last > max {
            return Err(Error::corrupt_state(
                self.view,
                format!("last sequence {} is beyond the log maximum {}", last, max),
            ));
        }

        tracing::debug!(view = self.view, last_sequence = last, max_sequence = max, "index pass");
        if last == max {
            return Ok(UpdateStatus::NotModified);
        }

        self.state = UpdaterState::Indexing;
        let mut tx = Transaction::begin();
        let mut counters = PassCounters::default();
        match self.index_pass(catalog, &mut tx, &record, map, last, max, &mut counters) {
            Ok(()) => {
                let diff = tx.diff(record.id);
                tx.commit()?;
                self.state = UpdaterState::Committed;
                tracing::info!(
                    view = self.view,
                    last_sequence = max,
                    docs_mapped = counters.docs_mapped,
                    rows_emitted = diff.inserted,
                    rows_pruned = diff.removed,
                    conflicts_skipped = counters.conflicts_skipped,
                    retargeted = counters.retargeted,
                    "index pass committed"
                );
                Ok(UpdateStatus::Updated {
                    last_sequence: max,
                    rows_emitted: diff.inserted,
                    rows_removed: diff.removed,
                })
            }
            Err(err) => {
                self.state = UpdaterState::Aborted;
                tracing::warn!(view = self.view, error = %err, "index pass aborted");
                tx.rollback(catalog)?;
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn index_pass(
        &self,
        catalog: &mut ViewCatalog,
        tx: &mut Transaction,
        record: &ViewRecord,
        map: &dyn MapFunction,
        last: Sequence,
        max: Sequence,
        counters: &mut PassCounters,
    ) -> Result<()> {
        let view = record.id;
        let codec = KeyCodec::new(record.collation);

        if last == 0 {
            tx.clear_index(catalog, view)?;
        } else {
            let superseded = self.log.parent_sequences_since(last)?;
            tx.delete_sequences(catalog, view, superseded)?;
        }

        let revisions = self.log.revisions_since(last, last > 0)?;
        let mut previous_doc: Option<&str> = None;
        for rev in &revisions {
            // Later rows for the same document are losing conflicts.
            if previous_doc == Some(rev.doc_id.as_str()) {
                counters.conflicts_skipped += 1;
                continue;
            }
            previous_doc = Some(rev.doc_id.as_str());
            if rev.doc_id.starts_with(self.config.design_prefix.as_str()) {
                continue;
            }

            let winner = self.resolve_winner(catalog, tx, view, rev, last, counters)?;
            if winner.deleted {
                continue;
            }
            let Some(body) = self.log.fetch_body(winner.sequence)? else {
                tracing::trace!(view = self.view, sequence = winner.sequence, "revision body missing");
                continue;
            };

            let mut emitter = Emitter::new(winner.sequence);
            map.map(&body, &mut emitter);
            counters.docs_mapped += 1;
            for (ordinal, (key, value)) in emitter.into_rows().into_iter().enumerate() {
                let ordinal = u32::try_from(ordinal)
                    .map_err(|_| Error::storage("too many rows emitted for one revision"))?;
                let encoded = codec.encode(&key)?;
                let entry = IndexEntry::new(encoded, rev.doc_id.as_str(), winner.sequence, ordinal, value);
                tx.insert(catalog, view, entry)?;
            }
            tracing::trace!(
                view = self.view,
                doc_id = rev.doc_id.as_str(),
                rev_id = winner.rev_id.as_str(),
                sequence = winner.sequence,
                "mapped revision"
            );
        }

        let mut updated = record.clone();
        updated.last_sequence = i64::try_from(max).map_err(|_| {
            Error::corrupt_state(self.view, format!("sequence {} does not fit the view record", max))
        })?;
        updated.total_rows = catalog.count_rows(view);
        let diff = tx.diff(view);
        if diff.inserted > 0 || diff.removed > 0 {
            updated.last_sequence_changed_at = max;
        }
        tx.put_record(catalog, updated)
    }

    /// Picks the revision a document contributes. A prior current revision
    /// at or below `last` has its rows dropped, and stays the winner when
    /// the scanned revision is a tombstone or sorts below it.
    fn resolve_winner(
        &self,
        catalog: &mut ViewCatalog,
        tx: &mut Transaction,
        view: docview_storage::ViewId,
        rev: &Revision,
        last: Sequence,
        counters: &mut PassCounters,
    ) -> Result<Winner> {
        let mut winner = Winner {
            rev_id: rev.rev_id.clone(),
            sequence: rev.sequence,
            deleted: rev.deleted,
        };
        if last == 0 {
            return Ok(winner);
        }
        if let Some((prior_rev, prior_seq)) = self.log.latest_non_deleted_current(&rev.doc_id, last)? {
            tx.delete_sequence(catalog, view, prior_seq)?;
            if rev.deleted || prior_rev > rev.rev_id {
                counters.retargeted += 1;
                winner = Winner {
                    rev_id: prior_rev,
                    sequence: prior_seq,
                    deleted: false,
                };
            }
        }
        Ok(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docview_core::{ErrorKind, Properties, Value};
    use docview_storage::{properties, MemoryRevisionLog};

    fn by_n(doc: &Properties, emit: &mut Emitter) {
        if let Some(n) = doc.get("n") {
            emit.emit(n.clone(), Value::Null);
        }
    }

    fn run(catalog: &mut ViewCatalog, log: &MemoryRevisionLog) -> Result<UpdateStatus> {
        let config = DatabaseConfig::default();
        let map: &dyn MapFunction = &by_n;
        IndexUpdater::new("v", Some(map), log, &config).run(catalog)
    }

    fn catalog() -> ViewCatalog {
        let mut catalog = ViewCatalog::new();
        catalog.set_version("v", "1").unwrap();
        catalog
    }

    #[test]
    fn test_state_transitions() {
        let mut catalog = catalog();
        let log = MemoryRevisionLog::new();
        log.put("a", "1-a", properties([("n", 1)]));
        let config = DatabaseConfig::default();
        let map: &dyn MapFunction = &by_n;
        let mut updater = IndexUpdater::new("v", Some(map), &log, &config);
        assert_eq!(updater.state(), UpdaterState::Idle);
        let status = updater.run(&mut catalog).unwrap();
        assert_eq!(updater.state(), UpdaterState::Committed);
        assert_eq!(
            status,
            UpdateStatus::Updated { last_sequence: 1, rows_emitted: 1, rows_removed: 0 }
        );
        assert_eq!(updater.run(&mut catalog).unwrap_err().kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_not_modified() {
        let mut catalog = catalog();
        let log = MemoryRevisionLog::new();
        assert_eq!(run(&mut catalog, &log).unwrap(), UpdateStatus::NotModified);
        assert!(!UpdateStatus::NotModified.is_modified());
    }

    #[test]
    fn test_errors_before_indexing() {
        let mut catalog = catalog();
        let log = MemoryRevisionLog::new();
        let config = DatabaseConfig::default();

        let err = IndexUpdater::new("v", None, &log, &config).run(&mut catalog).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MapUndefined);

        let map: &dyn MapFunction = &by_n;
        let err = IndexUpdater::new("nope", Some(map), &log, &config)
            .run(&mut catalog)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_encoding_failure_aborts() {
        let mut catalog = catalog();
        let log = MemoryRevisionLog::new();
        log.put("a", "1-a", properties([("n", 1.0)]));
        log.put("b", "1-b", properties([("n", f64::NAN)]));
        let config = DatabaseConfig::default();
        let map: &dyn MapFunction = &by_n;
        let mut updater = IndexUpdater::new("v", Some(map), &log, &config);
        let err = updater.run(&mut catalog).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(updater.state(), UpdaterState::Aborted);

        let record = catalog.require("v").unwrap();
        assert_eq!(record.last_sequence, 0);
        assert_eq!(catalog.count_rows(record.id), 0);
    }
}
