//! docview Storage - Storage layer for docview views.
//!
//! This crate provides the storage collaborators of index maintenance:
//!
//! - `RevisionLog` / `MemoryRevisionLog`: Read access to the document-revision log
//! - `ViewIndex`: Ordered index entries of one view, with sequence-keyed pruning
//! - `ViewCatalog`: View records (version, last sequence, row count, collation)
//! - `Journal`: Change tracking for transactions
//! - `Transaction`: Atomic catalog changes with rollback support
//!
//! # Example
//!
//! ```rust
//! use docview_core::{Collation, Value};
//! use docview_index::KeyCodec;
//! use docview_storage::{IndexEntry, Transaction, ViewCatalog};
//!
//! let mut catalog = ViewCatalog::new();
//! catalog.set_version("by_name", "1").unwrap();
//! let view = catalog.require("by_name").unwrap().id;
//!
//! let key = KeyCodec::new(Collation::Unicode).encode(&Value::from("alice")).unwrap();
//! let mut tx = Transaction::begin();
//! tx.insert(&mut catalog, view, IndexEntry::new(key, "doc-1", 1, 0, Value::Null)).unwrap();
//! tx.commit().unwrap();
//!
//! assert_eq!(catalog.count_rows(view), 1);
//! ```

pub mod catalog;
pub mod index_store;
pub mod journal;
pub mod revision_log;
pub mod transaction;

pub use catalog::{DumpRow, ViewCatalog, ViewId, ViewRecord};
pub use index_store::{EntryPosition, IndexEntry, ScanRequest, ViewIndex};
pub use journal::{Journal, JournalEntry, ViewDiff};
pub use revision_log::{properties, MemoryRevisionLog, RevisionLog};
pub use transaction::{Transaction, TransactionId, TransactionState};
