//! docview Database - Materialized map/reduce views over a revision log.
//!
//! This crate ties the view engine together:
//!
//! - `Database`: Owns the view catalog of one revision log
//! - `View`: Handle used to update and query one view
//! - `ViewDefinition`, `MapFunction`, `Emitter`: The map/reduce delegates
//! - `IndexUpdater`: The incremental index-maintenance pass
//! - `DatabaseConfig`: Settings shared by every view
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use docview_core::{Properties, Value};
//! use docview_database::{Database, DatabaseConfig, Emitter, UpdateStatus, ViewDefinition};
//! use docview_query::{Count, QueryOptions};
//! use docview_storage::{properties, MemoryRevisionLog};
//!
//! let log = Arc::new(MemoryRevisionLog::new());
//! log.put("p1", "1-a", properties([("type", "post")]));
//! log.put("p2", "1-b", properties([("type", "post")]));
//! log.put("c1", "1-c", properties([("type", "comment")]));
//!
//! let db = Database::new(log.clone(), DatabaseConfig::default());
//! let by_type = db
//!     .define_view(
//!         "by_type",
//!         "1",
//!         ViewDefinition::new(|doc: &Properties, emit: &mut Emitter| {
//!             if let Some(kind) = doc.get("type") {
//!                 emit.emit(kind.clone(), Value::Null);
//!             }
//!         })
//!         .with_reduce(Count),
//!     )
//!     .unwrap();
//!
//! assert!(by_type.update_index().unwrap().is_modified());
//! assert_eq!(by_type.update_index().unwrap(), UpdateStatus::NotModified);
//!
//! let rows = by_type.query(&QueryOptions::new().group(true)).unwrap();
//! assert_eq!(rows[0].key, Value::from("comment"));
//! assert_eq!(rows[1].value, Value::from(2));
//! ```

pub mod config;
pub mod database;
pub mod map;
pub mod updater;
pub mod view;

pub use config::DatabaseConfig;
pub use database::Database;
pub use map::{Emitter, MapFunction, ViewDefinition};
pub use updater::{IndexUpdater, UpdateStatus, UpdaterState};
pub use view::View;
