//! Database - entry point for defining and opening views.
//!
//! A `Database` owns the view catalog of one revision log. The catalog sits
//! behind a single `RwLock`: index passes take it exclusively, queries
//! share it and only ever see committed state.

use crate::config::DatabaseConfig;
use crate::map::ViewDefinition;
use crate::view::View;
use docview_core::Result;
use docview_storage::{RevisionLog, ViewCatalog};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// State shared between a database and its view handles.
pub(crate) struct Shared {
    pub(crate) catalog: RwLock<ViewCatalog>,
    pub(crate) definitions: RwLock<HashMap<String, ViewDefinition>>,
    pub(crate) log: Arc<dyn RevisionLog>,
    pub(crate) config: DatabaseConfig,
}

/// Materialized views over a document-revision log.
///
/// ```rust
/// use std::sync::Arc;
/// use docview_core::{Properties, Value};
/// use docview_database::{Database, DatabaseConfig, Emitter, ViewDefinition};
/// use docview_query::QueryOptions;
/// use docview_storage::{properties, MemoryRevisionLog};
///
/// let log = Arc::new(MemoryRevisionLog::new());
/// log.put("alice", "1-a", properties([("age", 31)]));
/// log.put("bob", "1-b", properties([("age", 27)]));
///
/// let db = Database::new(log, DatabaseConfig::default());
/// let by_age = db
///     .define_view("by_age", "1", ViewDefinition::new(|doc: &Properties, emit: &mut Emitter| {
///         if let Some(age) = doc.get("age") {
///             emit.emit(age.clone(), Value::Null);
///         }
///     }))
///     .unwrap();
/// by_age.update_index().unwrap();
///
/// let rows = by_age.query(&QueryOptions::new().start_key(30)).unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].doc_id.as_deref(), Some("alice"));
/// ```
#[derive(Clone)]
pub struct Database {
    shared: Arc<Shared>,
}

impl Database {
    pub fn new(log: Arc<dyn RevisionLog>, config: DatabaseConfig) -> Self {
        let catalog = ViewCatalog::new().with_max_rows_per_view(config.max_rows_per_view);
        Self {
            shared: Arc::new(Shared {
                catalog: RwLock::new(catalog),
                definitions: RwLock::new(HashMap::new()),
                log,
                config,
            }),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.shared.config
    }

    pub fn log(&self) -> &Arc<dyn RevisionLog> {
        &self.shared.log
    }

    /// Creates the view, or updates its delegates. A version different from
    /// the stored one empties the index so the next update rebuilds it.
    pub fn define_view(&self, name: &str, version: &str, definition: ViewDefinition) -> Result<View> {
        let changed = self.shared.catalog.write().set_version(name, version)?;
        if changed {
            tracing::debug!(view = name, version, "view version set");
        }
        self.shared
            .definitions
            .write()
            .insert(name.to_string(), definition);
        self.view(name)
    }

    /// Opens an existing view.
    pub fn view(&self, name: &str) -> Result<View> {
        let id = self.shared.catalog.read().require(name)?.id;
        let definition = self
            .shared
            .definitions
            .read()
            .get(name)
            .cloned()
            .unwrap_or_default();
        Ok(View::new(self.shared.clone(), name, id, definition))
    }

    pub fn view_names(&self) -> Vec<String> {
        self.shared
            .catalog
            .read()
            .view_names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn view_count(&self) -> usize {
        self.shared.catalog.read().view_count()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("views", &self.view_names())
            .field("config", &self.shared.config)
            .finish()
    }
}
