//! docview Core - Core types shared by the docview view engine.
//!
//! This crate provides the foundational types for materialized map/reduce views
//! over a document-revision log:
//!
//! - `Value` / `Object`: Structured document values (null, bool, number, string, list, map)
//! - `Collation`: Key-ordering discipline of a view (Unicode, ASCII, Raw)
//! - `RevisionId`, `Revision`, `Sequence`: Revision metadata from the source log
//! - `Error`: Error taxonomy for index maintenance and querying
//!
//! # Example
//!
//! ```rust
//! use docview_core::{RevisionId, Value, Object};
//!
//! let mut doc = Object::new();
//! doc.insert("name", "Alice");
//! doc.insert("tags", vec![Value::from("a"), Value::from(1)]);
//! assert_eq!(doc.get("name"), Some(&Value::from("Alice")));
//!
//! assert!(RevisionId::new("2-a") > RevisionId::new("1-z"));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod revision;
mod types;
mod value;

pub use error::{Error, ErrorKind, Result};
pub use revision::{Properties, Revision, RevisionId, Sequence, DESIGN_DOC_PREFIX};
pub use types::Collation;
pub use value::{Object, Value};
