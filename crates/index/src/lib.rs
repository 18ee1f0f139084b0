//! docview Index - Key ordering for docview views.
//!
//! This crate provides the pieces that define where an emitted row lives in
//! a view's index:
//!
//! - `CollationComparator`: Semantic ordering of keys under a `Collation`
//! - `KeyCodec` / `EncodedKey`: Order-preserving, self-delimiting byte encoding
//! - `KeyRange` / `KeyBound`: Compound `(key, doc_id)` scan bounds
//! - `key_for_prefix_match`: Upper bounds for prefix matching on list keys
//!
//! # Example
//!
//! ```rust
//! use docview_core::{Collation, Value};
//! use docview_index::{KeyBound, KeyCodec, KeyRange};
//!
//! let codec = KeyCodec::new(Collation::Unicode);
//! let two = codec.encode(&Value::from(2)).unwrap();
//! let four = codec.encode(&Value::from(4)).unwrap();
//! assert!(two < four);
//!
//! let range = KeyRange::new(Some(KeyBound::inclusive(two.clone())), Some(KeyBound::inclusive(four)));
//! assert!(range.contains(&two, "doc-1"));
//! assert_eq!(codec.decode(&two).unwrap(), Value::from(2));
//! ```

#![no_std]

extern crate alloc;

pub mod codec;
pub mod comparator;
pub mod prefix;
pub mod range;

pub use codec::{EncodedKey, KeyCodec};
pub use comparator::{CollationComparator, Comparator, Order};
pub use prefix::key_for_prefix_match;
pub use range::{KeyBound, KeyRange};
