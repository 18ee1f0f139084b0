//! Compound key ranges for view scans.
//!
//! Index rows are ordered by `(key, doc_id)`. A bound pins the key and may
//! additionally pin a document id, which only narrows the range when the
//! bound is inclusive.

use crate::codec::EncodedKey;
use alloc::string::String;

/// One end of a scan range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBound {
    pub key: EncodedKey,
    pub inclusive: bool,
    /// Secondary bound on the document id, honored only when inclusive.
    pub doc_id: Option<String>,
}

impl KeyBound {
    pub fn inclusive(key: EncodedKey) -> Self {
        Self {
            key,
            inclusive: true,
            doc_id: None,
        }
    }

    pub fn exclusive(key: EncodedKey) -> Self {
        Self {
            key,
            inclusive: false,
            doc_id: None,
        }
    }

    /// Attaches a document id bound.
    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }

    fn effective_doc_id(&self) -> Option<&str> {
        if self.inclusive {
            self.doc_id.as_deref()
        } else {
            None
        }
    }
}

/// A range over `(key, doc_id)` with optional lower and upper bounds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyRange {
    pub lower: Option<KeyBound>,
    pub upper: Option<KeyBound>,
}

impl KeyRange {
    /// Creates a range covering all keys.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(lower: Option<KeyBound>, upper: Option<KeyBound>) -> Self {
        Self { lower, upper }
    }

    /// Returns true if no bound is set.
    pub fn is_all(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// Returns true if the row at `(key, doc_id)` satisfies the lower bound.
    pub fn above_lower(&self, key: &EncodedKey, doc_id: &str) -> bool {
        let Some(bound) = &self.lower else {
            return true;
        };
        if bound.inclusive {
            if key < &bound.key {
                return false;
            }
        } else if key <= &bound.key {
            return false;
        }
        match bound.effective_doc_id() {
            Some(min_doc) => key > &bound.key || doc_id >= min_doc,
            None => true,
        }
    }

    /// Returns true if the row at `(key, doc_id)` satisfies the upper bound.
    pub fn below_upper(&self, key: &EncodedKey, doc_id: &str) -> bool {
        let Some(bound) = &self.upper else {
            return true;
        };
        if bound.inclusive {
            if key > &bound.key {
                return false;
            }
        } else if key >= &bound.key {
            return false;
        }
        match bound.effective_doc_id() {
            Some(max_doc) => key < &bound.key || doc_id <= max_doc,
            None => true,
        }
    }

    /// Returns true if the row at `(key, doc_id)` is inside the range.
    pub fn contains(&self, key: &EncodedKey, doc_id: &str) -> bool {
        self.above_lower(key, doc_id) && self.below_upper(key, doc_id)
    }

    /// Returns true if no row can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lo), Some(hi)) => {
                if lo.key != hi.key {
                    return lo.key > hi.key;
                }
                if !(lo.inclusive && hi.inclusive) {
                    return true;
                }
                matches!(
                    (lo.effective_doc_id(), hi.effective_doc_id()),
                    (Some(min), Some(max)) if min > max
                )
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn k(b: u8) -> EncodedKey {
        EncodedKey::from_bytes(vec![b])
    }

    #[test]
    fn test_all_contains_everything() {
        let range = KeyRange::all();
        assert!(range.is_all());
        assert!(range.contains(&k(0), ""));
        assert!(!range.is_empty());
    }

    #[test]
    fn test_inclusive_and_exclusive_bounds() {
        let range = KeyRange::new(Some(KeyBound::inclusive(k(2))), Some(KeyBound::exclusive(k(4))));
        assert!(!range.contains(&k(1), "a"));
        assert!(range.contains(&k(2), "a"));
        assert!(range.contains(&k(3), "a"));
        assert!(!range.contains(&k(4), "a"));
    }

    #[test]
    fn test_doc_id_narrows_inclusive_bounds() {
        let range = KeyRange::new(
            Some(KeyBound::inclusive(k(2)).with_doc_id("m")),
            Some(KeyBound::inclusive(k(4)).with_doc_id("c")),
        );
        assert!(!range.contains(&k(2), "a"));
        assert!(range.contains(&k(2), "m"));
        assert!(range.contains(&k(3), "a"));
        assert!(range.contains(&k(4), "c"));
        assert!(!range.contains(&k(4), "d"));
    }

    #[test]
    fn test_doc_id_ignored_on_exclusive_bound() {
        let range = KeyRange::new(None, Some(KeyBound::exclusive(k(4)).with_doc_id("z")));
        assert!(!range.contains(&k(4), "a"));
        assert!(range.contains(&k(3), "zz"));
    }

    #[test]
    fn test_empty_ranges() {
        let inverted = KeyRange::new(Some(KeyBound::inclusive(k(5))), Some(KeyBound::inclusive(k(1))));
        assert!(inverted.is_empty());
        let point = KeyRange::new(Some(KeyBound::inclusive(k(3))), Some(KeyBound::inclusive(k(3))));
        assert!(!point.is_empty());
        let open_point = KeyRange::new(Some(KeyBound::exclusive(k(3))), Some(KeyBound::inclusive(k(3))));
        assert!(open_point.is_empty());
    }
}
