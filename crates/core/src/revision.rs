//! Document revisions as seen by the index maintainer.

use crate::value::Object;
use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;

/// Monotonic, unique position of a revision in the source log.
pub type Sequence = u64;

/// Document properties handed to map functions.
pub type Properties = Object;

/// Ids with this prefix are design documents and never indexed.
pub const DESIGN_DOC_PREFIX: &str = "_design/";

/// A revision identifier of the form `<generation>-<digest>`.
///
/// Ordering is total: generation first, then the digest compared byte-wise.
/// Ids that do not parse sort before all well-formed ids and compare as raw
/// strings among themselves.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the id into (generation, digest) if it is well formed.
    pub fn parts(&self) -> Option<(u64, &str)> {
        let (gen, digest) = self.0.split_once('-')?;
        if gen.is_empty() || digest.is_empty() {
            return None;
        }
        let generation = gen.parse::<u64>().ok()?;
        if generation == 0 {
            return None;
        }
        Some((generation, digest))
    }

    /// The generation number, or 0 for malformed ids.
    pub fn generation(&self) -> u64 {
        self.parts().map(|(g, _)| g).unwrap_or(0)
    }
}

impl Ord for RevisionId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.parts(), other.parts()) {
            (Some((g1, d1)), Some((g2, d2))) => g1.cmp(&g2).then_with(|| d1.cmp(d2)),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for RevisionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Metadata of one revision in the source log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Revision {
    pub doc_id: String,
    pub rev_id: RevisionId,
    pub sequence: Sequence,
    /// Sequence of the parent revision, 0 for a first revision.
    pub parent_sequence: Sequence,
    /// Winner-at-time-of-write flag.
    pub current: bool,
    pub deleted: bool,
}
