//! Collation modes for view keys.

/// Key-ordering discipline used both to build a view's index and to bound
/// queries against it.
///
/// All modes order values by type first: null, false, true, numbers,
/// strings, arrays, objects. They differ in how strings (and, for `Raw`,
/// everything else) compare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Collation {
    /// Case-insensitive first, lowercase before uppercase on ties.
    #[default]
    Unicode,
    /// Byte-wise, case-sensitive string comparison.
    Ascii,
    /// Literal comparison of the canonical JSON text, no type ranking.
    Raw,
}

impl Collation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collation::Unicode => "unicode",
            Collation::Ascii => "ascii",
            Collation::Raw => "raw",
        }
    }

    /// Parses a collation name as stored in view metadata.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "unicode" => Some(Collation::Unicode),
            "ascii" => Some(Collation::Ascii),
            "raw" => Some(Collation::Raw),
            _ => None,
        }
    }
}
