//! Query options.

use crate::row::QueryRow;
use docview_core::{Error, Result, Value};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied predicate applied to assembled rows.
pub type PostFilter = Arc<dyn Fn(&QueryRow) -> bool + Send + Sync>;

/// Options of a view query, built with chained setters.
///
/// ```rust
/// use docview_core::Value;
/// use docview_query::QueryOptions;
///
/// let options = QueryOptions::new()
///     .start_key(Value::from(2))
///     .end_key(Value::from(5))
///     .inclusive_end(false)
///     .limit(10);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct QueryOptions {
    pub start_key: Option<Value>,
    pub end_key: Option<Value>,
    pub inclusive_start: bool,
    pub inclusive_end: bool,
    pub start_key_doc_id: Option<String>,
    pub end_key_doc_id: Option<String>,
    pub keys: Option<Vec<Value>>,
    pub descending: bool,
    pub group: bool,
    pub group_level: u32,
    /// `None` means "not specified": reduce only when grouping.
    pub reduce: Option<bool>,
    pub include_docs: bool,
    pub prefix_match_level: u32,
    pub limit: Option<usize>,
    pub skip: usize,
    pub post_filter: Option<PostFilter>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            start_key: None,
            end_key: None,
            inclusive_start: true,
            inclusive_end: true,
            start_key_doc_id: None,
            end_key_doc_id: None,
            keys: None,
            descending: false,
            group: false,
            group_level: 0,
            reduce: None,
            include_docs: false,
            prefix_match_level: 0,
            limit: None,
            skip: 0,
            post_filter: None,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_key(mut self, key: impl Into<Value>) -> Self {
        self.start_key = Some(key.into());
        self
    }

    pub fn end_key(mut self, key: impl Into<Value>) -> Self {
        self.end_key = Some(key.into());
        self
    }

    pub fn inclusive_start(mut self, inclusive: bool) -> Self {
        self.inclusive_start = inclusive;
        self
    }

    pub fn inclusive_end(mut self, inclusive: bool) -> Self {
        self.inclusive_end = inclusive;
        self
    }

    pub fn start_key_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.start_key_doc_id = Some(doc_id.into());
        self
    }

    pub fn end_key_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.end_key_doc_id = Some(doc_id.into());
        self
    }

    pub fn keys(mut self, keys: Vec<Value>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    pub fn group(mut self, group: bool) -> Self {
        self.group = group;
        self
    }

    pub fn group_level(mut self, level: u32) -> Self {
        self.group_level = level;
        self
    }

    pub fn reduce(mut self, reduce: bool) -> Self {
        self.reduce = Some(reduce);
        self
    }

    pub fn include_docs(mut self, include: bool) -> Self {
        self.include_docs = include;
        self
    }

    pub fn prefix_match_level(mut self, level: u32) -> Self {
        self.prefix_match_level = level;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn post_filter(mut self, filter: impl Fn(&QueryRow) -> bool + Send + Sync + 'static) -> Self {
        self.post_filter = Some(Arc::new(filter));
        self
    }

    /// Grouping is on when `group` is set or a group level is given.
    pub fn is_grouping(&self) -> bool {
        self.group || self.group_level > 0
    }

    /// Reduction is on when requested or implied by grouping.
    pub fn is_reducing(&self) -> bool {
        self.reduce.unwrap_or(false) || self.is_grouping()
    }

    /// Checks option combinations that are invalid regardless of the view.
    pub fn validate(&self) -> Result<()> {
        if self.reduce == Some(false) && self.is_grouping() {
            return Err(Error::bad_request("group requires reduce"));
        }
        if self.include_docs && self.is_reducing() {
            return Err(Error::bad_request(
                "include_docs is not supported with reduce or group",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("start_key", &self.start_key)
            .field("end_key", &self.end_key)
            .field("inclusive_start", &self.inclusive_start)
            .field("inclusive_end", &self.inclusive_end)
            .field("start_key_doc_id", &self.start_key_doc_id)
            .field("end_key_doc_id", &self.end_key_doc_id)
            .field("keys", &self.keys)
            .field("descending", &self.descending)
            .field("group", &self.group)
            .field("group_level", &self.group_level)
            .field("reduce", &self.reduce)
            .field("include_docs", &self.include_docs)
            .field("prefix_match_level", &self.prefix_match_level)
            .field("limit", &self.limit)
            .field("skip", &self.skip)
            .field("post_filter", &self.post_filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docview_core::ErrorKind;

    #[test]
    fn test_defaults() {
        let options = QueryOptions::new();
        assert!(options.inclusive_start);
        assert!(options.inclusive_end);
        assert!(!options.is_reducing());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_group_implies_reduce() {
        assert!(QueryOptions::new().group(true).is_reducing());
        assert!(QueryOptions::new().group_level(2).is_grouping());
        assert!(QueryOptions::new().reduce(true).is_reducing());
        assert!(!QueryOptions::new().reduce(true).is_grouping());
    }

    #[test]
    fn test_invalid_combinations() {
        let err = QueryOptions::new().group_level(1).reduce(false).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        let err = QueryOptions::new().include_docs(true).group(true).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(QueryOptions::new().include_docs(true).validate().is_ok());
    }

    #[test]
    fn test_debug_hides_filter() {
        let options = QueryOptions::new().post_filter(|_| true);
        let text = format!("{:?}", options);
        assert!(text.contains("post_filter: true"));
    }
}
