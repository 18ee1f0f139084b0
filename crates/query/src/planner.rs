//! Range query planning.
//!
//! Translates `QueryOptions` into a `ScanRequest` over a view's index. Bounds
//! are built once in terms of the physical lower and upper end; a descending
//! query swaps start and end (with their inclusive flags and doc-id bounds)
//! and scans in reverse.

use crate::options::QueryOptions;
use docview_core::{Collation, Error, Result, Value};
use docview_index::{key_for_prefix_match, KeyBound, KeyCodec, KeyRange, Order};
use docview_storage::ScanRequest;

/// How scanned rows are turned into results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryMode {
    /// Rows pass through to the assembler.
    Direct,
    /// Rows are grouped and reduced.
    Reduce { group: bool, group_level: u32 },
}

/// The planned execution of a query.
#[derive(Clone, Debug)]
pub struct ScanPlan {
    pub request: ScanRequest,
    pub mode: QueryMode,
    /// Skip and limit still to apply after the scan.
    pub skip: usize,
    pub limit: Option<usize>,
}

impl ScanPlan {
    /// Returns true if skip and limit were handed to the store.
    #[cfg(test)]
    pub(crate) fn is_paged_by_store(&self) -> bool {
        self.skip == 0 && self.limit.is_none()
    }
}

/// Plans scans for one view collation.
#[derive(Clone, Copy, Debug)]
pub struct RangeQueryPlanner {
    codec: KeyCodec,
}

struct EndPoint<'a> {
    key: Option<&'a Value>,
    inclusive: bool,
    doc_id: Option<&'a String>,
}

impl RangeQueryPlanner {
    pub fn new(collation: Collation) -> Self {
        Self {
            codec: KeyCodec::new(collation),
        }
    }

    pub fn plan(&self, options: &QueryOptions) -> Result<ScanPlan> {
        options.validate()?;

        let order = if options.descending { Order::Desc } else { Order::Asc };
        let mut request = match &options.keys {
            Some(keys) => {
                let encoded = keys
                    .iter()
                    .map(|k| self.codec.encode(k))
                    .collect::<Result<Vec<_>>>()?;
                ScanRequest::default().with_keys(encoded)
            }
            None => ScanRequest::new(self.range(options)?),
        }
        .with_order(order);

        let mode = if options.is_reducing() {
            QueryMode::Reduce {
                group: options.is_grouping(),
                group_level: options.group_level,
            }
        } else {
            QueryMode::Direct
        };

        // Paging can only be pushed into the scan when every scanned row
        // becomes exactly one result row.
        let push_down = mode == QueryMode::Direct && options.post_filter.is_none();
        let (skip, limit) = if push_down {
            request = request.with_skip(options.skip).with_limit(options.limit);
            (0, None)
        } else {
            (options.skip, options.limit)
        };

        tracing::trace!(
            lower = ?request.range.lower,
            upper = ?request.range.upper,
            keys = request.keys.as_ref().map(Vec::len),
            descending = options.descending,
            "planned view scan"
        );

        Ok(ScanPlan {
            request,
            mode,
            skip,
            limit,
        })
    }

    fn range(&self, options: &QueryOptions) -> Result<KeyRange> {
        let start = EndPoint {
            key: options.start_key.as_ref(),
            inclusive: options.inclusive_start,
            doc_id: options.start_key_doc_id.as_ref(),
        };
        let end = EndPoint {
            key: options.end_key.as_ref(),
            inclusive: options.inclusive_end,
            doc_id: options.end_key_doc_id.as_ref(),
        };
        let (min, max) = if options.descending {
            (end, start)
        } else {
            (start, end)
        };

        let lower = self.bound(&min, None)?;
        let upper = self.bound(&max, Some(options.prefix_match_level))?;
        if let (Some(lo), Some(hi)) = (&lower, &upper) {
            if lo.key > hi.key {
                return Err(Error::bad_request(if options.descending {
                    "start key sorts before end key in a descending query"
                } else {
                    "start key sorts after end key"
                }));
            }
        }
        Ok(KeyRange::new(lower, upper))
    }

    fn bound(&self, end: &EndPoint<'_>, prefix_level: Option<u32>) -> Result<Option<KeyBound>> {
        let Some(key) = end.key else {
            return Ok(None);
        };
        let encoded = match prefix_level {
            Some(level) if level > 0 => self.codec.encode(&key_for_prefix_match(key, level))?,
            _ => self.codec.encode(key)?,
        };
        let mut bound = if end.inclusive {
            KeyBound::inclusive(encoded)
        } else {
            KeyBound::exclusive(encoded)
        };
        if let Some(doc_id) = end.doc_id {
            bound = bound.with_doc_id(doc_id.as_str());
        }
        Ok(Some(bound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docview_core::ErrorKind;

    fn planner() -> RangeQueryPlanner {
        RangeQueryPlanner::new(Collation::Unicode)
    }

    fn enc(v: impl Into<Value>) -> docview_index::EncodedKey {
        KeyCodec::new(Collation::Unicode).encode(&v.into()).unwrap()
    }

    #[test]
    fn test_ascending_bounds() {
        let plan = planner()
            .plan(&QueryOptions::new().start_key(2).end_key(5).inclusive_end(false))
            .unwrap();
        let range = &plan.request.range;
        assert_eq!(range.lower, Some(KeyBound::inclusive(enc(2))));
        assert_eq!(range.upper, Some(KeyBound::exclusive(enc(5))));
        assert_eq!(plan.request.order, Order::Asc);
        assert_eq!(plan.mode, QueryMode::Direct);
    }

    #[test]
    fn test_descending_swaps_bounds_and_flags() {
        let options = QueryOptions::new()
            .start_key(5)
            .end_key(2)
            .inclusive_start(false)
            .start_key_doc_id("s")
            .end_key_doc_id("e")
            .descending(true);
        let plan = planner().plan(&options).unwrap();
        let range = &plan.request.range;
        assert_eq!(range.lower, Some(KeyBound::inclusive(enc(2)).with_doc_id("e")));
        assert_eq!(range.upper, Some(KeyBound::exclusive(enc(5)).with_doc_id("s")));
        assert_eq!(plan.request.order, Order::Desc);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = planner()
            .plan(&QueryOptions::new().start_key(5).end_key(2))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        let err = planner()
            .plan(&QueryOptions::new().start_key(2).end_key(5).descending(true))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_prefix_match_extends_upper_bound() {
        let options = QueryOptions::new()
            .start_key(vec![Value::from("a")])
            .end_key(vec![Value::from("a")])
            .prefix_match_level(1);
        let plan = planner().plan(&options).unwrap();
        let upper = plan.request.range.upper.unwrap();
        assert!(enc(vec![Value::from("a"), Value::from(99)]) < upper.key);
        assert!(enc(vec![Value::from("b")]) > upper.key);
    }

    #[test]
    fn test_keys_scan_ignores_range() {
        let plan = planner()
            .plan(&QueryOptions::new().keys(vec![Value::from(1), Value::from(3)]).start_key(9))
            .unwrap();
        assert_eq!(plan.request.keys.as_ref().map(Vec::len), Some(2));
        assert!(plan.request.range.is_all());
    }

    #[test]
    fn test_paging_push_down() {
        let direct = planner().plan(&QueryOptions::new().skip(2).limit(3)).unwrap();
        assert_eq!((direct.request.skip, direct.request.limit), (2, Some(3)));
        assert!(direct.is_paged_by_store());

        let filtered = planner()
            .plan(&QueryOptions::new().skip(2).limit(3).post_filter(|_| true))
            .unwrap();
        assert_eq!((filtered.request.skip, filtered.request.limit), (0, None));
        assert_eq!((filtered.skip, filtered.limit), (2, Some(3)));

        let reduced = planner().plan(&QueryOptions::new().reduce(true).limit(1)).unwrap();
        assert_eq!(reduced.mode, QueryMode::Reduce { group: false, group_level: 0 });
        assert_eq!(reduced.limit, Some(1));
    }

    #[test]
    fn test_nan_bound_is_codec_error() {
        let err = planner().plan(&QueryOptions::new().start_key(f64::NAN)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
    }
}
