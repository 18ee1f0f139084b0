//! Comparator implementations for view keys.
//!
//! `CollationComparator` is the semantic ordering of `Value`s under a view's
//! collation. The key codec produces byte strings whose order matches it.

use alloc::vec::Vec;
use core::cmp::Ordering;
use docview_core::{Collation, Object, Value};

/// Scan direction for index keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Ascending order (smallest first)
    #[default]
    Asc,
    /// Descending order (largest first)
    Desc,
}

impl Order {
    /// Applies this order to a comparison result.
    #[inline]
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            Order::Asc => ord,
            Order::Desc => ord.reverse(),
        }
    }
}

/// Trait for comparing index keys.
pub trait Comparator<K: ?Sized> {
    /// Compares two keys according to the comparator's ordering.
    fn compare(&self, a: &K, b: &K) -> Ordering;

    /// Returns true if a < b according to this comparator.
    fn is_less(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// Returns true if a > b according to this comparator.
    fn is_greater(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    /// Returns true if a == b according to this comparator.
    fn is_equal(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// Type rank shared by the Unicode and ASCII collations.
pub(crate) fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(false) => 1,
        Value::Bool(true) => 2,
        Value::Number(_) => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}

/// Case weight of a character for the Unicode collation's tie-break.
#[inline]
pub(crate) fn case_weight(c: char) -> u8 {
    if c.is_uppercase() {
        2
    } else {
        1
    }
}

/// Case-folds a string for the Unicode collation's primary comparison.
pub(crate) fn fold(s: &str) -> alloc::string::String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Semantic comparator of `Value`s under a collation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollationComparator {
    collation: Collation,
    order: Order,
}

impl CollationComparator {
    pub fn new(collation: Collation) -> Self {
        Self {
            collation,
            order: Order::Asc,
        }
    }

    /// Returns a comparator with the given direction.
    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn collation(&self) -> Collation {
        self.collation
    }

    fn compare_values(&self, a: &Value, b: &Value) -> Ordering {
        if self.collation == Collation::Raw {
            return compare_raw(a, b);
        }
        let rank = type_rank(a).cmp(&type_rank(b));
        if rank != Ordering::Equal {
            return rank;
        }
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => self.compare_strings(x, y),
            (Value::Array(x), Value::Array(y)) => {
                for (l, r) in x.iter().zip(y.iter()) {
                    let ord = self.compare_values(l, r);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                x.len().cmp(&y.len())
            }
            (Value::Object(x), Value::Object(y)) => self.compare_objects(x, y),
            _ => Ordering::Equal,
        }
    }

    fn compare_objects(&self, x: &Object, y: &Object) -> Ordering {
        for ((lk, lv), (rk, rv)) in x.iter().zip(y.iter()) {
            let ord = self
                .compare_strings(lk, rk)
                .then_with(|| self.compare_values(lv, rv));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        x.len().cmp(&y.len())
    }

    fn compare_strings(&self, a: &str, b: &str) -> Ordering {
        match self.collation {
            Collation::Unicode => fold(a)
                .cmp(&fold(b))
                .then_with(|| {
                    let wa: Vec<u8> = a.chars().map(case_weight).collect();
                    let wb: Vec<u8> = b.chars().map(case_weight).collect();
                    wa.cmp(&wb)
                })
                .then_with(|| a.as_bytes().cmp(b.as_bytes())),
            Collation::Ascii | Collation::Raw => a.as_bytes().cmp(b.as_bytes()),
        }
    }
}

/// Raw collation compares canonical JSON text byte-wise. Values without a
/// JSON rendering, which the key codec also rejects, sort after all others.
fn compare_raw(a: &Value, b: &Value) -> Ordering {
    match (raw_text(a), raw_text(b)) {
        (Some(ta), Some(tb)) => ta.cmp(&tb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn raw_text(value: &Value) -> Option<Vec<u8>> {
    if has_non_finite(value) {
        return None;
    }
    serde_json::to_vec(value).ok()
}

// serde_json writes NaN and infinities as `null`.
fn has_non_finite(value: &Value) -> bool {
    match value {
        Value::Number(n) => !n.is_finite(),
        Value::Array(items) => items.iter().any(has_non_finite),
        Value::Object(obj) => obj.iter().any(|(_, v)| has_non_finite(v)),
        _ => false,
    }
}

impl Comparator<Value> for CollationComparator {
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        self.order.apply(self.compare_values(a, b))
    }
}
