//! Reduce functions.
//!
//! A view's optional reduce step. Any `Fn(&[Value], &[Value], bool) -> Value`
//! closure is a reducer; `Count`, `Sum` and `Stats` cover the common cases.

use docview_core::{Object, Value};

/// Associative aggregation over a batch of emitted rows.
///
/// With `rereduce` false, `keys` and `values` are the raw emitted pairs of
/// one group. With `rereduce` true, `values` are earlier outputs of this
/// function and `keys` is empty.
pub trait ReduceFunction: Send + Sync {
    fn reduce(&self, keys: &[Value], values: &[Value], rereduce: bool) -> Value;
}

impl<F> ReduceFunction for F
where
    F: Fn(&[Value], &[Value], bool) -> Value + Send + Sync,
{
    fn reduce(&self, keys: &[Value], values: &[Value], rereduce: bool) -> Value {
        self(keys, values, rereduce)
    }
}

/// Counts rows; on rereduce, sums the partial counts.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl ReduceFunction for Count {
    fn reduce(&self, _keys: &[Value], values: &[Value], rereduce: bool) -> Value {
        if rereduce {
            Value::Number(sum_numbers(values))
        } else {
            Value::from(values.len() as u64)
        }
    }
}

/// Sums numeric values, ignoring everything else.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum;

impl ReduceFunction for Sum {
    fn reduce(&self, _keys: &[Value], values: &[Value], _rereduce: bool) -> Value {
        Value::Number(sum_numbers(values))
    }
}

fn sum_numbers(values: &[Value]) -> f64 {
    values.iter().filter_map(Value::as_f64).sum()
}

/// Summary statistics of numeric values: sum, count, min, max and sum of
/// squares, as an object.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats;

#[derive(Clone, Copy, Debug)]
struct Summary {
    sum: f64,
    count: f64,
    min: f64,
    max: f64,
    sumsqr: f64,
}

impl Summary {
    fn empty() -> Self {
        Self {
            sum: 0.0,
            count: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sumsqr: 0.0,
        }
    }

    fn add(&mut self, n: f64) {
        self.sum += n;
        self.count += 1.0;
        self.min = self.min.min(n);
        self.max = self.max.max(n);
        self.sumsqr += n * n;
    }

    fn merge(&mut self, partial: &Object) {
        let field = |name: &str| partial.get(name).and_then(Value::as_f64);
        let (Some(sum), Some(count), Some(min), Some(max), Some(sumsqr)) = (
            field("sum"),
            field("count"),
            field("min"),
            field("max"),
            field("sumsqr"),
        ) else {
            return;
        };
        self.sum += sum;
        self.count += count;
        self.min = self.min.min(min);
        self.max = self.max.max(max);
        self.sumsqr += sumsqr;
    }

    fn into_value(self) -> Value {
        if self.count == 0.0 {
            return Value::Null;
        }
        let mut obj = Object::with_capacity(5);
        obj.insert("sum", self.sum);
        obj.insert("count", self.count);
        obj.insert("min", self.min);
        obj.insert("max", self.max);
        obj.insert("sumsqr", self.sumsqr);
        Value::Object(obj)
    }
}

impl ReduceFunction for Stats {
    fn reduce(&self, _keys: &[Value], values: &[Value], rereduce: bool) -> Value {
        let mut summary = Summary::empty();
        for value in values {
            match (rereduce, value) {
                (true, Value::Object(partial)) => summary.merge(partial),
                (false, Value::Number(n)) => summary.add(*n),
                _ => {}
            }
        }
        summary.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(ns: &[f64]) -> Vec<Value> {
        ns.iter().map(|n| Value::from(*n)).collect()
    }

    #[test]
    fn test_count() {
        assert_eq!(Count.reduce(&[], &nums(&[5.0, 6.0, 7.0]), false), Value::from(3));
        assert_eq!(Count.reduce(&[], &nums(&[3.0, 2.0]), true), Value::from(5));
    }

    #[test]
    fn test_sum_ignores_non_numbers() {
        let values = vec![Value::from(1.5), Value::from("x"), Value::from(2), Value::Null];
        assert_eq!(Sum.reduce(&[], &values, false), Value::from(3.5));
    }

    #[test]
    fn test_stats_and_rereduce() {
        let a = Stats.reduce(&[], &nums(&[1.0, 3.0]), false);
        let b = Stats.reduce(&[], &nums(&[-2.0]), false);
        assert_eq!(a.get("count"), Some(&Value::from(2)));
        assert_eq!(a.get("sumsqr"), Some(&Value::from(10)));

        let merged = Stats.reduce(&[], &[a, b], true);
        assert_eq!(merged.get("sum"), Some(&Value::from(2)));
        assert_eq!(merged.get("count"), Some(&Value::from(3)));
        assert_eq!(merged.get("min"), Some(&Value::from(-2)));
        assert_eq!(merged.get("max"), Some(&Value::from(3)));
        assert_eq!(Stats.reduce(&[], &[], false), Value::Null);
    }

    #[test]
    fn test_closure_reducer() {
        let longest = |keys: &[Value], _values: &[Value], _rereduce: bool| Value::from(keys.len() as u64);
        let reducer: &dyn ReduceFunction = &longest;
        assert_eq!(reducer.reduce(&[Value::Null, Value::Null], &[], false), Value::from(2));
    }
}
