//! Prefix-match upper bounds.

use alloc::string::String;
use docview_core::{Object, Value};

/// Extends `key` so that, used as an inclusive upper bound, it admits every
/// key sharing the first `level` nesting levels with it.
///
/// A string gains a trailing `char::MAX`, whose UTF-8 bytes outrank every
/// other code point. At level 1 a list gains a trailing
/// empty object, which outranks any element type. Deeper levels recurse
/// into the list's last element. Other keys are returned unchanged.
pub fn key_for_prefix_match(key: &Value, level: u32) -> Value {
    if level == 0 {
        return key.clone();
    }
    match key {
        Value::String(s) => {
            let mut extended = String::with_capacity(s.len() + 3);
            extended.push_str(s);
            extended.push(char::MAX);
            Value::String(extended)
        }
        Value::Array(items) => {
            let mut extended = items.clone();
            if level == 1 {
                extended.push(Value::Object(Object::new()));
            } else if let Some(last) = extended.last_mut() {
                *last = key_for_prefix_match(last, level - 1);
            }
            Value::Array(extended)
        }
        other => other.clone(),
    }
}
