//! Order-preserving key encoding.
//!
//! A `KeyCodec` turns a `Value` into an `EncodedKey` whose byte-wise order
//! matches `CollationComparator` for the same collation. Encodings are
//! self-delimiting: no valid encoding is a proper prefix of another, which
//! lets the index store seek to "just past" a key by appending a zero byte.
//!
//! Layout (Unicode and ASCII):
//!
//! - each value starts with a type tag; tags rise with the type rank
//! - numbers are 8 big-endian bytes of the sign-flipped IEEE-754 bits
//! - strings are terminated by `0x00`, with embedded `0x00` written as `0x00 0xFF`
//! - Unicode strings carry three sections: case-folded text, per-char case
//!   weights, then the original text
//! - arrays are their elements followed by `0x00`
//! - objects are `0x01`-prefixed (key, value) entries followed by `0x00`
//!
//! Raw collation stores the escaped canonical JSON text with a terminator.

use crate::comparator::{case_weight, fold};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use docview_core::{Collation, Error, Object, Result, Value};

const TERMINATOR: u8 = 0x00;
const ESCAPE: u8 = 0xFF;
const ENTRY: u8 = 0x01;

const TAG_NULL: u8 = 0x10;
const TAG_FALSE: u8 = 0x20;
const TAG_TRUE: u8 = 0x21;
const TAG_NUMBER: u8 = 0x30;
const TAG_STRING: u8 = 0x40;
const TAG_ARRAY: u8 = 0x50;
const TAG_OBJECT: u8 = 0x60;

const SIGN_BIT: u64 = 1 << 63;

/// An encoded view key. Ordering is byte-wise.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EncodedKey(Vec<u8>);

impl EncodedKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The smallest byte string greater than this key and every other
    /// encoding that equals it.
    ///
    /// Relies on encodings being prefix-free: nothing valid lies strictly
    /// between `k` and `k ++ [0x00]`.
    pub fn successor(&self) -> EncodedKey {
        let mut bytes = Vec::with_capacity(self.0.len() + 1);
        bytes.extend_from_slice(&self.0);
        bytes.push(TERMINATOR);
        EncodedKey(bytes)
    }
}

impl fmt::Debug for EncodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncodedKey(")?;
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        f.write_str(")")
    }
}

/// Encodes and decodes view keys for one collation.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyCodec {
    collation: Collation,
}

impl KeyCodec {
    pub fn new(collation: Collation) -> Self {
        Self { collation }
    }

    pub fn collation(&self) -> Collation {
        self.collation
    }

    /// Encodes a key. Non-finite numbers are rejected.
    pub fn encode(&self, key: &Value) -> Result<EncodedKey> {
        check_finite(key)?;
        let mut out = Vec::with_capacity(16);
        match self.collation {
            Collation::Raw => {
                let text = serde_json::to_vec(key)?;
                write_escaped(&mut out, &text);
            }
            Collation::Unicode | Collation::Ascii => self.encode_value(key, &mut out),
        }
        Ok(EncodedKey(out))
    }

    /// Decodes a key previously produced by `encode` with the same collation.
    pub fn decode(&self, key: &EncodedKey) -> Result<Value> {
        let mut reader = Reader::new(key.as_bytes());
        let value = match self.collation {
            Collation::Raw => {
                let text = reader.read_escaped()?;
                serde_json::from_slice::<Value>(&text)?
            }
            Collation::Unicode | Collation::Ascii => self.decode_value(&mut reader)?,
        };
        if !reader.is_done() {
            return Err(Error::codec("trailing bytes after key"));
        }
        Ok(value)
    }

    fn encode_value(&self, value: &Value, out: &mut Vec<u8>) {
        match value {
            Value::Null => out.push(TAG_NULL),
            Value::Bool(false) => out.push(TAG_FALSE),
            Value::Bool(true) => out.push(TAG_TRUE),
            Value::Number(n) => {
                out.push(TAG_NUMBER);
                out.extend_from_slice(&encode_f64(*n));
            }
            Value::String(s) => {
                out.push(TAG_STRING);
                self.encode_str(s, out);
            }
            Value::Array(items) => {
                out.push(TAG_ARRAY);
                for item in items {
                    self.encode_value(item, out);
                }
                out.push(TERMINATOR);
            }
            Value::Object(obj) => {
                out.push(TAG_OBJECT);
                for (k, v) in obj.iter() {
                    out.push(ENTRY);
                    self.encode_str(k, out);
                    self.encode_value(v, out);
                }
                out.push(TERMINATOR);
            }
        }
    }

    fn encode_str(&self, s: &str, out: &mut Vec<u8>) {
        if self.collation == Collation::Unicode {
            write_escaped(out, fold(s).as_bytes());
            out.extend(s.chars().map(case_weight));
            out.push(TERMINATOR);
        }
        write_escaped(out, s.as_bytes());
    }

    fn decode_value(&self, reader: &mut Reader<'_>) -> Result<Value> {
        let tag = reader.next()?;
        match tag {
            TAG_NULL => Ok(Value::Null),
            TAG_FALSE => Ok(Value::Bool(false)),
            TAG_TRUE => Ok(Value::Bool(true)),
            TAG_NUMBER => {
                let bytes = reader.take(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Ok(Value::Number(decode_f64(buf)))
            }
            TAG_STRING => Ok(Value::String(self.decode_str(reader)?)),
            TAG_ARRAY => {
                let mut items = Vec::new();
                while reader.peek()? != TERMINATOR {
                    items.push(self.decode_value(reader)?);
                }
                reader.next()?;
                Ok(Value::Array(items))
            }
            TAG_OBJECT => {
                let mut obj = Object::new();
                loop {
                    match reader.next()? {
                        TERMINATOR => break,
                        ENTRY => {
                            let k = self.decode_str(reader)?;
                            let v = self.decode_value(reader)?;
                            obj.insert(k, v);
                        }
                        other => {
                            return Err(Error::codec(alloc::format!(
                                "unexpected byte {:#04x} in object",
                                other
                            )))
                        }
                    }
                }
                Ok(Value::Object(obj))
            }
            other => Err(Error::codec(alloc::format!("unknown type tag {:#04x}", other))),
        }
    }

    fn decode_str(&self, reader: &mut Reader<'_>) -> Result<String> {
        if self.collation == Collation::Unicode {
            reader.read_escaped()?;
            while reader.next()? != TERMINATOR {}
        }
        let bytes = reader.read_escaped()?;
        String::from_utf8(bytes).map_err(|_| Error::codec("string is not valid UTF-8"))
    }
}

fn check_finite(value: &Value) -> Result<()> {
    match value {
        Value::Number(n) if !n.is_finite() => {
            Err(Error::codec(alloc::format!("key contains non-finite number {}", n)))
        }
        Value::Array(items) => items.iter().try_for_each(check_finite),
        Value::Object(obj) => obj.iter().try_for_each(|(_, v)| check_finite(v)),
        _ => Ok(()),
    }
}

#[inline]
fn encode_f64(n: f64) -> [u8; 8] {
    // -0.0 and 0.0 compare equal, so they share an encoding.
    let n = if n == 0.0 { 0.0 } else { n };
    let bits = n.to_bits();
    let flipped = if bits & SIGN_BIT != 0 { !bits } else { bits ^ SIGN_BIT };
    flipped.to_be_bytes()
}

#[inline]
fn decode_f64(bytes: [u8; 8]) -> f64 {
    let flipped = u64::from_be_bytes(bytes);
    let bits = if flipped & SIGN_BIT != 0 { flipped ^ SIGN_BIT } else { !flipped };
    f64::from_bits(bits)
}

fn write_escaped(out: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        out.push(b);
        if b == TERMINATOR {
            out.push(ESCAPE);
        }
    }
    out.push(TERMINATOR);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_done(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn peek(&self) -> Result<u8> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| Error::codec("unexpected end of key"))
    }

    fn next(&mut self) -> Result<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| Error::codec("unexpected end of key"))?;
        self.pos = end;
        Ok(slice)
    }

    fn read_escaped(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let b = self.next()?;
            if b != TERMINATOR {
                out.push(b);
                continue;
            }
            if self.bytes.get(self.pos) == Some(&ESCAPE) {
                self.pos += 1;
                out.push(TERMINATOR);
            } else {
                return Ok(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn enc(collation: Collation, v: &Value) -> EncodedKey {
        KeyCodec::new(collation).encode(v).unwrap()
    }

    #[test]
    fn test_numbers_order() {
        let keys: Vec<_> = [-1e9, -2.5, -0.0, 1e-9, 3.0, 42.0, 1e300]
            .iter()
            .map(|n| enc(Collation::Unicode, &Value::from(*n)))
            .collect();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(
            enc(Collation::Unicode, &Value::from(-0.0)),
            enc(Collation::Unicode, &Value::from(0.0))
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let codec = KeyCodec::new(Collation::Unicode);
        let err = codec.encode(&Value::from(f64::NAN)).unwrap_err();
        assert_eq!(err.kind(), docview_core::ErrorKind::Codec);
        let nested = Value::from(vec![Value::from(1), Value::from(f64::INFINITY)]);
        assert!(codec.encode(&nested).is_err());
        assert!(KeyCodec::new(Collation::Raw).encode(&nested).is_err());
    }

    #[test]
    fn test_string_with_nul_roundtrip() {
        for collation in [Collation::Unicode, Collation::Ascii, Collation::Raw] {
            let codec = KeyCodec::new(collation);
            let v = Value::from("a\u{0}b");
            assert_eq!(codec.decode(&codec.encode(&v).unwrap()).unwrap(), v);
        }
    }

    #[test]
    fn test_unicode_case_ordering() {
        let a = enc(Collation::Unicode, &Value::from("a"));
        let upper_a = enc(Collation::Unicode, &Value::from("A"));
        let b = enc(Collation::Unicode, &Value::from("b"));
        assert!(a < upper_a);
        assert!(upper_a < b);

        let ascii_upper_b = enc(Collation::Ascii, &Value::from("B"));
        let ascii_a = enc(Collation::Ascii, &Value::from("a"));
        assert!(ascii_upper_b < ascii_a);
    }

    #[test]
    fn test_array_prefix_sorts_first() {
        let short = Value::from(vec![Value::from("x")]);
        let long = Value::from(vec![Value::from("x"), Value::Null]);
        assert!(enc(Collation::Unicode, &short) < enc(Collation::Unicode, &long));
    }

    #[test]
    fn test_object_roundtrip_and_empty_key() {
        let codec = KeyCodec::new(Collation::Unicode);
        let obj: Object = [("", Value::from(1)), ("k", Value::from("v"))]
            .into_iter()
            .collect();
        let v = Value::Object(obj);
        assert_eq!(codec.decode(&codec.encode(&v).unwrap()).unwrap(), v);
        let empty = Value::Object(Object::new());
        assert!(codec.encode(&empty).unwrap() < codec.encode(&v).unwrap());
    }

    #[test]
    fn test_successor_bounds_equal_keys() {
        let k = enc(Collation::Unicode, &Value::from("k"));
        let longer = enc(Collation::Unicode, &Value::from("k\u{0}"));
        assert!(k < k.successor());
        assert!(k.successor() < longer);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let codec = KeyCodec::new(Collation::Unicode);
        assert!(codec.decode(&EncodedKey::from_bytes(vec![0x99])).is_err());
        assert!(codec.decode(&EncodedKey::from_bytes(vec![TAG_NUMBER, 1, 2])).is_err());
        assert!(codec.decode(&EncodedKey::from_bytes(vec![TAG_NULL, TAG_NULL])).is_err());
    }
}
