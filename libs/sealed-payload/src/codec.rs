//! MessagePack codec for sealed payloads.
//!
//! Decoding is fixed to the configuration the sealed API relies on:
//! - `uint64`/`int64` markers decode to strings (no precision loss)
//! - nil is the null marker; absent values are encoded as nil
//! - no record/structure extensions; maps decode to string-keyed objects
//! - extension `-1` (timestamp) is the only supported extension

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rmp::Marker;

use crate::error::{DeserializationError, SerializationError};
use crate::value::{Value, format_timestamp};

/// Maximum nesting of arrays and maps accepted by the decoder.
pub const MAX_DEPTH: usize = 128;

/// MessagePack extension type reserved for timestamps.
const TIMESTAMP_EXT: i8 = -1;

/// Decode exactly one MessagePack value from `buffer`.
///
/// # Errors
///
/// Returns a [`DeserializationError`] for empty, truncated or malformed input,
/// unsupported extensions or map keys, excessive nesting, or trailing bytes
/// after the value.
pub fn deserialize(buffer: &[u8]) -> Result<Value, DeserializationError> {
    if buffer.is_empty() {
        return Err(DeserializationError::Empty);
    }

    let mut reader = Reader::new(buffer);
    let value = reader.value()?;

    let remaining = reader.remaining();
    if remaining > 0 {
        return Err(DeserializationError::TrailingBytes { remaining });
    }
    Ok(value)
}

/// Re-encode a decoded value into the byte form consumed downstream.
///
/// A top-level [`Value::Binary`] is returned unchanged; everything else is
/// rendered as JSON text.
///
/// # Errors
///
/// Returns [`DeserializationError::Json`] if JSON rendering fails.
pub fn reencode(value: Value) -> Result<Bytes, DeserializationError> {
    match value {
        Value::Binary(raw) => Ok(raw),
        other => Ok(Bytes::from(serde_json::to_vec(&other.to_json())?)),
    }
}

/// Encode a value as MessagePack.
///
/// Integers use the most compact marker; strings and binaries use the
/// str/bin families; timestamps use the 96-bit timestamp extension.
///
/// # Errors
///
/// Returns [`SerializationError::LengthOverflow`] if a string, binary or
/// collection exceeds the 32-bit length limit.
pub fn serialize(value: &Value) -> Result<Vec<u8>, SerializationError> {
    let mut buf = Vec::new();
    write_value(&mut buf, value)?;
    Ok(buf)
}

fn write_err<E>(err: E) -> SerializationError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SerializationError::Write(Box::new(err))
}

fn len_u32(len: usize) -> Result<u32, SerializationError> {
    u32::try_from(len).map_err(|_| SerializationError::LengthOverflow { len })
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), SerializationError> {
    match value {
        Value::Nil => rmp::encode::write_nil(buf).map_err(write_err)?,
        Value::Bool(b) => rmp::encode::write_bool(buf, *b).map_err(write_err)?,
        Value::Integer(i) => {
            rmp::encode::write_sint(buf, *i).map_err(write_err)?;
        }
        Value::Float(f) => rmp::encode::write_f64(buf, *f).map_err(write_err)?,
        Value::String(s) => {
            len_u32(s.len())?;
            rmp::encode::write_str(buf, s).map_err(write_err)?;
        }
        Value::Binary(b) => {
            len_u32(b.len())?;
            rmp::encode::write_bin(buf, b).map_err(write_err)?;
        }
        Value::Array(items) => {
            rmp::encode::write_array_len(buf, len_u32(items.len())?).map_err(write_err)?;
            for item in items {
                write_value(buf, item)?;
            }
        }
        Value::Map(entries) => {
            rmp::encode::write_map_len(buf, len_u32(entries.len())?).map_err(write_err)?;
            for (key, item) in entries {
                rmp::encode::write_str(buf, key).map_err(write_err)?;
                write_value(buf, item)?;
            }
        }
        Value::Timestamp(ts) => {
            rmp::encode::write_ext_meta(buf, 12, TIMESTAMP_EXT).map_err(write_err)?;
            buf.extend_from_slice(&ts.timestamp_subsec_nanos().to_be_bytes());
            buf.extend_from_slice(&ts.timestamp().to_be_bytes());
        }
    }
    Ok(())
}

/// Cursor over the input buffer.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DeserializationError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(DeserializationError::Truncated {
                offset: self.pos,
                needed: len - remaining,
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DeserializationError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DeserializationError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, DeserializationError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, DeserializationError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, DeserializationError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    /// Decode one complete value.
    ///
    /// Containers are tracked on an explicit stack, so nesting depth never
    /// grows the call stack.
    fn value(&mut self) -> Result<Value, DeserializationError> {
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            let start = self.pos;
            let mut child = match self.head()? {
                Head::Value(value) => Some((value, start)),
                Head::Array(len) => {
                    Self::enter(stack.len())?;
                    // Every element needs at least one byte; never trust the declared length
                    let items = Vec::with_capacity(len.min(self.remaining()));
                    stack.push(Frame::Array { start, len, items });
                    None
                }
                Head::Map(len) => {
                    Self::enter(stack.len())?;
                    let entries = Vec::with_capacity(len.min(self.remaining() / 2));
                    stack.push(Frame::Map {
                        start,
                        len,
                        entries,
                        key: None,
                    });
                    None
                }
            };

            loop {
                if let Some((value, offset)) = child.take() {
                    match stack.last_mut() {
                        Some(frame) => frame.accept(value, offset)?,
                        None => return Ok(value),
                    }
                }
                match stack.pop_if(|frame| frame.is_full()) {
                    Some(frame) => child = Some(frame.finish()),
                    None => break,
                }
            }
        }
    }

    /// Read one marker and, for scalars, its payload.
    fn head(&mut self) -> Result<Head, DeserializationError> {
        let offset = self.pos;
        let value = match Marker::from_u8(self.u8()?) {
            Marker::Null => Value::Nil,
            Marker::True => Value::Bool(true),
            Marker::False => Value::Bool(false),

            Marker::FixPos(n) => Value::Integer(i64::from(n)),
            Marker::FixNeg(n) => Value::Integer(i64::from(n)),
            Marker::U8 => Value::Integer(i64::from(self.u8()?)),
            Marker::U16 => Value::Integer(i64::from(self.u16()?)),
            Marker::U32 => Value::Integer(i64::from(self.u32()?)),
            Marker::U64 => Value::String(self.u64()?.to_string()),
            Marker::I8 => Value::Integer(i64::from(i8::from_be_bytes(self.array()?))),
            Marker::I16 => Value::Integer(i64::from(i16::from_be_bytes(self.array()?))),
            Marker::I32 => Value::Integer(i64::from(i32::from_be_bytes(self.array()?))),
            Marker::I64 => Value::String(i64::from_be_bytes(self.array()?).to_string()),

            Marker::F32 => Value::Float(f64::from(f32::from_bits(self.u32()?))),
            Marker::F64 => Value::Float(f64::from_bits(self.u64()?)),

            Marker::FixStr(len) => self.string(usize::from(len))?,
            Marker::Str8 => {
                let len = usize::from(self.u8()?);
                self.string(len)?
            }
            Marker::Str16 => {
                let len = usize::from(self.u16()?);
                self.string(len)?
            }
            Marker::Str32 => {
                let len = self.u32()? as usize;
                self.string(len)?
            }

            Marker::Bin8 => {
                let len = usize::from(self.u8()?);
                self.binary(len)?
            }
            Marker::Bin16 => {
                let len = usize::from(self.u16()?);
                self.binary(len)?
            }
            Marker::Bin32 => {
                let len = self.u32()? as usize;
                self.binary(len)?
            }

            Marker::FixArray(len) => return Ok(Head::Array(usize::from(len))),
            Marker::Array16 => return Ok(Head::Array(usize::from(self.u16()?))),
            Marker::Array32 => return Ok(Head::Array(self.u32()? as usize)),

            Marker::FixMap(len) => return Ok(Head::Map(usize::from(len))),
            Marker::Map16 => return Ok(Head::Map(usize::from(self.u16()?))),
            Marker::Map32 => return Ok(Head::Map(self.u32()? as usize)),

            Marker::FixExt1 => self.ext(1)?,
            Marker::FixExt2 => self.ext(2)?,
            Marker::FixExt4 => self.ext(4)?,
            Marker::FixExt8 => self.ext(8)?,
            Marker::FixExt16 => self.ext(16)?,
            Marker::Ext8 => {
                let len = usize::from(self.u8()?);
                self.ext(len)?
            }
            Marker::Ext16 => {
                let len = usize::from(self.u16()?);
                self.ext(len)?
            }
            Marker::Ext32 => {
                let len = self.u32()? as usize;
                self.ext(len)?
            }

            Marker::Reserved => return Err(DeserializationError::ReservedMarker { offset }),
        };
        Ok(Head::Value(value))
    }

    fn string(&mut self, len: usize) -> Result<Value, DeserializationError> {
        let offset = self.pos;
        let raw = self.take(len)?;
        let text = std::str::from_utf8(raw).map_err(|_| DeserializationError::InvalidUtf8 { offset })?;
        Ok(Value::String(text.to_owned()))
    }

    fn binary(&mut self, len: usize) -> Result<Value, DeserializationError> {
        Ok(Value::Binary(Bytes::copy_from_slice(self.take(len)?)))
    }

    fn enter(open: usize) -> Result<(), DeserializationError> {
        if open >= MAX_DEPTH {
            return Err(DeserializationError::DepthLimitExceeded { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn ext(&mut self, len: usize) -> Result<Value, DeserializationError> {
        let ext_type = i8::from_be_bytes(self.array()?);
        let data = self.take(len)?;
        if ext_type != TIMESTAMP_EXT {
            return Err(DeserializationError::UnsupportedExtension { ext_type });
        }
        decode_timestamp(data).map(Value::Timestamp)
    }
}

/// First element of a value: a complete scalar or the header of a container.
enum Head {
    Value(Value),
    Array(usize),
    Map(usize),
}

/// Container being filled by the decoder.
enum Frame {
    Array {
        start: usize,
        len: usize,
        items: Vec<Value>,
    },
    Map {
        start: usize,
        len: usize,
        entries: Vec<(String, Value)>,
        key: Option<String>,
    },
}

impl Frame {
    /// Add a decoded child that started at `offset`.
    fn accept(&mut self, value: Value, offset: usize) -> Result<(), DeserializationError> {
        match self {
            Self::Array { items, .. } => items.push(value),
            Self::Map { entries, key, .. } => match key.take() {
                Some(key) => entries.push((key, value)),
                None => *key = Some(map_key(value, offset)?),
            },
        }
        Ok(())
    }

    fn is_full(&self) -> bool {
        match self {
            Self::Array { len, items, .. } => items.len() == *len,
            Self::Map {
                len, entries, key, ..
            } => key.is_none() && entries.len() == *len,
        }
    }

    fn finish(self) -> (Value, usize) {
        match self {
            Self::Array { start, items, .. } => (Value::Array(items), start),
            Self::Map { start, entries, .. } => (Value::Map(entries), start),
        }
    }
}

/// Textual form of a scalar map key.
fn map_key(key: Value, offset: usize) -> Result<String, DeserializationError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(float_key(f)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Nil => Ok("null".to_owned()),
        Value::Timestamp(ts) => Ok(format_timestamp(&ts)),
        Value::Binary(_) | Value::Array(_) | Value::Map(_) => {
            Err(DeserializationError::UnsupportedMapKey { offset })
        }
    }
}

/// Float keys are named the way JavaScript prints numbers: shortest
/// round-trip digits, plain notation for `1e-6 <= |f| < 1e21`, exponent with
/// an explicit sign otherwise.
fn float_key(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_owned();
    }
    if f.is_infinite() {
        let name = if f > 0.0 { "Infinity" } else { "-Infinity" };
        return name.to_owned();
    }
    if f == 0.0 {
        return "0".to_owned();
    }

    let magnitude = f.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return f.to_string();
    }
    let exp = format!("{f:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

/// Decode the 32, 64 and 96-bit timestamp extension layouts.
fn decode_timestamp(data: &[u8]) -> Result<DateTime<Utc>, DeserializationError> {
    let invalid = || DeserializationError::InvalidTimestamp { len: data.len() };

    let (secs, nanos) = match *data {
        [a, b, c, d] => (i64::from(u32::from_be_bytes([a, b, c, d])), 0),
        [a, b, c, d, e, f, g, h] => {
            let packed = u64::from_be_bytes([a, b, c, d, e, f, g, h]);
            // upper 30 bits: nanoseconds, lower 34 bits: seconds
            let nanos = u32::try_from(packed >> 34).map_err(|_| invalid())?;
            let secs = i64::try_from(packed & 0x0000_0003_ffff_ffff).map_err(|_| invalid())?;
            (secs, nanos)
        }
        [a, b, c, d, e, f, g, h, i, j, k, l] => {
            let nanos = u32::from_be_bytes([a, b, c, d]);
            let secs = i64::from_be_bytes([e, f, g, h, i, j, k, l]);
            (secs, nanos)
        }
        _ => return Err(invalid()),
    };

    if nanos >= 1_000_000_000 {
        return Err(invalid());
    }
    DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(invalid)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_of(buffer: &[u8]) -> serde_json::Value {
        let bytes = reencode(deserialize(buffer).unwrap()).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_structural_map_reencodes_to_equal_json() {
        let value = Value::Map(vec![
            ("a".to_owned(), Value::Integer(1)),
            (
                "b".to_owned(),
                Value::Array(vec![Value::Bool(true), Value::Nil]),
            ),
        ]);
        let packed = serialize(&value).unwrap();

        assert_eq!(json_of(&packed), json!({"a": 1, "b": [true, null]}));
    }

    #[test]
    fn test_known_wire_bytes() {
        // {"a": 1, "b": [true, nil]}
        let packed = [0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x92, 0xc3, 0xc0];
        assert_eq!(json_of(&packed), json!({"a": 1, "b": [true, null]}));
    }

    #[test]
    fn test_top_level_binary_passes_through() {
        let raw = [0x00, 0xff, 0x10, 0x80];
        let mut packed = vec![0xc4, 4];
        packed.extend_from_slice(&raw);

        let out = reencode(deserialize(&packed).unwrap()).unwrap();
        assert_eq!(out.as_ref(), &raw);
    }

    #[test]
    fn test_u64_and_i64_decode_as_strings() {
        let mut packed = vec![0x92, 0xcf];
        packed.extend_from_slice(&u64::MAX.to_be_bytes());
        packed.push(0xd3);
        packed.extend_from_slice(&i64::MIN.to_be_bytes());

        assert_eq!(
            deserialize(&packed).unwrap(),
            Value::Array(vec![
                Value::String("18446744073709551615".to_owned()),
                Value::String("-9223372036854775808".to_owned()),
            ])
        );
    }

    #[test]
    fn test_small_integer_families_decode_as_numbers() {
        let packed = [
            0x96, 0x7f, 0xe0, 0xcc, 0xff, 0xcd, 0x01, 0x00, 0xd0, 0x80, 0xce, 0xff, 0xff, 0xff,
            0xff,
        ];
        assert_eq!(json_of(&packed), json!([127, -32, 255, 256, -128, 4_294_967_295_u64]));
    }

    #[test]
    fn test_floats() {
        let mut packed = vec![0x92, 0xca];
        packed.extend_from_slice(&1.5f32.to_bits().to_be_bytes());
        packed.push(0xcb);
        packed.extend_from_slice(&f64::NAN.to_bits().to_be_bytes());

        assert_eq!(json_of(&packed), json!([1.5, null]));
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        // {1: "one", true: "yes", nil: "none"}
        let packed = [
            0x83, 0x01, 0xa3, b'o', b'n', b'e', 0xc3, 0xa3, b'y', b'e', b's', 0xc0, 0xa4, b'n',
            b'o', b'n', b'e',
        ];
        assert_eq!(
            json_of(&packed),
            json!({"1": "one", "true": "yes", "null": "none"})
        );
    }

    #[test]
    fn test_composite_key_rejected() {
        // {[]: 1}
        let packed = [0x81, 0x90, 0x01];
        assert!(matches!(
            deserialize(&packed),
            Err(DeserializationError::UnsupportedMapKey { offset: 1 })
        ));
    }

    #[test]
    fn test_timestamp_extension_forms() {
        // 32-bit form
        let packed = [0xd6, 0xff, 0x65, 0x53, 0xf1, 0x00];
        assert_eq!(json_of(&packed), json!("2023-11-14T22:13:20.000Z"));

        // 96-bit form written by the encoder, with nanoseconds
        let ts = DateTime::<Utc>::from_timestamp(1_700_000_000, 250_000_000).unwrap();
        let packed = serialize(&Value::Timestamp(ts)).unwrap();
        assert_eq!(deserialize(&packed).unwrap(), Value::Timestamp(ts));

        // 64-bit form: nanos << 34 | secs
        let packed64 = (250_000_000u64 << 34) | 1_700_000_000u64;
        let mut packed = vec![0xd7, 0xff];
        packed.extend_from_slice(&packed64.to_be_bytes());
        assert_eq!(deserialize(&packed).unwrap(), Value::Timestamp(ts));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let packed = [0xd4, 0x05, 0x00];
        assert!(matches!(
            deserialize(&packed),
            Err(DeserializationError::UnsupportedExtension { ext_type: 5 })
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(deserialize(&[]), Err(DeserializationError::Empty)));
    }

    #[test]
    fn test_truncated_input_rejected() {
        // str8 declaring 5 bytes, only 2 present
        let packed = [0xd9, 0x05, b'a', b'b'];
        assert!(matches!(
            deserialize(&packed),
            Err(DeserializationError::Truncated { offset: 2, needed: 3 })
        ));

        // array of 3 with only one element
        let packed = [0x93, 0x01];
        assert!(matches!(
            deserialize(&packed),
            Err(DeserializationError::Truncated { .. })
        ));
    }

    #[test]
    fn test_huge_declared_length_does_not_preallocate() {
        let packed = [0xdd, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(
            deserialize(&packed),
            Err(DeserializationError::Truncated { .. })
        ));
    }

    #[test]
    fn test_reserved_marker_rejected() {
        assert!(matches!(
            deserialize(&[0xc1]),
            Err(DeserializationError::ReservedMarker { offset: 0 })
        ));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let packed = [0xa2, 0xff, 0xfe];
        assert!(matches!(
            deserialize(&packed),
            Err(DeserializationError::InvalidUtf8 { offset: 1 })
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert!(matches!(
            deserialize(&[0xc0, 0xc0]),
            Err(DeserializationError::TrailingBytes { remaining: 1 })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut packed = vec![0x91; MAX_DEPTH];
        packed.push(0xc0);
        assert!(deserialize(&packed).is_ok());

        let mut packed = vec![0x91; MAX_DEPTH + 1];
        packed.push(0xc0);
        assert!(matches!(
            deserialize(&packed),
            Err(DeserializationError::DepthLimitExceeded { limit: MAX_DEPTH })
        ));
    }

    #[test]
    fn test_deep_nesting_does_not_use_call_stack() {
        let outcome = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let mut deep = Vec::new();
                for _ in 0..100_000 {
                    deep.extend_from_slice(&[0x81, 0xa1, b'k']);
                }
                deep.push(0xc0);
                let too_deep = matches!(
                    deserialize(&deep),
                    Err(DeserializationError::DepthLimitExceeded { limit: MAX_DEPTH })
                );

                let mut at_limit = vec![0x91; MAX_DEPTH];
                at_limit.push(0xc0);
                (too_deep, deserialize(&at_limit).is_ok())
            })
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(outcome, (true, true));
    }

    #[test]
    fn test_nested_containers_close_in_order() {
        // [[1, {}], {"a": [[]]}, 2]
        let packed = [
            0x93, 0x92, 0x01, 0x80, 0x81, 0xa1, b'a', 0x91, 0x90, 0x02,
        ];
        assert_eq!(json_of(&packed), json!([[1, {}], {"a": [[]]}, 2]));
    }

    #[test]
    fn test_float_keys_named_like_javascript_numbers() {
        let keys = [
            1.5,
            -0.0,
            1e21,
            1e20,
            1e-7,
            0.000_001,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ];
        let mut packed = vec![0x88];
        for (i, key) in keys.iter().enumerate() {
            packed.push(0xcb);
            packed.extend_from_slice(&key.to_bits().to_be_bytes());
            packed.push(u8::try_from(i).unwrap());
        }

        let Value::Map(entries) = deserialize(&packed).unwrap() else {
            panic!("expected a map");
        };
        let names: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "1.5",
                "0",
                "1e+21",
                "100000000000000000000",
                "1e-7",
                "0.000001",
                "Infinity",
                "-Infinity",
            ]
        );
    }

    #[test]
    fn test_serialize_uses_compact_forms() {
        assert_eq!(serialize(&Value::Integer(5)).unwrap(), vec![0x05]);
        assert_eq!(serialize(&Value::Nil).unwrap(), vec![0xc0]);
        assert_eq!(
            serialize(&Value::String("ok".to_owned())).unwrap(),
            vec![0xa2, b'o', b'k']
        );
    }
}
