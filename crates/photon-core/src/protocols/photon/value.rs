//! Recursive decoder for Photon's typed-parameter grammar.
//!
//! Every value is a type tag followed by a tag-specific payload. The tag
//! table comes from a [`Dialect`]; decoding walks the input as a slice and
//! hands the unread remainder back with each value, which keeps nested array
//! decoding free of shared cursor state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::dialect::{Dialect, PHOTON, ValueRule};
use super::error::{ParameterError, ValueError};
use super::reader::{
    read_f32_be, read_i8, read_i16_be, read_i32_be, read_i64_be, read_u8, read_u16_be,
    read_u32_be, take,
};

/// Decoded parameters keyed by parameter id.
pub type ParameterTable = BTreeMap<u8, TypedValue>;

/// A decoded value of the parameter grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypedValue {
    Nil,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    String(RawString),
    Boolean(bool),
    ByteArray(Vec<i8>),
    Array(Vec<TypedValue>),
}

/// String payload exactly as it appeared on the wire.
///
/// Photon does not guarantee UTF-8, so the bytes are kept and only converted
/// (lossily) for display and serialization.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct RawString(Vec<u8>);

impl RawString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl From<&[u8]> for RawString {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<&str> for RawString {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl fmt::Debug for RawString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl fmt::Display for RawString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl Serialize for RawString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

impl<'de> Deserialize<'de> for RawString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|text| Self(text.into_bytes()))
    }
}

/// Decode one value of type `tag` with the stock Photon dialect.
///
/// Returns the value and the unread remainder of `input`.
///
/// # Examples
/// ```
/// use photon_core::{TypedValue, decode_value};
///
/// let (value, rest) = decode_value(105, &[0x00, 0x00, 0x00, 0x80, 0xff]).unwrap();
/// assert_eq!(value, TypedValue::Int32(128));
/// assert_eq!(rest, &[0xff]);
/// ```
pub fn decode_value(tag: u8, input: &[u8]) -> Result<(TypedValue, &[u8]), ValueError> {
    decode_value_with(&PHOTON, tag, input)
}

pub fn decode_value_with<'a>(
    dialect: &Dialect,
    tag: u8,
    input: &'a [u8],
) -> Result<(TypedValue, &'a [u8]), ValueError> {
    let rule = dialect
        .rule(tag)
        .ok_or(ValueError::UnknownTypeTag { tag })?;
    decode_rule(dialect, rule, input, 0)
}

/// Decode `count` `(id, tag, payload)` triples with the stock Photon dialect.
///
/// # Examples
/// ```
/// use photon_core::{TypedValue, decode_parameters};
///
/// let table = decode_parameters(1, &[0x00, 115, 0x00, 0x03, b'a', b'b', b'c']).unwrap();
/// assert_eq!(table[&0], TypedValue::String("abc".into()));
/// ```
pub fn decode_parameters(count: i16, input: &[u8]) -> Result<ParameterTable, ParameterError> {
    decode_parameters_with(&PHOTON, count, input)
}

/// Decode a parameter table with an explicit dialect.
///
/// Negative counts decode nothing. Bytes left after `count` parameters are
/// ignored. A repeated parameter id keeps the last value.
pub fn decode_parameters_with(
    dialect: &Dialect,
    count: i16,
    input: &[u8],
) -> Result<ParameterTable, ParameterError> {
    let mut table = ParameterTable::new();
    let mut rest = input;

    for _ in 0..count.max(0) {
        let (parameter_id, after_id) = match read_u8(rest) {
            Ok(read) => read,
            Err(short) => {
                return Err(ParameterError {
                    parameter_id: None,
                    source: short.into(),
                    decoded: table,
                });
            }
        };
        let decoded = read_u8(after_id)
            .map_err(ValueError::from)
            .and_then(|(tag, payload)| decode_value_with(dialect, tag, payload));
        match decoded {
            Ok((value, next)) => {
                table.insert(parameter_id, value);
                rest = next;
            }
            Err(source) => {
                return Err(ParameterError {
                    parameter_id: Some(parameter_id),
                    source,
                    decoded: table,
                });
            }
        }
    }

    Ok(table)
}

fn decode_rule<'a>(
    dialect: &Dialect,
    rule: ValueRule,
    input: &'a [u8],
    depth: usize,
) -> Result<(TypedValue, &'a [u8]), ValueError> {
    let decoded = match rule {
        ValueRule::Nil => (TypedValue::Nil, input),
        ValueRule::Int8 => {
            let (value, rest) = read_i8(input)?;
            (TypedValue::Int8(value), rest)
        }
        ValueRule::Int16 => {
            let (value, rest) = read_i16_be(input)?;
            (TypedValue::Int16(value), rest)
        }
        ValueRule::Int32 => {
            let (value, rest) = read_i32_be(input)?;
            (TypedValue::Int32(value), rest)
        }
        ValueRule::Int64 => {
            let (value, rest) = read_i64_be(input)?;
            (TypedValue::Int64(value), rest)
        }
        ValueRule::Float32 => {
            let (value, rest) = read_f32_be(input)?;
            (TypedValue::Float32(value), rest)
        }
        ValueRule::String => {
            let (len, rest) = read_u16_be(input)?;
            let (bytes, rest) = take(rest, len as usize)?;
            (TypedValue::String(RawString::from(bytes)), rest)
        }
        ValueRule::ShortString => {
            let (_, rest) = read_u8(input)?;
            let (len, rest) = read_u8(rest)?;
            let (bytes, rest) = take(rest, len as usize)?;
            (TypedValue::String(RawString::from(bytes)), rest)
        }
        ValueRule::Boolean => {
            let (value, rest) = read_u8(input)?;
            let value = match value {
                0 => false,
                1 => true,
                value => return Err(ValueError::InvalidBoolean { value }),
            };
            (TypedValue::Boolean(value), rest)
        }
        ValueRule::ByteArray => {
            let (len, rest) = read_u32_be(input)?;
            let (bytes, rest) = take(rest, len as usize)?;
            let values = bytes.iter().map(|byte| *byte as i8).collect();
            (TypedValue::ByteArray(values), rest)
        }
        ValueRule::Array => {
            if depth >= dialect.max_depth() {
                return Err(ValueError::NestingTooDeep {
                    limit: dialect.max_depth(),
                });
            }
            let (len, rest) = read_u16_be(input)?;
            let (tag, rest) = read_u8(rest)?;
            // Every element must consume input, so the element count stays
            // bounded by the bytes available.
            let element = dialect
                .rule(tag)
                .filter(|rule| *rule != ValueRule::Nil)
                .ok_or(ValueError::UnknownSliceTag { tag })?;
            decode_elements(dialect, element, len as usize, rest, depth + 1)?
        }
        ValueRule::Int16Array => {
            let (len, rest) = read_u16_be(input)?;
            let (_, rest) = read_u8(rest)?;
            decode_elements(dialect, ValueRule::Int16, len as usize, rest, depth + 1)?
        }
    };
    Ok(decoded)
}

fn decode_elements<'a>(
    dialect: &Dialect,
    rule: ValueRule,
    len: usize,
    input: &'a [u8],
    depth: usize,
) -> Result<(TypedValue, &'a [u8]), ValueError> {
    let mut elements = Vec::with_capacity(len.min(input.len()));
    let mut rest = input;
    for _ in 0..len {
        let (element, next) = decode_rule(dialect, rule, rest, depth)?;
        elements.push(element);
        rest = next;
    }
    Ok((TypedValue::Array(elements), rest))
}
