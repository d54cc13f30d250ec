//! Value codec: typed payload encoding and "any type to requested type"
//! conversions used by the read accessors.
//!
//! Numbers are 4 bytes little endian, booleans and null are carried by the
//! tag alone, strings are NUL terminated and data is raw bytes. Values that
//! cannot be converted to the requested type become `0`, `0.0`, `""` or an
//! empty byte vector.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Result, SonError};
use crate::header::Tag;

/// A value to be written, borrowed from the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Str(&'a str),
    Num(i32),
    Unum(u32),
    Float(f32),
    Bool(bool),
    Data(&'a [u8]),
    Null,
}

impl Scalar<'_> {
    pub fn tag(&self) -> Tag {
        match self {
            Scalar::Str(_) => Tag::Str,
            Scalar::Num(_) => Tag::Num,
            Scalar::Unum(_) => Tag::Unum,
            Scalar::Float(_) => Tag::Float,
            Scalar::Bool(true) => Tag::True,
            Scalar::Bool(false) => Tag::False,
            Scalar::Data(_) => Tag::Data,
            Scalar::Null => Tag::Null,
        }
    }

    /// Append the payload bytes to `out`.
    pub fn encode_payload(&self, out: &mut Vec<u8>) {
        match self {
            Scalar::Str(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            Scalar::Num(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::Unum(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::Data(d) => out.extend_from_slice(d),
            Scalar::Bool(_) | Scalar::Null => {}
        }
    }

    pub fn payload_len(&self) -> usize {
        match self {
            Scalar::Str(s) => s.len() + 1,
            Scalar::Num(_) | Scalar::Unum(_) | Scalar::Float(_) => 4,
            Scalar::Data(d) => d.len(),
            Scalar::Bool(_) | Scalar::Null => 0,
        }
    }
}

impl<'a> From<&'a str> for Scalar<'a> {
    fn from(v: &'a str) -> Self {
        Scalar::Str(v)
    }
}

impl<'a> From<&'a String> for Scalar<'a> {
    fn from(v: &'a String) -> Self {
        Scalar::Str(v.as_str())
    }
}

impl<'a> From<Option<&'a str>> for Scalar<'a> {
    fn from(v: Option<&'a str>) -> Self {
        v.map(Scalar::Str).unwrap_or(Scalar::Null)
    }
}

impl From<i32> for Scalar<'_> {
    fn from(v: i32) -> Self {
        Scalar::Num(v)
    }
}

impl From<u32> for Scalar<'_> {
    fn from(v: u32) -> Self {
        Scalar::Unum(v)
    }
}

impl From<f32> for Scalar<'_> {
    fn from(v: f32) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar<'_> {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl<'a> From<&'a [u8]> for Scalar<'a> {
    fn from(v: &'a [u8]) -> Self {
        Scalar::Data(v)
    }
}

/// A decoded record value. Containers carry only their header fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Obj { count: u32 },
    Array { fixed_size: u32, count: u32 },
    Data(Vec<u8>),
    Str(String),
    Num(i32),
    Unum(u32),
    Float(f32),
    Bool(bool),
    Null,
}

fn le4(payload: &[u8], tag: Tag) -> Result<[u8; 4]> {
    payload
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| SonError::Corrupt(format!("short {} payload", tag.name())))
}

impl Value {
    /// Decode a non-container payload.
    pub fn decode(tag: Tag, payload: &[u8]) -> Result<Self> {
        Ok(match tag {
            Tag::Str => {
                let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
                Value::Str(String::from_utf8_lossy(&payload[..end]).into_owned())
            }
            Tag::Num => Value::Num(i32::from_le_bytes(le4(payload, tag)?)),
            Tag::Unum => Value::Unum(u32::from_le_bytes(le4(payload, tag)?)),
            Tag::Float => Value::Float(f32::from_le_bytes(le4(payload, tag)?)),
            Tag::True => Value::Bool(true),
            Tag::False => Value::Bool(false),
            Tag::Null => Value::Null,
            Tag::Data => Value::Data(payload.to_vec()),
            Tag::Obj | Tag::Array => {
                return Err(SonError::Corrupt("container decoded as scalar".into()));
            }
        })
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Obj { .. } | Value::Array { .. })
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            Value::Num(v) => *v,
            Value::Unum(v) => *v as i32,
            Value::Float(v) => *v as i32,
            Value::Bool(b) => *b as i32,
            Value::Str(s) => parse_i32(s),
            _ => 0,
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            Value::Num(v) => *v as u32,
            Value::Unum(v) => *v,
            Value::Float(v) => *v as u32,
            Value::Bool(b) => *b as u32,
            Value::Str(s) => parse_u32(s),
            _ => 0,
        }
    }

    pub fn as_f32(&self) -> f32 {
        match self {
            Value::Num(v) => *v as f32,
            Value::Unum(v) => *v as f32,
            Value::Float(v) => *v,
            Value::Bool(b) => *b as u8 as f32,
            Value::Str(s) => s.trim().parse::<f32>().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// String form of the value. Data is Base64 encoded; containers have no
    /// string form and yield an empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Num(v) => v.to_string(),
            Value::Unum(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Data(d) => STANDARD.encode(d),
            Value::Obj { .. } | Value::Array { .. } => String::new(),
        }
    }

    /// Raw byte form of the value. Strings give their bytes without the
    /// terminator, numbers their little-endian encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Data(d) => d.clone(),
            Value::Str(s) => s.as_bytes().to_vec(),
            Value::Num(v) => v.to_le_bytes().to_vec(),
            Value::Unum(v) => v.to_le_bytes().to_vec(),
            Value::Float(v) => v.to_le_bytes().to_vec(),
            _ => Vec::new(),
        }
    }
}

fn parse_i32(s: &str) -> i32 {
    let s = s.trim();
    s.parse::<i32>()
        .ok()
        .or_else(|| s.parse::<f32>().ok().map(|f| f as i32))
        .unwrap_or(0)
}

fn parse_u32(s: &str) -> u32 {
    let s = s.trim();
    s.parse::<u32>()
        .ok()
        .or_else(|| s.parse::<i32>().ok().map(|v| v as u32))
        .or_else(|| s.parse::<f32>().ok().map(|f| f as u32))
        .unwrap_or(0)
}
