//! Record header and type tags.
//!
//! Every record starts with a 13-byte header: a one byte type tag, the
//! fixed-width key field, and the payload length as a little-endian `u32`.
//! Containers (objects and arrays) follow the header with an 8-byte
//! `{fixed_size, count}` block and then their children.

use crate::consts::{CONTAINER_HEADER_LEN, HEADER_LEN, KEY_FIELD, OPEN_LEN};
use crate::key::Key;

/// Type tag stored in the first byte of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Obj = 0x01,
    Array = 0x02,
    Data = 0x03,
    Str = 0x04,
    Num = 0x05,
    Unum = 0x06,
    Float = 0x07,
    True = 0x08,
    False = 0x09,
    Null = 0x0A,
}

impl Tag {
    /// Convert a tag byte into a tag, if recognized.
    pub fn from_u8(v: u8) -> Option<Self> {
        use Tag::*;
        Some(match v {
            0x01 => Obj,
            0x02 => Array,
            0x03 => Data,
            0x04 => Str,
            0x05 => Num,
            0x06 => Unum,
            0x07 => Float,
            0x08 => True,
            0x09 => False,
            0x0A => Null,
            _ => return None,
        })
    }

    pub fn is_container(self) -> bool {
        matches!(self, Tag::Obj | Tag::Array)
    }

    /// Short lowercase name, used by the tree listing and in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Tag::Obj => "object",
            Tag::Array => "array",
            Tag::Data => "data",
            Tag::Str => "string",
            Tag::Num => "num",
            Tag::Unum => "unum",
            Tag::Float => "float",
            Tag::True | Tag::False => "bool",
            Tag::Null => "null",
        }
    }
}

/// Parsed record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub tag: Tag,
    pub key: Key,
    /// Payload length; [`OPEN_LEN`] while the record is still open.
    pub len: u32,
}

impl RecordHeader {
    pub fn new(tag: Tag, key: Key, len: u32) -> Self {
        Self { tag, key, len }
    }

    pub fn is_open(&self) -> bool {
        self.len == OPEN_LEN
    }

    pub fn encode(&self) -> [u8; HEADER_LEN as usize] {
        let mut out = [0u8; HEADER_LEN as usize];
        out[0] = self.tag as u8;
        out[1..1 + KEY_FIELD].copy_from_slice(self.key.as_field());
        out[1 + KEY_FIELD..].copy_from_slice(&self.len.to_le_bytes());
        out
    }

    /// Parse a header from the first 13 bytes of `buf`.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_LEN as usize {
            return None;
        }
        let tag = Tag::from_u8(buf[0])?;
        let key = Key::from_field(&buf[1..1 + KEY_FIELD])?;
        let l = 1 + KEY_FIELD;
        let len = u32::from_le_bytes([buf[l], buf[l + 1], buf[l + 2], buf[l + 3]]);
        Some(Self { tag, key, len })
    }
}

/// The `{fixed_size, count}` block at the start of a container payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Declared element capacity, 0 for open-ended arrays and objects.
    pub fixed_size: u32,
    pub count: u32,
}

impl ContainerHeader {
    pub fn encode(&self) -> [u8; CONTAINER_HEADER_LEN as usize] {
        let mut out = [0u8; CONTAINER_HEADER_LEN as usize];
        out[0..4].copy_from_slice(&self.fixed_size.to_le_bytes());
        out[4..8].copy_from_slice(&self.count.to_le_bytes());
        out
    }

    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < CONTAINER_HEADER_LEN as usize {
            return None;
        }
        Some(Self {
            fixed_size: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            count: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }
}
