//! Reading: open a document, resolve access expressions and decode values.
//!
//! Nothing is materialized up front. Each lookup starts at the root header
//! and scans one container level per path segment, skipping siblings by
//! their stored payload length, so a lookup costs O(depth + siblings
//! scanned) rather than O(document size).
//!
//! ```
//! use son::Son;
//! use std::io::Cursor;
//!
//! let mut son = Son::new(4);
//! son.create(Cursor::new(Vec::new())).unwrap();
//! son.open_obj("root").unwrap();
//! son.write("name", "Stratify").unwrap();
//! son.open_obj("stuff").unwrap();
//! son.write("hour", 12).unwrap();
//! son.close_obj().unwrap();
//! son.close_obj().unwrap();
//! let stream = son.close(false).unwrap();
//!
//! son.open(stream).unwrap();
//! assert_eq!(son.read_str("name").unwrap(), "Stratify");
//! assert_eq!(son.read_unum("stuff.hour").unwrap(), 12);
//! assert!(son.read_unum("hour").unwrap_err().is_not_found());
//! ```

use std::io::{Read, Seek, SeekFrom};

use log::{debug, info};

use crate::consts::{CONTAINER_HEADER_LEN, HEADER_LEN, OPEN_LEN, ROOT_KEY};
use crate::document::{Mode, Son};
use crate::error::{Result, SonError};
use crate::header::{ContainerHeader, RecordHeader, Tag};
use crate::key::Key;
use crate::path::{self, Segment};
use crate::value::Value;

const NOT_READABLE: &str = "document is not open for reading";

/// A record located in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Offset of the record header.
    pub offset: u64,
    pub header: RecordHeader,
    /// Payload length with open records resolved to the end of their parent.
    pub payload_len: u64,
    /// 0 for the root container.
    pub depth: usize,
}

impl Entry {
    pub fn tag(&self) -> Tag {
        self.header.tag
    }

    pub fn key(&self) -> Key {
        self.header.key
    }

    pub fn payload_start(&self) -> u64 {
        self.offset + HEADER_LEN
    }

    pub fn end(&self) -> u64 {
        self.payload_start() + self.payload_len
    }

    fn first_child(&self) -> u64 {
        self.payload_start() + CONTAINER_HEADER_LEN
    }
}

/// Pre-order traversal events produced by [`Son::walk`].
#[derive(Debug, Clone, Copy)]
pub enum Visit<'a> {
    /// A container starts; its children follow.
    Enter(&'a Entry, &'a Value),
    /// A scalar or data record.
    Leaf(&'a Entry, &'a Value),
    /// A container ends.
    Exit(&'a Entry),
}

/// Payload size as stored in a header; `OPEN_LEN` itself is reserved.
fn payload_size(len: u64) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|&l| l != OPEN_LEN)
        .ok_or(SonError::SizeExceeded {
            capacity: OPEN_LEN - 1,
        })
}

pub(crate) fn read_header_at<S: Read + Seek>(
    stream: &mut S,
    pos: u64,
    end: u64,
) -> Result<RecordHeader> {
    if pos + HEADER_LEN > end {
        return Err(SonError::Corrupt(format!(
            "truncated record header at offset {}",
            pos
        )));
    }
    let mut buf = [0u8; HEADER_LEN as usize];
    stream.seek(SeekFrom::Start(pos))?;
    stream.read_exact(&mut buf)?;
    RecordHeader::parse(&buf)
        .ok_or_else(|| SonError::Corrupt(format!("invalid record header at offset {}", pos)))
}

pub(crate) fn read_container_at<S: Read + Seek>(
    stream: &mut S,
    pos: u64,
    end: u64,
) -> Result<ContainerHeader> {
    let at = pos + HEADER_LEN;
    if at + CONTAINER_HEADER_LEN > end {
        return Err(SonError::Corrupt(format!(
            "truncated container header at offset {}",
            pos
        )));
    }
    let mut buf = [0u8; CONTAINER_HEADER_LEN as usize];
    stream.seek(SeekFrom::Start(at))?;
    stream.read_exact(&mut buf)?;
    ContainerHeader::parse(&buf)
        .ok_or_else(|| SonError::Corrupt(format!("invalid container header at offset {}", pos)))
}

/// Read the record at `pos`, which must lie within a parent ending at `parent_end`.
fn read_entry<S: Read + Seek>(
    stream: &mut S,
    pos: u64,
    parent_end: u64,
    depth: usize,
) -> Result<Entry> {
    let header = read_header_at(stream, pos, parent_end)?;
    let start = pos + HEADER_LEN;
    let payload_len = if header.is_open() {
        if !(header.tag.is_container() || header.tag == Tag::Data) {
            return Err(SonError::Corrupt(format!(
                "{} record at offset {} has an open length",
                header.tag.name(),
                pos
            )));
        }
        parent_end - start
    } else {
        header.len as u64
    };
    if start + payload_len > parent_end {
        return Err(SonError::Corrupt(format!(
            "record '{}' at offset {} overruns its parent",
            header.key, pos
        )));
    }
    if header.tag.is_container() && payload_len < CONTAINER_HEADER_LEN {
        return Err(SonError::Corrupt(format!(
            "container '{}' at offset {} is too short",
            header.key, pos
        )));
    }
    Ok(Entry {
        offset: pos,
        header,
        payload_len,
        depth,
    })
}

fn find_child<S: Read + Seek>(
    stream: &mut S,
    parent: &Entry,
    seg: Segment,
) -> Result<Option<Entry>> {
    let fingerprint = match seg {
        Segment::Key(k) => k.fingerprint(),
        Segment::Index(_) => 0,
    };
    let end = parent.end();
    let mut pos = parent.first_child();
    let mut index = 0u32;
    while pos < end {
        let child = read_entry(stream, pos, end, parent.depth + 1)?;
        let hit = match seg {
            Segment::Index(n) => index == n,
            Segment::Key(k) => {
                child.header.key.fingerprint() == fingerprint && child.header.key == k
            }
        };
        if hit {
            return Ok(Some(child));
        }
        pos = child.end();
        index += 1;
    }
    Ok(None)
}

fn count_children<S: Read + Seek>(stream: &mut S, parent: &Entry) -> Result<u32> {
    let end = parent.end();
    let mut pos = parent.first_child();
    let mut count = 0u32;
    while pos < end {
        pos = read_entry(stream, pos, end, parent.depth + 1)?.end();
        count += 1;
    }
    Ok(count)
}

impl<S: Read + Seek> Son<S> {
    /// Open a document for read-only random access.
    ///
    /// Documents left open-ended are accepted; their open records extend to
    /// the end of the stream.
    pub fn open(&mut self, mut stream: S) -> Result<()> {
        self.ensure_closed()?;
        let extent = stream.seek(SeekFrom::End(0))?;
        let root = read_entry(&mut stream, 0, extent, 0)?;
        if !root.tag().is_container() || root.key().as_bytes() != ROOT_KEY.as_bytes() {
            return Err(SonError::Corrupt(
                "first record is not the root container".into(),
            ));
        }
        self.begin(stream, Mode::Read);
        self.extent = extent;
        info!(
            "Opened SON document ({} bytes, root {}{})",
            extent,
            root.tag().name(),
            if root.header.is_open() { ", open-ended" } else { "" }
        );
        Ok(())
    }

    /// The root container record.
    pub fn root(&mut self) -> Result<Entry> {
        self.ensure_mode(&[Mode::Read, Mode::Edit], NOT_READABLE)?;
        let extent = self.extent;
        read_entry(self.stream()?, 0, extent, 0)
    }

    /// Resolve an access expression to the record it names.
    pub fn locate(&mut self, access: &str) -> Result<Entry> {
        let segments =
            path::parse(access).ok_or_else(|| SonError::PathNotFound(access.to_string()))?;
        let mut cur = self.root()?;
        let stream = self.stream()?;
        for seg in segments {
            if !cur.tag().is_container() {
                return Err(SonError::PathNotFound(access.to_string()));
            }
            cur = find_child(stream, &cur, seg)?
                .ok_or_else(|| SonError::PathNotFound(access.to_string()))?;
        }
        debug!("Resolved '{}' to offset {}", access, cur.offset);
        Ok(cur)
    }

    /// Decode the value stored in `entry`.
    pub fn value_of(&mut self, entry: &Entry) -> Result<Value> {
        let stream = self.stream()?;
        match entry.tag() {
            Tag::Obj | Tag::Array => {
                let ch = read_container_at(stream, entry.offset, entry.end())?;
                let count = if entry.header.is_open() {
                    count_children(stream, entry)?
                } else {
                    ch.count
                };
                Ok(if entry.tag() == Tag::Obj {
                    Value::Obj { count }
                } else {
                    Value::Array {
                        fixed_size: ch.fixed_size,
                        count,
                    }
                })
            }
            tag => {
                let mut payload = vec![0u8; entry.payload_len as usize];
                stream.seek(SeekFrom::Start(entry.payload_start()))?;
                stream.read_exact(&mut payload)?;
                Value::decode(tag, &payload)
            }
        }
    }

    /// Read the value at `access` with its stored type.
    pub fn read(&mut self, access: &str) -> Result<Value> {
        let entry = self.locate(access)?;
        self.value_of(&entry)
    }

    /// Read as a string. Numbers are formatted, data is Base64 encoded and
    /// containers yield an empty string.
    pub fn read_str(&mut self, access: &str) -> Result<String> {
        Ok(self.read(access)?.to_text())
    }

    /// Read as `i32`; strings are parsed, non-convertible values give 0.
    pub fn read_num(&mut self, access: &str) -> Result<i32> {
        Ok(self.read(access)?.as_i32())
    }

    /// Read as `u32`; strings are parsed, non-convertible values give 0.
    pub fn read_unum(&mut self, access: &str) -> Result<u32> {
        Ok(self.read(access)?.as_u32())
    }

    /// Read as `f32`; strings are parsed, non-convertible values give 0.0.
    pub fn read_float(&mut self, access: &str) -> Result<f32> {
        Ok(self.read(access)?.as_f32())
    }

    /// Copy the value's raw bytes into `buf`, truncating to its capacity.
    /// Returns the number of bytes copied.
    pub fn read_data(&mut self, access: &str, buf: &mut [u8]) -> Result<usize> {
        let entry = self.locate(access)?;
        if entry.tag() == Tag::Data {
            let n = (entry.payload_len as usize).min(buf.len());
            let stream = self.stream()?;
            stream.seek(SeekFrom::Start(entry.payload_start()))?;
            stream.read_exact(&mut buf[..n])?;
            return Ok(n);
        }
        let bytes = self.value_of(&entry)?.to_bytes();
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }

    /// Position the stream at the payload of the record named by `access`
    /// and return the payload size, for reading large blobs in place.
    ///
    /// Open-ended records larger than a `u32` length yield `SizeExceeded`.
    pub fn seek(&mut self, access: &str) -> Result<u32> {
        let entry = self.locate(access)?;
        let size = payload_size(entry.payload_len)?;
        self.stream()?
            .seek(SeekFrom::Start(entry.payload_start()))?;
        Ok(size)
    }

    /// Visit every record in pre-order. Traversal is iterative, so depth is
    /// not bounded by the stack size.
    pub fn walk<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(Visit<'_>) -> Result<()>,
    {
        let root = self.root()?;
        let value = self.value_of(&root)?;
        visit(Visit::Enter(&root, &value))?;
        let mut pending: Vec<(Entry, u64)> = vec![(root, root.first_child())];
        while let Some(&(parent, pos)) = pending.last() {
            if pos >= parent.end() {
                pending.pop();
                visit(Visit::Exit(&parent))?;
                continue;
            }
            let child = read_entry(self.stream()?, pos, parent.end(), parent.depth + 1)?;
            if let Some(top) = pending.last_mut() {
                top.1 = child.end();
            }
            let value = self.value_of(&child)?;
            if child.tag().is_container() {
                visit(Visit::Enter(&child, &value))?;
                pending.push((child, child.first_child()));
            } else {
                visit(Visit::Leaf(&child, &value))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Son<Cursor<Vec<u8>>> {
        let mut son = Son::new(4);
        son.create(Cursor::new(Vec::new())).unwrap();
        son.open_obj("root").unwrap();
        son.write("a", 1).unwrap();
        son.open_array("list", 0).unwrap();
        son.write("", 10u32).unwrap();
        son.write("", 20u32).unwrap();
        son.close_array().unwrap();
        son.write("b", "two").unwrap();
        son.close_obj().unwrap();
        let stream = son.close(false).unwrap();
        son.open(stream).unwrap();
        son
    }

    #[test]
    fn siblings_are_skipped_by_length() {
        let mut son = sample();
        assert_eq!(son.read_str("b").unwrap(), "two");
        assert_eq!(son.read_unum("list[1]").unwrap(), 20);
        assert_eq!(son.read_num("[0]").unwrap(), 1);
    }

    #[test]
    fn root_value_reports_count() {
        let mut son = sample();
        assert_eq!(son.read("").unwrap(), Value::Obj { count: 3 });
        assert_eq!(
            son.read("list").unwrap(),
            Value::Array {
                fixed_size: 0,
                count: 2
            }
        );
    }

    #[test]
    fn scalars_have_no_children() {
        let mut son = sample();
        assert!(son.read("a.b").unwrap_err().is_not_found());
        assert!(son.read("list[2]").unwrap_err().is_not_found());
        assert!(son.read("a..").unwrap_err().is_not_found());
    }

    #[test]
    fn walk_is_pre_order() {
        let mut son = sample();
        let mut events = Vec::new();
        son.walk(|v| {
            events.push(match v {
                Visit::Enter(e, _) => format!("+{}", e.key()),
                Visit::Leaf(e, _) => e.key().to_string(),
                Visit::Exit(e) => format!("-{}", e.key()),
            });
            Ok(())
        })
        .unwrap();
        assert_eq!(
            events,
            vec!["+root", "a", "+list", "", "", "-list", "b", "-root"]
        );
    }

    #[test]
    fn open_rejects_garbage() {
        let mut son: Son<Cursor<Vec<u8>>> = Son::new(4);
        let err = son.open(Cursor::new(b"not a son document".to_vec())).unwrap_err();
        assert!(matches!(err, SonError::Corrupt(_)));
        assert!(!son.is_open());
    }

    #[test]
    fn reads_require_read_mode() {
        let mut son: Son<Cursor<Vec<u8>>> = Son::new(4);
        son.create(Cursor::new(Vec::new())).unwrap();
        son.open_obj("root").unwrap();
        assert!(matches!(
            son.read("x"),
            Err(SonError::StructureMismatch(_))
        ));
    }

    #[test]
    fn payload_size_rejects_lengths_beyond_u32() {
        assert_eq!(payload_size(42).unwrap(), 42);
        assert_eq!(payload_size(u64::from(OPEN_LEN) - 1).unwrap(), OPEN_LEN - 1);
        for len in [u64::from(OPEN_LEN), 1 << 32, 5 << 30] {
            assert!(matches!(
                payload_size(len),
                Err(SonError::SizeExceeded { capacity }) if capacity == OPEN_LEN - 1
            ));
        }
    }
}
