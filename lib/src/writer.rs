//! Writing: create, append, containers, data records and typed values.
//!
//! Records are assembled in memory and emitted with a single `write_all`.
//! Containers and open data records are written with a placeholder length
//! that is backpatched when they close (seek to header, write, seek back).
//!
//! ```
//! use son::Son;
//! use std::io::Cursor;
//!
//! let mut son = Son::new(4);
//! son.create(Cursor::new(Vec::new())).unwrap();
//! son.open_obj("root").unwrap();
//! son.write("name", "Stratify").unwrap();
//! son.write("value", 100u32).unwrap();
//! son.close_obj().unwrap();
//! let bytes = son.close(false).unwrap().into_inner();
//! assert!(!bytes.is_empty());
//! ```

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::{debug, info, warn};

use crate::consts::{CONTAINER_HEADER_LEN, HEADER_LEN, LEN_OFFSET, OPEN_LEN, ROOT_KEY};
use crate::document::{Mode, Son};
use crate::error::{Result, SonError};
use crate::header::{ContainerHeader, RecordHeader};
use crate::key::Key;
use crate::reader::{read_container_at, read_header_at};
use crate::stack::{Frame, FrameKind, Stack};
use crate::value::Scalar;

const NOT_WRITABLE: &str = "document is not open for writing";

fn payload_len_u32(n: u64) -> Result<u32> {
    u32::try_from(n)
        .ok()
        .filter(|&l| l != OPEN_LEN)
        .ok_or(SonError::SizeExceeded {
            capacity: OPEN_LEN - 1,
        })
}

impl<S: Read + Write + Seek> Son<S> {
    /// Start a new document on an empty stream.
    ///
    /// The stream is not truncated; callers hand in an empty stream (the
    /// [`Son::create_file`] helper truncates the file for them).
    pub fn create(&mut self, mut stream: S) -> Result<()> {
        self.ensure_closed()?;
        let len = stream.seek(SeekFrom::End(0))?;
        if len != 0 {
            return Err(SonError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "create requires an empty stream",
            )));
        }
        self.begin(stream, Mode::Write);
        info!("Created SON document (stack size {})", self.stack.limit());
        Ok(())
    }

    /// Reopen a document whose innermost open container is an open-ended
    /// array and position the cursor at its end.
    pub fn append(&mut self, mut stream: S) -> Result<()> {
        self.ensure_closed()?;
        let end = stream.seek(SeekFrom::End(0))?;
        let chain = open_chain(&mut stream, end)?;
        let mut stack = Stack::new(self.stack.limit());
        for frame in chain {
            stack.restore(frame)?;
        }
        stream.seek(SeekFrom::Start(end))?;
        self.begin(stream, Mode::Write);
        self.stack = stack;
        self.root_opened = true;
        info!(
            "Appending to SON document at offset {} ({} open containers)",
            end,
            self.stack.depth()
        );
        Ok(())
    }

    /// Close the session and return the stream.
    ///
    /// An open data record is always closed. With `close_all` every open
    /// container is closed as well; otherwise they are left open-ended so
    /// the document can later be extended with [`Son::append`].
    pub fn close(&mut self, close_all: bool) -> Result<S> {
        match self.mode {
            Mode::Closed => return Err(SonError::StructureMismatch("document is not open")),
            Mode::Write => {
                if self.stack.top().map(|f| f.kind) == Some(FrameKind::Data) {
                    self.close_data()?;
                }
                if close_all {
                    while let Some(top) = self.stack.top().copied() {
                        self.close_container(top.kind)?;
                    }
                } else if !self.stack.is_empty() {
                    info!(
                        "Leaving {} container(s) open-ended",
                        self.stack.depth()
                    );
                }
                self.stream()?.flush()?;
            }
            Mode::Edit => self.stream()?.flush()?,
            Mode::Read => {}
        }
        debug!("Closed SON document");
        self.release()
            .ok_or(SonError::StructureMismatch("document is not open"))
    }

    pub fn open_obj(&mut self, key: &str) -> Result<()> {
        self.open_record(FrameKind::Object, key, 0)
    }

    /// Close the innermost object and return its element count.
    pub fn close_obj(&mut self) -> Result<u32> {
        self.close_container(FrameKind::Object)
    }

    /// Open an array. A non-zero `fixed_size` caps the number of elements.
    pub fn open_array(&mut self, key: &str, fixed_size: u32) -> Result<()> {
        self.open_record(FrameKind::Array, key, fixed_size)
    }

    /// Close the innermost array and return its element count.
    pub fn close_array(&mut self) -> Result<u32> {
        self.close_container(FrameKind::Array)
    }

    /// Start a data record whose length is not known up front.
    pub fn open_data(&mut self, key: &str) -> Result<()> {
        self.open_record(FrameKind::Data, key, 0)
    }

    /// Append bytes to the open data record.
    pub fn write_open_data(&mut self, bytes: &[u8]) -> Result<usize> {
        self.ensure_mode(&[Mode::Write], NOT_WRITABLE)?;
        let top = self.stack.check_top(FrameKind::Data).map_err(|_| {
            SonError::StructureMismatch("write_open_data requires an open data record")
        })?;
        let total = payload_len_u32(top.count as u64 + bytes.len() as u64)?;
        self.stream()?.write_all(bytes)?;
        if let Some(f) = self.stack.top_mut() {
            f.count = total;
        }
        Ok(bytes.len())
    }

    /// Close the open data record and return its total size in bytes.
    pub fn close_data(&mut self) -> Result<u32> {
        self.close_container(FrameKind::Data)
    }

    /// Write a key/value record into the current container and return the
    /// number of payload bytes stored.
    ///
    /// Accepts `&str`, `Option<&str>` (None is written as null), `i32`,
    /// `u32`, `f32`, `bool` and `&[u8]`.
    pub fn write<'a, V: Into<Scalar<'a>>>(&mut self, key: &str, value: V) -> Result<usize> {
        self.write_scalar(key, value.into())
    }

    pub fn write_null(&mut self, key: &str) -> Result<usize> {
        self.write_scalar(key, Scalar::Null)
    }

    pub fn write_data(&mut self, key: &str, data: &[u8]) -> Result<usize> {
        self.write_scalar(key, Scalar::Data(data))
    }

    fn write_scalar(&mut self, key: &str, value: Scalar<'_>) -> Result<usize> {
        self.check_parent()?;
        let len = payload_len_u32(value.payload_len() as u64)?;
        let key = encode_key(key);
        let mut rec = Vec::with_capacity(HEADER_LEN as usize + len as usize);
        rec.extend_from_slice(&RecordHeader::new(value.tag(), key, len).encode());
        value.encode_payload(&mut rec);
        self.stream()?.write_all(&rec)?;
        self.stack.increment_top();
        Ok(len as usize)
    }

    /// Validate that a record may be written into the top container.
    fn check_parent(&self) -> Result<()> {
        self.ensure_mode(&[Mode::Write], NOT_WRITABLE)?;
        match self.stack.top() {
            None if self.root_opened => Err(SonError::StructureMismatch(
                "the root container is already closed",
            )),
            None => Err(SonError::StructureMismatch(
                "no open container; open \"root\" first",
            )),
            Some(f) if f.kind == FrameKind::Data => Err(SonError::StructureMismatch(
                "a data record is open; close_data first",
            )),
            Some(f) if f.is_full() => Err(SonError::SizeExceeded {
                capacity: f.fixed_size,
            }),
            Some(_) => Ok(()),
        }
    }

    fn open_record(&mut self, kind: FrameKind, key: &str, fixed_size: u32) -> Result<()> {
        let is_root = self.stack.is_empty();
        if is_root {
            self.ensure_mode(&[Mode::Write], NOT_WRITABLE)?;
            if self.root_opened {
                return Err(SonError::StructureMismatch(
                    "the root container is already closed",
                ));
            }
            if kind == FrameKind::Data {
                return Err(SonError::StructureMismatch(
                    "the root must be an object or an array",
                ));
            }
            if key != ROOT_KEY {
                return Err(SonError::StructureMismatch(
                    "the first container must be named \"root\"",
                ));
            }
        } else {
            self.check_parent()?;
        }
        if self.stack.is_full() {
            return Err(SonError::DepthExceeded {
                limit: self.stack.limit(),
            });
        }

        let key = encode_key(key);
        let stream = self.stream()?;
        let start = stream.stream_position()?;
        let mut rec = Vec::with_capacity((HEADER_LEN + CONTAINER_HEADER_LEN) as usize);
        rec.extend_from_slice(&RecordHeader::new(kind.tag(), key, OPEN_LEN).encode());
        if kind != FrameKind::Data {
            rec.extend_from_slice(
                &ContainerHeader {
                    fixed_size,
                    count: 0,
                }
                .encode(),
            );
        }
        stream.write_all(&rec)?;

        self.stack.increment_top();
        self.stack.push(kind, start, fixed_size)?;
        if is_root {
            self.root_opened = true;
        }
        debug!(
            "Opened {} '{}' at offset {} (depth {})",
            kind.tag().name(),
            key,
            start,
            self.stack.depth()
        );
        Ok(())
    }

    /// Backpatch the top frame's header and pop it.
    fn close_container(&mut self, kind: FrameKind) -> Result<u32> {
        self.ensure_mode(&[Mode::Write], NOT_WRITABLE)?;
        let frame = self.stack.check_top(kind)?;
        let stream = self.stream()?;
        let end = stream.stream_position()?;
        let len = payload_len_u32(end - frame.start - HEADER_LEN)?;

        let mut patch = Vec::with_capacity(12);
        patch.extend_from_slice(&len.to_le_bytes());
        if kind != FrameKind::Data {
            patch.extend_from_slice(
                &ContainerHeader {
                    fixed_size: frame.fixed_size,
                    count: frame.count,
                }
                .encode(),
            );
        }
        stream.seek(SeekFrom::Start(frame.start + LEN_OFFSET))?;
        stream.write_all(&patch)?;
        stream.seek(SeekFrom::Start(end))?;

        self.stack.pop(kind)?;
        debug!(
            "Closed {} at offset {}: {} bytes, count {}",
            kind.tag().name(),
            frame.start,
            len,
            frame.count
        );
        Ok(frame.count)
    }
}

fn encode_key(name: &str) -> Key {
    let (key, truncated) = Key::truncate(name);
    if truncated {
        warn!("Key '{}' truncated to '{}'", name, key);
    }
    key
}

/// Walk the chain of open containers from the root and rebuild their frames.
fn open_chain<S: Read + Seek>(stream: &mut S, end: u64) -> Result<Vec<Frame>> {
    let root = read_header_at(stream, 0, end)?;
    if !root.tag.is_container() || root.key.as_bytes() != ROOT_KEY.as_bytes() {
        return Err(SonError::Corrupt("first record is not the root container".into()));
    }
    if !root.is_open() {
        return Err(SonError::NotAppendable("the root container is closed"));
    }

    let mut frames = Vec::new();
    let mut at = 0u64;
    let mut hdr = root;
    loop {
        let kind = match FrameKind::from_tag(hdr.tag) {
            Some(FrameKind::Data) => {
                return Err(SonError::NotAppendable("a data record was left open"));
            }
            Some(k) => k,
            None => {
                return Err(SonError::Corrupt(format!(
                    "{} record at offset {} has an open length",
                    hdr.tag.name(),
                    at
                )));
            }
        };
        let ch = read_container_at(stream, at, end)?;
        let mut pos = at + HEADER_LEN + CONTAINER_HEADER_LEN;
        let mut count = 0u32;
        let mut open_child = None;
        while pos < end {
            let child = read_header_at(stream, pos, end)?;
            count += 1;
            if child.is_open() {
                open_child = Some((pos, child));
                break;
            }
            pos += HEADER_LEN + child.len as u64;
            if pos > end {
                return Err(SonError::Corrupt(format!(
                    "record '{}' overruns the end of the document",
                    child.key
                )));
            }
        }
        frames.push(Frame {
            kind,
            start: at,
            fixed_size: ch.fixed_size,
            count,
        });
        match open_child {
            Some((p, h)) => {
                at = p;
                hdr = h;
            }
            None => break,
        }
    }

    match frames.last() {
        Some(f) if f.kind == FrameKind::Array && f.fixed_size == 0 => Ok(frames),
        Some(f) if f.kind == FrameKind::Array => Err(SonError::NotAppendable(
            "the trailing open array has a fixed size",
        )),
        _ => Err(SonError::NotAppendable(
            "the innermost open container is not an array",
        )),
    }
}
