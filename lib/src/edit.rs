//! In-place edits of a closed document.
//!
//! Records keep their stored length and value family: numbers are
//! overwritten with a number of the same type, booleans may flip between
//! `true` and `false`, and strings or data are overwritten inside their
//! existing payload (shorter strings are NUL padded).

use std::io::{Read, Seek, SeekFrom, Write};

use log::debug;

use crate::document::{Mode, Son};
use crate::error::{Result, SonError};
use crate::header::Tag;
use crate::reader::Entry;

const NOT_EDITABLE: &str = "document is not open for editing";
const TYPE_CHANGE: &str = "edit would change the record type";

impl<S: Read + Write + Seek> Son<S> {
    /// Open a document for in-place edits. Reads are allowed as well.
    pub fn edit(&mut self, stream: S) -> Result<()> {
        self.open(stream)?;
        self.mode = Mode::Edit;
        Ok(())
    }

    pub fn edit_num(&mut self, access: &str, v: i32) -> Result<()> {
        let entry = self.editable(access, &[Tag::Num])?;
        self.overwrite(entry.payload_start(), &v.to_le_bytes())
    }

    pub fn edit_unum(&mut self, access: &str, v: u32) -> Result<()> {
        let entry = self.editable(access, &[Tag::Unum])?;
        self.overwrite(entry.payload_start(), &v.to_le_bytes())
    }

    pub fn edit_float(&mut self, access: &str, v: f32) -> Result<()> {
        let entry = self.editable(access, &[Tag::Float])?;
        self.overwrite(entry.payload_start(), &v.to_le_bytes())
    }

    /// Flip a boolean by rewriting its tag byte.
    pub fn edit_bool(&mut self, access: &str, v: bool) -> Result<()> {
        let entry = self.editable(access, &[Tag::True, Tag::False])?;
        let tag = if v { Tag::True } else { Tag::False };
        self.overwrite(entry.offset, &[tag as u8])
    }

    /// Replace a string; the new text plus its terminator must fit the stored payload.
    pub fn edit_str(&mut self, access: &str, v: &str) -> Result<()> {
        let entry = self.editable(access, &[Tag::Str])?;
        let capacity = entry.payload_len as usize;
        if v.len() + 1 > capacity {
            return Err(SonError::SizeExceeded {
                capacity: capacity.saturating_sub(1) as u32,
            });
        }
        let mut payload = vec![0u8; capacity];
        payload[..v.len()].copy_from_slice(v.as_bytes());
        self.overwrite(entry.payload_start(), &payload)
    }

    /// Overwrite the leading bytes of a data record.
    pub fn edit_data(&mut self, access: &str, v: &[u8]) -> Result<()> {
        let entry = self.editable(access, &[Tag::Data])?;
        if v.len() as u64 > entry.payload_len {
            return Err(SonError::SizeExceeded {
                capacity: entry.payload_len as u32,
            });
        }
        self.overwrite(entry.payload_start(), v)
    }

    fn editable(&mut self, access: &str, allowed: &[Tag]) -> Result<Entry> {
        self.ensure_mode(&[Mode::Edit], NOT_EDITABLE)?;
        let entry = self.locate(access)?;
        if !allowed.contains(&entry.tag()) {
            return Err(SonError::StructureMismatch(TYPE_CHANGE));
        }
        Ok(entry)
    }

    fn overwrite(&mut self, pos: u64, bytes: &[u8]) -> Result<()> {
        let stream = self.stream()?;
        stream.seek(SeekFrom::Start(pos))?;
        stream.write_all(bytes)?;
        debug!("Edited {} bytes at offset {}", bytes.len(), pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn editable_doc() -> Son<Cursor<Vec<u8>>> {
        let mut son = Son::new(4);
        son.create(Cursor::new(Vec::new())).unwrap();
        son.open_obj("root").unwrap();
        son.write("count", 5u32).unwrap();
        son.write("label", "sensor").unwrap();
        son.write("on", false).unwrap();
        son.close_obj().unwrap();
        let stream = son.close(false).unwrap();
        son.edit(stream).unwrap();
        son
    }

    #[test]
    fn numbers_keep_their_type() {
        let mut son = editable_doc();
        son.edit_unum("count", 6).unwrap();
        assert_eq!(son.read_unum("count").unwrap(), 6);
        assert!(matches!(
            son.edit_num("count", 1),
            Err(SonError::StructureMismatch(_))
        ));
    }

    #[test]
    fn strings_must_fit() {
        let mut son = editable_doc();
        son.edit_str("label", "pin").unwrap();
        assert_eq!(son.read_str("label").unwrap(), "pin");
        assert!(matches!(
            son.edit_str("label", "thermometer"),
            Err(SonError::SizeExceeded { capacity: 6 })
        ));
    }

    #[test]
    fn edits_require_edit_mode() {
        let mut son = editable_doc();
        let stream = son.close(false).unwrap();
        son.open(stream).unwrap();
        assert!(matches!(
            son.edit_bool("on", true),
            Err(SonError::StructureMismatch(_))
        ));
    }
}
