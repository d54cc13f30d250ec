//! Bounded stack of open containers.
//!
//! Each frame remembers where its record header starts so that closing the
//! container can backpatch the payload length and element count.

use crate::error::{Result, SonError};
use crate::header::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Object,
    Array,
    Data,
}

impl FrameKind {
    pub fn tag(self) -> Tag {
        match self {
            FrameKind::Object => Tag::Obj,
            FrameKind::Array => Tag::Array,
            FrameKind::Data => Tag::Data,
        }
    }

    pub fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Obj => Some(FrameKind::Object),
            Tag::Array => Some(FrameKind::Array),
            Tag::Data => Some(FrameKind::Data),
            _ => None,
        }
    }

    fn mismatch(self) -> &'static str {
        match self {
            FrameKind::Object => "close_obj called but the open record is not an object",
            FrameKind::Array => "close_array called but the open record is not an array",
            FrameKind::Data => "close_data called but the open record is not a data record",
        }
    }
}

/// One open container (or data record).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    /// Stream offset of the record header.
    pub start: u64,
    /// Declared capacity for arrays, 0 when open-ended.
    pub fixed_size: u32,
    /// Children written so far; bytes written for data records.
    pub count: u32,
}

impl Frame {
    pub fn is_full(&self) -> bool {
        self.kind == FrameKind::Array && self.fixed_size != 0 && self.count >= self.fixed_size
    }
}

#[derive(Debug, Clone)]
pub struct Stack {
    frames: Vec<Frame>,
    limit: usize,
}

impl Stack {
    pub fn new(limit: usize) -> Self {
        Self {
            frames: Vec::with_capacity(limit),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.limit
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn push(&mut self, kind: FrameKind, start: u64, fixed_size: u32) -> Result<()> {
        if self.is_full() {
            return Err(SonError::DepthExceeded { limit: self.limit });
        }
        self.frames.push(Frame {
            kind,
            start,
            fixed_size,
            count: 0,
        });
        Ok(())
    }

    /// Restore a frame read back from an existing document.
    pub fn restore(&mut self, frame: Frame) -> Result<()> {
        if self.is_full() {
            return Err(SonError::DepthExceeded { limit: self.limit });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// The top frame, provided it has the `expected` kind.
    pub fn check_top(&self, expected: FrameKind) -> Result<Frame> {
        match self.frames.last() {
            Some(top) if top.kind == expected => Ok(*top),
            Some(_) => Err(SonError::StructureMismatch(expected.mismatch())),
            None => Err(SonError::StructureMismatch("no open container to close")),
        }
    }

    pub fn pop(&mut self, expected: FrameKind) -> Result<Frame> {
        self.check_top(expected)?;
        self.frames
            .pop()
            .ok_or(SonError::StructureMismatch("no open container to close"))
    }

    pub fn increment_top(&mut self) {
        if let Some(f) = self.frames.last_mut() {
            f.count = f.count.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_is_bounded() {
        let mut s = Stack::new(2);
        s.push(FrameKind::Object, 0, 0).unwrap();
        s.push(FrameKind::Array, 21, 0).unwrap();
        s.increment_top();
        let err = s.push(FrameKind::Object, 40, 0).unwrap_err();
        assert!(matches!(err, SonError::DepthExceeded { limit: 2 }));
        assert_eq!(s.depth(), 2);
        assert_eq!(s.top().unwrap().count, 1);
    }

    #[test]
    fn pop_checks_kind() {
        let mut s = Stack::new(4);
        s.push(FrameKind::Object, 0, 0).unwrap();
        assert!(matches!(
            s.pop(FrameKind::Array),
            Err(SonError::StructureMismatch(_))
        ));
        let f = s.pop(FrameKind::Object).unwrap();
        assert_eq!(f.start, 0);
        assert!(s.is_empty());
        assert!(matches!(
            s.pop(FrameKind::Object),
            Err(SonError::StructureMismatch(_))
        ));
    }

    #[test]
    fn increment_on_empty_is_noop() {
        let mut s = Stack::new(1);
        s.increment_top();
        assert!(s.is_empty());
    }

    #[test]
    fn fixed_arrays_report_full() {
        let mut s = Stack::new(2);
        s.push(FrameKind::Array, 0, 2).unwrap();
        assert!(!s.top().unwrap().is_full());
        s.increment_top();
        s.increment_top();
        assert!(s.top().unwrap().is_full());
    }
}
