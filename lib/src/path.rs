//! Access expressions used by `read_*`, `seek` and `edit_*`.
//!
//! ```text
//! path  := "" | first rest*
//! first := key | index
//! rest  := "." key | index
//! index := "[" digits "]"
//! ```
//!
//! Paths are evaluated from inside the root container, so `"stuff.hour"`
//! names `hour` inside the object `stuff`, and `"samples[2]"` the third
//! element of `samples`. Key segments are truncated like written keys.

use crate::key::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Key(Key),
    Index(u32),
}

/// Parse an access expression. Returns `None` when the expression is malformed.
pub fn parse(access: &str) -> Option<Vec<Segment>> {
    let bytes = access.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'[' {
            let close = i + 1 + access[i + 1..].find(']')?;
            let digits = &access[i + 1..close];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            out.push(Segment::Index(digits.parse().ok()?));
            i = close + 1;
            continue;
        }
        if !out.is_empty() {
            if bytes[i] != b'.' {
                return None;
            }
            i += 1;
        }
        let end = access[i..]
            .find(['.', '[', ']'])
            .map(|p| p + i)
            .unwrap_or(bytes.len());
        if end == i {
            return None;
        }
        out.push(Segment::Key(Key::new(&access[i..end])));
        i = end;
    }
    Some(out)
}
