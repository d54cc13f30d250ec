//! Fixed-width key field.
//!
//! Keys occupy [`KEY_FIELD`] bytes on disk. Names longer than [`KEY_WIDTH`]
//! bytes are truncated (at a UTF-8 character boundary) rather than rejected,
//! so two names sharing their first seven bytes map to the same key.

use std::borrow::Cow;
use std::fmt;

use crate::consts::{KEY_FIELD, KEY_WIDTH};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Key {
    field: [u8; KEY_FIELD],
}

impl Key {
    /// Encode `name` into a key field, truncating silently.
    pub fn new(name: &str) -> Self {
        Self::truncate(name).0
    }

    /// Encode `name` and report whether it had to be truncated.
    pub fn truncate(name: &str) -> (Self, bool) {
        let mut end = name.len().min(KEY_WIDTH);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        let mut field = [0u8; KEY_FIELD];
        field[..end].copy_from_slice(&name.as_bytes()[..end]);
        (Self { field }, end < name.len())
    }

    /// Parse an on-disk key field. The terminating byte must be NUL.
    pub fn from_field(raw: &[u8]) -> Option<Self> {
        if raw.len() < KEY_FIELD || raw[KEY_WIDTH] != 0 {
            return None;
        }
        let mut field = [0u8; KEY_FIELD];
        field.copy_from_slice(&raw[..KEY_FIELD]);
        Some(Self { field })
    }

    pub fn as_field(&self) -> &[u8; KEY_FIELD] {
        &self.field
    }

    /// Key bytes up to the first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let n = self.field.iter().position(|&b| b == 0).unwrap_or(KEY_WIDTH);
        &self.field[..n]
    }

    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn is_empty(&self) -> bool {
        self.field[0] == 0
    }

    /// FNV-1a hash of the key field. Path lookups compare fingerprints
    /// before comparing bytes.
    pub fn fingerprint(&self) -> u32 {
        let mut h: u32 = 0x811c_9dc5;
        for &b in &self.field {
            h ^= b as u32;
            h = h.wrapping_mul(0x0100_0193);
        }
        h
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.as_str())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_keys_are_nul_padded() {
        let k = Key::new("hour");
        assert_eq!(k.as_field(), b"hour\0\0\0\0");
        assert_eq!(k.as_str(), "hour");
    }

    #[test]
    fn long_keys_truncate_to_seven_bytes() {
        let (k, truncated) = Key::truncate("temperature");
        assert!(truncated);
        assert_eq!(k.as_str(), "tempera");
        assert_eq!(k, Key::new("tempera"));
        assert_eq!(k.fingerprint(), Key::new("tempera").fingerprint());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes; the 7-byte cut would split the fourth one
        let k = Key::new("ééééé");
        assert_eq!(k.as_str(), "ééé");
        assert_eq!(k.as_bytes().len(), 6);
    }

    #[test]
    fn shared_prefix_collides() {
        assert_eq!(Key::new("sensor_a1"), Key::new("sensor_b2"));
        assert_eq!(
            Key::new("sensor_a1").fingerprint(),
            Key::new("sensor_").fingerprint()
        );
        assert_ne!(Key::new("sensor1"), Key::new("sensor2"));
    }

    #[test]
    fn from_field_requires_terminator() {
        assert!(Key::from_field(b"abcdefgh").is_none());
        assert_eq!(Key::from_field(b"abc\0\0\0\0\0"), Some(Key::new("abc")));
    }
}
