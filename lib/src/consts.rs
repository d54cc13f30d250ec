//! Layout constants for the SON record format.

/// Usable bytes in a key. Longer keys are truncated.
pub const KEY_WIDTH: usize = 7;
/// Bytes reserved for a key on disk (usable bytes plus a terminating NUL).
pub const KEY_FIELD: usize = KEY_WIDTH + 1;

// record header: tag(1) key(8) payload length(4)
pub const TAG_OFFSET: u64 = 0;
pub const LEN_OFFSET: u64 = (1 + KEY_FIELD) as u64;
pub const HEADER_LEN: u64 = LEN_OFFSET + 4;

/// Container payloads start with fixed_size(4) and count(4).
pub const CONTAINER_HEADER_LEN: u64 = 8;

/// Payload length written while a record is still open.
pub const OPEN_LEN: u32 = u32::MAX;

/// Key the outermost container must carry.
pub const ROOT_KEY: &str = "root";

pub const DEFAULT_STACK_SIZE: usize = 8;
pub const DEFAULT_JSON_INDENT: usize = 4;
