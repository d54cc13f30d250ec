//! Error type shared by the SON writer, reader and editor.

use std::fmt;

/// Errors that can arise while creating, appending, reading or editing a SON document.
#[derive(Debug)]
pub enum SonError {
    /// Underlying stream failure. The current operation is aborted and the
    /// document state is left untouched.
    Io(std::io::Error),
    /// Opening another container would exceed the configured stack size.
    DepthExceeded { limit: usize },
    /// Calls were issued out of order: mismatched open/close, a write with no
    /// open container, a second root, or a type-changing edit.
    StructureMismatch(&'static str),
    /// `append` was requested on a document that has no open-ended trailing array.
    NotAppendable(&'static str),
    /// A fixed-size array is full, or an edit does not fit the stored record.
    SizeExceeded { capacity: u32 },
    /// The access expression does not resolve to a record.
    PathNotFound(String),
    /// The stream does not hold a well-formed SON document.
    Corrupt(String),
}

impl SonError {
    /// True if this is the "not found" sentinel returned by read accessors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SonError::PathNotFound(_))
    }
}

impl fmt::Display for SonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SonError::Io(e) => write!(f, "{}", e),
            SonError::DepthExceeded { limit } => {
                write!(f, "stack depth limit of {} exceeded", limit)
            }
            SonError::StructureMismatch(m) => write!(f, "structure mismatch: {}", m),
            SonError::NotAppendable(m) => write!(f, "document is not appendable: {}", m),
            SonError::SizeExceeded { capacity } => {
                write!(f, "size exceeded (capacity {})", capacity)
            }
            SonError::PathNotFound(p) => write!(f, "path not found: '{}'", p),
            SonError::Corrupt(m) => write!(f, "corrupt document: {}", m),
        }
    }
}

impl std::error::Error for SonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SonError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SonError {
    fn from(e: std::io::Error) -> Self {
        SonError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, SonError>;
