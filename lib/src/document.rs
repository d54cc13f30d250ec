//! The [`Son`] engine: one document session over one stream.
//!
//! A `Son` starts [`Mode::Closed`]. `create`/`append` move it to
//! [`Mode::Write`], `open` to [`Mode::Read`] and `edit` to [`Mode::Edit`];
//! `close` hands the stream back and returns to `Closed`. Writing methods
//! live in `writer.rs`, lookups in `reader.rs`, JSON export in `json.rs`
//! and in-place updates in `edit.rs`.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::info;

use crate::config::SonConfig;
use crate::error::{Result, SonError};
use crate::stack::Stack;

/// Session state of a [`Son`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Closed,
    Write,
    Read,
    Edit,
}

/// A SON document bound to at most one stream at a time.
///
/// The stack size bounds nesting depth while writing; reading does not need
/// the stack and can traverse arbitrarily deep documents.
#[derive(Debug)]
pub struct Son<S> {
    pub(crate) stream: Option<S>,
    pub(crate) mode: Mode,
    pub(crate) stack: Stack,
    /// Set once the root container has been opened in the current session.
    pub(crate) root_opened: bool,
    /// Stream length captured by `open`/`edit`.
    pub(crate) extent: u64,
    pub(crate) json_indent: usize,
}

impl<S> Son<S> {
    /// Create an engine whose write depth is limited to `stack_size`.
    pub fn new(stack_size: usize) -> Self {
        Self::with_config(&SonConfig {
            stack_size,
            ..SonConfig::default()
        })
    }

    pub fn with_config(config: &SonConfig) -> Self {
        Self {
            stream: None,
            mode: Mode::Closed,
            stack: Stack::new(config.stack_size),
            root_opened: false,
            extent: 0,
            json_indent: config.json_indent,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode != Mode::Closed
    }

    /// Number of containers currently open for writing.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn stack_size(&self) -> usize {
        self.stack.limit()
    }

    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    /// Direct access to the stream, e.g. to read a blob in place after `seek`.
    pub fn get_mut(&mut self) -> Option<&mut S> {
        self.stream.as_mut()
    }

    /// Detach the stream without finalizing anything and reset the session.
    ///
    /// Containers still open in write mode keep their placeholder headers.
    pub fn release(&mut self) -> Option<S> {
        self.mode = Mode::Closed;
        self.stack.clear();
        self.root_opened = false;
        self.extent = 0;
        self.stream.take()
    }

    pub(crate) fn stream(&mut self) -> Result<&mut S> {
        self.stream
            .as_mut()
            .ok_or(SonError::StructureMismatch("document is not open"))
    }

    pub(crate) fn ensure_closed(&self) -> Result<()> {
        if self.mode != Mode::Closed {
            return Err(SonError::StructureMismatch(
                "a document is already open; close it first",
            ));
        }
        Ok(())
    }

    pub(crate) fn ensure_mode(&self, allowed: &[Mode], msg: &'static str) -> Result<()> {
        if allowed.contains(&self.mode) {
            Ok(())
        } else {
            Err(SonError::StructureMismatch(msg))
        }
    }

    pub(crate) fn begin(&mut self, stream: S, mode: Mode) {
        self.stream = Some(stream);
        self.mode = mode;
        self.stack.clear();
        self.root_opened = false;
    }
}

impl Son<File> {
    /// Create (or truncate) the file at `path` and start writing.
    pub fn create_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.ensure_closed()?;
        let f = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        info!("Creating SON file {}", path.as_ref().display());
        self.create(f)
    }

    /// Reopen an open-ended document at `path` for further writing.
    pub fn append_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.ensure_closed()?;
        let f = OpenOptions::new().read(true).write(true).open(path.as_ref())?;
        info!("Appending to SON file {}", path.as_ref().display());
        self.append(f)
    }

    /// Open the document at `path` read-only.
    pub fn open_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.ensure_closed()?;
        let f = File::open(path.as_ref())?;
        info!("Opening SON file {}", path.as_ref().display());
        self.open(f)
    }

    /// Open the document at `path` for in-place edits.
    pub fn edit_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.ensure_closed()?;
        let f = OpenOptions::new().read(true).write(true).open(path.as_ref())?;
        info!("Editing SON file {}", path.as_ref().display());
        self.edit(f)
    }
}
