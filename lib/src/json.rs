//! JSON export.
//!
//! The root container becomes the top-level JSON value. Numbers are
//! written as quoted strings (the same text `read_str` returns), data as
//! Base64 strings, booleans and null as JSON literals. Keys of array
//! elements are dropped. Output for a given document is deterministic.
//!
//! ```text
//! {
//!     "name": "Stratify",
//!     "value": "100",
//!     "stuff": {
//!         "hour": "12"
//!     }
//! }
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::Path;

use log::info;

use crate::document::Son;
use crate::error::Result;
use crate::header::Tag;
use crate::reader::{Entry, Visit};
use crate::value::Value;

struct JsonEmitter<W> {
    out: W,
    indent: usize,
    /// One flag per open container: true once it has emitted a child.
    has_items: Vec<bool>,
    /// One flag per open container: true for arrays.
    in_array: Vec<bool>,
}

impl<W: Write> JsonEmitter<W> {
    fn newline(&mut self, depth: usize) -> io::Result<()> {
        if self.indent > 0 {
            writeln!(self.out)?;
            write!(self.out, "{:width$}", "", width = depth * self.indent)?;
        }
        Ok(())
    }

    fn string(&mut self, s: &str) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, s).map_err(io::Error::from)
    }

    /// Separator, indentation and key (unless inside an array) for a new child.
    fn begin_item(&mut self, entry: &Entry) -> io::Result<()> {
        let depth = self.has_items.len();
        let Some(first) = self.has_items.last_mut().map(|f| !std::mem::replace(f, true)) else {
            return Ok(());
        };
        if !first {
            self.out.write_all(b",")?;
        }
        self.newline(depth)?;
        if self.in_array.last() == Some(&false) {
            self.string(&entry.key().as_str())?;
            self.out
                .write_all(if self.indent > 0 { b": " } else { b":" })?;
        }
        Ok(())
    }

    fn visit(&mut self, v: Visit<'_>) -> io::Result<()> {
        match v {
            Visit::Enter(entry, _) => {
                self.begin_item(entry)?;
                let is_array = entry.tag() == Tag::Array;
                self.out.write_all(if is_array { b"[" } else { b"{" })?;
                self.has_items.push(false);
                self.in_array.push(is_array);
            }
            Visit::Leaf(entry, value) => {
                self.begin_item(entry)?;
                match value {
                    Value::Bool(b) => write!(self.out, "{}", b)?,
                    Value::Null => self.out.write_all(b"null")?,
                    other => self.string(&other.to_text())?,
                }
            }
            Visit::Exit(entry) => {
                let had_items = self.has_items.pop().unwrap_or(false);
                self.in_array.pop();
                if had_items {
                    self.newline(self.has_items.len())?;
                }
                self.out
                    .write_all(if entry.tag() == Tag::Array { b"]" } else { b"}" })?;
                if self.has_items.is_empty() && self.indent > 0 {
                    writeln!(self.out)?;
                }
            }
        }
        Ok(())
    }
}

impl<S: Read + Seek> Son<S> {
    /// Export the whole document as JSON text.
    pub fn to_json<W: Write>(&mut self, out: W) -> Result<()> {
        let mut emitter = JsonEmitter {
            out,
            indent: self.json_indent,
            has_items: Vec::new(),
            in_array: Vec::new(),
        };
        self.walk(|v| Ok(emitter.visit(v)?))?;
        emitter.out.flush()?;
        Ok(())
    }

    pub fn to_json_string(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        self.to_json(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn to_json_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let f = File::create(path.as_ref())?;
        self.to_json(BufWriter::new(f))?;
        info!("Exported JSON to {}", path.as_ref().display());
        Ok(())
    }
}
