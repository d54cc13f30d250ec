//! son: Stratify Object Notation.
//!
//! SON stores hierarchical key/value data (much like JSON or BSON) in a
//! compact binary stream that can be written incrementally on memory
//! constrained systems and read back by path without loading the whole
//! document.
//!
//! Things to keep in mind:
//! - keys are limited to 7 bytes; longer names are truncated silently
//! - the stack size given to [`Son::new`] bounds nesting depth when writing
//! - only documents left with an open-ended trailing array can be appended to
//! - strings and data records never change length once written
//! - the first container must be named `"root"`
//!
//! Create a document
//!
//! ```no_run
//! use son::Son;
//!
//! let mut son = Son::new(4);
//! son.create_file("settings.son").unwrap();
//! son.open_obj("root").unwrap();
//! son.write("name", "Stratify").unwrap();
//! son.write("date", "today").unwrap();
//! son.write("value", 100u32).unwrap();
//! son.open_obj("stuff").unwrap();
//! son.write("hour", 12).unwrap();
//! son.write("min", 0).unwrap();
//! son.write("sec", 59).unwrap();
//! son.close_obj().unwrap();
//! son.close_obj().unwrap();
//! son.close(false).unwrap();
//! ```
//!
//! Read it back and export it
//!
//! ```no_run
//! use son::Son;
//!
//! let mut son = Son::new(4);
//! son.open_file("settings.son").unwrap();
//! assert_eq!(son.read_str("name").unwrap(), "Stratify");
//! assert_eq!(son.read_unum("stuff.hour").unwrap(), 12);
//! assert_eq!(son.read_str("stuff.sec").unwrap(), "59");
//! son.to_json_file("settings.json").unwrap();
//! son.close(false).unwrap();
//! ```

pub mod config;
pub mod consts;
pub mod document;
pub mod edit;
pub mod error;
pub mod header;
pub mod json;
pub mod key;
pub mod path;
pub mod reader;
pub mod stack;
pub mod value;
pub mod writer;

pub use config::SonConfig;
pub use document::{Mode, Son};
pub use error::{Result, SonError};
pub use header::Tag;
pub use key::Key;
pub use reader::{Entry, Visit};
pub use value::{Scalar, Value};

/// Initializes logging for the son library.
///
/// If `SON_LOG` is set, `RUST_LOG` is set to its value, so `SON_LOG` takes
/// precedence. The logger itself (e.g. `env_logger::init()`) must be
/// initialized after this call.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("SON_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}
