//! Engine configuration: the write depth bound and JSON export layout.

use anyhow::Result;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};
use std::path::Path;

use crate::consts::{DEFAULT_JSON_INDENT, DEFAULT_STACK_SIZE};

fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE
}

fn default_json_indent() -> usize {
    DEFAULT_JSON_INDENT
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct SonConfig {
    /// Maximum number of containers (and data records) open at once while writing.
    #[serde(default = "default_stack_size")]
    pub stack_size: usize,
    /// Spaces per nesting level in exported JSON; 0 emits compact JSON.
    #[serde(default = "default_json_indent")]
    pub json_indent: usize,
}

impl Default for SonConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            json_indent: DEFAULT_JSON_INDENT,
        }
    }
}

impl SonConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.stack_size == Some(0) {
            return Err("stack_size must be at least 1".to_string());
        }
        Ok(())
    }
}

impl SonConfig {
    pub fn builder() -> SonConfigBuilder {
        SonConfigBuilder::default()
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: SonConfig = serde_json::from_reader(reader)?;
        if config.stack_size == 0 {
            anyhow::bail!("stack_size must be at least 1");
        }
        Ok(config)
    }

    /// Prints out the configuration for command line output.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  Stack Size: {}", self.stack_size);
        println!("  JSON Indent: {}", self.json_indent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_and_validation() {
        let cfg = SonConfig::builder().stack_size(3usize).build().unwrap();
        assert_eq!(cfg.stack_size, 3);
        assert_eq!(cfg.json_indent, DEFAULT_JSON_INDENT);
        assert!(SonConfig::builder().stack_size(0usize).build().is_err());
    }

    #[test]
    fn file_roundtrip_and_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("son.json");
        let cfg = SonConfig {
            stack_size: 6,
            json_indent: 2,
        };
        cfg.save_to_file(&path).unwrap();
        assert_eq!(SonConfig::from_file(&path).unwrap(), cfg);

        std::fs::write(&path, r#"{"stack_size": 2}"#).unwrap();
        let partial = SonConfig::from_file(&path).unwrap();
        assert_eq!(partial.stack_size, 2);
        assert_eq!(partial.json_indent, DEFAULT_JSON_INDENT);
    }
}
