//! Audit sink configuration, read from the `[audit]` table of a TOML file.
//!
//! ```toml
//! [audit]
//! sink = "jsonl"
//! path = ".club/audit.jsonl"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::jsonl::JsonlAuditWriter;
use crate::writer::{AuditWriter, InMemoryAuditWriter};

/// Which writer backs the audit trail.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditSink {
    /// Process-local list; lost on exit.
    #[default]
    Memory,
    /// Hash-chained JSONL file at `path`.
    Jsonl,
}

/// Audit configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditConfig {
    #[serde(default)]
    pub sink: AuditSink,

    /// Log file location, used by the `jsonl` sink.
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sink: AuditSink::default(),
            path: default_log_path(),
        }
    }
}

impl AuditSink {
    /// Whether entries written to this sink survive the process.
    pub fn is_persistent(&self) -> bool {
        matches!(self, AuditSink::Jsonl)
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from(".club/audit.jsonl")
}

/// On-disk layout: the audit section is one table of a larger file.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    audit: AuditConfig,
}

impl AuditConfig {
    /// Parse the `[audit]` table from TOML text. A missing table yields defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.audit)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, AuditError> {
        let content = std::fs::read_to_string(path).map_err(|e| AuditError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| AuditError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load from file if it exists, otherwise use defaults.
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, AuditError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Construct the configured writer.
    pub fn open_writer(&self) -> Result<Box<dyn AuditWriter>, AuditError> {
        match self.sink {
            AuditSink::Memory => Ok(Box::new(InMemoryAuditWriter::new())),
            AuditSink::Jsonl => Ok(Box::new(JsonlAuditWriter::open(&self.path)?)),
        }
    }
}
