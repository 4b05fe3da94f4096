// error.rs — Failure modes of audit writers and their configuration.
//
// Every writer returns these to its caller instead of dropping entries.
// Whether a failed audit write blocks the audited action is the host's call.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// The log file (or its parent directory) could not be opened or created.
    #[error("cannot open audit log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error while appending or reading records.
    #[error("audit log I/O failed: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// A record could not be encoded, or a line in the log is not a record.
    #[error("malformed audit record: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A record's `previous_hash` does not match the line before it.
    #[error("audit chain broken at line {line}: expected previous_hash {expected}, found {actual}")]
    IntegrityViolation {
        line: usize,
        expected: String,
        actual: String,
    },

    /// An earlier append failed mid-way; the writer refuses to extend a chain
    /// whose tail on disk it no longer knows. Reopen the log to continue.
    #[error("audit writer disabled after an earlier I/O failure; reopen the log")]
    WriterFailed,

    /// A thread panicked while appending.
    #[error("audit writer lock poisoned")]
    LockPoisoned,

    /// The `[audit]` configuration could not be read or parsed.
    #[error("invalid audit config at {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}
