// writer.rs — The audit writer port and its in-memory implementation.
//
// `AuditWriter` is the seam between the policy core and storage. Production
// wiring injects a durable implementation (see `JsonlAuditWriter`); tests and
// local development use `InMemoryAuditWriter`.
//
// Contract for every implementation:
// - an entry is readable before `write` returns (no silent drops),
// - entries written sequentially by one caller keep their order,
// - failures are returned, never swallowed.

use std::sync::{Mutex, MutexGuard};

use club_policy::{PolicyDecisionRequest, PolicyDecisionResponse};

use crate::entry::AuditEntry;
use crate::error::AuditError;

/// Durable sink for audit entries.
///
/// Implementations take `&self` and must be safe to share across request
/// handlers, so any internal state needs its own synchronization.
pub trait AuditWriter: Send + Sync {
    /// Persist one entry.
    fn write(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

impl<W: AuditWriter + ?Sized> AuditWriter for Box<W> {
    fn write(&self, entry: AuditEntry) -> Result<(), AuditError> {
        (**self).write(entry)
    }
}

impl<W: AuditWriter + ?Sized> AuditWriter for std::sync::Arc<W> {
    fn write(&self, entry: AuditEntry) -> Result<(), AuditError> {
        (**self).write(entry)
    }
}

/// Ordered in-memory audit store for tests and development.
///
/// Appends are serialized by a mutex, so concurrent writers never lose or
/// interleave entries.
#[derive(Debug, Default)]
pub struct InMemoryAuditWriter {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every stored entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // `Vec::push` never leaves the list half-updated, so a poisoned lock
    // still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, Vec<AuditEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AuditWriter for InMemoryAuditWriter {
    fn write(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.lock().push(entry);
        Ok(())
    }
}

/// Honor the `require_audit` obligation of a decision.
///
/// Writes an entry (with route and client hashes as metadata) exactly when
/// the response demands it. Returns whether an entry was written.
pub fn record_decision<W: AuditWriter + ?Sized>(
    writer: &W,
    request: &PolicyDecisionRequest,
    response: &PolicyDecisionResponse,
) -> Result<bool, AuditError> {
    if !response.requires_audit() {
        return Ok(false);
    }
    let entry = AuditEntry::from_decision(request, response).with_context_metadata(request);
    writer.write(entry)?;
    Ok(true)
}
