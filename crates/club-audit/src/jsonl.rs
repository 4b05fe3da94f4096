// jsonl.rs — Append-only JSONL audit writer.
//
// The audit log is a JSONL file: one record per line, each record being an
// `AuditEntry` plus `previous_hash`, the SHA-256 of the preceding raw line.
// Inserting, deleting or editing a line breaks the chain, which
// `verify_chain` detects.
//
// Every record goes to the file in a single `write_all` and is synced before
// `write` returns, so a returned `Ok` means the entry is on disk. After any
// I/O failure the writer refuses further appends: the file may end in a
// partial line or in a line the chain state never saw. Reopening the log
// re-derives the chain from what is actually on disk.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::entry::AuditEntry;
use crate::error::AuditError;
use crate::hasher;
use crate::writer::AuditWriter;

/// One line of the JSONL log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    #[serde(flatten)]
    pub entry: AuditEntry,
    /// Hash of the previous line; `None` for the first record.
    #[serde(default)]
    pub previous_hash: Option<String>,
}

/// Byte sink that can push its contents to stable storage.
trait SyncWrite: Write {
    fn sync(&mut self) -> std::io::Result<()>;
}

impl SyncWrite for File {
    fn sync(&mut self) -> std::io::Result<()> {
        self.sync_data()
    }
}

struct ChainState<W> {
    sink: W,
    /// Hash of the last line written — becomes the next record's `previous_hash`.
    last_hash: Option<String>,
    /// Set once an append hit an I/O error; later appends are refused.
    failed: bool,
}

impl<W: SyncWrite> ChainState<W> {
    fn new(sink: W, last_hash: Option<String>) -> Self {
        Self {
            sink,
            last_hash,
            failed: false,
        }
    }

    fn append(&mut self, entry: AuditEntry) -> Result<(), AuditError> {
        if self.failed {
            return Err(AuditError::WriterFailed);
        }

        let record = AuditRecord {
            entry,
            previous_hash: self.last_hash.clone(),
        };
        let json = serde_json::to_string(&record)?;
        let mut line = Vec::with_capacity(json.len() + 1);
        line.extend_from_slice(json.as_bytes());
        line.push(b'\n');

        if let Err(source) = self
            .sink
            .write_all(&line)
            .and_then(|()| self.sink.flush())
            .and_then(|()| self.sink.sync())
        {
            self.failed = true;
            tracing::error!(error = %source, "audit append failed; writer disabled until reopened");
            return Err(AuditError::WriteFailed(source));
        }

        self.last_hash = Some(hasher::hash_str(&json));
        Ok(())
    }
}

/// A file-backed, hash-chained [`AuditWriter`].
pub struct JsonlAuditWriter {
    path: PathBuf,
    state: Mutex<ChainState<File>>,
}

impl JsonlAuditWriter {
    /// Open (or create) an audit log at the given path.
    ///
    /// If the file already exists, the hash of its last line is recovered so
    /// new records link onto the existing chain.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| AuditError::OpenFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let last_hash = if path.exists() {
            read_last_hash(&path)?
        } else {
            None
        };

        // Append mode: existing records are never overwritten.
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            path = %path.display(),
            resumed = last_hash.is_some(),
            "opened audit log"
        );

        Ok(Self {
            path,
            state: Mutex::new(ChainState::new(file, last_hash)),
        })
    }

    /// Return the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records from a log file, oldest first. Blank lines are skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<AuditRecord>, AuditError> {
        let mut records = Vec::new();
        for line in open_lines(path.as_ref())? {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    /// Verify the hash chain of a log file.
    ///
    /// Returns the number of records checked, or `IntegrityViolation` naming
    /// the first line whose `previous_hash` does not match its predecessor.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<usize, AuditError> {
        verify_lines(open_lines(path.as_ref())?)
    }
}

impl AuditWriter for JsonlAuditWriter {
    fn write(&self, entry: AuditEntry) -> Result<(), AuditError> {
        // A poisoned lock means a panic mid-append; the chain state is unknown.
        let mut state = self.state.lock().map_err(|_| AuditError::LockPoisoned)?;
        state.append(entry)
    }
}

fn verify_lines<I>(lines: I) -> Result<usize, AuditError>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    let mut previous_hash: Option<String> = None;
    let mut count = 0;

    for (line_num, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: AuditRecord = serde_json::from_str(&line)?;
        if record.previous_hash != previous_hash {
            return Err(AuditError::IntegrityViolation {
                line: line_num + 1,
                expected: previous_hash.unwrap_or_else(|| "None".to_string()),
                actual: record.previous_hash.unwrap_or_else(|| "None".to_string()),
            });
        }

        // Hash the raw line, not a re-serialization: field order must not matter.
        previous_hash = Some(hasher::hash_str(&line));
        count += 1;
    }

    Ok(count)
}

fn open_lines(path: &Path) -> Result<std::io::Lines<BufReader<File>>, AuditError> {
    let file = File::open(path).map_err(|source| AuditError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file).lines())
}

fn read_last_hash(path: &Path) -> Result<Option<String>, AuditError> {
    let mut last_line: Option<String> = None;
    for line in open_lines(path)? {
        let line = line?;
        if !line.trim().is_empty() {
            last_line = Some(line);
        }
    }
    Ok(last_line.map(|line| hasher::hash_str(&line)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::sample_request;
    use club_policy::{evaluate_policy, Capability, RequestId};
    use tempfile::tempdir;

    fn entry(request_id: &str) -> AuditEntry {
        let mut req = sample_request("org1", "org1");
        req.context.request_id = RequestId::new(request_id);
        let response = evaluate_policy(&req, &[Capability::ReservationRead]);
        AuditEntry::from_decision(&req, &response)
    }

    /// In-memory sink that fails on a chosen append, at a chosen stage.
    #[derive(Default)]
    struct FaultySink {
        bytes: Vec<u8>,
        appends: usize,
        fail_on: usize,
        /// Fail after half the line has been accepted instead of at sync.
        tear_line: bool,
    }

    impl Write for FaultySink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.appends += 1;
            if self.tear_line && self.appends == self.fail_on {
                let half = buf.len() / 2;
                self.bytes.extend_from_slice(&buf[..half]);
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SyncWrite for FaultySink {
        fn sync(&mut self) -> std::io::Result<()> {
            if !self.tear_line && self.appends == self.fail_on {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "fsync failed"));
            }
            Ok(())
        }
    }

    fn lines_of(bytes: &[u8]) -> Vec<std::io::Result<String>> {
        String::from_utf8_lossy(bytes)
            .lines()
            .map(|l| Ok(l.to_string()))
            .collect()
    }

    #[test]
    fn sync_failure_disables_writer_and_keeps_chain_valid() {
        let mut chain = ChainState::new(
            FaultySink {
                fail_on: 2,
                ..FaultySink::default()
            },
            None,
        );

        chain.append(entry("req-1")).unwrap();
        assert!(matches!(
            chain.append(entry("req-2")),
            Err(AuditError::WriteFailed(_))
        ));
        // The second line reached the sink, but nothing may be chained after it.
        assert!(matches!(
            chain.append(entry("req-3")),
            Err(AuditError::WriterFailed)
        ));

        assert_eq!(verify_lines(lines_of(&chain.sink.bytes).into_iter()).unwrap(), 2);
    }

    #[test]
    fn torn_line_is_never_followed_by_another_record() {
        let mut chain = ChainState::new(
            FaultySink {
                fail_on: 2,
                tear_line: true,
                ..FaultySink::default()
            },
            None,
        );

        chain.append(entry("req-1")).unwrap();
        assert!(chain.append(entry("req-2")).is_err());
        assert!(matches!(
            chain.append(entry("req-3")),
            Err(AuditError::WriterFailed)
        ));

        // Exactly one complete record, then the torn remainder with no newline.
        let text = String::from_utf8(chain.sink.bytes.clone()).unwrap();
        assert_eq!(text.matches('\n').count(), 1);
        assert!(!text.ends_with('\n'));
        assert!(!text.contains("req-3"));
    }

    #[test]
    fn reopen_after_failure_resumes_from_disk() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");

        {
            let writer = JsonlAuditWriter::open(&log_path).unwrap();
            writer.write(entry("req-1")).unwrap();
            // A disabled writer refuses appends until the log is reopened.
            writer.state.lock().unwrap().failed = true;
            assert!(matches!(
                writer.write(entry("req-2")),
                Err(AuditError::WriterFailed)
            ));
        }

        let writer = JsonlAuditWriter::open(&log_path).unwrap();
        writer.write(entry("req-3")).unwrap();
        assert_eq!(JsonlAuditWriter::verify_chain(&log_path).unwrap(), 2);
    }

    #[test]
    fn write_and_read_back_in_order() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");

        {
            let writer = JsonlAuditWriter::open(&log_path).unwrap();
            writer.write(entry("req-1")).unwrap();
            writer.write(entry("req-2")).unwrap();
        }

        let records = JsonlAuditWriter::read_all(&log_path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entry.request_id, RequestId::new("req-1"));
        assert_eq!(records[1].entry.request_id, RequestId::new("req-2"));
        assert!(records[0].previous_hash.is_none());
        assert!(records[1].previous_hash.is_some());
    }

    #[test]
    fn entry_is_readable_before_write_returns() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");

        let writer = JsonlAuditWriter::open(&log_path).unwrap();
        writer.write(entry("req-1")).unwrap();
        // Writer still open: the record must already be on disk.
        assert_eq!(JsonlAuditWriter::read_all(&log_path).unwrap().len(), 1);
    }

    #[test]
    fn hash_chain_is_valid() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");

        {
            let writer = JsonlAuditWriter::open(&log_path).unwrap();
            for i in 0..5 {
                writer.write(entry(&format!("req-{i}"))).unwrap();
            }
        }

        assert_eq!(JsonlAuditWriter::verify_chain(&log_path).unwrap(), 5);
    }

    #[test]
    fn reopen_continues_chain() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");

        {
            let writer = JsonlAuditWriter::open(&log_path).unwrap();
            writer.write(entry("req-1")).unwrap();
        }
        {
            let writer = JsonlAuditWriter::open(&log_path).unwrap();
            writer.write(entry("req-2")).unwrap();
        }

        assert_eq!(JsonlAuditWriter::verify_chain(&log_path).unwrap(), 2);
    }

    #[test]
    fn deleted_line_is_detected() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");

        {
            let writer = JsonlAuditWriter::open(&log_path).unwrap();
            for i in 0..3 {
                writer.write(entry(&format!("req-{i}"))).unwrap();
            }
        }

        let content = std::fs::read_to_string(&log_path).unwrap();
        let kept: Vec<&str> = content
            .lines()
            .enumerate()
            .filter(|(i, _)| *i != 1)
            .map(|(_, l)| l)
            .collect();
        std::fs::write(&log_path, kept.join("\n") + "\n").unwrap();

        match JsonlAuditWriter::verify_chain(&log_path) {
            Err(AuditError::IntegrityViolation { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected IntegrityViolation, got {:?}", other),
        }
    }

    #[test]
    fn edited_line_is_detected() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");

        {
            let writer = JsonlAuditWriter::open(&log_path).unwrap();
            writer.write(entry("req-1")).unwrap();
            writer.write(entry("req-2")).unwrap();
        }

        let content = std::fs::read_to_string(&log_path).unwrap();
        let tampered = content.replacen("ALLOW_ROLE_CAPABILITY", "DENY_CAPABILITY_MISSING", 1);
        std::fs::write(&log_path, tampered).unwrap();

        assert!(matches!(
            JsonlAuditWriter::verify_chain(&log_path),
            Err(AuditError::IntegrityViolation { line: 2, .. })
        ));
    }

    #[test]
    fn concurrent_writes_keep_chain_intact() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");
        let writer = JsonlAuditWriter::open(&log_path).unwrap();

        std::thread::scope(|s| {
            for t in 0..4 {
                let writer = &writer;
                s.spawn(move || {
                    for i in 0..10 {
                        writer.write(entry(&format!("t{t}-{i}"))).unwrap();
                    }
                });
            }
        });

        assert_eq!(JsonlAuditWriter::verify_chain(&log_path).unwrap(), 40);
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("var").join("audit").join("audit.jsonl");

        let writer = JsonlAuditWriter::open(&log_path).unwrap();
        writer.write(entry("req-1")).unwrap();
        assert_eq!(writer.path(), log_path.as_path());
        assert!(log_path.exists());
    }

    #[test]
    fn read_missing_file_fails_with_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.jsonl");
        match JsonlAuditWriter::read_all(&missing) {
            Err(AuditError::OpenFailed { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected OpenFailed, got {:?}", other),
        }
    }
}
