//! Journal Writer: Append-only record journal with checksums
//!
//! Every account registration and every grade is appended as one entry.
//! Nothing is rewritten in place; the store rebuilds its index by replaying
//! the journal on open.
//!
//! # Binary Format (per entry)
//! ```text
//! [body_len:  u32]
//! [sequence:  u64]
//! [timestamp: i64]   // unix nanoseconds
//! [kind_len:  u16][kind: bytes]
//! [payload_len: u32][payload: bytes]
//! [checksum: u32]    // CRC32C over sequence+timestamp+kind+payload
//! ```

use crc32c::crc32c;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::error;

/// Bytes of a body holding an empty kind and an empty payload
const MIN_BODY_LEN: usize = 8 + 8 + 2 + 4 + 4;

/// Bodies larger than this are treated as corruption
const MAX_BODY_LEN: usize = 16 * 1024 * 1024;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Incomplete entry: need {needed} bytes, have {available}")]
    Incomplete { needed: usize, available: usize },

    #[error("Malformed entry: {0}")]
    Malformed(String),

    #[error("Sequence error: expected {expected}, got {got}")]
    SequenceError { expected: u64, got: u64 },

    #[error("Journal writer failed on an earlier append; reopen to resume")]
    Failed,
}

// ── Journal Entry ───────────────────────────────────────────────────

/// A single persisted record event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Gapless, strictly increasing from 1
    pub sequence: u64,
    pub timestamp: i64,
    /// Record kind, e.g. `AccountRegistered`
    pub kind: String,
    /// Bincode-encoded record event
    pub payload: Vec<u8>,
    pub checksum: u32,
}

impl JournalEntry {
    /// Create a new entry, computing the CRC32C checksum automatically.
    pub fn new(sequence: u64, timestamp: i64, kind: impl Into<String>, payload: Vec<u8>) -> Self {
        let kind = kind.into();
        let checksum = Self::compute_checksum(sequence, timestamp, &kind, &payload);
        Self {
            sequence,
            timestamp,
            kind,
            payload,
            checksum,
        }
    }

    pub fn compute_checksum(sequence: u64, timestamp: i64, kind: &str, payload: &[u8]) -> u32 {
        let mut buf = Vec::with_capacity(16 + kind.len() + payload.len());
        buf.extend_from_slice(&sequence.to_le_bytes());
        buf.extend_from_slice(&timestamp.to_le_bytes());
        buf.extend_from_slice(kind.as_bytes());
        buf.extend_from_slice(payload);
        crc32c(&buf)
    }

    pub fn verify_checksum(&self) -> bool {
        self.checksum == Self::compute_checksum(self.sequence, self.timestamp, &self.kind, &self.payload)
    }

    /// Encode into the length-prefixed wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body_len = MIN_BODY_LEN + self.kind.len() + self.payload.len();
        let mut buf = Vec::with_capacity(4 + body_len);
        buf.extend_from_slice(&(body_len as u32).to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&(self.kind.len() as u16).to_le_bytes());
        buf.extend_from_slice(self.kind.as_bytes());
        buf.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Decode one entry from the front of `data`.
    ///
    /// Returns `(entry, bytes_consumed)`. The checksum is not verified here.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), JournalError> {
        if data.len() < 4 {
            return Err(JournalError::Incomplete {
                needed: 4,
                available: data.len(),
            });
        }
        let body_len = Cursor::new(data).u32()? as usize;
        if !(MIN_BODY_LEN..=MAX_BODY_LEN).contains(&body_len) {
            return Err(JournalError::Malformed(format!("implausible body length {}", body_len)));
        }
        if data.len() < 4 + body_len {
            return Err(JournalError::Incomplete {
                needed: 4 + body_len,
                available: data.len(),
            });
        }

        let mut body = Cursor::new(&data[4..4 + body_len]);
        let sequence = body.u64()?;
        let timestamp = body.u64()? as i64;
        let kind_len = body.u16()? as usize;
        let kind = String::from_utf8(body.take(kind_len)?.to_vec())
            .map_err(|e| JournalError::Malformed(e.to_string()))?;
        let payload_len = body.u32()? as usize;
        let payload = body.take(payload_len)?.to_vec();
        let checksum = body.u32()?;
        if body.remaining() != 0 {
            return Err(JournalError::Malformed(format!(
                "{} trailing bytes inside entry",
                body.remaining()
            )));
        }

        Ok((
            Self {
                sequence,
                timestamp,
                kind,
                payload,
                checksum,
            },
            4 + body_len,
        ))
    }
}

/// Little-endian reader over a byte slice
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], JournalError> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.data.len()).ok_or_else(|| {
            JournalError::Malformed(format!("field of {} bytes overruns entry at {}", len, self.pos))
        })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], JournalError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16, JournalError> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, JournalError> {
        self.array().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64, JournalError> {
        self.array().map(u64::from_le_bytes)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

// ── Flush / Fsync Policies ──────────────────────────────────────────

/// Controls when buffered data is flushed to the OS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlushPolicy {
    EveryWrite,
    EveryN(usize),
}

/// Controls when `fsync` is called.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FsyncPolicy {
    EveryWrite,
    EveryN(usize),
    /// Only when a file is rotated or `sync` is called
    OnRotation,
}

// ── Journal Writer Configuration ────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Directory holding `journal-NNNNNN.bin` files
    pub dir: PathBuf,
    /// Rotate to a new file once the current one reaches this size
    pub max_file_size: u64,
    pub flush_policy: FlushPolicy,
    pub fsync_policy: FsyncPolicy,
}

impl JournalConfig {
    /// Grades and accounts are low-volume, so durability wins by default.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_file_size: 8 * 1024 * 1024,
            flush_policy: FlushPolicy::EveryWrite,
            fsync_policy: FsyncPolicy::EveryWrite,
        }
    }
}

// ── Journal Writer ──────────────────────────────────────────────────

/// Append-only journal writer with rotation and fsync control.
///
/// An I/O failure while appending discards the unwritten entry, cuts the
/// file back to its size before the append and fails the writer: every
/// later append returns `JournalError::Failed` until the journal is
/// reopened and replayed.
pub struct JournalWriter {
    config: JournalConfig,
    /// `None` once an append has failed
    writer: Option<BufWriter<File>>,
    current_file: PathBuf,
    current_file_size: u64,
    file_index: u64,
    next_sequence: u64,
    writes_since_flush: usize,
    writes_since_fsync: usize,
}

impl JournalWriter {
    /// Open the latest journal file for appending, creating the directory if needed.
    pub fn open(config: JournalConfig) -> Result<Self, JournalError> {
        fs::create_dir_all(&config.dir)?;

        let file_index = journal_files(&config.dir)?
            .last()
            .map(|(index, _)| *index)
            .unwrap_or(0);
        let current_file = journal_path(&config.dir, file_index);
        let file = OpenOptions::new().create(true).append(true).open(&current_file)?;
        let current_file_size = file.metadata()?.len();

        Ok(Self {
            config,
            writer: Some(BufWriter::new(file)),
            current_file,
            current_file_size,
            file_index,
            next_sequence: 1,
            writes_since_flush: 0,
            writes_since_fsync: 0,
        })
    }

    /// Continue numbering after a replayed journal.
    pub fn set_next_sequence(&mut self, seq: u64) {
        self.next_sequence = seq;
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn current_file_path(&self) -> &Path {
        &self.current_file
    }

    pub fn is_failed(&self) -> bool {
        self.writer.is_none()
    }

    /// Append an entry whose sequence must be the next expected one.
    ///
    /// Sequence and size only advance once the entry is written and the
    /// flush/fsync policies are satisfied.
    pub fn append(&mut self, entry: &JournalEntry) -> Result<(), JournalError> {
        if self.writer.is_none() {
            return Err(JournalError::Failed);
        }
        if entry.sequence != self.next_sequence {
            return Err(JournalError::SequenceError {
                expected: self.next_sequence,
                got: entry.sequence,
            });
        }

        if self.current_file_size >= self.config.max_file_size {
            if let Err(e) = self.rotate() {
                self.fail(None);
                return Err(e);
            }
        }

        let rollback_size = self.current_file_size;
        let bytes = entry.to_bytes();
        if let Err(e) = self.write_durably(&bytes) {
            self.fail(Some(rollback_size));
            return Err(e);
        }

        self.current_file_size += bytes.len() as u64;
        self.next_sequence += 1;
        Ok(())
    }

    /// Build the next entry and append it.
    pub fn write_event(&mut self, timestamp: i64, kind: &str, payload: Vec<u8>) -> Result<JournalEntry, JournalError> {
        let entry = JournalEntry::new(self.next_sequence, timestamp, kind, payload);
        self.append(&entry)?;
        Ok(entry)
    }

    /// Force flush + fsync.
    pub fn sync(&mut self) -> Result<(), JournalError> {
        let writer = self.writer.as_mut().ok_or(JournalError::Failed)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        self.writes_since_flush = 0;
        self.writes_since_fsync = 0;
        Ok(())
    }

    fn write_durably(&mut self, bytes: &[u8]) -> Result<(), JournalError> {
        let writer = self.writer.as_mut().ok_or(JournalError::Failed)?;
        writer.write_all(bytes)?;

        let flush_due = match self.config.flush_policy {
            FlushPolicy::EveryWrite => true,
            FlushPolicy::EveryN(n) => self.writes_since_flush + 1 >= n,
        };
        let fsync_due = match self.config.fsync_policy {
            FsyncPolicy::EveryWrite => true,
            FsyncPolicy::EveryN(n) => self.writes_since_fsync + 1 >= n,
            FsyncPolicy::OnRotation => false,
        };

        if flush_due || fsync_due {
            writer.flush()?;
        }
        if fsync_due {
            writer.get_ref().sync_all()?;
        }

        self.writes_since_flush = if flush_due || fsync_due { 0 } else { self.writes_since_flush + 1 };
        self.writes_since_fsync = if fsync_due { 0 } else { self.writes_since_fsync + 1 };
        Ok(())
    }

    /// Drop buffered bytes unwritten and cut the file back to `rollback_size`.
    fn fail(&mut self, rollback_size: Option<u64>) {
        let Some(writer) = self.writer.take() else {
            return;
        };
        // into_parts hands back the file without flushing the buffer
        let (file, _discarded) = writer.into_parts();

        if let Some(size) = rollback_size {
            let cut = file
                .metadata()
                .and_then(|meta| if meta.len() > size { file.set_len(size) } else { Ok(()) });
            if let Err(e) = cut {
                error!(
                    file = %self.current_file.display(),
                    size,
                    error = %e,
                    "could not roll back failed journal append"
                );
            }
        }
        error!(
            file = %self.current_file.display(),
            next_sequence = self.next_sequence,
            "journal writer failed; reopen to resume appends"
        );
    }

    fn rotate(&mut self) -> Result<(), JournalError> {
        self.sync()?;
        let next_file = journal_path(&self.config.dir, self.file_index + 1);
        let file = OpenOptions::new().create(true).append(true).open(&next_file)?;
        self.file_index += 1;
        self.current_file = next_file;
        self.writer = Some(BufWriter::new(file));
        self.current_file_size = 0;
        Ok(())
    }
}

pub(crate) fn journal_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("journal-{:06}.bin", index))
}

/// Journal files in `dir`, sorted by index
pub(crate) fn journal_files(dir: &Path) -> Result<Vec<(u64, PathBuf)>, io::Error> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files: Vec<(u64, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            let index = name.strip_prefix("journal-")?.strip_suffix(".bin")?.parse().ok()?;
            Some((index, e.path()))
        })
        .collect();
    files.sort_by_key(|(index, _)| *index);
    Ok(files)
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_entry(seq: u64) -> JournalEntry {
        JournalEntry::new(seq, 1_708_123_456_789_000_000 + seq as i64, "GradeRecorded", vec![1, 2, 3, 4, 5])
    }

    #[test]
    fn test_entry_checksum_detects_tamper() {
        let mut entry = sample_entry(1);
        assert!(entry.verify_checksum());
        entry.payload = vec![9, 9, 9];
        assert!(!entry.verify_checksum());
    }

    #[test]
    fn test_entry_wire_format_roundtrip() {
        let entry = sample_entry(42);
        let bytes = entry.to_bytes();
        let (decoded, consumed) = JournalEntry::from_bytes(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(entry, decoded);
    }

    #[test]
    fn test_from_bytes_rejects_truncation() {
        let bytes = sample_entry(1).to_bytes();
        for cut in [0, 3, 10, bytes.len() - 1] {
            assert!(
                JournalEntry::from_bytes(&bytes[..cut]).is_err(),
                "cut at {} should fail",
                cut
            );
        }
    }

    #[test]
    fn test_from_bytes_rejects_overlong_kind() {
        let mut bytes = sample_entry(1).to_bytes();
        // kind_len sits after body_len, sequence and timestamp
        bytes[20..22].copy_from_slice(&u16::MAX.to_le_bytes());
        assert!(matches!(JournalEntry::from_bytes(&bytes), Err(JournalError::Malformed(_))));
    }

    #[test]
    fn test_append_advances_sequence() {
        let tmp = TempDir::new().unwrap();
        let mut writer = JournalWriter::open(JournalConfig::new(tmp.path())).unwrap();

        for seq in 1..=10 {
            writer.append(&sample_entry(seq)).unwrap();
        }
        assert_eq!(writer.next_sequence(), 11);
        assert!(fs::metadata(writer.current_file_path()).unwrap().len() > 0);
    }

    #[test]
    fn test_sequence_error_on_gap() {
        let tmp = TempDir::new().unwrap();
        let mut writer = JournalWriter::open(JournalConfig::new(tmp.path())).unwrap();

        writer.append(&sample_entry(1)).unwrap();
        match writer.append(&sample_entry(5)) {
            Err(JournalError::SequenceError { expected, got }) => {
                assert_eq!(expected, 2);
                assert_eq!(got, 5);
            }
            other => panic!("Unexpected result: {:?}", other.err()),
        }
    }

    #[test]
    fn test_write_event_numbers_entries() {
        let tmp = TempDir::new().unwrap();
        let mut writer = JournalWriter::open(JournalConfig::new(tmp.path())).unwrap();
        writer.set_next_sequence(7);

        let entry = writer.write_event(1_000, "AccountRegistered", vec![1]).unwrap();
        assert_eq!(entry.sequence, 7);
        assert!(entry.verify_checksum());
    }

    #[test]
    fn test_rotation_on_size_limit() {
        let tmp = TempDir::new().unwrap();
        let config = JournalConfig {
            max_file_size: 100,
            ..JournalConfig::new(tmp.path())
        };
        let mut writer = JournalWriter::open(config).unwrap();
        for seq in 1..=20 {
            writer.append(&sample_entry(seq)).unwrap();
        }

        let files = journal_files(tmp.path()).unwrap();
        assert!(files.len() > 1, "Expected rotation to create multiple files");
        assert_eq!(files[0].0, 0);
    }

    #[test]
    fn test_reopen_appends_to_latest_file() {
        let tmp = TempDir::new().unwrap();
        let config = JournalConfig {
            max_file_size: 100,
            ..JournalConfig::new(tmp.path())
        };
        {
            let mut writer = JournalWriter::open(config.clone()).unwrap();
            for seq in 1..=5 {
                writer.append(&sample_entry(seq)).unwrap();
            }
        }
        let latest = journal_files(tmp.path()).unwrap().last().unwrap().1.clone();
        let writer = JournalWriter::open(config).unwrap();
        assert_eq!(writer.current_file_path(), latest.as_path());
    }

    #[test]
    fn test_sync_with_lazy_policies() {
        let tmp = TempDir::new().unwrap();
        let config = JournalConfig {
            flush_policy: FlushPolicy::EveryN(1000),
            fsync_policy: FsyncPolicy::OnRotation,
            ..JournalConfig::new(tmp.path())
        };
        let mut writer = JournalWriter::open(config).unwrap();
        writer.append(&sample_entry(1)).unwrap();
        writer.sync().unwrap();

        assert!(fs::metadata(writer.current_file_path()).unwrap().len() > 0);
    }

    #[cfg(target_os = "linux")]
    fn full_disk_writer(dir: &Path) -> JournalWriter {
        // Every flush to /dev/full fails with ENOSPC
        std::os::unix::fs::symlink("/dev/full", journal_path(dir, 0)).unwrap();
        JournalWriter::open(JournalConfig::new(dir)).unwrap()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_append_keeps_sequence_and_fails_writer() {
        let tmp = TempDir::new().unwrap();
        let mut writer = full_disk_writer(tmp.path());

        assert!(matches!(writer.append(&sample_entry(1)), Err(JournalError::Io(_))));
        assert_eq!(writer.next_sequence(), 1);
        assert!(writer.is_failed());

        // Nothing buffered survives to be flushed by a later call
        assert!(matches!(writer.append(&sample_entry(1)), Err(JournalError::Failed)));
        assert!(matches!(writer.sync(), Err(JournalError::Failed)));
        assert_eq!(writer.next_sequence(), 1);
    }

    #[test]
    fn test_lazy_flush_policy_counts_writes() {
        let tmp = TempDir::new().unwrap();
        let config = JournalConfig {
            flush_policy: FlushPolicy::EveryN(3),
            fsync_policy: FsyncPolicy::OnRotation,
            ..JournalConfig::new(tmp.path())
        };
        let mut writer = JournalWriter::open(config).unwrap();
        writer.append(&sample_entry(1)).unwrap();
        writer.append(&sample_entry(2)).unwrap();
        assert_eq!(fs::metadata(writer.current_file_path()).unwrap().len(), 0);

        writer.append(&sample_entry(3)).unwrap();
        let expected = 3 * sample_entry(1).to_bytes().len() as u64;
        assert_eq!(fs::metadata(writer.current_file_path()).unwrap().len(), expected);
    }

    #[test]
    fn test_journal_file_naming() {
        assert_eq!(journal_path(Path::new("/tmp"), 42), PathBuf::from("/tmp/journal-000042.bin"));
    }
}
