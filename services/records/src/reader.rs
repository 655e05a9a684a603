//! Journal Reader: Sequential replay with corruption detection
//!
//! Reads every journal file in index order and yields the longest valid
//! prefix. The first entry that is truncated, fails to decode, fails its
//! checksum or breaks the sequence ends replay; its location is reported so
//! the store can cut the journal back to the valid prefix before appending.

use crate::journal::{journal_files, JournalEntry, JournalError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Why replay stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorruptionKind {
    /// Entry cut short, usually a crash mid-write
    Truncated,
    /// Bytes present but not a decodable entry
    Malformed(String),
    ChecksumMismatch { expected: u32, actual: u32 },
    SequenceGap { expected: u64, got: u64 },
}

/// Where replay stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corruption {
    pub file: PathBuf,
    /// Byte offset inside `file` where the valid prefix ends
    pub offset: u64,
    pub kind: CorruptionKind,
    /// Journal files after `file`, unreachable once the sequence is broken
    pub orphaned: Vec<PathBuf>,
}

/// Outcome of replaying a journal directory
#[derive(Debug, Default)]
pub struct Replay {
    pub entries: Vec<JournalEntry>,
    pub corruption: Option<Corruption>,
}

impl Replay {
    /// Sequence the next appended entry must carry.
    pub fn next_sequence(&self) -> u64 {
        self.entries.last().map(|e| e.sequence + 1).unwrap_or(1)
    }
}

/// Replay all journal files in `dir`. A missing directory is an empty journal.
pub fn replay(dir: &Path) -> Result<Replay, JournalError> {
    let files = journal_files(dir)?;
    let mut replay = Replay::default();
    let mut expected = 1u64;

    for (position, (_, path)) in files.iter().enumerate() {
        let data = fs::read(path)?;
        let mut offset = 0usize;

        while offset < data.len() {
            let failure = match JournalEntry::from_bytes(&data[offset..]) {
                Err(JournalError::Incomplete { .. }) => Some(CorruptionKind::Truncated),
                Err(e) => Some(CorruptionKind::Malformed(e.to_string())),
                Ok((entry, consumed)) => {
                    let actual =
                        JournalEntry::compute_checksum(entry.sequence, entry.timestamp, &entry.kind, &entry.payload);
                    if actual != entry.checksum {
                        Some(CorruptionKind::ChecksumMismatch {
                            expected: entry.checksum,
                            actual,
                        })
                    } else if entry.sequence != expected {
                        Some(CorruptionKind::SequenceGap {
                            expected,
                            got: entry.sequence,
                        })
                    } else {
                        expected += 1;
                        offset += consumed;
                        replay.entries.push(entry);
                        None
                    }
                }
            };

            if let Some(kind) = failure {
                let corruption = Corruption {
                    file: path.clone(),
                    offset: offset as u64,
                    kind,
                    orphaned: files[position + 1..].iter().map(|(_, p)| p.clone()).collect(),
                };
                warn!(
                    file = %corruption.file.display(),
                    offset = corruption.offset,
                    kind = ?corruption.kind,
                    orphaned_files = corruption.orphaned.len(),
                    replayed = replay.entries.len(),
                    "journal replay stopped at corrupted entry"
                );
                replay.corruption = Some(corruption);
                return Ok(replay);
            }
        }
    }

    Ok(replay)
}

/// Cut the journal back to the valid prefix described by `corruption`.
///
/// The damaged file is truncated at the corruption offset; orphaned later
/// files are renamed with a `.corrupt` suffix so they are kept for
/// inspection but no longer replayed.
pub fn discard_corrupted_tail(corruption: &Corruption) -> Result<(), JournalError> {
    let file = fs::OpenOptions::new().write(true).open(&corruption.file)?;
    file.set_len(corruption.offset)?;
    file.sync_all()?;

    for orphan in &corruption.orphaned {
        let mut quarantined = orphan.clone().into_os_string();
        quarantined.push(".corrupt");
        fs::rename(orphan, &quarantined)?;
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
