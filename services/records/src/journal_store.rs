//! Journal-backed RecordStore
//!
//! Every accepted change is written to the journal before it reaches the
//! in-memory index, so a reopened store sees exactly what was acknowledged.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};
use types::errors::StoreError;
use types::ids::ParticipantId;
use types::records::{Account, GradeRecord};

use crate::events::RecordEvent;
use crate::journal::{JournalConfig, JournalError, JournalWriter};
use crate::reader::{discard_corrupted_tail, replay};
use crate::store::{validate_grade, RecordIndex, RecordStore};

struct Inner {
    writer: JournalWriter,
    index: RecordIndex,
}

pub struct JournalRecordStore {
    inner: Mutex<Inner>,
}

impl JournalRecordStore {
    /// Open with default journal settings in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, JournalError> {
        Self::with_config(JournalConfig::new(dir.as_ref()))
    }

    /// Replay the journal, cut any corrupted tail, then open for appending.
    pub fn with_config(config: JournalConfig) -> Result<Self, JournalError> {
        let replayed = replay(&config.dir)?;
        if let Some(corruption) = &replayed.corruption {
            discard_corrupted_tail(corruption)?;
        }
        let next_sequence = replayed.next_sequence();

        let mut index = RecordIndex::default();
        let mut skipped = 0usize;
        for entry in replayed.entries {
            match RecordEvent::decode(&entry.kind, &entry.payload) {
                Ok(event) => index.apply(event),
                Err(e) => {
                    skipped += 1;
                    warn!(sequence = entry.sequence, kind = %entry.kind, error = %e, "skipping undecodable record");
                }
            }
        }

        let mut writer = JournalWriter::open(config)?;
        writer.set_next_sequence(next_sequence);

        info!(
            accounts = index.account_count(),
            grades = index.grade_count(),
            skipped,
            next_sequence,
            "record journal opened"
        );

        Ok(Self::from_parts(writer, index))
    }

    pub(crate) fn from_parts(writer: JournalWriter, index: RecordIndex) -> Self {
        Self {
            inner: Mutex::new(Inner { writer, index }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("record journal lock poisoned".to_string()))
    }
}

impl Inner {
    fn commit(&mut self, event: RecordEvent) -> Result<(), StoreError> {
        let payload = event.encode().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        self.writer
            .write_event(event.timestamp_nanos(), event.kind(), payload)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        self.index.apply(event);
        Ok(())
    }
}

impl RecordStore for JournalRecordStore {
    fn sign_up(&self, participant: &ParticipantId, name: &str) -> Result<Account, StoreError> {
        let mut inner = self.lock()?;
        let account = inner.index.prepare_sign_up(participant, name)?;
        inner.commit(RecordEvent::AccountRegistered(account.clone()))?;
        info!(participant = %participant, name = %account.name, "account registered");
        Ok(account)
    }

    fn resolve_name(&self, participant: &ParticipantId) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.index.name_of(participant))
    }

    fn append_grade(&self, grade: GradeRecord) -> Result<(), StoreError> {
        validate_grade(&grade)?;
        let (submitter, evaluator) = (grade.submitter.clone(), grade.evaluator.clone());
        self.lock()?.commit(RecordEvent::GradeRecorded(grade))?;
        info!(submitter = %submitter, evaluator = %evaluator, "grade recorded");
        Ok(())
    }

    fn grades_for(&self, submitter: &ParticipantId) -> Result<Vec<GradeRecord>, StoreError> {
        Ok(self.lock()?.index.grades_for(submitter))
    }
}
