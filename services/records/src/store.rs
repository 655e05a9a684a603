//! RecordStore: accounts and append-only grades
//!
//! The matching core never touches records; the gateway uses a store to sign
//! participants up, resolve display names for status views, and keep the
//! grade history evaluators append after a session.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use tracing::{debug, info};
use types::errors::StoreError;
use types::ids::ParticipantId;
use types::records::{Account, GradeRecord, MAX_SCORE};

use crate::events::RecordEvent;

/// Maximum display name length, in characters
pub const MAX_NAME_LEN: usize = 32;

pub trait RecordStore: Send + Sync {
    /// Create an account for `participant` under a unique display name.
    fn sign_up(&self, participant: &ParticipantId, name: &str) -> Result<Account, StoreError>;

    /// Display name of `participant`, if it has an account.
    fn resolve_name(&self, participant: &ParticipantId) -> Result<Option<String>, StoreError>;

    /// Append a grade. Grades are never rewritten or removed.
    fn append_grade(&self, grade: GradeRecord) -> Result<(), StoreError>;

    /// Grades received by `submitter`, oldest first.
    fn grades_for(&self, submitter: &ParticipantId) -> Result<Vec<GradeRecord>, StoreError>;
}

/// Trim and check a display name.
pub fn normalize_name(name: &str) -> Result<String, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::InvalidName("name is empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::InvalidName(format!(
            "name longer than {} characters",
            MAX_NAME_LEN
        )));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(StoreError::InvalidName("name contains whitespace".to_string()));
    }
    Ok(name.to_string())
}

pub fn validate_grade(grade: &GradeRecord) -> Result<(), StoreError> {
    if grade.score > MAX_SCORE {
        return Err(StoreError::InvalidGrade(format!(
            "score {} exceeds {}",
            grade.score, MAX_SCORE
        )));
    }
    if grade.submitter == grade.evaluator {
        return Err(StoreError::InvalidGrade(format!(
            "{} cannot grade their own submission",
            grade.evaluator
        )));
    }
    Ok(())
}

// ── Index ───────────────────────────────────────────────────────────

/// In-memory view of every record event applied so far.
///
/// Names are unique case-insensitively.
#[derive(Debug, Default)]
pub struct RecordIndex {
    accounts: HashMap<ParticipantId, Account>,
    owners: HashMap<String, ParticipantId>,
    grades: HashMap<ParticipantId, Vec<GradeRecord>>,
    grade_count: usize,
}

impl RecordIndex {
    /// Build the account a sign-up would create, without applying it.
    pub fn prepare_sign_up(&self, participant: &ParticipantId, name: &str) -> Result<Account, StoreError> {
        let name = normalize_name(name)?;
        if self.accounts.contains_key(participant) {
            return Err(StoreError::AlreadyRegistered {
                participant: participant.clone(),
            });
        }
        if self.owners.contains_key(&name.to_lowercase()) {
            return Err(StoreError::NameTaken { name });
        }
        Ok(Account {
            participant: participant.clone(),
            name,
            registered_at: Utc::now(),
        })
    }

    /// Apply a validated event.
    pub fn apply(&mut self, event: RecordEvent) {
        match event {
            RecordEvent::AccountRegistered(account) => {
                self.owners
                    .insert(account.name.to_lowercase(), account.participant.clone());
                self.accounts.insert(account.participant.clone(), account);
            }
            RecordEvent::GradeRecorded(grade) => {
                self.grades.entry(grade.submitter.clone()).or_default().push(grade);
                self.grade_count += 1;
            }
        }
    }

    pub fn name_of(&self, participant: &ParticipantId) -> Option<String> {
        self.accounts.get(participant).map(|a| a.name.clone())
    }

    pub fn grades_for(&self, submitter: &ParticipantId) -> Vec<GradeRecord> {
        self.grades.get(submitter).cloned().unwrap_or_default()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn grade_count(&self) -> usize {
        self.grade_count
    }
}

// ── Memory Store ────────────────────────────────────────────────────

/// Process-local store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    index: RwLock<RecordIndex>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Unavailable("record index lock poisoned".to_string())
}

impl RecordStore for MemoryRecordStore {
    fn sign_up(&self, participant: &ParticipantId, name: &str) -> Result<Account, StoreError> {
        let mut index = self.index.write().map_err(poisoned)?;
        let account = index.prepare_sign_up(participant, name)?;
        index.apply(RecordEvent::AccountRegistered(account.clone()));
        info!(participant = %participant, name = %account.name, "account registered");
        Ok(account)
    }

    fn resolve_name(&self, participant: &ParticipantId) -> Result<Option<String>, StoreError> {
        Ok(self.index.read().map_err(poisoned)?.name_of(participant))
    }

    fn append_grade(&self, grade: GradeRecord) -> Result<(), StoreError> {
        validate_grade(&grade)?;
        debug!(submitter = %grade.submitter, evaluator = %grade.evaluator, topic = %grade.topic, "grade recorded");
        self.index
            .write()
            .map_err(poisoned)?
            .apply(RecordEvent::GradeRecorded(grade));
        Ok(())
    }

    fn grades_for(&self, submitter: &ParticipantId) -> Result<Vec<GradeRecord>, StoreError> {
        Ok(self.index.read().map_err(poisoned)?.grades_for(submitter))
    }
}

// ── Tests ───────────────────────────────────────────────────────────
