//! Evaluation topics and the subject catalog
//!
//! A topic names the subject a submission is evaluated on. Subjects carry a
//! small numeric code that grade storage and status boards sort by.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::TopicError;

/// Subject a submission is evaluated on (e.g. `Day01`)
///
/// Topics annotate pairings; they never partition the waiting pools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Create a topic without consulting a catalog.
    ///
    /// Front ends should go through [`SubjectCatalog::topic`] so unknown
    /// subjects are rejected.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static description of one evaluable subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub code: u16,
    pub name: String,
    /// Official subject document
    pub subject_url: Option<String>,
    /// Evaluation sheet used by the evaluator
    pub eval_guide_url: Option<String>,
}

impl SubjectInfo {
    pub fn new(code: u16, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            subject_url: None,
            eval_guide_url: None,
        }
    }

    pub fn topic(&self) -> Topic {
        Topic::new(self.name.clone())
    }
}

/// Lookup table of subjects by name and by code
///
/// Entries are kept sorted by code, so iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCatalog {
    subjects: Vec<SubjectInfo>,
}

impl SubjectCatalog {
    /// Build a catalog, rejecting duplicate names or codes.
    pub fn new(mut subjects: Vec<SubjectInfo>) -> Result<Self, TopicError> {
        subjects.sort_by_key(|s| s.code);
        for pair in subjects.windows(2) {
            if pair[0].code == pair[1].code {
                return Err(TopicError::DuplicateSubject(pair[1].code.to_string()));
            }
        }
        for (i, subject) in subjects.iter().enumerate() {
            if subjects[i + 1..].iter().any(|s| s.name == subject.name) {
                return Err(TopicError::DuplicateSubject(subject.name.clone()));
            }
        }
        Ok(Self { subjects })
    }

    pub fn by_name(&self, name: &str) -> Option<&SubjectInfo> {
        self.subjects.iter().find(|s| s.name == name)
    }

    pub fn by_code(&self, code: u16) -> Option<&SubjectInfo> {
        self.subjects.iter().find(|s| s.code == code)
    }

    /// Resolve a subject name typed by a participant into a topic.
    pub fn topic(&self, name: &str) -> Result<Topic, TopicError> {
        self.by_name(name.trim())
            .map(SubjectInfo::topic)
            .ok_or_else(|| TopicError::UnknownSubject(name.trim().to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubjectInfo> {
        self.subjects.iter()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl Default for SubjectCatalog {
    /// The piscine subjects: `Day00`..`Day05` and `Rush00`.
    fn default() -> Self {
        let subjects = (0..=5u16)
            .map(|day| SubjectInfo::new(day, format!("Day{:02}", day)))
            .chain(std::iter::once(SubjectInfo::new(100, "Rush00")))
            .collect();
        Self { subjects }
    }
}
