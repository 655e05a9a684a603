//! Waiting pool implementation with FIFO queue
//!
//! A waiting pool holds every participant of one role that is waiting for a
//! counterpart. Entries are maintained in FIFO (First-In-First-Out) order so
//! the oldest waiter is always matched first.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use types::errors::PoolError;
use types::ids::ParticipantId;
use types::topic::Topic;

use crate::notify::Notifier;

/// Entry in the waiting pool queue
///
/// Owns the sending half of the participant's notification channel until the
/// entry is popped (matched) or removed (cancelled).
#[derive(Debug)]
pub struct WaitingEntry {
    pub participant: ParticipantId,
    /// Set for submitters; evaluators wait without a topic
    pub topic: Option<Topic>,
    pub notifier: Notifier,
    /// Identifies this particular wait, so a stale withdrawal never removes a
    /// newer entry of the same participant
    pub ticket: u64,
    pub enqueued_at: Instant,
}

impl WaitingEntry {
    pub fn new(participant: ParticipantId, topic: Option<Topic>, notifier: Notifier, ticket: u64) -> Self {
        Self {
            participant,
            topic,
            notifier,
            ticket,
            enqueued_at: Instant::now(),
        }
    }

    pub fn waited(&self) -> Duration {
        self.enqueued_at.elapsed()
    }
}

/// Ordered collection of waiting participants
///
/// A participant appears at most once. Callers serialize access through
/// [`SharedPool`](super::SharedPool).
#[derive(Debug, Default)]
pub struct WaitingPool {
    entries: VecDeque<WaitingEntry>,
}

impl WaitingPool {
    /// Create a new empty pool
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append an entry at the back of the queue (arrival order)
    pub fn push(&mut self, entry: WaitingEntry) -> Result<(), PoolError> {
        if self.contains(&entry.participant) {
            return Err(PoolError::DuplicateEntry {
                participant: entry.participant,
            });
        }
        self.entries.push_back(entry);
        Ok(())
    }

    /// Remove and return the oldest entry
    pub fn pop_front(&mut self) -> Result<WaitingEntry, PoolError> {
        self.entries.pop_front().ok_or(PoolError::Empty)
    }

    /// Remove the named participant wherever it sits in the queue
    pub fn remove(&mut self, participant: &ParticipantId) -> Result<WaitingEntry, PoolError> {
        let position = self
            .entries
            .iter()
            .position(|entry| &entry.participant == participant)
            .ok_or_else(|| PoolError::NotFound {
                participant: participant.clone(),
            })?;
        self.entries.remove(position).ok_or_else(|| PoolError::NotFound {
            participant: participant.clone(),
        })
    }

    /// Remove the entry only if it is still the wait identified by `ticket`
    pub fn withdraw(&mut self, participant: &ParticipantId, ticket: u64) -> Option<WaitingEntry> {
        let position = self
            .entries
            .iter()
            .position(|entry| &entry.participant == participant && entry.ticket == ticket)?;
        self.entries.remove(position)
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.entries.iter().any(|entry| &entry.participant == participant)
    }

    /// Waiting participants, oldest first
    pub fn participants(&self) -> Vec<ParticipantId> {
        self.entries.iter().map(|entry| entry.participant.clone()).collect()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
