//! Matching engine core
//!
//! Main coordinator for the two waiting pools and the rendezvous between a
//! new arrival and the oldest waiter of the opposite role.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};
use types::errors::{EngineError, PoolError};
use types::ids::{MatchId, ParticipantId};
use types::pairing::{MatchState, PairingResult, Role};
use types::topic::Topic;

use crate::notify::{self, Subscription};
use crate::pool::{SharedPool, WaitingEntry, WaitingPool};

/// Main matching engine
///
/// Owns both waiting pools. Construct one per process and share it by `Arc`.
#[derive(Debug)]
pub struct MatchEngine {
    evaluators: SharedPool,
    submitters: SharedPool,
    /// Source of per-wait tickets
    next_ticket: AtomicU64,
}

/// Result of admitting a participant
#[derive(Debug)]
pub enum Admission<'a> {
    /// A counterpart was waiting; both sides already have their result
    Paired(PairingResult),
    /// No counterpart yet; the participant is queued
    Waiting(PendingPairing<'a>),
}

impl MatchEngine {
    /// Create a new matching engine with empty pools
    pub fn new() -> Self {
        Self {
            evaluators: SharedPool::new(),
            submitters: SharedPool::new(),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Submit work on `topic` and wait for an evaluator
    ///
    /// Returns immediately when an evaluator is already waiting; otherwise
    /// suspends until a `register` call pairs with it or the submission is
    /// cancelled. Dropping the returned future withdraws the submission.
    pub async fn submit(&self, participant: ParticipantId, topic: Topic) -> Result<PairingResult, EngineError> {
        match self.begin_submit(participant, topic)? {
            Admission::Paired(result) => Ok(result),
            Admission::Waiting(pending) => pending.wait().await,
        }
    }

    /// Register as an evaluator and wait for a submission
    pub async fn register(&self, participant: ParticipantId) -> Result<PairingResult, EngineError> {
        match self.begin_register(participant)? {
            Admission::Paired(result) => Ok(result),
            Admission::Waiting(pending) => pending.wait().await,
        }
    }

    /// Pair against the oldest evaluator or queue as a submitter, without waiting
    pub fn begin_submit(&self, participant: ParticipantId, topic: Topic) -> Result<Admission<'_>, EngineError> {
        self.admit(Role::Submitter, participant, Some(topic))
    }

    /// Pair against the oldest submitter or queue as an evaluator, without waiting
    pub fn begin_register(&self, participant: ParticipantId) -> Result<Admission<'_>, EngineError> {
        self.admit(Role::Evaluator, participant, None)
    }

    /// Withdraw a waiting submission
    ///
    /// The suspended `submit` call resolves with `matched: false`. Fails with
    /// `NotWaiting` if the submission was already matched or cancelled.
    pub fn cancel_submission(&self, participant: &ParticipantId) -> Result<(), EngineError> {
        self.cancel(Role::Submitter, participant)
    }

    /// Withdraw a waiting evaluator registration
    pub fn cancel_registration(&self, participant: &ParticipantId) -> Result<(), EngineError> {
        self.cancel(Role::Evaluator, participant)
    }

    /// Snapshot of both pools, oldest waiter first
    pub fn match_state(&self) -> MatchState {
        let evaluators = self.evaluators.lock();
        let submitters = self.submitters.lock();
        MatchState {
            evaluators: evaluators.participants(),
            submitters: submitters.participants(),
        }
    }

    /// Snapshot of a single pool
    pub fn waiting(&self, role: Role) -> Vec<ParticipantId> {
        self.pool(role).lock().participants()
    }

    pub fn size(&self, role: Role) -> usize {
        self.pool(role).lock().size()
    }

    fn pool(&self, role: Role) -> &SharedPool {
        match role {
            Role::Submitter => &self.submitters,
            Role::Evaluator => &self.evaluators,
        }
    }

    /// Rendezvous: pair with the oldest live opposite waiter or enqueue
    ///
    /// Both locks are held, always evaluators first, so a concurrent arrival
    /// of the opposite role either sees this entry or has already been seen.
    fn admit(&self, role: Role, participant: ParticipantId, topic: Option<Topic>) -> Result<Admission<'_>, EngineError> {
        let mut evaluators = self.evaluators.lock();
        let mut submitters = self.submitters.lock();
        let (own, opposite): (&mut WaitingPool, &mut WaitingPool) = match role {
            Role::Submitter => (&mut *submitters, &mut *evaluators),
            Role::Evaluator => (&mut *evaluators, &mut *submitters),
        };

        if own.contains(&participant) {
            return Err(PoolError::DuplicateEntry { participant }.into());
        }
        if opposite.contains(&participant) {
            return Err(EngineError::AlreadyWaiting {
                participant,
                role: role.opposite(),
            });
        }

        while let Ok(entry) = opposite.pop_front() {
            let match_id = MatchId::new();
            let pair_topic = topic.clone().or_else(|| entry.topic.clone());
            let theirs = PairingResult::matched(role.opposite(), participant.clone(), pair_topic.clone(), match_id);

            match entry.notifier.deliver(theirs) {
                Ok(()) => {
                    info!(
                        %match_id,
                        participant = %participant,
                        counterpart = %entry.participant,
                        role = %role,
                        topic = ?pair_topic,
                        waited_ms = entry.enqueued_at.elapsed().as_millis() as u64,
                        "Pairing formed"
                    );
                    let ours = PairingResult::matched(role, entry.participant, pair_topic, match_id);
                    return Ok(Admission::Paired(ours));
                }
                Err(_) => {
                    warn!(
                        counterpart = %entry.participant,
                        role = %role.opposite(),
                        "Skipping waiter that abandoned its wait"
                    );
                }
            }
        }

        let (notifier, subscription) = notify::channel();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        own.push(WaitingEntry::new(participant.clone(), topic, notifier, ticket))?;
        debug!(participant = %participant, role = %role, waiting = own.size(), "Participant queued");

        Ok(Admission::Waiting(PendingPairing {
            engine: self,
            role,
            participant,
            ticket,
            subscription,
            settled: false,
        }))
    }

    fn cancel(&self, role: Role, participant: &ParticipantId) -> Result<(), EngineError> {
        let entry = {
            let mut pool = self.pool(role).lock();
            pool.remove(participant).map_err(|_| EngineError::NotWaiting {
                participant: participant.clone(),
                role,
            })?
        };

        let topic = entry.topic.clone();
        if entry.notifier.deliver(PairingResult::cancelled(role, topic)).is_err() {
            debug!(participant = %participant, role = %role, "Cancelled waiter was no longer listening");
        }
        info!(participant = %participant, role = %role, "Wait cancelled");
        Ok(())
    }

    fn withdraw(&self, role: Role, participant: &ParticipantId, ticket: u64) {
        if let Some(entry) = self.pool(role).lock().withdraw(participant, ticket) {
            info!(
                participant = %participant,
                role = %role,
                waited_ms = entry.waited().as_millis() as u64,
                "Abandoned wait withdrawn"
            );
        }
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A queued participant waiting for its pairing result
///
/// Dropping it before the result arrives withdraws the entry from its pool,
/// so no later arrival is paired with a participant nobody listens for.
#[derive(Debug)]
pub struct PendingPairing<'a> {
    engine: &'a MatchEngine,
    role: Role,
    participant: ParticipantId,
    ticket: u64,
    subscription: Subscription,
    settled: bool,
}

impl PendingPairing<'_> {
    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Suspend until matched or cancelled
    pub async fn wait(mut self) -> Result<PairingResult, EngineError> {
        let result = self.subscription.recv().await;
        self.settled = true;
        result
    }
}

impl Drop for PendingPairing<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // Close first: a pairing racing with this drop either delivered
        // already or will find the channel closed and skip this entry.
        match self.subscription.abandon() {
            Some(result) => warn!(
                participant = %self.participant,
                role = %self.role,
                matched = result.matched,
                counterpart = ?result.counterpart,
                "Pairing result dropped unread"
            ),
            None => self.engine.withdraw(self.role, &self.participant, self.ticket),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::try_new(s).unwrap()
    }

    fn day01() -> Topic {
        Topic::new("Day01")
    }

    fn expect_waiting(admission: Admission<'_>) -> PendingPairing<'_> {
        match admission {
            Admission::Waiting(pending) => pending,
            Admission::Paired(result) => panic!("Expected Waiting, got {:?}", result),
        }
    }

    fn expect_paired(admission: Admission<'_>) -> PairingResult {
        match admission {
            Admission::Paired(result) => result,
            Admission::Waiting(pending) => panic!("Expected Paired, {} is waiting", pending.participant()),
        }
    }

    #[tokio::test]
    async fn test_submit_then_register_pairs_both_sides() {
        let engine = MatchEngine::new();

        let pending = expect_waiting(engine.begin_submit(pid("u1"), day01()).unwrap());
        assert_eq!(engine.waiting(Role::Submitter), vec![pid("u1")]);

        let evaluator_result = engine.register(pid("u2")).await.unwrap();
        assert!(evaluator_result.matched);
        assert_eq!(evaluator_result.role, Role::Evaluator);
        assert_eq!(evaluator_result.counterpart, Some(pid("u1")));
        assert_eq!(evaluator_result.topic, Some(day01()));

        let submitter_result = pending.wait().await.unwrap();
        assert!(submitter_result.matched);
        assert_eq!(submitter_result.role, Role::Submitter);
        assert_eq!(submitter_result.counterpart, Some(pid("u2")));
        assert_eq!(submitter_result.topic, Some(day01()));
        assert_eq!(submitter_result.match_id, evaluator_result.match_id);

        assert!(engine.match_state().is_idle());
    }

    #[tokio::test]
    async fn test_register_then_submit_uses_submitters_topic() {
        let engine = MatchEngine::new();

        let pending = expect_waiting(engine.begin_register(pid("e1")).unwrap());
        let submitter_result = engine.submit(pid("s1"), Topic::new("Rush00")).await.unwrap();
        assert_eq!(submitter_result.counterpart, Some(pid("e1")));

        let evaluator_result = pending.wait().await.unwrap();
        assert_eq!(evaluator_result.counterpart, Some(pid("s1")));
        assert_eq!(evaluator_result.topic, Some(Topic::new("Rush00")));
    }

    #[tokio::test]
    async fn test_fifo_oldest_submitter_matched_first() {
        let engine = MatchEngine::new();

        let first = expect_waiting(engine.begin_submit(pid("a"), day01()).unwrap());
        let second = expect_waiting(engine.begin_submit(pid("b"), Topic::new("Day02")).unwrap());

        let result = expect_paired(engine.begin_register(pid("e")).unwrap());
        assert_eq!(result.counterpart, Some(pid("a")));
        assert_eq!(engine.waiting(Role::Submitter), vec![pid("b")]);

        assert!(first.wait().await.unwrap().matched);
        drop(second);
        assert!(engine.match_state().is_idle());
    }

    #[tokio::test]
    async fn test_cancel_submission_resolves_wait() {
        let engine = MatchEngine::new();

        let pending = expect_waiting(engine.begin_submit(pid("u1"), day01()).unwrap());
        engine.cancel_submission(&pid("u1")).unwrap();

        let result = pending.wait().await.unwrap();
        assert!(!result.matched);
        assert_eq!(result.topic, Some(day01()));

        // A later evaluator finds nobody and queues
        let later = expect_waiting(engine.begin_register(pid("u2")).unwrap());
        assert_eq!(engine.waiting(Role::Evaluator), vec![pid("u2")]);
        assert!(engine.waiting(Role::Submitter).is_empty());
        drop(later);
    }

    #[tokio::test]
    async fn test_cancel_after_match_is_not_waiting() {
        let engine = MatchEngine::new();

        let pending = expect_waiting(engine.begin_register(pid("e1")).unwrap());
        expect_paired(engine.begin_submit(pid("s1"), day01()).unwrap());

        let err = engine.cancel_registration(&pid("e1")).unwrap_err();
        assert_eq!(
            err,
            EngineError::NotWaiting {
                participant: pid("e1"),
                role: Role::Evaluator
            }
        );
        assert!(pending.wait().await.unwrap().matched, "pairing stays authoritative");
    }

    #[test]
    fn test_cancel_twice_fails_without_mutation() {
        let engine = MatchEngine::new();

        let pending = expect_waiting(engine.begin_submit(pid("u1"), day01()).unwrap());
        let _other = expect_waiting(engine.begin_submit(pid("u2"), day01()).unwrap());

        engine.cancel_submission(&pid("u1")).unwrap();
        assert!(matches!(
            engine.cancel_submission(&pid("u1")),
            Err(EngineError::NotWaiting { .. })
        ));
        assert_eq!(engine.waiting(Role::Submitter), vec![pid("u2")]);
        drop(pending);
    }

    #[test]
    fn test_cancel_never_submitted() {
        let engine = MatchEngine::new();
        assert!(matches!(
            engine.cancel_registration(&pid("ghost")),
            Err(EngineError::NotWaiting { role: Role::Evaluator, .. })
        ));
    }

    #[test]
    fn test_duplicate_submission_rejected() {
        let engine = MatchEngine::new();

        let _pending = expect_waiting(engine.begin_submit(pid("u1"), day01()).unwrap());
        let err = engine.begin_submit(pid("u1"), Topic::new("Day02")).unwrap_err();
        assert_eq!(err, EngineError::Pool(PoolError::DuplicateEntry { participant: pid("u1") }));
        assert_eq!(engine.size(Role::Submitter), 1);
    }

    #[test]
    fn test_waiting_submitter_cannot_register() {
        let engine = MatchEngine::new();

        let _pending = expect_waiting(engine.begin_submit(pid("u1"), day01()).unwrap());
        let err = engine.begin_register(pid("u1")).unwrap_err();
        assert_eq!(
            err,
            EngineError::AlreadyWaiting {
                participant: pid("u1"),
                role: Role::Submitter
            }
        );
        assert_eq!(engine.size(Role::Submitter), 1, "no self-pairing");
        assert_eq!(engine.size(Role::Evaluator), 0);
    }

    #[test]
    fn test_dropped_wait_is_withdrawn() {
        let engine = MatchEngine::new();

        let pending = expect_waiting(engine.begin_submit(pid("u1"), day01()).unwrap());
        drop(pending);
        assert!(engine.waiting(Role::Submitter).is_empty());

        // The next evaluator is not paired with the departed submitter
        let _evaluator = expect_waiting(engine.begin_register(pid("u2")).unwrap());
        assert_eq!(engine.waiting(Role::Evaluator), vec![pid("u2")]);
    }

    #[tokio::test]
    async fn test_abandoned_entry_skipped_for_next_waiter() {
        let engine = MatchEngine::new();

        let first = expect_waiting(engine.begin_submit(pid("a"), day01()).unwrap());
        let second = expect_waiting(engine.begin_submit(pid("b"), day01()).unwrap());

        // Simulate a wait abandoned between the close and the withdrawal
        let mut first = first;
        first.settled = true;
        assert!(first.subscription.abandon().is_none());

        let result = expect_paired(engine.begin_register(pid("e")).unwrap());
        assert_eq!(result.counterpart, Some(pid("b")));
        assert!(second.wait().await.unwrap().matched);
        assert!(engine.match_state().is_idle());
    }

    #[tokio::test]
    async fn test_dropped_future_withdraws_submission() {
        let engine = MatchEngine::new();

        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            engine.submit(pid("u1"), day01()),
        )
        .await;
        assert!(outcome.is_err(), "submit should still be waiting");
        assert!(engine.match_state().is_idle());
    }

    #[tokio::test]
    async fn test_resubmit_after_match_leaves_new_entry_alone() {
        let engine = MatchEngine::new();

        let stale = expect_waiting(engine.begin_submit(pid("u1"), day01()).unwrap());
        expect_paired(engine.begin_register(pid("e1")).unwrap());

        let fresh = expect_waiting(engine.begin_submit(pid("u1"), Topic::new("Day02")).unwrap());
        drop(stale);
        assert_eq!(engine.waiting(Role::Submitter), vec![pid("u1")]);
        drop(fresh);
        assert!(engine.match_state().is_idle());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    enum Op {
        Submit(u8),
        Register(u8),
        CancelSubmission(u8),
        CancelRegistration(u8),
        Abandon(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..10).prop_map(Op::Submit),
            (0u8..10).prop_map(Op::Register),
            (0u8..10).prop_map(Op::CancelSubmission),
            (0u8..10).prop_map(Op::CancelRegistration),
            (0u8..10).prop_map(Op::Abandon),
        ]
    }

    fn pid(n: u8) -> ParticipantId {
        ParticipantId::try_new(format!("p{}", n)).unwrap()
    }

    proptest! {
        #[test]
        fn prop_pools_never_overlap_and_no_self_pairing(ops in prop::collection::vec(op(), 0..80)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let engine = MatchEngine::new();
            let mut pending: HashMap<ParticipantId, PendingPairing<'_>> = HashMap::new();
            let mut immediate: Vec<(ParticipantId, PairingResult)> = Vec::new();

            for op in ops {
                match op {
                    Op::Submit(n) | Op::Register(n) => {
                        let id = pid(n);
                        if pending.contains_key(&id) {
                            continue;
                        }
                        let admission = match op {
                            Op::Submit(_) => engine.begin_submit(id.clone(), Topic::new("Day00")),
                            _ => engine.begin_register(id.clone()),
                        };
                        match admission {
                            Ok(Admission::Paired(result)) => immediate.push((id, result)),
                            Ok(Admission::Waiting(wait)) => {
                                pending.insert(id, wait);
                            }
                            Err(e) => prop_assert!(false, "unexpected rejection: {}", e),
                        }
                    }
                    Op::CancelSubmission(n) => {
                        let _ = engine.cancel_submission(&pid(n));
                    }
                    Op::CancelRegistration(n) => {
                        let _ = engine.cancel_registration(&pid(n));
                    }
                    Op::Abandon(n) => {
                        if let Some(wait) = pending.remove(&pid(n)) {
                            drop(wait);
                            prop_assert!(!engine.waiting(Role::Submitter).contains(&pid(n)));
                            prop_assert!(!engine.waiting(Role::Evaluator).contains(&pid(n)));
                        }
                    }
                }

                // Settle waits that already received their result
                let settled: Vec<ParticipantId> = pending
                    .iter()
                    .filter(|(id, wait)| !engine.waiting(wait.role()).contains(*id))
                    .map(|(id, _)| id.clone())
                    .collect();
                for id in settled {
                    if let Some(wait) = pending.remove(&id) {
                        let result = runtime.block_on(wait.wait()).unwrap();
                        prop_assert_ne!(result.counterpart.as_ref(), Some(&id));
                    }
                }

                let state = engine.match_state();
                prop_assert!(
                    state.evaluators.is_empty() || state.submitters.is_empty(),
                    "both pools non-empty: {:?}",
                    state
                );
                for id in &state.evaluators {
                    prop_assert!(!state.submitters.contains(id));
                }
            }

            for (id, result) in &immediate {
                prop_assert!(result.matched);
                prop_assert_ne!(result.counterpart.as_ref(), Some(id));
            }
        }
    }
}
