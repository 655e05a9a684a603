//! Matching Engine Service
//!
//! Pairs submitters awaiting evaluation with evaluators awaiting assignment.
//! Each side waits in its own FIFO pool; a new arrival is paired with the
//! oldest waiter of the opposite role, or queues and suspends until one
//! arrives.
//!
//! **Key Invariants:**
//! - Strict FIFO per pool, one pairing per call
//! - A participant waits in at most one pool, at most once
//! - No self-pairing
//! - Every pop delivers exactly one result to the popped waiter
//! - At most one pool is non-empty at any time

pub mod pool;
pub mod notify;
pub mod engine;

pub use engine::{Admission, MatchEngine, PendingPairing};
