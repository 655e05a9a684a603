//! Error types shared by the matching engine, record store and front ends
//!
//! Error taxonomy using thiserror. Every variant is recoverable: a failed
//! operation leaves the engine and the store usable.

use thiserror::Error;

use crate::ids::ParticipantId;
use crate::pairing::Role;

/// Invalid participant identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("participant id is empty")]
    Empty,

    #[error("participant id is {len} bytes, maximum is {max}")]
    TooLong { len: usize, max: usize },
}

/// Subject catalog errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicError {
    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("duplicate subject in catalog: {0}")]
    DuplicateSubject(String),
}

/// Single waiting-pool errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("{participant} is already waiting in this pool")]
    DuplicateEntry { participant: ParticipantId },

    #[error("pool is empty")]
    Empty,

    #[error("{participant} is not in this pool")]
    NotFound { participant: ParticipantId },
}

/// Match engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("{participant} is already waiting as {role}")]
    AlreadyWaiting { participant: ParticipantId, role: Role },

    #[error("{participant} is not waiting as {role}")]
    NotWaiting { participant: ParticipantId, role: Role },

    #[error("notification channel closed before a result was delivered")]
    ChannelClosed,
}

/// Record store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("{participant} already has an account")]
    AlreadyRegistered { participant: ParticipantId },

    #[error("name {name} is already taken")]
    NameTaken { name: String },

    #[error("invalid account name: {0}")]
    InvalidName(String),

    #[error("invalid grade: {0}")]
    InvalidGrade(String),
}
