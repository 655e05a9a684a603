//! Types library for the peer evaluation matcher
//!
//! Core type definitions shared by the matching engine, the record store and
//! the HTTP gateway.
//!
//! # Modules
//! - `ids`: Participant and pairing identifiers
//! - `topic`: Evaluation topics and the subject catalog
//! - `pairing`: Roles, pairing results, pool snapshots
//! - `records`: Account and grade records
//! - `errors`: Error taxonomy

pub mod ids;
pub mod topic;
pub mod pairing;
pub mod records;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::topic::*;
    pub use crate::pairing::*;
    pub use crate::records::*;
    pub use crate::errors::*;
}
