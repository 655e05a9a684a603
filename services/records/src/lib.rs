//! Record Store Service
//!
//! Accounts and grade history for the peer evaluation matcher, kept in an
//! append-only journal with checksums and rebuilt by replay on startup.
//!
//! - `journal`: entry wire format and the rotating append-only writer
//! - `reader`: replay with corruption detection and tail recovery
//! - `events`: record events carried in journal payloads
//! - `store`: the `RecordStore` trait, index and in-memory store
//! - `journal_store`: the durable store

pub mod journal;
pub mod reader;
pub mod events;
pub mod store;
pub mod journal_store;

pub use journal_store::JournalRecordStore;
pub use store::{MemoryRecordStore, RecordStore};
