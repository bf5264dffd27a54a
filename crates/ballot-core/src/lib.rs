//! # ballot-core
//!
//! why: define the hash-linked vote record and its digest in pure, portable rust
//! relations: used by ballot-storage for persistence, ballot-ledger for append/validate
//! what: Entry and Payload types, record codec, vote tally over a chain snapshot

pub mod codec;
pub mod entry;
pub mod tally;

pub use entry::{Entry, Payload, VoteRecord, GENESIS_MARKER, GENESIS_PREVIOUS_DIGEST};
pub use tally::{tally, tally_for};
