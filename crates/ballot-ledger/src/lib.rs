//! # ballot-ledger
//!
//! why: own the vote chain, serialize every write, and answer "has this voter voted"
//! relations: built on ballot-core for entries/digests and ballot-storage for persistence
//! what: Ledger (append, cast_vote, has_voter, validate, snapshot), LedgerConfig, LedgerError

pub mod config;
pub mod error;
pub mod ledger;

pub use config::{CorruptStorePolicy, LedgerConfig};
pub use error::LedgerError;
pub use ledger::Ledger;
