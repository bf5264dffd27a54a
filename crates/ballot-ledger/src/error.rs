use ballot_storage::StorageError;
use thiserror::Error;

/// Errors produced by ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read chain store: {0}")]
    StorageRead(#[source] StorageError),

    #[error("failed to write chain store: {0}")]
    StorageWrite(#[source] StorageError),

    #[error("integrity violation at entry {index}: {reason}")]
    IntegrityViolation { index: u64, reason: String },

    #[error("appends are held until the integrity violation is audited")]
    AppendsHeld,

    #[error("voter {voter_id} has already voted")]
    DuplicateVote { voter_id: String },
}
