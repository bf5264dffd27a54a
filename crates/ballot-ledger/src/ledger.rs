//! # ledger
//!
//! why: keep the in-memory chain and its durable copy in step, one writer at a time
//! relations: uses ballot-core codec for digests, a ballot-storage Storage for persistence
//! what: Ledger handle, atomic check-then-append, integrity verification, snapshots

use std::sync::{Mutex, MutexGuard};

use ballot_core::{codec, Entry, Payload, VoteRecord};
use ballot_storage::Storage;
use tracing::{debug, info, warn};

use crate::config::{CorruptStorePolicy, LedgerConfig};
use crate::error::LedgerError;

/// The append-only vote chain
///
/// One `Ledger` owns its store for its whole life; nothing else may write to
/// it. Every operation takes the same lock, so a vote check and its append
/// happen as one step and readers never see a half-written chain. Share it
/// between threads as `Arc<Ledger<S>>`.
pub struct Ledger<S: Storage> {
    hold_on_integrity_violation: bool,
    inner: Mutex<LedgerState<S>>,
}

struct LedgerState<S> {
    /// never empty once initialized: genesis is always first
    entries: Vec<Entry>,
    storage: S,
    /// set when verification fails and holding is enabled
    held: bool,
}

impl<S> LedgerState<S> {
    fn tip(&self) -> &Entry {
        &self.entries[self.entries.len() - 1]
    }

    fn has_voter(&self, voter_id: &str) -> bool {
        self.entries
            .iter()
            .skip(1)
            .any(|entry| entry.payload.voter_id() == Some(voter_id))
    }
}

impl<S: Storage> LedgerState<S> {
    fn append(&mut self, payload: Payload) -> Result<Entry, LedgerError> {
        if self.held {
            return Err(LedgerError::AppendsHeld);
        }

        let entry = Entry::new(
            self.entries.len() as u64,
            self.tip().digest.clone(),
            payload,
        );
        self.entries.push(entry);

        if let Err(err) = self.storage.save(&self.entries) {
            // the vote did not happen
            self.entries.pop();
            warn!(error = %err, "failed to persist entry, rolled back");
            return Err(LedgerError::StorageWrite(err));
        }

        let entry = self.tip().clone();
        debug!(
            index = entry.sequence_index,
            digest = %entry.digest,
            "appended entry"
        );
        Ok(entry)
    }
}

impl<S: Storage> Ledger<S> {
    /// Load the chain from `storage`, creating and persisting genesis if the
    /// store is empty
    pub fn initialize(mut storage: S, config: &LedgerConfig) -> Result<Self, LedgerError> {
        let loaded = match storage.load() {
            Ok(entries) => entries,
            Err(err)
                if err.is_malformed() && config.corrupt_store == CorruptStorePolicy::Recreate =>
            {
                warn!(error = %err, "chain store is unreadable, recreating from genesis");
                Vec::new()
            }
            Err(err) => return Err(LedgerError::StorageRead(err)),
        };

        let entries = if loaded.is_empty() {
            let entries = vec![Entry::genesis()];
            storage.save(&entries).map_err(LedgerError::StorageWrite)?;
            info!(digest = %entries[0].digest, "created genesis entry");
            entries
        } else {
            info!(entries = loaded.len(), "loaded vote chain");
            loaded
        };

        Ok(Self {
            hold_on_integrity_violation: config.hold_on_integrity_violation,
            inner: Mutex::new(LedgerState {
                entries,
                storage,
                held: false,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState<S>> {
        // appends roll back before the guard drops, so the chain is intact
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("ledger lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// The most recent entry; genesis for a fresh chain
    pub fn tip(&self) -> Entry {
        self.lock().tip().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Always false for an initialized ledger, which holds at least genesis
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Append a payload without any voter check
    ///
    /// The new entry is returned only once the whole chain has been saved. If
    /// saving fails the chain is left exactly as it was.
    pub fn append(&self, payload: Payload) -> Result<Entry, LedgerError> {
        self.lock().append(payload)
    }

    /// Record a vote unless this voter already has one on the chain
    ///
    /// The check and the append run under one lock acquisition, so two
    /// concurrent calls for the same voter record at most one vote.
    pub fn cast_vote(&self, vote: VoteRecord) -> Result<Entry, LedgerError> {
        let mut state = self.lock();
        if state.has_voter(&vote.voter_id) {
            warn!(voter = %vote.voter_id, "rejected duplicate vote");
            return Err(LedgerError::DuplicateVote {
                voter_id: vote.voter_id,
            });
        }
        state.append(Payload::Vote(vote))
    }

    /// Whether any entry after genesis carries this voter id
    pub fn has_voter(&self, voter_id: &str) -> bool {
        self.lock().has_voter(voter_id)
    }

    /// Check digests and chain linkage, reporting the first broken entry
    ///
    /// Each entry after genesis must hash to its stored digest and point at
    /// its predecessor's stored digest. Voter uniqueness is not checked here.
    pub fn verify(&self) -> Result<(), LedgerError> {
        let mut state = self.lock();
        let result = verify_entries(&state.entries);
        if let Err(err) = &result {
            warn!(error = %err, "chain failed verification");
            if self.hold_on_integrity_violation && !state.held {
                warn!("holding further appends pending audit");
                state.held = true;
            }
        }
        result
    }

    /// True when [`Ledger::verify`] finds nothing wrong
    pub fn validate(&self) -> bool {
        self.verify().is_ok()
    }

    /// Whether appends are held after a failed verification
    pub fn integrity_hold(&self) -> bool {
        self.lock().held
    }

    /// An owned copy of the chain
    pub fn snapshot(&self) -> Vec<Entry> {
        self.lock().entries.clone()
    }

    /// Shut the ledger down and hand back its store
    pub fn into_storage(self) -> S {
        let state = self
            .inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.storage
    }
}

fn verify_entries(entries: &[Entry]) -> Result<(), LedgerError> {
    for (position, pair) in entries.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let index = position as u64 + 1;

        if !codec::verify(current) {
            return Err(LedgerError::IntegrityViolation {
                index,
                reason: "stored digest does not match entry contents".into(),
            });
        }

        if current.previous_digest != previous.digest {
            return Err(LedgerError::IntegrityViolation {
                index,
                reason: "previous digest does not match predecessor".into(),
            });
        }
    }
    Ok(())
}
