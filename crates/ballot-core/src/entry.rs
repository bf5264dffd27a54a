//! # entry
//!
//! why: describe one immutable record of the append-only vote chain
//! relations: digest computed by codec.rs, persisted via ballot-storage
//! what: Entry struct, Payload (genesis marker or vote), VoteRecord

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::codec;

/// Payload carried by the genesis entry
pub const GENESIS_MARKER: &str = "Genesis Block";

/// `previous_digest` of the genesis entry
pub const GENESIS_PREVIOUS_DIGEST: &str = "0";

/// A single ballot as recorded on the chain
///
/// The ledger does not check that either id refers to a registered voter or
/// candidate; that is the caller's job.
///
/// Only the exact shape written by [`VoteRecord`] loads as one: unknown keys,
/// non-string ids or an explicit `null` name load as [`Payload::Other`]
/// instead, so nothing stored is lost or re-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VoteRecord {
    pub voter_id: String,
    pub candidate_id: String,
    /// Display name at the time the vote was cast
    #[serde(
        default,
        deserialize_with = "present_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub candidate_name: Option<String>,
}

// absent means None; `null` is rejected so the record falls through to Other
fn present_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    String::deserialize(deserializer).map(Some)
}

impl VoteRecord {
    pub fn new(voter_id: impl Into<String>, candidate_id: impl Into<String>) -> Self {
        Self {
            voter_id: voter_id.into(),
            candidate_id: candidate_id.into(),
            candidate_name: None,
        }
    }

    pub fn with_candidate_name(mut self, name: impl Into<String>) -> Self {
        self.candidate_name = Some(name.into());
        self
    }
}

/// What an entry records
///
/// Stored untagged: a bare JSON string for the genesis marker, an object for
/// a vote. Any other JSON value is kept verbatim as `Other`; the ledger never
/// rejects a chain because of what a payload contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Marker(String),
    Vote(VoteRecord),
    Other(Value),
}

impl Payload {
    pub fn genesis() -> Self {
        Self::Marker(GENESIS_MARKER.to_string())
    }

    pub fn as_vote(&self) -> Option<&VoteRecord> {
        match self {
            Self::Vote(vote) => Some(vote),
            Self::Marker(_) | Self::Other(_) => None,
        }
    }

    /// The `voterId` string, from a vote or from an object kept as `Other`
    pub fn voter_id(&self) -> Option<&str> {
        self.field("voterId", |vote| &vote.voter_id)
    }

    /// The `candidateId` string, from a vote or from an object kept as `Other`
    pub fn candidate_id(&self) -> Option<&str> {
        self.field("candidateId", |vote| &vote.candidate_id)
    }

    fn field<'a>(&'a self, key: &str, from_vote: fn(&VoteRecord) -> &String) -> Option<&'a str> {
        match self {
            Self::Vote(vote) => Some(from_vote(vote).as_str()),
            Self::Other(value) => value.get(key).and_then(Value::as_str),
            Self::Marker(_) => None,
        }
    }
}

impl From<VoteRecord> for Payload {
    fn from(vote: VoteRecord) -> Self {
        Self::Vote(vote)
    }
}

/// One block of the vote chain
///
/// The digest is computed once, at construction, and then stored. Loading a
/// chain from disk never recomputes it; that is what makes tampering visible.
///
/// Older chain files used `index`, `timestamp`, `data`, `previousHash` and
/// `hash`; those names are still accepted on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Position in the chain, starting at 0 for genesis
    #[serde(alias = "index")]
    pub sequence_index: u64,
    /// Creation time in epoch milliseconds
    #[serde(alias = "timestamp")]
    pub created_at: i64,
    #[serde(alias = "data")]
    pub payload: Payload,
    #[serde(alias = "previousHash")]
    pub previous_digest: String,
    #[serde(alias = "hash")]
    pub digest: String,
}

impl Entry {
    /// Create a new entry stamped with the current time
    pub fn new(sequence_index: u64, previous_digest: impl Into<String>, payload: Payload) -> Self {
        Self::with_timestamp(
            sequence_index,
            previous_digest,
            Utc::now().timestamp_millis(),
            payload,
        )
    }

    /// Create a new entry with an explicit creation time
    pub fn with_timestamp(
        sequence_index: u64,
        previous_digest: impl Into<String>,
        created_at: i64,
        payload: Payload,
    ) -> Self {
        let previous_digest = previous_digest.into();
        let digest = codec::digest(sequence_index, &previous_digest, created_at, &payload);
        Self {
            sequence_index,
            created_at,
            payload,
            previous_digest,
            digest,
        }
    }

    /// The anchor of every chain
    pub fn genesis() -> Self {
        Self::new(0, GENESIS_PREVIOUS_DIGEST, Payload::genesis())
    }

    pub fn is_genesis(&self) -> bool {
        self.sequence_index == 0
    }

    /// Build the entry that would follow this one
    pub fn successor(&self, payload: Payload) -> Self {
        Self::new(self.sequence_index + 1, self.digest.clone(), payload)
    }
}
