//! # codec
//!
//! why: compute the digest that links each entry to its predecessor
//! relations: called by entry.rs on construction, by ballot-ledger on validation
//! what: canonical payload encoding, sha-256 digest, single-entry verification
//!
//! The preimage is part of the on-disk contract. It is the concatenation,
//! with no separators, of:
//!
//! 1. `sequence_index` in base 10
//! 2. `previous_digest` as stored
//! 3. `created_at` in base 10
//! 4. [`canonical_payload`]
//!
//! The digest is SHA-256 rendered as 64 lowercase hex characters.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::entry::{Entry, Payload};

/// Length of a rendered digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Compute the digest of an entry from its fields
pub fn digest(sequence_index: u64, previous_digest: &str, created_at: i64, payload: &Payload) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sequence_index.to_string().as_bytes());
    hasher.update(previous_digest.as_bytes());
    hasher.update(created_at.to_string().as_bytes());
    hasher.update(canonical_payload(payload).as_bytes());
    hex::encode(hasher.finalize())
}

/// Encode a payload for hashing
///
/// A marker is a JSON string literal. A vote is compact JSON with its keys
/// written in a fixed order: `voterId`, `candidateId`, then `candidateName`
/// when present. The order is spelled out here rather than left to a
/// serializer so that it cannot drift.
///
/// Any other payload is compact JSON exactly as loaded, keys in stored order.
pub fn canonical_payload(payload: &Payload) -> String {
    match payload {
        Payload::Marker(marker) => json_string(marker),
        Payload::Vote(vote) => {
            let mut out = format!(
                "{{\"voterId\":{},\"candidateId\":{}",
                json_string(&vote.voter_id),
                json_string(&vote.candidate_id),
            );
            if let Some(name) = &vote.candidate_name {
                out.push_str(",\"candidateName\":");
                out.push_str(&json_string(name));
            }
            out.push('}');
            out
        }
        Payload::Other(value) => value.to_string(),
    }
}

/// Recompute an entry's digest and compare it with the stored one
pub fn verify(entry: &Entry) -> bool {
    digest(
        entry.sequence_index,
        &entry.previous_digest,
        entry.created_at,
        &entry.payload,
    ) == entry.digest
}

fn json_string(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}
