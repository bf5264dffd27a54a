//! # tally
//!
//! why: turn a chain snapshot into per-candidate vote counts for results
//! relations: consumes ballot-ledger snapshots, feeds the results collaborator
//! what: tally over all candidates seen, tally over a fixed candidate roster

use std::collections::BTreeMap;

use crate::entry::Entry;

/// Count votes per candidate id
///
/// Genesis and any other marker entries are skipped, as are payloads
/// without a string `candidateId`.
pub fn tally(entries: &[Entry]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for candidate in entries.iter().filter_map(|e| e.payload.candidate_id()) {
        *counts.entry(candidate.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Count votes for a known roster of candidates, in roster order
///
/// Candidates without votes report zero. Votes for ids outside the roster
/// are not counted.
pub fn tally_for<I, S>(entries: &[Entry], candidate_ids: I) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let counts = tally(entries);
    candidate_ids
        .into_iter()
        .map(Into::into)
        .map(|id| {
            let votes = counts.get(&id).copied().unwrap_or(0);
            (id, votes)
        })
        .collect()
}
