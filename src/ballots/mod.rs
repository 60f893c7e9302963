//! Consolidated ballot data for a single instant-runoff contest.
//!
//! A [`VoteTable`] is built once per solve from consolidated rankings and is
//! immutable afterwards. First-preference tallies are cached at construction;
//! tallies restricted to an arbitrary continuing set are recomputed on demand
//! because the search asks for many different sets.

use serde::{Deserialize, Serialize};

use crate::errors::{AuditError, AuditResult};

/// Identifies a candidate by position in the contest's candidate list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CandidateIndex(pub u32);

impl CandidateIndex {
    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A consolidated ranking: `n` identical ballots listing `prefs` from the
/// highest rank down. Preferences never repeat a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Multiplicity of the ranking, at least one.
    pub n: u64,
    /// Candidate indices from most preferred to least.
    pub prefs: Vec<CandidateIndex>,
}

impl Vote {
    /// Position in `continuing` of the ballot's most preferred continuing
    /// candidate, if any preference is still continuing.
    fn top_preference_among(&self, continuing: &[CandidateIndex]) -> Option<usize> {
        self.prefs
            .iter()
            .find_map(|pref| continuing.iter().position(|c| c == pref))
    }
}

/// Immutable table of consolidated rankings with cached first-preference
/// tallies.
#[derive(Debug, Clone)]
pub struct VoteTable {
    votes: Vec<Vote>,
    num_candidates: u32,
    first_pref: Vec<u64>,
    total: u64,
}

impl VoteTable {
    /// Builds the table, validating that every preference index is inside
    /// `[0, num_candidates)`.
    pub fn new(votes: Vec<Vote>, num_candidates: u32) -> AuditResult<Self> {
        if num_candidates < 1 {
            return Err(AuditError::InvalidNumberOfCandidates);
        }
        let mut first_pref = vec![0u64; num_candidates as usize];
        let mut total = 0u64;
        for vote in &votes {
            if vote.prefs.iter().any(|c| c.0 >= num_candidates) {
                return Err(AuditError::InvalidCandidateNumber);
            }
            if let Some(first) = vote.prefs.first() {
                first_pref[first.as_usize()] += vote.n;
            }
            total += vote.n;
        }
        Ok(VoteTable {
            votes,
            num_candidates,
            first_pref,
            total,
        })
    }

    /// Tally of ballots ranking `candidate` first.
    pub fn first_pref_tally(&self, candidate: CandidateIndex) -> u64 {
        self.first_pref[candidate.as_usize()]
    }

    /// Tallies after restricting each ballot to its most preferred candidate
    /// in `continuing`. The result is aligned with the order of `continuing`;
    /// ballots preferring none of them contribute nothing.
    pub fn restricted_tallies(&self, continuing: &[CandidateIndex]) -> Vec<u64> {
        let mut tallies = vec![0u64; continuing.len()];
        for vote in &self.votes {
            if let Some(position) = vote.top_preference_among(continuing) {
                tallies[position] += vote.n;
            }
        }
        tallies
    }

    /// Total multiplicity across all rankings.
    pub fn total_votes(&self) -> u64 {
        self.total
    }

    /// Number of candidates in the contest.
    pub fn num_candidates(&self) -> u32 {
        self.num_candidates
    }

    /// Every candidate index of the contest in ascending order.
    pub fn all_candidates(&self) -> impl Iterator<Item = CandidateIndex> {
        (0..self.num_candidates).map(CandidateIndex)
    }

    /// The consolidated rankings backing the table.
    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }
}
