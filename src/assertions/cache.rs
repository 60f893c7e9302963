use crate::audit::AuditModel;
use crate::ballots::{CandidateIndex, VoteTable};

use super::{DifficultyAndMargin, NotEliminatedBefore};

/// Precomputed difficulty and margin for every ordered candidate pair's NEB
/// assertion.
///
/// The frontier search scores NEB candidates for every suffix it expands;
/// the dense matrix makes each lookup O(1). Diagonal entries are
/// unconfirmable by construction.
#[derive(Debug, Clone)]
pub struct NebCache {
    num_candidates: u32,
    entries: Vec<DifficultyAndMargin>,
}

impl NebCache {
    /// Scores `NEB(winner, loser)` for every ordered pair under the given
    /// audit model.
    pub fn new(votes: &VoteTable, audit: &AuditModel) -> Self {
        let n = votes.num_candidates();
        let mut entries = Vec::with_capacity((n as usize) * (n as usize));
        for winner in votes.all_candidates() {
            for loser in votes.all_candidates() {
                if winner == loser {
                    entries.push(DifficultyAndMargin {
                        difficulty: f64::INFINITY,
                        margin: 0,
                    });
                } else {
                    let assertion = NotEliminatedBefore { winner, loser };
                    entries.push(assertion.difficulty_on(votes, audit));
                }
            }
        }
        NebCache {
            num_candidates: n,
            entries,
        }
    }

    /// Cached score of `NEB(winner, loser)`.
    pub fn get(&self, winner: CandidateIndex, loser: CandidateIndex) -> DifficultyAndMargin {
        self.entries[winner.as_usize() * self.num_candidates as usize + loser.as_usize()]
    }

    /// Number of candidates the cache was built for.
    pub fn num_candidates(&self) -> u32 {
        self.num_candidates
    }
}
