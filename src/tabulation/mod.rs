//! Instant-runoff tabulation with exhaustive tie exploration.
//!
//! The tabulator eliminates the lowest-tallied continuing candidate and, when
//! several candidates tie for the minimum, explores every resolution of the
//! tie. The union of winners across resolutions is the set of possible
//! winners. States are memoized by their continuing-candidate set so
//! equivalent branches are explored once.
//!
//! One concrete elimination order is also recorded: the first depth-first
//! trace, recognised by the entry condition `|eliminated| + |continuing| =
//! num_candidates`, which stops holding as soon as that trace completes.

use std::collections::HashMap;

use crate::ballots::{CandidateIndex, VoteTable};
use crate::errors::{AuditError, AuditResult};
use crate::timeout::TimeOut;

/// Possible winners of a contest and one concrete elimination order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabulationOutcome {
    /// Every candidate who wins under some resolution of ties, ascending.
    pub possible_winners: Vec<CandidateIndex>,
    /// A complete elimination order, earliest elimination first, winner
    /// last. Consistent with the first depth-first resolution of ties.
    pub elimination_order: Vec<CandidateIndex>,
}

/// Runs the contest to completion, exploring every tie resolution.
pub fn tabulate(votes: &VoteTable, timeout: &mut TimeOut) -> AuditResult<TabulationOutcome> {
    let all: Vec<CandidateIndex> = votes.all_candidates().collect();
    let mut explorer = TieExplorer {
        votes,
        timeout,
        memo: HashMap::new(),
        elimination_order: Vec::new(),
    };
    let possible_winners = explorer.explore(all)?;
    Ok(TabulationOutcome {
        possible_winners,
        elimination_order: explorer.elimination_order,
    })
}

struct TieExplorer<'a> {
    votes: &'a VoteTable,
    timeout: &'a mut TimeOut,
    /// Possible winners per continuing set, keyed by the ascending set.
    memo: HashMap<Vec<CandidateIndex>, Vec<CandidateIndex>>,
    elimination_order: Vec<CandidateIndex>,
}

impl TieExplorer<'_> {
    fn explore(&mut self, continuing: Vec<CandidateIndex>) -> AuditResult<Vec<CandidateIndex>> {
        if self.timeout.quick_check() {
            return Err(AuditError::TimeoutCheckingWinner);
        }
        let num_candidates = self.votes.num_candidates() as usize;
        if let [sole] = continuing[..] {
            if self.elimination_order.len() + 1 == num_candidates {
                self.elimination_order.push(sole);
            }
            return Ok(continuing);
        }
        if let Some(known) = self.memo.get(&continuing) {
            return Ok(known.clone());
        }
        let tallies = self.votes.restricted_tallies(&continuing);
        let minimum = tallies.iter().copied().min().unwrap_or(0);
        let mut winners: Vec<CandidateIndex> = Vec::new();
        for (position, &candidate) in continuing.iter().enumerate() {
            if tallies[position] != minimum {
                continue;
            }
            // The first depth-first trace is the only one for which the
            // eliminations recorded so far plus the continuing set cover the
            // whole contest.
            if self.elimination_order.len() + continuing.len() == num_candidates {
                self.elimination_order.push(candidate);
            }
            let mut reduced = continuing.clone();
            reduced.remove(position);
            for winner in self.explore(reduced)? {
                if !winners.contains(&winner) {
                    winners.push(winner);
                }
            }
        }
        winners.sort_unstable();
        self.memo.insert(continuing, winners.clone());
        Ok(winners)
    }
}
