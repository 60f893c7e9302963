//! Frontier search for the optimum assertion set.
//!
//! The search maintains a max-priority queue of elimination-order suffixes,
//! each scored with the cheapest known assertion ruling out every complete
//! order that ends with it. Popping always takes the most expensive entry:
//! either its assertion is already no worse than the established lower bound
//! and can be committed, or the suffix is expanded one candidate deeper in
//! the hope of a cheaper contradiction.
//!
//! Reaching a complete order fixes a floor: some assertion of at least that
//! difficulty is unavoidable, so the lower bound rises and everything at or
//! below it commits for free. The dive follows the reported elimination
//! order straight to one such complete order early, which collapses most of
//! the frontier before it is ever expanded.

use std::collections::BinaryHeap;

use crate::assertions::{
    Assertion, AssertionAndDifficulty, DifficultyAndMargin, NebCache, NotEliminatedBefore,
    NotEliminatedNext,
};
use crate::audit::AuditModel;
use crate::ballots::{CandidateIndex, VoteTable};
use crate::errors::{AuditError, AuditResult};
use crate::timeout::TimeOut;

/// A suffix under consideration, scored with the cheapest assertion known to
/// rule out all of its completions.
#[derive(Debug, Clone)]
struct FrontierEntry {
    /// The suffix, earliest elimination first, eventual winner last.
    pi: Vec<CandidateIndex>,
    /// Length of the ancestor suffix at which `assertion` was chosen; the
    /// ancestor is the last `best_ancestor_length` entries of `pi`.
    best_ancestor_length: usize,
    assertion: Assertion,
    difficulty: f64,
    margin: u64,
    /// Child already explored by a dive; expansion skips it.
    dive_done: Option<CandidateIndex>,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.difficulty.total_cmp(&other.difficulty).is_eq()
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.difficulty.total_cmp(&other.difficulty)
    }
}

/// Runs the frontier search for a tabulated contest.
///
/// `winner` must be the unique tabulated winner and `elimination_order` the
/// concrete order recorded for it; the dive consumes that order in reverse.
pub fn run_search(
    votes: &VoteTable,
    audit: &AuditModel,
    winner: CandidateIndex,
    elimination_order: &[CandidateIndex],
    timeout: &mut TimeOut,
) -> AuditResult<Vec<AssertionAndDifficulty>> {
    let engine = SearchEngine {
        votes,
        audit,
        neb_cache: NebCache::new(votes, audit),
        winner,
        reversed_order: elimination_order.iter().rev().copied().collect(),
        frontier: BinaryHeap::new(),
        assertions: Vec::new(),
        lower_bound: 0.0,
    };
    engine.run(timeout)
}

struct SearchEngine<'a> {
    votes: &'a VoteTable,
    audit: &'a AuditModel,
    neb_cache: NebCache,
    winner: CandidateIndex,
    /// Reported elimination order, winner first.
    reversed_order: Vec<CandidateIndex>,
    frontier: BinaryHeap<FrontierEntry>,
    assertions: Vec<AssertionAndDifficulty>,
    lower_bound: f64,
}

impl SearchEngine<'_> {
    fn run(mut self, timeout: &mut TimeOut) -> AuditResult<Vec<AssertionAndDifficulty>> {
        let num_candidates = self.votes.num_candidates() as usize;
        for candidate in self.votes.all_candidates() {
            if candidate == self.winner {
                continue;
            }
            let pi = vec![candidate];
            let (assertion, scored) = self.find_best(&pi);
            self.frontier.push(FrontierEntry {
                best_ancestor_length: pi.len(),
                pi,
                assertion,
                difficulty: scored.difficulty,
                margin: scored.margin,
                dive_done: None,
            });
        }
        while let Some(entry) = self.frontier.pop() {
            if timeout.quick_check() {
                return Err(AuditError::TimeoutFindingAssertions(
                    entry.difficulty.max(self.lower_bound),
                ));
            }
            if entry.difficulty <= self.lower_bound {
                self.commit(entry);
                continue;
            }
            if entry.dive_done.is_none() {
                self.dive(entry, timeout)?;
                continue;
            }
            let skip = entry.dive_done;
            for candidate in self.votes.all_candidates() {
                if entry.pi.contains(&candidate) || Some(candidate) == skip {
                    continue;
                }
                let child = self.extend(&entry, candidate);
                if child.pi.len() == num_candidates {
                    self.leaf_rule(child)?;
                } else {
                    self.frontier.push(child);
                }
            }
        }
        Ok(self.assertions)
    }

    /// Follows the reported elimination order from `entry` down to one
    /// complete order, parking every visited node back on the frontier so
    /// its remaining children are expanded later. The complete order raises
    /// the lower bound, after which the original entry often commits
    /// immediately.
    fn dive(&mut self, entry: FrontierEntry, timeout: &mut TimeOut) -> AuditResult<()> {
        let num_candidates = self.votes.num_candidates() as usize;
        let origin = entry.clone();
        let mut current = entry;
        loop {
            if timeout.quick_check() {
                return Err(AuditError::TimeoutFindingAssertions(
                    current.difficulty.max(self.lower_bound),
                ));
            }
            let next = self
                .reversed_order
                .iter()
                .copied()
                .find(|candidate| !current.pi.contains(candidate));
            let Some(candidate) = next else {
                return Ok(());
            };
            let child = self.extend(&current, candidate);
            let mut parked = current;
            parked.dive_done = Some(candidate);
            self.frontier.push(parked);
            if child.pi.len() == num_candidates {
                self.leaf_rule(child)?;
                if origin.difficulty <= self.lower_bound {
                    self.commit(origin);
                }
                return Ok(());
            }
            if child.difficulty <= self.lower_bound {
                self.commit(child);
                return Ok(());
            }
            current = child;
        }
    }

    /// Prepends `candidate` to the suffix, keeping the ancestor's assertion
    /// unless the extended suffix admits a strictly cheaper one. Keeping the
    /// ancestor on ties lets a later commit prune a larger cone.
    fn extend(&self, entry: &FrontierEntry, candidate: CandidateIndex) -> FrontierEntry {
        let mut pi = Vec::with_capacity(entry.pi.len() + 1);
        pi.push(candidate);
        pi.extend_from_slice(&entry.pi);
        let (assertion, scored) = self.find_best(&pi);
        if scored.difficulty < entry.difficulty {
            FrontierEntry {
                best_ancestor_length: pi.len(),
                pi,
                assertion,
                difficulty: scored.difficulty,
                margin: scored.margin,
                dive_done: None,
            }
        } else {
            FrontierEntry {
                pi,
                best_ancestor_length: entry.best_ancestor_length,
                assertion: entry.assertion.clone(),
                difficulty: entry.difficulty,
                margin: entry.margin,
                dive_done: None,
            }
        }
    }

    /// The cheapest assertion ruling out every completion of `pi`: the best
    /// NEB involving the next-eliminated candidate, or, once the suffix has
    /// at least two members, the NEN naming it within exactly the suffix
    /// set.
    fn find_best(&self, pi: &[CandidateIndex]) -> (Assertion, DifficultyAndMargin) {
        let candidate = pi[0];
        let mut best: Option<(Assertion, DifficultyAndMargin)> =
            NotEliminatedBefore::find_best(candidate, &pi[1..], &self.neb_cache)
                .map(|(neb, scored)| (Assertion::Neb(neb), scored));
        if pi.len() >= 2 {
            if let Some((nen, scored)) =
                NotEliminatedNext::find_best(self.votes, self.audit, pi, candidate)
            {
                if best
                    .as_ref()
                    .map_or(true, |(_, held)| scored.difficulty < held.difficulty)
                {
                    best = Some((Assertion::Nen(nen), scored));
                }
            }
        }
        best.unwrap_or((
            Assertion::Neb(NotEliminatedBefore {
                winner: candidate,
                loser: candidate,
            }),
            DifficultyAndMargin {
                difficulty: f64::INFINITY,
                margin: 0,
            },
        ))
    }

    /// A complete order was reached: its cheapest assertion is unavoidable,
    /// so the lower bound rises to it before the order is committed.
    fn leaf_rule(&mut self, entry: FrontierEntry) -> AuditResult<()> {
        if entry.difficulty.is_infinite() {
            return Err(AuditError::CouldNotRuleOut(entry.pi));
        }
        if entry.difficulty > self.lower_bound {
            self.lower_bound = entry.difficulty;
        }
        self.commit(entry);
        Ok(())
    }

    /// Adopts the entry's assertion and drops every frontier entry already
    /// covered by it: anything whose suffix extends the ancestor suffix the
    /// assertion was chosen at.
    fn commit(&mut self, entry: FrontierEntry) {
        if self
            .assertions
            .iter()
            .any(|held| held.assertion == entry.assertion)
        {
            return;
        }
        let ancestor = &entry.pi[entry.pi.len() - entry.best_ancestor_length..];
        self.frontier.retain(|other| !other.pi.ends_with(ancestor));
        self.assertions.push(AssertionAndDifficulty::new(
            entry.assertion,
            DifficultyAndMargin {
                difficulty: entry.difficulty,
                margin: entry.margin,
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballots::Vote;
    use crate::tabulation::tabulate;

    fn table(votes: &[(u64, &[u32])], num_candidates: u32) -> VoteTable {
        let votes = votes
            .iter()
            .map(|(n, prefs)| Vote {
                n: *n,
                prefs: prefs.iter().map(|&c| CandidateIndex(c)).collect(),
            })
            .collect();
        VoteTable::new(votes, num_candidates).expect("valid table")
    }

    #[test]
    fn two_candidate_contest_needs_one_assertion() {
        let votes = table(&[(60, &[0]), (40, &[1])], 2);
        let audit = AuditModel::OneOnMargin {
            total_auditable_ballots: 100,
        };
        let outcome = tabulate(&votes, &mut TimeOut::unbounded()).expect("tabulates");
        let assertions = run_search(
            &votes,
            &audit,
            CandidateIndex(0),
            &outcome.elimination_order,
            &mut TimeOut::unbounded(),
        )
        .expect("searches");
        assert_eq!(assertions.len(), 1);
        assert_eq!(assertions[0].margin, 20);
        assert_eq!(assertions[0].difficulty, 5.0);
    }

    #[test]
    fn unauditable_contest_reports_the_stuck_order() {
        // A dead heat leaves every pairwise margin at zero.
        let votes = table(&[(5, &[0, 1]), (5, &[1, 0])], 2);
        let audit = AuditModel::OneOnMargin {
            total_auditable_ballots: 10,
        };
        let err = run_search(
            &votes,
            &audit,
            CandidateIndex(0),
            &[CandidateIndex(1), CandidateIndex(0)],
            &mut TimeOut::unbounded(),
        )
        .unwrap_err();
        assert!(matches!(err, AuditError::CouldNotRuleOut(_)));
    }

    #[test]
    fn committed_assertions_are_deduplicated() {
        let votes = table(
            &[(5000, &[2, 1, 0]), (1000, &[1, 2, 3]), (1500, &[3, 0]), (4000, &[0, 3]), (2000, &[3])],
            4,
        );
        let audit = AuditModel::OneOnMargin {
            total_auditable_ballots: 13500,
        };
        let outcome = tabulate(&votes, &mut TimeOut::unbounded()).expect("tabulates");
        let assertions = run_search(
            &votes,
            &audit,
            CandidateIndex(2),
            &outcome.elimination_order,
            &mut TimeOut::unbounded(),
        )
        .expect("searches");
        for (i, a) in assertions.iter().enumerate() {
            for b in assertions.iter().skip(i + 1) {
                assert_ne!(a.assertion, b.assertion);
            }
        }
    }
}
