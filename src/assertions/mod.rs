//! Pairwise assertions over elimination orders.
//!
//! Two variants exist. A [`NotEliminatedBefore`] (NEB) assertion claims its
//! winner out-polls its loser at every stage of tabulation, so the loser can
//! never outlast the winner. A [`NotEliminatedNext`] (NEN) assertion claims
//! that, when exactly its continuing set remains, its winner out-polls its
//! loser and therefore is not the next candidate eliminated.
//!
//! Each variant can test an elimination-order suffix (see
//! [`SuffixEffect`]) and compute its difficulty and margin under an audit
//! model. The search consults [`NebCache`] instead of recomputing NEB
//! difficulties, and uses the `find_best` helpers to pick the cheapest
//! assertion able to rule out a suffix.

mod cache;

pub use cache::NebCache;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::audit::AuditModel;
use crate::ballots::{CandidateIndex, VoteTable};

/// What applying an assertion to an elimination-order suffix proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixEffect {
    /// The suffix is compatible with the assertion.
    Ok,
    /// Every complete order ending with this suffix is ruled out.
    Contradiction,
    /// The suffix is too short to decide; extensions must be examined.
    NeedsMoreDetail,
}

/// Difficulty and margin of a single pairwise comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyAndMargin {
    /// Auditing effort under the chosen model, `+∞` if unconfirmable.
    pub difficulty: f64,
    /// Reported vote difference, floored at zero.
    pub margin: u64,
}

/// Asserts `winner` out-polls `loser` at every stage of tabulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotEliminatedBefore {
    pub winner: CandidateIndex,
    pub loser: CandidateIndex,
}

impl NotEliminatedBefore {
    /// Difficulty of confirming the assertion: the winner's first-preference
    /// tally against the loser's tally in the head-to-head restriction.
    pub fn difficulty_on(&self, votes: &VoteTable, audit: &AuditModel) -> DifficultyAndMargin {
        let winner_tally = votes.first_pref_tally(self.winner);
        let loser_tally = votes.restricted_tallies(&[self.winner, self.loser])[1];
        DifficultyAndMargin {
            difficulty: audit.difficulty(winner_tally, loser_tally),
            margin: winner_tally.saturating_sub(loser_tally),
        }
    }

    /// Tests the assertion against a suffix, scanning from the winner end.
    /// Meeting the assertion's winner first is consistent; meeting its loser
    /// first means the loser outlasted the winner.
    pub fn effect(&self, suffix: &[CandidateIndex]) -> SuffixEffect {
        for &candidate in suffix.iter().rev() {
            if candidate == self.winner {
                return SuffixEffect::Ok;
            }
            if candidate == self.loser {
                return SuffixEffect::Contradiction;
            }
        }
        SuffixEffect::NeedsMoreDetail
    }

    /// Cheapest NEB assertion ruling out every completion of a suffix that
    /// starts with `candidate` and continues with `tail`.
    ///
    /// For a tail member `d`, `NEB(candidate, d)` contradicts `d` outlasting
    /// `candidate`; for anyone else, `NEB(d, candidate)` contradicts `d`
    /// being eliminated before `candidate`. Returns `None` for a
    /// one-candidate contest.
    pub fn find_best(
        candidate: CandidateIndex,
        tail: &[CandidateIndex],
        cache: &NebCache,
    ) -> Option<(NotEliminatedBefore, DifficultyAndMargin)> {
        let mut best: Option<(NotEliminatedBefore, DifficultyAndMargin)> = None;
        for other in (0..cache.num_candidates()).map(CandidateIndex) {
            if other == candidate {
                continue;
            }
            let assertion = if tail.contains(&other) {
                NotEliminatedBefore {
                    winner: candidate,
                    loser: other,
                }
            } else {
                NotEliminatedBefore {
                    winner: other,
                    loser: candidate,
                }
            };
            let scored = cache.get(assertion.winner, assertion.loser);
            if best
                .as_ref()
                .map_or(true, |(_, held)| scored.difficulty < held.difficulty)
            {
                best = Some((assertion, scored));
            }
        }
        best
    }
}

/// Asserts that, when exactly `continuing` remains, `winner` out-polls
/// `loser` and so is not the next candidate eliminated.
///
/// The continuing set is stored ascending; construct through
/// [`NotEliminatedNext::new`] so structural equality is order-independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotEliminatedNext {
    pub winner: CandidateIndex,
    pub loser: CandidateIndex,
    pub continuing: Vec<CandidateIndex>,
}

impl NotEliminatedNext {
    /// Builds the assertion with the continuing set normalised ascending.
    pub fn new(
        winner: CandidateIndex,
        loser: CandidateIndex,
        continuing: &[CandidateIndex],
    ) -> Self {
        let mut continuing = continuing.to_vec();
        continuing.sort_unstable();
        NotEliminatedNext {
            winner,
            loser,
            continuing,
        }
    }

    fn is_continuing(&self, candidate: CandidateIndex) -> bool {
        self.continuing.binary_search(&candidate).is_ok()
    }

    /// Difficulty of confirming the assertion within its continuing set.
    pub fn difficulty_on(&self, votes: &VoteTable, audit: &AuditModel) -> DifficultyAndMargin {
        let tallies = votes.restricted_tallies(&self.continuing);
        let winner_tally = self
            .continuing
            .iter()
            .position(|&c| c == self.winner)
            .map_or(0, |p| tallies[p]);
        let loser_tally = self
            .continuing
            .iter()
            .position(|&c| c == self.loser)
            .map_or(0, |p| tallies[p]);
        DifficultyAndMargin {
            difficulty: audit.difficulty(winner_tally, loser_tally),
            margin: winner_tally.saturating_sub(loser_tally),
        }
    }

    /// Tests the assertion against a suffix.
    ///
    /// Only the last `|continuing|` suffix entries matter: when they are a
    /// permutation of the continuing set led by the assertion's winner, the
    /// winner would be the next eliminated, which the assertion forbids. A
    /// shorter suffix wholly inside the continuing set stays undecided until
    /// it either contains the winner or grows past the set.
    pub fn effect(&self, suffix: &[CandidateIndex]) -> SuffixEffect {
        let span = self.continuing.len();
        let tail = &suffix[suffix.len().saturating_sub(span)..];
        if tail.iter().any(|&c| !self.is_continuing(c)) {
            return SuffixEffect::Ok;
        }
        if suffix.len() >= span {
            if tail.first() == Some(&self.winner) {
                SuffixEffect::Contradiction
            } else {
                SuffixEffect::Ok
            }
        } else if tail.contains(&self.winner) {
            SuffixEffect::Ok
        } else {
            SuffixEffect::NeedsMoreDetail
        }
    }

    /// Cheapest NEN assertion showing `winner` is not the next eliminated
    /// among `continuing`: the loser with the lowest restricted tally gives
    /// the widest margin. Returns `None` when no other candidate continues.
    pub fn find_best(
        votes: &VoteTable,
        audit: &AuditModel,
        continuing: &[CandidateIndex],
        winner: CandidateIndex,
    ) -> Option<(NotEliminatedNext, DifficultyAndMargin)> {
        let tallies = votes.restricted_tallies(continuing);
        let winner_position = continuing.iter().position(|&c| c == winner)?;
        let winner_tally = tallies[winner_position];
        let mut lowest: Option<(CandidateIndex, u64)> = None;
        for (position, &candidate) in continuing.iter().enumerate() {
            if candidate == winner {
                continue;
            }
            if lowest.map_or(true, |(_, tally)| tallies[position] < tally) {
                lowest = Some((candidate, tallies[position]));
            }
        }
        let (loser, loser_tally) = lowest?;
        Some((
            NotEliminatedNext::new(winner, loser, continuing),
            DifficultyAndMargin {
                difficulty: audit.difficulty(winner_tally, loser_tally),
                margin: winner_tally.saturating_sub(loser_tally),
            },
        ))
    }
}

/// A pairwise assertion over elimination orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Assertion {
    #[serde(rename = "NEB")]
    Neb(NotEliminatedBefore),
    #[serde(rename = "NEN")]
    Nen(NotEliminatedNext),
}

impl Assertion {
    /// Tests the assertion against an elimination-order suffix.
    pub fn effect(&self, suffix: &[CandidateIndex]) -> SuffixEffect {
        match self {
            Assertion::Neb(neb) => neb.effect(suffix),
            Assertion::Nen(nen) => nen.effect(suffix),
        }
    }

    /// Difficulty and margin of the assertion under an audit model.
    pub fn difficulty_on(&self, votes: &VoteTable, audit: &AuditModel) -> DifficultyAndMargin {
        match self {
            Assertion::Neb(neb) => neb.difficulty_on(votes, audit),
            Assertion::Nen(nen) => nen.difficulty_on(votes, audit),
        }
    }

    /// True for the NEB variant.
    pub fn is_neb(&self) -> bool {
        matches!(self, Assertion::Neb(_))
    }
}

/// An assertion together with its score and collaborator-owned status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionAndDifficulty {
    pub assertion: Assertion,
    pub difficulty: f64,
    pub margin: u64,
    /// Opaque annotations added by persistence or service layers; the core
    /// never populates this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BTreeMap<String, serde_json::Value>>,
}

impl AssertionAndDifficulty {
    pub(crate) fn new(assertion: Assertion, scored: DifficultyAndMargin) -> Self {
        AssertionAndDifficulty {
            assertion,
            difficulty: scored.difficulty,
            margin: scored.margin,
            status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(index: u32) -> CandidateIndex {
        CandidateIndex(index)
    }

    #[test]
    fn neb_effect_scans_from_winner_end() {
        let neb = NotEliminatedBefore {
            winner: c(2),
            loser: c(1),
        };
        assert_eq!(neb.effect(&[c(0), c(2), c(3)]), SuffixEffect::Ok);
        assert_eq!(neb.effect(&[c(2), c(1), c(3)]), SuffixEffect::Contradiction);
        assert_eq!(neb.effect(&[c(0), c(3)]), SuffixEffect::NeedsMoreDetail);
        assert_eq!(neb.effect(&[c(1), c(2)]), SuffixEffect::Ok);
    }

    #[test]
    fn nen_effect_matches_tail_permutations() {
        let nen = NotEliminatedNext::new(c(2), c(3), &[c(3), c(0), c(2)]);
        assert_eq!(nen.continuing, vec![c(0), c(2), c(3)]);
        // Tail leaves the continuing set: compatible.
        assert_eq!(nen.effect(&[c(1), c(0), c(3)]), SuffixEffect::Ok);
        // Tail is a permutation led by the winner: contradiction.
        assert_eq!(
            nen.effect(&[c(2), c(0), c(3)]),
            SuffixEffect::Contradiction
        );
        // Permutation led by someone else: compatible.
        assert_eq!(nen.effect(&[c(0), c(2), c(3)]), SuffixEffect::Ok);
        // Shorter suffix inside the set, winner absent: undecided.
        assert_eq!(nen.effect(&[c(0), c(3)]), SuffixEffect::NeedsMoreDetail);
        // Shorter suffix containing the winner: compatible.
        assert_eq!(nen.effect(&[c(2), c(3)]), SuffixEffect::Ok);
    }

    #[test]
    fn nen_equality_ignores_continuing_order() {
        let a = NotEliminatedNext::new(c(0), c(1), &[c(2), c(0), c(1)]);
        let b = NotEliminatedNext::new(c(0), c(1), &[c(1), c(2), c(0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn serde_tags_match_wire_names() {
        let neb = Assertion::Neb(NotEliminatedBefore {
            winner: c(0),
            loser: c(2),
        });
        let json = serde_json::to_value(&neb).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type": "NEB", "winner": 0, "loser": 2})
        );
        let nen = Assertion::Nen(NotEliminatedNext::new(c(2), c(0), &[c(2), c(0)]));
        let json = serde_json::to_value(&nen).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type": "NEN", "winner": 2, "loser": 0, "continuing": [0, 2]})
        );
    }
}
