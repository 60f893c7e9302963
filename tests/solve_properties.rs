//! Randomized invariants of the solve pipeline.
//!
//! Random elections frequently tie or leave zero margins, which are
//! legitimate typed errors; those cases are skipped so the properties only
//! constrain successful solves.

use irv_rla::pruning::{Continuation, TreeNode};
use irv_rla::trim::{sort_assertions, trim_assertions, TrimOutcome};
use irv_rla::{
    AuditError, AuditModel, AuditProblem, AuditSolution, CandidateIndex, TimeOut, TrimAlgorithm,
    Vote,
};
use proptest::prelude::*;

fn arb_election(max_candidates: u32) -> impl Strategy<Value = (Vec<Vote>, u32)> {
    (2u32..=max_candidates).prop_flat_map(|num_candidates| {
        let ranking = proptest::collection::vec(0..num_candidates, 1..(num_candidates as usize * 2))
            .prop_map(|raw| {
                let mut prefs: Vec<CandidateIndex> = Vec::new();
                for candidate in raw {
                    let candidate = CandidateIndex(candidate);
                    if !prefs.contains(&candidate) {
                        prefs.push(candidate);
                    }
                }
                prefs
            });
        let vote = (1u64..50, ranking).prop_map(|(n, prefs)| Vote { n, prefs });
        (
            proptest::collection::vec(vote, 1..10),
            Just(num_candidates),
        )
    })
}

fn solve_or_skip(
    votes: &[Vote],
    num_candidates: u32,
    winner: Option<CandidateIndex>,
    trim: TrimAlgorithm,
) -> Result<Option<AuditSolution>, TestCaseError> {
    let problem = AuditProblem {
        metadata: serde_json::Value::Null,
        votes: votes.to_vec(),
        num_candidates,
        winner,
        audit: AuditModel::OneOnMargin {
            total_auditable_ballots: votes.iter().map(|v| v.n).sum::<u64>().max(1),
        },
        trim_algorithm: Some(trim),
        difficulty_estimate: None,
        time_limit_seconds: None,
    };
    match problem.solve() {
        Ok(solution) => Ok(Some(solution)),
        Err(AuditError::TiedWinners(_)) | Err(AuditError::CouldNotRuleOut(_)) => Ok(None),
        Err(other) => Err(TestCaseError::fail(format!("unexpected error {other:?}"))),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_retained_set_rules_out_every_loser(
        (votes, num_candidates) in arb_election(5)
    ) {
        let Some(solution) =
            solve_or_skip(&votes, num_candidates, None, TrimAlgorithm::MinimizeAssertions)?
        else {
            return Ok(());
        };
        let mut timeout = TimeOut::unbounded();
        for candidate in (0..num_candidates).map(CandidateIndex) {
            if candidate == solution.winner {
                continue;
            }
            let tree = TreeNode::build(
                candidate,
                &solution.assertions,
                num_candidates,
                Continuation::StopImmediately,
                &mut timeout,
            )
            .expect("tree builds");
            prop_assert!(!tree.valid, "candidate {candidate:?} not ruled out");
        }
    }

    #[test]
    fn prop_no_duplicates_and_canonical_order(
        (votes, num_candidates) in arb_election(5)
    ) {
        let Some(solution) =
            solve_or_skip(&votes, num_candidates, None, TrimAlgorithm::MinimizeTree)?
        else {
            return Ok(());
        };
        for (i, a) in solution.assertions.iter().enumerate() {
            for b in solution.assertions.iter().skip(i + 1) {
                prop_assert_ne!(&a.assertion, &b.assertion);
            }
        }
        let mut sorted = solution.assertions.clone();
        sort_assertions(&mut sorted);
        prop_assert_eq!(sorted, solution.assertions);
    }

    #[test]
    fn prop_difficulty_and_margin_are_minimax(
        (votes, num_candidates) in arb_election(5)
    ) {
        let Some(solution) = solve_or_skip(&votes, num_candidates, None, TrimAlgorithm::None)?
        else {
            return Ok(());
        };
        let max_difficulty = solution
            .assertions
            .iter()
            .map(|a| a.difficulty)
            .fold(0.0, f64::max);
        let min_margin = solution
            .assertions
            .iter()
            .map(|a| a.margin)
            .min()
            .unwrap_or(0);
        prop_assert_eq!(solution.difficulty, max_difficulty);
        prop_assert_eq!(solution.margin, min_margin);
        for assertion in &solution.assertions {
            prop_assert!(assertion.difficulty.is_finite());
            prop_assert!(assertion.difficulty >= 0.0);
        }
    }

    #[test]
    fn prop_trim_is_idempotent(
        (votes, num_candidates) in arb_election(5)
    ) {
        for trim in [TrimAlgorithm::MinimizeTree, TrimAlgorithm::MinimizeAssertions] {
            let Some(solution) = solve_or_skip(&votes, num_candidates, None, trim)? else {
                return Ok(());
            };
            let mut retrimmed = solution.assertions.clone();
            let outcome = trim_assertions(
                &mut retrimmed,
                solution.winner,
                num_candidates,
                trim,
                &mut TimeOut::unbounded(),
            )
            .expect("retrims");
            prop_assert_eq!(outcome, TrimOutcome::Completed);
            prop_assert_eq!(retrimmed, solution.assertions);
        }
    }

    #[test]
    fn prop_claimed_winner_agrees_with_unclaimed_solve(
        (votes, num_candidates) in arb_election(5)
    ) {
        let Some(unclaimed) =
            solve_or_skip(&votes, num_candidates, None, TrimAlgorithm::MinimizeTree)?
        else {
            return Ok(());
        };
        let Some(claimed) = solve_or_skip(
            &votes,
            num_candidates,
            Some(unclaimed.winner),
            TrimAlgorithm::MinimizeTree,
        )?
        else {
            return Ok(());
        };
        prop_assert_eq!(&claimed.assertions, &unclaimed.assertions);
        prop_assert_eq!(claimed.difficulty, unclaimed.difficulty);
        prop_assert_eq!(claimed.margin, unclaimed.margin);
        prop_assert_eq!(claimed.winner, unclaimed.winner);
    }

    #[test]
    fn prop_trimmed_subset_of_untrimmed(
        (votes, num_candidates) in arb_election(5)
    ) {
        let Some(full) = solve_or_skip(&votes, num_candidates, None, TrimAlgorithm::None)? else {
            return Ok(());
        };
        for trim in [TrimAlgorithm::MinimizeTree, TrimAlgorithm::MinimizeAssertions] {
            let Some(trimmed) = solve_or_skip(&votes, num_candidates, None, trim)? else {
                return Ok(());
            };
            for assertion in &trimmed.assertions {
                prop_assert!(full.assertions.contains(assertion));
            }
        }
    }
}
