//! Problem and solution containers, and the solve pipeline.
//!
//! A consolidated, validated [`AuditProblem`] arrives from the boundary
//! collaborators; [`AuditProblem::solve`] runs tabulation, the frontier
//! search and trimming in sequence and returns a pure-data
//! [`AuditSolution`] or one typed [`AuditError`](crate::AuditError).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assertions::{AssertionAndDifficulty, SuffixEffect};
use crate::audit::AuditModel;
use crate::ballots::{CandidateIndex, Vote, VoteTable};
use crate::errors::{AuditError, AuditResult};
use crate::search::run_search;
use crate::tabulation::{tabulate, TabulationOutcome};
use crate::timeout::{StageTimer, TimeOut, TimeTaken};
use crate::trim::{trim_assertions, TrimAlgorithm, TrimOutcome};

/// A single contest to generate assertions for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditProblem {
    /// Opaque caller annotations, passed through untouched.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
    /// Consolidated rankings of the contest.
    pub votes: Vec<Vote>,
    /// Number of candidates; every ranked index must be below this.
    pub num_candidates: u32,
    /// Reported winner to confirm, when the caller has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<CandidateIndex>,
    /// Effort model used to score assertions.
    pub audit: AuditModel,
    /// Trimming policy; [`TrimAlgorithm::MinimizeTree`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_algorithm: Option<TrimAlgorithm>,
    /// Caller's guess at the final difficulty. Carried for compatibility
    /// with upstream tooling; the search does not consult it, so a wrong
    /// guess can never change the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_estimate: Option<f64>,
    /// Wall-clock budget in seconds. Must be positive when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_seconds: Option<f64>,
}

/// Everything a successful solve produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSolution {
    /// Retained assertions in canonical order.
    pub assertions: Vec<AssertionAndDifficulty>,
    /// Highest difficulty across the retained assertions; the audit's
    /// overall effort.
    pub difficulty: f64,
    /// Smallest margin across the retained assertions.
    pub margin: u64,
    /// The confirmed winner.
    pub winner: CandidateIndex,
    /// Number of candidates in the contest.
    pub num_candidates: u32,
    pub time_to_determine_winners: TimeTaken,
    pub time_to_find_assertions: TimeTaken,
    pub time_to_trim_assertions: TimeTaken,
    /// True when trimming ran out of budget; the assertion list is then
    /// sorted but untrimmed.
    pub warning_trim_timed_out: bool,
}

impl AuditProblem {
    /// Generates the assertion set for this contest.
    pub fn solve(&self) -> AuditResult<AuditSolution> {
        if let Some(limit) = self.time_limit_seconds {
            if limit.is_nan() || limit <= 0.0 {
                return Err(AuditError::InvalidTimeout);
            }
        }
        let mut timeout = TimeOut::new(
            self.time_limit_seconds.map(Duration::from_secs_f64),
            None,
        );
        let votes = VoteTable::new(self.votes.clone(), self.num_candidates)?;
        let trim = self.trim_algorithm.unwrap_or(TrimAlgorithm::MinimizeTree);
        solve_with_timeout(&votes, self.winner, &self.audit, trim, &mut timeout)
    }
}

/// Runs the full pipeline against an already-validated vote table.
pub fn solve_with_timeout(
    votes: &VoteTable,
    claimed_winner: Option<CandidateIndex>,
    audit: &AuditModel,
    trim: TrimAlgorithm,
    timeout: &mut TimeOut,
) -> AuditResult<AuditSolution> {
    let stage = StageTimer::begin(timeout);
    let tabulation = tabulate(votes, timeout)?;
    let winner = confirm_winner(&tabulation, claimed_winner)?;
    let time_to_determine_winners = stage.finish(timeout);

    let stage = StageTimer::begin(timeout);
    let mut assertions = run_search(
        votes,
        audit,
        winner,
        &tabulation.elimination_order,
        timeout,
    )?;
    let time_to_find_assertions = stage.finish(timeout);

    let stage = StageTimer::begin(timeout);
    let trim_outcome = trim_assertions(
        &mut assertions,
        winner,
        votes.num_candidates(),
        trim,
        timeout,
    )?;
    let time_to_trim_assertions = stage.finish(timeout);

    if assertions
        .iter()
        .any(|a| a.assertion.effect(&tabulation.elimination_order) == SuffixEffect::Contradiction)
    {
        return Err(AuditError::InternalErrorRuledOutWinner);
    }

    let difficulty = assertions
        .iter()
        .map(|a| a.difficulty)
        .fold(0.0, f64::max);
    let margin = assertions.iter().map(|a| a.margin).min().unwrap_or(0);
    Ok(AuditSolution {
        assertions,
        difficulty,
        margin,
        winner,
        num_candidates: votes.num_candidates(),
        time_to_determine_winners,
        time_to_find_assertions,
        time_to_trim_assertions,
        warning_trim_timed_out: trim_outcome == TrimOutcome::TimedOut,
    })
}

/// Reconciles the tabulated possible winners with the caller's claim.
///
/// With a claim, anything but a unique agreeing winner is `WrongWinner`,
/// including ties that happen to contain the claim. Without one, a tie is
/// `TiedWinners`.
fn confirm_winner(
    tabulation: &TabulationOutcome,
    claimed_winner: Option<CandidateIndex>,
) -> AuditResult<CandidateIndex> {
    match (claimed_winner, &tabulation.possible_winners[..]) {
        (Some(claimed), [sole]) if *sole == claimed => Ok(claimed),
        (Some(_), _) => Err(AuditError::WrongWinner(
            tabulation.possible_winners.clone(),
        )),
        (None, [sole]) => Ok(*sole),
        (None, _) => Err(AuditError::TiedWinners(
            tabulation.possible_winners.clone(),
        )),
    }
}
