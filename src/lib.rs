#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

//! Assertion generation for risk-limiting audits of instant-runoff contests.
//!
//! Given the consolidated ranked ballots of a single contest, an optional
//! reported winner and an auditing-effort model, the crate produces a set of
//! pairwise assertions whose joint validity rules out every elimination
//! order electing anyone other than the winner. Each assertion carries a
//! difficulty estimate under the chosen model; the audit's overall
//! difficulty is the maximum over the set and its margin the minimum.
//!
//! The pipeline is pure and sequential: [`tabulation`] identifies the
//! winner and a concrete elimination order, [`search`] runs a
//! priority-queue frontier over elimination-order suffixes to assemble the
//! optimum assertion set, and [`trim`] rebuilds per-loser [`pruning`] trees
//! to discard redundant assertions. Independent solves share no state and
//! may run in parallel.
//!
//! The usual entry point is [`AuditProblem::solve`]:
//!
//! ```
//! use irv_rla::{AuditModel, AuditProblem, CandidateIndex, Vote};
//!
//! let problem = AuditProblem {
//!     metadata: serde_json::Value::Null,
//!     votes: vec![
//!         Vote { n: 60, prefs: vec![CandidateIndex(0)] },
//!         Vote { n: 40, prefs: vec![CandidateIndex(1)] },
//!     ],
//!     num_candidates: 2,
//!     winner: None,
//!     audit: AuditModel::OneOnMargin { total_auditable_ballots: 100 },
//!     trim_algorithm: None,
//!     difficulty_estimate: None,
//!     time_limit_seconds: None,
//! };
//! let solution = problem.solve().expect("auditable contest");
//! assert_eq!(solution.winner, CandidateIndex(0));
//! assert_eq!(solution.difficulty, 5.0);
//! ```

pub mod assertions;
pub mod audit;
pub mod ballots;
pub mod errors;
pub mod problem;
pub mod pruning;
pub mod search;
pub mod tabulation;
pub mod timeout;
pub mod trim;

pub use assertions::{
    Assertion, AssertionAndDifficulty, NebCache, NotEliminatedBefore, NotEliminatedNext,
    SuffixEffect,
};
pub use audit::AuditModel;
pub use ballots::{CandidateIndex, Vote, VoteTable};
pub use errors::{AuditError, AuditResult};
pub use problem::{AuditProblem, AuditSolution};
pub use timeout::{TimeOut, TimeTaken};
pub use trim::TrimAlgorithm;

/// Solves a problem. Equivalent to [`AuditProblem::solve`].
pub fn solve(problem: &AuditProblem) -> AuditResult<AuditSolution> {
    problem.solve()
}
