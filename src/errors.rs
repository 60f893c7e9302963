use core::fmt;

use serde::{Deserialize, Serialize};

use crate::ballots::CandidateIndex;

/// Result type used throughout the library to surface deterministic errors.
pub type AuditResult<T> = core::result::Result<T, AuditError>;

/// Error enumeration for assertion generation.
///
/// The taxonomy is closed: every failure an audit solve can produce is one of
/// these variants, carrying whatever payload the caller needs to act on it.
/// Input-validity and tabulation errors are raised before any search work;
/// search timeouts abort the solve with the difficulty reached so far; trim
/// timeouts are recovered by the caller and never surface through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuditError {
    /// The contest declared fewer than one candidate.
    InvalidNumberOfCandidates,
    /// The requested time limit was zero, negative or NaN.
    InvalidTimeout,
    /// Some vote ranked a candidate index outside `[0, num_candidates)`.
    InvalidCandidateNumber,
    /// Tabulation found more than one possible winner and no winner was
    /// claimed. The payload lists every candidate who wins under some
    /// resolution of ties.
    TiedWinners(Vec<CandidateIndex>),
    /// The claimed winner is not the single winner computed by tabulation.
    /// Raised even when ties leave the claimed winner among the
    /// possibilities.
    WrongWinner(Vec<CandidateIndex>),
    /// A complete elimination order ending in a non-winner could not be
    /// contradicted by any assertion with finite difficulty.
    CouldNotRuleOut(Vec<CandidateIndex>),
    /// The time budget expired while tabulating the contest.
    TimeoutCheckingWinner,
    /// The time budget expired during the frontier search. The payload is
    /// the difficulty bound established when the search stopped.
    TimeoutFindingAssertions(f64),
    /// The time budget expired while building pruning trees.
    TimeoutTrimmingAssertions,
    /// The generated assertions contradict the elimination order that
    /// produced the winner they are supposed to confirm.
    InternalErrorRuledOutWinner,
    /// A pruning tree rooted at a non-winner stayed valid, meaning the
    /// assertion set fails to rule that candidate out.
    InternalErrorDidntRuleOutLoser,
    /// The trim passes finished without covering every pruning tree.
    InternalErrorTrimming,
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditError::InvalidNumberOfCandidates => {
                write!(f, "a contest needs at least one candidate")
            }
            AuditError::InvalidTimeout => {
                write!(f, "time limit must be a positive number of seconds")
            }
            AuditError::InvalidCandidateNumber => {
                write!(f, "vote references a candidate outside the contest")
            }
            AuditError::TiedWinners(winners) => {
                write!(f, "tabulation is tied between {}", candidate_list(winners))
            }
            AuditError::WrongWinner(winners) => write!(
                f,
                "claimed winner differs from tabulated winner(s) {}",
                candidate_list(winners)
            ),
            AuditError::CouldNotRuleOut(order) => write!(
                f,
                "no assertion rules out the elimination order {}",
                candidate_list(order)
            ),
            AuditError::TimeoutCheckingWinner => {
                write!(f, "timeout while determining the winner")
            }
            AuditError::TimeoutFindingAssertions(bound) => {
                write!(f, "timeout while finding assertions (difficulty ≥ {bound})")
            }
            AuditError::TimeoutTrimmingAssertions => {
                write!(f, "timeout while trimming assertions")
            }
            AuditError::InternalErrorRuledOutWinner => {
                write!(f, "internal error: assertions rule out the winner")
            }
            AuditError::InternalErrorDidntRuleOutLoser => {
                write!(f, "internal error: assertions fail to rule out a loser")
            }
            AuditError::InternalErrorTrimming => {
                write!(f, "internal error: trimming lost coverage of a loser")
            }
        }
    }
}

impl std::error::Error for AuditError {}

fn candidate_list(candidates: &[CandidateIndex]) -> String {
    let names: Vec<String> = candidates.iter().map(|c| c.0.to_string()).collect();
    format!("[{}]", names.join(", "))
}
