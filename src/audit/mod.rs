//! Auditing-effort models.
//!
//! An [`AuditModel`] maps a winner/loser tally pair to a non-negative
//! difficulty: the expected effort of confirming, by sampling, that the
//! winner really out-polled the loser. Difficulty is monotonically
//! decreasing in the margin, and infinite whenever the reported tallies do
//! not favour the winner.
//!
//! Parameter domains are preconditions of the estimator: every variant needs
//! `total_auditable_ballots > 0`, MACRO needs `gamma >= 1`, and both sampling
//! models need `0 < alpha < 1`. Configuration is validated by the
//! collaborator that builds the problem.

use serde::{Deserialize, Serialize};

/// Difficulty estimator variants recognised at the problem boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuditModel {
    /// Number of auditable ballots divided by the margin.
    OneOnMargin {
        /// Universe size `T` for the contest.
        total_auditable_ballots: u64,
    },
    /// Square of [`AuditModel::OneOnMargin`], for effort that grows
    /// quadratically as margins shrink.
    OneOnMarginSquared {
        /// Universe size `T` for the contest.
        total_auditable_ballots: u64,
    },
    /// MACRO ballot-comparison estimate.
    #[serde(rename = "MACRO")]
    BallotComparisonMacro {
        /// Risk limit, strictly between zero and one.
        alpha: f64,
        /// Error inflation factor, at least one.
        gamma: f64,
        /// Universe size `T` for the contest.
        total_auditable_ballots: u64,
    },
    /// BRAVO ballot-polling estimate.
    #[serde(rename = "BRAVO")]
    BallotPollingBravo {
        /// Risk limit, strictly between zero and one.
        alpha: f64,
        /// Universe size `T` for the contest.
        total_auditable_ballots: u64,
    },
}

impl AuditModel {
    /// Expected auditing effort for a pairwise comparison the winner is
    /// reported to have won `winner_tally` to `loser_tally`.
    ///
    /// Returns `+∞` when `winner_tally <= loser_tally`.
    pub fn difficulty(&self, winner_tally: u64, loser_tally: u64) -> f64 {
        if winner_tally <= loser_tally {
            return f64::INFINITY;
        }
        let w = winner_tally as f64;
        let l = loser_tally as f64;
        let margin = w - l;
        match *self {
            AuditModel::OneOnMargin {
                total_auditable_ballots,
            } => total_auditable_ballots as f64 / margin,
            AuditModel::OneOnMarginSquared {
                total_auditable_ballots,
            } => {
                let ratio = total_auditable_ballots as f64 / margin;
                ratio * ratio
            }
            AuditModel::BallotComparisonMacro {
                alpha,
                gamma,
                total_auditable_ballots,
            } => -alpha.ln() * 2.0 * gamma * total_auditable_ballots as f64 / margin,
            AuditModel::BallotPollingBravo {
                alpha,
                total_auditable_ballots,
            } => {
                let share = w / (w + l);
                let numerator = 0.5 * (2.0 * share).ln() - alpha.ln();
                // l·ln(2−2s) tends to zero as the loser tally does; evaluating
                // it directly at zero would poison the sum with 0·ln(0).
                let loser_term = if loser_tally == 0 {
                    0.0
                } else {
                    l * (2.0 - 2.0 * share).ln()
                };
                let denominator =
                    (w * (2.0 * share).ln() + loser_term) / total_auditable_ballots as f64;
                numerator / denominator
            }
        }
    }
}
