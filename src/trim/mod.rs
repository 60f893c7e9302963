//! Canonical ordering and redundancy trimming of generated assertions.
//!
//! The frontier search over-produces: an assertion committed for one suffix
//! frequently also kills suffixes other assertions were committed for. The
//! trim stage rebuilds, per non-winner, the pruning tree of everything the
//! assertion set must rule out, then keeps a sufficient subset in two
//! passes: assertions that are the only way to kill some branch are forced,
//! and any branch still uncovered afterwards takes its first available
//! pruning assertion.
//!
//! Sorting is unconditional; the canonical order below is the only
//! externally visible ordering of a solution. A timeout inside tree
//! construction is recoverable: the caller keeps the sorted, untrimmed
//! list and flags the solution instead of failing the solve.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::assertions::{Assertion, AssertionAndDifficulty};
use crate::ballots::CandidateIndex;
use crate::errors::{AuditError, AuditResult};
use crate::pruning::{Continuation, TreeNode};
use crate::timeout::TimeOut;

/// Trimming policy selected at the problem boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimAlgorithm {
    /// Sort canonically but keep every generated assertion.
    None,
    /// Prefer the smallest pruning trees; stops descending at the first
    /// contradiction.
    MinimizeTree,
    /// Prefer the fewest assertions; descends past non-NEB contradictions
    /// looking for cheaper shared explanations.
    MinimizeAssertions,
}

/// Outcome of the trim stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimOutcome {
    /// The list was trimmed (or the policy asked for sorting only).
    Completed,
    /// Tree construction ran out of time; the list is sorted but untrimmed.
    TimedOut,
}

/// Sorts assertions canonically: NEBs before NENs; NEBs by winner then
/// loser; NENs by continuing-set size, winner, loser, then the set itself.
pub fn sort_assertions(assertions: &mut [AssertionAndDifficulty]) {
    assertions.sort_by(|a, b| canonical_order(&a.assertion, &b.assertion));
}

fn canonical_order(a: &Assertion, b: &Assertion) -> Ordering {
    match (a, b) {
        (Assertion::Neb(x), Assertion::Neb(y)) => {
            (x.winner, x.loser).cmp(&(y.winner, y.loser))
        }
        (Assertion::Neb(_), Assertion::Nen(_)) => Ordering::Less,
        (Assertion::Nen(_), Assertion::Neb(_)) => Ordering::Greater,
        (Assertion::Nen(x), Assertion::Nen(y)) => {
            (x.continuing.len(), x.winner, x.loser, &x.continuing).cmp(&(
                y.continuing.len(),
                y.winner,
                y.loser,
                &y.continuing,
            ))
        }
    }
}

/// Sorts the assertion list and, when the policy asks for it, reduces it to
/// a sufficient subset.
///
/// Returns [`TrimOutcome::TimedOut`] when the tree stage exhausted the
/// budget; every other failure is surfaced as an error.
pub fn trim_assertions(
    assertions: &mut Vec<AssertionAndDifficulty>,
    winner: CandidateIndex,
    num_candidates: u32,
    policy: TrimAlgorithm,
    timeout: &mut TimeOut,
) -> AuditResult<TrimOutcome> {
    sort_assertions(assertions);
    let continuation = match policy {
        TrimAlgorithm::None => return Ok(TrimOutcome::Completed),
        TrimAlgorithm::MinimizeTree => Continuation::StopImmediately,
        TrimAlgorithm::MinimizeAssertions => Continuation::StopOnNeb,
    };
    let mut trees = Vec::with_capacity(num_candidates.saturating_sub(1) as usize);
    for candidate in (0..num_candidates).map(CandidateIndex) {
        if candidate == winner {
            continue;
        }
        match TreeNode::build(candidate, assertions, num_candidates, continuation, timeout) {
            Ok(tree) => {
                if tree.valid {
                    return Err(AuditError::InternalErrorDidntRuleOutLoser);
                }
                trees.push(tree);
            }
            Err(AuditError::TimeoutTrimmingAssertions) => return Ok(TrimOutcome::TimedOut),
            Err(other) => return Err(other),
        }
    }
    let mut used = vec![false; assertions.len()];
    for tree in &trees {
        mark_forced(tree, &mut used);
    }
    for tree in &trees {
        mark_sufficient(tree, &mut used);
    }
    for tree in &trees {
        if !eliminated(tree, &used) {
            return Err(AuditError::InternalErrorTrimming);
        }
    }
    let mut index = 0;
    assertions.retain(|_| {
        let keep = used[index];
        index += 1;
        keep
    });
    Ok(TrimOutcome::Completed)
}

/// Pass 1: an assertion that is the sole pruner of a childless node has no
/// substitute and must be retained.
fn mark_forced(node: &TreeNode, used: &mut [bool]) {
    if node.children.is_empty() {
        if let [only] = node.pruning_assertions[..] {
            used[only] = true;
        }
    }
    for child in &node.children {
        mark_forced(child, used);
    }
}

/// Pass 2: every pruned node must be covered, either by one of its own
/// pruners already retained or by its children being covered recursively;
/// otherwise its first pruner is retained.
///
/// The walk ends at the first pruned node on each path: covering that node
/// disposes of every completion of its suffix, so marks below it could
/// only retain redundant assertions.
fn mark_sufficient(node: &TreeNode, used: &mut [bool]) {
    if node.pruning_assertions.is_empty() {
        for child in &node.children {
            mark_sufficient(child, used);
        }
    } else {
        let covered = node.pruning_assertions.iter().any(|&index| used[index])
            || (!node.children.is_empty()
                && node.children.iter().all(|child| eliminated(child, used)));
        if !covered {
            used[node.pruning_assertions[0]] = true;
        }
    }
}

fn eliminated(node: &TreeNode, used: &[bool]) -> bool {
    node.pruning_assertions.iter().any(|&index| used[index])
        || (!node.children.is_empty()
            && node.children.iter().all(|child| eliminated(child, used)))
}
