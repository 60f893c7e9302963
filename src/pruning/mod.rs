//! Pruning trees: which assertions kill which elimination orders.
//!
//! For a chosen root candidate, the tree enumerates elimination-order
//! suffixes ending in that candidate, prepending one continuing candidate
//! per child. Each node records the assertions that contradict its suffix
//! outright; assertions that stay undecided are passed down to the
//! children. A node nobody contradicts and nobody can refute deeper down is
//! `valid`; for a non-winner root that means the assertion set is
//! insufficient.
//!
//! How far construction descends past an already-pruned node is a policy
//! choice: stopping immediately gives the smallest tree, descending further
//! exposes cheaper per-branch explanations the trim heuristic can exploit.

use crate::assertions::{Assertion, AssertionAndDifficulty, SuffixEffect};
use crate::ballots::CandidateIndex;
use crate::errors::{AuditError, AuditResult};
use crate::timeout::TimeOut;

/// Whether to keep descending once a node is already pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Never descend past a pruned node.
    StopImmediately,
    /// Descend one level past a pruned node, then stop.
    ContinueOnce,
    /// Always descend to complete orders.
    Forever,
    /// Descend past a pruned node unless an NEB assertion prunes it.
    StopOnNeb,
}

impl Continuation {
    fn descend_past_pruned(
        self,
        pruning: &[usize],
        assertions: &[AssertionAndDifficulty],
    ) -> bool {
        match self {
            Continuation::StopImmediately => false,
            Continuation::ContinueOnce | Continuation::Forever => true,
            Continuation::StopOnNeb => !pruning
                .iter()
                .any(|&index| assertions[index].assertion.is_neb()),
        }
    }

    fn for_children_of_pruned(self) -> Continuation {
        match self {
            Continuation::ContinueOnce => Continuation::StopImmediately,
            other => other,
        }
    }
}

/// One node of a pruning tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// The candidate this node prepends to its parent's suffix.
    pub candidate: CandidateIndex,
    /// The suffix this node stands for, `candidate` first.
    pub elimination_order_suffix: Vec<CandidateIndex>,
    /// Indices into the assertion list of everything contradicting the
    /// suffix.
    pub pruning_assertions: Vec<usize>,
    /// One child per candidate not yet in the suffix, ascending; empty when
    /// construction stopped here.
    pub children: Vec<TreeNode>,
    /// True when neither this node nor its descendants are refuted.
    pub valid: bool,
}

impl TreeNode {
    /// Builds the tree rooted at the suffix `[root]` against the given
    /// assertion list.
    pub fn build(
        root: CandidateIndex,
        assertions: &[AssertionAndDifficulty],
        num_candidates: u32,
        continuation: Continuation,
        timeout: &mut TimeOut,
    ) -> AuditResult<TreeNode> {
        let relevant: Vec<usize> = (0..assertions.len()).collect();
        Self::build_inner(
            vec![root],
            &relevant,
            assertions,
            num_candidates,
            continuation,
            timeout,
        )
    }

    fn build_inner(
        suffix: Vec<CandidateIndex>,
        relevant: &[usize],
        assertions: &[AssertionAndDifficulty],
        num_candidates: u32,
        continuation: Continuation,
        timeout: &mut TimeOut,
    ) -> AuditResult<TreeNode> {
        if timeout.quick_check() {
            return Err(AuditError::TimeoutTrimmingAssertions);
        }
        let mut pruning_assertions = Vec::new();
        let mut still_relevant = Vec::new();
        for &index in relevant {
            match assertions[index].assertion.effect(&suffix) {
                SuffixEffect::Contradiction => pruning_assertions.push(index),
                SuffixEffect::NeedsMoreDetail => still_relevant.push(index),
                SuffixEffect::Ok => {}
            }
        }
        let pruned = !pruning_assertions.is_empty();
        let descend = if pruned {
            continuation.descend_past_pruned(&pruning_assertions, assertions)
        } else {
            !still_relevant.is_empty()
        };
        let child_continuation = if pruned {
            continuation.for_children_of_pruned()
        } else {
            continuation
        };
        let mut children = Vec::new();
        let mut any_child_valid = false;
        if descend {
            for candidate in (0..num_candidates).map(CandidateIndex) {
                if suffix.contains(&candidate) {
                    continue;
                }
                let mut child_suffix = Vec::with_capacity(suffix.len() + 1);
                child_suffix.push(candidate);
                child_suffix.extend_from_slice(&suffix);
                let child = Self::build_inner(
                    child_suffix,
                    &still_relevant,
                    assertions,
                    num_candidates,
                    child_continuation,
                    timeout,
                )?;
                any_child_valid |= child.valid;
                children.push(child);
            }
        }
        let valid = if pruned {
            // The node's own assertions already rule the subtree out; a
            // valid child only shows the children cannot replace them, so
            // they are discarded rather than inflate the tree.
            if any_child_valid {
                children.clear();
            }
            false
        } else if !descend || children.is_empty() {
            true
        } else {
            any_child_valid
        };
        let candidate = suffix[0];
        Ok(TreeNode {
            candidate,
            elimination_order_suffix: suffix,
            pruning_assertions,
            children,
            valid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::{NotEliminatedBefore, NotEliminatedNext};

    fn c(index: u32) -> CandidateIndex {
        CandidateIndex(index)
    }

    fn with_score(assertion: Assertion) -> AssertionAndDifficulty {
        AssertionAndDifficulty {
            assertion,
            difficulty: 1.0,
            margin: 1,
            status: None,
        }
    }

    fn neb(winner: u32, loser: u32) -> AssertionAndDifficulty {
        with_score(Assertion::Neb(NotEliminatedBefore {
            winner: c(winner),
            loser: c(loser),
        }))
    }

    fn nen(winner: u32, loser: u32, continuing: &[u32]) -> AssertionAndDifficulty {
        let continuing: Vec<CandidateIndex> = continuing.iter().map(|&x| c(x)).collect();
        with_score(Assertion::Nen(NotEliminatedNext::new(
            c(winner),
            c(loser),
            &continuing,
        )))
    }

    #[test]
    fn empty_assertion_list_leaves_root_valid() {
        let tree = TreeNode::build(
            c(0),
            &[],
            3,
            Continuation::StopImmediately,
            &mut TimeOut::unbounded(),
        )
        .expect("builds");
        assert!(tree.valid);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn neb_prunes_without_descent_under_stop_immediately() {
        // 0 always beats 1, so no order can end with 1 outlasting 0.
        let assertions = vec![neb(0, 1)];
        let tree = TreeNode::build(
            c(1),
            &assertions,
            2,
            Continuation::StopImmediately,
            &mut TimeOut::unbounded(),
        )
        .expect("builds");
        assert_eq!(tree.pruning_assertions, vec![0]);
        assert!(tree.children.is_empty());
        assert!(!tree.valid);
    }

    #[test]
    fn undecided_assertions_descend_until_resolved() {
        let assertions = vec![nen(0, 1, &[0, 1]), neb(0, 2)];
        let tree = TreeNode::build(
            c(1),
            &assertions,
            3,
            Continuation::StopImmediately,
            &mut TimeOut::unbounded(),
        )
        .expect("builds");
        // Suffix [1] is undecided by both assertions; children resolve it.
        assert!(tree.pruning_assertions.is_empty());
        assert_eq!(tree.children.len(), 2);
        assert!(!tree.valid);
        // Child [0, 1]: the final pair is {0, 1} led by 0, contradiction.
        assert_eq!(tree.children[0].pruning_assertions, vec![0]);
        // Child [2, 1]: candidate 2 was eliminated while 0 continued.
        assert_eq!(tree.children[1].pruning_assertions, vec![1]);
    }

    #[test]
    fn continue_once_and_forever_explain_pruned_branches() {
        // [1] is pruned outright; the still-undecided assertions kill both
        // of its extensions one level further down.
        let assertions = vec![neb(0, 1), neb(2, 0), neb(0, 2)];
        for continuation in [Continuation::ContinueOnce, Continuation::Forever] {
            let tree = TreeNode::build(
                c(1),
                &assertions,
                3,
                continuation,
                &mut TimeOut::unbounded(),
            )
            .expect("builds");
            assert_eq!(tree.pruning_assertions, vec![0]);
            assert!(!tree.valid);
            assert_eq!(tree.children.len(), 2);
            assert_eq!(tree.children[0].pruning_assertions, vec![1]);
            assert_eq!(tree.children[1].pruning_assertions, vec![2]);
            assert!(tree.children.iter().all(|child| !child.valid));
        }
    }

    #[test]
    fn stop_on_neb_descends_past_nen_prunings_only() {
        let assertions = vec![nen(1, 0, &[0, 1]), neb(0, 2)];
        let nen_pruned = TreeNode::build(
            c(0),
            &assertions,
            2,
            Continuation::StopOnNeb,
            &mut TimeOut::unbounded(),
        )
        .expect("builds");
        // [0] is not yet pruned; its only child [1, 0] is NEN-pruned and
        // has no continuing candidates left, so descent ends there anyway.
        assert!(!nen_pruned.valid);
        let neb_pruned = TreeNode::build(
            c(2),
            &assertions,
            3,
            Continuation::StopOnNeb,
            &mut TimeOut::unbounded(),
        )
        .expect("builds");
        assert_eq!(neb_pruned.pruning_assertions, vec![1]);
        assert!(neb_pruned.children.is_empty());
    }
}
