//! Blocking-pair search against the original preference lists.
//!
//! ## Comparison
//!
//! Every test reduces to one question per side: how does agent `x` value a
//! candidate `y` against what it already holds? The answer is an
//! [`Improvement`]:
//!
//! - an agent below capacity gains strictly from any acceptable candidate
//! - otherwise `y` is compared with the worst assigned partner by tie index
//!
//! The flavours combine the two answers:
//!
//! | flavour | blocks when                                   |
//! |---------|-----------------------------------------------|
//! | strict  | both sides strict                             |
//! | super   | neither side worse                            |
//! | strong  | neither side worse and at least one strict    |
//!
//! Ranks always come from the original snapshot, never from a working copy,
//! so pairs deleted during a run still count.

mod allocation;

use tracing::trace;

use crate::config::StabilityKind;
use crate::engine::{Provisional, Workspace};
use crate::error::MatchError;
use crate::preferences::PreferenceModel;
use crate::types::{AgentKey, BlockingPair, Matching, ProblemKind};

/// How an agent values a candidate partner against its current assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Improvement {
    Strict,
    Indifferent,
    Worse,
}

impl Improvement {
    /// Whether a pair whose sides value each other as `a` and `b` blocks.
    pub fn blocks(a: Improvement, b: Improvement, kind: StabilityKind) -> bool {
        use Improvement::*;
        match kind {
            StabilityKind::Strict => a == Strict && b == Strict,
            StabilityKind::Super => a != Worse && b != Worse,
            StabilityKind::Strong => a != Worse && b != Worse && (a == Strict || b == Strict),
        }
    }
}

/// Result of a stability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Stable,
    Blocked(BlockingPair),
}

impl Verdict {
    #[inline]
    pub fn is_stable(&self) -> bool {
        matches!(self, Verdict::Stable)
    }
}

/// Stability checker bound to an original model and a flavour.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'a> {
    original: &'a PreferenceModel,
    problem: ProblemKind,
    kind: StabilityKind,
}

impl<'a> Verifier<'a> {
    pub fn new(original: &'a PreferenceModel, problem: ProblemKind, kind: StabilityKind) -> Self {
        Self {
            original,
            problem,
            kind,
        }
    }

    #[inline]
    pub fn kind(&self) -> StabilityKind {
        self.kind
    }

    /// First blocking pair, if any.
    pub fn check(&self, matching: &Provisional) -> Verdict {
        match self.scan(matching, true).into_iter().next() {
            Some(pair) => Verdict::Blocked(pair),
            None => Verdict::Stable,
        }
    }

    /// Every blocking pair, agent side first in key order.
    pub fn blocking_pairs(&self, matching: &Provisional) -> Vec<BlockingPair> {
        self.scan(matching, false)
    }

    /// Check a matching given by agent names, such as one produced by an
    /// external solver.
    pub fn check_named(&self, matching: &Matching) -> Result<Verdict, MatchError> {
        let mut pairs = Vec::new();
        for (agent, partner) in &matching.agent_sided {
            let a = self.original.require(agent)?;
            if let Some(partner) = partner {
                pairs.push((a, self.original.require(partner)?));
            }
        }
        let ws = Workspace::from_pairs(self.original.snapshot(), pairs);
        Ok(self.check(&ws.matching))
    }

    fn scan(&self, matching: &Provisional, first_only: bool) -> Vec<BlockingPair> {
        let mut found = Vec::new();
        let (single, _) = self.problem.sides();

        for a in self.original.keys_of(single) {
            for b in self.original.list(a).iter() {
                if matching.contains(a, b) {
                    continue;
                }
                // each roommate pair is seen from both ends
                if self.problem == ProblemKind::Roommates && b < a {
                    continue;
                }
                let blocked = if self.problem == ProblemKind::ProjectAllocation {
                    self.blocks_allocation(matching, a, b)
                } else {
                    Improvement::blocks(
                        self.improvement(matching, a, b),
                        self.improvement(matching, b, a),
                        self.kind,
                    )
                };
                if blocked {
                    let pair = BlockingPair::new(self.original.name(a), self.original.name(b));
                    trace!(agent = %pair.agent, partner = %pair.partner, flavour = ?self.kind, "blocking pair");
                    found.push(pair);
                    if first_only {
                        return found;
                    }
                }
            }
        }
        found
    }

    /// How `x` values `y` given what it holds in `matching`.
    pub fn improvement(&self, matching: &Provisional, x: AgentKey, y: AgentKey) -> Improvement {
        if !self.original.contains(x, y) {
            return Improvement::Worse;
        }
        if matching.count(x) < self.original.capacity(x) {
            return Improvement::Strict;
        }
        self.against_worst(matching, x, y)
    }

    /// Compare `y` with the worst partner `x` holds, ignoring spare capacity.
    fn against_worst(&self, matching: &Provisional, x: AgentKey, y: AgentKey) -> Improvement {
        let (Some(candidate), Some(worst)) = (self.original.rank(x, y), self.worst_rank(matching, x))
        else {
            return Improvement::Strict;
        };
        match candidate.cmp(&worst) {
            std::cmp::Ordering::Less => Improvement::Strict,
            std::cmp::Ordering::Equal => Improvement::Indifferent,
            std::cmp::Ordering::Greater => Improvement::Worse,
        }
    }

    fn worst_rank(&self, matching: &Provisional, x: AgentKey) -> Option<usize> {
        matching
            .assigned(x)
            .filter_map(|z| self.original.rank(x, z))
            .max()
    }
}
