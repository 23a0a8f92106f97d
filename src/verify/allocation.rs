//! Three-way blocking test for student/project allocation.
//!
//! A student `s` and a project `p` offered by lecturer `l` block when the
//! student would move to `p` and one of these holds on the supply side:
//!
//! 1. both `p` and `l` are under capacity
//! 2. `p` is under capacity, `l` is full, and either `s` already holds one of
//!    `l`'s projects or `l` values `s` against its worst student
//! 3. `p` is full and `l` values `s` against the worst student in `p`
//!
//! In case 2 a student already with `l` changes nothing for `l`; the move is
//! indifferent for the lecturer but still blocks under strict stability.

use super::{Improvement, Verifier};
use crate::config::StabilityKind;
use crate::engine::Provisional;
use crate::types::AgentKey;

impl Verifier<'_> {
    pub(super) fn blocks_allocation(&self, matching: &Provisional, s: AgentKey, p: AgentKey) -> bool {
        let student = self.improvement(matching, s, p);
        if student == Improvement::Worse {
            return false;
        }
        let Some(l) = self.original.owner(p) else {
            return false;
        };

        let p_under = matching.count(p) < self.original.capacity(p);
        let l_under = matching.count(l) < self.original.capacity(l);

        let supply = match (p_under, l_under) {
            (true, true) => Improvement::Strict,
            (true, false) if matching.contains(l, s) => {
                if self.kind == StabilityKind::Strict {
                    return student == Improvement::Strict;
                }
                Improvement::Indifferent
            }
            (true, false) => self.against_worst(matching, l, s),
            (false, _) => self.against_worst(matching, p, s),
        };
        Improvement::blocks(student, supply, self.kind)
    }
}
