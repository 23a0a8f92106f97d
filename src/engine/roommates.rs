//! Stable roommates (Irving's algorithm, incomplete lists allowed).
//!
//! ## Phase 1
//!
//! Everyone proposes down their list. A receiver holds its best proposal and
//! deletes every pair ranked below it. An agent whose list empties is
//! unassigned in every stable matching.
//!
//! ## Phase 2
//!
//! While some list holds two or more entries, expose a rotation
//! `(x_0, y_0) .. (x_{r-1}, y_{r-1})` with `y_i = first(x_i)`,
//! `y_{i+1} = second(x_i)`, `x_{i+1} = last(y_{i+1})`, and eliminate it:
//! each `y_{i+1}` deletes everyone ranked below `x_i`. A list emptied in
//! this phase means no stable matching exists.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::engine::{Resolution, RunStats, Workspace};
use crate::types::{AgentKey, AgentKind};

/// Irving's two-phase procedure.
#[derive(Debug, Clone, Default)]
pub struct Roommates {
    /// receiver -> proposer it currently holds
    held: HashMap<AgentKey, AgentKey>,
    /// proposer -> receiver holding its proposal
    holder: HashMap<AgentKey, AgentKey>,
    stats: RunStats,
}

impl Roommates {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Run both phases and leave the matching in `ws.matching`.
    pub fn run(&mut self, ws: &mut Workspace) -> Resolution {
        let agents = ws.model.keys_of(AgentKind::Roommate);
        let deletions_before = ws.deletions();

        self.phase_one(ws, &agents);
        let resolution = match self.phase_two(ws, &agents) {
            Resolution::Feasible => self.freeze(ws, &agents),
            infeasible => infeasible,
        };

        self.stats.deletions = ws.deletions() - deletions_before;
        debug!(
            proposals = self.stats.proposals,
            deletions = self.stats.deletions,
            ?resolution,
            "roommates converged"
        );
        resolution
    }

    fn release(&mut self, proposer: AgentKey) -> Option<AgentKey> {
        let receiver = self.holder.remove(&proposer)?;
        if self.held.get(&receiver) == Some(&proposer) {
            self.held.remove(&receiver);
        }
        Some(receiver)
    }

    fn phase_one(&mut self, ws: &mut Workspace, agents: &[AgentKey]) {
        let mut queue: VecDeque<AgentKey> = agents.iter().copied().collect();

        while let Some(x) = queue.pop_front() {
            if self.holder.contains_key(&x) {
                continue;
            }
            let Some(y) = ws.model.list(x).first() else {
                continue;
            };
            self.stats.proposals += 1;
            trace!(x = %ws.model.name(x), y = %ws.model.name(y), "roommate proposal");

            if let Some(z) = self.held.get(&y).copied() {
                self.release(z);
                queue.push_back(z);
            }
            self.held.insert(y, x);
            self.holder.insert(x, y);

            let Some(rank) = ws.model.rank(y, x) else {
                continue;
            };
            for w in ws.model.list(y).successors(rank) {
                ws.reject(y, w);
                // y may have been holding out for w
                if self.holder.get(&y) == Some(&w) {
                    self.release(y);
                    queue.push_back(y);
                }
                if self.holder.get(&w) == Some(&y) {
                    self.release(w);
                    queue.push_back(w);
                }
            }
        }
    }

    fn phase_two(&mut self, ws: &mut Workspace, agents: &[AgentKey]) -> Resolution {
        let active: Vec<AgentKey> = agents
            .iter()
            .copied()
            .filter(|&a| !ws.model.list(a).is_empty())
            .collect();

        loop {
            let Some(start) = active.iter().copied().find(|&a| ws.model.list(a).len() > 1) else {
                return Resolution::Feasible;
            };
            let Some(rotation) = expose_rotation(ws, start) else {
                return Resolution::Infeasible("reduced table has no rotation");
            };
            trace!(length = rotation.len(), "eliminating rotation");

            for &(x, y_next) in &rotation {
                let Some(rank) = ws.model.rank(y_next, x) else {
                    continue;
                };
                for z in ws.model.list(y_next).successors(rank) {
                    ws.reject(y_next, z);
                }
            }

            if active.iter().any(|&a| ws.model.list(a).is_empty()) {
                return Resolution::Infeasible("rotation elimination emptied a list");
            }
        }
    }

    fn freeze(&mut self, ws: &mut Workspace, agents: &[AgentKey]) -> Resolution {
        ws.matching.clear();
        for &x in agents {
            let Some(y) = ws.model.list(x).first() else {
                continue;
            };
            if ws.model.list(y).first() != Some(x) {
                return Resolution::Infeasible("reduced table is not a matching");
            }
            if !ws.matching.contains(x, y) {
                ws.assign(x, y);
            }
        }
        Resolution::Feasible
    }
}

/// Follow `second` / `last` links from `start` until an agent repeats.
///
/// Returns `(x_i, second(x_i))` for every `x_i` on the cycle.
fn expose_rotation(ws: &Workspace, start: AgentKey) -> Option<Vec<(AgentKey, AgentKey)>> {
    let mut path = vec![start];
    let mut seen = HashMap::from([(start, 0usize)]);
    loop {
        let x = *path.last()?;
        let y = ws.model.list(x).second()?;
        let next = ws.model.list(y).last()?;
        if let Some(&idx) = seen.get(&next) {
            return path[idx..]
                .iter()
                .map(|&x| ws.model.list(x).second().map(|y| (x, y)))
                .collect();
        }
        seen.insert(next, path.len());
        path.push(next);
    }
}
