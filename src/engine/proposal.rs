//! Generic proposal / rejection / deletion fixed point.
//!
//! ## Loop
//!
//! 1. Pop a proposer with room and a target it does not hold yet
//! 2. Assign, then for each touched capacity entity, innermost first:
//!    evict the worst agent if over quota
//! 3. For each touched entity that is now exactly full, delete every pair
//!    ranked strictly worse than its worst agent
//! 4. Requeue the proposer and anyone freed
//!
//! Every eviction deletes the evicted pair and every rejection shrinks a
//! finite list, so the loop terminates.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::engine::{Occupancy, RoleConfig, Workspace};
use crate::types::AgentKey;

/// Counters for one engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub proposals: usize,
    pub displacements: usize,
    pub deletions: usize,
}

/// Proposal engine over a role configuration.
///
/// # Example
///
/// ```
/// use stablematch::engine::{MatchingEngine, OneToMany, Workspace};
/// use stablematch::preferences::{InstanceBuilder, Prefs};
/// use stablematch::types::AgentKind;
///
/// let instance = InstanceBuilder::new()
///     .resident("r1", Prefs::strict(["h1"]))
///     .resident("r2", Prefs::strict(["h1"]))
///     .hospital("h1", 1, Prefs::strict(["r1", "r2"]))
///     .build()
///     .unwrap();
///
/// let mut ws = Workspace::new(instance.model);
/// let mut engine = MatchingEngine::new(OneToMany::new(AgentKind::Resident));
/// let stats = engine.run(&mut ws);
///
/// let h1 = ws.model.key("h1").unwrap();
/// let r1 = ws.model.key("r1").unwrap();
/// assert_eq!(ws.matching.worst(h1), Some(r1));
/// // r2 is dropped by the full hospital before ever proposing
/// assert_eq!(stats.proposals, 1);
/// assert_eq!(stats.deletions, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MatchingEngine<R: RoleConfig> {
    roles: R,
    queue: VecDeque<AgentKey>,
    queued: HashSet<AgentKey>,
}

impl<R: RoleConfig> MatchingEngine<R> {
    pub fn new(roles: R) -> Self {
        Self {
            roles,
            queue: VecDeque::new(),
            queued: HashSet::new(),
        }
    }

    #[inline]
    pub fn roles(&self) -> &R {
        &self.roles
    }

    fn enqueue(&mut self, agent: AgentKey) {
        if self.queued.insert(agent) {
            self.queue.push_back(agent);
        }
    }

    /// Run to the fixed point, mutating `ws` in place.
    pub fn run(&mut self, ws: &mut Workspace) -> RunStats {
        let mut stats = RunStats::default();
        let deletions_before = ws.deletions();

        for agent in ws.model.keys_of(self.roles.proposer()) {
            self.enqueue(agent);
        }

        while let Some(proposer) = self.queue.pop_front() {
            self.queued.remove(&proposer);
            if !self.roles.has_room(ws, proposer) {
                continue;
            }
            let Some(target) = self.roles.next_target(ws, proposer) else {
                continue;
            };

            stats.proposals += 1;
            trace!(
                proposer = %ws.model.name(proposer),
                target = %ws.model.name(target),
                "proposal"
            );
            let entities = self.roles.propose(ws, proposer, target);

            for &entity in &entities {
                if self.roles.is_at_capacity(ws, entity) == Occupancy::Over {
                    if let Some(freed) = self.roles.displace(ws, entity) {
                        stats.displacements += 1;
                        self.enqueue(freed);
                    }
                }
            }
            for &entity in &entities {
                if self.roles.is_at_capacity(ws, entity) == Occupancy::Full {
                    self.roles.reject_dominated(ws, entity);
                }
            }

            self.enqueue(proposer);
        }

        stats.deletions = ws.deletions() - deletions_before;
        debug!(
            proposer = %self.roles.proposer(),
            proposals = stats.proposals,
            displacements = stats.displacements,
            deletions = stats.deletions,
            "proposal engine converged"
        );
        stats
    }
}
