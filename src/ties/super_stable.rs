//! Super-stability for marriage and hospitals/residents with ties.
//!
//! Two orientations share one struct:
//!
//! - **Receiver capacity** (men, women or residents propose): a free
//!   proposer is assigned to its whole head tie at once. An over-subscribed
//!   receiver deletes its entire tail tie; a full receiver deletes everyone
//!   ranked strictly worse than its worst assignee. Proposers may end up
//!   multiply assigned, so one partner each is selected by a maximum
//!   b-matching over the provisional pairs. A receiver that was full at some
//!   point and ends under quota rules out every super-stable matching.
//! - **Proposer capacity** (hospitals propose): an under-subscribed hospital
//!   offers to every resident in the first tie holding someone it has not
//!   offered to yet. A resident deletes everyone strictly worse than its best
//!   offer, and once it holds two offers it deletes its whole tail tie.
//!   A hospital left over quota means no super-stable matching exists.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, trace};

use crate::engine::{Occupancy, Resolution, RunStats, Workspace};
use crate::ties::{bipartite::BipartiteGraph, requeue};
use crate::types::{AgentKey, AgentKind};

/// Super-stable procedure for one proposing side.
#[derive(Debug, Clone)]
pub struct SuperStable {
    proposer: AgentKind,
    stats: RunStats,
}

impl SuperStable {
    pub fn new(proposer: AgentKind) -> Self {
        Self {
            proposer,
            stats: RunStats::default(),
        }
    }

    #[inline]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Run to completion. On `Feasible`, `ws.matching` holds the candidate.
    pub fn run(&mut self, ws: &mut Workspace) -> Resolution {
        let deletions_before = ws.deletions();
        let resolution = if self.proposer.is_single() {
            self.receiver_capacity(ws)
        } else {
            self.proposer_capacity(ws)
        };
        self.stats.deletions = ws.deletions() - deletions_before;
        debug!(
            proposer = %self.proposer,
            proposals = self.stats.proposals,
            deletions = self.stats.deletions,
            ?resolution,
            "super-stable procedure finished"
        );
        resolution
    }

    fn receiver_capacity(&mut self, ws: &mut Workspace) -> Resolution {
        let proposers = ws.model.keys_of(self.proposer);
        let receivers = ws.model.keys_of(self.proposer.counterpart());
        let mut queue: VecDeque<AgentKey> = proposers.iter().copied().collect();
        let mut been_full = HashSet::new();

        while let Some(p) = queue.pop_front() {
            if !ws.matching.is_free(p) {
                continue;
            }
            let Some(head) = ws.model.list(p).head().map(<[AgentKey]>::to_vec) else {
                continue;
            };
            for r in head {
                if !ws.model.contains(p, r) {
                    continue;
                }
                self.stats.proposals += 1;
                ws.assign(p, r);

                if ws.occupancy(r) == Occupancy::Over {
                    let tail = ws.model.tail(r).map(<[AgentKey]>::to_vec).unwrap_or_default();
                    trace!(receiver = %ws.model.name(r), dropped = tail.len(), "tail tie deleted");
                    for x in tail {
                        ws.reject(x, r);
                        requeue(ws, &mut queue, x);
                    }
                }
                if ws.occupancy(r) == Occupancy::Full {
                    been_full.insert(r);
                    if let Some(rank) = ws.matching.worst_rank(r) {
                        for x in ws.model.list(r).successors(rank) {
                            ws.reject(x, r);
                            requeue(ws, &mut queue, x);
                        }
                    }
                }
            }
            requeue(ws, &mut queue, p);
        }

        if been_full
            .iter()
            .any(|&r| ws.occupancy(r) == Occupancy::Under)
        {
            return Resolution::Infeasible("a receiver lost partners after filling up");
        }
        select(ws, &proposers, &receivers)
    }

    fn proposer_capacity(&mut self, ws: &mut Workspace) -> Resolution {
        let hospitals = ws.model.keys_of(self.proposer);
        let mut queue: VecDeque<AgentKey> = hospitals.iter().copied().collect();

        while let Some(h) = queue.pop_front() {
            if ws.occupancy(h) != Occupancy::Under {
                continue;
            }
            let offers: Vec<AgentKey> = ws
                .model
                .list(h)
                .ties()
                .iter()
                .find(|tie| tie.iter().any(|&r| !ws.matching.contains(h, r)))
                .map(|tie| {
                    tie.iter()
                        .copied()
                        .filter(|&r| !ws.matching.contains(h, r))
                        .collect()
                })
                .unwrap_or_default();
            if offers.is_empty() {
                continue;
            }

            for r in offers {
                if !ws.model.contains(h, r) {
                    continue;
                }
                self.stats.proposals += 1;
                ws.assign(h, r);

                if let Some(best) = ws.matching.best_rank(r) {
                    for x in ws.model.list(r).successors(best) {
                        ws.reject(r, x);
                        queue.push_back(x);
                    }
                }
                if ws.matching.count(r) > 1 {
                    let tail = ws.model.tail(r).map(<[AgentKey]>::to_vec).unwrap_or_default();
                    for x in tail {
                        ws.reject(r, x);
                        queue.push_back(x);
                    }
                }
            }
            queue.push_back(h);
        }

        if hospitals.iter().any(|&h| ws.occupancy(h) == Occupancy::Over) {
            return Resolution::Infeasible("a hospital is over-subscribed");
        }
        Resolution::Feasible
    }
}

/// Pick one receiver per multiply-assigned proposer, keeping every receiver's
/// provisional load.
fn select(ws: &mut Workspace, proposers: &[AgentKey], receivers: &[AgentKey]) -> Resolution {
    let mut graph = BipartiteGraph::new();
    let holding: Vec<AgentKey> = proposers
        .iter()
        .copied()
        .filter(|&p| !ws.matching.is_free(p))
        .collect();
    for &p in &holding {
        graph.add_left(p, ws.matching.assigned(p).collect());
    }
    for &r in receivers {
        graph.set_capacity(r, ws.model.capacity(r));
    }
    let chosen = graph.maximum_matching();

    if holding.iter().any(|&p| !chosen.is_matched(p)) {
        return Resolution::Infeasible("a proposer cannot keep any assigned partner");
    }
    if receivers
        .iter()
        .any(|&r| chosen.load(r) != ws.matching.count(r))
    {
        return Resolution::Infeasible("a receiver would lose a provisional partner");
    }

    ws.matching.clear();
    for (p, r) in chosen.pairs() {
        ws.assign(p, r);
    }
    Resolution::Feasible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{InstanceBuilder, Prefs};

    fn solve(builder: InstanceBuilder, proposer: AgentKind) -> (Workspace, Resolution) {
        let mut ws = Workspace::new(builder.build().unwrap().model);
        let resolution = SuperStable::new(proposer).run(&mut ws);
        (ws, resolution)
    }

    fn partner(ws: &Workspace, name: &str) -> Option<String> {
        let key = ws.model.key(name).unwrap();
        ws.matching.partner(key).map(|p| ws.model.name(p).to_string())
    }

    fn three_cycle() -> InstanceBuilder {
        let all_men = || Prefs::ties([vec!["m1", "m2", "m3"]]);
        let all_women = || Prefs::ties([vec!["w1", "w2", "w3"]]);
        InstanceBuilder::new()
            .man("m1", all_women())
            .man("m2", all_women())
            .man("m3", all_women())
            .woman("w1", all_men())
            .woman("w2", all_men())
            .woman("w3", all_men())
    }

    #[test]
    fn test_full_indifference_has_no_super_stable_matching() {
        let (_, resolution) = solve(three_cycle(), AgentKind::Man);
        assert!(matches!(resolution, Resolution::Infeasible(_)));
    }

    #[test]
    fn test_strict_receiver_breaks_proposer_tie() {
        let (ws, resolution) = solve(
            InstanceBuilder::new()
                .man("m1", Prefs::ties([vec!["w1", "w2"]]))
                .man("m2", Prefs::strict(["w1"]))
                .woman("w1", Prefs::strict(["m2", "m1"]))
                .woman("w2", Prefs::strict(["m1"])),
            AgentKind::Man,
        );
        assert_eq!(resolution, Resolution::Feasible);
        assert_eq!(partner(&ws, "m1").as_deref(), Some("w2"));
        assert_eq!(partner(&ws, "m2").as_deref(), Some("w1"));
    }

    #[test]
    fn test_residents_fill_hospital_with_tie() {
        let (ws, resolution) = solve(
            InstanceBuilder::new()
                .resident("r1", Prefs::strict(["h1"]))
                .resident("r2", Prefs::strict(["h1"]))
                .resident("r3", Prefs::strict(["h1"]))
                .hospital("h1", 2, Prefs::ties([vec!["r1"], vec!["r2", "r3"]])),
            AgentKind::Resident,
        );
        // h1 is indifferent between r2 and r3 but has room for only one
        assert!(matches!(resolution, Resolution::Infeasible(_)));
        assert!(!ws.model.contains(ws.model.key("h1").unwrap(), ws.model.key("r2").unwrap()));
    }

    #[test]
    fn test_hospitals_offer_to_tied_residents() {
        let (ws, resolution) = solve(
            InstanceBuilder::new()
                .resident("r1", Prefs::strict(["h1", "h2"]))
                .resident("r2", Prefs::strict(["h2"]))
                .hospital("h1", 1, Prefs::strict(["r1"]))
                .hospital("h2", 2, Prefs::ties([vec!["r1", "r2"]])),
            AgentKind::Hospital,
        );
        assert_eq!(resolution, Resolution::Feasible);
        assert_eq!(partner(&ws, "r1").as_deref(), Some("h1"));
        assert_eq!(partner(&ws, "r2").as_deref(), Some("h2"));
    }

    #[test]
    fn test_hospital_over_quota_is_infeasible() {
        let (_, resolution) = solve(
            InstanceBuilder::new()
                .resident("r1", Prefs::strict(["h1"]))
                .resident("r2", Prefs::strict(["h1"]))
                .hospital("h1", 1, Prefs::ties([vec!["r1", "r2"]])),
            AgentKind::Hospital,
        );
        assert!(matches!(resolution, Resolution::Infeasible(_)));
    }
}
