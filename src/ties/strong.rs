//! Strong stability for marriage and hospitals/residents with ties.
//!
//! Proposers are men, women or residents; receivers carry the capacity.
//!
//! ## Rounds
//!
//! 1. **Proposal**: a free proposer is assigned to its whole head tie. Once
//!    a receiver holds at least its capacity, everyone after its domination
//!    tie is deleted
//! 2. **Bound edges**: an assignment is bound unless its receiver is
//!    over-subscribed and the proposer sits in the receiver's tail tie
//! 3. **Reduced graph**: proposers with no bound assignment, joined to the
//!    receivers they hold through unbound edges; each receiver keeps the
//!    capacity its bound proposers leave free
//! 4. **Critical set**: with a maximum matching of the reduced graph, the
//!    proposers reachable from unmatched ones by alternating paths form the
//!    critical set `Z`. Each receiver in `N(Z)` deletes its tail tie and the
//!    round repeats; an empty `Z` ends the loop
//!
//! The final matching is the bound edges plus the reduced-graph matching.
//! No strongly stable matching exists when a proposer is bound twice, when
//! an over-subscribed receiver cannot be filled, or when a receiver that
//! filled up during the run ends under quota.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, trace};

use crate::engine::{Resolution, RunStats, Workspace};
use crate::ties::{bipartite::BipartiteGraph, requeue};
use crate::types::{AgentKey, AgentKind};

/// Strongly stable procedure for one single-capacity proposing side.
#[derive(Debug, Clone)]
pub struct StrongStable {
    proposer: AgentKind,
    stats: RunStats,
    rounds: usize,
    been_full: BTreeSet<AgentKey>,
}

/// Bound assignments and the reduced graph of one round.
struct Reduction {
    bound: BTreeMap<AgentKey, BTreeSet<AgentKey>>,
    graph: BipartiteGraph,
}

impl StrongStable {
    pub fn new(proposer: AgentKind) -> Self {
        Self {
            proposer,
            stats: RunStats::default(),
            rounds: 0,
            been_full: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Critical-set rounds taken by the last run.
    #[inline]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Run to completion. On `Feasible`, `ws.matching` holds the candidate.
    pub fn run(&mut self, ws: &mut Workspace) -> Resolution {
        let deletions_before = ws.deletions();
        let proposers = ws.model.keys_of(self.proposer);
        let receivers = ws.model.keys_of(self.proposer.counterpart());
        let mut queue: VecDeque<AgentKey> = proposers.iter().copied().collect();

        let resolution = loop {
            self.rounds += 1;
            self.propose(ws, &mut queue);

            let reduction = reduce(ws, &proposers, &receivers);
            let matched = reduction.graph.maximum_matching();
            let (critical, neighbourhood) = reduction.graph.critical_set(&matched);
            if critical.is_empty() {
                break self.finish(ws, &receivers, reduction, matched.pairs());
            }

            trace!(
                round = self.rounds,
                critical = critical.len(),
                receivers = neighbourhood.len(),
                "critical set"
            );
            for h in neighbourhood {
                let tail = ws.model.tail(h).map(<[AgentKey]>::to_vec).unwrap_or_default();
                for r in tail {
                    ws.reject(r, h);
                    requeue(ws, &mut queue, r);
                }
            }
        };

        self.stats.deletions = ws.deletions() - deletions_before;
        debug!(
            proposer = %self.proposer,
            proposals = self.stats.proposals,
            deletions = self.stats.deletions,
            rounds = self.rounds,
            ?resolution,
            "strong procedure finished"
        );
        resolution
    }

    fn propose(&mut self, ws: &mut Workspace, queue: &mut VecDeque<AgentKey>) {
        while let Some(p) = queue.pop_front() {
            if !ws.matching.is_free(p) {
                continue;
            }
            let Some(head) = ws.model.list(p).head().map(<[AgentKey]>::to_vec) else {
                continue;
            };
            for h in head {
                if !ws.model.contains(p, h) {
                    continue;
                }
                self.stats.proposals += 1;
                ws.assign(p, h);

                if ws.matching.count(h) < ws.model.capacity(h) {
                    continue;
                }
                self.been_full.insert(h);
                if let Some(dominated) = domination_index(ws, h) {
                    for x in ws.model.list(h).successors(dominated) {
                        ws.reject(x, h);
                        requeue(ws, queue, x);
                    }
                }
            }
            requeue(ws, queue, p);
        }
    }

    fn finish(
        &self,
        ws: &mut Workspace,
        receivers: &[AgentKey],
        reduction: Reduction,
        matched: Vec<(AgentKey, AgentKey)>,
    ) -> Resolution {
        if reduction.bound.values().any(|hs| hs.len() > 1) {
            return Resolution::Infeasible("a proposer is bound to two receivers");
        }
        let over: Vec<AgentKey> = receivers
            .iter()
            .copied()
            .filter(|&h| ws.matching.count(h) > ws.model.capacity(h))
            .collect();

        ws.matching.clear();
        for (&r, hs) in &reduction.bound {
            for &h in hs {
                ws.assign(r, h);
            }
        }
        for (r, h) in matched {
            ws.assign(r, h);
        }

        if over
            .iter()
            .any(|&h| ws.matching.count(h) != ws.model.capacity(h))
        {
            return Resolution::Infeasible("an over-subscribed receiver cannot be filled");
        }
        if self
            .been_full
            .iter()
            .any(|&h| ws.matching.count(h) < ws.model.capacity(h))
        {
            return Resolution::Infeasible("a receiver lost partners after filling up");
        }
        Resolution::Feasible
    }
}

/// First tie index of `h` at which its assignees, counted cumulatively from
/// the top, reach its capacity.
pub fn domination_index(ws: &Workspace, h: AgentKey) -> Option<usize> {
    let capacity = ws.model.capacity(h);
    let mut seen = 0;
    for (rank, count) in ws.matching.count_by_rank(h) {
        seen += count;
        if seen >= capacity {
            return Some(rank);
        }
    }
    None
}

fn reduce(ws: &Workspace, proposers: &[AgentKey], receivers: &[AgentKey]) -> Reduction {
    let mut bound: BTreeMap<AgentKey, BTreeSet<AgentKey>> = BTreeMap::new();
    let mut unbound: BTreeMap<AgentKey, Vec<AgentKey>> = BTreeMap::new();
    let mut graph = BipartiteGraph::new();

    for &h in receivers {
        let over = ws.matching.count(h) > ws.model.capacity(h);
        let tail_rank = ws.model.list(h).tail_rank();
        let mut bound_here = 0;
        for r in ws.matching.assigned(h) {
            if over && ws.model.rank(h, r) == tail_rank {
                unbound.entry(r).or_default().push(h);
            } else {
                bound.entry(r).or_default().insert(h);
                bound_here += 1;
            }
        }
        graph.set_capacity(h, ws.model.capacity(h).saturating_sub(bound_here));
    }

    for &r in proposers {
        if bound.contains_key(&r) {
            continue;
        }
        if let Some(edges) = unbound.remove(&r) {
            graph.add_left(r, edges);
        }
    }
    Reduction { bound, graph }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{InstanceBuilder, Prefs};

    fn solve(builder: InstanceBuilder, proposer: AgentKind) -> (Workspace, Resolution) {
        let mut ws = Workspace::new(builder.build().unwrap().model);
        let resolution = StrongStable::new(proposer).run(&mut ws);
        (ws, resolution)
    }

    fn partner(ws: &Workspace, name: &str) -> Option<String> {
        let key = ws.model.key(name).unwrap();
        ws.matching.partner(key).map(|p| ws.model.name(p).to_string())
    }

    #[test]
    fn test_domination_index() {
        let instance = InstanceBuilder::new()
            .resident("r1", Prefs::strict(["h1"]))
            .resident("r2", Prefs::strict(["h1"]))
            .resident("r3", Prefs::strict(["h1"]))
            .hospital("h1", 2, Prefs::ties([vec!["r1"], vec!["r2", "r3"]]))
            .build()
            .unwrap();
        let key = |n: &str| instance.model.key(n).unwrap();
        let (r1, r2, h1) = (key("r1"), key("r2"), key("h1"));
        let mut ws = Workspace::new(instance.model.clone());

        ws.assign(r1, h1);
        assert_eq!(domination_index(&ws, h1), None);
        ws.assign(r2, h1);
        assert_eq!(domination_index(&ws, h1), Some(1));
    }

    #[test]
    fn test_indifferent_woman_takes_one_of_two() {
        // w1 cannot separate m1 and m2, but m2 has an equally good option
        let (ws, resolution) = solve(
            InstanceBuilder::new()
                .man("m1", Prefs::strict(["w1"]))
                .man("m2", Prefs::ties([vec!["w1", "w2"]]))
                .woman("w1", Prefs::ties([vec!["m1", "m2"]]))
                .woman("w2", Prefs::strict(["m2"])),
            AgentKind::Man,
        );
        assert_eq!(resolution, Resolution::Feasible);
        assert_eq!(partner(&ws, "m1").as_deref(), Some("w1"));
        assert_eq!(partner(&ws, "m2").as_deref(), Some("w2"));
    }

    #[test]
    fn test_full_indifference_has_perfect_strong_matching() {
        let all_men = || Prefs::ties([vec!["m1", "m2", "m3"]]);
        let all_women = || Prefs::ties([vec!["w1", "w2", "w3"]]);
        let (ws, resolution) = solve(
            InstanceBuilder::new()
                .man("m1", all_women())
                .man("m2", all_women())
                .man("m3", all_women())
                .woman("w1", all_men())
                .woman("w2", all_men())
                .woman("w3", all_men()),
            AgentKind::Man,
        );
        assert_eq!(resolution, Resolution::Feasible);
        for man in ["m1", "m2", "m3"] {
            assert!(partner(&ws, man).is_some());
        }
    }

    #[test]
    fn test_two_residents_tied_for_one_seat() {
        let (_, resolution) = solve(
            InstanceBuilder::new()
                .resident("r1", Prefs::strict(["h1"]))
                .resident("r2", Prefs::strict(["h1"]))
                .hospital("h1", 1, Prefs::ties([vec!["r1", "r2"]])),
            AgentKind::Resident,
        );
        assert!(matches!(resolution, Resolution::Infeasible(_)));
    }
}
