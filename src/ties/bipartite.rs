//! Maximum bipartite b-matching and alternating-path reachability.
//!
//! Left vertices take one partner, right vertices up to their capacity.
//! The matching is grown with Kuhn's augmenting paths: a left vertex claims a
//! right vertex with spare capacity, or displaces a holder that can itself be
//! rerouted.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::types::AgentKey;

/// Bipartite graph with capacities on the right side (default 1).
#[derive(Debug, Clone, Default)]
pub struct BipartiteGraph {
    left: Vec<AgentKey>,
    adj: HashMap<AgentKey, Vec<AgentKey>>,
    capacity: HashMap<AgentKey, usize>,
}

/// A maximum matching of a [`BipartiteGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaxMatching {
    /// left vertex -> right vertex
    pub left: HashMap<AgentKey, AgentKey>,
    /// right vertex -> left vertices
    pub right: HashMap<AgentKey, BTreeSet<AgentKey>>,
}

impl MaxMatching {
    #[inline]
    pub fn size(&self) -> usize {
        self.left.len()
    }

    #[inline]
    pub fn is_matched(&self, u: AgentKey) -> bool {
        self.left.contains_key(&u)
    }

    #[inline]
    pub fn load(&self, v: AgentKey) -> usize {
        self.right.get(&v).map_or(0, BTreeSet::len)
    }

    fn pair(&mut self, u: AgentKey, v: AgentKey) {
        if let Some(old) = self.left.insert(u, v) {
            if let Some(holders) = self.right.get_mut(&old) {
                holders.remove(&u);
            }
        }
        self.right.entry(v).or_default().insert(u);
    }

    /// Matched pairs sorted by left vertex.
    pub fn pairs(&self) -> Vec<(AgentKey, AgentKey)> {
        let mut pairs: Vec<_> = self.left.iter().map(|(&u, &v)| (u, v)).collect();
        pairs.sort_unstable();
        pairs
    }
}

impl BipartiteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a left vertex with its neighbours, in the order they are tried.
    pub fn add_left(&mut self, u: AgentKey, neighbours: Vec<AgentKey>) {
        self.left.push(u);
        self.adj.insert(u, neighbours);
    }

    pub fn set_capacity(&mut self, v: AgentKey, capacity: usize) {
        self.capacity.insert(v, capacity);
    }

    #[inline]
    pub fn left(&self) -> &[AgentKey] {
        &self.left
    }

    fn neighbours(&self, u: AgentKey) -> &[AgentKey] {
        self.adj.get(&u).map(Vec::as_slice).unwrap_or(&[])
    }

    fn capacity(&self, v: AgentKey) -> usize {
        self.capacity.get(&v).copied().unwrap_or(1)
    }

    /// Kuhn's algorithm, left vertices in insertion order.
    pub fn maximum_matching(&self) -> MaxMatching {
        let mut matching = MaxMatching::default();
        for &u in &self.left {
            let mut visited = HashSet::new();
            self.augment(u, &mut visited, &mut matching);
        }
        matching
    }

    fn augment(&self, u: AgentKey, visited: &mut HashSet<AgentKey>, m: &mut MaxMatching) -> bool {
        for &v in self.neighbours(u) {
            if !visited.insert(v) {
                continue;
            }
            if m.load(v) < self.capacity(v) {
                m.pair(u, v);
                return true;
            }
            let holders: Vec<AgentKey> = m
                .right
                .get(&v)
                .map(|h| h.iter().copied().collect())
                .unwrap_or_default();
            for w in holders {
                // w moves elsewhere, freeing its seat at v
                if self.augment(w, visited, m) {
                    m.pair(u, v);
                    return true;
                }
            }
        }
        false
    }

    /// Left vertices reachable from unmatched left vertices by alternating
    /// paths, and their right-side neighbourhood.
    ///
    /// With `matching` maximum, the left set is the maximum-deficiency set.
    pub fn critical_set(&self, matching: &MaxMatching) -> (BTreeSet<AgentKey>, BTreeSet<AgentKey>) {
        let mut critical: BTreeSet<AgentKey> = self
            .left
            .iter()
            .copied()
            .filter(|&u| !matching.is_matched(u))
            .collect();
        let mut neighbourhood = BTreeSet::new();
        let mut frontier: Vec<AgentKey> = critical.iter().copied().collect();

        while let Some(u) = frontier.pop() {
            for &v in self.neighbours(u) {
                if !neighbourhood.insert(v) {
                    continue;
                }
                for &w in matching.right.get(&v).into_iter().flatten() {
                    if critical.insert(w) {
                        frontier.push(w);
                    }
                }
            }
        }
        (critical, neighbourhood)
    }
}
