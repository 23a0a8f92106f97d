//! Ranked preference lists with ties.
//!
//! ## Layout
//!
//! ```text
//! tie 0          tie 1     tie 2
//! [h3, h1]   >   [h4]  >   [h2]
//! ```
//!
//! Index 0 is the most preferred tie. A strict list has one entry per tie.
//! Deleting the last member of a tie leaves an empty placeholder, so every
//! surviving entry keeps the tie index it was built with and ranks read from
//! a working list always equal ranks in the original list.

use std::collections::HashMap;

use crate::types::AgentKey;

/// One agent's ordered sequence of ties plus its rank table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceList {
    /// Ties in preference order; may contain emptied placeholders
    ties: Vec<Vec<AgentKey>>,

    /// Partner -> tie index, kept in sync with `ties`
    rank: HashMap<AgentKey, usize>,

    /// Number of entries across all ties
    len: usize,
}

impl PreferenceList {
    /// Build a list from ties in preference order.
    ///
    /// Callers guarantee no entry repeats; the instance builder checks this.
    pub fn new(ties: Vec<Vec<AgentKey>>) -> Self {
        let mut rank = HashMap::new();
        let mut len = 0;
        for (idx, tie) in ties.iter().enumerate() {
            for &partner in tie {
                rank.insert(partner, idx);
                len += 1;
            }
        }
        Self { ties, rank, len }
    }

    /// Build a strict list, one partner per tie.
    pub fn strict(order: impl IntoIterator<Item = AgentKey>) -> Self {
        Self::new(order.into_iter().map(|p| vec![p]).collect())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Tie index of `partner`, `None` if not on the list.
    #[inline]
    pub fn rank(&self, partner: AgentKey) -> Option<usize> {
        self.rank.get(&partner).copied()
    }

    #[inline]
    pub fn contains(&self, partner: AgentKey) -> bool {
        self.rank.contains_key(&partner)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All tie slots, including emptied placeholders.
    #[inline]
    pub fn ties(&self) -> &[Vec<AgentKey>] {
        &self.ties
    }

    /// Members of tie `idx`; empty for placeholders or out-of-range indices.
    pub fn tie(&self, idx: usize) -> &[AgentKey] {
        self.ties.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First non-empty tie.
    pub fn head(&self) -> Option<&[AgentKey]> {
        self.ties
            .iter()
            .find(|t| !t.is_empty())
            .map(Vec::as_slice)
    }

    /// Last non-empty tie.
    pub fn tail(&self) -> Option<&[AgentKey]> {
        self.ties
            .iter()
            .rev()
            .find(|t| !t.is_empty())
            .map(Vec::as_slice)
    }

    /// Index of the first non-empty tie.
    pub fn head_rank(&self) -> Option<usize> {
        self.ties.iter().position(|t| !t.is_empty())
    }

    /// Index of the last non-empty tie.
    pub fn tail_rank(&self) -> Option<usize> {
        self.ties.iter().rposition(|t| !t.is_empty())
    }

    /// Entries in preference order, ties in stored order.
    pub fn iter(&self) -> impl Iterator<Item = AgentKey> + '_ {
        self.ties.iter().flatten().copied()
    }

    /// First entry in preference order.
    #[inline]
    pub fn first(&self) -> Option<AgentKey> {
        self.iter().next()
    }

    /// Second entry in preference order.
    #[inline]
    pub fn second(&self) -> Option<AgentKey> {
        self.iter().nth(1)
    }

    /// Last entry in preference order.
    pub fn last(&self) -> Option<AgentKey> {
        self.ties.iter().rev().flatten().next().copied()
    }

    /// Every entry ranked strictly worse than tie `rank`.
    pub fn successors(&self, rank: usize) -> Vec<AgentKey> {
        self.ties
            .iter()
            .skip(rank + 1)
            .flatten()
            .copied()
            .collect()
    }

    /// Whether any tie holds more than one entry.
    pub fn has_ties(&self) -> bool {
        self.ties.iter().any(|t| t.len() > 1)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Remove `partner`, keeping the tie slot. Returns whether it was present.
    pub fn remove(&mut self, partner: AgentKey) -> bool {
        let Some(idx) = self.rank.remove(&partner) else {
            return false;
        };
        let tie = &mut self.ties[idx];
        if let Some(pos) = tie.iter().position(|&p| p == partner) {
            tie.remove(pos);
        }
        self.len -= 1;
        true
    }

    /// Keep only entries for which `keep` returns true. Returns the removed count.
    pub fn retain(&mut self, mut keep: impl FnMut(AgentKey) -> bool) -> usize {
        let doomed: Vec<AgentKey> = self.iter().filter(|&p| !keep(p)).collect();
        for &partner in &doomed {
            self.remove(partner);
        }
        doomed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_and_head_tail() {
        let list = PreferenceList::new(vec![vec![3, 1], vec![4], vec![2]]);
        assert_eq!(list.len(), 4);
        assert_eq!(list.rank(1), Some(0));
        assert_eq!(list.rank(2), Some(2));
        assert_eq!(list.rank(9), None);
        assert_eq!(list.head(), Some(&[3, 1][..]));
        assert_eq!(list.tail(), Some(&[2][..]));
        assert!(list.has_ties());
    }

    #[test]
    fn test_remove_keeps_tie_indices() {
        let mut list = PreferenceList::new(vec![vec![3, 1], vec![4], vec![2]]);
        assert!(list.remove(4));
        assert!(!list.remove(4));
        assert_eq!(list.rank(2), Some(2));
        assert_eq!(list.tie(1), &[] as &[AgentKey]);

        list.remove(3);
        list.remove(1);
        assert_eq!(list.head_rank(), Some(2));
        assert_eq!(list.head(), list.tail());
        assert_eq!(list.first(), Some(2));

        list.remove(2);
        assert!(list.is_empty());
        assert_eq!(list.head(), None);
        assert_eq!(list.tail_rank(), None);
    }

    #[test]
    fn test_successors() {
        let list = PreferenceList::strict([5, 6, 7, 8]);
        assert_eq!(list.successors(1), vec![7, 8]);
        assert!(list.successors(3).is_empty());
        assert_eq!(list.second(), Some(6));
        assert_eq!(list.last(), Some(8));
        assert!(!list.has_ties());
    }

    #[test]
    fn test_retain() {
        let mut list = PreferenceList::new(vec![vec![1, 2], vec![3]]);
        let removed = list.retain(|p| p != 2);
        assert_eq!(removed, 1);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 3]);
    }
}
