//! The preference model: every agent and its working list.
//!
//! ## Architecture
//!
//! - **Slab**: agent arena, keys handed out in insertion order
//! - **HashMap**: identifier to slab key
//!
//! ## Deletion
//!
//! The acceptability relation is symmetric: `b` is on `a`'s list iff `a` is
//! on `b`'s. [`PreferenceModel::delete_pair`] is the only way to shrink lists
//! and always removes both directions. For project allocation the lecturer
//! relation is derived: a lecturer keeps a student exactly while the student
//! still ranks one of the lecturer's projects.
//!
//! ## Example
//!
//! ```
//! use stablematch::preferences::{InstanceBuilder, Prefs};
//!
//! let instance = InstanceBuilder::new()
//!     .man("m1", Prefs::strict(["w1", "w2"]))
//!     .man("m2", Prefs::strict(["w1"]))
//!     .woman("w1", Prefs::strict(["m2", "m1"]))
//!     .woman("w2", Prefs::strict(["m2"]))
//!     .build()
//!     .unwrap();
//!
//! let model = &instance.model;
//! let (m1, w2) = (model.key("m1").unwrap(), model.key("w2").unwrap());
//!
//! // w2 does not rank m1, so cleaning removed the pair from both sides
//! assert_eq!(model.rank(m1, w2), None);
//! assert!(model.is_symmetric());
//! ```

use std::collections::HashMap;

use slab::Slab;
use tracing::trace;

use crate::error::{InstanceError, MatchError};
use crate::preferences::{AgentNode, PreferenceList};
use crate::types::{AgentKey, AgentKind};

/// Arena of agents with their preference lists.
#[derive(Debug, Clone, Default)]
pub struct PreferenceModel {
    /// Agent storage
    agents: Slab<AgentNode>,

    /// Identifier to slab key
    index: HashMap<String, AgentKey>,
}

impl PreferenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model with room for `agents` agents.
    pub fn with_capacity(agents: usize) -> Self {
        Self {
            agents: Slab::with_capacity(agents),
            index: HashMap::with_capacity(agents),
        }
    }

    // ========================================================================
    // Agents
    // ========================================================================

    /// Add an agent with an empty list.
    pub fn add_agent(
        &mut self,
        name: &str,
        kind: AgentKind,
        capacity: usize,
    ) -> Result<AgentKey, InstanceError> {
        if self.index.contains_key(name) {
            return Err(InstanceError::DuplicateAgent(name.to_string()));
        }
        let key = self.agents.insert(AgentNode::new(name, kind, capacity));
        self.index.insert(name.to_string(), key);
        Ok(key)
    }

    /// Replace an agent's list.
    pub(crate) fn set_preferences(&mut self, key: AgentKey, prefs: PreferenceList) {
        self.agents[key].prefs = prefs;
    }

    /// Link a project to the lecturer offering it.
    pub(crate) fn link_project(&mut self, project: AgentKey, lecturer: AgentKey) {
        self.agents[project].owner = Some(lecturer);
        self.agents[lecturer].offers.push(project);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Slab key for an identifier.
    #[inline]
    pub fn key(&self, name: &str) -> Option<AgentKey> {
        self.index.get(name).copied()
    }

    /// Slab key for an identifier, as an error when absent.
    pub fn require(&self, name: &str) -> Result<AgentKey, MatchError> {
        self.key(name)
            .ok_or_else(|| MatchError::UnknownAgent(name.to_string()))
    }

    #[inline]
    pub fn node(&self, key: AgentKey) -> &AgentNode {
        &self.agents[key]
    }

    #[inline]
    pub fn name(&self, key: AgentKey) -> &str {
        &self.agents[key].name
    }

    #[inline]
    pub fn kind(&self, key: AgentKey) -> AgentKind {
        self.agents[key].kind
    }

    #[inline]
    pub fn capacity(&self, key: AgentKey) -> usize {
        self.agents[key].capacity
    }

    /// Lecturer offering `project`.
    #[inline]
    pub fn owner(&self, project: AgentKey) -> Option<AgentKey> {
        self.agents[project].owner
    }

    /// Projects offered by `lecturer`.
    #[inline]
    pub fn offers(&self, lecturer: AgentKey) -> &[AgentKey] {
        &self.agents[lecturer].offers
    }

    /// All agent keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = AgentKey> + '_ {
        self.agents.iter().map(|(key, _)| key)
    }

    /// Keys of every agent with role `kind`, in insertion order.
    pub fn keys_of(&self, kind: AgentKind) -> Vec<AgentKey> {
        self.agents
            .iter()
            .filter(|(_, node)| node.kind == kind)
            .map(|(key, _)| key)
            .collect()
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    #[inline]
    pub fn list(&self, key: AgentKey) -> &PreferenceList {
        &self.agents[key].prefs
    }

    /// Tie index of `partner` on `agent`'s working list.
    #[inline]
    pub fn rank(&self, agent: AgentKey, partner: AgentKey) -> Option<usize> {
        self.agents[agent].prefs.rank(partner)
    }

    #[inline]
    pub fn contains(&self, agent: AgentKey, partner: AgentKey) -> bool {
        self.agents[agent].prefs.contains(partner)
    }

    /// First non-empty tie of `agent`'s list.
    pub fn head(&self, agent: AgentKey) -> Result<&[AgentKey], MatchError> {
        self.agents[agent]
            .prefs
            .head()
            .ok_or_else(|| MatchError::EmptyPreferenceList(self.name(agent).to_string()))
    }

    /// Last non-empty tie of `agent`'s list.
    pub fn tail(&self, agent: AgentKey) -> Option<&[AgentKey]> {
        self.agents[agent].prefs.tail()
    }

    /// Whether any list in the model contains a tie of size above one.
    pub fn has_ties(&self) -> bool {
        self.agents.iter().any(|(_, node)| node.prefs.has_ties())
    }

    /// Whether `student` still ranks any project offered by `lecturer`.
    fn ranks_any_offer(&self, student: AgentKey, lecturer: AgentKey) -> bool {
        self.agents[lecturer]
            .offers
            .iter()
            .any(|&p| self.agents[student].prefs.contains(p))
    }

    /// Remove the pair `(a, b)` from both lists.
    ///
    /// When one side is a student and the other a project, the student also
    /// leaves the lecturer's list once they rank none of that lecturer's
    /// projects. Returns whether anything was removed.
    pub fn delete_pair(&mut self, a: AgentKey, b: AgentKey) -> bool {
        let removed_a = self.agents[a].prefs.remove(b);
        let removed_b = self.agents[b].prefs.remove(a);

        let student_project = match (self.kind(a), self.kind(b)) {
            (AgentKind::Student, AgentKind::Project) => Some((a, b)),
            (AgentKind::Project, AgentKind::Student) => Some((b, a)),
            _ => None,
        };
        if let Some((student, project)) = student_project {
            if let Some(lecturer) = self.owner(project) {
                if !self.ranks_any_offer(student, lecturer) {
                    self.agents[lecturer].prefs.remove(student);
                }
            }
        }

        if removed_a || removed_b {
            trace!(a = %self.name(a), b = %self.name(b), "deleted pair");
        }
        removed_a || removed_b
    }

    // ========================================================================
    // Cleaning and invariants
    // ========================================================================

    /// Whether `agent` accepts `partner` given the other side's list.
    fn mutually_acceptable(&self, agent: AgentKey, partner: AgentKey) -> bool {
        match self.kind(agent) {
            AgentKind::Lecturer => self.ranks_any_offer(partner, agent),
            _ => self.contains(partner, agent),
        }
    }

    /// Drop every one-sided entry, repeating until nothing changes.
    ///
    /// Returns the number of entries removed.
    pub fn clean(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let mut doomed = Vec::new();
            for (key, node) in &self.agents {
                for partner in node.prefs.iter() {
                    if !self.mutually_acceptable(key, partner) {
                        doomed.push((key, partner));
                    }
                }
            }
            if doomed.is_empty() {
                return removed;
            }
            for (key, partner) in doomed {
                if self.agents[key].prefs.remove(partner) {
                    removed += 1;
                }
            }
        }
    }

    /// Check the symmetry invariant over every list.
    pub fn is_symmetric(&self) -> bool {
        self.agents.iter().all(|(key, node)| {
            node.prefs
                .iter()
                .all(|partner| self.mutually_acceptable(key, partner))
        }) && self.lecturers_cover_their_students()
    }

    /// Every student ranking a project is on the owning lecturer's list.
    fn lecturers_cover_their_students(&self) -> bool {
        self.agents
            .iter()
            .filter(|(_, node)| node.kind == AgentKind::Student)
            .all(|(student, node)| {
                node.prefs.iter().all(|project| {
                    self.owner(project)
                        .map_or(true, |l| self.contains(l, student))
                })
            })
    }

    /// Deep copy used as the immutable original for verification.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marriage() -> (PreferenceModel, [AgentKey; 4]) {
        let mut model = PreferenceModel::new();
        let m1 = model.add_agent("m1", AgentKind::Man, 1).unwrap();
        let m2 = model.add_agent("m2", AgentKind::Man, 1).unwrap();
        let w1 = model.add_agent("w1", AgentKind::Woman, 1).unwrap();
        let w2 = model.add_agent("w2", AgentKind::Woman, 1).unwrap();
        model.set_preferences(m1, PreferenceList::strict([w2, w1]));
        model.set_preferences(m2, PreferenceList::strict([w1, w2]));
        model.set_preferences(w1, PreferenceList::strict([m2, m1]));
        model.set_preferences(w2, PreferenceList::strict([m1]));
        (model, [m1, m2, w1, w2])
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let mut model = PreferenceModel::new();
        model.add_agent("a", AgentKind::Roommate, 1).unwrap();
        assert_eq!(
            model.add_agent("a", AgentKind::Roommate, 1),
            Err(InstanceError::DuplicateAgent("a".into()))
        );
    }

    #[test]
    fn test_clean_removes_one_sided_pairs() {
        let (mut model, [m1, m2, w1, w2]) = marriage();
        assert!(!model.is_symmetric());
        assert_eq!(model.clean(), 1);
        assert!(!model.contains(m2, w2));
        assert!(model.contains(m1, w2));
        assert!(model.contains(w1, m1));
        assert!(model.is_symmetric());
    }

    #[test]
    fn test_delete_pair_is_symmetric() {
        let (mut model, [m1, _, w1, _]) = marriage();
        model.clean();
        assert!(model.delete_pair(m1, w1));
        assert!(!model.contains(m1, w1));
        assert!(!model.contains(w1, m1));
        assert!(!model.delete_pair(w1, m1));
        assert!(model.is_symmetric());
    }

    #[test]
    fn test_head_of_exhausted_list() {
        let (mut model, [m1, _, w1, w2]) = marriage();
        model.clean();
        model.delete_pair(m1, w1);
        model.delete_pair(m1, w2);
        assert_eq!(
            model.head(m1),
            Err(MatchError::EmptyPreferenceList("m1".into()))
        );
        assert!(model.tail(m1).is_none());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let (mut model, [m1, _, w1, _]) = marriage();
        model.clean();
        let original = model.snapshot();
        model.delete_pair(m1, w1);
        assert_eq!(original.rank(m1, w1), Some(1));
        assert_eq!(model.rank(m1, w1), None);
    }

    #[test]
    fn test_lecturer_list_follows_student_projects() {
        let mut model = PreferenceModel::new();
        let s = model.add_agent("s1", AgentKind::Student, 1).unwrap();
        let p1 = model.add_agent("p1", AgentKind::Project, 1).unwrap();
        let p2 = model.add_agent("p2", AgentKind::Project, 1).unwrap();
        let l = model.add_agent("l1", AgentKind::Lecturer, 2).unwrap();
        model.link_project(p1, l);
        model.link_project(p2, l);
        model.set_preferences(s, PreferenceList::strict([p1, p2]));
        model.set_preferences(p1, PreferenceList::strict([s]));
        model.set_preferences(p2, PreferenceList::strict([s]));
        model.set_preferences(l, PreferenceList::strict([s]));
        assert!(model.is_symmetric());

        model.delete_pair(s, p1);
        assert!(model.contains(l, s));
        model.delete_pair(p2, s);
        assert!(!model.contains(l, s));
        assert!(model.is_symmetric());
    }
}
