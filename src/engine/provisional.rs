//! Provisional matching state and the workspace that mutates it.
//!
//! ## Worst pointer
//!
//! Every agent's slot records its assigned partners together with the rank
//! each partner holds on the agent's own list. The worst pointer is the
//! assigned partner with the largest `(rank, key)`; it is updated on every
//! link and recomputed only when the current worst is unlinked.
//!
//! Lecturers are linked to students, not projects, and count each student
//! once even when the student holds several of their projects. Procedures
//! that let a student hold several projects at once measure a lecturer by
//! [`Workspace::load`] instead, which counts assignments.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::preferences::PreferenceModel;
use crate::types::{AgentKey, AgentKind};

/// Occupancy of an agent relative to its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Under,
    Full,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    rank: usize,
    refs: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Slot {
    links: BTreeMap<AgentKey, Link>,
    worst: Option<AgentKey>,
}

impl Slot {
    fn recompute_worst(&mut self) {
        self.worst = self
            .links
            .iter()
            .max_by_key(|(&key, link)| (link.rank, key))
            .map(|(&key, _)| key);
    }
}

/// Mutable mapping from agent to currently assigned partners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provisional {
    slots: HashMap<AgentKey, Slot>,
}

impl Provisional {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `partner` on `owner`'s side with the given rank.
    pub fn link(&mut self, owner: AgentKey, partner: AgentKey, rank: usize) {
        let slot = self.slots.entry(owner).or_default();
        let link = slot.links.entry(partner).or_insert(Link { rank, refs: 0 });
        link.refs += 1;
        let replace = match slot.worst.and_then(|w| slot.links.get(&w).map(|l| (l.rank, w))) {
            Some(current) => (rank, partner) > current,
            None => true,
        };
        if replace {
            slot.worst = Some(partner);
        }
    }

    /// Drop one reference to `partner` from `owner`'s side.
    ///
    /// Returns true when the partner left the slot entirely.
    pub fn unlink(&mut self, owner: AgentKey, partner: AgentKey) -> bool {
        let Some(slot) = self.slots.get_mut(&owner) else {
            return false;
        };
        let Some(link) = slot.links.get_mut(&partner) else {
            return false;
        };
        link.refs -= 1;
        if link.refs > 0 {
            return false;
        }
        slot.links.remove(&partner);
        if slot.worst == Some(partner) {
            slot.recompute_worst();
        }
        true
    }

    /// Assigned partners in key order.
    pub fn assigned(&self, owner: AgentKey) -> impl Iterator<Item = AgentKey> + '_ {
        self.slots
            .get(&owner)
            .into_iter()
            .flat_map(|slot| slot.links.keys().copied())
    }

    #[inline]
    pub fn count(&self, owner: AgentKey) -> usize {
        self.slots.get(&owner).map_or(0, |slot| slot.links.len())
    }

    #[inline]
    pub fn is_free(&self, owner: AgentKey) -> bool {
        self.count(owner) == 0
    }

    #[inline]
    pub fn contains(&self, owner: AgentKey, partner: AgentKey) -> bool {
        self.slots
            .get(&owner)
            .is_some_and(|slot| slot.links.contains_key(&partner))
    }

    /// First assigned partner; the partner for single-capacity agents.
    pub fn partner(&self, owner: AgentKey) -> Option<AgentKey> {
        self.assigned(owner).next()
    }

    /// Worst assigned partner.
    #[inline]
    pub fn worst(&self, owner: AgentKey) -> Option<AgentKey> {
        self.slots.get(&owner).and_then(|slot| slot.worst)
    }

    /// Rank of the worst assigned partner on `owner`'s list.
    pub fn worst_rank(&self, owner: AgentKey) -> Option<usize> {
        let slot = self.slots.get(&owner)?;
        slot.worst.and_then(|w| slot.links.get(&w)).map(|l| l.rank)
    }

    /// Best (smallest) rank among assigned partners.
    pub fn best_rank(&self, owner: AgentKey) -> Option<usize> {
        self.slots
            .get(&owner)?
            .links
            .values()
            .map(|l| l.rank)
            .min()
    }

    /// Assigned partners grouped by rank on `owner`'s list.
    pub fn count_by_rank(&self, owner: AgentKey) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        if let Some(slot) = self.slots.get(&owner) {
            for link in slot.links.values() {
                *counts.entry(link.rank).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Every assigned `(owner, partner)` pair.
    pub fn pairs(&self) -> impl Iterator<Item = (AgentKey, AgentKey)> + '_ {
        self.slots
            .iter()
            .flat_map(|(&owner, slot)| slot.links.keys().map(move |&p| (owner, p)))
    }

    /// Drop every assignment.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Working model plus provisional matching; the only place assignments and
/// deletions happen.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub model: PreferenceModel,
    pub matching: Provisional,
    deletions: usize,
}

impl Workspace {
    pub fn new(model: PreferenceModel) -> Self {
        Self {
            model,
            matching: Provisional::new(),
            deletions: 0,
        }
    }

    /// Build a workspace around an externally produced matching.
    ///
    /// `pairs` are `(agent, partner)` with the agent on the single-capacity
    /// side (or either side for roommates). Ranks come from `model`.
    pub fn from_pairs(
        model: PreferenceModel,
        pairs: impl IntoIterator<Item = (AgentKey, AgentKey)>,
    ) -> Self {
        let mut ws = Self::new(model);
        for (a, b) in pairs {
            if !ws.matching.contains(a, b) {
                ws.assign(a, b);
            }
        }
        ws
    }

    /// Number of pairs deleted so far.
    #[inline]
    pub fn deletions(&self) -> usize {
        self.deletions
    }

    fn rank_of(&self, owner: AgentKey, partner: AgentKey) -> usize {
        self.model.rank(owner, partner).unwrap_or(usize::MAX)
    }

    /// Provisionally join `a` and `b`.
    ///
    /// A student/project pair also links the student to the project's lecturer.
    pub fn assign(&mut self, a: AgentKey, b: AgentKey) {
        let (ra, rb) = (self.rank_of(a, b), self.rank_of(b, a));
        self.matching.link(a, b, ra);
        self.matching.link(b, a, rb);
        if let Some((student, lecturer)) = self.lecturer_link(a, b) {
            let rank = self.rank_of(lecturer, student);
            self.matching.link(lecturer, student, rank);
        }
        trace!(a = %self.model.name(a), b = %self.model.name(b), "assigned");
    }

    /// Break the provisional assignment between `a` and `b`, if any.
    pub fn unassign(&mut self, a: AgentKey, b: AgentKey) -> bool {
        if !self.matching.contains(a, b) {
            return false;
        }
        self.matching.unlink(a, b);
        self.matching.unlink(b, a);
        if let Some((student, lecturer)) = self.lecturer_link(a, b) {
            self.matching.unlink(lecturer, student);
        }
        true
    }

    /// Break any assignment and delete the pair from both lists.
    pub fn reject(&mut self, a: AgentKey, b: AgentKey) {
        self.unassign(a, b);
        if self.model.delete_pair(a, b) {
            self.deletions += 1;
        }
    }

    /// Lecturer side of a student/project pair.
    fn lecturer_link(&self, a: AgentKey, b: AgentKey) -> Option<(AgentKey, AgentKey)> {
        match (self.model.kind(a), self.model.kind(b)) {
            (AgentKind::Student, AgentKind::Project) => self.model.owner(b).map(|l| (a, l)),
            (AgentKind::Project, AgentKind::Student) => self.model.owner(a).map(|l| (b, l)),
            _ => None,
        }
    }

    /// Occupancy of `entity` against its capacity.
    pub fn occupancy(&self, entity: AgentKey) -> Occupancy {
        let (count, cap) = (self.matching.count(entity), self.model.capacity(entity));
        match count.cmp(&cap) {
            std::cmp::Ordering::Less => Occupancy::Under,
            std::cmp::Ordering::Equal => Occupancy::Full,
            std::cmp::Ordering::Greater => Occupancy::Over,
        }
    }

    /// Assignments held by `entity`. A lecturer counts one per
    /// student/project pair on its projects.
    pub fn load(&self, entity: AgentKey) -> usize {
        match self.model.kind(entity) {
            AgentKind::Lecturer => self
                .model
                .offers(entity)
                .iter()
                .map(|&p| self.matching.count(p))
                .sum(),
            _ => self.matching.count(entity),
        }
    }

    /// Occupancy of `entity` measured by [`load`](Self::load).
    pub fn load_occupancy(&self, entity: AgentKey) -> Occupancy {
        match self.load(entity).cmp(&self.model.capacity(entity)) {
            std::cmp::Ordering::Less => Occupancy::Under,
            std::cmp::Ordering::Equal => Occupancy::Full,
            std::cmp::Ordering::Greater => Occupancy::Over,
        }
    }
}
