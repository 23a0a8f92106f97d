//! Role configurations for the proposal engine.
//!
//! A role configuration tells the generic engine who proposes, which capacity
//! entities a proposal touches, and how those entities shed agents.
//!
//! | Configuration | Proposers | Capacity entities touched |
//! |---------------|-----------|---------------------------|
//! | [`OneToMany::one_to_one`] | men or women | the receiver |
//! | [`OneToMany`] | residents or hospitals | the receiver |
//! | [`TwoLevel`] | students | the project, then its lecturer |

use crate::engine::{Occupancy, Workspace};
use crate::types::{AgentKey, AgentKind};

/// Capability set the proposal engine needs from a role configuration.
pub trait RoleConfig {
    /// Role of the proposing side.
    fn proposer(&self) -> AgentKind;

    /// Best acceptable target `proposer` does not already hold.
    fn next_target(&self, ws: &Workspace, proposer: AgentKey) -> Option<AgentKey>;

    /// Provisionally assign and return the capacity entities to re-check,
    /// innermost level first.
    fn propose(&self, ws: &mut Workspace, proposer: AgentKey, target: AgentKey) -> Vec<AgentKey>;

    fn is_at_capacity(&self, ws: &Workspace, entity: AgentKey) -> Occupancy {
        ws.occupancy(entity)
    }

    fn worst_assigned(&self, ws: &Workspace, entity: AgentKey) -> Option<AgentKey> {
        ws.matching.worst(entity)
    }

    /// Evict the worst agent of an over-subscribed entity; returns the
    /// proposer freed by the eviction.
    fn displace(&self, ws: &mut Workspace, entity: AgentKey) -> Option<AgentKey>;

    /// Delete every pair ranked strictly worse than the worst assigned agent
    /// of a full entity.
    fn reject_dominated(&self, ws: &mut Workspace, entity: AgentKey);

    /// Whether `proposer` may hold another partner.
    fn has_room(&self, ws: &Workspace, proposer: AgentKey) -> bool {
        ws.matching.count(proposer) < ws.model.capacity(proposer)
    }
}

// ============================================================================
// One-to-one and one-to-many
// ============================================================================

/// Proposers of one role against receivers of the other.
///
/// Capacities on both sides come from the model, so the same configuration
/// runs marriage (unit capacities), resident-proposing HR and
/// hospital-proposing HR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneToMany {
    proposer: AgentKind,
}

impl OneToMany {
    pub fn new(proposer: AgentKind) -> Self {
        Self { proposer }
    }

    /// Unit-capacity configuration for marriage.
    pub fn one_to_one(proposer: AgentKind) -> Self {
        Self::new(proposer)
    }
}

impl RoleConfig for OneToMany {
    fn proposer(&self) -> AgentKind {
        self.proposer
    }

    fn next_target(&self, ws: &Workspace, proposer: AgentKey) -> Option<AgentKey> {
        ws.model
            .list(proposer)
            .iter()
            .find(|&t| !ws.matching.contains(proposer, t))
    }

    fn propose(&self, ws: &mut Workspace, proposer: AgentKey, target: AgentKey) -> Vec<AgentKey> {
        ws.assign(proposer, target);
        vec![target]
    }

    fn displace(&self, ws: &mut Workspace, entity: AgentKey) -> Option<AgentKey> {
        let worst = self.worst_assigned(ws, entity)?;
        ws.reject(worst, entity);
        Some(worst)
    }

    fn reject_dominated(&self, ws: &mut Workspace, entity: AgentKey) {
        let Some(rank) = ws.matching.worst_rank(entity) else {
            return;
        };
        for agent in ws.model.list(entity).successors(rank) {
            ws.reject(agent, entity);
        }
    }
}

// ============================================================================
// Two-level: student -> project -> lecturer
// ============================================================================

/// Students proposing to projects under per-project and per-lecturer quotas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TwoLevel;

impl RoleConfig for TwoLevel {
    fn proposer(&self) -> AgentKind {
        AgentKind::Student
    }

    fn next_target(&self, ws: &Workspace, student: AgentKey) -> Option<AgentKey> {
        ws.model
            .list(student)
            .iter()
            .find(|&p| !ws.matching.contains(student, p))
    }

    fn propose(&self, ws: &mut Workspace, student: AgentKey, project: AgentKey) -> Vec<AgentKey> {
        ws.assign(student, project);
        match ws.model.owner(project) {
            Some(lecturer) => vec![project, lecturer],
            None => vec![project],
        }
    }

    fn displace(&self, ws: &mut Workspace, entity: AgentKey) -> Option<AgentKey> {
        let worst = self.worst_assigned(ws, entity)?;
        match ws.model.kind(entity) {
            AgentKind::Lecturer => {
                // the worst student's project under this lecturer
                let project = ws
                    .matching
                    .assigned(worst)
                    .find(|&p| ws.model.owner(p) == Some(entity))?;
                ws.reject(worst, project);
            }
            _ => ws.reject(worst, entity),
        }
        Some(worst)
    }

    fn reject_dominated(&self, ws: &mut Workspace, entity: AgentKey) {
        let Some(rank) = ws.matching.worst_rank(entity) else {
            return;
        };
        let dominated = ws.model.list(entity).successors(rank);
        match ws.model.kind(entity) {
            AgentKind::Lecturer => {
                for student in dominated {
                    let offered: Vec<AgentKey> = ws
                        .model
                        .offers(entity)
                        .iter()
                        .copied()
                        .filter(|&p| ws.model.contains(student, p))
                        .collect();
                    for project in offered {
                        ws.reject(student, project);
                    }
                }
            }
            _ => {
                for student in dominated {
                    ws.reject(student, entity);
                }
            }
        }
    }
}
