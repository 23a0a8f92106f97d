//! Agent identity and roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense index of an agent inside a [`PreferenceModel`](crate::PreferenceModel).
///
/// Keys are slab indices and are assigned in insertion order, so iterating
/// agents by key is deterministic.
pub type AgentKey = usize;

/// The role an agent plays in its problem family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Man,
    Woman,
    Resident,
    Hospital,
    Student,
    Project,
    Lecturer,
    Roommate,
}

impl AgentKind {
    /// The problem family this role belongs to.
    pub fn problem(self) -> ProblemKind {
        match self {
            AgentKind::Man | AgentKind::Woman => ProblemKind::Marriage,
            AgentKind::Resident | AgentKind::Hospital => ProblemKind::HospitalResidents,
            AgentKind::Student | AgentKind::Project | AgentKind::Lecturer => {
                ProblemKind::ProjectAllocation
            }
            AgentKind::Roommate => ProblemKind::Roommates,
        }
    }

    /// Whether an agent of this role may rank an agent of role `other`.
    pub fn may_rank(self, other: AgentKind) -> bool {
        matches!(
            (self, other),
            (AgentKind::Man, AgentKind::Woman)
                | (AgentKind::Woman, AgentKind::Man)
                | (AgentKind::Resident, AgentKind::Hospital)
                | (AgentKind::Hospital, AgentKind::Resident)
                | (AgentKind::Student, AgentKind::Project)
                | (AgentKind::Lecturer, AgentKind::Student)
                | (AgentKind::Project, AgentKind::Student)
                | (AgentKind::Roommate, AgentKind::Roommate)
        )
    }

    /// The role this role's list ranks.
    pub fn counterpart(self) -> AgentKind {
        match self {
            AgentKind::Man => AgentKind::Woman,
            AgentKind::Woman => AgentKind::Man,
            AgentKind::Resident => AgentKind::Hospital,
            AgentKind::Hospital => AgentKind::Resident,
            AgentKind::Student => AgentKind::Project,
            AgentKind::Project | AgentKind::Lecturer => AgentKind::Student,
            AgentKind::Roommate => AgentKind::Roommate,
        }
    }

    /// Roles that hold at most one partner.
    #[inline]
    pub fn is_single(self) -> bool {
        matches!(
            self,
            AgentKind::Man
                | AgentKind::Woman
                | AgentKind::Resident
                | AgentKind::Student
                | AgentKind::Roommate
        )
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentKind::Man => "man",
            AgentKind::Woman => "woman",
            AgentKind::Resident => "resident",
            AgentKind::Hospital => "hospital",
            AgentKind::Student => "student",
            AgentKind::Project => "project",
            AgentKind::Lecturer => "lecturer",
            AgentKind::Roommate => "roommate",
        };
        f.write_str(name)
    }
}

/// Problem family of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// Stable Marriage (SM / SMT)
    Marriage,
    /// Hospitals/Residents (HR / HRT)
    HospitalResidents,
    /// Student/Project Allocation (SPA / SPA-ST)
    ProjectAllocation,
    /// Stable Roommates (SR)
    Roommates,
}

impl ProblemKind {
    /// The two roles of a bipartite family: (single-capacity side, other side).
    ///
    /// Project allocation reports students and projects; roommates report the
    /// same role twice.
    pub fn sides(self) -> (AgentKind, AgentKind) {
        match self {
            ProblemKind::Marriage => (AgentKind::Man, AgentKind::Woman),
            ProblemKind::HospitalResidents => (AgentKind::Resident, AgentKind::Hospital),
            ProblemKind::ProjectAllocation => (AgentKind::Student, AgentKind::Project),
            ProblemKind::Roommates => (AgentKind::Roommate, AgentKind::Roommate),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProblemKind::Marriage => "stable marriage",
            ProblemKind::HospitalResidents => "hospitals/residents",
            ProblemKind::ProjectAllocation => "student/project allocation",
            ProblemKind::Roommates => "stable roommates",
        }
    }
}
