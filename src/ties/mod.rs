//! Procedures for preference lists with ties.
//!
//! ## Components
//!
//! - [`BipartiteGraph`]: maximum b-matching and critical sets
//! - [`SuperStable`]: super-stable marriage and hospitals/residents, either
//!   side proposing
//! - [`StrongStable`]: strongly stable marriage and hospitals/residents,
//!   single-capacity side proposing
//! - [`SuperAllocation`]: super-stable student/project allocation, students
//!   proposing
//!
//! Every procedure works on a [`Workspace`] and reports a
//! [`Resolution`](crate::engine::Resolution). A feasible result is only a
//! candidate: the solver certifies it against the original lists before
//! calling it stable.

pub mod bipartite;
pub mod super_stable;
pub mod strong;
pub mod allocation;

use std::collections::VecDeque;

pub use allocation::SuperAllocation;
pub use bipartite::{BipartiteGraph, MaxMatching};
pub use strong::{domination_index, StrongStable};
pub use super_stable::SuperStable;

use crate::engine::Workspace;
use crate::types::AgentKey;

/// Queue `agent` again if it is free and still has someone to propose to.
pub(crate) fn requeue(ws: &Workspace, queue: &mut VecDeque<AgentKey>, agent: AgentKey) {
    if ws.matching.is_free(agent) && !ws.model.list(agent).is_empty() {
        queue.push_back(agent);
    }
}
