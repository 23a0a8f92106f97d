//! Lecturer-optimal student/project allocation.
//!
//! Lecturers make the offers. While some lecturer is under quota and some
//! student on their list could take one of their under-subscribed projects
//! (the student ranks it strictly above their current project, and is ranked
//! on the project's projected list), the first such student on the
//! lecturer's list takes the first such project on their own list, dropping
//! any previous project and deleting every project they rank lower.
//!
//! A student never moves to a project tied with the one they hold, so every
//! move is a strict improvement and the loop terminates.

use tracing::{debug, trace};

use crate::engine::{RunStats, Workspace};
use crate::types::{AgentKey, AgentKind};

/// Lecturer-proposing procedure for strict allocation instances.
#[derive(Debug, Clone, Default)]
pub struct LecturerOptimal {
    stats: RunStats,
}

impl LecturerOptimal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&mut self, ws: &mut Workspace) -> RunStats {
        let deletions_before = ws.deletions();
        let lecturers = ws.model.keys_of(AgentKind::Lecturer);

        while let Some((student, project)) = next_offer(ws, &lecturers) {
            self.stats.proposals += 1;
            trace!(
                student = %ws.model.name(student),
                project = %ws.model.name(project),
                "offer"
            );
            if let Some(current) = ws.matching.partner(student) {
                ws.unassign(student, current);
                self.stats.displacements += 1;
            }
            ws.assign(student, project);

            if let Some(rank) = ws.model.rank(student, project) {
                for worse in ws.model.list(student).successors(rank) {
                    ws.reject(student, worse);
                }
            }
        }

        self.stats.deletions = ws.deletions() - deletions_before;
        debug!(
            offers = self.stats.proposals,
            deletions = self.stats.deletions,
            "lecturer-optimal allocation converged"
        );
        self.stats
    }
}

/// First admissible `(student, project)` for the first lecturer with room.
fn next_offer(ws: &Workspace, lecturers: &[AgentKey]) -> Option<(AgentKey, AgentKey)> {
    lecturers
        .iter()
        .copied()
        .filter(|&l| ws.matching.count(l) < ws.model.capacity(l))
        .find_map(|lecturer| {
            ws.model.list(lecturer).iter().find_map(|student| {
                let held = ws.matching.best_rank(student).unwrap_or(usize::MAX);
                let list = ws.model.list(student);
                list.iter()
                    .find(|&p| {
                        ws.model.owner(p) == Some(lecturer)
                            && list.rank(p).is_some_and(|rank| rank < held)
                            && ws.matching.count(p) < ws.model.capacity(p)
                            && ws.model.contains(p, student)
                    })
                    .map(|p| (student, p))
            })
        })
}
