//! Student-oriented super-stable allocation with ties (SPA-ST).
//!
//! A free student is assigned to every project in its head tie. A lecturer's
//! load counts student/project assignments, so a student holding two of its
//! projects weighs twice. After each assignment:
//!
//! - an over-subscribed project deletes its tail tie
//! - an over-subscribed lecturer removes each student in its tail tie from
//!   every one of its projects
//! - a full project deletes the students it ranks below its worst assignee
//! - a full lecturer removes every student it ranks below its worst assignee
//!
//! When the queue drains, a project that was full, is now under quota and
//! rejected some student at rank `r` forces its lecturer to drop its tail tie
//! if that tie sits at rank `r` or worse. Proposals resume until nothing
//! changes. A student left with two projects, or any entity over quota,
//! means no super-stable matching exists. Any other candidate still has to
//! pass the stability check against the original lists.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, trace};

use crate::engine::{Occupancy, Resolution, RunStats, Workspace};
use crate::ties::requeue;
use crate::types::{AgentKey, AgentKind};

/// Super-stable student-proposing procedure for allocation instances.
#[derive(Debug, Clone, Default)]
pub struct SuperAllocation {
    stats: RunStats,
    queue: VecDeque<AgentKey>,
    been_full: BTreeSet<AgentKey>,
    /// project -> best rank among the students it rejected itself
    best_rejected: BTreeMap<AgentKey, usize>,
}

impl SuperAllocation {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Run to completion. On `Feasible`, `ws.matching` holds the candidate.
    pub fn run(&mut self, ws: &mut Workspace) -> Resolution {
        let deletions_before = ws.deletions();
        let students = ws.model.keys_of(AgentKind::Student);
        let projects = ws.model.keys_of(AgentKind::Project);
        let lecturers = ws.model.keys_of(AgentKind::Lecturer);
        self.queue.extend(students.iter().copied());

        loop {
            self.propose(ws);
            if !self.release_lecturers(ws, &projects) {
                break;
            }
        }

        let resolution = if students.iter().any(|&s| ws.matching.count(s) > 1) {
            Resolution::Infeasible("a student holds two projects")
        } else if projects
            .iter()
            .chain(&lecturers)
            .any(|&e| ws.load_occupancy(e) == Occupancy::Over)
        {
            Resolution::Infeasible("a project or lecturer is over-subscribed")
        } else {
            Resolution::Feasible
        };

        self.stats.deletions = ws.deletions() - deletions_before;
        debug!(
            proposals = self.stats.proposals,
            deletions = self.stats.deletions,
            ?resolution,
            "super-stable allocation finished"
        );
        resolution
    }

    fn propose(&mut self, ws: &mut Workspace) {
        while let Some(s) = self.queue.pop_front() {
            if !ws.matching.is_free(s) {
                continue;
            }
            let Some(head) = ws.model.list(s).head().map(<[AgentKey]>::to_vec) else {
                continue;
            };
            for p in head {
                if !ws.model.contains(s, p) {
                    continue;
                }
                let Some(l) = ws.model.owner(p) else {
                    continue;
                };
                self.stats.proposals += 1;
                ws.assign(s, p);

                // project and lecturer are checked independently: a student
                // holding several of l's projects keeps l over quota after
                // p sheds its tail
                if ws.occupancy(p) == Occupancy::Over {
                    let tail = ws.model.tail(p).map(<[AgentKey]>::to_vec).unwrap_or_default();
                    for x in tail {
                        self.reject_from_project(ws, x, p);
                    }
                }
                if ws.load_occupancy(l) == Occupancy::Over {
                    let tail = ws.model.tail(l).map(<[AgentKey]>::to_vec).unwrap_or_default();
                    for x in tail {
                        self.reject_from_lecturer(ws, x, l);
                    }
                }
                if ws.occupancy(p) == Occupancy::Full {
                    self.been_full.insert(p);
                    if let Some(rank) = ws.matching.worst_rank(p) {
                        for x in ws.model.list(p).successors(rank) {
                            self.reject_from_project(ws, x, p);
                        }
                    }
                }
                if ws.load_occupancy(l) == Occupancy::Full {
                    if let Some(rank) = ws.matching.worst_rank(l) {
                        for x in ws.model.list(l).successors(rank) {
                            self.reject_from_lecturer(ws, x, l);
                        }
                    }
                }
            }
            requeue(ws, &mut self.queue, s);
        }
    }

    /// Drop lecturer tails behind projects that lost students after filling.
    /// Returns whether anything was deleted.
    fn release_lecturers(&mut self, ws: &mut Workspace, projects: &[AgentKey]) -> bool {
        let mut changed = false;
        for &p in projects {
            if !self.been_full.contains(&p) || ws.occupancy(p) != Occupancy::Under {
                continue;
            }
            let (Some(&rejected), Some(l)) = (self.best_rejected.get(&p), ws.model.owner(p)) else {
                continue;
            };
            let Some(tail_rank) = ws.model.list(l).tail_rank() else {
                continue;
            };
            if tail_rank < rejected {
                continue;
            }
            let tail = ws.model.list(l).tie(tail_rank).to_vec();
            trace!(
                project = %ws.model.name(p),
                lecturer = %ws.model.name(l),
                dropped = tail.len(),
                "lecturer tail released"
            );
            for x in tail {
                self.reject_from_lecturer(ws, x, l);
                changed = true;
            }
        }
        changed
    }

    fn reject_from_project(&mut self, ws: &mut Workspace, s: AgentKey, p: AgentKey) {
        if let Some(rank) = ws.model.rank(p, s) {
            self.best_rejected
                .entry(p)
                .and_modify(|best| *best = (*best).min(rank))
                .or_insert(rank);
        }
        ws.reject(s, p);
        requeue(ws, &mut self.queue, s);
    }

    fn reject_from_lecturer(&mut self, ws: &mut Workspace, s: AgentKey, l: AgentKey) {
        let offered: Vec<AgentKey> = ws
            .model
            .offers(l)
            .iter()
            .copied()
            .filter(|&p| ws.model.contains(s, p))
            .collect();
        for p in offered {
            ws.reject(s, p);
        }
        requeue(ws, &mut self.queue, s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{InstanceBuilder, Prefs};

    fn solve(builder: InstanceBuilder) -> (Workspace, Resolution) {
        let mut ws = Workspace::new(builder.build().unwrap().model);
        let resolution = SuperAllocation::new().run(&mut ws);
        (ws, resolution)
    }

    fn partner(ws: &Workspace, name: &str) -> Option<String> {
        let key = ws.model.key(name).unwrap();
        ws.matching.partner(key).map(|p| ws.model.name(p).to_string())
    }

    #[test]
    fn test_strict_lists_behave_like_student_optimal() {
        let (ws, resolution) = solve(
            InstanceBuilder::new()
                .student("s1", Prefs::strict(["p1", "p2"]))
                .student("s2", Prefs::strict(["p2", "p1"]))
                .project("p1", 1, "l1")
                .project("p2", 1, "l2")
                .lecturer("l1", 1, Prefs::strict(["s2", "s1"]))
                .lecturer("l2", 1, Prefs::strict(["s1", "s2"])),
        );
        assert_eq!(resolution, Resolution::Feasible);
        assert_eq!(partner(&ws, "s1").as_deref(), Some("p1"));
        assert_eq!(partner(&ws, "s2").as_deref(), Some("p2"));
    }

    #[test]
    fn test_lecturer_ranking_settles_student_tie() {
        let (ws, resolution) = solve(
            InstanceBuilder::new()
                .student("s1", Prefs::ties([vec!["p1", "p2"]]))
                .student("s2", Prefs::strict(["p1"]))
                .project("p1", 1, "l1")
                .project("p2", 1, "l2")
                .lecturer("l1", 1, Prefs::strict(["s2", "s1"]))
                .lecturer("l2", 1, Prefs::strict(["s1"])),
        );
        assert_eq!(resolution, Resolution::Feasible);
        assert_eq!(partner(&ws, "s1").as_deref(), Some("p2"));
        assert_eq!(partner(&ws, "s2").as_deref(), Some("p1"));
    }

    #[test]
    fn test_tied_students_are_both_dropped() {
        let (ws, resolution) = solve(
            InstanceBuilder::new()
                .student("s1", Prefs::strict(["p1"]))
                .student("s2", Prefs::strict(["p1"]))
                .project("p1", 1, "l1")
                .lecturer("l1", 2, Prefs::ties([vec!["s1", "s2"]])),
        );
        // the empty candidate is left for the stability check to reject
        assert_eq!(resolution, Resolution::Feasible);
        assert_eq!(partner(&ws, "s1"), None);
        assert_eq!(partner(&ws, "s2"), None);
        assert!(ws.model.list(ws.model.key("p1").unwrap()).is_empty());
        assert!(ws.model.is_symmetric());
    }

    #[test]
    fn test_lecturer_load_counts_each_held_project() {
        // s5 ties two of l1's projects; l1 counts both until s3 drops out
        let (ws, resolution) = solve(
            InstanceBuilder::new()
                .student("s1", Prefs::strict(["p1"]))
                .student("s2", Prefs::strict(["p2", "p1"]))
                .student("s3", Prefs::strict(["p3", "p1", "p2"]))
                .student("s4", Prefs::strict(["p2", "p3"]))
                .student("s5", Prefs::ties([vec!["p1", "p3"], vec!["p2"]]))
                .project("p1", 2, "l1")
                .project("p2", 2, "l2")
                .project("p3", 2, "l1")
                .lecturer("l1", 3, Prefs::strict(["s4", "s1", "s2", "s5", "s3"]))
                .lecturer("l2", 2, Prefs::strict(["s3", "s5", "s4", "s2"])),
        );
        assert_eq!(resolution, Resolution::Feasible);
        assert_eq!(partner(&ws, "s1").as_deref(), Some("p1"));
        assert_eq!(partner(&ws, "s2").as_deref(), Some("p1"));
        assert_eq!(partner(&ws, "s3").as_deref(), Some("p2"));
        assert_eq!(partner(&ws, "s4").as_deref(), Some("p2"));
        assert_eq!(partner(&ws, "s5").as_deref(), Some("p3"));
        let l1 = ws.model.key("l1").unwrap();
        assert_eq!(ws.load(l1), 3);
    }

    #[test]
    fn test_over_subscribed_lecturer_sheds_tail() {
        let (ws, resolution) = solve(
            InstanceBuilder::new()
                .student("s1", Prefs::strict(["p1"]))
                .student("s2", Prefs::strict(["p2"]))
                .student("s3", Prefs::strict(["p2"]))
                .project("p1", 1, "l1")
                .project("p2", 2, "l1")
                .lecturer("l1", 2, Prefs::strict(["s1", "s2", "s3"])),
        );
        assert_eq!(resolution, Resolution::Feasible);
        assert_eq!(partner(&ws, "s1").as_deref(), Some("p1"));
        assert_eq!(partner(&ws, "s2").as_deref(), Some("p2"));
        assert_eq!(partner(&ws, "s3"), None);
    }
}
