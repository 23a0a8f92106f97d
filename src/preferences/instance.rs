//! Instance construction and structural validation.
//!
//! Readers for files or records live outside this crate and target
//! [`InstanceBuilder`]. Everything structurally wrong is rejected here;
//! the engines assume a valid model.
//!
//! ## Example
//!
//! ```
//! use stablematch::preferences::{InstanceBuilder, Prefs};
//! use stablematch::types::ProblemKind;
//!
//! let instance = InstanceBuilder::new()
//!     .student("s1", Prefs::ties([vec!["p1", "p2"]]))
//!     .project("p1", 1, "l1")
//!     .project("p2", 1, "l1")
//!     .lecturer("l1", 1, Prefs::strict(["s1"]))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(instance.problem, ProblemKind::ProjectAllocation);
//! assert!(instance.model.has_ties());
//! ```

use std::collections::HashSet;

use crate::error::InstanceError;
use crate::preferences::{PreferenceList, PreferenceModel};
use crate::types::{AgentKey, AgentKind, ProblemKind};

/// A preference list given by identifiers, ties in preference order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefs(Vec<Vec<String>>);

impl Prefs {
    /// Strict order, most preferred first.
    pub fn strict<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(order.into_iter().map(|name| vec![name.into()]).collect())
    }

    /// Ties in preference order.
    pub fn ties<I, T, S>(ties: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            ties.into_iter()
                .map(|tie| tie.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// A validated, cleaned instance.
#[derive(Debug, Clone)]
pub struct Instance {
    pub model: PreferenceModel,
    pub problem: ProblemKind,
}

#[derive(Debug, Clone)]
struct Declared {
    name: String,
    kind: AgentKind,
    capacity: usize,
    prefs: Prefs,
    lecturer: Option<String>,
}

/// Collects agent declarations and validates them in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
    declared: Vec<Declared>,
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn declare(
        mut self,
        name: &str,
        kind: AgentKind,
        capacity: usize,
        prefs: Prefs,
        lecturer: Option<&str>,
    ) -> Self {
        self.declared.push(Declared {
            name: name.to_string(),
            kind,
            capacity,
            prefs,
            lecturer: lecturer.map(str::to_string),
        });
        self
    }

    pub fn man(self, name: &str, prefs: Prefs) -> Self {
        self.declare(name, AgentKind::Man, 1, prefs, None)
    }

    pub fn woman(self, name: &str, prefs: Prefs) -> Self {
        self.declare(name, AgentKind::Woman, 1, prefs, None)
    }

    pub fn resident(self, name: &str, prefs: Prefs) -> Self {
        self.declare(name, AgentKind::Resident, 1, prefs, None)
    }

    pub fn hospital(self, name: &str, capacity: usize, prefs: Prefs) -> Self {
        self.declare(name, AgentKind::Hospital, capacity, prefs, None)
    }

    pub fn student(self, name: &str, prefs: Prefs) -> Self {
        self.declare(name, AgentKind::Student, 1, prefs, None)
    }

    /// A project; its list is derived from the lecturer's list.
    pub fn project(self, name: &str, capacity: usize, lecturer: &str) -> Self {
        self.declare(name, AgentKind::Project, capacity, Prefs::empty(), Some(lecturer))
    }

    pub fn lecturer(self, name: &str, capacity: usize, prefs: Prefs) -> Self {
        self.declare(name, AgentKind::Lecturer, capacity, prefs, None)
    }

    pub fn roommate(self, name: &str, prefs: Prefs) -> Self {
        self.declare(name, AgentKind::Roommate, 1, prefs, None)
    }

    /// Validate, resolve identifiers, derive project lists and clean.
    pub fn build(self) -> Result<Instance, InstanceError> {
        let first = self.declared.first().ok_or(InstanceError::Empty)?;
        let problem = first.kind.problem();
        if self.declared.iter().any(|d| d.kind.problem() != problem) {
            return Err(InstanceError::MixedProblem);
        }

        let mut model = PreferenceModel::with_capacity(self.declared.len());
        let mut keys = Vec::with_capacity(self.declared.len());
        for d in &self.declared {
            if d.capacity == 0 {
                return Err(InstanceError::InvalidCapacity {
                    agent: d.name.clone(),
                    capacity: d.capacity,
                });
            }
            keys.push(model.add_agent(&d.name, d.kind, d.capacity)?);
        }

        for (d, &key) in self.declared.iter().zip(&keys) {
            if let Some(lecturer) = &d.lecturer {
                match model.key(lecturer) {
                    Some(l) if model.kind(l) == AgentKind::Lecturer => model.link_project(key, l),
                    _ => {
                        return Err(InstanceError::UnknownLecturer {
                            project: d.name.clone(),
                            lecturer: lecturer.clone(),
                        })
                    }
                }
            }
        }

        for (d, &key) in self.declared.iter().zip(&keys) {
            let ties = resolve(&model, d)?;
            model.set_preferences(key, PreferenceList::new(ties));
        }

        for project in model.keys_of(AgentKind::Project) {
            let Some(lecturer) = model.owner(project) else {
                continue;
            };
            let projected: Vec<Vec<AgentKey>> = model
                .list(lecturer)
                .ties()
                .iter()
                .map(|tie| {
                    tie.iter()
                        .copied()
                        .filter(|&s| model.contains(s, project))
                        .collect()
                })
                .collect();
            model.set_preferences(project, PreferenceList::new(projected));
        }

        model.clean();
        Ok(Instance { model, problem })
    }
}

/// Turn one declared list into slab keys, checking every entry.
fn resolve(model: &PreferenceModel, d: &Declared) -> Result<Vec<Vec<AgentKey>>, InstanceError> {
    let mut seen = HashSet::new();
    let mut ties = Vec::with_capacity(d.prefs.0.len());
    for (position, tie) in d.prefs.0.iter().enumerate() {
        if tie.is_empty() {
            return Err(InstanceError::EmptyTie {
                agent: d.name.clone(),
                position,
            });
        }
        let mut resolved = Vec::with_capacity(tie.len());
        for entry in tie {
            let key = model.key(entry).ok_or_else(|| InstanceError::UnknownAgent {
                agent: d.name.clone(),
                reference: entry.clone(),
            })?;
            if !d.kind.may_rank(model.kind(key)) || entry == &d.name {
                return Err(InstanceError::WrongRole {
                    agent: d.name.clone(),
                    entry: entry.clone(),
                });
            }
            if !seen.insert(key) {
                return Err(InstanceError::RepeatedEntry {
                    agent: d.name.clone(),
                    entry: entry.clone(),
                });
            }
            resolved.push(key);
        }
        ties.push(resolved);
    }
    Ok(ties)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_instance() {
        assert_eq!(InstanceBuilder::new().build().unwrap_err(), InstanceError::Empty);
    }

    #[test]
    fn test_unknown_reference() {
        let err = InstanceBuilder::new()
            .resident("r1", Prefs::strict(["h9"]))
            .hospital("h1", 1, Prefs::strict(["r1"]))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            InstanceError::UnknownAgent {
                agent: "r1".into(),
                reference: "h9".into()
            }
        );
    }

    #[test]
    fn test_repeated_entry_across_ties() {
        let err = InstanceBuilder::new()
            .man("m1", Prefs::ties([vec!["w1"], vec!["w1"]]))
            .woman("w1", Prefs::strict(["m1"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, InstanceError::RepeatedEntry { .. }));
    }

    #[test]
    fn test_wrong_role_and_mixed_problem() {
        let err = InstanceBuilder::new()
            .man("m1", Prefs::strict(["m2"]))
            .man("m2", Prefs::empty())
            .build()
            .unwrap_err();
        assert!(matches!(err, InstanceError::WrongRole { .. }));

        let err = InstanceBuilder::new()
            .man("m1", Prefs::empty())
            .resident("r1", Prefs::empty())
            .build()
            .unwrap_err();
        assert_eq!(err, InstanceError::MixedProblem);
    }

    #[test]
    fn test_roommate_cannot_rank_self() {
        let err = InstanceBuilder::new()
            .roommate("a", Prefs::strict(["a"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, InstanceError::WrongRole { .. }));
    }

    #[test]
    fn test_zero_capacity_and_empty_tie() {
        let err = InstanceBuilder::new()
            .hospital("h1", 0, Prefs::empty())
            .build()
            .unwrap_err();
        assert!(matches!(err, InstanceError::InvalidCapacity { .. }));

        let err = InstanceBuilder::new()
            .woman("w1", Prefs::ties(Vec::<Vec<&str>>::from([vec![]])))
            .build()
            .unwrap_err();
        assert!(matches!(err, InstanceError::EmptyTie { position: 0, .. }));
    }

    #[test]
    fn test_unknown_lecturer() {
        let err = InstanceBuilder::new()
            .student("s1", Prefs::strict(["p1"]))
            .project("p1", 1, "l9")
            .build()
            .unwrap_err();
        assert!(matches!(err, InstanceError::UnknownLecturer { .. }));
    }

    #[test]
    fn test_project_lists_follow_lecturer_ranks() {
        let instance = InstanceBuilder::new()
            .student("s1", Prefs::strict(["p1"]))
            .student("s2", Prefs::strict(["p1", "p2"]))
            .student("s3", Prefs::strict(["p2"]))
            .project("p1", 1, "l1")
            .project("p2", 1, "l1")
            .lecturer("l1", 2, Prefs::ties([vec!["s3"], vec!["s1", "s2"]]))
            .build()
            .unwrap();
        let model = &instance.model;
        let key = |n: &str| model.key(n).unwrap();

        let p1 = model.list(key("p1"));
        assert_eq!(p1.len(), 2);
        assert_eq!(p1.rank(key("s1")), Some(1));
        assert_eq!(p1.rank(key("s3")), None);
        assert_eq!(model.rank(key("p2"), key("s3")), Some(0));
        assert_eq!(model.rank(key("p2"), key("s2")), Some(1));
        assert!(model.is_symmetric());
    }

    #[test]
    fn test_lecturer_drops_students_without_offers() {
        let instance = InstanceBuilder::new()
            .student("s1", Prefs::strict(["p1"]))
            .student("s2", Prefs::empty())
            .project("p1", 1, "l1")
            .lecturer("l1", 1, Prefs::strict(["s2", "s1"]))
            .build()
            .unwrap();
        let model = &instance.model;
        let l1 = model.key("l1").unwrap();
        assert_eq!(model.list(l1).len(), 1);
        assert_eq!(model.rank(l1, model.key("s1").unwrap()), Some(1));
    }
}
