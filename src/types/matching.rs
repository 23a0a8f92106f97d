//! Solver output: the frozen matching and its stability tag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::Provisional;
use crate::preferences::PreferenceModel;
use crate::types::{AgentKind, ProblemKind};

/// A pair that blocks a matching, named by agent identifiers.
///
/// `agent` is on the single-capacity side (man, resident, student, roommate).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockingPair {
    pub agent: String,
    pub partner: String,
}

impl BlockingPair {
    pub fn new(agent: impl Into<String>, partner: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            partner: partner.into(),
        }
    }
}

/// A matching projected onto agent identifiers.
///
/// The same assignment is exposed from both sides:
///
/// - `agent_sided`: every single-capacity agent mapped to its partner, `None`
///   when unassigned
/// - `entity_sided`: every receiving agent (woman, hospital, project) mapped to
///   the agents it holds; empty for roommates
/// - `lecturer_sided`: for project allocation, every lecturer mapped to the
///   students assigned to any of their projects
///
/// All maps are ordered, so two equal matchings serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matching {
    pub agent_sided: BTreeMap<String, Option<String>>,
    pub entity_sided: BTreeMap<String, Vec<String>>,
    pub lecturer_sided: BTreeMap<String, Vec<String>>,
}

impl Matching {
    /// Freeze a provisional matching into its named views.
    pub fn collect(model: &PreferenceModel, matching: &Provisional, problem: ProblemKind) -> Self {
        let (single, entity) = problem.sides();
        let mut out = Matching::default();

        for key in model.keys_of(single) {
            let partner = matching.partner(key).map(|p| model.name(p).to_string());
            out.agent_sided.insert(model.name(key).to_string(), partner);
        }

        if problem != ProblemKind::Roommates {
            for key in model.keys_of(entity) {
                out.entity_sided
                    .insert(model.name(key).to_string(), names(model, matching, key));
            }
        }

        if problem == ProblemKind::ProjectAllocation {
            for key in model.keys_of(AgentKind::Lecturer) {
                out.lecturer_sided
                    .insert(model.name(key).to_string(), names(model, matching, key));
            }
        }

        out
    }

    /// Partner of a single-capacity agent, `None` if unassigned or unknown.
    pub fn partner(&self, agent: &str) -> Option<&str> {
        self.agent_sided.get(agent).and_then(|p| p.as_deref())
    }

    /// Agents held by a receiving agent or lecturer.
    pub fn assigned_to(&self, entity: &str) -> &[String] {
        self.entity_sided
            .get(entity)
            .or_else(|| self.lecturer_sided.get(entity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of matched single-capacity agents.
    pub fn size(&self) -> usize {
        self.agent_sided.values().filter(|p| p.is_some()).count()
    }

    /// SHA-256 over every view in canonical order.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for (agent, partner) in &self.agent_sided {
            hasher.update(agent.as_bytes());
            hasher.update([0x1f]);
            hasher.update(partner.as_deref().unwrap_or("").as_bytes());
            hasher.update([0x1e]);
        }
        for view in [&self.entity_sided, &self.lecturer_sided] {
            hasher.update([0x1d]);
            for (entity, held) in view {
                hasher.update(entity.as_bytes());
                for name in held {
                    hasher.update([0x1f]);
                    hasher.update(name.as_bytes());
                }
                hasher.update([0x1e]);
            }
        }
        hasher.finalize().into()
    }

    /// Hex-encoded [`digest`](Self::digest).
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

fn names(model: &PreferenceModel, matching: &Provisional, key: usize) -> Vec<String> {
    matching
        .assigned(key)
        .map(|k| model.name(k).to_string())
        .collect()
}

/// Result of a solver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The matching passed the verifier.
    Stable(Matching),
    /// The matching failed the verifier; `witness` is the first blocking pair.
    Unstable {
        matching: Matching,
        witness: BlockingPair,
    },
    /// No matching of the requested stability kind exists for this orientation.
    NoStableMatching,
}

impl Outcome {
    #[inline]
    pub fn is_stable(&self) -> bool {
        matches!(self, Outcome::Stable(_))
    }

    pub fn matching(&self) -> Option<&Matching> {
        match self {
            Outcome::Stable(m) | Outcome::Unstable { matching: m, .. } => Some(m),
            Outcome::NoStableMatching => None,
        }
    }

    pub fn into_matching(self) -> Option<Matching> {
        match self {
            Outcome::Stable(m) | Outcome::Unstable { matching: m, .. } => Some(m),
            Outcome::NoStableMatching => None,
        }
    }
}
