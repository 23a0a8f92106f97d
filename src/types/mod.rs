//! Core data types shared by every layer.
//!
//! ## Types
//!
//! - [`AgentKey`]: dense arena index of an agent
//! - [`AgentKind`]: the role an agent plays (man, hospital, lecturer, ...)
//! - [`ProblemKind`]: problem family inferred from the roles present
//! - [`Matching`]: the named, two-sided view of a result
//! - [`Outcome`]: stable / unstable with witness / no stable matching
//! - [`BlockingPair`]: verifier witness

mod agent;
mod matching;

pub use agent::{AgentKey, AgentKind, ProblemKind};
pub use matching::{BlockingPair, Matching, Outcome};
