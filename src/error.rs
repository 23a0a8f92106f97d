//! Error types.
//!
//! Three families, matching the points where something can actually be wrong:
//!
//! - [`InstanceError`]: the instance handed to [`InstanceBuilder`](crate::InstanceBuilder)
//!   is structurally malformed. Fatal, the whole instance is rejected.
//! - [`ConfigError`]: the solver configuration cannot be honoured for the instance.
//!   Fatal at [`Solver`](crate::Solver) construction.
//! - [`MatchError`]: a model lookup failed (unknown agent, exhausted list).
//!
//! Running out of partners and the absence of a stable matching are ordinary
//! outcomes and never surface as errors.

use thiserror::Error;

/// Structural problems found while building an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("instance contains no agents")]
    Empty,

    #[error("duplicate agent identifier `{0}`")]
    DuplicateAgent(String),

    #[error("agent `{agent}` references unknown agent `{reference}`")]
    UnknownAgent { agent: String, reference: String },

    #[error("agent `{agent}` lists `{entry}` more than once")]
    RepeatedEntry { agent: String, entry: String },

    #[error("agent `{agent}` has an empty tie at position {position}")]
    EmptyTie { agent: String, position: usize },

    #[error("agent `{agent}` has invalid capacity {capacity}")]
    InvalidCapacity { agent: String, capacity: usize },

    #[error("agent `{agent}` cannot rank `{entry}`: wrong role")]
    WrongRole { agent: String, entry: String },

    #[error("project `{project}` is offered by unknown lecturer `{lecturer}`")]
    UnknownLecturer { project: String, lecturer: String },

    #[error("instance mixes agents of different problem families")]
    MixedProblem,
}

/// Solver configuration problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid stability kind `{0}` (expected strict, super or strong)")]
    InvalidStability(String),

    #[error("invalid optimal side `{0}`")]
    InvalidSide(String),

    #[error("{stability} stability optimal for {side} is not supported for {problem}")]
    Unsupported {
        problem: &'static str,
        stability: &'static str,
        side: &'static str,
    },

    #[error("stable roommates requires strict preference lists")]
    RoommatesWithTies,

    #[error("malformed configuration: {0}")]
    Parse(String),
}

/// Errors raised by preference model access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("preference list of `{0}` is exhausted")]
    EmptyPreferenceList(String),

    #[error("unknown agent `{0}`")]
    UnknownAgent(String),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = InstanceError::RepeatedEntry {
            agent: "r1".into(),
            entry: "h2".into(),
        };
        assert_eq!(err.to_string(), "agent `r1` lists `h2` more than once");

        let err: MatchError = ConfigError::InvalidStability("weakish".into()).into();
        assert!(err.to_string().contains("weakish"));
    }
}
