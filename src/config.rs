//! Solver configuration.
//!
//! ```
//! use stablematch::config::{OptimalSide, SolverConfig, StabilityKind};
//!
//! let config = SolverConfig::from_json(r#"{"stability": "super", "optimal_side": "hospitals"}"#).unwrap();
//! assert_eq!(config.stability, StabilityKind::Super);
//! assert_eq!(config.optimal_side, OptimalSide::Receivers);
//! assert!(config.verify);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Stability definition a matching must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityKind {
    /// Classical (weak) stability: both sides must strictly gain to block.
    #[default]
    #[serde(alias = "weak")]
    Strict,
    /// Indifference on both sides is enough to block.
    Super,
    /// Blocks when one side strictly gains and the other is no worse off.
    Strong,
}

impl StabilityKind {
    pub fn label(self) -> &'static str {
        match self {
            StabilityKind::Strict => "strict",
            StabilityKind::Super => "super",
            StabilityKind::Strong => "strong",
        }
    }
}

impl fmt::Display for StabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StabilityKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "weak" => Ok(StabilityKind::Strict),
            "super" => Ok(StabilityKind::Super),
            "strong" => Ok(StabilityKind::Strong),
            _ => Err(ConfigError::InvalidStability(s.to_string())),
        }
    }
}

/// Which side the matching is optimal for.
///
/// `Proposers` is the single-capacity side (men, residents, students);
/// `Receivers` is the other one (women, hospitals, lecturers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimalSide {
    #[default]
    #[serde(alias = "proposer", alias = "men", alias = "residents", alias = "students")]
    Proposers,
    #[serde(alias = "receiver", alias = "women", alias = "hospitals", alias = "lecturers")]
    Receivers,
}

impl OptimalSide {
    pub fn label(self) -> &'static str {
        match self {
            OptimalSide::Proposers => "proposers",
            OptimalSide::Receivers => "receivers",
        }
    }
}

impl FromStr for OptimalSide {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proposers" | "proposer" | "men" | "residents" | "students" => {
                Ok(OptimalSide::Proposers)
            }
            "receivers" | "receiver" | "women" | "hospitals" | "lecturers" => {
                Ok(OptimalSide::Receivers)
            }
            _ => Err(ConfigError::InvalidSide(s.to_string())),
        }
    }
}

/// Everything a [`Solver`](crate::Solver) needs besides the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub stability: StabilityKind,
    pub optimal_side: OptimalSide,
    /// Re-check results of the strict procedures. Tie-layer results are
    /// always checked.
    pub verify: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            stability: StabilityKind::Strict,
            optimal_side: OptimalSide::Proposers,
            verify: true,
        }
    }
}

impl SolverConfig {
    pub fn new(stability: StabilityKind, optimal_side: OptimalSide) -> Self {
        Self {
            stability,
            optimal_side,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
