//! # stablematch
//!
//! Stable matching under ranked preferences with ties and capacities.
//!
//! ## Architecture
//!
//! - **Preferences**: slab-backed preference model with symmetric pair deletion
//! - **Engine**: generic proposal / rejection fixed point over role
//!   configurations, plus lecturer-optimal allocation and stable roommates
//! - **Ties**: super-stable and strongly stable procedures with bipartite
//!   maximum matching and critical sets
//! - **Verify**: blocking-pair search against the original lists
//! - **Solver**: routes a configuration to a procedure and certifies the result
//!
//! ## Problem families
//!
//! | Family | Roles | Capacities |
//! |--------|-------|------------|
//! | Stable marriage (SM, SMT) | men, women | 1 / 1 |
//! | Hospitals/residents (HR, HRT) | residents, hospitals | 1 / q |
//! | Student/project allocation (SPA, SPA-ST) | students, projects, lecturers | 1 / q / q |
//! | Stable roommates (SR) | roommates | 1 |
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical instances and configurations give identical
//!    matchings and digests
//! 2. **Original lists are never mutated**: every run works on a snapshot and
//!    stability is judged against the original
//! 3. **Infeasibility is an outcome**: no super-stable or strongly stable
//!    matching is reported as [`Outcome::NoStableMatching`], never as an error
//! 4. **Synchronous execution**: no I/O, no suspension, no shared mutation

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for instance construction, configuration and model access
pub mod error;

/// Agent roles, matchings and outcomes
pub mod types;

/// Preference lists, the preference model and instance construction
pub mod preferences;

/// Proposal engine and strict-preference procedures
pub mod engine;

/// Procedures for lists with ties
pub mod ties;

/// Stability verifier
pub mod verify;

/// Solver configuration
pub mod config;

/// Solver facade
pub mod solver;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::{OptimalSide, SolverConfig, StabilityKind};
pub use error::{ConfigError, InstanceError, MatchError};
pub use preferences::{Instance, InstanceBuilder, PreferenceModel, Prefs};
pub use solver::{MatchingSolver, Solver};
pub use types::{AgentKind, BlockingPair, Matching, Outcome, ProblemKind};
pub use verify::{Verdict, Verifier};
