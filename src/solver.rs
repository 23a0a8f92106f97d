//! Solver facade: picks a procedure once, runs it on a private copy of the
//! instance and certifies the result.
//!
//! ## Routing
//!
//! | problem | stability | proposers-optimal | receivers-optimal |
//! |---------|-----------|-------------------|-------------------|
//! | marriage | strict | men propose | women propose |
//! | marriage | super / strong | tie layer, men | tie layer, women |
//! | hospitals/residents | strict | residents propose | hospitals propose |
//! | hospitals/residents | super | tie layer, residents | tie layer, hospitals |
//! | hospitals/residents | strong | tie layer, residents | unsupported |
//! | allocation | strict | students propose | lecturers offer |
//! | allocation | super | tie layer, students | unsupported |
//! | allocation | strong | unsupported | unsupported |
//! | roommates | strict, no ties | Irving | Irving |

use tracing::{debug, warn};

use crate::config::{OptimalSide, SolverConfig, StabilityKind};
use crate::engine::{
    LecturerOptimal, MatchingEngine, OneToMany, Resolution, Roommates, RunStats, TwoLevel,
    Workspace,
};
use crate::error::{ConfigError, MatchError};
use crate::preferences::Instance;
use crate::ties::{StrongStable, SuperAllocation, SuperStable};
use crate::types::{AgentKind, Matching, Outcome, ProblemKind};
use crate::verify::{Verdict, Verifier};

/// Anything that turns an instance into an [`Outcome`].
///
/// External solvers plug in here to be cross-checked against [`Solver`].
pub trait MatchingSolver {
    fn solve(&self) -> Outcome;
}

/// Procedure selected for an instance and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Proposal(AgentKind),
    TwoLevel,
    LecturerOptimal,
    Roommates,
    Super(AgentKind),
    Strong(AgentKind),
    SuperAllocation,
}

impl Plan {
    fn uses_ties(self) -> bool {
        matches!(self, Plan::Super(_) | Plan::Strong(_) | Plan::SuperAllocation)
    }
}

/// Configured solver for one instance.
///
/// # Example
///
/// ```
/// use stablematch::{InstanceBuilder, MatchingSolver, Prefs, Solver, SolverConfig};
///
/// let instance = InstanceBuilder::new()
///     .man("m1", Prefs::strict(["w2", "w1"]))
///     .man("m2", Prefs::strict(["w1", "w2"]))
///     .woman("w1", Prefs::strict(["m2", "m1"]))
///     .woman("w2", Prefs::strict(["m1", "m2"]))
///     .build()
///     .unwrap();
///
/// let solver = Solver::new(instance, SolverConfig::default()).unwrap();
/// let outcome = solver.solve();
/// assert!(outcome.is_stable());
/// assert_eq!(outcome.matching().unwrap().partner("m1"), Some("w2"));
/// ```
#[derive(Debug, Clone)]
pub struct Solver {
    instance: Instance,
    config: SolverConfig,
    plan: Plan,
}

impl Solver {
    /// Validate the configuration against the instance.
    pub fn new(instance: Instance, config: SolverConfig) -> Result<Self, ConfigError> {
        let plan = plan(&instance, config)?;
        debug!(
            problem = instance.problem.label(),
            stability = %config.stability,
            side = config.optimal_side.label(),
            ?plan,
            "solver configured"
        );
        Ok(Self {
            instance,
            config,
            plan,
        })
    }

    #[inline]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the selected procedure and report its counters alongside.
    pub fn solve_with_stats(&self) -> (Outcome, RunStats) {
        let original = &self.instance.model;
        let problem = self.instance.problem;
        let mut ws = Workspace::new(original.snapshot());

        let (resolution, stats) = match self.plan {
            Plan::Proposal(proposer) => {
                let stats = MatchingEngine::new(OneToMany::new(proposer)).run(&mut ws);
                (Resolution::Feasible, stats)
            }
            Plan::TwoLevel => {
                let stats = MatchingEngine::new(TwoLevel).run(&mut ws);
                (Resolution::Feasible, stats)
            }
            Plan::LecturerOptimal => {
                let stats = LecturerOptimal::new().run(&mut ws);
                (Resolution::Feasible, stats)
            }
            Plan::Roommates => {
                let mut procedure = Roommates::new();
                let resolution = procedure.run(&mut ws);
                (resolution, procedure.stats())
            }
            Plan::Super(proposer) => {
                let mut procedure = SuperStable::new(proposer);
                let resolution = procedure.run(&mut ws);
                (resolution, procedure.stats())
            }
            Plan::Strong(proposer) => {
                let mut procedure = StrongStable::new(proposer);
                let resolution = procedure.run(&mut ws);
                (resolution, procedure.stats())
            }
            Plan::SuperAllocation => {
                let mut procedure = SuperAllocation::new();
                let resolution = procedure.run(&mut ws);
                (resolution, procedure.stats())
            }
        };

        if let Resolution::Infeasible(reason) = resolution {
            debug!(reason, "no stable matching");
            return (Outcome::NoStableMatching, stats);
        }

        let matching = Matching::collect(original, &ws.matching, problem);
        if !self.config.verify && !self.plan.uses_ties() {
            return (Outcome::Stable(matching), stats);
        }

        let verifier = Verifier::new(original, problem, self.config.stability);
        let outcome = match verifier.check(&ws.matching) {
            Verdict::Stable => Outcome::Stable(matching),
            Verdict::Blocked(witness) if self.plan.uses_ties() => {
                debug!(
                    agent = %witness.agent,
                    partner = %witness.partner,
                    "candidate rejected by stability check"
                );
                Outcome::NoStableMatching
            }
            Verdict::Blocked(witness) => {
                warn!(
                    agent = %witness.agent,
                    partner = %witness.partner,
                    problem = problem.label(),
                    "strict procedure produced a blocked matching"
                );
                Outcome::Unstable { matching, witness }
            }
        };
        (outcome, stats)
    }

    /// Check a matching produced elsewhere against this instance.
    pub fn verify(&self, matching: &Matching) -> Result<Verdict, MatchError> {
        Verifier::new(&self.instance.model, self.instance.problem, self.config.stability)
            .check_named(matching)
    }
}

impl MatchingSolver for Solver {
    fn solve(&self) -> Outcome {
        self.solve_with_stats().0
    }
}

fn plan(instance: &Instance, config: SolverConfig) -> Result<Plan, ConfigError> {
    let problem = instance.problem;
    let stability = config.stability;
    let side = config.optimal_side;
    let unsupported = || ConfigError::Unsupported {
        problem: problem.label(),
        stability: stability.label(),
        side: side.label(),
    };

    let (single, other) = problem.sides();
    let proposer = match (problem, side) {
        (ProblemKind::ProjectAllocation, OptimalSide::Receivers) => AgentKind::Lecturer,
        (_, OptimalSide::Proposers) => single,
        (_, OptimalSide::Receivers) => other,
    };

    let plan = match (problem, stability) {
        (ProblemKind::Roommates, _) if instance.model.has_ties() => {
            return Err(ConfigError::RoommatesWithTies)
        }
        (ProblemKind::Roommates, StabilityKind::Strict) => Plan::Roommates,
        (ProblemKind::Roommates, _) => return Err(unsupported()),

        (ProblemKind::ProjectAllocation, StabilityKind::Strict) => match side {
            OptimalSide::Proposers => Plan::TwoLevel,
            OptimalSide::Receivers => Plan::LecturerOptimal,
        },
        (ProblemKind::ProjectAllocation, StabilityKind::Super) => match side {
            OptimalSide::Proposers => Plan::SuperAllocation,
            OptimalSide::Receivers => return Err(unsupported()),
        },
        (ProblemKind::ProjectAllocation, StabilityKind::Strong) => return Err(unsupported()),

        (_, StabilityKind::Strict) => Plan::Proposal(proposer),
        (_, StabilityKind::Super) => Plan::Super(proposer),
        (_, StabilityKind::Strong) if proposer.is_single() => Plan::Strong(proposer),
        (_, StabilityKind::Strong) => return Err(unsupported()),
    };
    Ok(plan)
}
