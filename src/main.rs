//! stablematch - demonstration binary
//!
//! Solves a handful of small instances and prints the outcomes.
//! Set `RUST_LOG=stablematch=debug` to see run summaries.

use stablematch::{
    Instance, InstanceBuilder, InstanceError, MatchingSolver, OptimalSide, Outcome, Prefs, Solver,
    SolverConfig, StabilityKind,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("===========================================");
    println!("  stablematch");
    println!("===========================================");
    println!();

    let scenarios: [(&str, Result<Instance, InstanceError>, SolverConfig); 4] = [
        (
            "Stable marriage, men-optimal",
            marriage(),
            SolverConfig::default(),
        ),
        (
            "Stable marriage, women-optimal",
            marriage(),
            SolverConfig::new(StabilityKind::Strict, OptimalSide::Receivers),
        ),
        (
            "Hospitals/residents, oversubscribed hospital",
            oversubscribed(),
            SolverConfig::default(),
        ),
        (
            "Marriage with a 3-cycle of full ties, super-stability",
            full_ties(),
            SolverConfig::new(StabilityKind::Super, OptimalSide::Proposers),
        ),
    ];

    for (title, instance, config) in scenarios {
        println!("{title}");
        let solver = match instance.map_err(|e| e.to_string()).and_then(|instance| {
            Solver::new(instance, config).map_err(|e| e.to_string())
        }) {
            Ok(solver) => solver,
            Err(e) => {
                println!("  ERROR: {e}");
                continue;
            }
        };
        report(&solver.solve());
        println!();
    }
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Stable(matching) => {
            for (agent, partner) in &matching.agent_sided {
                println!("  {agent} -> {}", partner.as_deref().unwrap_or("-"));
            }
            println!("  stable, digest {}", &matching.digest_hex()[..16]);
        }
        Outcome::Unstable { witness, .. } => {
            println!("  UNSTABLE: ({}, {}) blocks", witness.agent, witness.partner);
        }
        Outcome::NoStableMatching => println!("  no stable matching exists"),
    }
}

fn marriage() -> Result<Instance, InstanceError> {
    InstanceBuilder::new()
        .man("m1", Prefs::strict(["w2", "w1"]))
        .man("m2", Prefs::strict(["w1", "w2"]))
        .woman("w1", Prefs::strict(["m2", "m1"]))
        .woman("w2", Prefs::strict(["m1", "m2"]))
        .build()
}

fn oversubscribed() -> Result<Instance, InstanceError> {
    InstanceBuilder::new()
        .resident("r1", Prefs::strict(["h1"]))
        .resident("r2", Prefs::strict(["h1"]))
        .hospital("h1", 1, Prefs::strict(["r1", "r2"]))
        .build()
}

fn full_ties() -> Result<Instance, InstanceError> {
    let men = || Prefs::ties([vec!["m1", "m2", "m3"]]);
    let women = || Prefs::ties([vec!["w1", "w2", "w3"]]);
    InstanceBuilder::new()
        .man("m1", women())
        .man("m2", women())
        .man("m3", women())
        .woman("w1", men())
        .woman("w2", men())
        .woman("w3", men())
        .build()
}
