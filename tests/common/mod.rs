//! Seeded instance generators and a brute-force oracle shared by the
//! integration tests.
//!
//! The oracle enumerates every capacity-respecting matching and judges
//! stability with its own blocking-pair rules, read straight off the
//! original preference lists.

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use stablematch::types::AgentKey;
use stablematch::{
    AgentKind, Instance, InstanceBuilder, Matching, PreferenceModel, Prefs, ProblemKind,
    StabilityKind,
};

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

fn names(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{prefix}{i}")).collect()
}

/// Shuffle `names` and group neighbours into ties with probability `p_tie`.
fn ranked(rng: &mut ChaCha8Rng, mut names: Vec<String>, p_tie: f64) -> Prefs {
    names.shuffle(rng);
    let mut ties: Vec<Vec<String>> = Vec::new();
    for name in names {
        match ties.last_mut() {
            Some(tie) if rng.gen_bool(p_tie) => tie.push(name),
            _ => ties.push(vec![name]),
        }
    }
    Prefs::ties(ties)
}

fn accepted(rng: &mut ChaCha8Rng, pool: &[String], p_accept: f64) -> Vec<String> {
    pool.iter()
        .filter(|_| rng.gen_bool(p_accept))
        .cloned()
        .collect()
}

pub fn marriage(rng: &mut ChaCha8Rng, n: usize, p_tie: f64) -> Instance {
    let (men, women) = (names("m", n), names("w", n));
    let mut builder = InstanceBuilder::new();
    for m in &men {
        let list = accepted(rng, &women, 0.8);
        builder = builder.man(m, ranked(rng, list, p_tie));
    }
    for w in &women {
        let list = accepted(rng, &men, 0.8);
        builder = builder.woman(w, ranked(rng, list, p_tie));
    }
    builder.build().unwrap()
}

pub fn hospitals(rng: &mut ChaCha8Rng, residents: usize, hospitals: usize, p_tie: f64) -> Instance {
    let (rs, hs) = (names("r", residents), names("h", hospitals));
    let mut builder = InstanceBuilder::new();
    for r in &rs {
        let list = accepted(rng, &hs, 0.7);
        builder = builder.resident(r, ranked(rng, list, p_tie));
    }
    for h in &hs {
        let capacity = rng.gen_range(1..=3);
        let list = accepted(rng, &rs, 0.8);
        builder = builder.hospital(h, capacity, ranked(rng, list, p_tie));
    }
    builder.build().unwrap()
}

pub fn allocation(
    rng: &mut ChaCha8Rng,
    students: usize,
    projects: usize,
    lecturers: usize,
    p_tie: f64,
) -> Instance {
    let (ss, ps, ls) = (
        names("s", students),
        names("p", projects),
        names("l", lecturers),
    );
    let mut builder = InstanceBuilder::new();
    for s in &ss {
        let list = accepted(rng, &ps, 0.6);
        builder = builder.student(s, ranked(rng, list, p_tie));
    }
    for (i, p) in ps.iter().enumerate() {
        let capacity = rng.gen_range(1..=2);
        builder = builder.project(p, capacity, &ls[i % ls.len()]);
    }
    for l in &ls {
        let capacity = rng.gen_range(1..=3);
        builder = builder.lecturer(l, capacity, ranked(rng, ss.clone(), p_tie));
    }
    builder.build().unwrap()
}

pub fn roommates(rng: &mut ChaCha8Rng, n: usize) -> Instance {
    let all = names("a", n);
    let mut builder = InstanceBuilder::new();
    for a in &all {
        let others: Vec<String> = all.iter().filter(|b| *b != a).cloned().collect();
        let list = accepted(rng, &others, 0.8);
        builder = builder.roommate(a, ranked(rng, list, 0.0));
    }
    builder.build().unwrap()
}

/// Every matching of the instance respecting capacities, as agent-sided views.
pub fn all_matchings(instance: &Instance) -> Vec<Matching> {
    let model = &instance.model;
    if instance.problem == ProblemKind::Roommates {
        let agents = model.keys_of(AgentKind::Roommate);
        let mut out = Vec::new();
        pair_up(model, &agents, &mut HashMap::new(), &mut out);
        return out;
    }

    let (single, _) = instance.problem.sides();
    let agents = model.keys_of(single);
    let mut out = Vec::new();
    assign_each(model, &agents, 0, &mut HashMap::new(), &mut Vec::new(), &mut out);
    out
}

fn assign_each(
    model: &PreferenceModel,
    agents: &[AgentKey],
    idx: usize,
    load: &mut HashMap<AgentKey, usize>,
    chosen: &mut Vec<Option<AgentKey>>,
    out: &mut Vec<Matching>,
) {
    if idx == agents.len() {
        let mut m = Matching::default();
        for (&a, partner) in agents.iter().zip(chosen.iter()) {
            m.agent_sided.insert(
                model.name(a).to_string(),
                partner.map(|p| model.name(p).to_string()),
            );
        }
        out.push(m);
        return;
    }

    chosen.push(None);
    assign_each(model, agents, idx + 1, load, chosen, out);
    chosen.pop();

    let a = agents[idx];
    for p in model.list(a).iter() {
        let mut touched = vec![p];
        touched.extend(model.owner(p));
        if touched
            .iter()
            .any(|&e| load.get(&e).copied().unwrap_or(0) >= model.capacity(e))
        {
            continue;
        }
        for &e in &touched {
            *load.entry(e).or_insert(0) += 1;
        }
        chosen.push(Some(p));
        assign_each(model, agents, idx + 1, load, chosen, out);
        chosen.pop();
        for &e in &touched {
            *load.entry(e).or_insert(0) -= 1;
        }
    }
}

fn pair_up(
    model: &PreferenceModel,
    agents: &[AgentKey],
    partner: &mut HashMap<AgentKey, Option<AgentKey>>,
    out: &mut Vec<Matching>,
) {
    let Some(&a) = agents.iter().find(|a| !partner.contains_key(a)) else {
        let mut m = Matching::default();
        for &a in agents {
            let p = partner.get(&a).copied().flatten();
            m.agent_sided
                .insert(model.name(a).to_string(), p.map(|p| model.name(p).to_string()));
        }
        out.push(m);
        return;
    };

    partner.insert(a, None);
    pair_up(model, agents, partner, out);
    partner.remove(&a);

    for b in model.list(a).iter() {
        if partner.contains_key(&b) {
            continue;
        }
        partner.insert(a, Some(b));
        partner.insert(b, Some(a));
        pair_up(model, agents, partner, out);
        partner.remove(&a);
        partner.remove(&b);
    }
}

/// Tie index of `agent`'s partner on its original list; unassigned ranks last.
pub fn rank(model: &PreferenceModel, agent: &str, partner: Option<&str>) -> usize {
    let (Some(a), Some(p)) = (model.key(agent), partner.and_then(|p| model.key(p))) else {
        return usize::MAX;
    };
    model.rank(a, p).unwrap_or(usize::MAX)
}

// ============================================================================
// BLOCKING-PAIR ORACLE
// ============================================================================

/// How much `x` gains by taking `y` on top of (or instead of) `held`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Gain {
    Worse,
    Equal,
    Better,
}

fn gain(model: &PreferenceModel, x: AgentKey, y: AgentKey, held: &[AgentKey]) -> Gain {
    if held.len() < model.capacity(x) {
        return Gain::Better;
    }
    let rank = model.rank(x, y).unwrap_or(usize::MAX);
    let worst = held.iter().filter_map(|&h| model.rank(x, h)).max().unwrap_or(usize::MAX);
    match rank.cmp(&worst) {
        Ordering::Less => Gain::Better,
        Ordering::Equal => Gain::Equal,
        Ordering::Greater => Gain::Worse,
    }
}

fn blocks(a: Gain, b: Gain, stability: StabilityKind) -> bool {
    match stability {
        StabilityKind::Strict => a == Gain::Better && b == Gain::Better,
        StabilityKind::Super => a >= Gain::Equal && b >= Gain::Equal,
        StabilityKind::Strong => {
            a >= Gain::Equal && b >= Gain::Equal && (a == Gain::Better || b == Gain::Better)
        }
    }
}

/// Whether `matching` admits no blocking pair of the given kind.
///
/// Strict stability is classical (weak) stability: both agents must gain
/// strictly.
pub fn is_stable(instance: &Instance, matching: &Matching, stability: StabilityKind) -> bool {
    let model = &instance.model;
    let key = |name: &str| model.key(name).unwrap();

    let mut held: HashMap<AgentKey, Vec<AgentKey>> = HashMap::new();
    for (agent, partner) in &matching.agent_sided {
        let Some(partner) = partner else { continue };
        let (a, p) = (key(agent), key(partner));
        held.entry(a).or_default().push(p);
        if instance.problem == ProblemKind::Roommates {
            continue;
        }
        held.entry(p).or_default().push(a);
        if let Some(l) = model.owner(p) {
            held.entry(l).or_default().push(a);
        }
    }
    let held_by = |x: AgentKey| held.get(&x).map_or(&[][..], Vec::as_slice);

    let (single, _) = instance.problem.sides();
    for a in model.keys_of(single) {
        for y in model.list(a).iter() {
            if held_by(a).contains(&y) {
                continue;
            }
            let ga = gain(model, a, y, held_by(a));
            let blocked = match model.owner(y) {
                Some(l) => {
                    let project_full = held_by(y).len() >= model.capacity(y);
                    let lecturer_full = held_by(l).len() >= model.capacity(l);
                    let same_lecturer = held_by(l).contains(&a);
                    let gy = match (project_full, lecturer_full) {
                        (false, false) => Gain::Better,
                        (false, true) if same_lecturer => Gain::Equal,
                        (false, true) => gain(model, l, a, held_by(l)),
                        (true, _) => gain(model, y, a, held_by(y)),
                    };
                    // moving within one lecturer's projects blocks whenever
                    // the student gains
                    let classical_move = stability == StabilityKind::Strict
                        && ga == Gain::Better
                        && !project_full
                        && lecturer_full
                        && same_lecturer;
                    classical_move || blocks(ga, gy, stability)
                }
                None => blocks(ga, gain(model, y, a, held_by(y)), stability),
            };
            if blocked {
                return false;
            }
        }
    }
    true
}
