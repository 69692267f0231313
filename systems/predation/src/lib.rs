#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure predation system resolving who eats whom among neighbouring automata.

use std::{cmp::Ordering, collections::HashSet};

use conways_physics_core::{
    labeled_rng, AutomatonId, AutomatonSnapshot, AutomatonView, CellIndex, Command, Neighbor,
    PredationConfig, SimulationConfig,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

const PREDATION_RNG_STREAM: &str = "predation";

/// Decides which neighbours an automaton can see.
///
/// Anything strictly inside the range is visible; at exactly the range a fair
/// coin decides, drawn independently for every observer/observed pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vision {
    range: u32,
}

impl Vision {
    /// Creates a vision rule with the provided Chebyshev range.
    #[must_use]
    pub const fn new(range: u32) -> Self {
        Self { range }
    }

    /// Maximum Chebyshev distance that can be seen.
    #[must_use]
    pub const fn range(&self) -> u32 {
        self.range
    }

    /// Neighbours visible to `observer`, excluding itself, in deterministic order.
    pub fn sightings<'a, R: Rng>(
        &self,
        index: &CellIndex<'a>,
        observer: &AutomatonSnapshot,
        rng: &mut R,
    ) -> Vec<Neighbor<'a>> {
        index
            .within(observer.cell, self.range)
            .into_iter()
            .filter(|neighbor| neighbor.snapshot.id != observer.id)
            .filter(|neighbor| neighbor.distance() < self.range || rng.gen_bool(0.5))
            .collect()
    }
}

/// Probability that an attacker with `energy` goes through with an attack.
///
/// Hunger is total up to the satiation onset, then falls linearly to the
/// configured floor at maximum energy.
#[must_use]
pub fn attack_probability(energy: f32, config: &PredationConfig, max_energy: f32) -> f64 {
    if energy <= config.satiation_onset {
        return 1.0;
    }
    let span = (max_energy - config.satiation_onset).max(f32::EPSILON);
    let fullness = f64::from(((energy - config.satiation_onset) / span).clamp(0.0, 1.0));
    (1.0 - fullness * (1.0 - config.satiation_floor)).clamp(0.0, 1.0)
}

/// Pure system that turns adjacency into [`Command::Devour`] requests.
#[derive(Debug)]
pub struct Predation {
    config: PredationConfig,
    max_energy: f32,
    rng: ChaCha8Rng,
    eaten: HashSet<AutomatonId>,
}

impl Predation {
    /// Creates the system with its own random stream.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            config: config.predation.clone(),
            max_energy: config.energy.max,
            rng: labeled_rng(config.seed, PREDATION_RNG_STREAM),
            eaten: HashSet::new(),
        }
    }

    /// Resolves every attack for the current tick.
    ///
    /// Pairs are visited once in identifier order; an automaton eaten earlier
    /// in the pass takes no further part in it.
    pub fn handle(
        &mut self,
        automata: &AutomatonView,
        width: u32,
        height: u32,
        out: &mut Vec<Command>,
    ) {
        self.eaten.clear();
        let index = CellIndex::new(automata, width, height);

        for candidate in automata.iter() {
            if self.eaten.contains(&candidate.id) {
                continue;
            }
            for neighbor in index.within(candidate.cell, self.config.eating_reach) {
                let other = neighbor.snapshot;
                if other.id <= candidate.id
                    || other.species == candidate.species
                    || self.eaten.contains(&other.id)
                {
                    continue;
                }
                let Some(victim) = self.resolve(candidate, other, out) else {
                    continue;
                };
                let _ = self.eaten.insert(victim);
                if victim == candidate.id {
                    break;
                }
            }
        }
    }

    fn resolve(
        &mut self,
        first: &AutomatonSnapshot,
        second: &AutomatonSnapshot,
        out: &mut Vec<Command>,
    ) -> Option<AutomatonId> {
        let (attacker, prey) = match first.rank().cmp(&second.rank()) {
            Ordering::Greater => (first, second),
            Ordering::Less => (second, first),
            Ordering::Equal => {
                if self.rng.gen_bool(0.5) {
                    (first, second)
                } else {
                    (second, first)
                }
            }
        };

        let appetite = attack_probability(attacker.energy, &self.config, self.max_energy);
        if !self.rng.gen_bool(appetite) {
            return None;
        }

        let cornered = prey.species.is_scavenger()
            && attacker.energy <= self.config.retaliation_energy
            && self.rng.gen_bool(self.config.retaliation_chance);
        let (predator, victim) = if cornered {
            (prey, attacker)
        } else {
            (attacker, prey)
        };

        out.push(Command::Devour {
            predator: predator.id,
            prey: victim.id,
        });
        Some(victim.id)
    }
}
