#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Corpse housekeeping: scavengers eat them, time turns the rest into ground.

use std::{collections::HashSet, time::Duration};

use conways_physics_core::{
    AutomatonId, AutomatonView, ClockSnapshot, Command, CorpseConfig, CorpseView,
    SimulationConfig,
};

/// Pure system deciding which corpses are eaten and which decay.
#[derive(Debug)]
pub struct Corpses {
    config: CorpseConfig,
    day_length: f64,
    fed: HashSet<AutomatonId>,
}

impl Corpses {
    /// Creates the system from the configuration.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            config: config.corpses.clone(),
            day_length: config.time.day_length,
            fed: HashSet::new(),
        }
    }

    /// Emits scavenging and decay commands for the current tick.
    ///
    /// Corpses are visited in identifier order and offered to the first
    /// scavenger in reach that has not eaten yet this tick. Uneaten corpses
    /// older than the decay period decay.
    pub fn handle(
        &mut self,
        corpses: &CorpseView,
        automata: &AutomatonView,
        clock: ClockSnapshot,
        dt: Duration,
        width: u32,
        out: &mut Vec<Command>,
    ) {
        self.fed.clear();
        let now = clock.elapsed_seconds + dt.as_secs_f64();
        let lifetime = self.config.decay_days * self.day_length;

        for corpse in corpses.iter() {
            let scavenger = automata.iter().find(|candidate| {
                candidate.species.is_scavenger()
                    && !self.fed.contains(&candidate.id)
                    && candidate.cell.chebyshev_distance(corpse.cell, width)
                        <= self.config.scavenge_reach
            });

            if let Some(scavenger) = scavenger {
                let _ = self.fed.insert(scavenger.id);
                out.push(Command::ScavengeCorpse {
                    scavenger: scavenger.id,
                    corpse: corpse.id,
                });
            } else if now - corpse.created_at >= lifetime {
                out.push(Command::DecayCorpse { corpse: corpse.id });
            }
        }
    }
}
