#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reproduction and evolution rules.
//!
//! Each tick the system pairs eligible mates, lets `Z` reproduce alone, has
//! long-barren scavengers bud a tunneler into a free neighbouring cell and
//! ages landers into their next species.

use std::collections::HashSet;

use conways_physics_core::{
    labeled_rng, AutomatonId, AutomatonSeed, AutomatonSnapshot, AutomatonView, BlockerView,
    CellCoord, CellIndex, ClockSnapshot, Command, Gender, Morphology, ReproductionConfig,
    SimulationConfig, Species, TerrainView,
};
use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

const REPRODUCTION_RNG_STREAM: &str = "reproduction";

/// Pure system emitting [`Command::Reproduce`] and [`Command::Evolve`].
#[derive(Debug)]
pub struct Reproduction {
    config: ReproductionConfig,
    day_length: f64,
    rng: ChaCha8Rng,
    engaged: HashSet<AutomatonId>,
    claimed: HashSet<CellCoord>,
}

impl Reproduction {
    /// Creates the system with its own random stream.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            config: config.reproduction.clone(),
            day_length: config.time.day_length,
            rng: labeled_rng(config.seed, REPRODUCTION_RNG_STREAM),
            engaged: HashSet::new(),
            claimed: HashSet::new(),
        }
    }

    /// Resolves every birth and evolution for the current tick.
    pub fn handle(
        &mut self,
        automata: &AutomatonView,
        terrain: TerrainView<'_>,
        blockers: &BlockerView,
        clock: ClockSnapshot,
        out: &mut Vec<Command>,
    ) {
        self.engaged.clear();
        self.claimed.clear();
        let index = CellIndex::new(automata, terrain.width(), terrain.height());

        self.pair(automata, &index, &terrain, clock, out);
        self.bud(automata, &terrain, clock, out);
        self.fall_back(automata, &index, &terrain, blockers, clock, out);
        self.evolve(automata, out);
    }

    /// Whether the automaton may take part in sexual or asexual reproduction.
    fn fertile(&self, automaton: &AutomatonSnapshot, terrain: &TerrainView<'_>, day: u32) -> bool {
        let rested = automaton
            .last_reproduction_day
            .map_or(true, |last| day >= last + self.config.cooldown_days);
        let high_enough = automaton.morphology() == Morphology::Lander
            || automaton.altitude(terrain) >= self.config.flyer_min_altitude;
        rested && high_enough && !self.engaged.contains(&automaton.id)
    }

    fn pair(
        &mut self,
        automata: &AutomatonView,
        index: &CellIndex<'_>,
        terrain: &TerrainView<'_>,
        clock: ClockSnapshot,
        out: &mut Vec<Command>,
    ) {
        for first in automata.iter() {
            if first.species.is_asexual()
                || first.energy < self.config.energy_threshold
                || !self.fertile(first, terrain, clock.day)
            {
                continue;
            }
            let partner = index.within(first.cell, 1).into_iter().find(|neighbor| {
                let other = neighbor.snapshot;
                first.is_mate_of(other)
                    && other.energy >= self.config.energy_threshold
                    && self.fertile(other, terrain, clock.day)
            });
            let Some(partner) = partner else {
                continue;
            };

            let second = partner.snapshot;
            let _ = self.engaged.insert(first.id);
            let _ = self.engaged.insert(second.id);
            let offspring = self.newborn(first.species.min(second.species), first.position);
            out.push(Command::Reproduce {
                parents: vec![first.id, second.id],
                energy_cost: self.config.energy_cost,
                offspring,
            });
        }
    }

    fn bud(
        &mut self,
        automata: &AutomatonView,
        terrain: &TerrainView<'_>,
        clock: ClockSnapshot,
        out: &mut Vec<Command>,
    ) {
        for parent in automata.iter() {
            if !parent.species.is_asexual()
                || parent.energy <= self.config.asexual_energy
                || !self.fertile(parent, terrain, clock.day)
            {
                continue;
            }
            let _ = self.engaged.insert(parent.id);
            let offspring = self.newborn(parent.species, parent.position);
            out.push(Command::Reproduce {
                parents: vec![parent.id],
                energy_cost: self.config.energy_cost,
                offspring,
            });
        }
    }

    /// Scavengers barren for too long spawn a tunneler into a free neighbour.
    #[allow(clippy::too_many_arguments)]
    fn fall_back(
        &mut self,
        automata: &AutomatonView,
        index: &CellIndex<'_>,
        terrain: &TerrainView<'_>,
        blockers: &BlockerView,
        clock: ClockSnapshot,
        out: &mut Vec<Command>,
    ) {
        for parent in automata.iter() {
            let Some(species) = parent.species.fallback_offspring() else {
                continue;
            };
            if self.engaged.contains(&parent.id) {
                continue;
            }
            let since = parent.last_reproduction_day.unwrap_or(parent.born_day);
            if clock.day < since + self.config.fallback_days {
                continue;
            }
            let Some(cell) = self.free_neighbor(parent.cell, index, terrain, blockers) else {
                continue;
            };

            let _ = self.engaged.insert(parent.id);
            let _ = self.claimed.insert(cell);
            let offspring = self.newborn(species, cell.to_position());
            out.push(Command::Reproduce {
                parents: vec![parent.id],
                energy_cost: 0.0,
                offspring,
            });
        }
    }

    /// First open cell among up, left, right and down.
    fn free_neighbor(
        &self,
        origin: CellCoord,
        index: &CellIndex<'_>,
        terrain: &TerrainView<'_>,
        blockers: &BlockerView,
    ) -> Option<CellCoord> {
        let width = i64::from(terrain.width());
        let column = i64::from(origin.column());
        let row = i64::from(origin.row());
        [(0, -1), (-1, 0), (1, 0), (0, 1)]
            .into_iter()
            .filter_map(|(dx, dy)| {
                let row = row + dy;
                if row < 0 || row >= i64::from(terrain.height()) {
                    return None;
                }
                let column = (column + dx).rem_euclid(width.max(1));
                Some(CellCoord::new(column as u32, row as u32))
            })
            .find(|cell| {
                !terrain.is_solid(*cell)
                    && !blockers.is_blocked(*cell)
                    && !index.is_occupied(*cell)
                    && !self.claimed.contains(cell)
            })
    }

    fn evolve(&self, automata: &AutomatonView, out: &mut Vec<Command>) {
        let period = f64::from(self.config.evolution_period_days) * self.day_length;
        if period <= 0.0 {
            return;
        }
        for automaton in automata.iter() {
            if automaton.morphology() != Morphology::Lander {
                continue;
            }
            let due = (automaton.age_seconds / period).floor() as u32;
            if due > automaton.evolutions {
                out.push(Command::Evolve {
                    automaton: automaton.id,
                });
            }
        }
    }

    fn newborn(&mut self, species: Species, position: Vec2) -> AutomatonSeed {
        let gender = if self.rng.gen_bool(0.5) {
            Gender::Female
        } else {
            Gender::Male
        };
        let weight = if self.config.min_weight < self.config.max_weight {
            self.rng
                .gen_range(self.config.min_weight..=self.config.max_weight)
                .round()
        } else {
            self.config.min_weight
        };
        AutomatonSeed {
            species,
            gender,
            position,
            velocity: Vec2::ZERO,
            energy: self.config.newborn_energy,
            weight,
        }
    }
}
