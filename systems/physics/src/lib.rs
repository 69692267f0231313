#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Motion integration for landers and flyers.
//!
//! Every tick the system integrates each automaton against the terrain, the
//! static blockers and the Game-of-Life overlay and answers with one
//! [`Command::MoveAutomaton`] per automaton. Tunnelers additionally emit the
//! [`Command::TunnelTerrain`] requests they relied on, ahead of their move, so
//! the world digs before it places them.

mod flyer;
mod lander;

use std::time::Duration;

use conways_physics_core::{
    labeled_rng, AutomatonSnapshot, AutomatonView, BlockerView, CellCoord, CellIndex,
    ClockSnapshot, Command, EnergyConfig, JumpConfig, LifeFieldView, Morphology, MotionConfig,
    Neighbor, SimulationConfig, Species, StagnationConfig, TerrainView,
};
use conways_physics_system_predation::Vision;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

const PHYSICS_RNG_STREAM: &str = "physics";

/// Pure system integrating automaton motion.
#[derive(Debug)]
pub struct Physics {
    tuning: Tuning,
    vision: Vision,
    rng: ChaCha8Rng,
    surface: Vec<u32>,
}

impl Physics {
    /// Creates the system with its own random stream.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            tuning: Tuning::from_config(config),
            vision: Vision::new(config.predation.vision_range),
            rng: labeled_rng(config.seed, PHYSICS_RNG_STREAM),
            surface: Vec::new(),
        }
    }

    /// Integrates every automaton over `dt`.
    ///
    /// Automata are visited in identifier order and each one reads the state
    /// captured before the tick, except for terrain dug earlier in the pass.
    #[allow(clippy::too_many_arguments)]
    pub fn handle(
        &mut self,
        automata: &AutomatonView,
        terrain: TerrainView<'_>,
        blockers: &BlockerView,
        life: LifeFieldView<'_>,
        clock: ClockSnapshot,
        dt: Duration,
        out: &mut Vec<Command>,
    ) {
        let seconds = dt.as_secs_f32();
        if seconds <= 0.0 || automata.is_empty() {
            return;
        }

        self.surface.clear();
        self.surface.extend_from_slice(terrain.rows());
        let (width, height) = (terrain.width(), terrain.height());
        let index = CellIndex::new(automata, width, height);
        let surroundings = Surroundings {
            blockers,
            life,
            clock,
            width,
            height,
            dt: seconds,
        };

        for automaton in automata.iter() {
            let sightings = self.vision.sightings(&index, automaton, &mut self.rng);
            let signals = Signals::read(automaton, &sightings);
            let motion = match automaton.morphology() {
                Morphology::Lander => lander::step(
                    &self.tuning,
                    &mut self.rng,
                    &mut self.surface,
                    &surroundings,
                    automaton,
                    &signals,
                    out,
                ),
                Morphology::Flyer => flyer::step(
                    &self.tuning,
                    &mut self.rng,
                    TerrainView::new(&self.surface, height),
                    &surroundings,
                    automaton,
                    &signals,
                ),
            };
            out.push(Command::MoveAutomaton {
                automaton: automaton.id,
                motion,
            });
        }
    }
}

/// Tunables the integrators read, copied out of the configuration.
#[derive(Clone, Debug)]
pub(crate) struct Tuning {
    pub(crate) energy: EnergyConfig,
    pub(crate) motion: MotionConfig,
    pub(crate) jump: JumpConfig,
    pub(crate) stagnation: StagnationConfig,
    pub(crate) cruise_altitude: f32,
    pub(crate) mate_seek_energy: f32,
    pub(crate) min_weight: f32,
    pub(crate) max_weight: f32,
    pub(crate) daylight_seconds: f64,
}

impl Tuning {
    fn from_config(config: &SimulationConfig) -> Self {
        Self {
            energy: config.energy.clone(),
            motion: config.motion.clone(),
            jump: config.jump.clone(),
            stagnation: config.stagnation.clone(),
            cruise_altitude: config.reproduction.flyer_min_altitude,
            mate_seek_energy: config.reproduction.mate_seek_energy,
            min_weight: config.reproduction.min_weight,
            max_weight: config.reproduction.max_weight,
            daylight_seconds: config.time.daylight,
        }
    }

    /// Body weight mapped onto `[0, 1]`.
    pub(crate) fn weight_norm(&self, weight: f32) -> f32 {
        let span = self.max_weight - self.min_weight;
        if span <= 0.0 {
            return 0.0;
        }
        ((weight - self.min_weight) / span).clamp(0.0, 1.0)
    }

    /// Energy per second a species collects from the sun right now.
    pub(crate) fn sunlight(&self, species: Species, clock: &ClockSnapshot) -> f32 {
        if !self.energy.sunlight
            || !species.is_scavenger()
            || !clock.daylight
            || self.daylight_seconds <= 0.0
        {
            return 0.0;
        }
        0.25 * self.energy.meal / self.daylight_seconds as f32
    }

    /// Horizontal nudge the Game-of-Life overlay applies at `cell`.
    pub(crate) fn life_bias(&self, life: &LifeFieldView<'_>, cell: CellCoord) -> f32 {
        let density = life.neighbor_count(cell);
        if density >= self.motion.crowded_density {
            self.motion.life_nudge
        } else if density <= self.motion.sparse_density {
            -self.motion.life_nudge
        } else {
            0.0
        }
    }

    /// Rolls whether an automaton stuck for `seconds` receives a nudge.
    pub(crate) fn stagnation_kick<R: Rng>(&self, rng: &mut R, seconds: f32) -> bool {
        let probability = stagnation_probability(&self.stagnation, seconds);
        probability > 0.0 && rng.gen_bool(probability)
    }

    pub(crate) fn clamp_energy(&self, energy: f32) -> f32 {
        energy.clamp(0.0, self.energy.max)
    }
}

/// Probability of a stagnation nudge after `seconds` without changing cell.
///
/// Zero until the grace period ends, then linear up to certainty at
/// saturation.
#[must_use]
pub fn stagnation_probability(config: &StagnationConfig, seconds: f32) -> f64 {
    if seconds < config.grace_seconds {
        return 0.0;
    }
    let span = (config.saturation_seconds - config.grace_seconds).max(f32::EPSILON);
    f64::from(((seconds - config.grace_seconds) / span).clamp(0.0, 1.0))
}

/// Read-only context shared by every integration in a tick.
#[derive(Debug)]
pub(crate) struct Surroundings<'a> {
    pub(crate) blockers: &'a BlockerView,
    pub(crate) life: LifeFieldView<'a>,
    pub(crate) clock: ClockSnapshot,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) dt: f32,
}

/// Row an entity rests on in `column`, on top of any blocker stack.
pub(crate) fn ground_row(terrain: &TerrainView<'_>, blockers: &BlockerView, column: u32) -> u32 {
    blockers
        .resting_cell(terrain, column)
        .map_or(0, |cell| cell.row())
}

/// Offset to another visible automaton, weighted by how much it matters.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Sighting {
    pub(crate) dx: i32,
    pub(crate) dy: i32,
    pub(crate) weight: f32,
}

impl Sighting {
    fn distance(&self) -> u32 {
        self.dx.unsigned_abs().max(self.dy.unsigned_abs())
    }
}

/// Visible automata sorted into prey, threats and mates.
#[derive(Debug, Default)]
pub(crate) struct Signals {
    pub(crate) prey: Vec<Sighting>,
    pub(crate) threats: Vec<Sighting>,
    pub(crate) mates: Vec<Sighting>,
}

impl Signals {
    fn read(observer: &AutomatonSnapshot, sightings: &[Neighbor<'_>]) -> Self {
        let mut signals = Self::default();
        for neighbor in sightings {
            let other = neighbor.snapshot;
            if other.species == observer.species {
                if observer.is_mate_of(other) {
                    signals.mates.push(Sighting {
                        dx: neighbor.dx,
                        dy: neighbor.dy,
                        weight: 1.0,
                    });
                }
                continue;
            }
            let gap = f32::from(observer.rank().abs_diff(other.rank()));
            let sighting = Sighting {
                dx: neighbor.dx,
                dy: neighbor.dy,
                weight: gap,
            };
            if other.rank() < observer.rank() {
                signals.prey.push(sighting);
            } else if other.rank() > observer.rank() {
                signals.threats.push(sighting);
            }
        }
        signals
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.prey.is_empty() && self.threats.is_empty() && self.mates.is_empty()
    }

    pub(crate) fn nearest_mate(&self) -> Option<Sighting> {
        nearest(&self.mates, |_| true)
    }

    /// Closest threat that is not straight above or below.
    pub(crate) fn nearest_lateral_threat(&self) -> Option<Sighting> {
        nearest(&self.threats, |sighting| sighting.dx != 0)
    }

    /// Closest prey that is not straight above or below.
    pub(crate) fn nearest_lateral_prey(&self) -> Option<Sighting> {
        nearest(&self.prey, |sighting| sighting.dx != 0)
    }
}

fn nearest(sightings: &[Sighting], keep: impl Fn(&Sighting) -> bool) -> Option<Sighting> {
    sightings
        .iter()
        .filter(|sighting| keep(sighting))
        .min_by_key(|sighting| sighting.distance())
        .copied()
}
