#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic population seeding run after every world recycle.

use conways_physics_core::{
    labeled_rng, AutomatonSeed, Command, Event, Gender, Morphology, PopulationConfig,
    SimulationConfig, Species, TerrainView,
};
use glam::Vec2;
use rand::{seq::SliceRandom, Rng};
use rand_chacha::ChaCha8Rng;

const SPAWNING_RNG_STREAM: &str = "spawning";
const SEED_DRIFT: f32 = 0.5;

/// Pure system that answers a recycled world with a fresh population.
#[derive(Debug)]
pub struct Spawning {
    population: PopulationConfig,
    min_altitude: u32,
    min_weight: f32,
    max_weight: f32,
    landers: Vec<Species>,
    flyers: Vec<Species>,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates the system with its own random stream.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            population: config.population.clone(),
            min_altitude: config.reproduction.flyer_min_altitude.round() as u32,
            min_weight: config.reproduction.min_weight,
            max_weight: config.reproduction.max_weight,
            landers: Species::of_morphology(Morphology::Lander).collect(),
            flyers: Species::of_morphology(Morphology::Flyer).collect(),
            rng: labeled_rng(config.seed, SPAWNING_RNG_STREAM),
        }
    }

    /// Consumes world events and emits spawn commands once per recycle.
    ///
    /// `spawn_range` is the range last accepted by the world; without one the
    /// population is drawn from the configured default range.
    pub fn handle(
        &mut self,
        events: &[Event],
        terrain: TerrainView<'_>,
        spawn_range: Option<(u32, u32)>,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::WorldRecycled))
        {
            return;
        }
        if terrain.width() == 0 {
            return;
        }

        let (min, max) = spawn_range.unwrap_or((
            self.population.default_min,
            self.population.default_max,
        ));
        let total = if min < max {
            self.rng.gen_range(min..=max)
        } else {
            min
        };
        let flyers = flyer_count(total, self.population.flyer_share);

        for _ in 0..total - flyers {
            if let Some(seed) = self.lander(&terrain) {
                out.push(Command::SpawnAutomaton { seed });
            }
        }
        for _ in 0..flyers {
            if let Some(seed) = self.flyer(&terrain) {
                out.push(Command::SpawnAutomaton { seed });
            }
        }
    }

    fn lander(&mut self, terrain: &TerrainView<'_>) -> Option<AutomatonSeed> {
        let species = *self.landers.choose(&mut self.rng)?;
        let column = self.rng.gen_range(0..terrain.width());
        let row = terrain.air_boundary(column);
        Some(self.seed(species, column, row))
    }

    /// Flyers start in the top third, at least the mating altitude above
    /// the ground when the column leaves room for it.
    fn flyer(&mut self, terrain: &TerrainView<'_>) -> Option<AutomatonSeed> {
        let species = *self.flyers.choose(&mut self.rng)?;
        let column = self.rng.gen_range(0..terrain.width());
        let ceiling = (terrain.height() / 3)
            .min(terrain.surface_at(column).saturating_sub(self.min_altitude));
        let row = if ceiling > 0 {
            self.rng.gen_range(0..=ceiling)
        } else {
            0
        };
        Some(self.seed(species, column, row))
    }

    fn seed(&mut self, species: Species, column: u32, row: u32) -> AutomatonSeed {
        let gender = if self.rng.gen_bool(0.5) {
            Gender::Female
        } else {
            Gender::Male
        };
        let weight = if self.min_weight < self.max_weight {
            self.rng.gen_range(self.min_weight..=self.max_weight).round()
        } else {
            self.min_weight
        };
        let drift = self.rng.gen_range(-SEED_DRIFT..=SEED_DRIFT);
        AutomatonSeed {
            species,
            gender,
            position: Vec2::new(column as f32, row as f32),
            velocity: Vec2::new(drift, 0.0),
            energy: self.population.initial_energy,
            weight,
        }
    }
}

/// Number of flyers in a population of `total`, truncated.
fn flyer_count(total: u32, share: f64) -> u32 {
    ((f64::from(total) * share).floor() as u32).min(total)
}
