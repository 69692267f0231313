//! Tunable parameters for every rule in the simulation.
//!
//! Each group has a `Default` implementation carrying the reference values and
//! deserialises with `#[serde(default)]`, so a partial configuration file only
//! overrides the knobs it names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aggregated tuning knobs for a simulation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Master seed from which every random stream is derived.
    pub seed: u64,
    /// World dimensions and terrain generation.
    pub world: WorldConfig,
    /// Tick duration, day length and tick-rate limits.
    pub time: TimeConfig,
    /// Energy budget, movement costs and feeding.
    pub energy: EnergyConfig,
    /// Forces and speeds used by the integrators.
    pub motion: MotionConfig,
    /// Lander jumps over terrain steps.
    pub jump: JumpConfig,
    /// Nudges applied to automata that stop changing cells.
    pub stagnation: StagnationConfig,
    /// Vision, eating reach, satiation and retaliation.
    pub predation: PredationConfig,
    /// Pair, asexual and fallback reproduction plus evolution.
    pub reproduction: ReproductionConfig,
    /// Rock drops, impacts and decay.
    pub rocks: RockConfig,
    /// Corpse creation, scavenging and decay.
    pub corpses: CorpseConfig,
    /// Game-of-Life overlay.
    pub life: LifeConfig,
    /// Population seeding on recycle.
    pub population: PopulationConfig,
}

/// World dimensions and terrain generation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of columns; positions wrap horizontally at this width.
    pub width: u32,
    /// Number of rows; row zero is the sky ceiling.
    pub height: u32,
    /// Rows between the bottom of the world and the terrain baseline.
    pub sea_level_offset: u32,
    /// Maximum deviation of the random-walk surface from the baseline.
    pub terrain_amplitude: u32,
    /// Highest row the surface may be raised to.
    pub min_surface_row: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            sea_level_offset: 4,
            terrain_amplitude: 3,
            min_surface_row: 1,
        }
    }
}

impl WorldConfig {
    /// Row around which terrain generation walks.
    #[must_use]
    pub const fn baseline_row(&self) -> u32 {
        self.height.saturating_sub(self.sea_level_offset)
    }
}

/// Simulated time parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Simulated seconds integrated by one tick.
    pub tick_seconds: f32,
    /// Seconds in a full day.
    pub day_length: f64,
    /// Seconds of daylight at the start of each day.
    pub daylight: f64,
    /// Tick rate in cycles per second used after construction.
    pub default_tick_rate: u32,
    /// Lowest accepted tick rate.
    pub min_tick_rate: u32,
    /// Highest accepted tick rate.
    pub max_tick_rate: u32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 1.0,
            day_length: 30.0,
            daylight: 15.0,
            default_tick_rate: 30,
            min_tick_rate: 1,
            max_tick_rate: 60,
        }
    }
}

/// Energy budget and the costs charged against it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Upper clamp for every automaton's energy.
    pub max: f32,
    /// Energy granted by one meal.
    pub meal: f32,
    /// Landers at or below this energy stop walking.
    pub lander_min: f32,
    /// Flyers at or below this energy stop flying.
    pub flyer_min: f32,
    /// Drain per second while a lander walks.
    pub walk_cost: f32,
    /// Drain per second while a flyer moves.
    pub flight_cost: f32,
    /// Drain per second while stationary.
    pub passive_drain: f32,
    /// Whether scavengers photosynthesise during daylight.
    pub sunlight: bool,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max: 100.0,
            meal: 25.0,
            lander_min: 10.0,
            flyer_min: 20.0,
            walk_cost: 0.2,
            flight_cost: 0.5,
            passive_drain: 0.1,
            sunlight: true,
        }
    }
}

/// Forces and speeds used by the lander and flyer integrators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Downward acceleration in rows per second squared.
    pub gravity: f32,
    /// Fraction of vertical flyer velocity lost each tick.
    pub air_drag: f32,
    /// Baseline fraction of lander velocity lost each tick.
    pub ground_friction: f32,
    /// Fraction of vertical speed kept when a flyer bounces off the ground.
    pub restitution: f32,
    /// Scale applied to gravity for flyers.
    pub flyer_gravity_scale: f32,
    /// Horizontal speed of a flyer in columns per second.
    pub flyer_cruise_speed: f32,
    /// Vertical impulse added when a flyer chooses up or down.
    pub flyer_vertical_impulse: f32,
    /// Upward speed given to a resting flyer that takes off.
    pub liftoff_velocity: f32,
    /// Upward acceleration applied to flyers below the reproduction altitude.
    pub flyer_climb_accel: f32,
    /// Horizontal speed of a walking lander in columns per second.
    pub walk_speed: f32,
    /// Largest distance between two collision samples along a path.
    pub path_sample_step: f32,
    /// Horizontal nudge applied from Game-of-Life density.
    pub life_nudge: f32,
    /// Neighbour count at or above which the overlay pushes right.
    pub crowded_density: u8,
    /// Neighbour count at or below which the overlay pushes left.
    pub sparse_density: u8,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            air_drag: 0.02,
            ground_friction: 0.1,
            restitution: 0.2,
            flyer_gravity_scale: 0.5,
            flyer_cruise_speed: 1.5,
            flyer_vertical_impulse: 2.0,
            liftoff_velocity: 3.0,
            flyer_climb_accel: 12.0,
            walk_speed: 2.0,
            path_sample_step: 0.5,
            life_nudge: 0.2,
            crowded_density: 5,
            sparse_density: 2,
        }
    }
}

/// Lander jumps over steps too tall to walk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Probability that a blocked lander attempts a jump.
    pub chance: f64,
    /// Days that must pass between two jumps.
    pub cooldown_days: u32,
    /// Largest rise in rows a jump can clear.
    pub ascent_max: u32,
    /// Columns travelled by a jump.
    pub distance: u32,
    /// Energy charged per jump.
    pub cost: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            chance: 0.5,
            cooldown_days: 7,
            ascent_max: 3,
            distance: 2,
            cost: 2.0,
        }
    }
}

/// Random impulses that unstick automata lingering in one cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagnationConfig {
    /// Seconds in a cell before nudges may happen.
    pub grace_seconds: f32,
    /// Seconds in a cell after which a nudge is certain.
    pub saturation_seconds: f32,
    /// Velocity added by a nudge.
    pub impulse: f32,
    /// Grounded flyers need more than this energy to be nudged upward.
    pub min_energy: f32,
}

impl Default for StagnationConfig {
    fn default() -> Self {
        Self {
            grace_seconds: 5.0,
            saturation_seconds: 60.0,
            impulse: 1.0,
            min_energy: 5.0,
        }
    }
}

/// Vision and eating rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredationConfig {
    /// Chebyshev distance within which automata may see each other.
    pub vision_range: u32,
    /// Chebyshev distance within which an attack lands.
    pub eating_reach: u32,
    /// Energy above which attack probability starts to fall.
    pub satiation_onset: f32,
    /// Attack probability at maximum energy.
    pub satiation_floor: f64,
    /// Attackers at or below this energy risk retaliation from scavengers.
    pub retaliation_energy: f32,
    /// Probability that a cornered scavenger eats its attacker.
    pub retaliation_chance: f64,
}

impl Default for PredationConfig {
    fn default() -> Self {
        Self {
            vision_range: 2,
            eating_reach: 1,
            satiation_onset: 90.0,
            satiation_floor: 0.1,
            retaliation_energy: 5.0,
            retaliation_chance: 0.5,
        }
    }
}

/// Reproduction and evolution rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReproductionConfig {
    /// Energy both partners need to mate.
    pub energy_threshold: f32,
    /// Energy charged to each parent.
    pub energy_cost: f32,
    /// Days a parent waits before reproducing again.
    pub cooldown_days: u32,
    /// Rows above the surface a flyer must be to reproduce.
    pub flyer_min_altitude: f32,
    /// Energy a `Z` must exceed to reproduce alone.
    pub asexual_energy: f32,
    /// Energy given to newborns.
    pub newborn_energy: f32,
    /// Days without reproduction before a scavenger spawns a tunneler.
    pub fallback_days: u32,
    /// Days of lifetime per evolution step.
    pub evolution_period_days: u32,
    /// Letters advanced per evolution step.
    pub evolution_shift: u8,
    /// Landers seek mates only above this energy.
    pub mate_seek_energy: f32,
    /// Lightest newborn weight.
    pub min_weight: f32,
    /// Heaviest newborn weight.
    pub max_weight: f32,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 60.0,
            energy_cost: 20.0,
            cooldown_days: 1,
            flyer_min_altitude: 20.0,
            asexual_energy: 90.0,
            newborn_energy: 50.0,
            fallback_days: 30,
            evolution_period_days: 30,
            evolution_shift: 2,
            mate_seek_energy: 10.0,
            min_weight: 20.0,
            max_weight: 100.0,
        }
    }
}

/// Rock drops, impacts and decay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RockConfig {
    /// Mass used in the impact energy.
    pub mass: f32,
    /// Impact energy at or above which the victim dies outright.
    pub lethal_impact: f32,
    /// Bombers need more than this energy to drop a rock.
    pub drop_energy_threshold: f32,
    /// Per-tick probability that an eligible bomber drops a rock.
    pub drop_chance: f64,
    /// Multiplier on the drop chance when lower-ranked prey is below.
    pub aimed_multiplier: f64,
    /// Energy charged for dropping a rock.
    pub drop_cost: f32,
    /// Days a landed rock lasts before it turns into terrain.
    pub decay_days: f64,
}

impl Default for RockConfig {
    fn default() -> Self {
        Self {
            mass: 20.0,
            lethal_impact: 100.0,
            drop_energy_threshold: 70.0,
            drop_chance: 0.1,
            aimed_multiplier: 3.0,
            drop_cost: 5.0,
            decay_days: 10.0,
        }
    }
}

/// Corpse handling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpseConfig {
    /// Days a corpse lasts before it turns into terrain.
    pub decay_days: f64,
    /// Chebyshev distance within which scavengers eat a corpse.
    pub scavenge_reach: u32,
    /// Meals granted by eating a corpse.
    pub scavenge_meals: f32,
    /// Whether dead flyers leave corpses on the ground below them.
    pub flyer_corpses: bool,
}

impl Default for CorpseConfig {
    fn default() -> Self {
        Self {
            decay_days: 5.0,
            scavenge_reach: 1,
            scavenge_meals: 1.0,
            flyer_corpses: false,
        }
    }
}

/// Game-of-Life overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeConfig {
    /// Probability that a cell starts alive after a recycle.
    pub initial_density: f64,
    /// Ticks between two generations.
    pub step_interval_ticks: u32,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            initial_density: 0.2,
            step_interval_ticks: 1,
        }
    }
}

/// Population seeding on recycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Smallest population drawn when no spawn range is set.
    pub default_min: u32,
    /// Largest population drawn when no spawn range is set.
    pub default_max: u32,
    /// Fraction of the seeded population that are flyers.
    pub flyer_share: f64,
    /// Energy given to seeded automata.
    pub initial_energy: f32,
    /// Whether an empty world recycles itself and keeps running.
    pub auto_respawn: bool,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            default_min: 40,
            default_max: 160,
            flyer_share: 0.1,
            initial_energy: 100.0,
            auto_respawn: true,
        }
    }
}

/// Reasons a configuration is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("world dimensions must be positive, got {width}x{height}")]
    EmptyWorld {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// Terrain baseline and amplitude do not fit inside the world.
    #[error("terrain baseline {baseline} +/- {amplitude} does not fit between row {min_surface_row} and height {height}")]
    TerrainOutOfBounds {
        /// Baseline row.
        baseline: u32,
        /// Random walk amplitude.
        amplitude: u32,
        /// Highest surface row allowed.
        min_surface_row: u32,
        /// World height.
        height: u32,
    },
    /// A lower bound exceeds its upper bound.
    #[error("{name} range is inverted: {min} > {max}")]
    InvertedRange {
        /// Parameter family at fault.
        name: &'static str,
        /// Lower bound supplied.
        min: u32,
        /// Upper bound supplied.
        max: u32,
    },
    /// A duration that must be positive is not.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Parameter at fault.
        name: &'static str,
        /// Value supplied.
        value: f64,
    },
    /// Daylight lasts longer than a day.
    #[error("daylight of {daylight}s exceeds the {day_length}s day")]
    DaylightTooLong {
        /// Configured daylight seconds.
        daylight: f64,
        /// Configured day length.
        day_length: f64,
    },
    /// A probability lies outside `[0, 1]`.
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability {
        /// Parameter at fault.
        name: &'static str,
        /// Value supplied.
        value: f64,
    },
}

impl SimulationConfig {
    /// Creates the reference configuration with the provided seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Checks every cross-field constraint the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.width == 0 || world.height == 0 {
            return Err(ConfigError::EmptyWorld {
                width: world.width,
                height: world.height,
            });
        }

        let baseline = world.baseline_row();
        let fits = world.sea_level_offset >= 1
            && baseline >= world.min_surface_row + world.terrain_amplitude
            && baseline + world.terrain_amplitude < world.height
            && world.min_surface_row >= 1;
        if !fits {
            return Err(ConfigError::TerrainOutOfBounds {
                baseline,
                amplitude: world.terrain_amplitude,
                min_surface_row: world.min_surface_row,
                height: world.height,
            });
        }

        let time = &self.time;
        positive("tick_seconds", f64::from(time.tick_seconds))?;
        positive("day_length", time.day_length)?;
        if time.daylight < 0.0 || time.daylight > time.day_length {
            return Err(ConfigError::DaylightTooLong {
                daylight: time.daylight,
                day_length: time.day_length,
            });
        }
        ordered("tick_rate", time.min_tick_rate, time.max_tick_rate)?;
        if time.min_tick_rate == 0 {
            return Err(ConfigError::NonPositive {
                name: "min_tick_rate",
                value: 0.0,
            });
        }

        positive("energy.max", f64::from(self.energy.max))?;
        positive("motion.path_sample_step", f64::from(self.motion.path_sample_step))?;
        positive(
            "stagnation.saturation_seconds",
            f64::from(self.stagnation.saturation_seconds - self.stagnation.grace_seconds),
        )?;
        positive("rocks.decay_days", self.rocks.decay_days)?;
        positive("corpses.decay_days", self.corpses.decay_days)?;
        positive(
            "reproduction.flyer_min_altitude",
            f64::from(self.reproduction.flyer_min_altitude),
        )?;
        if self.reproduction.evolution_period_days == 0 {
            return Err(ConfigError::NonPositive {
                name: "reproduction.evolution_period_days",
                value: 0.0,
            });
        }
        if self.life.step_interval_ticks == 0 {
            return Err(ConfigError::NonPositive {
                name: "life.step_interval_ticks",
                value: 0.0,
            });
        }
        if self.reproduction.min_weight > self.reproduction.max_weight {
            return Err(ConfigError::InvertedRange {
                name: "reproduction.weight",
                min: self.reproduction.min_weight as u32,
                max: self.reproduction.max_weight as u32,
            });
        }
        ordered(
            "population",
            self.population.default_min,
            self.population.default_max,
        )?;

        probability("jump.chance", self.jump.chance)?;
        probability("predation.satiation_floor", self.predation.satiation_floor)?;
        probability("predation.retaliation_chance", self.predation.retaliation_chance)?;
        probability("rocks.drop_chance", self.rocks.drop_chance)?;
        probability("life.initial_density", self.life.initial_density)?;
        probability("population.flyer_share", self.population.flyer_share)?;
        Ok(())
    }

    /// Clamps a requested tick rate into the accepted range.
    #[must_use]
    pub fn clamp_tick_rate(&self, cycles_per_second: u32) -> u32 {
        cycles_per_second.clamp(self.time.min_tick_rate, self.time.max_tick_rate)
    }
}

/// Validates a population range supplied at runtime.
pub fn validate_spawn_range(min: u32, max: u32) -> Result<(), ConfigError> {
    ordered("spawn", min, max)
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn ordered(name: &'static str, min: u32, max: u32) -> Result<(), ConfigError> {
    if min > max {
        Err(ConfigError::InvertedRange { name, min, max })
    } else {
        Ok(())
    }
}

fn probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_spawn_range, ConfigError, SimulationConfig};

    #[test]
    fn reference_configuration_is_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_width_is_rejected() {
        let mut config = SimulationConfig::default();
        config.world.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyWorld { width: 0, .. })
        ));
    }

    #[test]
    fn daylight_longer_than_day_is_rejected() {
        let mut config = SimulationConfig::default();
        config.time.daylight = 45.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DaylightTooLong { .. })
        ));
    }

    #[test]
    fn terrain_that_escapes_the_world_is_rejected() {
        let mut config = SimulationConfig::default();
        config.world.terrain_amplitude = 30;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TerrainOutOfBounds { .. })
        ));
    }

    #[test]
    fn invalid_probability_is_rejected() {
        let mut config = SimulationConfig::default();
        config.rocks.drop_chance = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability {
                name: "rocks.drop_chance",
                ..
            })
        ));
    }

    #[test]
    fn zero_day_length_is_rejected() {
        let mut config = SimulationConfig::default();
        config.time.day_length = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                name: "day_length",
                ..
            })
        ));
    }

    #[test]
    fn inverted_spawn_range_is_rejected() {
        assert!(validate_spawn_range(10, 5).is_err());
        assert!(validate_spawn_range(0, 0).is_ok());
    }

    #[test]
    fn tick_rate_clamps_into_limits() {
        let config = SimulationConfig::default();
        assert_eq!(config.clamp_tick_rate(0), 1);
        assert_eq!(config.clamp_tick_rate(500), 60);
        assert_eq!(config.clamp_tick_rate(12), 12);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: SimulationConfig = toml::from_str(
            "seed = 7\n[world]\nwidth = 40\n[rocks]\ndrop_chance = 0.2\n",
        )
        .expect("parse");
        assert_eq!(config.seed, 7);
        assert_eq!(config.world.width, 40);
        assert_eq!(config.world.height, 24);
        assert_eq!(config.rocks.drop_chance, 0.2);
        assert_eq!(config.rocks.mass, 20.0);
    }
}
