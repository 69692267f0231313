#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rock lifecycle: bombers drop them, they fall, strike, land and decay.

use std::time::Duration;

use conways_physics_core::{
    labeled_rng, AutomatonSnapshot, AutomatonView, BlockerView, CellCoord, CellIndex,
    ClockSnapshot, Command, RockConfig, RockState, RockView, SimulationConfig, TerrainView,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

const ROCKS_RNG_STREAM: &str = "rocks";

/// Kinetic energy a rock of `mass` delivers at `velocity_y`.
#[must_use]
pub fn impact_energy(mass: f32, velocity_y: f32) -> f32 {
    0.5 * mass * velocity_y * velocity_y
}

/// Pure system that answers with rock commands.
#[derive(Debug)]
pub struct Rocks {
    config: RockConfig,
    gravity: f32,
    day_length: f64,
    rng: ChaCha8Rng,
}

impl Rocks {
    /// Creates the system with its own random stream.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            config: config.rocks.clone(),
            gravity: config.motion.gravity,
            day_length: config.time.day_length,
            rng: labeled_rng(config.seed, ROCKS_RNG_STREAM),
        }
    }

    /// Integrates every falling rock over `dt`.
    ///
    /// The swept rows are checked from the top: the first automaton met is
    /// struck and the rock lands, and a rock whose next row is ground or a
    /// blocker lands in place.
    pub fn handle_fall(
        &mut self,
        rocks: &RockView,
        automata: &AutomatonView,
        terrain: TerrainView<'_>,
        blockers: &BlockerView,
        dt: Duration,
        out: &mut Vec<Command>,
    ) {
        let seconds = dt.as_secs_f32();
        if seconds <= 0.0 {
            return;
        }
        let index = CellIndex::new(automata, terrain.width(), terrain.height());
        let max_row = terrain.height().saturating_sub(1);

        for rock in rocks.iter().filter(|rock| rock.state == RockState::Falling) {
            let velocity_y = rock.velocity_y + self.gravity * seconds;
            let y = (rock.position.y + velocity_y * seconds).clamp(0.0, max_row as f32);
            let column = rock.cell.column();
            let last_row = (y.round() as u32).max(rock.cell.row());

            let mut settled = false;
            for row in rock.cell.row()..=last_row {
                let cell = CellCoord::new(column, row);
                if let Some(victim) = index.at(cell).next() {
                    let impact = impact_energy(self.config.mass, velocity_y);
                    out.push(Command::StrikeAutomaton {
                        rock: rock.id,
                        victim: victim.id,
                        impact,
                        lethal: impact >= self.config.lethal_impact,
                    });
                    settled = true;
                    break;
                }
                let below = CellCoord::new(column, row + 1);
                if row >= max_row || terrain.is_solid(below) || blockers.is_blocked(below) {
                    settled = true;
                    break;
                }
            }

            if settled {
                out.push(Command::LandRock { rock: rock.id });
            } else {
                out.push(Command::MoveRock {
                    rock: rock.id,
                    y,
                    velocity_y,
                });
            }
        }
    }

    /// Lets energetic bombers release rocks into the open cell below them.
    ///
    /// Lower-rank prey anywhere beneath the bomber in its column makes a
    /// drop more likely.
    pub fn handle_drops(
        &mut self,
        automata: &AutomatonView,
        terrain: TerrainView<'_>,
        blockers: &BlockerView,
        out: &mut Vec<Command>,
    ) {
        for bomber in automata.iter() {
            if !bomber.species.is_bomber() || bomber.energy <= self.config.drop_energy_threshold {
                continue;
            }
            let below = CellCoord::new(bomber.cell.column(), bomber.cell.row() + 1);
            if below.row() >= terrain.height()
                || terrain.is_solid(below)
                || blockers.is_blocked(below)
            {
                continue;
            }

            let mut chance = self.config.drop_chance;
            if has_prey_below(bomber, automata, &terrain) {
                chance *= self.config.aimed_multiplier;
            }
            if !self.rng.gen_bool(chance.clamp(0.0, 1.0)) {
                continue;
            }
            out.push(Command::SpawnRock {
                cell: below,
                dropped_by: Some(bomber.id),
                energy_cost: self.config.drop_cost,
            });
        }
    }

    /// Turns landed rocks older than the decay period into terrain.
    pub fn handle_decay(
        &self,
        rocks: &RockView,
        clock: ClockSnapshot,
        dt: Duration,
        out: &mut Vec<Command>,
    ) {
        let now = clock.elapsed_seconds + dt.as_secs_f64();
        let lifetime = self.config.decay_days * self.day_length;
        for rock in rocks.iter() {
            let Some(landed_at) = rock.landed_at else {
                continue;
            };
            if rock.state == RockState::Landed && now - landed_at >= lifetime {
                out.push(Command::DecayRock { rock: rock.id });
            }
        }
    }
}

fn has_prey_below(
    bomber: &AutomatonSnapshot,
    automata: &AutomatonView,
    terrain: &TerrainView<'_>,
) -> bool {
    let column = bomber.cell.column();
    let surface = terrain.surface_at(column);
    automata.iter().any(|other| {
        other.cell.column() == column
            && other.cell.row() > bomber.cell.row()
            && other.cell.row() < surface
            && other.rank() < bomber.rank()
    })
}

#[cfg(test)]
mod tests {
    use super::impact_energy;

    #[test]
    fn impact_grows_with_the_square_of_speed() {
        assert_eq!(impact_energy(20.0, 0.0), 0.0);
        assert_eq!(impact_energy(20.0, 1.0), 10.0);
        assert_eq!(impact_energy(20.0, 2.0), 40.0);
    }
}
