//! Flight dynamics: weighted cardinal steering, lift, drag and ground bounce.

use conways_physics_core::{wrap_column, wrap_x, AutomatonSnapshot, CellCoord, Motion, TerrainView};
use glam::Vec2;
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::{ground_row, Signals, Surroundings, Tuning};

/// Left, right, up, down.
const DIRECTIONS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BASE_WEIGHTS: [f32; 4] = [4.0, 4.0, 2.0, 1.0];
const MATE_PULL: f32 = 2.0;
const REST_TOLERANCE: f32 = 1e-3;

pub(crate) fn step<R: Rng>(
    tuning: &Tuning,
    rng: &mut R,
    terrain: TerrainView<'_>,
    around: &Surroundings<'_>,
    me: &AutomatonSnapshot,
    signals: &Signals,
) -> Motion {
    let dt = around.dt;
    let floor = ground_row(&terrain, around.blockers, me.cell.column()) as f32;
    let resting = me.position.y >= floor - REST_TOLERANCE;
    let kicked = tuning.stagnation_kick(rng, me.stagnant_seconds);

    if me.energy <= tuning.energy.flyer_min {
        return fall(tuning, around, me, floor, resting, kicked);
    }

    let (dx, dy) = heading(rng, signals);
    let mut velocity = Vec2::new(
        dx as f32 * tuning.motion.flyer_cruise_speed,
        me.velocity.y + dy as f32 * tuning.motion.flyer_vertical_impulse,
    );
    if kicked {
        if resting {
            if me.energy > tuning.stagnation.min_energy {
                velocity.y -= tuning.stagnation.impulse;
            }
        } else if rng.gen_bool(0.5) {
            velocity.x += tuning.stagnation.impulse;
        } else {
            velocity.x -= tuning.stagnation.impulse;
        }
    }
    if resting && velocity.y >= 0.0 {
        velocity.y = -tuning.motion.liftoff_velocity;
    }

    let altitude = (terrain.surface_at(me.cell.column()) as f32 - me.position.y).max(0.0);
    let climb = if altitude < tuning.cruise_altitude {
        tuning.motion.flyer_climb_accel * (1.0 - altitude / tuning.cruise_altitude)
    } else {
        0.0
    };
    let weight_factor =
        1.0 + 0.5 * me.energy / tuning.energy.max + 0.2 * tuning.weight_norm(me.weight);
    let gravity = tuning.motion.gravity * tuning.motion.flyer_gravity_scale * weight_factor;
    velocity.y += (gravity - climb) * dt;
    velocity.y *= (1.0 - tuning.motion.air_drag).max(0.0);

    let mut position = me.position;
    if !resting {
        let (x, blocked) = sweep(
            &terrain,
            around,
            me,
            velocity.x * dt,
            tuning.motion.path_sample_step,
        );
        position.x = x;
        if blocked {
            velocity.x = 0.0;
        }
    }

    let column = CellCoord::from_position(position, around.width, around.height).column();
    let floor = ground_row(&terrain, around.blockers, column) as f32;
    position.y += velocity.y * dt;
    if position.y >= floor {
        position.y = floor;
        velocity.y = -velocity.y * tuning.motion.restitution;
    }
    if position.y < 0.0 {
        position.y = 0.0;
        velocity.y = velocity.y.max(0.0);
    }

    let moved = position.distance_squared(me.position) > f32::EPSILON;
    let upkeep = if moved {
        tuning.energy.flight_cost
    } else {
        tuning.energy.passive_drain
    };
    let energy = tuning.clamp_energy(
        me.energy - upkeep * dt + tuning.sunlight(me.species, &around.clock) * dt,
    );

    Motion {
        position,
        velocity,
        energy,
        stagnant_seconds: stagnation(around, me, position),
        jumped: false,
    }
}

/// Too weak to fly: drop toward the floor and idle there.
fn fall(
    tuning: &Tuning,
    around: &Surroundings<'_>,
    me: &AutomatonSnapshot,
    floor: f32,
    resting: bool,
    kicked: bool,
) -> Motion {
    let dt = around.dt;
    let mut velocity = Vec2::ZERO;
    if !resting {
        velocity.y = me.velocity.y.max(0.0) + tuning.motion.gravity * dt;
    }
    if kicked && resting && me.energy > tuning.stagnation.min_energy {
        velocity.y = -tuning.stagnation.impulse;
    }

    let mut position = me.position;
    position.y = (position.y + velocity.y * dt).max(0.0);
    if position.y >= floor {
        position.y = floor;
        velocity.y = 0.0;
    }

    Motion {
        position,
        velocity,
        energy: tuning.clamp_energy(me.energy - tuning.energy.passive_drain * dt),
        stagnant_seconds: stagnation(around, me, position),
        jumped: false,
    }
}

fn stagnation(around: &Surroundings<'_>, me: &AutomatonSnapshot, position: Vec2) -> f32 {
    if CellCoord::from_position(position, around.width, around.height) == me.cell {
        me.stagnant_seconds + around.dt
    } else {
        0.0
    }
}

/// Weighted cardinal choice; with nothing in sight the flyer roams sideways.
fn heading<R: Rng>(rng: &mut R, signals: &Signals) -> (i32, i32) {
    if signals.is_empty() {
        return if rng.gen_bool(0.5) {
            DIRECTIONS[0]
        } else {
            DIRECTIONS[1]
        };
    }

    let mut weights = BASE_WEIGHTS;
    for prey in &signals.prey {
        lean(&mut weights, prey.dx, prey.dy, prey.weight);
    }
    for threat in &signals.threats {
        lean(&mut weights, -threat.dx, -threat.dy, threat.weight);
    }
    for mate in &signals.mates {
        lean(&mut weights, mate.dx, mate.dy, MATE_PULL * mate.weight);
    }

    match WeightedIndex::new(weights) {
        Ok(choice) => DIRECTIONS[choice.sample(rng)],
        Err(_) => DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())],
    }
}

/// Adds pull toward `(dx, dy)`; horizontal pull outweighs up, up outweighs down.
fn lean(weights: &mut [f32; 4], dx: i32, dy: i32, scale: f32) {
    if dx < 0 {
        weights[0] += BASE_WEIGHTS[0] * scale;
    }
    if dx > 0 {
        weights[1] += BASE_WEIGHTS[1] * scale;
    }
    if dy < 0 {
        weights[2] += BASE_WEIGHTS[2] * scale;
    }
    if dy > 0 {
        weights[3] += BASE_WEIGHTS[3] * scale;
    }
}

/// Moves sideways through open air, stopping in front of ground and blockers.
fn sweep(
    terrain: &TerrainView<'_>,
    around: &Surroundings<'_>,
    me: &AutomatonSnapshot,
    travel: f32,
    sample_step: f32,
) -> (f32, bool) {
    let start = me.position.x;
    let row = me.cell.row();
    let samples = (travel.abs() / sample_step).ceil().max(1.0) as u32;
    let mut column = me.cell.column();
    let mut reached = start;
    for sample in 1..=samples {
        let x = start + travel * sample as f32 / samples as f32;
        let next = wrap_column(x.round() as i64, around.width);
        if next != column {
            let cell = CellCoord::new(next, row);
            if terrain.is_solid(cell) || around.blockers.is_blocked(cell) {
                return (wrap_x(reached, around.width), true);
            }
            column = next;
        }
        reached = x;
    }
    (wrap_x(reached, around.width), false)
}
