//! Ground-bound walking with stepping, tunneling and jumps.

use conways_physics_core::{
    wrap_column, wrap_x, AutomatonSnapshot, CellCoord, Command, Motion, TerrainView,
};
use glam::Vec2;
use rand::Rng;

use crate::{ground_row, Signals, Surroundings, Tuning};

/// Why a walk could not enter the next column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Obstacle {
    /// The next column rises more than one row.
    Terrain,
    /// A rock or corpse sits on the next column's surface.
    Blocker,
}

pub(crate) fn step<R: Rng>(
    tuning: &Tuning,
    rng: &mut R,
    surface: &mut [u32],
    around: &Surroundings<'_>,
    me: &AutomatonSnapshot,
    signals: &Signals,
    out: &mut Vec<Command>,
) -> Motion {
    let dt = around.dt;
    let sunlight = tuning.sunlight(me.species, &around.clock) * dt;

    if me.energy <= tuning.energy.lander_min {
        return Motion {
            position: me.position,
            velocity: Vec2::ZERO,
            energy: tuning.clamp_energy(me.energy - tuning.energy.passive_drain * dt + sunlight),
            stagnant_seconds: me.stagnant_seconds + dt,
            jumped: false,
        };
    }

    let heading = heading(tuning, rng, me, signals, around);
    let mut vx = heading as f32 * tuning.motion.walk_speed;
    if heading != 0 {
        vx += tuning.life_bias(&around.life, me.cell);
        if tuning.stagnation_kick(rng, me.stagnant_seconds) {
            vx += if rng.gen_bool(0.5) {
                tuning.stagnation.impulse
            } else {
                -tuning.stagnation.impulse
            };
        }
    }

    let start_x = me.position.x;
    let travel = vx * dt;
    let samples = (travel.abs() / tuning.motion.path_sample_step).ceil().max(1.0) as u32;
    let mut column = me.cell.column();
    let mut row = ground_row(
        &TerrainView::new(surface, around.height),
        around.blockers,
        column,
    );
    let mut reached = start_x;
    let mut halted = false;
    let mut landing = None;
    let mut dug = false;

    for sample in 1..=samples {
        let x = start_x + travel * sample as f32 / samples as f32;
        let next = wrap_column(x.round() as i64, around.width);
        if next != column {
            let mut verdict = obstacle(surface, around, row, next);
            if verdict == Some(Obstacle::Terrain) && me.species.is_tunneler() && !dug {
                dug = true;
                if dig(surface, around.height, next) {
                    out.push(Command::TunnelTerrain {
                        automaton: me.id,
                        column: next,
                    });
                    verdict = obstacle(surface, around, row, next);
                }
            }
            // A step the tunneler could not open this tick is jumped like any other.
            match verdict {
                None => {}
                Some(Obstacle::Terrain) => {
                    landing = jump(
                        tuning,
                        rng,
                        TerrainView::new(surface, around.height),
                        around,
                        me,
                        column,
                        row,
                        vx,
                    );
                    halted = landing.is_none();
                    break;
                }
                Some(_) => {
                    halted = true;
                    break;
                }
            }
            column = next;
            row = ground_row(
                &TerrainView::new(surface, around.height),
                around.blockers,
                column,
            );
        }
        reached = x;
    }

    let jumped = landing.is_some();
    let (position, final_cell) = match landing {
        Some(cell) => {
            vx = 0.0;
            (cell.to_position(), cell)
        }
        None => {
            if halted {
                vx = 0.0;
            }
            let x = wrap_x(reached, around.width);
            (Vec2::new(x, row as f32), CellCoord::new(column, row))
        }
    };

    let moved = jumped || (reached - start_x).abs() > f32::EPSILON;
    let upkeep = if moved {
        tuning.energy.walk_cost
    } else {
        tuning.energy.passive_drain
    };
    let jump_cost = if jumped { tuning.jump.cost } else { 0.0 };
    let energy = tuning.clamp_energy(me.energy - upkeep * dt - jump_cost + sunlight);

    let energy_term = 0.1 * energy / tuning.energy.max;
    let weight_term = 0.03 * tuning.weight_norm(me.weight);
    vx *= (1.0 - (tuning.motion.ground_friction + energy_term + weight_term)).max(0.0);
    if heading != 0 && !halted {
        vx += tuning.life_bias(&around.life, final_cell);
    }

    let stagnant_seconds = if final_cell == me.cell {
        me.stagnant_seconds + dt
    } else {
        0.0
    };

    Motion {
        position,
        velocity: Vec2::new(vx, 0.0),
        energy,
        stagnant_seconds,
        jumped,
    }
}

/// Horizontal intent: mate, then flight from threats, then the hunt, then drift.
fn heading<R: Rng>(
    tuning: &Tuning,
    rng: &mut R,
    me: &AutomatonSnapshot,
    signals: &Signals,
    around: &Surroundings<'_>,
) -> i32 {
    if me.energy > tuning.mate_seek_energy {
        if let Some(mate) = signals.nearest_mate() {
            if mate.dx.abs() <= 1 {
                return 0;
            }
            return mate.dx.signum();
        }
    }
    if let Some(threat) = signals.nearest_lateral_threat() {
        return -threat.dx.signum();
    }
    if let Some(prey) = signals.nearest_lateral_prey() {
        return prey.dx.signum();
    }

    let density = around.life.neighbor_count(me.cell);
    let rightward = if density >= tuning.motion.crowded_density {
        0.75
    } else if density <= tuning.motion.sparse_density {
        0.25
    } else {
        0.5
    };
    if rng.gen_bool(rightward) {
        1
    } else {
        -1
    }
}

fn obstacle(
    surface: &[u32],
    around: &Surroundings<'_>,
    row: u32,
    next: u32,
) -> Option<Obstacle> {
    let terrain = TerrainView::new(surface, around.height);
    let target = terrain.air_boundary(next);
    if around.blockers.is_blocked(CellCoord::new(next, target)) {
        return Some(Obstacle::Blocker);
    }
    if row.saturating_sub(target) > 1 {
        return Some(Obstacle::Terrain);
    }
    None
}

/// Lowers the scratch surface of `column` by one row.
fn dig(surface: &mut [u32], height: u32, column: u32) -> bool {
    let Some(slot) = surface.get_mut(column as usize) else {
        return false;
    };
    if *slot + 1 >= height {
        return false;
    }
    *slot += 1;
    true
}

#[allow(clippy::too_many_arguments)]
fn jump<R: Rng>(
    tuning: &Tuning,
    rng: &mut R,
    terrain: TerrainView<'_>,
    around: &Surroundings<'_>,
    me: &AutomatonSnapshot,
    column: u32,
    row: u32,
    vx: f32,
) -> Option<CellCoord> {
    let rested = me
        .last_jump_day
        .map_or(true, |last| around.clock.day >= last + tuning.jump.cooldown_days);
    if !rested || !rng.gen_bool(tuning.jump.chance) {
        return None;
    }

    let offset = i64::from(tuning.jump.distance) * if vx < 0.0 { -1 } else { 1 };
    let target = wrap_column(i64::from(column) + offset, around.width);
    let landing = CellCoord::new(target, terrain.air_boundary(target));
    if row.saturating_sub(landing.row()) > tuning.jump.ascent_max
        || around.blockers.is_blocked(landing)
    {
        return None;
    }
    Some(landing)
}
