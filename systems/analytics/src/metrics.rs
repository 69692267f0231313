use std::collections::VecDeque;

use conways_physics_core::{AutomatonView, Morphology};

/// Head counts and mean energy of the living population.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PopulationBreakdown {
    /// Living automata.
    pub population: usize,
    /// Living landers.
    pub landers: usize,
    /// Living flyers.
    pub flyers: usize,
    /// Mean energy, zero for an empty world.
    pub average_energy: f32,
}

impl PopulationBreakdown {
    /// Counts the automata in `view` by morphology.
    #[must_use]
    pub fn of(view: &AutomatonView) -> Self {
        let mut breakdown = Self::default();
        let mut total_energy = 0.0_f64;
        for automaton in view.iter() {
            breakdown.population += 1;
            match automaton.morphology() {
                Morphology::Lander => breakdown.landers += 1,
                Morphology::Flyer => breakdown.flyers += 1,
            }
            total_energy += f64::from(automaton.energy);
        }
        if breakdown.population > 0 {
            breakdown.average_energy = (total_energy / breakdown.population as f64) as f32;
        }
        breakdown
    }
}

/// Mean of the last `window` entries of the completed days followed by the
/// current partial day.
///
/// Fewer days than `window` average over what is available.
#[must_use]
pub fn moving_average(completed: &VecDeque<u64>, current: u64, window: usize) -> f32 {
    if window == 0 {
        return 0.0;
    }
    let from_history = window - 1;
    let skip = completed.len().saturating_sub(from_history);
    let mut total = current;
    let mut days = 1_u64;
    for moves in completed.iter().skip(skip) {
        total += moves;
        days += 1;
    }
    (total as f64 / days as f64) as f32
}
