#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic statistics aggregated from world events.

mod metrics;

use std::collections::VecDeque;

use conways_physics_core::{
    AutomatonView, ClockSnapshot, DeathCause, Event, SpawnOrigin, StatsReport,
};

pub use metrics::{moving_average, PopulationBreakdown};

/// Completed days of movement kept for the moving averages.
pub const MOVE_HISTORY_DAYS: usize = 14;

/// Pure analytics system folding world events into running statistics.
#[derive(Debug, Default)]
pub struct Analytics {
    counters: Counters,
    completed_days: VecDeque<u64>,
    moves_today: u64,
    last_report: Option<StatsReport>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Counters {
    spawned: u64,
    born: u64,
    starved: u64,
    eaten: u64,
    crushed: u64,
    moves_total: u64,
}

impl Analytics {
    /// Creates a new analytics system with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last report produced by [`Analytics::report`], if any.
    #[must_use]
    pub fn last_report(&self) -> Option<&StatsReport> {
        self.last_report.as_ref()
    }

    /// Consumes world events in order.
    ///
    /// A recycle clears every counter, so events following it in the same
    /// batch count towards the new world.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::WorldRecycled => self.reset(),
                Event::AutomatonSpawned { origin, .. } => match origin {
                    SpawnOrigin::Seeded => self.counters.spawned += 1,
                    SpawnOrigin::Born => self.counters.born += 1,
                },
                Event::AutomatonDied { cause, .. } => match cause {
                    DeathCause::Starvation => self.counters.starved += 1,
                    DeathCause::Predation => self.counters.eaten += 1,
                    DeathCause::Rock => self.counters.crushed += 1,
                },
                Event::AutomatonMoved { .. } => {
                    self.counters.moves_total += 1;
                    self.moves_today += 1;
                }
                Event::DayBegan { .. } => self.roll_day(),
                _ => {}
            }
        }
    }

    /// Builds the report for the current world and remembers it.
    pub fn report(&mut self, automata: &AutomatonView, clock: ClockSnapshot) -> StatsReport {
        let breakdown = PopulationBreakdown::of(automata);
        let counters = self.counters;
        let report = StatsReport {
            population: breakdown.population,
            landers: breakdown.landers,
            flyers: breakdown.flyers,
            average_energy: breakdown.average_energy,
            spawned: counters.spawned,
            born: counters.born,
            starved: counters.starved,
            eaten: counters.eaten,
            crushed: counters.crushed,
            moves_total: counters.moves_total,
            moves_avg_3: moving_average(&self.completed_days, self.moves_today, 3),
            moves_avg_7: moving_average(&self.completed_days, self.moves_today, 7),
            moves_avg_14: moving_average(&self.completed_days, self.moves_today, 14),
            day: clock.day,
        };
        self.last_report = Some(report.clone());
        report
    }

    fn roll_day(&mut self) {
        self.completed_days.push_back(self.moves_today);
        while self.completed_days.len() > MOVE_HISTORY_DAYS {
            let _ = self.completed_days.pop_front();
        }
        self.moves_today = 0;
    }

    fn reset(&mut self) {
        self.counters = Counters::default();
        self.completed_days.clear();
        self.moves_today = 0;
        self.last_report = None;
    }
}

#[cfg(test)]
mod tests {
    use conways_physics_core::Event;

    use super::{Analytics, MOVE_HISTORY_DAYS};

    #[test]
    fn history_keeps_the_last_fourteen_days() {
        let mut analytics = Analytics::new();
        for day in 1..=20 {
            analytics.moves_today = day;
            analytics.handle(&[Event::DayBegan { day: day as u32 }]);
        }
        assert_eq!(analytics.completed_days.len(), MOVE_HISTORY_DAYS);
        assert_eq!(analytics.completed_days.front(), Some(&7));
        assert_eq!(analytics.moves_today, 0);
    }

    #[test]
    fn recycle_clears_history() {
        let mut analytics = Analytics::new();
        analytics.moves_today = 4;
        analytics.handle(&[Event::DayBegan { day: 1 }, Event::WorldRecycled]);
        assert!(analytics.completed_days.is_empty());
        assert_eq!(analytics.counters, super::Counters::default());
    }
}
