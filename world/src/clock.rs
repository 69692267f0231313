//! Day/night cycle over simulated seconds.

use conways_physics_core::ClockSnapshot;

#[derive(Clone, Debug)]
pub(crate) struct DayNightClock {
    elapsed: f64,
    day_length: f64,
    daylight: f64,
}

impl DayNightClock {
    pub(crate) fn new(day_length: f64, daylight: f64) -> Self {
        Self {
            elapsed: 0.0,
            day_length,
            daylight,
        }
    }

    /// Advances the clock; negative deltas are ignored.
    pub(crate) fn advance(&mut self, dt: f64) {
        if dt > 0.0 {
            self.elapsed += dt;
        }
    }

    pub(crate) fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    pub(crate) fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub(crate) fn current_day(&self) -> u32 {
        (self.elapsed / self.day_length).floor() as u32
    }

    pub(crate) fn is_daylight(&self) -> bool {
        self.elapsed.rem_euclid(self.day_length) < self.daylight
    }

    pub(crate) fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            elapsed_seconds: self.elapsed,
            day: self.current_day(),
            daylight: self.is_daylight(),
            day_length: self.day_length,
        }
    }
}
