//! Column-based terrain surface.

use conways_physics_core::{wrap_column, TerrainView, WorldConfig};
use rand::Rng;

/// Surface row per column; rows below the surface are solid.
#[derive(Clone, Debug)]
pub(crate) struct Terrain {
    surface: Vec<u32>,
    height: u32,
    min_row: u32,
}

impl Terrain {
    /// Generates a bounded random-walk surface around the configured baseline.
    pub(crate) fn generate<R: Rng>(config: &WorldConfig, rng: &mut R) -> Self {
        let max_row = config.height.saturating_sub(1);
        let baseline = config.baseline_row();
        let low = baseline
            .saturating_sub(config.terrain_amplitude)
            .max(config.min_surface_row);
        let high = (baseline + config.terrain_amplitude).min(max_row);

        let mut surface = Vec::with_capacity(config.width as usize);
        let mut current = baseline.clamp(low, high);
        for _ in 0..config.width {
            surface.push(current);
            if config.terrain_amplitude > 0 {
                let step: i64 = rng.gen_range(-1..=1);
                current = (i64::from(current) + step).clamp(i64::from(low), i64::from(high)) as u32;
            }
        }

        Self {
            surface,
            height: config.height,
            min_row: config.min_surface_row,
        }
    }

    pub(crate) fn view(&self) -> TerrainView<'_> {
        TerrainView::new(&self.surface, self.height)
    }

    pub(crate) fn air_boundary(&self, column: u32) -> u32 {
        self.view().air_boundary(column)
    }

    /// Moves the surface one row down. Returns the new surface when it changed.
    pub(crate) fn eat(&mut self, column: u32) -> Option<u32> {
        let max_row = self.height.saturating_sub(1);
        let slot = self.slot_mut(column)?;
        if *slot >= max_row {
            return None;
        }
        *slot += 1;
        Some(*slot)
    }

    /// Moves the surface one row up. Returns the new surface when it changed.
    pub(crate) fn raise(&mut self, column: u32) -> Option<u32> {
        let min_row = self.min_row;
        let slot = self.slot_mut(column)?;
        if *slot <= min_row {
            return None;
        }
        *slot -= 1;
        Some(*slot)
    }

    fn slot_mut(&mut self, column: u32) -> Option<&mut u32> {
        let index = wrap_column(i64::from(column), self.surface.len() as u32) as usize;
        self.surface.get_mut(index)
    }
}
