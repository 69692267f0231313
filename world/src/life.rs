//! Game-of-Life overlay that biases automaton drift.

use conways_physics_core::LifeFieldView;
use rand::Rng;

/// B3/S23 grid without wrap-around; a double buffer avoids reallocating per step.
#[derive(Clone, Debug)]
pub(crate) struct LifeField {
    width: u32,
    height: u32,
    cells: Vec<bool>,
    scratch: Vec<bool>,
    generation: u64,
}

impl LifeField {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![false; len],
            scratch: vec![false; len],
            generation: 0,
        }
    }

    /// Reseeds every cell alive with probability `density`.
    pub(crate) fn seed<R: Rng>(&mut self, rng: &mut R, density: f64) {
        for cell in &mut self.cells {
            *cell = rng.gen_bool(density);
        }
        self.generation = 0;
    }

    pub(crate) fn step(&mut self) {
        let width = self.width as usize;
        let height = self.height as usize;
        for row in 0..height {
            for column in 0..width {
                let alive = self.cells[row * width + column];
                let neighbors = self.live_neighbors(column, row);
                self.scratch[row * width + column] =
                    matches!((alive, neighbors), (true, 2) | (true, 3) | (false, 3));
            }
        }
        std::mem::swap(&mut self.cells, &mut self.scratch);
        self.generation += 1;
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub(crate) fn view(&self) -> LifeFieldView<'_> {
        LifeFieldView::new(&self.cells, self.width, self.height)
    }

    fn live_neighbors(&self, column: usize, row: usize) -> u8 {
        let width = self.width as usize;
        let height = self.height as usize;
        let mut count = 0;
        for r in row.saturating_sub(1)..=(row + 1).min(height - 1) {
            for c in column.saturating_sub(1)..=(column + 1).min(width - 1) {
                if (r, c) != (row, column) && self.cells[r * width + c] {
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::LifeField;

    fn with_cells(width: u32, height: u32, alive: &[(u32, u32)]) -> LifeField {
        let mut field = LifeField::new(width, height);
        for (column, row) in alive {
            field.cells[(row * width + column) as usize] = true;
        }
        field
    }

    fn alive(field: &LifeField) -> Vec<(u32, u32)> {
        let mut cells = Vec::new();
        for row in 0..field.height {
            for column in 0..field.width {
                if field.view().is_alive(column, row) {
                    cells.push((column, row));
                }
            }
        }
        cells
    }

    #[test]
    fn blinker_oscillates() {
        let mut field = with_cells(5, 5, &[(1, 2), (2, 2), (3, 2)]);
        field.step();
        assert_eq!(alive(&field), vec![(2, 1), (2, 2), (2, 3)]);
        field.step();
        assert_eq!(alive(&field), vec![(1, 2), (2, 2), (3, 2)]);
        assert_eq!(field.generation(), 2);
    }

    #[test]
    fn edges_do_not_wrap() {
        let mut field = with_cells(5, 5, &[(0, 1), (0, 2), (0, 3)]);
        field.step();
        assert_eq!(alive(&field), vec![(0, 2), (1, 2)]);
    }

    #[test]
    fn block_is_stable() {
        let mut field = with_cells(4, 4, &[(1, 1), (2, 1), (1, 2), (2, 2)]);
        field.step();
        assert_eq!(alive(&field), vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    }
}
