//! Entity records owned by the world and the identifier allocators behind them.

use std::collections::BTreeMap;

use conways_physics_core::{
    AutomatonId, AutomatonSnapshot, Blocker, BlockerView, CellCoord, CorpseId, CorpseSnapshot,
    Gender, RockId, RockSnapshot, RockState, Species,
};
use glam::Vec2;

/// Authoritative automaton state.
#[derive(Clone, Debug)]
pub(crate) struct Automaton {
    pub(crate) id: AutomatonId,
    pub(crate) species: Species,
    pub(crate) gender: Gender,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) energy: f32,
    pub(crate) weight: f32,
    pub(crate) age_seconds: f64,
    pub(crate) born_day: u32,
    pub(crate) last_reproduction_day: Option<u32>,
    pub(crate) last_jump_day: Option<u32>,
    pub(crate) evolutions: u32,
    pub(crate) stagnant_seconds: f32,
}

impl Automaton {
    pub(crate) fn cell(&self, width: u32, height: u32) -> CellCoord {
        CellCoord::from_position(self.position, width, height)
    }

    pub(crate) fn snapshot(&self, width: u32, height: u32) -> AutomatonSnapshot {
        AutomatonSnapshot {
            id: self.id,
            species: self.species,
            gender: self.gender,
            position: self.position,
            velocity: self.velocity,
            cell: self.cell(width, height),
            energy: self.energy,
            weight: self.weight,
            age_seconds: self.age_seconds,
            born_day: self.born_day,
            last_reproduction_day: self.last_reproduction_day,
            last_jump_day: self.last_jump_day,
            evolutions: self.evolutions,
            stagnant_seconds: self.stagnant_seconds,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Rock {
    pub(crate) id: RockId,
    pub(crate) position: Vec2,
    pub(crate) velocity_y: f32,
    pub(crate) state: RockState,
    pub(crate) landed_at: Option<f64>,
    pub(crate) dropped_by: Option<AutomatonId>,
}

impl Rock {
    pub(crate) fn column(&self) -> u32 {
        self.position.x.round().max(0.0) as u32
    }

    pub(crate) fn snapshot(&self, width: u32, height: u32) -> RockSnapshot {
        RockSnapshot {
            id: self.id,
            position: self.position,
            velocity_y: self.velocity_y,
            state: self.state,
            cell: CellCoord::from_position(self.position, width, height),
            landed_at: self.landed_at,
            dropped_by: self.dropped_by,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Corpse {
    pub(crate) id: CorpseId,
    pub(crate) cell: CellCoord,
    pub(crate) created_at: f64,
}

impl Corpse {
    pub(crate) fn snapshot(&self) -> CorpseSnapshot {
        CorpseSnapshot {
            id: self.id,
            cell: self.cell,
            created_at: self.created_at,
        }
    }
}

/// Registry for every entity plus a cell index of static blockers.
///
/// Identifier counters survive [`EntityStore::clear`], so identifiers issued
/// before a recycle never resolve afterwards.
#[derive(Debug, Default)]
pub(crate) struct EntityStore {
    pub(crate) automata: BTreeMap<AutomatonId, Automaton>,
    pub(crate) rocks: BTreeMap<RockId, Rock>,
    pub(crate) corpses: BTreeMap<CorpseId, Corpse>,
    blocked: BTreeMap<CellCoord, Blocker>,
    next_automaton_id: u32,
    next_rock_id: u32,
    next_corpse_id: u32,
}

impl EntityStore {
    pub(crate) fn clear(&mut self) {
        self.automata.clear();
        self.rocks.clear();
        self.corpses.clear();
        self.blocked.clear();
    }

    pub(crate) fn allocate_automaton_id(&mut self) -> AutomatonId {
        let id = AutomatonId::new(self.next_automaton_id);
        self.next_automaton_id = self.next_automaton_id.wrapping_add(1);
        id
    }

    pub(crate) fn insert_rock(&mut self, cell: CellCoord, dropped_by: Option<AutomatonId>) -> RockId {
        let id = RockId::new(self.next_rock_id);
        self.next_rock_id = self.next_rock_id.wrapping_add(1);
        let _ = self.rocks.insert(
            id,
            Rock {
                id,
                position: cell.to_position(),
                velocity_y: 0.0,
                state: RockState::Falling,
                landed_at: None,
                dropped_by,
            },
        );
        id
    }

    /// Rests a falling rock on `cell` and registers it as a blocker.
    pub(crate) fn land_rock(&mut self, rock: RockId, cell: CellCoord, now: f64) -> bool {
        let Some(entry) = self.rocks.get_mut(&rock) else {
            return false;
        };
        entry.state = RockState::Landed;
        entry.velocity_y = 0.0;
        entry.position = cell.to_position();
        entry.landed_at = Some(now);
        let _ = self.blocked.insert(cell, Blocker::Rock(rock));
        true
    }

    pub(crate) fn remove_rock(&mut self, rock: RockId, width: u32, height: u32) -> Option<Rock> {
        let removed = self.rocks.remove(&rock)?;
        if removed.state == RockState::Landed {
            let cell = CellCoord::from_position(removed.position, width, height);
            let _ = self.blocked.remove(&cell);
        }
        Some(removed)
    }

    pub(crate) fn insert_corpse(&mut self, cell: CellCoord, now: f64) -> CorpseId {
        let id = CorpseId::new(self.next_corpse_id);
        self.next_corpse_id = self.next_corpse_id.wrapping_add(1);
        let _ = self.corpses.insert(
            id,
            Corpse {
                id,
                cell,
                created_at: now,
            },
        );
        let _ = self.blocked.insert(cell, Blocker::Corpse(id));
        id
    }

    pub(crate) fn remove_corpse(&mut self, corpse: CorpseId) -> Option<Corpse> {
        let removed = self.corpses.remove(&corpse)?;
        let _ = self.blocked.remove(&removed.cell);
        Some(removed)
    }

    pub(crate) fn is_blocked(&self, cell: CellCoord) -> bool {
        self.blocked.contains_key(&cell)
    }

    pub(crate) fn blocker_view(&self) -> BlockerView {
        BlockerView::from_entries(self.blocked.iter().map(|(cell, blocker)| (*cell, *blocker)))
    }

    /// Lowest free row at or above `air_boundary` in the column.
    pub(crate) fn resting_row(&self, column: u32, air_boundary: u32) -> Option<u32> {
        let mut row = air_boundary;
        while self.is_blocked(CellCoord::new(column, row)) {
            row = row.checked_sub(1)?;
        }
        Some(row)
    }

    /// Re-stacks the column's blockers contiguously on top of `air_boundary`.
    ///
    /// Called after the surface under a stack moved so nothing floats or sinks
    /// into the ground. Blockers that no longer fit above row zero are dropped.
    pub(crate) fn settle_column(&mut self, column: u32, air_boundary: u32) {
        let range = CellCoord::new(column, 0)..=CellCoord::new(column, u32::MAX);
        let mut stack: Vec<(CellCoord, Blocker)> = self
            .blocked
            .range(range)
            .map(|(cell, blocker)| (*cell, *blocker))
            .collect();
        if stack.is_empty() {
            return;
        }
        stack.sort_by(|a, b| b.0.row().cmp(&a.0.row()));
        for (cell, _) in &stack {
            let _ = self.blocked.remove(cell);
        }

        let mut next_row = Some(air_boundary);
        for (_, blocker) in stack {
            match next_row {
                Some(row) => {
                    let cell = CellCoord::new(column, row);
                    self.relocate(blocker, cell);
                    let _ = self.blocked.insert(cell, blocker);
                    next_row = row.checked_sub(1);
                }
                None => self.forget(blocker),
            }
        }
    }

    fn relocate(&mut self, blocker: Blocker, cell: CellCoord) {
        match blocker {
            Blocker::Rock(id) => {
                if let Some(rock) = self.rocks.get_mut(&id) {
                    rock.position = cell.to_position();
                }
            }
            Blocker::Corpse(id) => {
                if let Some(corpse) = self.corpses.get_mut(&id) {
                    corpse.cell = cell;
                }
            }
        }
    }

    fn forget(&mut self, blocker: Blocker) {
        match blocker {
            Blocker::Rock(id) => {
                let _ = self.rocks.remove(&id);
            }
            Blocker::Corpse(id) => {
                let _ = self.corpses.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EntityStore;
    use conways_physics_core::{Blocker, CellCoord, RockState};

    #[test]
    fn identifiers_survive_clear() {
        let mut store = EntityStore::default();
        let first = store.allocate_automaton_id();
        store.clear();
        let second = store.allocate_automaton_id();
        assert_ne!(first, second);
    }

    #[test]
    fn landed_rocks_and_corpses_block_cells() {
        let mut store = EntityStore::default();
        let rock = store.insert_rock(CellCoord::new(3, 2), None);
        assert!(!store.is_blocked(CellCoord::new(3, 2)));
        assert!(store.land_rock(rock, CellCoord::new(3, 19), 4.0));
        let _ = store.insert_corpse(CellCoord::new(3, 18), 5.0);
        assert_eq!(store.resting_row(3, 19), Some(17));
        assert_eq!(
            store.blocker_view().blocker(CellCoord::new(3, 19)),
            Some(Blocker::Rock(rock))
        );
        assert_eq!(store.rocks[&rock].state, RockState::Landed);
    }

    #[test]
    fn settling_drops_a_stack_onto_the_new_surface() {
        let mut store = EntityStore::default();
        let corpse = store.insert_corpse(CellCoord::new(1, 18), 0.0);
        let rock = store.insert_rock(CellCoord::new(1, 0), None);
        let _ = store.land_rock(rock, CellCoord::new(1, 17), 0.0);

        store.settle_column(1, 19);

        assert_eq!(store.corpses[&corpse].cell, CellCoord::new(1, 19));
        assert!(store.is_blocked(CellCoord::new(1, 18)));
        assert!(!store.is_blocked(CellCoord::new(1, 17)));
        assert_eq!(store.rocks[&rock].position.y, 18.0);
    }

    #[test]
    fn removing_a_corpse_frees_its_cell() {
        let mut store = EntityStore::default();
        let corpse = store.insert_corpse(CellCoord::new(4, 10), 0.0);
        assert!(store.remove_corpse(corpse).is_some());
        assert!(!store.is_blocked(CellCoord::new(4, 10)));
        assert!(store.remove_corpse(corpse).is_none());
    }
}
