#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Conways Physics engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems read immutable views of the
//! world and answer with [`Command`] batches; the world executes those commands
//! via its `apply` entry point and broadcasts [`Event`] values describing what
//! actually happened. Nothing here owns mutable simulation state.

mod config;
mod seed;
mod species;

use std::{collections::BTreeMap, collections::HashMap, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use config::{
    validate_spawn_range, ConfigError, CorpseConfig, EnergyConfig, JumpConfig, LifeConfig,
    MotionConfig, PopulationConfig, PredationConfig, ReproductionConfig, RockConfig,
    SimulationConfig, StagnationConfig, TimeConfig, WorldConfig,
};
pub use seed::{derive_labeled_seed, labeled_rng};
pub use species::{Gender, Morphology, Species, RANKS_PER_MORPHOLOGY};

/// Wraps a signed column index into `[0, width)`.
#[must_use]
pub fn wrap_column(column: i64, width: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    column.rem_euclid(i64::from(width)) as u32
}

/// Wraps a continuous horizontal coordinate into `[0, width)`.
#[must_use]
pub fn wrap_x(x: f32, width: u32) -> f32 {
    if width == 0 {
        return x;
    }
    let span = width as f32;
    let wrapped = x.rem_euclid(span);
    if wrapped >= span {
        0.0
    } else {
        wrapped
    }
}

/// Whole-cell coordinate; rows grow downward from the sky ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Rounds a continuous position to the cell it occupies.
    ///
    /// Columns wrap around the world width and rows clamp into the world.
    #[must_use]
    pub fn from_position(position: Vec2, width: u32, height: u32) -> Self {
        let column = wrap_column(position.x.round() as i64, width);
        let max_row = height.saturating_sub(1) as f32;
        let row = position.y.round().clamp(0.0, max_row) as u32;
        Self { column, row }
    }

    /// Centre of the cell as a continuous position.
    #[must_use]
    pub fn to_position(self) -> Vec2 {
        Vec2::new(self.column as f32, self.row as f32)
    }

    /// Shortest signed column offset from `self` to `other` on a wrapping world.
    #[must_use]
    pub fn column_offset(self, other: CellCoord, width: u32) -> i32 {
        if width == 0 {
            return 0;
        }
        let width = i64::from(width);
        let mut delta = (i64::from(other.column) - i64::from(self.column)).rem_euclid(width);
        if delta > width / 2 {
            delta -= width;
        }
        delta as i32
    }

    /// Chebyshev distance on a world that wraps horizontally.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord, width: u32) -> u32 {
        let dx = self.column_offset(other, width).unsigned_abs();
        let dy = self.row.abs_diff(other.row);
        dx.max(dy)
    }
}

/// Unique identifier assigned to each automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AutomatonId(u32);

impl AutomatonId {
    /// Creates a new automaton identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to each rock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RockId(u32);

impl RockId {
    /// Creates a new rock identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to each corpse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorpseId(u32);

impl CorpseId {
    /// Creates a new corpse identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Whether the simulation advances when driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Ticks execute normally.
    Running,
    /// Ticks are suppressed until resumed.
    Paused,
}

/// Why an automaton left the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Energy dropped to zero.
    Starvation,
    /// Eaten by another automaton.
    Predation,
    /// Crushed by a falling rock.
    Rock,
}

/// How an automaton entered the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnOrigin {
    /// Placed by population seeding or an adapter.
    Seeded,
    /// Produced by reproduction.
    Born,
}

/// Lifecycle phase of a rock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RockState {
    /// Accelerating downward.
    Falling,
    /// Resting on the column's stack as a static blocker.
    Landed,
}

/// Static entity occupying a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Blocker {
    /// A landed rock.
    Rock(RockId),
    /// An uneaten corpse.
    Corpse(CorpseId),
}

/// Initial state for an automaton about to be created.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutomatonSeed {
    /// Species letter.
    pub species: Species,
    /// Gender used for pairing.
    pub gender: Gender,
    /// Continuous position; the world clamps it onto legal ground.
    pub position: Vec2,
    /// Initial velocity.
    pub velocity: Vec2,
    /// Initial energy, clamped by the world.
    pub energy: f32,
    /// Body weight, fixed for life.
    pub weight: f32,
}

/// Outcome of integrating one automaton for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// Position after collision resolution.
    pub position: Vec2,
    /// Velocity carried into the next tick.
    pub velocity: Vec2,
    /// Energy after movement costs and feeding.
    pub energy: f32,
    /// Seconds spent without changing cell.
    pub stagnant_seconds: f32,
    /// Whether the motion was a jump.
    pub jumped: bool,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Pauses or resumes ticking.
    SetRunState {
        /// Requested state.
        state: RunState,
    },
    /// Changes the tick rate; the world clamps it into the configured limits.
    SetTickRate {
        /// Requested ticks per wall-clock second.
        cycles_per_second: u32,
    },
    /// Sets the population range used on every recycle.
    SetSpawnRange {
        /// Smallest population.
        min: u32,
        /// Largest population.
        max: u32,
    },
    /// Discards every entity and regenerates terrain and the life field.
    Recycle,
    /// Advances the Game-of-Life overlay by one generation.
    StepLifeField,
    /// Advances the clock and every automaton's age.
    Tick {
        /// Simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Creates an automaton.
    SpawnAutomaton {
        /// Initial state of the automaton.
        seed: AutomatonSeed,
    },
    /// Applies the integrated motion of an automaton.
    MoveAutomaton {
        /// Automaton being moved.
        automaton: AutomatonId,
        /// Integrated state to apply.
        motion: Motion,
    },
    /// Removes the surface cell of a column in front of a tunneler.
    TunnelTerrain {
        /// Automaton digging.
        automaton: AutomatonId,
        /// Column whose surface moves down.
        column: u32,
    },
    /// Resolves an attack in which `predator` eats `prey`.
    Devour {
        /// Automaton that eats.
        predator: AutomatonId,
        /// Automaton that is eaten.
        prey: AutomatonId,
    },
    /// Creates an offspring and charges its parents.
    Reproduce {
        /// One or two parents; the first parent's cell hosts the offspring.
        parents: Vec<AutomatonId>,
        /// Energy charged to every parent.
        energy_cost: f32,
        /// Initial state of the offspring.
        offspring: AutomatonSeed,
    },
    /// Advances an automaton's species by the configured evolution shift.
    Evolve {
        /// Automaton evolving.
        automaton: AutomatonId,
    },
    /// Creates a falling rock.
    SpawnRock {
        /// Cell where the rock appears.
        cell: CellCoord,
        /// Bomber that released the rock, if any.
        dropped_by: Option<AutomatonId>,
        /// Energy charged to the dropper.
        energy_cost: f32,
    },
    /// Applies one tick of free fall to a rock.
    MoveRock {
        /// Rock moving.
        rock: RockId,
        /// New vertical position.
        y: f32,
        /// New vertical velocity.
        velocity_y: f32,
    },
    /// Rests a falling rock on top of its column's stack as a static blocker.
    LandRock {
        /// Rock landing.
        rock: RockId,
    },
    /// Applies a rock impact to an automaton.
    StrikeAutomaton {
        /// Rock that struck.
        rock: RockId,
        /// Automaton hit.
        victim: AutomatonId,
        /// Kinetic energy delivered.
        impact: f32,
        /// Whether the impact kills outright.
        lethal: bool,
    },
    /// Turns an expired landed rock into terrain.
    DecayRock {
        /// Rock decaying.
        rock: RockId,
    },
    /// Places a corpse.
    SpawnCorpse {
        /// Cell for the corpse.
        cell: CellCoord,
    },
    /// Feeds a corpse to a scavenger.
    ScavengeCorpse {
        /// Automaton eating.
        scavenger: AutomatonId,
        /// Corpse eaten.
        corpse: CorpseId,
    },
    /// Turns an expired corpse into terrain.
    DecayCorpse {
        /// Corpse decaying.
        corpse: CorpseId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The simulation clock advanced.
    TimeAdvanced {
        /// Simulated time that elapsed in the tick.
        dt: Duration,
        /// Day index after advancing.
        day: u32,
    },
    /// A new day started during the last tick.
    DayBegan {
        /// Index of the day that began.
        day: u32,
    },
    /// The run state changed.
    RunStateChanged {
        /// State now in effect.
        state: RunState,
    },
    /// The tick rate changed.
    TickRateChanged {
        /// Clamped rate now in effect.
        cycles_per_second: u32,
    },
    /// The population range changed.
    SpawnRangeChanged {
        /// Smallest population.
        min: u32,
        /// Largest population.
        max: u32,
    },
    /// Every entity was discarded and the world regenerated.
    WorldRecycled,
    /// The Game-of-Life overlay advanced one generation.
    LifeFieldStepped {
        /// Generations since the last recycle.
        generation: u64,
    },
    /// An automaton entered the world.
    AutomatonSpawned {
        /// Identifier assigned by the world.
        automaton: AutomatonId,
        /// Species of the new automaton.
        species: Species,
        /// Cell it occupies.
        cell: CellCoord,
        /// How it was created.
        origin: SpawnOrigin,
    },
    /// An automaton changed cells.
    AutomatonMoved {
        /// Automaton that moved.
        automaton: AutomatonId,
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// A lander jumped over a terrain step.
    AutomatonJumped {
        /// Automaton that jumped.
        automaton: AutomatonId,
        /// Landing cell.
        to: CellCoord,
    },
    /// An automaton died and left the world.
    AutomatonDied {
        /// Automaton that died.
        automaton: AutomatonId,
        /// Its species at death.
        species: Species,
        /// Cell it occupied.
        cell: CellCoord,
        /// Why it died.
        cause: DeathCause,
    },
    /// An automaton's species advanced.
    AutomatonEvolved {
        /// Automaton that evolved.
        automaton: AutomatonId,
        /// Previous species.
        from: Species,
        /// New species.
        to: Species,
    },
    /// Parents produced an offspring.
    Reproduced {
        /// Parents charged for the offspring.
        parents: Vec<AutomatonId>,
        /// Newly created automaton.
        offspring: AutomatonId,
    },
    /// A predator ate its prey.
    PreyDevoured {
        /// Automaton that ate.
        predator: AutomatonId,
        /// Automaton that was eaten.
        prey: AutomatonId,
    },
    /// A column's surface moved one row down.
    TerrainTunneled {
        /// Column affected.
        column: u32,
        /// New surface row.
        surface: u32,
    },
    /// A column's surface moved one row up.
    TerrainRaised {
        /// Column affected.
        column: u32,
        /// New surface row.
        surface: u32,
    },
    /// A rock started falling.
    RockDropped {
        /// Rock created.
        rock: RockId,
        /// Cell where it appeared.
        cell: CellCoord,
    },
    /// A rock struck an automaton.
    RockStruck {
        /// Rock that struck.
        rock: RockId,
        /// Automaton hit.
        victim: AutomatonId,
        /// Kinetic energy delivered.
        impact: f32,
    },
    /// A rock came to rest.
    RockLanded {
        /// Rock that landed.
        rock: RockId,
        /// Cell it rests in.
        cell: CellCoord,
    },
    /// A landed rock turned into terrain.
    RockDecayed {
        /// Rock removed.
        rock: RockId,
        /// Cell it occupied.
        cell: CellCoord,
    },
    /// A corpse appeared.
    CorpseCreated {
        /// Corpse created.
        corpse: CorpseId,
        /// Cell it occupies.
        cell: CellCoord,
    },
    /// A scavenger ate a corpse.
    CorpseConsumed {
        /// Corpse removed.
        corpse: CorpseId,
        /// Automaton that ate it.
        scavenger: AutomatonId,
    },
    /// A corpse turned into terrain.
    CorpseDecayed {
        /// Corpse removed.
        corpse: CorpseId,
        /// Cell it occupied.
        cell: CellCoord,
    },
}

/// Read-only view of the terrain surface.
#[derive(Clone, Copy, Debug)]
pub struct TerrainView<'a> {
    surface: &'a [u32],
    height: u32,
}

impl<'a> TerrainView<'a> {
    /// Wraps a per-column surface slice.
    #[must_use]
    pub const fn new(surface: &'a [u32], height: u32) -> Self {
        Self { surface, height }
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.surface.len() as u32
    }

    /// Number of rows in the world.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Per-column surface rows.
    #[must_use]
    pub const fn rows(&self) -> &'a [u32] {
        self.surface
    }

    /// Topmost solid row of the column; columns wrap.
    #[must_use]
    pub fn surface_at(&self, column: u32) -> u32 {
        let index = wrap_column(i64::from(column), self.width()) as usize;
        self.surface.get(index).copied().unwrap_or(self.height)
    }

    /// Lowest open row of the column.
    #[must_use]
    pub fn air_boundary(&self, column: u32) -> u32 {
        self.surface_at(column).saturating_sub(1)
    }

    /// Whether the cell lies inside the ground.
    #[must_use]
    pub fn is_solid(&self, cell: CellCoord) -> bool {
        cell.row() >= self.surface_at(cell.column())
    }
}

/// Read-only view of the Game-of-Life overlay.
#[derive(Clone, Copy, Debug)]
pub struct LifeFieldView<'a> {
    cells: &'a [bool],
    width: u32,
    height: u32,
}

impl<'a> LifeFieldView<'a> {
    /// Wraps a row-major grid of cells.
    #[must_use]
    pub const fn new(cells: &'a [bool], width: u32, height: u32) -> Self {
        Self {
            cells,
            width,
            height,
        }
    }

    /// Whether the cell is alive; out-of-range rows are dead.
    #[must_use]
    pub fn is_alive(&self, column: u32, row: u32) -> bool {
        if row >= self.height || self.width == 0 {
            return false;
        }
        let column = column % self.width;
        let index = row as usize * self.width as usize + column as usize;
        self.cells.get(index).copied().unwrap_or(false)
    }

    /// Live cells among the eight neighbours, wrapping horizontally.
    #[must_use]
    pub fn neighbor_count(&self, cell: CellCoord) -> u8 {
        let mut count = 0;
        for dy in -1_i64..=1 {
            let row = i64::from(cell.row()) + dy;
            if row < 0 || row >= i64::from(self.height) {
                continue;
            }
            for dx in -1_i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let column = wrap_column(i64::from(cell.column()) + dx, self.width);
                if self.is_alive(column, row as u32) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Number of live cells in the grid.
    #[must_use]
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|alive| **alive).count()
    }
}

/// Static rocks and corpses keyed by the cell they occupy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockerView {
    cells: BTreeMap<CellCoord, Blocker>,
}

impl BlockerView {
    /// Builds the view from cell/blocker pairs.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (CellCoord, Blocker)>) -> Self {
        Self {
            cells: entries.into_iter().collect(),
        }
    }

    /// Whether a static entity occupies the cell.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        self.cells.contains_key(&cell)
    }

    /// Static entity occupying the cell, if any.
    #[must_use]
    pub fn blocker(&self, cell: CellCoord) -> Option<Blocker> {
        self.cells.get(&cell).copied()
    }

    /// Iterates every blocked cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, Blocker)> + '_ {
        self.cells.iter().map(|(cell, blocker)| (*cell, *blocker))
    }

    /// Number of blocked cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no cell is blocked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Top of the column's stack: the lowest free cell above ground and blockers.
    #[must_use]
    pub fn resting_cell(&self, terrain: &TerrainView<'_>, column: u32) -> Option<CellCoord> {
        let mut row = terrain.surface_at(column).checked_sub(1)?;
        while self.is_blocked(CellCoord::new(column, row)) {
            row = row.checked_sub(1)?;
        }
        Some(CellCoord::new(column, row))
    }
}

/// Immutable representation of a single automaton's state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutomatonSnapshot {
    /// Identifier allocated by the world.
    pub id: AutomatonId,
    /// Current species letter.
    pub species: Species,
    /// Gender used for pairing.
    pub gender: Gender,
    /// Continuous position.
    pub position: Vec2,
    /// Velocity carried between ticks.
    pub velocity: Vec2,
    /// Cell obtained by rounding the position.
    pub cell: CellCoord,
    /// Remaining energy.
    pub energy: f32,
    /// Body weight fixed at creation.
    pub weight: f32,
    /// Simulated seconds since creation.
    pub age_seconds: f64,
    /// Day index at creation.
    pub born_day: u32,
    /// Day of the last reproduction, if any.
    pub last_reproduction_day: Option<u32>,
    /// Day of the last jump, if any.
    pub last_jump_day: Option<u32>,
    /// Evolution steps applied so far.
    pub evolutions: u32,
    /// Seconds spent without changing cell.
    pub stagnant_seconds: f32,
}

impl AutomatonSnapshot {
    /// Body plan implied by the species letter.
    #[must_use]
    pub const fn morphology(&self) -> Morphology {
        self.species.morphology()
    }

    /// Food-chain rank implied by the species letter.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        self.species.rank()
    }

    /// Age expressed in days.
    #[must_use]
    pub fn age_days(&self, day_length: f64) -> f64 {
        if day_length > 0.0 {
            self.age_seconds / day_length
        } else {
            0.0
        }
    }

    /// Whether `other` is a distinct same-species partner of the opposite gender.
    #[must_use]
    pub fn is_mate_of(&self, other: &AutomatonSnapshot) -> bool {
        self.id != other.id
            && self.species == other.species
            && !self.species.is_asexual()
            && self.gender == other.gender.opposite()
    }

    /// Rows between the automaton and the surface of its column.
    #[must_use]
    pub fn altitude(&self, terrain: &TerrainView<'_>) -> f32 {
        terrain.surface_at(self.cell.column()) as f32 - self.position.y
    }
}

/// Automaton sharing a neighbourhood with an observer.
#[derive(Clone, Copy, Debug)]
pub struct Neighbor<'a> {
    /// State of the neighbour.
    pub snapshot: &'a AutomatonSnapshot,
    /// Shortest column offset from the observer.
    pub dx: i32,
    /// Row offset from the observer; positive is below.
    pub dy: i32,
}

impl Neighbor<'_> {
    /// Chebyshev distance from the observer.
    #[must_use]
    pub fn distance(&self) -> u32 {
        self.dx.unsigned_abs().max(self.dy.unsigned_abs())
    }
}

/// Read-only view of every living automaton, ordered by identifier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomatonView {
    snapshots: Vec<AutomatonSnapshot>,
}

impl AutomatonView {
    /// Creates a view from the provided snapshots, sorting them by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AutomatonSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterates over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &AutomatonSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by identifier.
    #[must_use]
    pub fn get(&self, id: AutomatonId) -> Option<&AutomatonSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Number of automata in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Spatial index answering "who is near this cell" over an [`AutomatonView`].
#[derive(Debug)]
pub struct CellIndex<'a> {
    view: &'a AutomatonView,
    cells: HashMap<CellCoord, Vec<usize>>,
    width: u32,
    height: u32,
}

impl<'a> CellIndex<'a> {
    /// Indexes the view for a world of the provided dimensions.
    #[must_use]
    pub fn new(view: &'a AutomatonView, width: u32, height: u32) -> Self {
        let mut cells: HashMap<CellCoord, Vec<usize>> = HashMap::new();
        for (index, snapshot) in view.snapshots.iter().enumerate() {
            cells.entry(snapshot.cell).or_default().push(index);
        }
        Self {
            view,
            cells,
            width,
            height,
        }
    }

    /// Automata occupying the cell, in identifier order.
    pub fn at(&self, cell: CellCoord) -> impl Iterator<Item = &'a AutomatonSnapshot> + '_ {
        let view = self.view;
        self.cells
            .get(&cell)
            .into_iter()
            .flatten()
            .filter_map(move |index| view.snapshots.get(*index))
    }

    /// Whether any automaton occupies the cell.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.cells.contains_key(&cell)
    }

    /// Automata within `radius` of `origin`, the origin cell included.
    ///
    /// Results are ordered by row offset, then column offset, then identifier,
    /// so callers that draw random numbers per neighbour stay deterministic.
    #[must_use]
    pub fn within(&self, origin: CellCoord, radius: u32) -> Vec<Neighbor<'a>> {
        let mut found = Vec::new();
        let radius = i64::from(radius);
        let mut columns: Vec<(i32, u32)> = Vec::new();
        for dx in -radius..=radius {
            let column = wrap_column(i64::from(origin.column()) + dx, self.width);
            if columns.iter().all(|(_, seen)| *seen != column) {
                columns.push((dx as i32, column));
            }
        }
        for dy in -radius..=radius {
            let row = i64::from(origin.row()) + dy;
            if row < 0 || row >= i64::from(self.height) {
                continue;
            }
            for (dx, column) in &columns {
                for snapshot in self.at(CellCoord::new(*column, row as u32)) {
                    found.push(Neighbor {
                        snapshot,
                        dx: *dx,
                        dy: dy as i32,
                    });
                }
            }
        }
        found
    }
}

/// Immutable representation of a single rock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RockSnapshot {
    /// Identifier allocated by the world.
    pub id: RockId,
    /// Continuous position; the column never changes.
    pub position: Vec2,
    /// Downward velocity.
    pub velocity_y: f32,
    /// Falling or landed.
    pub state: RockState,
    /// Cell obtained by rounding the position.
    pub cell: CellCoord,
    /// Simulated time at which the rock landed.
    pub landed_at: Option<f64>,
    /// Bomber that released the rock.
    pub dropped_by: Option<AutomatonId>,
}

/// Read-only view of every rock, ordered by identifier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RockView {
    snapshots: Vec<RockSnapshot>,
}

impl RockView {
    /// Creates a view from the provided snapshots, sorting them by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<RockSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterates over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &RockSnapshot> {
        self.snapshots.iter()
    }

    /// Number of rocks in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a single corpse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorpseSnapshot {
    /// Identifier allocated by the world.
    pub id: CorpseId,
    /// Cell the corpse occupies.
    pub cell: CellCoord,
    /// Simulated time at which the corpse appeared.
    pub created_at: f64,
}

/// Read-only view of every corpse, ordered by identifier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpseView {
    snapshots: Vec<CorpseSnapshot>,
}

impl CorpseView {
    /// Creates a view from the provided snapshots, sorting them by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CorpseSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterates over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &CorpseSnapshot> {
        self.snapshots.iter()
    }

    /// Number of corpses in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Clock state captured between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// Simulated seconds since the last recycle.
    pub elapsed_seconds: f64,
    /// Day index.
    pub day: u32,
    /// Whether the sun is up.
    pub daylight: bool,
    /// Seconds in a full day.
    pub day_length: f64,
}

/// Running statistics over the current world.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    /// Living automata.
    pub population: usize,
    /// Living landers.
    pub landers: usize,
    /// Living flyers.
    pub flyers: usize,
    /// Mean energy of the living population.
    pub average_energy: f32,
    /// Automata created by seeding.
    pub spawned: u64,
    /// Automata created by reproduction.
    pub born: u64,
    /// Deaths from starvation.
    pub starved: u64,
    /// Deaths from predation.
    pub eaten: u64,
    /// Deaths from rock impacts.
    pub crushed: u64,
    /// Cell changes since the last recycle.
    pub moves_total: u64,
    /// Mean daily moves over the last three days.
    pub moves_avg_3: f32,
    /// Mean daily moves over the last seven days.
    pub moves_avg_7: f32,
    /// Mean daily moves over the last fourteen days.
    pub moves_avg_14: f32,
    /// Current day index.
    pub day: u32,
}

impl StatsReport {
    /// Deaths from every cause.
    #[must_use]
    pub const fn deaths(&self) -> u64 {
        self.starved + self.eaten + self.crushed
    }
}

/// Read-only picture of the whole world handed to adapters between ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Surface row per column.
    pub terrain: Vec<u32>,
    /// Row-major Game-of-Life cells.
    pub life: Vec<bool>,
    /// Living automata.
    pub automata: AutomatonView,
    /// Falling and landed rocks.
    pub rocks: RockView,
    /// Uneaten corpses.
    pub corpses: CorpseView,
    /// Clock state.
    pub clock: ClockSnapshot,
    /// Whether ticks execute.
    pub run_state: RunState,
    /// Ticks per wall-clock second.
    pub tick_rate: u32,
    /// Ticks executed since the last recycle.
    pub tick: u64,
    /// Running statistics.
    pub stats: StatsReport,
}

#[cfg(test)]
mod tests {
    use super::{
        wrap_column, wrap_x, AutomatonId, AutomatonSnapshot, AutomatonView, Blocker,
        BlockerView, CellCoord, CellIndex, CorpseId, Gender, LifeFieldView, RockId, Species,
        StatsReport, TerrainView,
    };
    use glam::Vec2;
    use serde::{de::DeserializeOwned, Serialize};

    fn automaton(id: u32, species: Species, gender: Gender, cell: CellCoord) -> AutomatonSnapshot {
        AutomatonSnapshot {
            id: AutomatonId::new(id),
            species,
            gender,
            position: cell.to_position(),
            velocity: Vec2::ZERO,
            cell,
            energy: 50.0,
            weight: 50.0,
            age_seconds: 0.0,
            born_day: 0,
            last_reproduction_day: None,
            last_jump_day: None,
            evolutions: 0,
            stagnant_seconds: 0.0,
        }
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn columns_wrap_in_both_directions() {
        assert_eq!(wrap_column(-1, 80), 79);
        assert_eq!(wrap_column(80, 80), 0);
        assert_eq!(wrap_x(-0.5, 80), 79.5);
        assert!(wrap_x(-1.0e-9, 80) < 80.0);
    }

    #[test]
    fn positions_round_to_wrapped_clamped_cells() {
        let cell = CellCoord::from_position(Vec2::new(79.6, -3.0), 80, 24);
        assert_eq!(cell, CellCoord::new(0, 0));
        let cell = CellCoord::from_position(Vec2::new(10.2, 40.0), 80, 24);
        assert_eq!(cell, CellCoord::new(10, 23));
    }

    #[test]
    fn chebyshev_distance_wraps_horizontally() {
        let left = CellCoord::new(0, 5);
        let right = CellCoord::new(79, 6);
        assert_eq!(left.column_offset(right, 80), -1);
        assert_eq!(left.chebyshev_distance(right, 80), 1);
        assert_eq!(left.chebyshev_distance(CellCoord::new(3, 5), 80), 3);
    }

    #[test]
    fn terrain_view_reports_solid_cells() {
        let surface = [20, 19, 21];
        let terrain = TerrainView::new(&surface, 24);
        assert_eq!(terrain.air_boundary(1), 18);
        assert!(terrain.is_solid(CellCoord::new(0, 20)));
        assert!(!terrain.is_solid(CellCoord::new(0, 19)));
        assert_eq!(terrain.surface_at(3), 20);
    }

    #[test]
    fn life_neighbor_count_wraps_columns_but_not_rows() {
        let width = 4;
        let height = 3;
        let mut cells = vec![false; (width * height) as usize];
        cells[3] = true;
        cells[4] = true;
        let view = LifeFieldView::new(&cells, width, height);
        assert_eq!(view.neighbor_count(CellCoord::new(0, 0)), 2);
        assert_eq!(view.neighbor_count(CellCoord::new(2, 2)), 0);
        assert_eq!(view.population(), 2);
    }

    #[test]
    fn resting_cell_stacks_on_blockers() {
        let surface = [10, 10];
        let terrain = TerrainView::new(&surface, 12);
        let blockers = BlockerView::from_entries([
            (CellCoord::new(0, 9), Blocker::Rock(RockId::new(1))),
            (CellCoord::new(0, 8), Blocker::Corpse(CorpseId::new(2))),
        ]);
        assert_eq!(
            blockers.resting_cell(&terrain, 0),
            Some(CellCoord::new(0, 7))
        );
        assert_eq!(
            blockers.resting_cell(&terrain, 1),
            Some(CellCoord::new(1, 9))
        );
    }

    #[test]
    fn automaton_view_sorts_and_finds_by_id() {
        let view = AutomatonView::from_snapshots(vec![
            automaton(7, Species::A, Gender::Male, CellCoord::new(1, 1)),
            automaton(3, Species::B, Gender::Female, CellCoord::new(2, 1)),
        ]);
        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![3, 7]);
        assert_eq!(
            view.get(AutomatonId::new(7)).map(|snapshot| snapshot.species),
            Some(Species::A)
        );
        assert!(view.get(AutomatonId::new(5)).is_none());
    }

    #[test]
    fn mates_share_species_and_differ_in_gender() {
        let female = automaton(1, Species::A, Gender::Female, CellCoord::new(1, 1));
        let male = automaton(2, Species::A, Gender::Male, CellCoord::new(1, 1));
        let rival = automaton(3, Species::A, Gender::Female, CellCoord::new(1, 1));
        let z_one = automaton(4, Species::Z, Gender::Female, CellCoord::new(1, 1));
        let z_two = automaton(5, Species::Z, Gender::Male, CellCoord::new(1, 1));
        assert!(female.is_mate_of(&male));
        assert!(!female.is_mate_of(&rival));
        assert!(!z_one.is_mate_of(&z_two));
    }

    #[test]
    fn cell_index_orders_neighbors_deterministically() {
        let view = AutomatonView::from_snapshots(vec![
            automaton(1, Species::A, Gender::Male, CellCoord::new(0, 5)),
            automaton(2, Species::B, Gender::Male, CellCoord::new(79, 4)),
            automaton(3, Species::C, Gender::Male, CellCoord::new(2, 5)),
            automaton(4, Species::D, Gender::Male, CellCoord::new(3, 5)),
        ]);
        let index = CellIndex::new(&view, 80, 24);
        let found: Vec<(u32, i32, i32)> = index
            .within(CellCoord::new(0, 5), 2)
            .iter()
            .map(|neighbor| (neighbor.snapshot.id.get(), neighbor.dx, neighbor.dy))
            .collect();
        assert_eq!(found, vec![(2, -1, -1), (1, 0, 0), (3, 2, 0)]);
    }

    #[test]
    fn automaton_snapshot_round_trips_through_bincode() {
        assert_round_trip(&automaton(
            9,
            Species::Z,
            Gender::Female,
            CellCoord::new(4, 2),
        ));
    }

    #[test]
    fn stats_report_round_trips_through_bincode() {
        let report = StatsReport {
            population: 3,
            starved: 2,
            eaten: 1,
            crushed: 4,
            ..StatsReport::default()
        };
        assert_eq!(report.deaths(), 7);
        assert_round_trip(&report);
    }
}
