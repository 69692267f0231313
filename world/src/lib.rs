#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Conways Physics.

mod clock;
mod life;
mod store;
mod terrain;

use conways_physics_core::{
    labeled_rng, wrap_x, AutomatonId, AutomatonSeed, CellCoord, Command, ConfigError, DeathCause,
    Event, Morphology, Motion, RockState, RunState, SimulationConfig, SpawnOrigin,
};
use glam::Vec2;
use rand_chacha::ChaCha8Rng;

use clock::DayNightClock;
use life::LifeField;
use store::{Automaton, EntityStore};
use terrain::Terrain;

const WORLD_RNG_STREAM: &str = "world";

/// Represents the authoritative Conways Physics world state.
#[derive(Debug)]
pub struct World {
    config: SimulationConfig,
    rng: ChaCha8Rng,
    terrain: Terrain,
    clock: DayNightClock,
    life: LifeField,
    store: EntityStore,
    run_state: RunState,
    tick_rate: u32,
    spawn_range: Option<(u32, u32)>,
    tick_index: u64,
}

impl World {
    /// Creates a paused world with fresh terrain and life field and no automata.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = labeled_rng(config.seed, WORLD_RNG_STREAM);
        let terrain = Terrain::generate(&config.world, &mut rng);
        let mut life = LifeField::new(config.world.width, config.world.height);
        life.seed(&mut rng, config.life.initial_density);
        let clock = DayNightClock::new(config.time.day_length, config.time.daylight);
        let tick_rate = config.clamp_tick_rate(config.time.default_tick_rate);

        Ok(Self {
            rng,
            terrain,
            clock,
            life,
            store: EntityStore::default(),
            run_state: RunState::Paused,
            tick_rate,
            spawn_range: None,
            tick_index: 0,
            config,
        })
    }

    fn width(&self) -> u32 {
        self.config.world.width
    }

    fn height(&self) -> u32 {
        self.config.world.height
    }

    fn regenerate(&mut self) {
        self.terrain = Terrain::generate(&self.config.world, &mut self.rng);
        self.life.seed(&mut self.rng, self.config.life.initial_density);
        self.store.clear();
        self.clock.reset();
        self.tick_index = 0;
    }

    /// Lowest row an entity can rest on in the column, on top of any stack.
    fn ground_row(&self, column: u32) -> u32 {
        let air_boundary = self.terrain.air_boundary(column);
        self.store
            .resting_row(column, air_boundary)
            .unwrap_or(air_boundary)
    }

    /// Wraps `x` and keeps the position on or above the ground.
    fn place(&self, morphology: Morphology, position: Vec2) -> Vec2 {
        let x = if position.x.is_finite() {
            wrap_x(position.x, self.width())
        } else {
            0.0
        };
        let column = CellCoord::from_position(Vec2::new(x, 0.0), self.width(), self.height()).column();
        let ground = self.ground_row(column) as f32;
        let y = match morphology {
            Morphology::Lander => ground,
            Morphology::Flyer if position.y.is_finite() => position.y.clamp(0.0, ground),
            Morphology::Flyer => ground,
        };
        Vec2::new(x, y)
    }

    fn spawn(&mut self, seed: AutomatonSeed, origin: SpawnOrigin, out_events: &mut Vec<Event>) -> AutomatonId {
        let id = self.store.allocate_automaton_id();
        let position = self.place(seed.species.morphology(), seed.position);
        let velocity = if seed.velocity.is_finite() {
            seed.velocity
        } else {
            Vec2::ZERO
        };
        let automaton = Automaton {
            id,
            species: seed.species,
            gender: seed.gender,
            position,
            velocity,
            energy: seed.energy.clamp(0.0, self.config.energy.max),
            weight: seed.weight,
            age_seconds: 0.0,
            born_day: self.clock.current_day(),
            last_reproduction_day: None,
            last_jump_day: None,
            evolutions: 0,
            stagnant_seconds: 0.0,
        };
        let cell = automaton.cell(self.width(), self.height());
        let _ = self.store.automata.insert(id, automaton);
        out_events.push(Event::AutomatonSpawned {
            automaton: id,
            species: seed.species,
            cell,
            origin,
        });
        id
    }

    fn kill(&mut self, id: AutomatonId, cause: DeathCause, out_events: &mut Vec<Event>) {
        let (width, height) = (self.width(), self.height());
        let Some(dead) = self.store.automata.remove(&id) else {
            return;
        };
        let cell = dead.cell(width, height);
        out_events.push(Event::AutomatonDied {
            automaton: id,
            species: dead.species,
            cell,
            cause,
        });

        let leaves_corpse = match dead.species.morphology() {
            Morphology::Lander => true,
            Morphology::Flyer => self.config.corpses.flyer_corpses,
        };
        if !leaves_corpse {
            return;
        }
        let air_boundary = self.terrain.air_boundary(cell.column());
        if let Some(row) = self.store.resting_row(cell.column(), air_boundary) {
            let corpse_cell = CellCoord::new(cell.column(), row);
            let corpse = self.store.insert_corpse(corpse_cell, self.clock.elapsed());
            out_events.push(Event::CorpseCreated {
                corpse,
                cell: corpse_cell,
            });
            self.lift_occupants(cell.column());
        }
    }

    /// Re-places every automaton in `column` after its ground changed.
    ///
    /// Landers end up on top of the stack again and flyers are pushed out of
    /// any blocker that appeared under them. No move events are emitted.
    fn lift_occupants(&mut self, column: u32) {
        let (width, height) = (self.width(), self.height());
        let occupants: Vec<(AutomatonId, Morphology, Vec2)> = self
            .store
            .automata
            .values()
            .filter(|automaton| automaton.cell(width, height).column() == column)
            .map(|automaton| {
                (
                    automaton.id,
                    automaton.species.morphology(),
                    automaton.position,
                )
            })
            .collect();
        for (id, morphology, position) in occupants {
            let placed = self.place(morphology, position);
            if let Some(automaton) = self.store.automata.get_mut(&id) {
                automaton.position = placed;
            }
        }
    }

    fn feed(&mut self, id: AutomatonId, amount: f32) {
        let max = self.config.energy.max;
        if let Some(automaton) = self.store.automata.get_mut(&id) {
            automaton.energy = (automaton.energy + amount).clamp(0.0, max);
        }
    }

    /// Charges energy, removing the automaton when it runs dry.
    fn charge(&mut self, id: AutomatonId, amount: f32, cause: DeathCause, out_events: &mut Vec<Event>) {
        let Some(automaton) = self.store.automata.get_mut(&id) else {
            return;
        };
        automaton.energy = (automaton.energy - amount).max(0.0);
        if automaton.energy <= 0.0 {
            self.kill(id, cause, out_events);
        }
    }

    fn raise_column(&mut self, column: u32, out_events: &mut Vec<Event>) {
        if let Some(surface) = self.terrain.raise(column) {
            out_events.push(Event::TerrainRaised { column, surface });
        }
        self.store
            .settle_column(column, self.terrain.air_boundary(column));
        self.lift_occupants(column);
    }

    fn apply_motion(&mut self, id: AutomatonId, motion: Motion, out_events: &mut Vec<Event>) {
        let (width, height) = (self.width(), self.height());
        let max = self.config.energy.max;
        let day = self.clock.current_day();
        let Some(morphology) = self
            .store
            .automata
            .get(&id)
            .map(|automaton| automaton.species.morphology())
        else {
            return;
        };
        let position = self.place(morphology, motion.position);
        let Some(automaton) = self.store.automata.get_mut(&id) else {
            return;
        };

        let from = automaton.cell(width, height);
        automaton.position = position;
        automaton.velocity = if motion.velocity.is_finite() {
            motion.velocity
        } else {
            Vec2::ZERO
        };
        automaton.energy = motion.energy.clamp(0.0, max);
        automaton.stagnant_seconds = motion.stagnant_seconds.max(0.0);
        let to = automaton.cell(width, height);
        let starved = automaton.energy <= 0.0;
        if motion.jumped {
            automaton.last_jump_day = Some(day);
            out_events.push(Event::AutomatonJumped { automaton: id, to });
        }
        if from != to {
            out_events.push(Event::AutomatonMoved {
                automaton: id,
                from,
                to,
            });
        }
        if starved {
            self.kill(id, DeathCause::Starvation, out_events);
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetRunState { state } => {
            if world.run_state != state {
                world.run_state = state;
                out_events.push(Event::RunStateChanged { state });
            }
        }
        Command::SetTickRate { cycles_per_second } => {
            world.tick_rate = world.config.clamp_tick_rate(cycles_per_second);
            out_events.push(Event::TickRateChanged {
                cycles_per_second: world.tick_rate,
            });
        }
        Command::SetSpawnRange { min, max } => {
            if min <= max {
                world.spawn_range = Some((min, max));
                out_events.push(Event::SpawnRangeChanged { min, max });
            }
        }
        Command::Recycle => {
            world.regenerate();
            out_events.push(Event::WorldRecycled);
            if world.run_state != RunState::Paused {
                world.run_state = RunState::Paused;
                out_events.push(Event::RunStateChanged {
                    state: RunState::Paused,
                });
            }
        }
        Command::StepLifeField => {
            world.life.step();
            out_events.push(Event::LifeFieldStepped {
                generation: world.life.generation(),
            });
        }
        Command::Tick { dt } => {
            let seconds = dt.as_secs_f64();
            let previous_day = world.clock.current_day();
            world.clock.advance(seconds);
            for automaton in world.store.automata.values_mut() {
                automaton.age_seconds += seconds;
            }
            world.tick_index = world.tick_index.saturating_add(1);
            let day = world.clock.current_day();
            out_events.push(Event::TimeAdvanced { dt, day });
            if day > previous_day {
                out_events.push(Event::DayBegan { day });
            }
        }
        Command::SpawnAutomaton { seed } => {
            let _ = world.spawn(seed, SpawnOrigin::Seeded, out_events);
        }
        Command::MoveAutomaton { automaton, motion } => {
            world.apply_motion(automaton, motion, out_events);
        }
        Command::TunnelTerrain { automaton, column } => {
            if !world.store.automata.contains_key(&automaton) {
                return;
            }
            if let Some(surface) = world.terrain.eat(column) {
                out_events.push(Event::TerrainTunneled { column, surface });
                world
                    .store
                    .settle_column(column, world.terrain.air_boundary(column));
                world.lift_occupants(column);
            }
        }
        Command::Devour { predator, prey } => {
            if predator == prey
                || !world.store.automata.contains_key(&predator)
                || !world.store.automata.contains_key(&prey)
            {
                return;
            }
            out_events.push(Event::PreyDevoured { predator, prey });
            world.kill(prey, DeathCause::Predation, out_events);
            world.feed(predator, world.config.energy.meal);
        }
        Command::Reproduce {
            parents,
            energy_cost,
            offspring,
        } => {
            if parents.is_empty()
                || parents
                    .iter()
                    .any(|parent| !world.store.automata.contains_key(parent))
            {
                return;
            }
            let child = world.spawn(offspring, SpawnOrigin::Born, out_events);
            out_events.push(Event::Reproduced {
                parents: parents.clone(),
                offspring: child,
            });
            let day = world.clock.current_day();
            for parent in parents {
                if let Some(automaton) = world.store.automata.get_mut(&parent) {
                    automaton.last_reproduction_day = Some(day);
                }
                if energy_cost > 0.0 {
                    world.charge(parent, energy_cost, DeathCause::Starvation, out_events);
                }
            }
        }
        Command::Evolve { automaton } => {
            let shift = world.config.reproduction.evolution_shift;
            let Some(entry) = world.store.automata.get_mut(&automaton) else {
                return;
            };
            entry.evolutions += 1;
            let from = entry.species;
            if let Some(to) = from.shifted(shift) {
                entry.species = to;
                out_events.push(Event::AutomatonEvolved { automaton, from, to });
            }
        }
        Command::SpawnRock {
            cell,
            dropped_by,
            energy_cost,
        } => {
            let inside = cell.column() < world.width() && cell.row() < world.height();
            if !inside || world.terrain.view().is_solid(cell) || world.store.is_blocked(cell) {
                return;
            }
            let rock = world.store.insert_rock(cell, dropped_by);
            out_events.push(Event::RockDropped { rock, cell });
            if let Some(dropper) = dropped_by {
                world.charge(dropper, energy_cost, DeathCause::Starvation, out_events);
            }
        }
        Command::MoveRock { rock, y, velocity_y } => {
            let max_row = world.height().saturating_sub(1) as f32;
            if let Some(entry) = world.store.rocks.get_mut(&rock) {
                if entry.state == RockState::Falling && y.is_finite() {
                    entry.position.y = y.clamp(0.0, max_row);
                    entry.velocity_y = velocity_y;
                }
            }
        }
        Command::LandRock { rock } => {
            let Some(column) = world
                .store
                .rocks
                .get(&rock)
                .filter(|entry| entry.state == RockState::Falling)
                .map(|entry| entry.column())
            else {
                return;
            };
            let air_boundary = world.terrain.air_boundary(column);
            match world.store.resting_row(column, air_boundary) {
                Some(row) => {
                    let cell = CellCoord::new(column, row);
                    if world.store.land_rock(rock, cell, world.clock.elapsed()) {
                        out_events.push(Event::RockLanded { rock, cell });
                        world.lift_occupants(column);
                    }
                }
                None => {
                    let _ = world.store.remove_rock(rock, world.width(), world.height());
                }
            }
        }
        Command::StrikeAutomaton {
            rock,
            victim,
            impact,
            lethal,
        } => {
            if !world.store.automata.contains_key(&victim) {
                return;
            }
            out_events.push(Event::RockStruck {
                rock,
                victim,
                impact,
            });
            if lethal {
                world.kill(victim, DeathCause::Rock, out_events);
            } else {
                world.charge(victim, impact, DeathCause::Rock, out_events);
            }
        }
        Command::DecayRock { rock } => {
            let landed = world
                .store
                .rocks
                .get(&rock)
                .map_or(false, |entry| entry.state == RockState::Landed);
            if !landed {
                return;
            }
            let (width, height) = (world.width(), world.height());
            if let Some(removed) = world.store.remove_rock(rock, width, height) {
                let cell = CellCoord::from_position(removed.position, width, height);
                out_events.push(Event::RockDecayed { rock, cell });
                world.raise_column(cell.column(), out_events);
            }
        }
        Command::SpawnCorpse { cell } => {
            let inside = cell.column() < world.width() && cell.row() < world.height();
            if !inside || world.terrain.view().is_solid(cell) || world.store.is_blocked(cell) {
                return;
            }
            let corpse = world.store.insert_corpse(cell, world.clock.elapsed());
            out_events.push(Event::CorpseCreated { corpse, cell });
            world.lift_occupants(cell.column());
        }
        Command::ScavengeCorpse { scavenger, corpse } => {
            if !world.store.automata.contains_key(&scavenger) {
                return;
            }
            if let Some(removed) = world.store.remove_corpse(corpse) {
                let column = removed.cell.column();
                world
                    .store
                    .settle_column(column, world.terrain.air_boundary(column));
                world.lift_occupants(column);
                out_events.push(Event::CorpseConsumed { corpse, scavenger });
                let meal = world.config.energy.meal * world.config.corpses.scavenge_meals;
                world.feed(scavenger, meal);
            }
        }
        Command::DecayCorpse { corpse } => {
            if let Some(removed) = world.store.remove_corpse(corpse) {
                out_events.push(Event::CorpseDecayed {
                    corpse,
                    cell: removed.cell,
                });
                world.raise_column(removed.cell.column(), out_events);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use conways_physics_core::{
        AutomatonView, BlockerView, ClockSnapshot, CorpseView, LifeFieldView, RockView,
        RunState, SimulationConfig, TerrainView,
    };

    /// Configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Width and height of the world in cells.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.width(), world.height())
    }

    /// Read-only view of the terrain surface.
    #[must_use]
    pub fn terrain_view(world: &World) -> TerrainView<'_> {
        world.terrain.view()
    }

    /// Read-only view of the Game-of-Life overlay.
    #[must_use]
    pub fn life_view(world: &World) -> LifeFieldView<'_> {
        world.life.view()
    }

    /// Row-major copy-free access to the overlay cells.
    #[must_use]
    pub fn life_cells(world: &World) -> &[bool] {
        world.life.cells()
    }

    /// Captures a read-only view of every living automaton.
    #[must_use]
    pub fn automaton_view(world: &World) -> AutomatonView {
        let (width, height) = (world.width(), world.height());
        AutomatonView::from_snapshots(
            world
                .store
                .automata
                .values()
                .map(|automaton| automaton.snapshot(width, height))
                .collect(),
        )
    }

    /// Captures a read-only view of every rock.
    #[must_use]
    pub fn rock_view(world: &World) -> RockView {
        let (width, height) = (world.width(), world.height());
        RockView::from_snapshots(
            world
                .store
                .rocks
                .values()
                .map(|rock| rock.snapshot(width, height))
                .collect(),
        )
    }

    /// Captures a read-only view of every corpse.
    #[must_use]
    pub fn corpse_view(world: &World) -> CorpseView {
        CorpseView::from_snapshots(world.store.corpses.values().map(|corpse| corpse.snapshot()).collect())
    }

    /// Cells occupied by landed rocks and corpses.
    #[must_use]
    pub fn blocker_view(world: &World) -> BlockerView {
        world.store.blocker_view()
    }

    /// Clock state.
    #[must_use]
    pub fn clock(world: &World) -> ClockSnapshot {
        world.clock.snapshot()
    }

    /// Whether ticks currently execute.
    #[must_use]
    pub fn run_state(world: &World) -> RunState {
        world.run_state
    }

    /// Ticks per wall-clock second.
    #[must_use]
    pub fn tick_rate(world: &World) -> u32 {
        world.tick_rate
    }

    /// Population range set by the adapter, if any.
    #[must_use]
    pub fn spawn_range(world: &World) -> Option<(u32, u32)> {
        world.spawn_range
    }

    /// Ticks executed since the last recycle.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of living automata.
    #[must_use]
    pub fn population(world: &World) -> usize {
        world.store.automata.len()
    }
}
