#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Orchestrates the world and every system through the fixed tick order.
//!
//! Systems never talk to each other. Each phase queries fresh views from the
//! world, asks one system for commands and applies them before the next
//! phase runs, so later phases observe the outcome of earlier ones.

use std::time::Duration;

use conways_physics_core::{
    validate_spawn_range, Command, ConfigError, Event, RunState, SimulationConfig, StatsReport,
    WorldSnapshot,
};
use conways_physics_system_analytics::Analytics;
use conways_physics_system_corpses::Corpses;
use conways_physics_system_physics::Physics;
use conways_physics_system_predation::Predation;
use conways_physics_system_reproduction::Reproduction;
use conways_physics_system_rocks::Rocks;
use conways_physics_system_spawning::Spawning;
use conways_physics_world::{self as world, query, World};

/// Owns the world and the systems and exposes the control surface.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    physics: Physics,
    predation: Predation,
    reproduction: Reproduction,
    rocks: Rocks,
    corpses: Corpses,
    spawning: Spawning,
    analytics: Analytics,
    dt: Duration,
    life_interval: u64,
    auto_respawn: bool,
    backlog: Duration,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Simulation {
    /// Builds a paused simulation with freshly generated terrain and population.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let world = World::new(config.clone())?;
        let mut simulation = Self {
            physics: Physics::new(&config),
            predation: Predation::new(&config),
            reproduction: Reproduction::new(&config),
            rocks: Rocks::new(&config),
            corpses: Corpses::new(&config),
            spawning: Spawning::new(&config),
            analytics: Analytics::new(),
            dt: Duration::from_secs_f32(config.time.tick_seconds),
            life_interval: u64::from(config.life.step_interval_ticks),
            auto_respawn: config.population.auto_respawn,
            backlog: Duration::ZERO,
            events: Vec::new(),
            commands: Vec::new(),
            world,
        };
        simulation.recycle();
        Ok(simulation)
    }

    /// Stops ticking until [`Simulation::resume`] is called.
    pub fn pause(&mut self) {
        self.submit(Command::SetRunState {
            state: RunState::Paused,
        });
    }

    /// Lets [`Simulation::step`] and [`Simulation::advance`] execute ticks.
    pub fn resume(&mut self) {
        self.submit(Command::SetRunState {
            state: RunState::Running,
        });
    }

    /// Requests a tick rate and returns the clamped rate now in effect.
    pub fn set_tick_rate(&mut self, cycles_per_second: u32) -> u32 {
        self.submit(Command::SetTickRate { cycles_per_second });
        query::tick_rate(&self.world)
    }

    /// Sets the population range used by every later recycle.
    pub fn set_spawn_range(&mut self, min: u32, max: u32) -> Result<(), ConfigError> {
        validate_spawn_range(min, max)?;
        self.submit(Command::SetSpawnRange { min, max });
        Ok(())
    }

    /// Regenerates terrain and life field, reseeds the population and pauses.
    pub fn recycle(&mut self) {
        self.submit(Command::Recycle);
    }

    /// Applies an adapter command outside the tick order.
    ///
    /// A recycle, however it arrives, is answered with a new population.
    pub fn submit(&mut self, command: Command) {
        self.events.clear();
        self.dispatch(command);
        self.publish();
    }

    /// Runs exactly one tick; returns `false` without effect while paused.
    pub fn step(&mut self) -> bool {
        if query::run_state(&self.world) != RunState::Running {
            return false;
        }
        self.events.clear();
        let dt = self.dt;

        if self.life_interval > 0 && query::tick_index(&self.world) % self.life_interval == 0 {
            world::apply(&mut self.world, Command::StepLifeField, &mut self.events);
        }

        let mut commands = std::mem::take(&mut self.commands);
        {
            let automata = query::automaton_view(&self.world);
            let blockers = query::blocker_view(&self.world);
            self.physics.handle(
                &automata,
                query::terrain_view(&self.world),
                &blockers,
                query::life_view(&self.world),
                query::clock(&self.world),
                dt,
                &mut commands,
            );
        }
        apply_all(&mut self.world, &mut commands, &mut self.events);

        {
            let automata = query::automaton_view(&self.world);
            let blockers = query::blocker_view(&self.world);
            self.rocks.handle_fall(
                &query::rock_view(&self.world),
                &automata,
                query::terrain_view(&self.world),
                &blockers,
                dt,
                &mut commands,
            );
        }
        apply_all(&mut self.world, &mut commands, &mut self.events);

        {
            let automata = query::automaton_view(&self.world);
            let (width, height) = query::dimensions(&self.world);
            self.predation
                .handle(&automata, width, height, &mut commands);
        }
        apply_all(&mut self.world, &mut commands, &mut self.events);

        {
            let automata = query::automaton_view(&self.world);
            let blockers = query::blocker_view(&self.world);
            self.reproduction.handle(
                &automata,
                query::terrain_view(&self.world),
                &blockers,
                query::clock(&self.world),
                &mut commands,
            );
        }
        apply_all(&mut self.world, &mut commands, &mut self.events);

        {
            let automata = query::automaton_view(&self.world);
            let blockers = query::blocker_view(&self.world);
            self.rocks.handle_drops(
                &automata,
                query::terrain_view(&self.world),
                &blockers,
                &mut commands,
            );
        }
        apply_all(&mut self.world, &mut commands, &mut self.events);

        self.rocks.handle_decay(
            &query::rock_view(&self.world),
            query::clock(&self.world),
            dt,
            &mut commands,
        );
        apply_all(&mut self.world, &mut commands, &mut self.events);

        {
            let automata = query::automaton_view(&self.world);
            let (width, _) = query::dimensions(&self.world);
            self.corpses.handle(
                &query::corpse_view(&self.world),
                &automata,
                query::clock(&self.world),
                dt,
                width,
                &mut commands,
            );
        }
        apply_all(&mut self.world, &mut commands, &mut self.events);
        self.commands = commands;

        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        if self.auto_respawn && query::population(&self.world) == 0 {
            self.dispatch(Command::Recycle);
            self.dispatch(Command::SetRunState {
                state: RunState::Running,
            });
        }

        self.publish();
        true
    }

    /// Converts elapsed wall-clock time into ticks at the current rate.
    ///
    /// Returns the number of ticks executed. Time that passes while paused is
    /// discarded.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if query::run_state(&self.world) != RunState::Running {
            self.backlog = Duration::ZERO;
            return 0;
        }
        let rate = query::tick_rate(&self.world).max(1);
        let interval = Duration::from_secs(1) / rate;
        self.backlog = self.backlog.saturating_add(elapsed);

        let mut ticks = 0;
        while self.backlog >= interval {
            self.backlog -= interval;
            if !self.step() {
                self.backlog = Duration::ZERO;
                break;
            }
            ticks += 1;
        }
        ticks
    }

    /// Whether ticks currently execute.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        query::run_state(&self.world)
    }

    /// Ticks per wall-clock second.
    #[must_use]
    pub fn tick_rate(&self) -> u32 {
        query::tick_rate(&self.world)
    }

    /// Statistics as of the end of the last tick or command.
    #[must_use]
    pub fn stats(&self) -> StatsReport {
        self.analytics.last_report().cloned().unwrap_or_default()
    }

    /// Events produced by the last tick or command, in application order.
    #[must_use]
    pub fn last_events(&self) -> &[Event] {
        &self.events
    }

    /// Read-only picture of the world for adapters.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        let (width, height) = query::dimensions(&self.world);
        WorldSnapshot {
            width,
            height,
            terrain: query::terrain_view(&self.world).rows().to_vec(),
            life: query::life_cells(&self.world).to_vec(),
            automata: query::automaton_view(&self.world),
            rocks: query::rock_view(&self.world),
            corpses: query::corpse_view(&self.world),
            clock: query::clock(&self.world),
            run_state: query::run_state(&self.world),
            tick_rate: query::tick_rate(&self.world),
            tick: query::tick_index(&self.world),
            stats: self.stats(),
        }
    }

    /// Applies one command and seeds a population when it recycled the world.
    fn dispatch(&mut self, command: Command) {
        let start = self.events.len();
        world::apply(&mut self.world, command, &mut self.events);

        let mut commands = std::mem::take(&mut self.commands);
        self.spawning.handle(
            &self.events[start..],
            query::terrain_view(&self.world),
            query::spawn_range(&self.world),
            &mut commands,
        );
        apply_all(&mut self.world, &mut commands, &mut self.events);
        self.commands = commands;
    }

    fn publish(&mut self) {
        self.analytics.handle(&self.events);
        let _ = self.analytics.report(
            &query::automaton_view(&self.world),
            query::clock(&self.world),
        );
    }
}

fn apply_all(world: &mut World, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
    for command in commands.drain(..) {
        world::apply(world, command, events);
    }
}
