use std::time::Duration;

use conways_physics_core::{Command, Event, Morphology, SimulationConfig};
use conways_physics_system_spawning::Spawning;
use conways_physics_world::{self as world, query, World};

fn recycled_world(config: &SimulationConfig) -> (World, Vec<Event>) {
    let mut world = World::new(config.clone()).expect("valid config");
    let mut events = Vec::new();
    world::apply(&mut world, Command::Recycle, &mut events);
    (world, events)
}

fn seeds(config: &SimulationConfig, spawn_range: Option<(u32, u32)>) -> (World, Vec<Command>) {
    let (world, events) = recycled_world(config);
    let mut spawning = Spawning::new(config);
    let mut commands = Vec::new();
    spawning.handle(
        &events,
        query::terrain_view(&world),
        spawn_range,
        &mut commands,
    );
    (world, commands)
}

#[test]
fn recycle_seeds_a_population_from_the_default_range() {
    let config = SimulationConfig::with_seed(11);
    let (_, commands) = seeds(&config, None);
    let count = commands.len() as u32;
    assert!(
        (config.population.default_min..=config.population.default_max).contains(&count),
        "unexpected population {count}"
    );
    assert!(commands
        .iter()
        .all(|command| matches!(command, Command::SpawnAutomaton { .. })));
}

#[test]
fn explicit_range_fixes_the_population_size() {
    let config = SimulationConfig::with_seed(3);
    let (_, commands) = seeds(&config, Some((20, 20)));
    assert_eq!(commands.len(), 20);

    let (_, empty) = seeds(&config, Some((0, 0)));
    assert!(empty.is_empty());
}

#[test]
fn one_in_ten_seeds_is_a_flyer_placed_high() {
    let config = SimulationConfig::with_seed(5);
    let (world, commands) = seeds(&config, Some((30, 30)));
    let terrain = query::terrain_view(&world);

    let mut flyers = 0;
    for command in &commands {
        let Command::SpawnAutomaton { seed } = command else {
            panic!("unexpected command emitted: {command:?}");
        };
        let column = seed.position.x as u32;
        match seed.species.morphology() {
            Morphology::Lander => {
                assert_eq!(seed.position.y, terrain.air_boundary(column) as f32);
            }
            Morphology::Flyer => {
                flyers += 1;
                assert!(seed.position.y <= (terrain.height() / 3) as f32);
            }
        }
        assert_eq!(seed.energy, config.population.initial_energy);
        assert!((20.0..=100.0).contains(&seed.weight));
        assert!(seed.velocity.x.abs() <= 0.5);
        assert_eq!(seed.velocity.y, 0.0);
    }
    assert_eq!(flyers, 3);
}

#[test]
fn nothing_is_seeded_without_a_recycle() {
    let config = SimulationConfig::default();
    let world = World::new(config.clone()).expect("valid config");
    let mut spawning = Spawning::new(&config);
    let mut commands = Vec::new();
    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_millis(100),
            day: 0,
        }],
        query::terrain_view(&world),
        Some((10, 10)),
        &mut commands,
    );
    assert!(commands.is_empty());
}

#[test]
fn seeded_automata_enter_the_world_above_ground() {
    let config = SimulationConfig::with_seed(21);
    let (mut world, commands) = seeds(&config, Some((50, 50)));
    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    assert_eq!(query::population(&world), 50);

    let terrain = query::terrain_view(&world);
    for automaton in query::automaton_view(&world).iter() {
        assert!(!terrain.is_solid(automaton.cell), "{automaton:?} inside terrain");
    }
}

#[test]
fn same_seed_yields_the_same_population() {
    let config = SimulationConfig::with_seed(99);
    let (_, first) = seeds(&config, None);
    let (_, second) = seeds(&config, None);
    assert_eq!(first, second);
}
