use std::time::Duration;

use conways_physics_core::{
    AutomatonId, AutomatonSnapshot, AutomatonView, Blocker, BlockerView, CellCoord, ClockSnapshot,
    Command, CorpseId, Gender, LifeFieldView, Motion, SimulationConfig, Species, TerrainView,
};
use conways_physics_system_physics::Physics;
use glam::Vec2;

const WIDTH: u32 = 80;
const HEIGHT: u32 = 24;

fn flat() -> Vec<u32> {
    vec![20; WIDTH as usize]
}

fn night() -> ClockSnapshot {
    ClockSnapshot {
        elapsed_seconds: 20.0,
        day: 0,
        daylight: false,
        day_length: 30.0,
    }
}

fn automaton(id: u32, species: Species, position: Vec2, energy: f32) -> AutomatonSnapshot {
    AutomatonSnapshot {
        id: AutomatonId::new(id),
        species,
        gender: Gender::Female,
        position,
        velocity: Vec2::ZERO,
        cell: CellCoord::from_position(position, WIDTH, HEIGHT),
        energy,
        weight: 50.0,
        age_seconds: 0.0,
        born_day: 0,
        last_reproduction_day: None,
        last_jump_day: None,
        evolutions: 0,
        stagnant_seconds: 0.0,
    }
}

fn letter(value: char) -> Species {
    Species::from_letter(value).expect("letter")
}

fn run(
    config: &SimulationConfig,
    snapshots: Vec<AutomatonSnapshot>,
    surface: &[u32],
    blockers: &BlockerView,
    dt: Duration,
) -> Vec<Command> {
    let mut physics = Physics::new(config);
    let view = AutomatonView::from_snapshots(snapshots);
    let life = vec![false; (WIDTH * HEIGHT) as usize];
    let mut out = Vec::new();
    physics.handle(
        &view,
        TerrainView::new(surface, HEIGHT),
        blockers,
        LifeFieldView::new(&life, WIDTH, HEIGHT),
        night(),
        dt,
        &mut out,
    );
    out
}

fn tick(snapshots: Vec<AutomatonSnapshot>, surface: &[u32]) -> Vec<Command> {
    run(
        &SimulationConfig::with_seed(7),
        snapshots,
        surface,
        &BlockerView::default(),
        Duration::from_secs(1),
    )
}

fn motion_of(out: &[Command], id: u32) -> Motion {
    out.iter()
        .find_map(|command| match command {
            Command::MoveAutomaton { automaton, motion } if automaton.get() == id => Some(*motion),
            _ => None,
        })
        .expect("motion emitted")
}

fn close(actual: f32, expected: f32) -> bool {
    (actual - expected).abs() < 1e-3
}

#[test]
fn landers_walk_toward_prey_on_flat_ground() {
    let out = tick(
        vec![
            automaton(1, Species::M, Vec2::new(10.0, 19.0), 50.0),
            automaton(2, Species::A, Vec2::new(11.0, 19.0), 50.0),
        ],
        &flat(),
    );
    let motion = motion_of(&out, 1);
    assert!(close(motion.position.x, 11.8), "x = {}", motion.position.x);
    assert_eq!(motion.position.y, 19.0);
    assert!(close(motion.energy, 49.8));
    assert_eq!(motion.stagnant_seconds, 0.0);
    assert!(!motion.jumped);
}

#[test]
fn every_automaton_gets_exactly_one_motion() {
    let out = tick(
        vec![
            automaton(1, Species::M, Vec2::new(10.0, 19.0), 50.0),
            automaton(2, Species::A, Vec2::new(40.0, 19.0), 50.0),
            automaton(3, Species::N, Vec2::new(60.0, 5.0), 50.0),
        ],
        &flat(),
    );
    let moved: Vec<u32> = out
        .iter()
        .filter_map(|command| match command {
            Command::MoveAutomaton { automaton, .. } => Some(automaton.get()),
            _ => None,
        })
        .collect();
    assert_eq!(moved, vec![1, 2, 3]);
}

#[test]
fn tall_steps_block_ordinary_landers() {
    let mut surface = flat();
    surface[12] = 17;
    let mut walker = automaton(1, Species::B, Vec2::new(11.0, 19.0), 50.0);
    walker.last_jump_day = Some(0);
    let out = tick(
        vec![
            walker,
            automaton(2, letter('E'), Vec2::new(10.0, 19.0), 50.0),
        ],
        &surface,
    );
    let motion = motion_of(&out, 1);
    assert_eq!(motion.position.x.round(), 11.0);
    assert_eq!(motion.position.y, 19.0);
    assert_eq!(motion.velocity.x, 0.0);
    assert!(!motion.jumped);
    assert!(!out
        .iter()
        .any(|command| matches!(command, Command::TunnelTerrain { .. })));
}

#[test]
fn tunnelers_dig_through_steps_before_moving() {
    let mut surface = flat();
    surface[12] = 18;
    let out = tick(
        vec![
            automaton(1, Species::C, Vec2::new(11.0, 19.0), 50.0),
            automaton(2, letter('E'), Vec2::new(10.0, 19.0), 50.0),
        ],
        &surface,
    );
    let dig = out
        .iter()
        .position(|command| {
            *command
                == Command::TunnelTerrain {
                    automaton: AutomatonId::new(1),
                    column: 12,
                }
        })
        .expect("tunnel emitted");
    let step = out
        .iter()
        .position(|command| {
            matches!(command, Command::MoveAutomaton { automaton, .. } if automaton.get() == 1)
        })
        .expect("motion emitted");
    assert!(dig < step);

    let motion = motion_of(&out, 1);
    assert!(close(motion.position.x, 12.8), "x = {}", motion.position.x);
    assert_eq!(motion.position.y, 19.0);
}

#[test]
fn rested_landers_jump_over_steps() {
    let mut config = SimulationConfig::with_seed(7);
    config.jump.chance = 1.0;
    let mut surface = flat();
    surface[12] = 17;
    surface[13] = 17;
    let out = run(
        &config,
        vec![
            automaton(1, Species::B, Vec2::new(11.0, 19.0), 50.0),
            automaton(2, letter('E'), Vec2::new(10.0, 19.0), 50.0),
        ],
        &surface,
        &BlockerView::default(),
        Duration::from_secs(1),
    );
    let motion = motion_of(&out, 1);
    assert!(motion.jumped);
    assert_eq!(motion.position, Vec2::new(13.0, 16.0));
    assert!(close(motion.energy, 47.8));
}

#[test]
fn tunnelers_jump_steps_one_dig_cannot_open() {
    let mut config = SimulationConfig::with_seed(7);
    config.jump.chance = 1.0;
    let mut surface = flat();
    surface[12] = 17;
    surface[13] = 17;
    let out = run(
        &config,
        vec![
            automaton(1, Species::C, Vec2::new(11.0, 19.0), 50.0),
            automaton(2, letter('E'), Vec2::new(10.0, 19.0), 50.0),
        ],
        &surface,
        &BlockerView::default(),
        Duration::from_secs(1),
    );
    assert!(out.contains(&Command::TunnelTerrain {
        automaton: AutomatonId::new(1),
        column: 12,
    }));
    let motion = motion_of(&out, 1);
    assert!(motion.jumped);
    assert_eq!(motion.position, Vec2::new(13.0, 16.0));
    assert!(close(motion.energy, 47.8));
}

#[test]
fn jumps_never_exceed_the_ascent_limit() {
    let mut config = SimulationConfig::with_seed(7);
    config.jump.chance = 1.0;
    let mut surface = flat();
    surface[12] = 15;
    surface[13] = 15;
    let out = run(
        &config,
        vec![
            automaton(1, Species::B, Vec2::new(11.0, 19.0), 50.0),
            automaton(2, letter('E'), Vec2::new(10.0, 19.0), 50.0),
        ],
        &surface,
        &BlockerView::default(),
        Duration::from_secs(1),
    );
    let motion = motion_of(&out, 1);
    assert!(!motion.jumped);
    assert_eq!(motion.position.x.round(), 11.0);
}

#[test]
fn corpses_stop_walkers() {
    let blockers =
        BlockerView::from_entries([(CellCoord::new(12, 19), Blocker::Corpse(CorpseId::new(1)))]);
    let out = run(
        &SimulationConfig::with_seed(7),
        vec![
            automaton(1, Species::B, Vec2::new(11.0, 19.0), 50.0),
            automaton(2, letter('E'), Vec2::new(10.0, 19.0), 50.0),
        ],
        &flat(),
        &blockers,
        Duration::from_secs(1),
    );
    let motion = motion_of(&out, 1);
    assert_eq!(motion.position.x.round(), 11.0);
    assert_eq!(motion.velocity.x, 0.0);
}

#[test]
fn exhausted_landers_stay_put_and_drain() {
    let mut tired = automaton(1, Species::A, Vec2::new(10.0, 19.0), 5.0);
    tired.stagnant_seconds = 2.0;
    let out = tick(vec![tired], &flat());
    let motion = motion_of(&out, 1);
    assert_eq!(motion.position, Vec2::new(10.0, 19.0));
    assert_eq!(motion.velocity, Vec2::ZERO);
    assert!(close(motion.energy, 4.9));
    assert!(close(motion.stagnant_seconds, 3.0));
}

#[test]
fn neighbouring_mates_hold_position() {
    let female = automaton(1, Species::A, Vec2::new(10.0, 19.0), 50.0);
    let mut male = automaton(2, Species::A, Vec2::new(11.0, 19.0), 50.0);
    male.gender = Gender::Male;
    let out = tick(vec![female, male], &flat());
    for id in [1, 2] {
        let motion = motion_of(&out, id);
        assert_eq!(motion.velocity, Vec2::ZERO);
        assert!(close(motion.energy, 49.9));
    }
    assert_eq!(motion_of(&out, 1).position, Vec2::new(10.0, 19.0));
    assert_eq!(motion_of(&out, 2).position, Vec2::new(11.0, 19.0));
}

#[test]
fn resting_flyers_lift_off_without_sliding() {
    let out = tick(
        vec![automaton(1, Species::N, Vec2::new(10.0, 19.0), 50.0)],
        &flat(),
    );
    let motion = motion_of(&out, 1);
    assert_eq!(motion.position.x, 10.0);
    assert!(close(motion.position.y, 11.257), "y = {}", motion.position.y);
    assert!(motion.velocity.y < 0.0);
    assert!(close(motion.energy, 49.5));
}

#[test]
fn diving_flyers_bounce_off_the_ground() {
    let mut diver = automaton(1, Species::N, Vec2::new(10.0, 17.0), 50.0);
    diver.velocity = Vec2::new(0.0, 10.0);
    let out = tick(vec![diver], &flat());
    let motion = motion_of(&out, 1);
    assert_eq!(motion.position.y, 19.0);
    assert!(close(motion.velocity.y, -1.2346), "vy = {}", motion.velocity.y);
    assert!(close((motion.position.x - 10.0).abs(), 1.5));
}

#[test]
fn weak_flyers_fall_to_the_ground() {
    let out = tick(
        vec![automaton(1, Species::N, Vec2::new(10.0, 10.0), 15.0)],
        &flat(),
    );
    let motion = motion_of(&out, 1);
    assert_eq!(motion.position, Vec2::new(10.0, 19.0));
    assert_eq!(motion.velocity, Vec2::ZERO);
    assert!(close(motion.energy, 14.9));
}

#[test]
fn flyers_never_enter_the_ground() {
    for seed in 0..64 {
        let mut diver = automaton(1, letter('Q'), Vec2::new(30.0, 18.0), 80.0);
        diver.velocity = Vec2::new(0.0, 25.0);
        let out = run(
            &SimulationConfig::with_seed(seed),
            vec![diver],
            &flat(),
            &BlockerView::default(),
            Duration::from_secs(1),
        );
        let motion = motion_of(&out, 1);
        assert!(motion.position.y <= 19.0);
        assert!(motion.position.y >= 0.0);
    }
}

#[test]
fn zero_time_steps_emit_nothing() {
    let out = run(
        &SimulationConfig::with_seed(7),
        vec![automaton(1, Species::A, Vec2::new(10.0, 19.0), 50.0)],
        &flat(),
        &BlockerView::default(),
        Duration::ZERO,
    );
    assert!(out.is_empty());
}
