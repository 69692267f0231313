#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line adapter that drives a Conways Physics simulation.

use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use conways_physics_core::{Event, SimulationConfig, StatsReport};
use conways_physics_simulation::Simulation;
use tracing::{debug, info, warn};

/// Command-line options for a headless run.
#[derive(Debug, Parser)]
#[command(name = "conways-physics")]
#[command(version)]
#[command(about = "Artificial-life physics on top of Conway's Game of Life")]
struct Cli {
    /// TOML file overriding the reference configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Master random seed
    #[arg(long)]
    seed: Option<u64>,

    /// World width in cells
    #[arg(long)]
    width: Option<u32>,

    /// World height in cells
    #[arg(long)]
    height: Option<u32>,

    /// Ticks to simulate before exiting
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Tick rate in cycles per second, used with --realtime
    #[arg(short, long)]
    rate: Option<u32>,

    /// Smallest population seeded on every recycle
    #[arg(long, requires = "spawn_max")]
    spawn_min: Option<u32>,

    /// Largest population seeded on every recycle
    #[arg(long, requires = "spawn_min")]
    spawn_max: Option<u32>,

    /// Ticks between statistics reports; zero reports only at exit
    #[arg(long, default_value_t = 30)]
    report_every: u64,

    /// Pace ticks against the wall clock instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.print_config {
        let rendered =
            toml::to_string_pretty(&config).context("failed to render configuration")?;
        print!("{rendered}");
        return Ok(());
    }

    run(&cli, config)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Reference configuration, then the TOML file, then command-line overrides.
fn load_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(width) = cli.width {
        config.world.width = width;
    }
    if let Some(height) = cli.height {
        config.world.height = height;
    }
    if let Some(rate) = cli.rate {
        config.time.default_tick_rate = rate;
    }
    config
        .validate()
        .context("configuration rejected")?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<SimulationConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    toml::from_str(&text)
        .with_context(|| format!("failed to parse configuration {}", path.display()))
}

fn run(cli: &Cli, config: SimulationConfig) -> Result<()> {
    let auto_respawn = config.population.auto_respawn;
    let seed = config.seed;
    let mut simulation = Simulation::new(config).context("failed to build simulation")?;

    if let (Some(min), Some(max)) = (cli.spawn_min, cli.spawn_max) {
        simulation
            .set_spawn_range(min, max)
            .context("invalid spawn range")?;
        simulation.recycle();
    }

    let snapshot = simulation.snapshot();
    info!(
        seed,
        width = snapshot.width,
        height = snapshot.height,
        population = snapshot.automata.len(),
        tick_rate = snapshot.tick_rate,
        "world ready"
    );

    simulation.resume();
    let mut executed = 0_u64;
    let mut last = Instant::now();
    while executed < cli.ticks {
        let ticks = if cli.realtime {
            let interval = Duration::from_secs(1) / simulation.tick_rate().max(1);
            thread::sleep(interval);
            let now = Instant::now();
            let elapsed = now.duration_since(last);
            last = now;
            u64::from(simulation.advance(elapsed))
        } else {
            u64::from(simulation.step())
        };
        if ticks == 0 {
            if cli.realtime {
                continue;
            }
            break;
        }

        for _ in 0..ticks {
            executed += 1;
            if cli.report_every > 0 && executed % cli.report_every == 0 {
                report(executed, &simulation.stats());
            }
        }
        log_events(simulation.last_events());

        if simulation.snapshot().automata.is_empty() && !auto_respawn {
            warn!(tick = executed, "population died out");
            break;
        }
    }

    let stats = simulation.stats();
    report(executed, &stats);
    if executed == 0 && cli.ticks > 0 {
        bail!("simulation did not advance");
    }
    info!(ticks = executed, deaths = stats.deaths(), "run finished");
    Ok(())
}

fn report(tick: u64, stats: &StatsReport) {
    info!(
        tick,
        day = stats.day,
        population = stats.population,
        landers = stats.landers,
        flyers = stats.flyers,
        avg_energy = stats.average_energy,
        spawned = stats.spawned,
        born = stats.born,
        starved = stats.starved,
        eaten = stats.eaten,
        crushed = stats.crushed,
        moves = stats.moves_total,
        moves_avg_3 = stats.moves_avg_3,
        moves_avg_7 = stats.moves_avg_7,
        moves_avg_14 = stats.moves_avg_14,
        "statistics"
    );
}

fn log_events(events: &[Event]) {
    for event in events {
        match event {
            Event::WorldRecycled => info!("world emptied and was recycled"),
            Event::DayBegan { day } => debug!(day, "day began"),
            Event::AutomatonEvolved {
                automaton,
                from,
                to,
            } => debug!(automaton = automaton.get(), %from, %to, "evolved"),
            _ => {}
        }
    }
}
