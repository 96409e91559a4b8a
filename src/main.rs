use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use caravan::{
    engine::{EngineBuilder, EngineSettings},
    scenario::{Scenario, ScenarioLoader},
    systems::{AgentSystem, ContractSystem, EventSystem, MarketSystem},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "caravan trade economy runner")]
struct Cli {
    /// Path to a scenario YAML file (built-in training map when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override day count (uses scenario default when omitted)
    #[arg(long)]
    days: Option<u64>,

    /// Override the scenario's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override snapshot interval in days (0 disables)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::training_run(),
    };
    let mut world = scenario.build_world()?;
    let days = scenario.days(cli.days);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_days);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: cli.seed.unwrap_or(scenario.seed),
        snapshot_interval_days: snapshot_interval,
        snapshot_dir,
    };

    let mut engine = EngineBuilder::new(settings)
        .with_system(EventSystem::new())
        .with_system(ContractSystem::new())
        .with_system(MarketSystem::new())
        .with_system(AgentSystem::new())
        .build();

    let mut episodes_ended = 0u64;
    for _ in 0..days {
        engine.step(&mut world)?;
        let finished = world
            .merchants()
            .iter()
            .filter(|m| m.finished.is_some())
            .count();
        if finished > 0 {
            episodes_ended += finished as u64;
            world.reset_episode();
        }
    }

    println!(
        "Scenario '{}' completed after {} days: {} episode(s) ended, {} journal entries",
        scenario.name,
        days,
        episodes_ended,
        world.journal().entries().len()
    );
    Ok(())
}
