use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use flappy_neuroevolution::{EvolutionDriver, EvolutionService, Genome, Population, SimConfig, app};

#[derive(Parser, Debug)]
#[command(name = "flappy-neuroevolution", about = "Evolve neural networks that play Flappy Bird")]
struct Cli {
    /// JSON config file; missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    generations: Option<usize>,
    #[arg(long)]
    population: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Run without a window at a fixed frame step.
    #[arg(long)]
    headless: bool,
    /// Where to save the best genome once the run ends.
    #[arg(long)]
    champion_out: Option<PathBuf>,
    /// Seed the first generation from a saved champion.
    #[arg(long)]
    champion_in: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let population = build_population(&cli, &config)?;
    let mut driver = EvolutionDriver::new(population, config);

    if cli.headless {
        let summary = driver.run_headless();
        info!(
            generations = summary.generations,
            best_score = summary.best_score,
            champion = ?summary.champion_fitness,
            "run finished"
        );
        return save_champion(driver.service(), cli.champion_out.as_deref());
    }

    let champion_out = cli.champion_out.clone();
    app::run(driver, move |driver| {
        info!(generations = driver.reports().len(), "run finished");
        if let Err(err) = save_champion(driver.service(), champion_out.as_deref()) {
            error!(%err, "failed to save champion");
        }
    })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(generations) = cli.generations {
        config.run.generations = generations;
    }
    if let Some(population) = cli.population {
        config.evolution.population_size = population;
    }
    if cli.seed.is_some() {
        config.run.seed = cli.seed;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_population(cli: &Cli, config: &SimConfig) -> Result<Population> {
    let seed = config.run.seed.map_or_else(|| rand::random(), |seed| seed.wrapping_add(1));
    match &cli.champion_in {
        Some(path) => {
            let champion = Genome::load(path).with_context(|| format!("loading champion {}", path.display()))?;
            info!(path = %path.display(), fitness = ?champion.fitness, "seeding population from champion");
            Ok(Population::from_champion(config.evolution.clone(), champion, seed))
        }
        None => Ok(Population::new(config.evolution.clone(), seed)),
    }
}

fn save_champion(population: &Population, path: Option<&Path>) -> Result<()> {
    let Some(champion) = population.champion() else {
        warn!("no champion to report");
        return Ok(());
    };
    info!(fitness = ?champion.fitness, hidden = champion.hidden, "best genome");
    if let Some(path) = path {
        champion.save(path).with_context(|| format!("saving champion to {}", path.display()))?;
        info!(path = %path.display(), "champion saved");
    }
    Ok(())
}
