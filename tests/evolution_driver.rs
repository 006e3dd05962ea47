mod common;

use common::{Policy, centered_gaps, hover, idle};
use flappy_neuroevolution::{
    DriverStatus, EvolutionDriver, EvolutionReport, EvolutionService, Genome, Population, Termination,
};

/// Hands out fixed policies and records every fitness vector it is given.
struct Recorder {
    policies: Vec<Policy>,
    evaluated: Vec<Vec<f32>>,
}

impl EvolutionService for Recorder {
    type Controller = Policy;
    type Genome = ();

    fn controllers(&self) -> Vec<Policy> {
        self.policies.clone()
    }

    fn evolve(&mut self, fitness: &[f32]) -> EvolutionReport {
        self.evaluated.push(fitness.to_vec());
        let best = fitness.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        EvolutionReport { best_fitness: best, mean_fitness: 0.0, champion_fitness: best }
    }

    fn champion(&self) -> Option<&()> {
        None
    }
}

#[test]
fn fitness_reaches_the_service_in_genome_order() {
    let mut config = centered_gaps();
    config.run.generations = 2;
    config.run.score_cap = 0;
    let recorder = Recorder { policies: vec![idle, hover], evaluated: Vec::new() };
    let mut driver = EvolutionDriver::new(recorder, config);

    let mut first = None;
    while first.is_none() {
        if let DriverStatus::GenerationFinished(report) = driver.tick(1.0) {
            first = Some(report);
        }
    }
    let report = first.expect("first generation report");
    assert_eq!(report.generation, 1);
    assert_eq!(report.termination, Termination::ScoreCap);
    assert_eq!(report.score, 1);
    assert_eq!(report.ticks, 335);

    let fitness = &driver.service().evaluated[0];
    assert_eq!(fitness.len(), 2);
    assert!((fitness[0] - (35.0 * 0.01 - 1.0)).abs() < 1e-4);
    assert!((fitness[1] - (335.0 * 0.01 + 10.0)).abs() < 1e-3);
    assert!(!driver.is_finished());

    let summary = driver.run_headless();
    assert_eq!(summary.generations, 2);
    assert_eq!(driver.generation(), 2);
    assert_eq!(driver.service().evaluated.len(), 2);
    assert!(driver.is_finished());
    assert_eq!(driver.tick(1.0), DriverStatus::Finished);
}

#[test]
fn empty_population_still_completes_generations() {
    let mut config = centered_gaps();
    config.run.generations = 3;
    let recorder = Recorder { policies: Vec::new(), evaluated: Vec::new() };
    let mut driver = EvolutionDriver::new(recorder, config);

    let summary = driver.run_headless();
    assert_eq!(summary.generations, 3);
    assert!(driver.reports().iter().all(|report| report.ticks == 0 && report.termination == Termination::Extinct));
    assert!(driver.service().evaluated.iter().all(Vec::is_empty));
}

#[test]
fn fitness_threshold_stops_the_run_early() {
    let mut config = centered_gaps();
    config.run.generations = 10;
    config.evolution.fitness_threshold = Some(-5.0);
    let recorder = Recorder { policies: vec![idle], evaluated: Vec::new() };
    let mut driver = EvolutionDriver::new(recorder, config);

    let summary = driver.run_headless();
    assert_eq!(summary.generations, 1);
    assert!(driver.is_finished());
}

#[test]
fn headless_population_run_produces_a_loadable_champion() {
    let mut config = centered_gaps();
    config.obstacles.gap_band = 250.0;
    config.run.generations = 3;
    config.run.score_cap = 2;
    config.evolution.population_size = 12;
    let population = Population::new(config.evolution.clone(), 99);
    let mut driver = EvolutionDriver::new(population, config);

    let summary = driver.run_headless();
    assert_eq!(summary.generations, 3);
    let generations: Vec<usize> = driver.reports().iter().map(|report| report.generation).collect();
    assert_eq!(generations, vec![1, 2, 3]);
    assert!(driver.reports().iter().all(|report| report.score <= 3));
    assert_eq!(driver.service().genomes().len(), 12);

    let champion = driver.service().champion().expect("champion after three generations").clone();
    assert_eq!(champion.fitness, summary.champion_fitness);

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("champion.bin");
    champion.save(&path).expect("save champion");
    let restored = Genome::load(&path).expect("load champion");
    assert_eq!(restored, champion);

    let seeded = Population::from_champion(driver.config().evolution.clone(), restored, 1);
    assert_eq!(seeded.genomes()[0].weights, champion.weights);
}

#[test]
fn stalled_frame_still_spawns_on_wall_time() {
    let recorder = Recorder { policies: vec![hover], evaluated: Vec::new() };
    let mut stalled = EvolutionDriver::new(recorder, centered_gaps());
    assert_eq!(stalled.tick_timed(4.0, 4500.0), DriverStatus::Running);
    let state = stalled.current().expect("generation running");
    assert_eq!(state.obstacles().len(), 3);

    let recorder = Recorder { policies: vec![hover], evaluated: Vec::new() };
    let mut clamped = EvolutionDriver::new(recorder, centered_gaps());
    assert_eq!(clamped.tick(4.0), DriverStatus::Running);
    assert_eq!(clamped.current().expect("generation running").obstacles().len(), 1);
}
