use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::SimConfig;
use crate::evolution::{EvolutionReport, EvolutionService};
use crate::generation::{GenerationState, Termination};

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationReport {
    pub generation: usize,
    pub termination: Termination,
    pub score: u32,
    pub ticks: u64,
    pub evolution: EvolutionReport,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DriverStatus {
    Running,
    GenerationFinished(GenerationReport),
    Finished,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub generations: usize,
    pub best_score: u32,
    pub champion_fitness: Option<f32>,
}

/// Runs generations back to back: asks the service for controllers, evaluates them,
/// and hands the resulting fitness back for breeding.
pub struct EvolutionDriver<S: EvolutionService> {
    service: S,
    config: SimConfig,
    generation: usize,
    current: Option<GenerationState<S::Controller>>,
    reports: Vec<GenerationReport>,
    finished: bool,
    rng: SmallRng,
}

impl<S: EvolutionService> EvolutionDriver<S> {
    pub fn new(service: S, config: SimConfig) -> Self {
        let rng = match config.run.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            service,
            config,
            generation: 0,
            current: None,
            reports: Vec::new(),
            finished: false,
            rng,
        }
    }

    /// Set up the next generation. Returns false once the run is over.
    pub fn start_generation(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.generation += 1;
        let controllers = self.service.controllers();
        info!(generation = self.generation, agents = controllers.len(), "starting generation");
        let seed = self.rng.r#gen();
        self.current = Some(GenerationState::new(&self.config, self.generation, controllers, seed));
        true
    }

    /// Advance the running generation by one tick, starting one if needed.
    pub fn tick(&mut self, dt: f32) -> DriverStatus {
        self.advance(|state| state.step(dt))
    }

    /// [`Self::tick`] with the spawn clock fed `elapsed_ms` of wall time.
    pub fn tick_timed(&mut self, dt: f32, elapsed_ms: f32) -> DriverStatus {
        self.advance(|state| state.step_timed(dt, elapsed_ms))
    }

    fn advance<F>(&mut self, step: F) -> DriverStatus
    where
        F: FnOnce(&mut GenerationState<S::Controller>) -> Option<Termination>,
    {
        if self.current.is_none() && !self.start_generation() {
            return DriverStatus::Finished;
        }
        let Some(state) = self.current.as_mut() else {
            return DriverStatus::Finished;
        };
        match step(state) {
            None => DriverStatus::Running,
            Some(termination) => DriverStatus::GenerationFinished(self.finish_generation(termination)),
        }
    }

    fn finish_generation(&mut self, termination: Termination) -> GenerationReport {
        let (score, ticks, fitness) = match self.current.take() {
            Some(state) => (state.score(), state.ticks(), state.into_fitness()),
            None => (0, 0, Vec::new()),
        };
        let evolution = self.service.evolve(&fitness);

        info!(
            generation = self.generation,
            ?termination,
            score,
            ticks,
            best = evolution.best_fitness,
            mean = evolution.mean_fitness,
            champion = evolution.champion_fitness,
            "generation finished"
        );

        let threshold_reached = self
            .config
            .evolution
            .fitness_threshold
            .is_some_and(|threshold| evolution.best_fitness >= threshold);
        if threshold_reached {
            info!(generation = self.generation, "fitness threshold reached");
        }
        if threshold_reached || self.generation >= self.config.run.generations {
            self.finished = true;
        }

        let report = GenerationReport { generation: self.generation, termination, score, ticks, evolution };
        self.reports.push(report.clone());
        report
    }

    /// Evaluate every generation without a window at a fixed `dt` of one frame.
    pub fn run_headless(&mut self) -> RunSummary {
        while self.tick(1.0) != DriverStatus::Finished {}
        self.summary()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            generations: self.reports.len(),
            best_score: self.reports.iter().map(|report| report.score).max().unwrap_or(0),
            champion_fitness: self.reports.last().map(|report| report.evolution.champion_fitness),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn current(&self) -> Option<&GenerationState<S::Controller>> {
        self.current.as_ref()
    }

    pub fn reports(&self) -> &[GenerationReport] {
        &self.reports
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
