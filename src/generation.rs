//! Per-generation simulation: every agent of a generation flies through the same obstacle
//! field on one shared clock until the population dies out or the score cap is exceeded.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::agent::Agent;
use crate::config::{FitnessConfig, SimConfig};
use crate::evolution::Controller;
use crate::obstacle::{ObstacleField, SpawnTimer};

/// An agent, the controller flying it, and the index of its genome in the fitness ledger.
pub struct Pilot<C> {
    pub agent: Agent,
    pub controller: C,
    pub genome: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// No agent left alive.
    Extinct,
    /// Score went past the configured cap.
    ScoreCap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    Terminated(Termination),
}

pub struct GenerationState<C> {
    generation: usize,
    phase: Phase,
    pilots: Vec<Pilot<C>>,
    fitness: Vec<f32>,
    obstacles: ObstacleField,
    spawner: SpawnTimer,
    rewards: FitnessConfig,
    jump_threshold: f32,
    play_height: f32,
    reference_fps: f32,
    score_cap: u32,
    score: u32,
    ticks: u64,
    rng: SmallRng,
}

impl<C: Controller> GenerationState<C> {
    /// Set up a generation: one agent per controller at the start position, zeroed fitness,
    /// and a first obstacle pair already on its way in.
    pub fn new(config: &SimConfig, generation: usize, controllers: Vec<C>, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let play_width = config.play_width();
        let play_height = config.play_height();

        let pilots: Vec<Pilot<C>> = controllers
            .into_iter()
            .enumerate()
            .map(|(genome, controller)| {
                let color = [rng.r#gen(), rng.r#gen(), rng.r#gen()];
                Pilot {
                    agent: Agent::new(&config.physics, play_width, play_height, color),
                    controller,
                    genome,
                }
            })
            .collect();

        let mut obstacles = ObstacleField::new(config.obstacles.clone(), play_width, play_height);
        obstacles.spawn_pair(&mut rng);

        Self {
            generation,
            phase: Phase::Running,
            fitness: vec![0.0; pilots.len()],
            pilots,
            obstacles,
            spawner: SpawnTimer::new(config.obstacles.spawn_interval_ms),
            rewards: config.fitness.clone(),
            jump_threshold: config.control.jump_threshold,
            play_height,
            reference_fps: config.screen.reference_fps,
            score_cap: config.run.score_cap,
            score: 0,
            ticks: 0,
            rng,
        }
    }

    /// Advance one tick. `dt` is elapsed time in reference frames (1.0 is one frame at
    /// `reference_fps`). Returns the termination reason once the generation is over.
    pub fn step(&mut self, dt: f32) -> Option<Termination> {
        self.step_timed(dt, dt * 1000.0 / self.reference_fps)
    }

    /// Like [`Self::step`], but the spawn clock runs on `elapsed_ms` of wall time, which
    /// may exceed what a clamped `dt` accounts for.
    pub fn step_timed(&mut self, dt: f32, elapsed_ms: f32) -> Option<Termination> {
        if let Phase::Terminated(reason) = self.phase {
            return Some(reason);
        }
        if self.pilots.is_empty() {
            return Some(self.terminate(Termination::Extinct));
        }
        self.ticks += 1;

        for _ in 0..self.spawner.advance(elapsed_ms) {
            self.obstacles.spawn_pair(&mut self.rng);
        }

        self.fly(dt);

        self.obstacles.advance(dt);
        self.obstacles.recycle();

        self.eliminate_collisions();

        if self.pilots.is_empty() {
            return Some(self.terminate(Termination::Extinct));
        }
        if self.score > self.score_cap {
            return Some(self.terminate(Termination::ScoreCap));
        }

        self.score_gate();
        None
    }

    /// Kinematics, survival reward and one jump decision per agent.
    fn fly(&mut self, dt: f32) {
        let gate = self.obstacles.gate();
        let threshold = self.jump_threshold;

        // Decisions are independent; fitness is committed afterwards in index order.
        self.pilots.par_iter_mut().for_each(|pilot| {
            pilot.agent.body.advance(dt);
            let inputs = pilot.agent.sensors(&gate);
            let output = pilot.controller.infer(&inputs);
            if output.first().is_some_and(|&value| value > threshold) {
                pilot.agent.jump();
            }
        });

        for pilot in &self.pilots {
            self.fitness[pilot.genome] += self.rewards.survival_reward;
        }
    }

    fn eliminate_collisions(&mut self) {
        for index in (0..self.pilots.len()).rev() {
            let agent = &self.pilots[index].agent;
            let hit = agent.is_out_of_bounds(self.play_height) || self.obstacles.collides(&agent.bounds());
            if hit {
                let pilot = self.pilots.remove(index);
                self.fitness[pilot.genome] -= self.rewards.collision_penalty;
                debug!(
                    generation = self.generation,
                    genome = pilot.genome,
                    tick = self.ticks,
                    fitness = self.fitness[pilot.genome],
                    "agent eliminated"
                );
            }
        }
    }

    /// Every agent whose left edge reached the gate's right edge on the tick the gate
    /// is first passed earns the bonus; the gate then moves on and the score goes up.
    fn score_gate(&mut self) {
        let Some((gate_right, passed)) = self.obstacles.scoring_gate() else {
            return;
        };

        if !passed {
            let crossers: Vec<usize> = self
                .pilots
                .iter()
                .filter(|pilot| pilot.agent.bounds().left() >= gate_right)
                .map(|pilot| pilot.genome)
                .collect();
            if !crossers.is_empty() && self.obstacles.mark_gate_passed() {
                for genome in crossers {
                    self.fitness[genome] += self.rewards.pass_bonus;
                }
            }
        }

        if self.obstacles.advance_gate_if_passed() {
            self.score += 1;
            debug!(generation = self.generation, score = self.score, tick = self.ticks, "gate passed");
        }
    }

    fn terminate(&mut self, reason: Termination) -> Termination {
        self.phase = Phase::Terminated(reason);
        reason
    }
}

impl<C> GenerationState<C> {
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Terminated(_))
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn alive(&self) -> usize {
        self.pilots.len()
    }

    pub fn pilots(&self) -> &[Pilot<C>] {
        &self.pilots
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn next_gate(&self) -> usize {
        self.obstacles.next_gate()
    }

    /// Fitness per genome, in genome order.
    pub fn fitness(&self) -> &[f32] {
        &self.fitness
    }

    pub fn into_fitness(self) -> Vec<f32> {
        self.fitness
    }
}
