//! Fixed-topology neuroevolution: a small feedforward network per genome, bred with
//! elitism, tournament selection, uniform crossover and gaussian weight mutation.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::agent::SENSOR_COUNT;
use crate::config::EvolutionConfig;
use crate::evolution::{Controller, EvolutionReport, EvolutionService};

const OUTPUTS: usize = 1;

#[derive(Debug, Error)]
pub enum ChampionError {
    #[error("champion file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode champion: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode champion: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("champion has {actual} weights, a {hidden}-neuron network needs {expected}")]
    Shape { hidden: usize, expected: usize, actual: usize },
}

/// Weights of a `SENSOR_COUNT -> hidden -> 1` network, biases included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub hidden: usize,
    pub weights: Vec<f32>,
    /// Fitness from the last evaluation, if it has been evaluated.
    pub fitness: Option<f32>,
}

impl Genome {
    pub fn weight_count(hidden: usize) -> usize {
        hidden * (SENSOR_COUNT + 1) + OUTPUTS * (hidden + 1)
    }

    pub fn random(hidden: usize, rng: &mut dyn RngCore) -> Self {
        let weights = (0..Self::weight_count(hidden)).map(|_| gaussian(rng)).collect();
        Self { hidden, weights, fitness: None }
    }

    /// Build the controller this genome encodes.
    pub fn build(&self) -> Network {
        Network { hidden: self.hidden, weights: self.weights.clone() }
    }

    /// Child taking each weight from either parent with equal chance.
    pub fn crossover(a: &Genome, b: &Genome, rng: &mut dyn RngCore) -> Self {
        let weights = a
            .weights
            .iter()
            .zip(&b.weights)
            .map(|(x, y)| if rng.r#gen::<bool>() { *x } else { *y })
            .collect();
        Self { hidden: a.hidden, weights, fitness: None }
    }

    pub fn mutate(&mut self, rate: f32, power: f32, limit: f32, rng: &mut dyn RngCore) {
        for weight in &mut self.weights {
            if rng.r#gen::<f32>() < rate {
                *weight = (*weight + gaussian(rng) * power).clamp(-limit, limit);
            }
        }
        self.fitness = None;
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ChampionError> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChampionError> {
        let bytes = fs::read(path)?;
        let (genome, _): (Genome, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        let expected = Self::weight_count(genome.hidden);
        if genome.weights.len() != expected {
            return Err(ChampionError::Shape {
                hidden: genome.hidden,
                expected,
                actual: genome.weights.len(),
            });
        }
        Ok(genome)
    }
}

/// Feedforward network: tanh hidden layer, sigmoid output in (0, 1).
#[derive(Clone, Debug)]
pub struct Network {
    hidden: usize,
    weights: Vec<f32>,
}

impl Controller for Network {
    fn infer(&self, inputs: &[f32]) -> Vec<f32> {
        let (hidden_weights, output_weights) = self.weights.split_at(self.hidden * (SENSOR_COUNT + 1));

        let activations: Vec<f32> = hidden_weights
            .chunks_exact(SENSOR_COUNT + 1)
            .map(|row| {
                let (bias, rest) = (row[0], &row[1..]);
                let sum: f32 = rest.iter().zip(inputs).map(|(w, x)| w * x).sum();
                (bias + sum).tanh()
            })
            .collect();

        output_weights
            .chunks_exact(self.hidden + 1)
            .map(|row| {
                let sum: f32 = row[1..].iter().zip(&activations).map(|(w, h)| w * h).sum();
                logistic(row[0] + sum)
            })
            .collect()
    }
}

pub struct Population {
    config: EvolutionConfig,
    genomes: Vec<Genome>,
    champion: Option<Genome>,
    rng: SmallRng,
}

impl Population {
    pub fn new(config: EvolutionConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let genomes = (0..config.population_size)
            .map(|_| Genome::random(config.hidden_neurons, &mut rng))
            .collect();
        Self { config, genomes, champion: None, rng }
    }

    /// Start from a saved champion: the champion itself plus mutated copies.
    pub fn from_champion(config: EvolutionConfig, champion: Genome, seed: u64) -> Self {
        if champion.hidden != config.hidden_neurons {
            warn!(
                champion = champion.hidden,
                configured = config.hidden_neurons,
                "champion hidden layer size overrides configuration"
            );
        }
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut parent = champion;
        parent.fitness = None;

        let mut genomes = Vec::with_capacity(config.population_size);
        genomes.push(parent.clone());
        while genomes.len() < config.population_size {
            let mut child = parent.clone();
            child.mutate(config.mutation_rate, config.mutation_power, config.weight_limit, &mut rng);
            genomes.push(child);
        }
        Self { config, genomes, champion: None, rng }
    }

    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    fn tournament(&mut self, ranked: &[Genome]) -> usize {
        let mut best = self.rng.gen_range(0..ranked.len());
        for _ in 1..self.config.tournament_size {
            let challenger = self.rng.gen_range(0..ranked.len());
            // Ranked best-first, so a lower index is fitter.
            best = best.min(challenger);
        }
        best
    }
}

impl EvolutionService for Population {
    type Controller = Network;
    type Genome = Genome;

    fn controllers(&self) -> Vec<Network> {
        self.genomes.iter().map(Genome::build).collect()
    }

    fn evolve(&mut self, fitness: &[f32]) -> EvolutionReport {
        let mut ranked = std::mem::take(&mut self.genomes);
        for (genome, &value) in ranked.iter_mut().zip(fitness) {
            genome.fitness = Some(value);
        }
        let score = |genome: &Genome| genome.fitness.unwrap_or(f32::NEG_INFINITY);
        ranked.sort_by(|a, b| score(b).total_cmp(&score(a)));

        let best_fitness = ranked.first().map(score).unwrap_or(f32::NEG_INFINITY);
        let mean_fitness = if fitness.is_empty() {
            0.0
        } else {
            fitness.iter().sum::<f32>() / fitness.len() as f32
        };

        let improved = self.champion.as_ref().is_none_or(|champion| best_fitness > score(champion));
        if improved {
            if let Some(best) = ranked.first() {
                debug!(fitness = best_fitness, "new champion");
                self.champion = Some(best.clone());
            }
        }
        let champion_fitness = self.champion.as_ref().map(score).unwrap_or(best_fitness);

        let size = self.config.population_size;
        let mut next: Vec<Genome> = Vec::with_capacity(size);
        next.extend(ranked.iter().take(self.config.elitism).cloned());
        while next.len() < size && !ranked.is_empty() {
            let first = self.tournament(&ranked);
            let mut child = if self.rng.r#gen::<f32>() < self.config.crossover_rate {
                let second = self.tournament(&ranked);
                Genome::crossover(&ranked[first], &ranked[second], &mut self.rng)
            } else {
                ranked[first].clone()
            };
            child.mutate(
                self.config.mutation_rate,
                self.config.mutation_power,
                self.config.weight_limit,
                &mut self.rng,
            );
            next.push(child);
        }
        self.genomes = next;

        EvolutionReport { best_fitness, mean_fitness, champion_fitness }
    }

    fn champion(&self) -> Option<&Genome> {
        self.champion.as_ref()
    }
}

fn logistic(value: f32) -> f32 {
    1.0 / (1.0 + (-value).exp())
}

fn gaussian(rng: &mut dyn RngCore) -> f32 {
    let u1 = rng.r#gen::<f32>().clamp(f32::MIN_POSITIVE, 1.0);
    let u2 = rng.r#gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize) -> EvolutionConfig {
        EvolutionConfig { population_size: size, ..EvolutionConfig::default() }
    }

    #[test]
    fn network_output_is_a_single_probability() {
        let mut rng = SmallRng::seed_from_u64(1);
        let genome = Genome::random(6, &mut rng);
        assert_eq!(genome.weights.len(), Genome::weight_count(6));
        let output = genome.build().infer(&[360.0, 500.0, 40.0, 140.0]);
        assert_eq!(output.len(), 1);
        assert!((0.0..=1.0).contains(&output[0]));
    }

    #[test]
    fn zero_weights_sit_on_the_jump_threshold() {
        let genome = Genome { hidden: 3, weights: vec![0.0; Genome::weight_count(3)], fitness: None };
        assert_eq!(genome.build().infer(&[1.0, 2.0, 3.0, 4.0]), vec![0.5]);
    }

    #[test]
    fn output_bias_drives_the_decision() {
        let mut weights = vec![0.0; Genome::weight_count(2)];
        let output_bias = 2 * (SENSOR_COUNT + 1);
        weights[output_bias] = 4.0;
        let genome = Genome { hidden: 2, weights, fitness: None };
        assert!(genome.build().infer(&[0.0; SENSOR_COUNT])[0] > 0.95);
    }

    #[test]
    fn mutation_respects_weight_limit() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut genome = Genome::random(4, &mut rng);
        for _ in 0..50 {
            genome.mutate(1.0, 10.0, 2.5, &mut rng);
        }
        assert!(genome.weights.iter().all(|w| w.abs() <= 2.5));
    }

    #[test]
    fn evolve_keeps_size_elites_and_champion() {
        let mut population = Population::new(config(10), 9);
        let fitness: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let fittest = population.genomes()[9].weights.clone();

        let report = population.evolve(&fitness);

        assert_eq!(population.genomes().len(), 10);
        assert_eq!(report.best_fitness, 9.0);
        assert_eq!(report.mean_fitness, 4.5);
        assert_eq!(report.champion_fitness, 9.0);
        assert_eq!(population.genomes()[0].weights, fittest);
        let champion = population.champion().expect("champion");
        assert_eq!(champion.weights, fittest);
        assert_eq!(champion.fitness, Some(9.0));
    }

    #[test]
    fn champion_only_changes_on_improvement() {
        let mut population = Population::new(config(6), 4);
        population.evolve(&[1.0, 8.0, 2.0, 0.0, 0.0, 0.0]);
        let first = population.champion().cloned().expect("champion");

        let report = population.evolve(&[3.0; 6]);
        assert_eq!(report.best_fitness, 3.0);
        assert_eq!(report.champion_fitness, 8.0);
        assert_eq!(population.champion(), Some(&first));
    }

    #[test]
    fn from_champion_seeds_whole_population() {
        let mut rng = SmallRng::seed_from_u64(2);
        let champion = Genome::random(6, &mut rng);
        let population = Population::from_champion(config(5), champion.clone(), 8);
        assert_eq!(population.genomes().len(), 5);
        assert_eq!(population.genomes()[0].weights, champion.weights);
        assert!(population.genomes().iter().all(|genome| genome.hidden == 6));
        assert_eq!(population.controllers().len(), 5);
    }

    #[test]
    fn champion_file_round_trip_and_shape_check() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("champion.bin");
        let mut rng = SmallRng::seed_from_u64(5);
        let mut genome = Genome::random(6, &mut rng);
        genome.fitness = Some(42.5);

        genome.save(&path).expect("save champion");
        assert_eq!(Genome::load(&path).expect("load champion"), genome);

        genome.weights.pop();
        genome.save(&path).expect("save truncated champion");
        assert!(matches!(Genome::load(&path), Err(ChampionError::Shape { .. })));
    }
}
