use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("play area must be non-zero, got {width}x{height}")]
    EmptyPlayArea { width: u32, height: u32 },
    #[error("reference_fps {0} must be a positive, finite frame rate")]
    InvalidReferenceFps(f32),
    #[error("population_size must be non-zero")]
    EmptyPopulation,
    #[error("obstacle gap {gap} must be positive and smaller than the play area height {height}")]
    InvalidGap { gap: f32, height: u32 },
    #[error("spawn_interval_ms must be positive")]
    ZeroSpawnInterval,
    #[error("generations must be non-zero")]
    ZeroGenerations,
    #[error("elitism {elitism} exceeds population_size {population}")]
    ElitismTooLarge { elitism: usize, population: usize },
    #[error("tournament_size must be non-zero")]
    ZeroTournament,
    #[error("{name} {value} must be between 0.0 and 1.0")]
    OutOfUnitRange { name: &'static str, value: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
    pub max_fps: u32,
    /// Frame rate at which `dt == 1.0`.
    pub reference_fps: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self { width: 1280, height: 720, max_fps: 60, reference_fps: 60.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub jump_velocity: f32,
    pub agent_width: f32,
    pub agent_height: f32,
    /// Start position as a fraction of the play area.
    pub start_x: f32,
    pub start_y: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.55,
            jump_velocity: -10.0,
            agent_width: 50.0,
            agent_height: 50.0,
            start_x: 0.3,
            start_y: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub width: f32,
    pub height: f32,
    pub gap: f32,
    /// Half-height of the band the gap center is sampled from, around mid-screen.
    pub gap_band: f32,
    pub scroll_speed: f32,
    pub spawn_interval_ms: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            width: 80.0,
            height: 1000.0,
            gap: 180.0,
            gap_band: 250.0,
            scroll_speed: 3.0,
            spawn_interval_ms: 2000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    pub survival_reward: f32,
    pub pass_bonus: f32,
    pub collision_penalty: f32,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self { survival_reward: 0.01, pass_bonus: 10.0, collision_penalty: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// An agent jumps when its controller's first output is above this.
    pub jump_threshold: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { jump_threshold: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub generations: usize,
    /// A generation ends once its score exceeds this value.
    pub score_cap: u32,
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { generations: 20, score_cap: 15, seed: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub hidden_neurons: usize,
    /// Number of top genomes copied unchanged into the next generation.
    pub elitism: usize,
    pub tournament_size: usize,
    pub crossover_rate: f32,
    pub mutation_rate: f32,
    pub mutation_power: f32,
    pub weight_limit: f32,
    /// Stop evolving once the best fitness of a generation reaches this value.
    pub fitness_threshold: Option<f32>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            hidden_neurons: 6,
            elitism: 2,
            tournament_size: 3,
            crossover_rate: 0.75,
            mutation_rate: 0.2,
            mutation_power: 0.5,
            weight_limit: 30.0,
            fitness_threshold: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub screen: ScreenConfig,
    pub physics: PhysicsConfig,
    pub obstacles: ObstacleConfig,
    pub fitness: FitnessConfig,
    pub control: ControlConfig,
    pub run: RunConfig,
    pub evolution: EvolutionConfig,
}

impl SimConfig {
    /// Read a JSON config file. Missing fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let screen = &self.screen;
        if screen.width == 0 || screen.height == 0 {
            return Err(ConfigError::EmptyPlayArea { width: screen.width, height: screen.height });
        }
        if !(screen.reference_fps.is_finite() && screen.reference_fps > 0.0) {
            return Err(ConfigError::InvalidReferenceFps(screen.reference_fps));
        }
        let obstacles = &self.obstacles;
        if obstacles.gap <= 0.0 || obstacles.gap >= screen.height as f32 {
            return Err(ConfigError::InvalidGap { gap: obstacles.gap, height: screen.height });
        }
        if !(obstacles.spawn_interval_ms.is_finite() && obstacles.spawn_interval_ms > 0.0) {
            return Err(ConfigError::ZeroSpawnInterval);
        }
        if self.run.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }

        let evolution = &self.evolution;
        if evolution.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if evolution.elitism > evolution.population_size {
            return Err(ConfigError::ElitismTooLarge {
                elitism: evolution.elitism,
                population: evolution.population_size,
            });
        }
        if evolution.tournament_size == 0 {
            return Err(ConfigError::ZeroTournament);
        }
        for (name, value) in [
            ("crossover_rate", evolution.crossover_rate),
            ("mutation_rate", evolution.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }
        Ok(())
    }

    pub fn play_width(&self) -> f32 {
        self.screen.width as f32
    }

    pub fn play_height(&self) -> f32 {
        self.screen.height as f32
    }
}
