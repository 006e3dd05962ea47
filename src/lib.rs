//! Neuroevolution of Flappy Bird players: each generation of agents flies through a
//! scrolling obstacle field, each agent steered by its own evolved network.

pub mod agent;
pub mod app;
pub mod config;
pub mod draw;
pub mod driver;
pub mod entity;
pub mod evolution;
pub mod generation;
pub mod geometry;
pub mod neuro;
pub mod obstacle;

pub use config::{ConfigError, SimConfig};
pub use driver::{DriverStatus, EvolutionDriver, GenerationReport, RunSummary};
pub use evolution::{Controller, EvolutionReport, EvolutionService};
pub use generation::{GenerationState, Phase, Pilot, Termination};
pub use neuro::{ChampionError, Genome, Network, Population};
