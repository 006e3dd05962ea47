//! Seams between the simulation and whatever evolves the controllers.

/// Maps a sensor vector to an output vector. The first output drives the jump decision.
pub trait Controller: Send + Sync {
    fn infer(&self, inputs: &[f32]) -> Vec<f32>;
}

impl<F> Controller for F
where
    F: Fn(&[f32]) -> Vec<f32> + Send + Sync,
{
    fn infer(&self, inputs: &[f32]) -> Vec<f32> {
        self(inputs)
    }
}

/// Summary of one evaluated generation, as seen by the evolution service.
#[derive(Clone, Debug, PartialEq)]
pub struct EvolutionReport {
    pub best_fitness: f32,
    pub mean_fitness: f32,
    /// Best fitness over the whole run so far.
    pub champion_fitness: f32,
}

/// Produces generations of genomes and breeds the next one from their fitness.
pub trait EvolutionService {
    type Controller: Controller;
    type Genome;

    /// One controller per genome of the current generation, in genome order.
    fn controllers(&self) -> Vec<Self::Controller>;

    /// Consume final fitness values, index-aligned with [`Self::controllers`],
    /// and replace the current generation with its offspring.
    fn evolve(&mut self, fitness: &[f32]) -> EvolutionReport;

    /// Best genome observed so far, if any generation has been evaluated.
    fn champion(&self) -> Option<&Self::Genome>;
}
