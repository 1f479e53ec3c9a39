//! Seams for the external capabilities the search depends on.
//!
//! Genome generation, embedding and fitness evaluation all happen outside
//! this crate. Implementations hand back finished values; the population
//! only stores them.

use crate::schema::{Artifact, GeneratorConfig};

/// Produces new genomes, typically by prompting a language model and
/// rendering the result.
pub trait GenomeOperator {
    type Error: std::error::Error;

    /// Generate an artifact directly from a prompt.
    fn create_random(
        &mut self,
        prompt: &str,
        config: &GeneratorConfig,
    ) -> Result<Artifact, Self::Error>;

    /// Combine `parents` under the guidance of `crossover_idea`.
    ///
    /// Implementations should build the child with [`Artifact::crossover_child`].
    fn crossover(
        &mut self,
        parents: &[&Artifact],
        crossover_idea: &str,
        config: &GeneratorConfig,
    ) -> Result<Artifact, Self::Error>;

    /// Vary `parent` under the guidance of `mutation_idea`.
    ///
    /// Implementations should build the child with [`Artifact::mutation_child`].
    fn mutate(
        &mut self,
        parent: &Artifact,
        mutation_idea: &str,
        config: &GeneratorConfig,
    ) -> Result<Artifact, Self::Error>;
}

/// Maps an artifact into the shared embedding space.
pub trait Embedder {
    type Error: std::error::Error;

    fn embed(&self, artifact: &Artifact) -> Result<Vec<f32>, Self::Error>;
}

/// Scores an artifact.
pub trait FitnessEvaluator {
    type Error: std::error::Error;

    fn evaluate(&self, artifact: &Artifact) -> Result<f32, Self::Error>;
}
