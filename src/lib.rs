//! Shader Evolution - Population management and novelty-driven selection.
//!
//! Artifacts (shader programs and prompts) are evolved by an external loop
//! that generates genomes, renders them, embeds them and scores them. This
//! crate holds each generation's artifacts and decides which of them survive
//! or reproduce, balancing fitness against novelty in embedding space.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Artifact records, lineage metadata, ledger entries and configuration
//! - `compute`: Population store, novelty scoring, selection and the generation ledger
//!
//! # Example
//!
//! ```rust,no_run
//! use shader_evolution::{
//!     compute::{GenerationLedger, Population},
//!     schema::{Artifact, ArtifactKind},
//! };
//!
//! let mut population = Population::new();
//! for (fitness, embedding) in [(0.2, [1.0, 0.0]), (0.9, [0.99, 0.01]), (0.5, [0.0, 1.0])] {
//!     let mut artifact = Artifact::from_genome(ArtifactKind::Shader, "void main() {}", None);
//!     artifact.set_fitness(fitness);
//!     artifact.set_embedding(embedding.to_vec());
//!     population.add(artifact)?;
//! }
//!
//! let best = population.get_best(1);
//! let novel = population.rank_by_novelty(1)?;
//! println!("best fitness {:?}, most novel {}", best[0].fitness(), novel[0].id);
//!
//! let ledger = GenerationLedger::in_dir("output")?;
//! population.checkpoint(&ledger, 0)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{GenerationLedger, Population, SelectionPlan};
pub use schema::{Artifact, ArtifactId, ArtifactKind, SelectionConfig};
