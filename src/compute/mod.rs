//! Compute module - Population store and selection engine.
//!
//! # Overview
//!
//! - **Population** (`population`): insertion-ordered artifact store with
//!   random and fitness-ranked sampling
//! - **Novelty** (`novelty`): k-nearest-neighbor cosine distance in
//!   embedding space
//! - **Selection** (`selection`): elites, novel and random picks for the next
//!   generation
//! - **Ledger** (`ledger`): append-only record of each generation's members
//! - **Lineage** (`lineage`): parent/child graph rebuilt from metadata
//! - **Operators** (`operators`): traits for the external generator,
//!   embedder and fitness evaluator

mod ledger;
mod lineage;
pub mod novelty;
mod operators;
mod population;
mod selection;

pub use ledger::{GenerationLedger, LEDGER_FILE_NAME, LedgerError, read_entries};
pub use lineage::LineageGraph;
pub use novelty::{
    DistanceMatrix, EmbeddingMatrix, NoveltyRanking, SELF_DISTANCE, ShapeError,
    cosine_distance_matrix, novelty_scores, select_by_novelty,
};
pub use operators::{Embedder, FitnessEvaluator, GenomeOperator};
pub use population::{NoveltyScore, Population, PopulationError};
pub use selection::SelectionPlan;
