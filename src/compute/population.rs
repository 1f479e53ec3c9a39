//! Population store: the artifacts of one generation.

use std::collections::{HashMap, HashSet};

use rand::prelude::*;
use rand::seq::index;

use crate::schema::{Artifact, ArtifactId, LedgerEntry};

use super::ledger::{GenerationLedger, LedgerError};
use super::novelty::{self, EmbeddingMatrix, NoveltyRanking, ShapeError};
use super::operators::{Embedder, FitnessEvaluator};

/// Population store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PopulationError {
    #[error("Artifact {0} is already in the population")]
    DuplicateId(ArtifactId),
}

/// Novelty score of one population member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoveltyScore {
    pub id: ArtifactId,
    pub score: f32,
}

/// Insertion-ordered collection of artifacts indexed by id.
#[derive(Debug, Clone, Default)]
pub struct Population {
    /// Ids in insertion order.
    order: Vec<ArtifactId>,
    /// Records indexed by id.
    artifacts: HashMap<ArtifactId, Artifact>,
}

impl Population {
    /// Create an empty population.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact at the end of the population.
    pub fn add(&mut self, artifact: Artifact) -> Result<(), PopulationError> {
        let id = artifact.id();
        if self.artifacts.contains_key(&id) {
            return Err(PopulationError::DuplicateId(id));
        }
        self.order.push(id);
        self.artifacts.insert(id, artifact);
        Ok(())
    }

    /// Add several artifacts in order.
    ///
    /// Nothing is inserted if any id collides with the population or with
    /// another artifact in the batch.
    pub fn add_all<I>(&mut self, artifacts: I) -> Result<(), PopulationError>
    where
        I: IntoIterator<Item = Artifact>,
    {
        let batch: Vec<Artifact> = artifacts.into_iter().collect();

        let mut seen = HashSet::with_capacity(batch.len());
        for artifact in &batch {
            let id = artifact.id();
            if self.artifacts.contains_key(&id) || !seen.insert(id) {
                return Err(PopulationError::DuplicateId(id));
            }
        }

        log::debug!("Adding {} artifacts to population of {}", batch.len(), self.len());
        self.order.reserve(batch.len());
        self.artifacts.reserve(batch.len());
        for artifact in batch {
            self.order.push(artifact.id());
            self.artifacts.insert(artifact.id(), artifact);
        }
        Ok(())
    }

    /// Remove an artifact by id. Absent ids are ignored.
    pub fn remove(&mut self, id: &ArtifactId) -> Option<Artifact> {
        let artifact = self.artifacts.remove(id)?;
        self.order.retain(|existing| existing != id);
        log::debug!("Removed artifact {}", id);
        Some(artifact)
    }

    /// Get an artifact by id.
    pub fn get(&self, id: &ArtifactId) -> Option<&Artifact> {
        self.artifacts.get(id)
    }

    /// Mutable access for assigning fitness, embedding or phenome.
    pub fn get_mut(&mut self, id: &ArtifactId) -> Option<&mut Artifact> {
        self.artifacts.get_mut(id)
    }

    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.artifacts.contains_key(id)
    }

    /// All artifacts in insertion order.
    ///
    /// The returned vector is independent of the population's own ordering.
    pub fn get_all(&self) -> Vec<&Artifact> {
        self.iter().collect()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.order.iter().map(move |id| &self.artifacts[id])
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> Vec<ArtifactId> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `count` distinct artifacts chosen uniformly at random.
    ///
    /// Asking for at least the whole population returns every member.
    pub fn get_random(&self, count: usize) -> Vec<&Artifact> {
        self.get_random_with(count, &mut StdRng::from_entropy())
    }

    /// [`Population::get_random`] with a caller-supplied generator.
    pub fn get_random_with<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<&Artifact> {
        if count >= self.len() {
            return self.get_all();
        }
        index::sample(rng, self.len(), count)
            .into_iter()
            .map(|i| &self.artifacts[&self.order[i]])
            .collect()
    }

    /// The `count` fittest artifacts, best first.
    ///
    /// Missing fitness ranks last; equal fitness keeps insertion order.
    pub fn get_best(&self, count: usize) -> Vec<&Artifact> {
        let mut sorted = self.get_all();
        sorted.sort_by(|a, b| b.fitness_key().total_cmp(&a.fitness_key()));
        sorted.truncate(count);
        sorted
    }

    /// Embeddings of every member, in insertion order.
    pub fn embeddings(&self) -> Result<EmbeddingMatrix, ShapeError> {
        let rows = self
            .iter()
            .map(|a| a.embedding().ok_or(ShapeError::MissingEmbedding(a.id())))
            .collect::<Result<Vec<_>, _>>()?;
        EmbeddingMatrix::from_rows(&rows)
    }

    /// Rank members by novelty using a caller-supplied embedding matrix.
    ///
    /// Row `i` of `embeddings` must belong to the `i`-th member of
    /// [`Population::get_all`].
    pub fn select_by_novelty(
        &self,
        embeddings: &EmbeddingMatrix,
        k_neighbors: usize,
    ) -> Result<NoveltyRanking, ShapeError> {
        if embeddings.len() != self.len() {
            return Err(ShapeError::RowCountMismatch {
                rows: embeddings.len(),
                population: self.len(),
            });
        }
        Ok(novelty::select_by_novelty(embeddings, k_neighbors))
    }

    /// Rank the members that have an embedding by novelty, most novel first.
    ///
    /// Members without an embedding are left out.
    pub fn rank_by_novelty(&self, k_neighbors: usize) -> Result<Vec<NoveltyScore>, ShapeError> {
        let embedded: Vec<&Artifact> = self.iter().filter(|a| a.embedding().is_some()).collect();
        let rows: Vec<&[f32]> = embedded.iter().filter_map(|a| a.embedding()).collect();
        let matrix = EmbeddingMatrix::from_rows(&rows)?;
        let ranking = novelty::select_by_novelty(&matrix, k_neighbors);

        Ok(ranking
            .order
            .iter()
            .map(|&i| NoveltyScore {
                id: embedded[i].id(),
                score: ranking.scores[i],
            })
            .collect())
    }

    /// Embed every member that has no embedding yet.
    ///
    /// Returns the number of members embedded. Stops at the first failure.
    pub fn embed_missing<E: Embedder>(&mut self, embedder: &E) -> Result<usize, E::Error> {
        let mut embedded = 0;
        for id in &self.order {
            let Some(artifact) = self.artifacts.get_mut(id) else {
                continue;
            };
            if artifact.embedding().is_none() {
                let embedding = embedder.embed(artifact)?;
                artifact.set_embedding(embedding);
                embedded += 1;
            }
        }
        Ok(embedded)
    }

    /// Evaluate every member that has no fitness yet.
    ///
    /// Returns the number of members evaluated. Stops at the first failure.
    pub fn evaluate_missing<F: FitnessEvaluator>(
        &mut self,
        evaluator: &F,
    ) -> Result<usize, F::Error> {
        let mut evaluated = 0;
        for id in &self.order {
            let Some(artifact) = self.artifacts.get_mut(id) else {
                continue;
            };
            if artifact.fitness().is_none() {
                let fitness = evaluator.evaluate(artifact)?;
                artifact.set_fitness(fitness);
                evaluated += 1;
            }
        }
        Ok(evaluated)
    }

    /// Record the current membership as `generation` in `ledger`.
    pub fn checkpoint(
        &self,
        ledger: &GenerationLedger,
        generation: usize,
    ) -> Result<LedgerEntry, LedgerError> {
        ledger.checkpoint(generation, &self.order)
    }
}
