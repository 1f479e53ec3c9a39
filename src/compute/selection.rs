//! Survivor and parent selection combining fitness, novelty and chance.

use std::collections::HashSet;

use rand::prelude::*;

use crate::schema::{ArtifactId, SelectionConfig};

use super::novelty::ShapeError;
use super::population::{NoveltyScore, Population};

/// Members chosen for the next generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionPlan {
    /// Best by fitness, best first.
    pub elites: Vec<ArtifactId>,
    /// Most novel members that are not elites, most novel first.
    pub novel: Vec<NoveltyScore>,
    /// Random members that were not chosen otherwise.
    pub random: Vec<ArtifactId>,
}

impl SelectionPlan {
    /// Select from `population` using an entropy-seeded generator, or the
    /// configured seed when one is set.
    pub fn build(population: &Population, config: &SelectionConfig) -> Result<Self, ShapeError> {
        let mut rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::build_with(population, config, &mut rng)
    }

    /// Select from `population` with a caller-supplied generator.
    ///
    /// Members without an embedding can still be elites or random picks.
    pub fn build_with<R: Rng + ?Sized>(
        population: &Population,
        config: &SelectionConfig,
        rng: &mut R,
    ) -> Result<Self, ShapeError> {
        let elites: Vec<ArtifactId> = population
            .get_best(config.elite_count)
            .iter()
            .map(|a| a.id())
            .collect();
        let mut chosen: HashSet<ArtifactId> = elites.iter().copied().collect();

        let novel: Vec<NoveltyScore> = if config.novelty_count == 0 {
            Vec::new()
        } else {
            population
                .rank_by_novelty(config.k_neighbors)?
                .into_iter()
                .filter(|s| !chosen.contains(&s.id))
                .take(config.novelty_count)
                .collect()
        };
        chosen.extend(novel.iter().map(|s| s.id));

        let remaining: Vec<ArtifactId> = population
            .iter()
            .map(|a| a.id())
            .filter(|id| !chosen.contains(id))
            .collect();
        let random: Vec<ArtifactId> = remaining
            .choose_multiple(rng, config.random_count)
            .copied()
            .collect();

        log::debug!(
            "Selected {} elites, {} novel, {} random from {} members",
            elites.len(),
            novel.len(),
            random.len(),
            population.len()
        );

        Ok(Self {
            elites,
            novel,
            random,
        })
    }

    /// Every selected id: elites, then novel, then random.
    pub fn ids(&self) -> Vec<ArtifactId> {
        self.elites
            .iter()
            .copied()
            .chain(self.novel.iter().map(|s| s.id))
            .chain(self.random.iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elites.len() + self.novel.len() + self.random.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Artifact, ArtifactKind};

    fn member(fitness: f32, embedding: &[f32]) -> Artifact {
        let mut a = Artifact::from_genome(ArtifactKind::Shader, "void main(){}", None);
        a.set_fitness(fitness);
        a.set_embedding(embedding.to_vec());
        a
    }

    fn population() -> Population {
        let mut population = Population::new();
        population
            .add_all([
                member(0.9, &[1.0, 0.0]),
                member(0.8, &[0.99, 0.01]),
                member(0.1, &[0.0, 1.0]),
                member(0.2, &[0.98, 0.02]),
                member(0.3, &[0.97, 0.03]),
                member(0.4, &[0.96, 0.04]),
            ])
            .unwrap();
        population
    }

    #[test]
    fn test_plan_disjoint() {
        let population = population();
        let config = SelectionConfig {
            k_neighbors: 1,
            elite_count: 2,
            novelty_count: 1,
            random_count: 2,
            random_seed: Some(11),
        };
        let plan = SelectionPlan::build(&population, &config).unwrap();

        let ids = population.ids();
        assert_eq!(plan.elites, vec![ids[0], ids[1]]);
        assert_eq!(plan.novel.len(), 1);
        assert_eq!(plan.novel[0].id, ids[2]);
        assert_eq!(plan.random.len(), 2);

        let all = plan.ids();
        let distinct: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), 5);
        assert_eq!(distinct.len(), 5);
    }

    #[test]
    fn test_seeded_plan_reproducible() {
        let population = population();
        let config = SelectionConfig {
            random_seed: Some(3),
            ..Default::default()
        };
        let a = SelectionPlan::build(&population, &config).unwrap();
        let b = SelectionPlan::build(&population, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_plan_capped_by_population() {
        let population = population();
        let config = SelectionConfig {
            k_neighbors: 1,
            elite_count: 4,
            novelty_count: 4,
            random_count: 4,
            random_seed: Some(0),
        };
        let plan = SelectionPlan::build(&population, &config).unwrap();
        assert_eq!(plan.len(), population.len());
    }

    #[test]
    fn test_ragged_embeddings_fail() {
        let mut population = population();
        population.add(member(0.5, &[1.0, 0.0, 0.0])).unwrap();
        assert!(SelectionPlan::build(&population, &SelectionConfig::default()).is_err());
    }
}
