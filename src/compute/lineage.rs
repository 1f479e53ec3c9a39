//! Lineage graph reconstructed from artifact metadata.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::schema::{Artifact, ArtifactId};

/// Parent/child edges between artifacts.
///
/// Parents may be unknown to the graph (e.g. removed from the population in
/// an earlier generation); edges to them are still recorded.
#[derive(Debug, Clone, Default)]
pub struct LineageGraph {
    /// Artifacts seen, in insertion order.
    known: Vec<ArtifactId>,
    parents: HashMap<ArtifactId, Vec<ArtifactId>>,
    children: HashMap<ArtifactId, Vec<ArtifactId>>,
}

impl LineageGraph {
    /// Build from artifacts, typically [`Population::iter`](super::Population::iter).
    pub fn from_artifacts<'a, I>(artifacts: I) -> Self
    where
        I: IntoIterator<Item = &'a Artifact>,
    {
        let mut graph = Self::default();
        for artifact in artifacts {
            graph.insert(artifact);
        }
        graph
    }

    /// Add one artifact's edges. Re-inserting an id is ignored.
    pub fn insert(&mut self, artifact: &Artifact) {
        let id = artifact.id();
        if self.parents.contains_key(&id) {
            return;
        }
        let parents = artifact.metadata().parents();
        for parent in &parents {
            self.children.entry(*parent).or_default().push(id);
        }
        self.parents.insert(id, parents);
        self.known.push(id);
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Direct parents of `id`.
    pub fn parents_of(&self, id: &ArtifactId) -> &[ArtifactId] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct children of `id`.
    pub fn children_of(&self, id: &ArtifactId) -> &[ArtifactId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All ancestors of `id`, nearest first, each listed once.
    pub fn ancestors(&self, id: &ArtifactId) -> Vec<ArtifactId> {
        let mut seen = HashSet::from([*id]);
        let mut queue: VecDeque<ArtifactId> = self.parents_of(id).iter().copied().collect();
        let mut ancestors = Vec::new();

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            ancestors.push(next);
            queue.extend(self.parents_of(&next).iter().copied());
        }

        ancestors
    }

    /// Known artifacts with no recorded parents, in insertion order.
    pub fn roots(&self) -> Vec<ArtifactId> {
        self.known
            .iter()
            .filter(|id| self.parents_of(id).is_empty())
            .copied()
            .collect()
    }
}
