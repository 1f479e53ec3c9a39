//! Artifact records: one candidate in the evolutionary search.
//!
//! An artifact pairs an optional natural-language idea with a genome (shader
//! source or a structured prompt) and a rendered phenome. Fitness and
//! embedding are assigned by external collaborators after creation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Metadata;

/// Artifact identifier.
pub type ArtifactId = Uuid;

/// Generate a fresh random artifact id.
pub fn new_artifact_id() -> ArtifactId {
    Uuid::new_v4()
}

/// Format of an artifact's rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhenotypeFormat {
    Text,
    Image,
}

/// Closed set of artifact kinds.
///
/// Population and selection code only touches the shared fields, so adding
/// a kind never changes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ArtifactKind {
    /// WebGL 1.0 fragment shader, rendered to an image.
    #[default]
    #[serde(rename = "ShaderArtifact")]
    Shader,
    /// Text prompt, rendered to text.
    #[serde(rename = "PromptArtifact")]
    Prompt,
}

impl ArtifactKind {
    pub fn phenotype_format(self) -> PhenotypeFormat {
        match self {
            Self::Shader => PhenotypeFormat::Image,
            Self::Prompt => PhenotypeFormat::Text,
        }
    }

    /// File extension a renderer should use for this kind's phenome.
    pub fn phenome_extension(self) -> &'static str {
        match self.phenotype_format() {
            PhenotypeFormat::Image => "png",
            PhenotypeFormat::Text => "txt",
        }
    }
}

/// A candidate artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    id: ArtifactId,
    #[serde(rename = "type", default)]
    kind: ArtifactKind,
    /// Natural-language description, for idea-first flows.
    #[serde(default)]
    pub idea: Option<String>,
    /// Generative representation (shader source or prompt).
    #[serde(default)]
    pub genome: Option<String>,
    /// Path to the rendered output.
    #[serde(default)]
    phenome: Option<PathBuf>,
    /// Instruction that produced the genome.
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    fitness: Option<f32>,
    creation_time: DateTime<Utc>,
    #[serde(default)]
    metadata: Metadata,
}

impl Artifact {
    /// Create a bare stub with a fresh id.
    pub fn new(kind: ArtifactKind) -> Self {
        Self::with_id(kind, new_artifact_id())
    }

    /// Create a bare stub with a supplied id.
    pub fn with_id(kind: ArtifactKind, id: ArtifactId) -> Self {
        Self {
            id,
            kind,
            idea: None,
            genome: None,
            phenome: None,
            prompt: None,
            embedding: None,
            fitness: None,
            creation_time: Utc::now(),
            metadata: Metadata::default(),
        }
    }

    /// Create an artifact from a finished genome.
    pub fn from_genome(
        kind: ArtifactKind,
        genome: impl Into<String>,
        prompt: Option<String>,
    ) -> Self {
        let mut artifact = Self::new(kind);
        artifact.genome = Some(genome.into());
        artifact.prompt = prompt;
        artifact
    }

    /// Create an artifact that implements `idea`.
    pub fn from_idea(
        kind: ArtifactKind,
        idea: impl Into<String>,
        genome: impl Into<String>,
        prompt: Option<String>,
    ) -> Self {
        let mut artifact = Self::from_genome(kind, genome, prompt);
        artifact.idea = Some(idea.into());
        artifact
    }

    /// Create a crossover child of `parents`.
    ///
    /// The child takes the kind and prompt of the first parent.
    pub fn crossover_child(
        parents: &[&Artifact],
        crossover_idea: impl Into<String>,
        genome: impl Into<String>,
    ) -> Self {
        let first = parents.first();
        let kind = first.map(|p| p.kind).unwrap_or_default();
        let prompt = first.and_then(|p| p.prompt.clone());

        let mut child = Self::from_genome(kind, genome, prompt);
        child.metadata = Metadata::crossover(parents.iter().map(|p| p.id).collect(), crossover_idea);
        child
    }

    /// Create a mutated child of `parent`.
    pub fn mutation_child(
        parent: &Artifact,
        mutation_idea: impl Into<String>,
        genome: impl Into<String>,
    ) -> Self {
        let mut child = Self::from_genome(parent.kind, genome, parent.prompt.clone());
        child.metadata = Metadata::mutation(parent.id, mutation_idea);
        child
    }

    /// Replace the metadata of a record that has not been shared yet.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> ArtifactId {
        self.id
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn phenotype_format(&self) -> PhenotypeFormat {
        self.kind.phenotype_format()
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    pub fn phenome(&self) -> Option<&Path> {
        self.phenome.as_deref()
    }

    /// Record where the phenome was rendered. Rendering again replaces it.
    pub fn set_phenome(&mut self, path: impl Into<PathBuf>) {
        self.phenome = Some(path.into());
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn set_embedding(&mut self, embedding: Vec<f32>) {
        self.embedding = Some(embedding);
    }

    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    /// Ranking key: absent or NaN fitness ranks below everything else.
    pub fn fitness_key(&self) -> f32 {
        match self.fitness {
            Some(f) if !f.is_nan() => f,
            _ => f32::NEG_INFINITY,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Mutable access for additive inserts; the lineage fields stay read-only.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_unique() {
        let a = Artifact::new(ArtifactKind::Shader);
        let b = Artifact::new(ArtifactKind::Shader);
        assert_ne!(a.id(), b.id());
        assert!(a.genome.is_none());
        assert!(a.fitness().is_none());
    }

    #[test]
    fn test_phenotype_format() {
        assert_eq!(ArtifactKind::Shader.phenotype_format(), PhenotypeFormat::Image);
        assert_eq!(ArtifactKind::Prompt.phenotype_format(), PhenotypeFormat::Text);
        assert_eq!(ArtifactKind::Shader.phenome_extension(), "png");
    }

    #[test]
    fn test_fitness_key() {
        let mut a = Artifact::new(ArtifactKind::Shader);
        assert_eq!(a.fitness_key(), f32::NEG_INFINITY);
        a.set_fitness(f32::NAN);
        assert_eq!(a.fitness_key(), f32::NEG_INFINITY);
        a.set_fitness(0.4);
        assert_eq!(a.fitness_key(), 0.4);
    }

    #[test]
    fn test_crossover_child_lineage() {
        let p1 = Artifact::from_genome(ArtifactKind::Shader, "void main(){}", Some("waves".into()));
        let p2 = Artifact::from_genome(ArtifactKind::Shader, "void main(){ }", None);

        let child = Artifact::crossover_child(&[&p1, &p2], "merge colors", "void main(){;}");
        assert_eq!(child.metadata().parent_ids(), &[p1.id(), p2.id()]);
        assert_eq!(child.metadata().crossover_idea(), Some("merge colors"));
        assert_eq!(child.prompt.as_deref(), Some("waves"));
        assert_ne!(child.id(), p1.id());
    }

    #[test]
    fn test_mutation_child_lineage() {
        let parent = Artifact::from_genome(ArtifactKind::Prompt, "a red sky", Some("sky".into()));
        let child = Artifact::mutation_child(&parent, "make it stormy", "a stormy red sky");
        assert_eq!(child.kind(), ArtifactKind::Prompt);
        assert_eq!(child.metadata().parent_id(), Some(parent.id()));
        assert_eq!(child.metadata().mutation_idea(), Some("make it stormy"));
    }

    #[test]
    fn test_serialization() {
        let mut artifact =
            Artifact::from_idea(ArtifactKind::Shader, "spiral", "void main(){}", None);
        artifact.set_embedding(vec![0.1, 0.2, 0.3]);
        artifact.set_fitness(0.75);
        artifact.set_phenome("out/spiral.png");

        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains(r#""type":"ShaderArtifact""#));

        let parsed: Artifact = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, artifact);
        assert_eq!(parsed.creation_time(), artifact.creation_time());
    }

    #[test]
    fn test_non_uuid_id_rejected() {
        let artifact = Artifact::new(ArtifactKind::Shader);
        let mut value = serde_json::to_value(&artifact).unwrap();
        value["id"] = serde_json::Value::from("shader-001");
        assert!(serde_json::from_value::<Artifact>(value).is_err());
    }
}
