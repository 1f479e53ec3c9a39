//! Configuration types for selection and for external generators.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How survivors and parents are drawn from a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Neighbors averaged for the novelty score.
    #[serde(default = "default_k_neighbors")]
    pub k_neighbors: usize,
    /// Number of best-by-fitness members kept.
    #[serde(default = "default_elite_count")]
    pub elite_count: usize,
    /// Number of most-novel members kept.
    #[serde(default = "default_novelty_count")]
    pub novelty_count: usize,
    /// Number of members drawn at random.
    #[serde(default = "default_random_count")]
    pub random_count: usize,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            k_neighbors: default_k_neighbors(),
            elite_count: default_elite_count(),
            novelty_count: default_novelty_count(),
            random_count: default_random_count(),
            random_seed: None,
        }
    }
}

fn default_k_neighbors() -> usize {
    3
}
fn default_elite_count() -> usize {
    2
}
fn default_novelty_count() -> usize {
    2
}
fn default_random_count() -> usize {
    1
}

impl SelectionConfig {
    /// Total number of members a selection plan asks for.
    pub fn total(&self) -> usize {
        self.elite_count + self.novelty_count + self.random_count
    }

    /// Validate selection configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k_neighbors == 0 {
            return Err(ConfigError::InvalidNeighbors);
        }
        if self.total() == 0 {
            return Err(ConfigError::EmptySelection);
        }
        Ok(())
    }
}

pub const DEFAULT_MODEL: &str = "openai:gpt-4o-mini";

pub const SHADER_SYSTEM_PROMPT: &str = "You are an expert in creating WebGL 1.0 fragment shaders.
Return valid webgl fragment shader.
Provide the full fragment shader code without explanation.
You can only use these uniforms:
varying vec2 uv;
uniform float time;";

/// Settings handed to an external genome operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Model identifier understood by the operator's client.
    #[serde(default = "default_model")]
    pub model: String,
    /// System prompt for shader generation.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Directory phenomes are rendered into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Render resolution (width, height).
    #[serde(default = "default_resolution")]
    pub resolution: (u32, u32),
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            system_prompt: default_system_prompt(),
            output_dir: default_output_dir(),
            resolution: default_resolution(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_system_prompt() -> String {
    SHADER_SYSTEM_PROMPT.to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_resolution() -> (u32, u32) {
    (768, 768)
}

impl GeneratorConfig {
    /// Validate generator configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingModel);
        }
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(ConfigError::InvalidResolution);
        }
        Ok(())
    }
}

/// Configuration for one CLI run over a population snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Directory holding the generation ledger; no checkpoint when unset.
    #[serde(default)]
    pub ledger_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selection.validate()
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Novelty neighbor count must be at least 1")]
    InvalidNeighbors,
    #[error("Selection must ask for at least one member")]
    EmptySelection,
    #[error("Generator model must be set")]
    MissingModel,
    #[error("Render resolution must be non-zero")]
    InvalidResolution,
}
