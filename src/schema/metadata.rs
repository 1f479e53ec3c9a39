//! Provenance metadata attached to artifacts.
//!
//! Lineage uses a fixed vocabulary of keys so that parent/child graphs can be
//! rebuilt from stored records. Anything else goes into an open side table
//! that is serialized flat alongside the lineage keys.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ArtifactId;

/// Recognized lineage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineageKey {
    /// Single parent of a mutation.
    ParentId,
    /// All parents of a crossover, in the order they were combined.
    ParentIds,
    /// Instruction that guided a crossover.
    CrossoverIdea,
    /// Instruction that guided a mutation.
    MutationIdea,
}

impl LineageKey {
    pub const ALL: [LineageKey; 4] = [
        LineageKey::ParentId,
        LineageKey::ParentIds,
        LineageKey::CrossoverIdea,
        LineageKey::MutationIdea,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParentId => "parent_id",
            Self::ParentIds => "parent_ids",
            Self::CrossoverIdea => "crossover_idea",
            Self::MutationIdea => "mutation_idea",
        }
    }

    /// Look up a lineage key by its wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for LineageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Key '{0}' is reserved for lineage")]
    ReservedKey(LineageKey),
    #[error("Metadata key '{0}' is already set")]
    KeyExists(String),
}

/// Lineage fields plus an additive key-value side table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<ArtifactId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parent_ids: Vec<ArtifactId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crossover_idea: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mutation_idea: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl Metadata {
    /// Empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lineage for a mutation of `parent`.
    pub fn mutation(parent: ArtifactId, mutation_idea: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent),
            mutation_idea: Some(mutation_idea.into()),
            ..Self::default()
        }
    }

    /// Lineage for a crossover of `parents`.
    pub fn crossover(parents: Vec<ArtifactId>, crossover_idea: impl Into<String>) -> Self {
        Self {
            parent_ids: parents,
            crossover_idea: Some(crossover_idea.into()),
            ..Self::default()
        }
    }

    /// Lineage for a record derived from a single parent without an instruction.
    pub fn derived_from(parent: ArtifactId) -> Self {
        Self {
            parent_id: Some(parent),
            ..Self::default()
        }
    }

    pub fn parent_id(&self) -> Option<ArtifactId> {
        self.parent_id
    }

    pub fn parent_ids(&self) -> &[ArtifactId] {
        &self.parent_ids
    }

    pub fn crossover_idea(&self) -> Option<&str> {
        self.crossover_idea.as_deref()
    }

    pub fn mutation_idea(&self) -> Option<&str> {
        self.mutation_idea.as_deref()
    }

    /// Every recorded parent: `parent_id` first, then `parent_ids`, each once.
    pub fn parents(&self) -> Vec<ArtifactId> {
        let mut parents = Vec::with_capacity(self.parent_ids.len() + 1);
        for id in self.parent_id.iter().chain(self.parent_ids.iter()) {
            if !parents.contains(id) {
                parents.push(*id);
            }
        }
        parents
    }

    /// Whether any lineage key is set.
    pub fn has_lineage(&self) -> bool {
        self.parent_id.is_some()
            || !self.parent_ids.is_empty()
            || self.crossover_idea.is_some()
            || self.mutation_idea.is_some()
    }

    /// Add a provenance entry to the side table.
    ///
    /// Existing entries are never replaced, and lineage names cannot be used
    /// as free-form keys.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Result<(), MetadataError> {
        let key = key.into();
        if let Some(lineage) = LineageKey::parse(&key) {
            return Err(MetadataError::ReservedKey(lineage));
        }
        if self.extra.contains_key(&key) {
            return Err(MetadataError::KeyExists(key));
        }
        self.extra.insert(key, value.into());
        Ok(())
    }

    /// Look up a side-table entry.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    /// Side-table entries in key order.
    pub fn extra(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.extra.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_insert_is_additive() {
        let mut meta = Metadata::new();
        meta.insert("renderer", "webgl1").unwrap();
        assert_eq!(
            meta.insert("renderer", "webgl2"),
            Err(MetadataError::KeyExists("renderer".to_string()))
        );
        assert_eq!(meta.get("renderer"), Some(&serde_json::json!("webgl1")));
    }

    #[test]
    fn test_lineage_keys_reserved() {
        let mut meta = Metadata::new();
        for key in LineageKey::ALL {
            assert_eq!(
                meta.insert(key.as_str(), 1),
                Err(MetadataError::ReservedKey(key))
            );
        }
    }

    #[test]
    fn test_parents_dedup() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let meta = Metadata {
            parent_id: Some(a),
            parent_ids: vec![a, b],
            ..Metadata::default()
        };
        assert_eq!(meta.parents(), vec![a, b]);
    }

    #[test]
    fn test_flat_serialization() {
        let parent = Uuid::new_v4();
        let mut meta = Metadata::mutation(parent, "add a vignette");
        meta.insert("model", "gpt-4o-mini").unwrap();

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["parent_id"], serde_json::json!(parent.to_string()));
        assert_eq!(value["mutation_idea"], "add a vignette");
        assert_eq!(value["model"], "gpt-4o-mini");
        assert!(value.get("parent_ids").is_none());

        let parsed: Metadata = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn test_deserialize_free_form_document() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let json = format!(
            r#"{{"parent_ids": ["{a}", "{b}"], "crossover_idea": "blend palettes", "score_source": "clip"}}"#
        );
        let meta: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta.parent_ids(), &[a, b]);
        assert_eq!(meta.crossover_idea(), Some("blend palettes"));
        assert_eq!(meta.get("score_source"), Some(&serde_json::json!("clip")));
        assert!(meta.has_lineage());
    }
}
