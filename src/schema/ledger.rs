//! Generation ledger entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ArtifactId;

/// One checkpoint of a generation's membership.
///
/// Serialized as a single JSON line:
/// `{"generation":3,"timestamp":"...","genome_ids":[...],"count":2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    generation: usize,
    timestamp: DateTime<Utc>,
    #[serde(rename = "genome_ids")]
    member_ids: Vec<ArtifactId>,
    count: usize,
}

impl LedgerEntry {
    /// Build an entry stamped with the current time.
    pub fn new(generation: usize, member_ids: Vec<ArtifactId>) -> Self {
        Self::at(generation, Utc::now(), member_ids)
    }

    /// Build an entry with an explicit timestamp.
    pub fn at(generation: usize, timestamp: DateTime<Utc>, member_ids: Vec<ArtifactId>) -> Self {
        let count = member_ids.len();
        Self {
            generation,
            timestamp,
            member_ids,
            count,
        }
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn member_ids(&self) -> &[ArtifactId] {
        &self.member_ids
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether the stored count agrees with the member list.
    pub fn is_consistent(&self) -> bool {
        self.count == self.member_ids.len()
    }
}
