//! Schema module - Artifact records, lineage metadata, ledger entries and configuration.

mod artifact;
mod config;
mod ledger;
mod metadata;

pub use artifact::*;
pub use config::*;
pub use ledger::*;
pub use metadata::*;
