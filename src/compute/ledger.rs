//! Append-only generation ledger stored as JSON lines.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::schema::{ArtifactId, LedgerEntry};

/// File name used by [`GenerationLedger::in_dir`].
pub const LEDGER_FILE_NAME: &str = "population_data.jsonl";

/// Ledger errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to encode ledger entry: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Ledger line {line} is not a valid entry: {source}")]
    Corrupt {
        line: usize,
        source: serde_json::Error,
    },
    #[error("Ledger line {line} records count {count} for {members} members")]
    CountMismatch {
        line: usize,
        count: usize,
        members: usize,
    },
}

/// Write-once, read-many record of generation membership.
///
/// Each checkpoint is one line, written with a single `write_all` while the
/// ledger lock is held, so concurrent checkpoints never interleave.
#[derive(Debug)]
pub struct GenerationLedger {
    path: PathBuf,
    file: Mutex<File>,
}

impl GenerationLedger {
    /// Open (or create) the ledger at `path`, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Open the ledger file inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Result<Self, LedgerError> {
        Self::open(dir.as_ref().join(LEDGER_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the membership of `generation`.
    ///
    /// `member_ids` is stored in the order given.
    pub fn checkpoint(
        &self,
        generation: usize,
        member_ids: &[ArtifactId],
    ) -> Result<LedgerEntry, LedgerError> {
        let entry = LedgerEntry::new(generation, member_ids.to_vec());
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        {
            // A poisoned lock only means another writer panicked; the file
            // handle is still usable.
            let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
            file.write_all(&line)?;
            file.flush()?;
        }

        log::info!(
            "Checkpointed generation {} ({} members) to {}",
            generation,
            entry.count(),
            self.path.display()
        );
        Ok(entry)
    }

    /// Read every entry in append order.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        read_entries(&self.path)
    }

    /// Number of entries written so far.
    pub fn entry_count(&self) -> Result<usize, LedgerError> {
        Ok(self.entries()?.len())
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self.entries()?.pop())
    }
}

/// Read ledger entries from a JSON-lines file.
pub fn read_entries<P: AsRef<Path>>(path: P) -> Result<Vec<LedgerEntry>, LedgerError> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: LedgerEntry =
            serde_json::from_str(&line).map_err(|source| LedgerError::Corrupt {
                line: index + 1,
                source,
            })?;
        if !entry.is_consistent() {
            return Err(LedgerError::CountMismatch {
                line: index + 1,
                count: entry.count(),
                members: entry.member_ids().len(),
            });
        }
        entries.push(entry);
    }

    Ok(entries)
}
