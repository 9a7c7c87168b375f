//! Optional scan history.
//!
//! A `ScanHistory` receives the domain and the merged result of every
//! successful scan. Failures to persist are reported to the caller, which
//! logs them; they never change the scan outcome.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FailedProvider, PersistenceError};
use crate::merge::ScanResult;
use crate::normalize::SubdomainRecord;

/// Persistence collaborator for completed scans.
pub trait ScanHistory: Send + Sync {
    fn record(&self, domain: &str, result: &ScanResult) -> Result<(), PersistenceError>;
}

/// One line of a history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub domain: String,
    pub scanned_at: DateTime<Utc>,
    pub count: usize,
    pub records: Vec<SubdomainRecord>,
    pub failed_providers: Vec<FailedProvider>,
}

impl HistoryEntry {
    pub fn new(domain: &str, result: &ScanResult) -> Self {
        Self {
            domain: domain.to_string(),
            scanned_at: Utc::now(),
            count: result.count,
            records: result.records.clone(),
            failed_providers: result.failed_providers.clone(),
        }
    }
}

/// Appends one JSON object per scan to a file.
#[derive(Debug)]
pub struct JsonlHistory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every entry; a missing file is an empty history.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut entries = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|source| PersistenceError::Decode {
                path: self.path.display().to_string(),
                line: idx + 1,
                source,
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl ScanHistory for JsonlHistory {
    fn record(&self, domain: &str, result: &ScanResult) -> Result<(), PersistenceError> {
        let mut line = serde_json::to_string(&HistoryEntry::new(domain, result))?;
        line.push('\n');

        // Poisoning only means another writer panicked mid-append.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), domain, "Recorded scan in history");
        Ok(())
    }
}
