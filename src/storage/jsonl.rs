//! JSONL-backed result store with in-memory caching.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use super::traits::{ResultStore, StoredResult};
use crate::domain::GameResult;
use crate::error::{Result, VigilError};

const RESULTS_FILE: &str = "results.jsonl";

/// Append-only JSONL file of stored results, one per line.
pub struct JsonlResultStore {
    path: PathBuf,
    cache: RwLock<Option<Vec<StoredResult>>>,
}

impl JsonlResultStore {
    /// Open a store in `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(RESULTS_FILE),
            cache: RwLock::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file into cache if not already loaded.
    fn ensure_loaded(&self) -> Result<()> {
        {
            let cache = self.cache.read().map_err(|e| VigilError::Storage(e.to_string()))?;
            if cache.is_some() {
                return Ok(());
            }
        }

        let mut cache = self.cache.write().map_err(|e| VigilError::Storage(e.to_string()))?;
        if cache.is_some() {
            return Ok(());
        }

        let mut records = Vec::new();
        if self.path.exists() {
            let reader = BufReader::new(File::open(&self.path)?);
            for (number, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<StoredResult>(&line) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!(path = %self.path.display(), line = number + 1, error = %e, "Skipping malformed result"),
                }
            }
        }
        debug!(path = %self.path.display(), count = records.len(), "Loaded results");
        *cache = Some(records);
        Ok(())
    }

    fn append_to_file(&self, record: &StoredResult) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        Ok(())
    }
}

impl ResultStore for JsonlResultStore {
    fn save(&self, result: &GameResult) -> Result<StoredResult> {
        self.ensure_loaded()?;
        let record = StoredResult::new(result.clone());

        // File first, then cache
        self.append_to_file(&record)?;

        let mut cache = self.cache.write().map_err(|e| VigilError::Storage(e.to_string()))?;
        cache
            .as_mut()
            .ok_or_else(|| VigilError::Storage("result cache not loaded".to_string()))?
            .push(record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<StoredResult>> {
        self.ensure_loaded()?;
        let cache = self.cache.read().map_err(|e| VigilError::Storage(e.to_string()))?;
        Ok(cache.clone().unwrap_or_default())
    }
}
