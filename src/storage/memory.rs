//! In-memory result store.

use std::sync::RwLock;

use super::traits::{ResultStore, StoredResult};
use crate::domain::GameResult;
use crate::error::{Result, VigilError};

/// Keeps results for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    records: RwLock<Vec<StoredResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryResultStore {
    fn save(&self, result: &GameResult) -> Result<StoredResult> {
        let record = StoredResult::new(result.clone());
        self.records
            .write()
            .map_err(|e| VigilError::Storage(e.to_string()))?
            .push(record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<StoredResult>> {
        let records = self.records.read().map_err(|e| VigilError::Storage(e.to_string()))?;
        Ok(records.clone())
    }
}
