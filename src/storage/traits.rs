//! Result store trait and query types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::GameResult;
use crate::error::Result;

/// A finished result as persisted, stamped with the time it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: GameResult,
}

impl StoredResult {
    pub fn new(result: GameResult) -> Self {
        Self {
            recorded_at: Utc::now(),
            result,
        }
    }
}

/// Query over stored results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultQuery {
    /// Only results for this game
    pub game_id: Option<String>,
    /// Keep at most this many, newest first
    pub limit: Option<usize>,
}

impl ResultQuery {
    pub fn for_game(game_id: impl Into<String>) -> Self {
        Self {
            game_id: Some(game_id.into()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if a stored result matches this query's filters.
    pub fn matches(&self, record: &StoredResult) -> bool {
        match &self.game_id {
            Some(game_id) => record.result.game_id == *game_id,
            None => true,
        }
    }

    /// Filter, order newest first, and truncate.
    pub fn apply(&self, records: &[StoredResult]) -> Vec<StoredResult> {
        let mut matched: Vec<StoredResult> = records.iter().filter(|r| self.matches(r)).cloned().collect();
        matched.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Destination for finished results.
///
/// The engine hands every finished result to a store exactly once; the store owns
/// durability.
pub trait ResultStore: Send + Sync {
    /// Persist a finished result.
    fn save(&self, result: &GameResult) -> Result<StoredResult>;

    /// All stored results in recording order.
    fn list(&self) -> Result<Vec<StoredResult>>;

    /// Stored results matching a query, newest first.
    fn query(&self, query: &ResultQuery) -> Result<Vec<StoredResult>> {
        Ok(query.apply(&self.list()?))
    }
}
