//! Per-game summaries for the history view.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::traits::StoredResult;

/// Aggregate over every stored session of one game
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub game_id: String,
    pub sessions: usize,
    pub best_score: i64,
    pub average_score: f64,
    pub average_accuracy: f64,
    pub average_reaction_time_ms: u64,
    pub last_played: DateTime<Utc>,
}

/// Summarize stored results per game, ordered by game id.
pub fn summarize(records: &[StoredResult]) -> Vec<GameSummary> {
    let mut by_game: BTreeMap<&str, Vec<&StoredResult>> = BTreeMap::new();
    for record in records {
        by_game.entry(record.result.game_id.as_str()).or_default().push(record);
    }

    by_game
        .into_iter()
        .filter_map(|(game_id, group)| {
            let last_played = group.iter().map(|r| r.recorded_at).max()?;
            let count = group.len();
            let best_score = group.iter().map(|r| r.result.score).max()?;
            let total_score: i64 = group.iter().map(|r| r.result.score).sum();
            let total_accuracy: u64 = group.iter().map(|r| r.result.accuracy_pct as u64).sum();

            // sessions without any reaction time do not drag the average down
            let timed: Vec<u64> = group
                .iter()
                .map(|r| r.result.average_reaction_time_ms)
                .filter(|ms| *ms > 0)
                .collect();
            let average_reaction_time_ms = if timed.is_empty() {
                0
            } else {
                timed.iter().sum::<u64>() / timed.len() as u64
            };

            Some(GameSummary {
                game_id: game_id.to_string(),
                sessions: count,
                best_score,
                average_score: total_score as f64 / count as f64,
                average_accuracy: total_accuracy as f64 / count as f64,
                average_reaction_time_ms,
                last_played,
            })
        })
        .collect()
}
