//! Manual scores for matches whose score cell the site never rendered

use crate::{AnomalyEntry, Result, Score, ScrapeError};
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Kick-off format used by anomaly entries
pub const ANOMALY_START_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Known-anomaly table keyed by `(team1, team2, start)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnomalyTable {
    scores: HashMap<(String, String, NaiveDateTime), Score>,
}

impl AnomalyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[AnomalyEntry]) -> Result<Self> {
        let mut table = Self::new();
        for entry in entries {
            let start = NaiveDateTime::parse_from_str(&entry.start, ANOMALY_START_FORMAT)
                .map_err(|e| {
                    ScrapeError::Config(format!(
                        "Invalid anomaly start {:?} for {} - {}: {}",
                        entry.start, entry.team1, entry.team2, e
                    ))
                })?;
            table.insert(
                &entry.team1,
                &entry.team2,
                start,
                Score::new(entry.team1_score, entry.team2_score),
            );
        }
        Ok(table)
    }

    pub fn insert(&mut self, team1: &str, team2: &str, start: NaiveDateTime, score: Score) {
        self.scores
            .insert((team1.to_string(), team2.to_string(), start), score);
    }

    pub fn lookup(&self, team1: &str, team2: &str, start: NaiveDateTime) -> Option<Score> {
        self.scores
            .get(&(team1.to_string(), team2.to_string(), start))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
