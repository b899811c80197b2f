//! Accumulated match records of a run
//!
//! The dataset is an explicit value owned by the caller. A run starts from
//! the dataset kept by earlier runs (or an empty one) and hands it back when
//! it is done.

use super::dedup::duplicate_mask;
use crate::{MatchRecord, Result};
use std::io::Write;
use std::path::Path;

/// Column order of CSV exports
pub const CSV_COLUMNS: [&str; 15] = [
    "league",
    "area",
    "retrieved_from_url",
    "season",
    "game_type",
    "start_time",
    "end_time",
    "team1",
    "team2",
    "team1_score",
    "team2_score",
    "outcome",
    "team1_odds",
    "team2_odds",
    "draw_odds",
];

/// Ordered, append-only collection of match records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchDataset {
    records: Vec<MatchRecord>,
}

impl MatchDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<MatchRecord>) -> Self {
        MatchDataset { records }
    }

    pub fn append(&mut self, batch: Vec<MatchRecord>) {
        self.records.extend(batch);
    }

    pub fn all(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append another dataset, e.g. one league's results to the kept dataset
    pub fn merge(&mut self, other: MatchDataset) {
        self.records.extend(other.records);
    }

    /// Drop records that repeat an earlier one. Returns how many were dropped.
    pub fn retain_first_occurrences(&mut self) -> usize {
        let mask = duplicate_mask(&self.records);
        let before = self.records.len();
        let mut flags = mask.into_iter();
        self.records.retain(|_| !flags.next().unwrap_or(false));
        before - self.records.len()
    }

    /// Load a dataset saved by [`MatchDataset::save_json`]
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let records: Vec<MatchRecord> = serde_json::from_str(&content)?;
        Ok(MatchDataset { records })
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(path, content)?;
        log::debug!("Saved {} records to {}", self.records.len(), path.display());
        Ok(())
    }

    /// Write the dataset as CSV. Start and end times are Unix seconds of the
    /// site's local time.
    pub fn write_csv<W: Write>(&self, mut out: W) -> Result<()> {
        writeln!(out, "{}", CSV_COLUMNS.join(","))?;
        for r in &self.records {
            let (team1_score, team2_score) = r.score.pair();
            let fields = [
                csv_field(&r.league),
                csv_field(&r.area),
                csv_field(&r.source_url),
                csv_field(&r.season),
                r.game_type.to_string(),
                r.start.and_utc().timestamp().to_string(),
                r.end().and_utc().timestamp().to_string(),
                csv_field(&r.team1),
                csv_field(&r.team2),
                team1_score.to_string(),
                team2_score.to_string(),
                r.outcome().to_string(),
                csv_field(&r.odds.team1),
                csv_field(&r.odds.team2),
                csv_field(&r.odds.draw),
            ];
            writeln!(out, "{}", fields.join(","))?;
        }
        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameType, Odds, Score};
    use chrono::NaiveDate;

    fn record(team1: &str, score: Score) -> MatchRecord {
        MatchRecord {
            league: "Bundesliga".to_string(),
            area: "Germany".to_string(),
            source_url: "https://example.com/results/page/1/".to_string(),
            season: "2020/2021".to_string(),
            game_type: GameType::League,
            start: NaiveDate::from_ymd_opt(2021, 3, 15)
                .unwrap()
                .and_hms_opt(18, 30, 0)
                .unwrap(),
            team1: team1.to_string(),
            team2: "Team B".to_string(),
            score,
            odds: Odds {
                team1: "1.80".to_string(),
                draw: "3.20".to_string(),
                team2: "4.10".to_string(),
            },
        }
    }

    #[test]
    fn test_append_merge_clear() {
        let mut kept = MatchDataset::new();
        kept.append(vec![record("Team A", Score::new(1, 0))]);

        let mut run = MatchDataset::new();
        run.append(vec![record("Team C", Score::new(0, 0))]);
        kept.merge(run);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept.all()[1].team1, "Team C");

        kept.clear();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_retain_first_occurrences() {
        let mut dataset = MatchDataset::new();
        let first = record("Team A", Score::new(1, 0));
        let mut repeat = first.clone();
        repeat.source_url = "https://example.com/results/page/2/".to_string();
        dataset.append(vec![first.clone(), record("Team C", Score::new(2, 2)), repeat]);

        assert_eq!(dataset.retain_first_occurrences(), 1);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.all()[0], first);
        assert_eq!(dataset.retain_first_occurrences(), 0);
    }

    #[test]
    fn test_csv_export() {
        let dataset = MatchDataset::from_records(vec![
            record("Team A", Score::new(2, 1)),
            record("Team, C", Score::Unresolved),
        ]);
        let mut out = Vec::new();
        dataset.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("league,area,retrieved_from_url,season"));
        // 2021-03-15 18:30 and 20:15
        assert_eq!(
            lines[1],
            "Bundesliga,Germany,https://example.com/results/page/1/,2020/2021,LEAGUE,\
             1615833000,1615839300,Team A,Team B,2,1,TEAM1,1.80,4.10,3.20"
        );
        assert!(lines[2].contains("\"Team, C\""));
        assert!(lines[2].contains(",-1,-1,NONE,"));
    }

    #[test]
    fn test_json_round_trip() {
        let path = std::env::temp_dir().join(format!("soccer-odds-{}.json", std::process::id()));
        let dataset = MatchDataset::from_records(vec![record("Team A", Score::Unresolved)]);
        dataset.save_json(&path).unwrap();
        let loaded = MatchDataset::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, dataset);
    }
}
