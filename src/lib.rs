//! Soccer match results and betting odds scraper
//!
//! Walks the paginated results table of a sports-odds site, turns each match
//! row into a [`MatchRecord`] and accumulates them into a deduplicated dataset.

pub mod data;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Minutes added to the kick-off time to estimate the end of a match
/// (90 minutes of play plus a 15 minute break).
pub const MATCH_DURATION_MINUTES: i64 = 90 + 15;

/// Season placeholder used when the page does not name the season
pub const SEASON_PLACEHOLDER: &str = "xx/xx";

/// Kind of fixture, taken from the date header the match is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameType {
    League,
    Promotion,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::League => write!(f, "LEAGUE"),
            GameType::Promotion => write!(f, "PROMOTION"),
        }
    }
}

/// Result of a match as seen by the bookmaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Team1,
    Team2,
    Draw,
    /// Postponed, cancelled or otherwise unresolved
    None,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Team1 => write!(f, "TEAM1"),
            Outcome::Team2 => write!(f, "TEAM2"),
            Outcome::Draw => write!(f, "DRAW"),
            Outcome::None => write!(f, "NONE"),
        }
    }
}

/// Final score of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Score {
    Final { team1: u16, team2: u16 },
    /// Postponed, cancelled or abandoned; stored as the `(-1, -1)` pair
    Unresolved,
}

impl Score {
    pub const SENTINEL: i32 = -1;

    pub fn new(team1: u16, team2: u16) -> Self {
        Score::Final { team1, team2 }
    }

    /// Build from a stored pair, where any negative value means unresolved
    pub fn from_pair(team1: i32, team2: i32) -> Self {
        match (u16::try_from(team1), u16::try_from(team2)) {
            (Ok(t1), Ok(t2)) => Score::Final { team1: t1, team2: t2 },
            _ => Score::Unresolved,
        }
    }

    /// Scores as stored in tables, `(-1, -1)` for an unresolved match
    pub fn pair(&self) -> (i32, i32) {
        match *self {
            Score::Final { team1, team2 } => (team1 as i32, team2 as i32),
            Score::Unresolved => (Self::SENTINEL, Self::SENTINEL),
        }
    }

    pub fn outcome(&self) -> Outcome {
        match *self {
            Score::Final { team1, team2 } => match team1.cmp(&team2) {
                std::cmp::Ordering::Greater => Outcome::Team1,
                std::cmp::Ordering::Less => Outcome::Team2,
                std::cmp::Ordering::Equal => Outcome::Draw,
            },
            Score::Unresolved => Outcome::None,
        }
    }
}

/// Decimal odds as published (team 1 win, draw, team 2 win)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Odds {
    pub team1: String,
    pub draw: String,
    pub team2: String,
}

/// A single scraped match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub league: String,
    pub area: String,
    /// Page the match was read from; not part of the record's identity
    pub source_url: String,
    pub season: String,
    pub game_type: GameType,
    pub start: NaiveDateTime,
    pub team1: String,
    pub team2: String,
    pub score: Score,
    pub odds: Odds,
}

impl MatchRecord {
    /// Estimated end of the match
    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(MATCH_DURATION_MINUTES)
    }

    pub fn outcome(&self) -> Outcome {
        self.score.outcome()
    }

    /// Identity used for deduplication: every field except `source_url`
    pub fn key(&self) -> RecordKey<'_> {
        RecordKey {
            league: &self.league,
            area: &self.area,
            season: &self.season,
            game_type: self.game_type,
            start: self.start,
            team1: &self.team1,
            team2: &self.team2,
            score: self.score,
            odds: &self.odds,
        }
    }

    /// Same match regardless of which page it was read from
    pub fn same_match(&self, other: &MatchRecord) -> bool {
        self.key() == other.key()
    }
}

/// Borrowed view of a [`MatchRecord`] without its provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey<'a> {
    league: &'a str,
    area: &'a str,
    season: &'a str,
    game_type: GameType,
    start: NaiveDateTime,
    team1: &'a str,
    team2: &'a str,
    score: Score,
    odds: &'a Odds,
}

/// One league to scrape, as read from a league JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueDescriptor {
    pub league: String,
    pub area: String,
    pub urls: Vec<String>,
}

impl LeagueDescriptor {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::Config(format!("Failed to read league file {}: {}", path, e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Markup changed at {url} ({context}): {message}")]
    StructuralParse {
        url: String,
        context: String,
        message: String,
    },

    #[error("Cannot parse start time {value:?} of {team1} - {team2} at {url}: {source}")]
    StartTime {
        value: String,
        team1: String,
        team2: String,
        url: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Unreadable score for {team1} - {team2} on {start} at {url}; add it to the anomaly table")]
    UnknownAnomaly {
        team1: String,
        team2: String,
        start: String,
        url: String,
    },

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid selector {0:?}")]
    Selector(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Errors that mean the page markup can no longer be trusted
    pub fn is_fatal_parse(&self) -> bool {
        matches!(
            self,
            ScrapeError::StructuralParse { .. }
                | ScrapeError::StartTime { .. }
                | ScrapeError::UnknownAnomaly { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub scrape: ScrapeConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub anomalies: Vec<AnomalyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Markup variant, "current" or "legacy"
    pub markup: String,
    /// Page URL pattern with `{url}` and `{page}` placeholders. The page
    /// number has to reach the server, so it cannot go in a `#fragment`.
    pub page_url_template: String,
    pub max_pages: u32,
    pub page_delay_ms: u64,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub dataset_path: String,
    pub cache_dir: Option<String>,
}

/// Manual score for a match whose score cell the site never rendered properly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyEntry {
    pub team1: String,
    pub team2: String,
    /// Kick-off as "YYYY-MM-DD HH:MM"
    pub start: String,
    pub team1_score: u16,
    pub team2_score: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scrape: ScrapeConfig {
                markup: "current".to_string(),
                page_url_template: "{url}page/{page}/".to_string(),
                max_pages: 50,
                page_delay_ms: 5000,
                user_agent: "soccer-odds/0.1".to_string(),
                timeout_secs: 30,
            },
            data: DataConfig {
                database_path: "data/soccer.db".to_string(),
                dataset_path: "data/dataset.json".to_string(),
                cache_dir: None,
            },
            anomalies: vec![
                AnomalyEntry {
                    team1: "Bayern Munich".to_string(),
                    team2: "Freiburg".to_string(),
                    start: "2010-03-13 16:30".to_string(),
                    team1_score: 2,
                    team2_score: 1,
                },
                AnomalyEntry {
                    team1: "Hertha Berlin".to_string(),
                    team2: "B. Monchengladbach".to_string(),
                    start: "2010-01-23 13:30".to_string(),
                    team1_score: 0,
                    team2_score: 0,
                },
                AnomalyEntry {
                    team1: "Bayern Munich".to_string(),
                    team2: "Hoffenheim".to_string(),
                    start: "2010-01-15 18:30".to_string(),
                    team1_score: 2,
                    team2_score: 0,
                },
            ],
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ScrapeError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ScrapeError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the URL of one result page
    pub fn page_url(&self, url: &str, page: u32) -> String {
        self.scrape
            .page_url_template
            .replace("{url}", url)
            .replace("{page}", &page.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(score: Score) -> MatchRecord {
        MatchRecord {
            league: "Bundesliga".to_string(),
            area: "Germany".to_string(),
            source_url: "https://example.com/a".to_string(),
            season: "2020/2021".to_string(),
            game_type: GameType::League,
            start: NaiveDate::from_ymd_opt(2021, 3, 15)
                .unwrap()
                .and_hms_opt(18, 30, 0)
                .unwrap(),
            team1: "Team A".to_string(),
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
    fn test_end_is_start_plus_105_minutes() {
        let r = record(Score::new(2, 1));
        assert_eq!(r.end() - r.start, Duration::minutes(105));
        assert_eq!(r.end().format("%H:%M").to_string(), "20:15");
    }

    #[test]
    fn test_outcome_from_score() {
        assert_eq!(record(Score::new(2, 1)).outcome(), Outcome::Team1);
        assert_eq!(record(Score::new(0, 3)).outcome(), Outcome::Team2);
        assert_eq!(record(Score::new(1, 1)).outcome(), Outcome::Draw);
        assert_eq!(record(Score::Unresolved).outcome(), Outcome::None);
    }

    #[test]
    fn test_score_pair_round_trip_sentinel() {
        assert_eq!(Score::Unresolved.pair(), (-1, -1));
        assert_eq!(Score::from_pair(-1, -1), Score::Unresolved);
        assert_eq!(Score::from_pair(0, 0), Score::new(0, 0));
    }

    #[test]
    fn test_identity_ignores_source_url() {
        let a = record(Score::new(2, 1));
        let mut b = a.clone();
        b.source_url = "https://example.com/b".to_string();
        assert!(a.same_match(&b));

        b.odds.team2 = "4.20".to_string();
        assert!(!a.same_match(&b));
    }

    #[test]
    fn test_page_url_template() {
        let config = Config::default();
        assert_eq!(
            config.page_url("https://www.oddsportal.com/soccer/germany/bundesliga/results/", 3),
            "https://www.oddsportal.com/soccer/germany/bundesliga/results/page/3/"
        );
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.anomalies.len(), 3);
    }
}
