//! SQLite storage for scraped matches

use crate::{GameType, MatchRecord, Odds, Result, Score};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const START_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                league TEXT NOT NULL,
                area TEXT NOT NULL,
                retrieved_from_url TEXT NOT NULL,
                season TEXT NOT NULL,
                game_type TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                team1 TEXT NOT NULL,
                team2 TEXT NOT NULL,
                team1_score INTEGER NOT NULL,
                team2_score INTEGER NOT NULL,
                outcome TEXT NOT NULL,
                team1_odds TEXT NOT NULL,
                team2_odds TEXT NOT NULL,
                draw_odds TEXT NOT NULL,
                UNIQUE(league, season, start_time, team1, team2)
            );

            CREATE INDEX IF NOT EXISTS idx_matches_start ON matches(start_time);
            CREATE INDEX IF NOT EXISTS idx_matches_league ON matches(league, season);
            "#,
        )?;
        Ok(())
    }

    /// Insert or update a match record
    pub fn upsert_match(&self, record: &MatchRecord) -> Result<()> {
        upsert_on(&self.conn, record)
    }

    /// Insert multiple match records in one transaction
    pub fn upsert_matches(&mut self, records: &[MatchRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for record in records {
            upsert_on(&tx, record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Get all matches ordered by kick-off
    pub fn get_all_matches(&self) -> Result<Vec<MatchRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT league, area, retrieved_from_url, season, game_type, start_time,
                    team1, team2, team1_score, team2_score, team1_odds, draw_odds, team2_odds
             FROM matches
             ORDER BY start_time, id",
        )?;

        let matches = stmt
            .query_map([], Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(matches)
    }

    fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<MatchRecord> {
        let game_type: String = row.get(4)?;
        let game_type = match game_type.as_str() {
            "LEAGUE" => GameType::League,
            "PROMOTION" => GameType::Promotion,
            other => {
                return Err(rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    format!("unknown game type {:?}", other).into(),
                ))
            }
        };
        let start_str: String = row.get(5)?;
        let start = NaiveDateTime::parse_from_str(&start_str, START_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(MatchRecord {
            league: row.get(0)?,
            area: row.get(1)?,
            source_url: row.get(2)?,
            season: row.get(3)?,
            game_type,
            start,
            team1: row.get(6)?,
            team2: row.get(7)?,
            score: Score::from_pair(row.get(8)?, row.get(9)?),
            odds: Odds {
                team1: row.get(10)?,
                draw: row.get(11)?,
                team2: row.get(12)?,
            },
        })
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let match_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;

        let league_count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT league || '/' || area) FROM matches",
            [],
            |row| row.get(0),
        )?;

        let unresolved_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM matches WHERE outcome = 'NONE'",
            [],
            |row| row.get(0),
        )?;

        let min_start: Option<String> = self
            .conn
            .query_row("SELECT MIN(start_time) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        let max_start: Option<String> = self
            .conn
            .query_row("SELECT MAX(start_time) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            match_count: match_count as usize,
            league_count: league_count as usize,
            unresolved_count: unresolved_count as usize,
            earliest_match: min_start
                .and_then(|s| NaiveDateTime::parse_from_str(&s, START_FORMAT).ok()),
            latest_match: max_start
                .and_then(|s| NaiveDateTime::parse_from_str(&s, START_FORMAT).ok()),
        })
    }
}

fn upsert_on(conn: &Connection, record: &MatchRecord) -> Result<()> {
    let (team1_score, team2_score) = record.score.pair();
    conn.execute(
        r#"
        INSERT INTO matches (league, area, retrieved_from_url, season, game_type,
                             start_time, end_time, team1, team2, team1_score, team2_score,
                             outcome, team1_odds, team2_odds, draw_odds)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        ON CONFLICT(league, season, start_time, team1, team2) DO UPDATE SET
            retrieved_from_url = excluded.retrieved_from_url,
            game_type = excluded.game_type,
            team1_score = excluded.team1_score,
            team2_score = excluded.team2_score,
            outcome = excluded.outcome,
            team1_odds = excluded.team1_odds,
            team2_odds = excluded.team2_odds,
            draw_odds = excluded.draw_odds
        "#,
        params![
            record.league,
            record.area,
            record.source_url,
            record.season,
            record.game_type.to_string(),
            record.start.format(START_FORMAT).to_string(),
            record.end().format(START_FORMAT).to_string(),
            record.team1,
            record.team2,
            team1_score,
            team2_score,
            record.outcome().to_string(),
            record.odds.team1,
            record.odds.team2,
            record.odds.draw,
        ],
    )?;
    Ok(())
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub match_count: usize,
    pub league_count: usize,
    pub unresolved_count: usize,
    pub earliest_match: Option<NaiveDateTime>,
    pub latest_match: Option<NaiveDateTime>,
}
