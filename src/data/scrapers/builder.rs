//! Turns one match row into a validated [`MatchRecord`]

use super::date_state::{DateCarryState, DATE_FORMAT};
use super::page::{PageContext, PageStats};
use super::Markup;
use crate::{MatchRecord, Odds, Result, ScrapeError, SEASON_PLACEHOLDER};
use chrono::{Datelike, NaiveDateTime};
use scraper::ElementRef;

/// Number of odds columns (team 1, draw, team 2)
pub const ODDS_COLUMNS: usize = 3;

/// Stands in for a team name in errors about rows without participants
const UNKNOWN_TEAM: &str = "?";

/// Season of a match. The placeholder is resolved from the kick-off: January
/// to June belongs to the season that started the year before.
pub fn resolve_season(season: &str, start: NaiveDateTime) -> String {
    if season != SEASON_PLACEHOLDER {
        return season.to_string();
    }
    let year = start.year();
    if start.month() <= 6 {
        format!("{}/{}", year - 1, year)
    } else {
        format!("{}/{}", year, year + 1)
    }
}

/// Builds records for the match rows of one page
pub struct MatchRecordBuilder<'a> {
    markup: &'a dyn Markup,
    context: &'a PageContext<'a>,
    /// Season as extracted from the page, possibly the placeholder
    season: String,
}

impl<'a> MatchRecordBuilder<'a> {
    pub fn new(markup: &'a dyn Markup, context: &'a PageContext<'a>, season: String) -> Self {
        MatchRecordBuilder {
            markup,
            context,
            season,
        }
    }

    fn structural(&self, context: String, message: &str) -> ScrapeError {
        ScrapeError::StructuralParse {
            url: self.context.url.to_string(),
            context,
            message: message.to_string(),
        }
    }

    /// Build the record for a match row.
    ///
    /// `tolerated` is set for the first row after a date marker whose label
    /// is not supported: such a row is attempted, and skipped rather than
    /// failed when its kick-off cannot be read.
    pub fn build(
        &self,
        row: &ElementRef,
        state: &DateCarryState,
        tolerated: bool,
        stats: &mut PageStats,
    ) -> Result<Option<MatchRecord>> {
        let Some(date) = state.current_date() else {
            stats.unsupported_date_skips += 1;
            return Ok(None);
        };

        // Read early so that kick-off errors can name the match
        let participants = self.markup.participants(row);
        let (known1, known2) = match &participants {
            Some((team1, team2)) => (team1.as_str(), team2.as_str()),
            None => (UNKNOWN_TEAM, UNKNOWN_TEAM),
        };

        let time = self.markup.time(row).ok_or_else(|| {
            self.structural(
                format!("{} - {} on {}", known1, known2, date),
                "missing kick-off time",
            )
        })?;

        let value = format!("{} {}", date, time);
        let start = match NaiveDateTime::parse_from_str(&value, &format!("{} %H:%M", DATE_FORMAT))
        {
            Ok(start) => start,
            Err(e) if tolerated => {
                log::debug!("Skipping first row under unsupported date {:?}: {}", date, e);
                stats.unsupported_date_skips += 1;
                return Ok(None);
            }
            Err(e) => {
                return Err(ScrapeError::StartTime {
                    value,
                    team1: known1.to_string(),
                    team2: known2.to_string(),
                    url: self.context.url.to_string(),
                    source: e,
                })
            }
        };

        let season = resolve_season(&self.season, start);
        let game_type = state.game_type();

        let (team1, team2) =
            participants.ok_or_else(|| self.structural(value.clone(), "missing participants"))?;

        let score = match self.markup.score(row) {
            Ok(score) => score,
            Err(malformed) => match self.context.anomalies.lookup(&team1, &team2, start) {
                Some(score) => {
                    log::debug!(
                        "Corrected score of {} - {} on {} (cell read {:?})",
                        team1,
                        team2,
                        value,
                        malformed.0
                    );
                    stats.anomalies_corrected += 1;
                    score
                }
                None => {
                    return Err(ScrapeError::UnknownAnomaly {
                        team1,
                        team2,
                        start: value,
                        url: self.context.url.to_string(),
                    })
                }
            },
        };

        let odds = self.markup.odds(row);
        if odds.is_empty() {
            stats.odds_unavailable_skips += 1;
            return Ok(None);
        }
        let [team1_odds, draw_odds, team2_odds]: [String; ODDS_COLUMNS] =
            odds.try_into().map_err(|odds: Vec<String>| {
                self.structural(
                    format!("{} - {} on {}", team1, team2, value),
                    &format!("expected {} odds, found {}", ODDS_COLUMNS, odds.len()),
                )
            })?;

        Ok(Some(MatchRecord {
            league: self.context.league.to_string(),
            area: self.context.area.to_string(),
            source_url: self.context.url.to_string(),
            season,
            game_type,
            start,
            team1,
            team2,
            score,
            odds: Odds {
                team1: team1_odds,
                draw: draw_odds,
                team2: team2_odds,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_season_resolution() {
        assert_eq!(resolve_season("xx/xx", at(2021, 3, 15)), "2020/2021");
        assert_eq!(resolve_season("xx/xx", at(2021, 8, 1)), "2021/2022");
        assert_eq!(resolve_season("xx/xx", at(2021, 6, 30)), "2020/2021");
        assert_eq!(resolve_season("xx/xx", at(2021, 7, 1)), "2021/2022");
        assert_eq!(resolve_season("2009/2010", at(2021, 8, 1)), "2009/2010");
    }
}
