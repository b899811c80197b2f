//! Current layout of the results page
//!
//! Rows are `div` children of `#tournamentTable`. A header line carries the
//! competition and season ("Bundesliga 2020/2021", or just "Bundesliga" for the
//! running season). Each match row keeps home and away team, the two halves
//! of the score and the odds in separate elements.

use super::{
    clean_text, collect_odds, first_text, has_classes, is_score_sentinel, selector,
    MalformedScore, Markup, RowKind,
};
use crate::{Result, Score, SEASON_PLACEHOLDER};
use scraper::{ElementRef, Html, Selector};

const DATE_MARKER_CLASSES: [&str; 2] = ["event-group", "date-header"];
const MATCH_ROW_CLASSES: [&str; 2] = ["event-row", "match-row"];
const MATCH_ROW_ATTR: &str = "data-event-id";

pub struct CurrentMarkup {
    rows: Selector,
    season_header: Selector,
    date_label: Selector,
    time: Selector,
    home: Selector,
    away: Selector,
    score: Selector,
    score_home: Selector,
    score_away: Selector,
    odds: Selector,
}

impl CurrentMarkup {
    pub fn new() -> Result<Self> {
        Ok(CurrentMarkup {
            rows: selector("#tournamentTable > div")?,
            season_header: selector("#tournamentTable .season-header")?,
            date_label: selector(".date-label")?,
            time: selector(".event-time")?,
            home: selector(".participant-home")?,
            away: selector(".participant-away")?,
            score: selector(".event-score")?,
            score_home: selector(".score-home")?,
            score_away: selector(".score-away")?,
            odds: selector(".odds-cell")?,
        })
    }
}

/// Trailing token of the season header, or the placeholder when the header
/// only names the competition
pub fn season_from_header(header: &str) -> String {
    let mut tokens = header.split_whitespace();
    let last = tokens.next_back();
    match last {
        Some(token) if tokens.next().is_some() && token.chars().any(|c| c.is_ascii_digit()) => {
            token.to_string()
        }
        _ => SEASON_PLACEHOLDER.to_string(),
    }
}

impl Markup for CurrentMarkup {
    fn name(&self) -> &'static str {
        "current"
    }

    fn rows<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.rows).collect()
    }

    fn classify(&self, row: &ElementRef) -> RowKind {
        if row.value().name() != "div" {
            return RowKind::Unclassified;
        }
        if has_classes(row, &DATE_MARKER_CLASSES) {
            RowKind::DateMarker
        } else if has_classes(row, &MATCH_ROW_CLASSES)
            && row.value().attr(MATCH_ROW_ATTR).is_some()
        {
            RowKind::MatchRow
        } else {
            RowKind::Unclassified
        }
    }

    fn date_label(&self, row: &ElementRef) -> Option<String> {
        first_text(row, &self.date_label)
    }

    fn season(&self, document: &Html) -> Option<String> {
        let header = document.select(&self.season_header).next()?;
        Some(season_from_header(&clean_text(&header)))
    }

    fn time(&self, row: &ElementRef) -> Option<String> {
        first_text(row, &self.time)
    }

    fn participants(&self, row: &ElementRef) -> Option<(String, String)> {
        let home = first_text(row, &self.home)?;
        let away = first_text(row, &self.away)?;
        Some((home, away))
    }

    fn score(&self, row: &ElementRef) -> std::result::Result<Score, MalformedScore> {
        let Some(cell) = row.select(&self.score).next() else {
            return Ok(Score::Unresolved);
        };
        let text = clean_text(&cell);
        if is_score_sentinel(&text) {
            return Ok(Score::Unresolved);
        }

        let home = first_text(&cell, &self.score_home);
        let away = first_text(&cell, &self.score_away);
        match (home, away) {
            (Some(home), Some(away)) => match (home.parse(), away.parse()) {
                (Ok(h), Ok(a)) => Ok(Score::new(h, a)),
                _ => Err(MalformedScore(text)),
            },
            _ => Err(MalformedScore(text)),
        }
    }

    fn odds(&self, row: &ElementRef) -> Vec<String> {
        collect_odds(row.select(&self.odds).map(|cell| clean_text(&cell)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div id="tournamentTable">
          <div class="season-header">Bundesliga 2020/2021</div>
          <div class="event-group date-header"><span class="date-label">15 Mar 2021</span></div>
          <div class="event-row match-row" data-event-id="e1">
            <span class="event-time">18:30</span>
            <a class="participant-home">Team&nbsp;A</a>
            <a class="participant-away"> Team B </a>
            <div class="event-score"><span class="score-home">2</span>:<span class="score-away">1</span></div>
            <span class="odds-cell">1.80</span><span class="odds-cell">3.20</span><span class="odds-cell">4.10</span>
          </div>
          <div class="event-row match-row" data-event-id="e2">
            <span class="event-time">20:30</span>
            <a class="participant-home">Team C</a>
            <a class="participant-away">Team D</a>
            <div class="event-score">cancelled</div>
            <span class="odds-cell">-</span><span class="odds-cell">-</span><span class="odds-cell">-</span>
          </div>
          <div class="event-row match-row" data-event-id="e3">
            <span class="event-time">20:30</span>
            <a class="participant-home">Team E</a>
            <a class="participant-away">Team F</a>
            <div class="event-score"><span class="score-home">?</span></div>
          </div>
          <div class="banner">advert</div>
        </div>
    "#;

    #[test]
    fn test_classification() {
        let markup = CurrentMarkup::new().unwrap();
        let doc = Html::parse_document(PAGE);
        let kinds: Vec<RowKind> = markup
            .rows(&doc)
            .iter()
            .map(|r| markup.classify(r))
            .collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::Unclassified,
                RowKind::DateMarker,
                RowKind::MatchRow,
                RowKind::MatchRow,
                RowKind::MatchRow,
                RowKind::Unclassified,
            ]
        );
    }

    #[test]
    fn test_field_extraction() {
        let markup = CurrentMarkup::new().unwrap();
        let doc = Html::parse_document(PAGE);
        let rows = markup.rows(&doc);

        assert_eq!(markup.date_label(&rows[1]).as_deref(), Some("15 Mar 2021"));
        assert_eq!(markup.time(&rows[2]).as_deref(), Some("18:30"));
        assert_eq!(
            markup.participants(&rows[2]),
            Some(("Team A".to_string(), "Team B".to_string()))
        );
        assert_eq!(markup.score(&rows[2]), Ok(Score::new(2, 1)));
        assert_eq!(markup.odds(&rows[2]), vec!["1.80", "3.20", "4.10"]);

        assert_eq!(markup.score(&rows[3]), Ok(Score::Unresolved));
        assert!(markup.odds(&rows[3]).is_empty());

        assert!(markup.score(&rows[4]).is_err());
    }

    #[test]
    fn test_season_header() {
        let markup = CurrentMarkup::new().unwrap();
        let doc = Html::parse_document(PAGE);
        assert_eq!(markup.season(&doc).as_deref(), Some("2020/2021"));

        assert_eq!(season_from_header("Bundesliga"), SEASON_PLACEHOLDER);
        assert_eq!(season_from_header("2. Bundesliga"), SEASON_PLACEHOLDER);
        assert_eq!(season_from_header("Premier League 2019/2020"), "2019/2020");

        let bare = Html::parse_document(r#"<div id="tournamentTable"></div>"#);
        assert_eq!(markup.season(&bare), None);
    }
}
