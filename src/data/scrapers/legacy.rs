//! Older table layout of the results page
//!
//! Date headers are `tr.center.nob-border`, matches are `tr.deactivate[xeid]`.
//! The season is not printed anywhere; it is part of the league slug in the
//! participant link (`/soccer/germany/bundesliga-2009-2010/...`).

use super::{
    clean_text, collect_odds, first_text, has_classes, parse_score_text, score_pattern, selector,
    MalformedScore, Markup, RowKind,
};
use crate::{Result, Score, SEASON_PLACEHOLDER};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const DATE_MARKER_CLASSES: [&str; 2] = ["center", "nob-border"];
const MATCH_ROW_CLASS: &str = "deactivate";
const MATCH_ROW_ATTR: &str = "xeid";

pub struct LegacyMarkup {
    rows: Selector,
    datet: Selector,
    participant: Selector,
    participant_link: Selector,
    score: Selector,
    odds: Selector,
    score_pattern: Regex,
    season_slug: Regex,
}

impl LegacyMarkup {
    pub fn new() -> Result<Self> {
        Ok(LegacyMarkup {
            rows: selector("#tournamentTable tr")?,
            datet: selector(".datet")?,
            participant: selector(".table-participant")?,
            participant_link: selector(".table-participant a[href]")?,
            score: selector(".table-score")?,
            odds: selector(".odds-nowrp")?,
            score_pattern: score_pattern()?,
            season_slug: Regex::new(r"-(\d{4})(?:-(\d{4}))?$").map_err(|e| {
                crate::ScrapeError::Config(format!("Invalid season pattern: {}", e))
            })?,
        })
    }

    /// Season from a participant link, e.g. `bundesliga-2009-2010` -> `2009/2010`
    fn season_from_href(&self, href: &str) -> String {
        for segment in href.split('/') {
            if let Some(caps) = self.season_slug.captures(segment) {
                return match caps.get(2) {
                    Some(end) => format!("{}/{}", &caps[1], end.as_str()),
                    None => caps[1].to_string(),
                };
            }
        }
        SEASON_PLACEHOLDER.to_string()
    }
}

impl Markup for LegacyMarkup {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn rows<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.rows).collect()
    }

    fn classify(&self, row: &ElementRef) -> RowKind {
        if row.value().name() != "tr" {
            return RowKind::Unclassified;
        }
        if has_classes(row, &DATE_MARKER_CLASSES) {
            RowKind::DateMarker
        } else if has_classes(row, &[MATCH_ROW_CLASS]) && row.value().attr(MATCH_ROW_ATTR).is_some()
        {
            RowKind::MatchRow
        } else {
            RowKind::Unclassified
        }
    }

    fn date_label(&self, row: &ElementRef) -> Option<String> {
        first_text(row, &self.datet)
    }

    fn season(&self, document: &Html) -> Option<String> {
        let first_match = self
            .rows(document)
            .into_iter()
            .find(|row| self.classify(row) == RowKind::MatchRow);

        match first_match {
            // Nothing to attribute a season to
            None => Some(SEASON_PLACEHOLDER.to_string()),
            Some(row) => {
                let link = row.select(&self.participant_link).next()?;
                let href = link.value().attr("href")?;
                Some(self.season_from_href(href))
            }
        }
    }

    fn time(&self, row: &ElementRef) -> Option<String> {
        first_text(row, &self.datet)
    }

    fn participants(&self, row: &ElementRef) -> Option<(String, String)> {
        let text = first_text(row, &self.participant)?;
        let parts: Vec<&str> = text.split(" - ").map(str::trim).collect();
        if parts.len() < 2 {
            return None;
        }
        let home = parts[0];
        let away = parts[parts.len() - 1];
        if home.is_empty() || away.is_empty() {
            return None;
        }
        Some((home.to_string(), away.to_string()))
    }

    fn score(&self, row: &ElementRef) -> std::result::Result<Score, MalformedScore> {
        match row.select(&self.score).next() {
            None => Ok(Score::Unresolved),
            Some(cell) => parse_score_text(&clean_text(&cell), &self.score_pattern),
        }
    }

    fn odds(&self, row: &ElementRef) -> Vec<String> {
        collect_odds(row.select(&self.odds).map(|cell| clean_text(&cell)))
    }
}
