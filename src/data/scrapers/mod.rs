//! Scrapers for the odds site's results table
//!
//! The site has shipped two layouts of the same table. Each one is a
//! [`Markup`]: it knows how to tell date headers from match rows and where
//! every field of a match row lives. The rest of the pipeline only talks to
//! the trait, so the layout is chosen once per run.

pub mod builder;
pub mod current;
pub mod date_state;
pub mod fetch;
pub mod league;
pub mod legacy;
pub mod page;

pub use builder::{resolve_season, MatchRecordBuilder};
pub use current::CurrentMarkup;
pub use date_state::DateCarryState;
pub use fetch::{HttpPageSource, PageSource};
pub use league::{LeagueScraper, RunSummary, UrlFailure};
pub use legacy::LegacyMarkup;
pub use page::{parse_page, PageContext, PageStats, ParsedPage};

use crate::{Result, Score, ScrapeError};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::str::FromStr;

/// What a row of the results table is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Date (or section) header for the rows that follow
    DateMarker,
    /// One match with its kick-off time
    MatchRow,
    /// Anything else; ignored
    Unclassified,
}

/// Score cell whose content is neither a score nor a known sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedScore(pub String);

/// Row classification and field extraction for one layout of the site
pub trait Markup {
    fn name(&self) -> &'static str;

    /// Candidate rows of the results table, in document order.
    /// Empty when the page has no results table at all.
    fn rows<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;

    /// Classify a row by its tag and class tokens only
    fn classify(&self, row: &ElementRef) -> RowKind;

    /// Raw label of a date marker row
    fn date_label(&self, row: &ElementRef) -> Option<String>;

    /// Season of the page, or the placeholder when the page does not say.
    /// `None` means the element carrying it is missing.
    fn season(&self, document: &Html) -> Option<String>;

    /// Kick-off time text ("HH:MM") of a match row
    fn time(&self, row: &ElementRef) -> Option<String>;

    /// Home and away team names
    fn participants(&self, row: &ElementRef) -> Option<(String, String)>;

    fn score(&self, row: &ElementRef) -> std::result::Result<Score, MalformedScore>;

    /// Published odds, empty while the market is not open
    fn odds(&self, row: &ElementRef) -> Vec<String>;
}

/// Which layout to parse with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    Current,
    Legacy,
}

impl MarkupKind {
    pub fn build(self) -> Result<Box<dyn Markup>> {
        Ok(match self {
            MarkupKind::Current => Box::new(CurrentMarkup::new()?),
            MarkupKind::Legacy => Box::new(LegacyMarkup::new()?),
        })
    }
}

impl fmt::Display for MarkupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupKind::Current => write!(f, "current"),
            MarkupKind::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for MarkupKind {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "current" | "new" => Ok(MarkupKind::Current),
            "legacy" | "old" => Ok(MarkupKind::Legacy),
            other => Err(ScrapeError::Config(format!(
                "Unknown markup {:?}. Use current or legacy.",
                other
            ))),
        }
    }
}

/// Compile a CSS selector
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector(css.to_string()))
}

/// Does the element carry every one of the class tokens
pub(crate) fn has_classes(element: &ElementRef, tokens: &[&str]) -> bool {
    tokens
        .iter()
        .all(|token| element.value().classes().any(|class| class == *token))
}

/// Visible text with non-breaking spaces removed and whitespace collapsed
pub(crate) fn clean_text(element: &ElementRef) -> String {
    let raw: String = element.text().collect();
    normalize_ws(&raw)
}

pub(crate) fn normalize_ws(s: &str) -> String {
    s.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first matching descendant, if it has any
pub(crate) fn first_text(element: &ElementRef, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| clean_text(&el))
        .filter(|text| !text.is_empty())
}

/// Odds of a row from its cell texts, in column order.
///
/// A cell showing "-" or nothing is an unpriced market. A row with any
/// unpriced market yields no odds at all, so it is skipped like a row
/// without odds.
pub(crate) fn collect_odds<I>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut odds = Vec::new();
    for cell in cells {
        let cell = cell.trim();
        if cell.is_empty() || cell == "-" {
            return Vec::new();
        }
        odds.push(cell.to_string());
    }
    odds
}

/// Score texts the site shows instead of a result
const SCORE_SENTINELS: [&str; 6] = [
    "postp.",
    "postponed",
    "canc.",
    "cancelled",
    "abn.",
    "abandoned",
];

pub(crate) fn is_score_sentinel(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    SCORE_SENTINELS.iter().any(|s| lower == *s)
}

/// Parse "2:1", "2 - 1", "2:1 pen." or a sentinel
pub(crate) fn parse_score_text(
    text: &str,
    pattern: &Regex,
) -> std::result::Result<Score, MalformedScore> {
    if is_score_sentinel(text) {
        return Ok(Score::Unresolved);
    }
    let caps = pattern
        .captures(text.trim())
        .ok_or_else(|| MalformedScore(text.to_string()))?;
    let team1 = caps[1].parse().map_err(|_| MalformedScore(text.to_string()))?;
    let team2 = caps[2].parse().map_err(|_| MalformedScore(text.to_string()))?;
    Ok(Score::new(team1, team2))
}

pub(crate) fn score_pattern() -> Result<Regex> {
    Regex::new(r"^(\d{1,3})\s*[:\-–]\s*(\d{1,3})\b")
        .map_err(|e| ScrapeError::Config(format!("Invalid score pattern: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_kind_from_str() {
        assert_eq!("current".parse::<MarkupKind>().unwrap(), MarkupKind::Current);
        assert_eq!("Legacy".parse::<MarkupKind>().unwrap(), MarkupKind::Legacy);
        assert!("mobile".parse::<MarkupKind>().is_err());
    }

    #[test]
    fn test_score_text() {
        let re = score_pattern().unwrap();
        assert_eq!(parse_score_text("2:1", &re), Ok(Score::new(2, 1)));
        assert_eq!(parse_score_text(" 0 - 0 ", &re), Ok(Score::new(0, 0)));
        assert_eq!(parse_score_text("3:2 pen.", &re), Ok(Score::new(3, 2)));
        assert_eq!(parse_score_text("postp.", &re), Ok(Score::Unresolved));
        assert_eq!(parse_score_text("Cancelled", &re), Ok(Score::Unresolved));
        assert_eq!(
            parse_score_text("award.", &re),
            Err(MalformedScore("award.".to_string()))
        );
    }

    #[test]
    fn test_collect_odds_drops_rows_with_unpriced_markets() {
        let cells = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            collect_odds(cells(&["2.10", "3.30", "3.40"])),
            vec!["2.10", "3.30", "3.40"]
        );
        assert!(collect_odds(cells(&["2.10", "-", "3.40"])).is_empty());
        assert!(collect_odds(cells(&["-", "-", "-"])).is_empty());
        assert!(collect_odds(cells(&["2.10", "", "3.40"])).is_empty());
        assert!(collect_odds(Vec::new()).is_empty());
        // Unexpected column counts are left for the builder to reject
        assert_eq!(collect_odds(cells(&["2.10", "3.30"])).len(), 2);
    }

    #[test]
    fn test_normalize_ws_strips_nbsp() {
        assert_eq!(normalize_ws("\u{a0}Bayern  Munich\u{a0}"), "Bayern Munich");
    }
}
