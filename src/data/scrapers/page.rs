//! Walks the rows of one results page in document order

use super::builder::MatchRecordBuilder;
use super::date_state::DateCarryState;
use super::{Markup, RowKind};
use crate::data::AnomalyTable;
use crate::{MatchRecord, Result, ScrapeError};
use chrono::NaiveDate;
use scraper::Html;
use std::ops::AddAssign;

/// What the caller knows about the page being parsed
#[derive(Debug, Clone)]
pub struct PageContext<'a> {
    pub league: &'a str,
    pub area: &'a str,
    pub url: &'a str,
    /// Date of the run, for "Today"/"Tomorrow"/"Yesterday" headers
    pub today: NaiveDate,
    pub anomalies: &'a AnomalyTable,
}

/// Row counts of a parsed page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    pub date_markers: usize,
    pub match_rows: usize,
    pub unsupported_date_skips: usize,
    pub odds_unavailable_skips: usize,
    pub anomalies_corrected: usize,
    pub records: usize,
}

impl AddAssign for PageStats {
    fn add_assign(&mut self, other: PageStats) {
        self.date_markers += other.date_markers;
        self.match_rows += other.match_rows;
        self.unsupported_date_skips += other.unsupported_date_skips;
        self.odds_unavailable_skips += other.odds_unavailable_skips;
        self.anomalies_corrected += other.anomalies_corrected;
        self.records += other.records;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub records: Vec<MatchRecord>,
    pub stats: PageStats,
}

impl ParsedPage {
    /// True when the page had no results table rows at all
    pub fn is_empty(&self) -> bool {
        self.stats.date_markers == 0 && self.stats.match_rows == 0
    }
}

/// Parse one page of the results table into match records
pub fn parse_page(markup: &dyn Markup, html: &str, context: &PageContext) -> Result<ParsedPage> {
    let document = Html::parse_document(html);
    let rows = markup.rows(&document);
    let mut page = ParsedPage::default();

    if rows.is_empty() {
        log::debug!("No results table rows at {}", context.url);
        return Ok(page);
    }

    let season = markup
        .season(&document)
        .ok_or_else(|| ScrapeError::StructuralParse {
            url: context.url.to_string(),
            context: format!("{} markup", markup.name()),
            message: "missing season header".to_string(),
        })?;

    let builder = MatchRecordBuilder::new(markup, context, season);
    let mut state = DateCarryState::new();

    for row in rows {
        match markup.classify(&row) {
            RowKind::Unclassified => {}
            RowKind::DateMarker => {
                page.stats.date_markers += 1;
                let label = markup
                    .date_label(&row)
                    .ok_or_else(|| ScrapeError::StructuralParse {
                        url: context.url.to_string(),
                        context: format!("date marker #{}", page.stats.date_markers),
                        message: "missing date label".to_string(),
                    })?;
                state.observe_date_label(&label, context.today);
            }
            RowKind::MatchRow => {
                page.stats.match_rows += 1;
                let first_after_marker = state.next_match_row();
                let supported = DateCarryState::is_supported(state.current_date());
                if !supported && !first_after_marker {
                    log::debug!(
                        "Skipping row under unsupported date {:?} at {}",
                        state.current_date(),
                        context.url
                    );
                    page.stats.unsupported_date_skips += 1;
                    continue;
                }

                let tolerated = !supported;
                if let Some(record) = builder.build(&row, &state, tolerated, &mut page.stats)? {
                    page.records.push(record);
                }
            }
        }
    }

    page.stats.records = page.records.len();
    log::debug!(
        "Parsed {} records from {} ({} rows, {} without odds, {} unsupported)",
        page.stats.records,
        context.url,
        page.stats.match_rows,
        page.stats.odds_unavailable_skips,
        page.stats.unsupported_date_skips
    );
    Ok(page)
}
