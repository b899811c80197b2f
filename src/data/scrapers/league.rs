//! Scrapes every results URL of a league, page by page

use super::fetch::PageSource;
use super::page::{parse_page, PageContext, PageStats};
use super::{Markup, MarkupKind};
use crate::data::{AnomalyTable, MatchDataset, PageVerdict, PaginationDedupController};
use crate::{Config, LeagueDescriptor, Result, ScrapeError};
use chrono::NaiveDate;

/// A results URL that had to be abandoned
#[derive(Debug)]
pub struct UrlFailure {
    pub url: String,
    pub error: ScrapeError,
}

/// What a league run did
#[derive(Debug, Default)]
pub struct RunSummary {
    pub pages: usize,
    pub records: usize,
    pub stats: PageStats,
    pub failures: Vec<UrlFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: RunSummary) {
        self.pages += other.pages;
        self.records += other.records;
        self.stats += other.stats;
        self.failures.extend(other.failures);
    }
}

pub struct LeagueScraper<'a> {
    config: &'a Config,
    markup: Box<dyn Markup>,
    source: &'a dyn PageSource,
    anomalies: AnomalyTable,
    today: NaiveDate,
    dedup: PaginationDedupController,
}

impl<'a> LeagueScraper<'a> {
    /// Create a scraper using the markup variant and anomaly table of `config`
    pub fn new(config: &'a Config, source: &'a dyn PageSource, today: NaiveDate) -> Result<Self> {
        let markup = config.scrape.markup.parse::<MarkupKind>()?.build()?;
        let anomalies = AnomalyTable::from_entries(&config.anomalies)?;
        log::debug!(
            "Using {} markup with {} known anomalies",
            markup.name(),
            anomalies.len()
        );

        Ok(LeagueScraper {
            config,
            markup,
            source,
            anomalies,
            today,
            dedup: PaginationDedupController::new(),
        })
    }

    /// Scrape all URLs of a league into `dataset`.
    ///
    /// A URL that fails is recorded in the summary and the remaining URLs
    /// are still scraped. Records of pages parsed before the failure stay
    /// in the dataset.
    pub fn scrape_league(
        &self,
        league: &LeagueDescriptor,
        dataset: &mut MatchDataset,
    ) -> RunSummary {
        log::info!(
            "Scraping {} ({}): {} URLs",
            league.league,
            league.area,
            league.urls.len()
        );

        let mut summary = RunSummary::default();
        for url in &league.urls {
            let before = dataset.len();
            if let Err(error) = self.scrape_url(league, url, dataset, &mut summary) {
                log::error!("Giving up on {}: {}", url, error);
                summary.failures.push(UrlFailure {
                    url: url.clone(),
                    error,
                });
            }
            summary.records += dataset.len().saturating_sub(before);
        }

        log::info!(
            "{}: {} pages, {} new records, {} failed URLs",
            league.league,
            summary.pages,
            summary.records,
            summary.failures.len()
        );
        summary
    }

    fn scrape_url(
        &self,
        league: &LeagueDescriptor,
        url: &str,
        dataset: &mut MatchDataset,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let mut previous: Option<PageStats> = None;
        for page_number in 1..=self.config.scrape.max_pages {
            let page_url = self.config.page_url(url, page_number);
            let html = self.source.fetch(&page_url)?;

            let context = PageContext {
                league: &league.league,
                area: &league.area,
                url: &page_url,
                today: self.today,
                anomalies: &self.anomalies,
            };
            let parsed = parse_page(self.markup.as_ref(), &html, &context)?;
            if parsed.is_empty() {
                log::info!("No results table on page {} of {}", page_number, url);
                return Ok(());
            }

            // A page without records never repeats a known record, so the
            // site serving its last page again has to be caught by its counts
            if parsed.records.is_empty() && previous == Some(parsed.stats) {
                log::info!(
                    "Page {} of {} repeats the previous page without records, done",
                    page_number,
                    url
                );
                return Ok(());
            }
            previous = Some(parsed.stats);

            summary.pages += 1;
            summary.stats += parsed.stats;
            dataset.append(parsed.records);

            if let PageVerdict::Stop { duplicates } = self.dedup.after_page(dataset) {
                log::info!(
                    "Page {} of {} repeats {} known records, done",
                    page_number,
                    url,
                    duplicates
                );
                return Ok(());
            }
            log::info!("Page {} of {}: {} records so far", page_number, url, dataset.len());
        }

        log::warn!(
            "Stopped {} after {} pages without reaching the end",
            url,
            self.config.scrape.max_pages
        );
        Ok(())
    }
}
