//! Page fetching
//!
//! Parsing never does I/O itself; it is handed the HTML of a page by a
//! [`PageSource`].

use crate::{Result, ScrapeConfig, ScrapeError};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Anything that can produce the HTML of a results page
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTP, with an optional on-disk HTML cache
pub struct HttpPageSource {
    client: reqwest::blocking::Client,
    /// Pause after every network request, to let the site breathe
    delay: Duration,
    /// Optional cache directory for offline HTML files
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
}

impl HttpPageSource {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpPageSource {
            client,
            delay: Duration::from_millis(config.page_delay_ms),
            cache_dir: None,
            offline_only: false,
        })
    }

    /// Create source with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// Get the cache file path for a page URL
    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(cache_file_name(url)))
    }

    fn load_from_cache(&self, url: &str) -> Option<String> {
        let path = self.cache_path(url)?;
        if path.exists() {
            log::debug!("Loading from cache: {}", path.display());
            std::fs::read_to_string(&path).ok()
        } else {
            None
        }
    }

    fn save_to_cache(&self, url: &str, html: &str) -> Result<()> {
        if let Some(path) = self.cache_path(url) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, html)?;
            log::debug!("Saved to cache: {}", path.display());
        }
        Ok(())
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &str) -> Result<String> {
        // The fragment is never sent, every page would be the first one
        if url.contains('#') {
            return Err(ScrapeError::Fetch {
                url: url.to_string(),
                message: "URL fragments are not sent to the server; put the page in the path"
                    .to_string(),
            });
        }

        if let Some(html) = self.load_from_cache(url) {
            return Ok(html);
        }

        if self.offline_only {
            return Err(ScrapeError::Fetch {
                url: url.to_string(),
                message: "no cached page (offline mode)".to_string(),
            });
        }

        log::debug!("Fetching {}", url);
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(ScrapeError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }
        let html = response.text()?;

        if let Err(e) = self.save_to_cache(url, &html) {
            log::warn!("Failed to cache {}: {}", url, e);
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        Ok(html)
    }
}

/// Safe file name for a page URL
pub fn cache_file_name(url: &str) -> String {
    url.replace("https://", "")
        .replace("http://", "")
        .replace(['/', '?', '#'], "_")
        + ".html"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    #[test]
    fn test_cache_file_name_keeps_page_number() {
        assert_eq!(
            cache_file_name("https://www.oddsportal.com/soccer/germany/bundesliga/results/page/2/"),
            "www.oddsportal.com_soccer_germany_bundesliga_results_page_2_.html"
        );
    }

    #[test]
    fn test_offline_source_reads_cache() {
        let dir = std::env::temp_dir().join(format!("soccer-odds-cache-{}", std::process::id()));
        let source = HttpPageSource::new(&Config::default().scrape)
            .unwrap()
            .with_cache(&dir)
            .offline_only(true);

        let url = "https://example.com/results/page/1/";
        assert!(matches!(source.fetch(url), Err(ScrapeError::Fetch { .. })));

        source.save_to_cache(url, "<html></html>").unwrap();
        assert_eq!(source.fetch(url).unwrap(), "<html></html>");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_fragment_url_is_rejected() {
        let dir = std::env::temp_dir().join(format!("soccer-odds-frag-{}", std::process::id()));
        let source = HttpPageSource::new(&Config::default().scrape)
            .unwrap()
            .with_cache(&dir)
            .offline_only(true);

        let url = "https://example.com/results/#/page/2/";
        source.save_to_cache(url, "<html></html>").unwrap();
        match source.fetch(url) {
            Err(ScrapeError::Fetch { url: failed, message }) => {
                assert_eq!(failed, url);
                assert!(message.contains("fragment"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_default_page_urls_reach_the_server() {
        let config = Config::default();
        let base = "https://www.oddsportal.com/soccer/germany/bundesliga/results/";
        let page1 = config.page_url(base, 1);
        let page2 = config.page_url(base, 2);
        assert!(!page2.contains('#'));
        assert_ne!(cache_file_name(&page1), cache_file_name(&page2));
    }
}
