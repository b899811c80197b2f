//! Stops pagination once a page only repeats what is already collected
//!
//! The site has no "last page" marker: asking for a page past the end serves
//! the last page again. After each page is appended, any record that equals
//! an earlier one (ignoring the page it came from) means the page brought
//! nothing new.

use super::MatchDataset;
use crate::MatchRecord;
use std::collections::HashSet;

/// `true` for every record that repeats an earlier one
pub fn duplicate_mask(records: &[MatchRecord]) -> Vec<bool> {
    let mut seen = HashSet::with_capacity(records.len());
    records.iter().map(|r| !seen.insert(r.key())).collect()
}

/// Verdict after a page has been appended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    /// The page was new; fetch the next one
    Continue,
    /// The page repeated known records, which were dropped
    Stop { duplicates: usize },
}

impl PageVerdict {
    pub fn should_continue(&self) -> bool {
        matches!(self, PageVerdict::Continue)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationDedupController;

impl PaginationDedupController {
    pub fn new() -> Self {
        PaginationDedupController
    }

    /// Check the dataset after a page was appended. Duplicates are removed,
    /// keeping first occurrences.
    pub fn after_page(&self, dataset: &mut MatchDataset) -> PageVerdict {
        let duplicates = dataset.retain_first_occurrences();
        if duplicates == 0 {
            PageVerdict::Continue
        } else {
            log::debug!(
                "Dropped {} repeated records; dataset has {}",
                duplicates,
                dataset.len()
            );
            PageVerdict::Stop { duplicates }
        }
    }
}
