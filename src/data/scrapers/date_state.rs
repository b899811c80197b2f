//! Date context carried from a date header to the match rows below it

use crate::GameType;
use chrono::{Duration, NaiveDate};

/// Format of a bare date label, e.g. "02 May 2024"
pub const DATE_FORMAT: &str = "%d %b %Y";

/// Labels containing any of these are not parsed
const UNSUPPORTED_MARKERS: [&str; 5] = [
    "Today",
    "Yesterday",
    "Qualification",
    "Promotion",
    "Relegation",
];

/// Qualifiers appended to the date of non-league fixtures
const QUALIFIER_SUFFIXES: [&str; 4] = [" - Play Offs", " - Relegation", " - Promotion", "Promotion"];

/// Words in a label that mark a promotion, relegation or play-off fixture
const NON_LEAGUE_MARKERS: [&str; 3] = ["Play Offs", "Relegation", "Promotion"];

/// State of one page walk: the date header currently in force
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateCarryState {
    current_date: Option<String>,
    is_league_game: bool,
    match_rows_since_marker: usize,
}

impl Default for DateCarryState {
    fn default() -> Self {
        Self::new()
    }
}

impl DateCarryState {
    pub fn new() -> Self {
        DateCarryState {
            current_date: None,
            is_league_game: true,
            match_rows_since_marker: 0,
        }
    }

    /// Take the label of a date marker row as the new context.
    /// `today` resolves "Today", "Tomorrow" and "Yesterday".
    pub fn observe_date_label(&mut self, label: &str, today: NaiveDate) {
        let label = super::normalize_ws(label);
        let absolute = resolve_relative_label(&label, today);
        self.is_league_game = !NON_LEAGUE_MARKERS.iter().any(|m| absolute.contains(m));
        self.current_date = Some(strip_qualifiers(&absolute));
        self.match_rows_since_marker = 0;
    }

    /// Register a match row. Returns true for the first one after a marker.
    pub fn next_match_row(&mut self) -> bool {
        self.match_rows_since_marker += 1;
        self.current_date.is_some() && self.match_rows_since_marker == 1
    }

    pub fn current_date(&self) -> Option<&str> {
        self.current_date.as_deref()
    }

    pub fn is_league_game(&self) -> bool {
        self.is_league_game
    }

    pub fn game_type(&self) -> GameType {
        if self.is_league_game {
            GameType::League
        } else {
            GameType::Promotion
        }
    }

    /// Whether rows under this date string can be parsed
    pub fn is_supported(date: Option<&str>) -> bool {
        match date {
            None => false,
            Some(date) => !UNSUPPORTED_MARKERS.iter().any(|m| date.contains(m)),
        }
    }
}

/// Replace a leading "Today", "Tomorrow" or "Yesterday" (and whatever
/// partial date follows it, up to a " - " qualifier) by the absolute date.
fn resolve_relative_label(label: &str, today: NaiveDate) -> String {
    let offsets = [("Today", 0), ("Tomorrow", 1), ("Yesterday", -1)];
    for (word, days) in offsets {
        if label.starts_with(word) {
            let date = today + Duration::days(days);
            let qualifier = label.find(" - ").map(|i| &label[i..]).unwrap_or("");
            return format!("{}{}", date.format(DATE_FORMAT), qualifier);
        }
    }
    label.to_string()
}

fn strip_qualifiers(label: &str) -> String {
    let mut date = label.trim_end();
    for suffix in QUALIFIER_SUFFIXES {
        if let Some(stripped) = date.strip_suffix(suffix) {
            date = stripped.trim_end();
        }
    }
    date.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_relative_labels() {
        let mut state = DateCarryState::new();
        state.observe_date_label("Tomorrow", may_first());
        assert_eq!(state.current_date(), Some("02 May 2024"));

        state.observe_date_label("Today, 01 May", may_first());
        assert_eq!(state.current_date(), Some("01 May 2024"));

        state.observe_date_label("Yesterday, 30 Apr", may_first());
        assert_eq!(state.current_date(), Some("30 Apr 2024"));
        assert!(state.is_league_game());
    }

    #[test]
    fn test_qualifiers_are_stripped() {
        let mut state = DateCarryState::new();

        state.observe_date_label("29 May 2021 - Play Offs", may_first());
        assert_eq!(state.current_date(), Some("29 May 2021"));
        assert_eq!(state.game_type(), GameType::Promotion);

        state.observe_date_label("27 May 2021 - Relegation", may_first());
        assert_eq!(state.current_date(), Some("27 May 2021"));
        assert!(!state.is_league_game());

        state.observe_date_label("Tomorrow - Promotion", may_first());
        assert_eq!(state.current_date(), Some("02 May 2024"));
        assert_eq!(state.game_type(), GameType::Promotion);

        state.observe_date_label("15 Mar 2021", may_first());
        assert_eq!(state.current_date(), Some("15 Mar 2021"));
        assert_eq!(state.game_type(), GameType::League);
    }

    #[test]
    fn test_supported_dates() {
        assert!(!DateCarryState::is_supported(None));
        assert!(!DateCarryState::is_supported(Some("Today")));
        assert!(!DateCarryState::is_supported(Some("Yesterday, 12 Feb")));
        assert!(!DateCarryState::is_supported(Some("12 Feb 2019 - Qualification")));
        assert!(!DateCarryState::is_supported(Some("12 Feb 2019 Promotion - Final")));
        assert!(DateCarryState::is_supported(Some("12 Feb 2019")));
    }

    #[test]
    fn test_first_match_row_after_marker() {
        let mut state = DateCarryState::new();
        assert!(!state.next_match_row());

        state.observe_date_label("12 Feb 2019", may_first());
        assert!(state.next_match_row());
        assert!(!state.next_match_row());

        state.observe_date_label("13 Feb 2019", may_first());
        assert!(state.next_match_row());
    }
}
