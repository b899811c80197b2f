//! Data ingestion and storage
//!
//! Page parsing, the accumulated dataset and SQLite storage.

pub mod anomalies;
pub mod database;
pub mod dataset;
pub mod dedup;
pub mod scrapers;

pub use anomalies::AnomalyTable;
pub use database::Database;
pub use dataset::MatchDataset;
pub use dedup::{PageVerdict, PaginationDedupController};
