//! Weather search journal
//!
//! Resolves free-text locations, fetches a day-by-day weather range that may
//! span history and forecast, summarizes it, attaches a maps link and related
//! videos, and keeps the result as an editable, exportable search record.

pub mod api;
pub mod clock;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod export;
pub mod location_resolver;
pub mod models;
pub mod range_fetcher;
pub mod service;
pub mod store;
pub mod summary;
pub mod telemetry;
pub mod weather;
pub mod web;

#[cfg(test)]
mod testing;

// Re-export core types for public API
pub use config::JournalConfig;
pub use enrichment::{VideoSearch, YouTubeClient};
pub use error::{ErrorKind, JournalError};
pub use export::ExportFormat;
pub use models::{DayRecord, DaySource, RangeSummary, ResolvedLocation, SearchRecord, SearchRequest, SearchUpdate};
pub use service::{Page, SearchService};
pub use store::{FjallSearchStore, MemorySearchStore, SearchRepository};
pub use weather::{WeatherApiClient, WeatherLookup};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, JournalError>;
