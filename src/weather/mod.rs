use async_trait::async_trait;
use chrono::NaiveDate;

use crate::Result;
use crate::models::{DayRecord, LocationMatch, ResolvedLocation};

pub mod weatherapi;

pub use weatherapi::WeatherApiClient;

/// Upstream weather provider: location search, forecast and history lookups.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Candidate places for free text, in the provider's own ranking
    async fn search(&self, query: &str) -> Result<Vec<LocationMatch>>;

    /// Per-day records for today and the following `days - 1` days
    async fn forecast(&self, location: &ResolvedLocation, days: u32) -> Result<Vec<DayRecord>>;

    /// The record for one past date
    async fn history(&self, location: &ResolvedLocation, date: NaiveDate) -> Result<DayRecord>;
}
