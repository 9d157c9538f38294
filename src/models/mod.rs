//! Data models for the weather journal
//!
//! - Location: resolved place identity and coordinates
//! - Day: per-day weather records and the range summary derived from them
//! - Record: stored searches and the requests that create or change them

pub mod day;
pub mod location;
pub mod record;

// Re-export all public types for convenient access
pub use day::{DayRecord, DaySource, RangeSummary};
pub use location::{LocationMatch, ResolvedLocation};
pub use record::{SearchRecord, SearchRequest, SearchUpdate};
