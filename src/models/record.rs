//! Stored searches and the requests that create or change them

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{DayRecord, RangeSummary, ResolvedLocation};
use crate::{JournalError, Result};

/// Input for creating a search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Place name, postal code or "lat,lon"
    #[serde(rename = "location_name")]
    pub location: String,
    #[serde(rename = "search_date_from")]
    pub date_from: NaiveDate,
    #[serde(rename = "search_date_to")]
    pub date_to: NaiveDate,
    #[serde(default, rename = "user_note")]
    pub note: Option<String>,
}

impl SearchRequest {
    /// Shape checks that need no upstream call
    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(JournalError::validation("location must not be empty"));
        }
        if self.date_from > self.date_to {
            return Err(JournalError::invalid_range(format!(
                "start date {} is after end date {}",
                self.date_from, self.date_to
            )));
        }
        Ok(())
    }
}

/// Partial update of a stored search. Changing location or dates re-runs the
/// whole lookup; a note alone is applied without upstream calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchUpdate {
    #[serde(default, rename = "location_name")]
    pub location: Option<String>,
    #[serde(default, rename = "search_date_from")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, rename = "search_date_to")]
    pub date_to: Option<NaiveDate>,
    /// Blank clears the note
    #[serde(default, rename = "user_note")]
    pub note: Option<String>,
}

impl SearchUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.location.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.note.is_none()
        {
            return Err(JournalError::validation(
                "at least one field must be provided for update",
            ));
        }
        if matches!(&self.location, Some(location) if location.trim().is_empty()) {
            return Err(JournalError::validation("location must not be empty"));
        }
        Ok(())
    }
}

/// A persisted search with everything derived from it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRecord {
    pub id: u64,
    /// Location text as the user entered it
    pub query: String,
    pub location: ResolvedLocation,
    #[serde(rename = "search_date_from")]
    pub date_from: NaiveDate,
    #[serde(rename = "search_date_to")]
    pub date_to: NaiveDate,
    /// One entry per calendar day, ascending
    pub days: Vec<DayRecord>,
    pub summary: RangeSummary,
    #[serde(rename = "google_maps_url")]
    pub maps_url: Option<String>,
    #[serde(rename = "youtube_video_ids")]
    pub video_ids: Vec<String>,
    #[serde(rename = "user_note")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trims a note; blank notes become `None`
pub(crate) fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
