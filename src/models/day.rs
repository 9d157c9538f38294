//! Per-day weather records and range-wide summaries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which upstream endpoint produced a day
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DaySource {
    History,
    Forecast,
}

/// One calendar day's weather observation or forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DayRecord {
    pub date: NaiveDate,
    /// Temperatures in Celsius
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub avg_temp_c: f64,
    /// Average relative humidity in percent
    pub avg_humidity: f64,
    /// Maximum wind speed in km/h
    pub max_wind_kph: f64,
    pub condition_text: String,
    pub condition_icon: Option<String>,
    pub source: DaySource,
}

/// Scalar aggregates over all day records of a search
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RangeSummary {
    /// Mean of daily average temperatures, one decimal
    pub avg_temp_c: f64,
    /// Mean of daily average humidity, whole percent
    pub avg_humidity: u8,
    /// Highest daily maximum wind
    pub max_wind_kph: f64,
    /// Condition of the first day in range
    pub condition_text: String,
    pub day_count: usize,
}
