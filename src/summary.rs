//! Range-wide aggregates over per-day records

use crate::models::{DayRecord, RangeSummary};
use crate::{JournalError, Result};

/// Reduce an ordered, non-empty day sequence to its [`RangeSummary`].
///
/// - average temperature: mean of daily averages, one decimal
/// - average humidity: mean of daily averages, nearest whole percent
/// - max wind: highest daily maximum
/// - condition: the first day's, not aggregated
pub fn summarize(days: &[DayRecord]) -> Result<RangeSummary> {
    let first = days.first().ok_or(JournalError::EmptyRange)?;
    let count = days.len() as f64;

    let avg_temp = days.iter().map(|d| d.avg_temp_c).sum::<f64>() / count;
    let avg_humidity = days.iter().map(|d| d.avg_humidity).sum::<f64>() / count;
    let max_wind = days
        .iter()
        .map(|d| d.max_wind_kph)
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(RangeSummary {
        avg_temp_c: round_to_tenth(avg_temp),
        avg_humidity: avg_humidity.round().clamp(0.0, 100.0) as u8,
        max_wind_kph: max_wind,
        condition_text: first.condition_text.clone(),
        day_count: days.len(),
    })
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
