//! Range fetching: stitches history and forecast lookups into one ordered
//! sequence with exactly one record per calendar day.
//!
//! Dates before "today" need one history call each; "today" and later are
//! served by a single forecast call. History calls run concurrently and the
//! whole fetch fails as soon as any of them fails.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use futures::future::{self, try_join_all};
use tracing::{debug, info, instrument};

use crate::config::RangeConfig;
use crate::models::{DayRecord, ResolvedLocation};
use crate::weather::WeatherLookup;
use crate::{JournalError, Result};

/// Which ranges may be requested
#[derive(Debug, Clone)]
pub struct RangePolicy {
    pub max_range_days: u32,
    pub max_forecast_days: u32,
    pub earliest_history: NaiveDate,
}

impl From<&RangeConfig> for RangePolicy {
    fn from(config: &RangeConfig) -> Self {
        Self {
            max_range_days: config.max_range_days,
            max_forecast_days: config.max_forecast_days,
            earliest_history: config.earliest_history,
        }
    }
}

impl Default for RangePolicy {
    fn default() -> Self {
        Self::from(&RangeConfig::default())
    }
}

/// The forecast part of a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastSpan {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Days to request from the provider, counting from today. One more
    /// than the span needs, within the provider horizon.
    pub days: u32,
}

/// How a range will be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePlan {
    pub history_dates: Vec<NaiveDate>,
    pub forecast: Option<ForecastSpan>,
}

impl RangePolicy {
    /// Validate `[from, to]` against `today` and split it into history dates
    /// and a forecast span
    pub fn plan(&self, from: NaiveDate, to: NaiveDate, today: NaiveDate) -> Result<RangePlan> {
        if from > to {
            return Err(JournalError::invalid_range(format!(
                "start date {from} is after end date {to}"
            )));
        }

        let span_days = (to - from).num_days() + 1;
        if span_days > i64::from(self.max_range_days) {
            return Err(JournalError::invalid_range(format!(
                "search range cannot exceed {} days (requested {span_days})",
                self.max_range_days
            )));
        }

        if from < self.earliest_history {
            return Err(JournalError::invalid_range(format!(
                "historical data is only available from {}",
                self.earliest_history
            )));
        }

        let history_dates: Vec<NaiveDate> = from
            .iter_days()
            .take_while(|d| *d <= to && *d < today)
            .collect();

        let forecast = if to >= today {
            let days = (to - today).num_days() + 1;
            if days > i64::from(self.max_forecast_days) {
                let last = today + Duration::days(i64::from(self.max_forecast_days) - 1);
                return Err(JournalError::invalid_range(format!(
                    "forecast cannot extend beyond {last} ({}-day provider limit)",
                    self.max_forecast_days
                )));
            }
            // One spare day covers a provider calendar behind ours
            let requested = u32::try_from(days + 1)
                .unwrap_or(self.max_forecast_days)
                .min(self.max_forecast_days);
            Some(ForecastSpan {
                from: from.max(today),
                to,
                days: requested,
            })
        } else {
            None
        };

        Ok(RangePlan {
            history_dates,
            forecast,
        })
    }
}

/// Fetches one ordered [`DayRecord`] per day of a range
#[derive(Clone)]
pub struct RangeFetcher {
    lookup: Arc<dyn WeatherLookup>,
    policy: RangePolicy,
}

impl RangeFetcher {
    pub fn new(lookup: Arc<dyn WeatherLookup>, policy: RangePolicy) -> Self {
        Self { lookup, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &RangePolicy {
        &self.policy
    }

    #[instrument(skip(self, location), fields(location = %location.name))]
    pub async fn fetch(
        &self,
        location: &ResolvedLocation,
        from: NaiveDate,
        to: NaiveDate,
        today: NaiveDate,
    ) -> Result<Vec<DayRecord>> {
        let plan = self.policy.plan(from, to, today)?;
        debug!(
            "Fetching {} history days, forecast {:?}",
            plan.history_dates.len(),
            plan.forecast
        );

        let history = try_join_all(
            plan.history_dates
                .iter()
                .map(|date| self.fetch_history_day(location, *date)),
        );

        let forecast = async {
            match &plan.forecast {
                Some(span) => self.fetch_forecast_span(location, span).await,
                None => Ok(Vec::new()),
            }
        };

        let (mut days, forecast_days) = future::try_join(history, forecast).await?;

        // The provider's forecast starts at the location's local date, which
        // may be after our "today". Earlier requested days come from history.
        if let Some(span) = &plan.forecast {
            let gap = history_gap(span, &forecast_days);
            if !gap.is_empty() {
                debug!(
                    "Forecast starts after {}, fetching {} days from history",
                    span.from,
                    gap.len()
                );
                let backfill =
                    try_join_all(gap.iter().map(|date| self.fetch_history_day(location, *date)))
                        .await?;
                days.extend(backfill);
            }
            days.extend(
                forecast_days
                    .into_iter()
                    .filter(|d| d.date >= span.from && d.date <= span.to),
            );
        }
        days.sort_by_key(|d| d.date);
        days.dedup_by_key(|d| d.date);

        ensure_complete(&days, from, to)?;
        info!("Fetched {} days for {}..{}", days.len(), from, to);
        Ok(days)
    }

    async fn fetch_history_day(
        &self,
        location: &ResolvedLocation,
        date: NaiveDate,
    ) -> Result<DayRecord> {
        let record = self
            .lookup
            .history(location, date)
            .await
            .map_err(|err| match err {
                JournalError::UpstreamUnavailable { service, message } => {
                    JournalError::upstream(service, format!("history for {date} failed: {message}"))
                }
                other => other,
            })?;

        if record.date != date {
            return Err(JournalError::upstream(
                "WeatherAPI",
                format!("history for {date} returned data for {}", record.date),
            ));
        }
        Ok(record)
    }

    async fn fetch_forecast_span(
        &self,
        location: &ResolvedLocation,
        span: &ForecastSpan,
    ) -> Result<Vec<DayRecord>> {
        self.lookup.forecast(location, span.days).await
    }
}

/// Span dates before the first forecast day the provider returned
fn history_gap(span: &ForecastSpan, forecast: &[DayRecord]) -> Vec<NaiveDate> {
    let Some(first) = forecast.iter().map(|d| d.date).min() else {
        return Vec::new();
    };
    span.from
        .iter_days()
        .take_while(|d| *d <= span.to && *d < first)
        .collect()
}

/// Every date of `[from, to]` must be present exactly once, in order
fn ensure_complete(days: &[DayRecord], from: NaiveDate, to: NaiveDate) -> Result<()> {
    let missing: Vec<String> = from
        .iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| days.binary_search_by_key(d, |r| r.date).is_err())
        .map(|d| d.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(JournalError::upstream(
            "WeatherAPI",
            format!("no data returned for {}", missing.join(", ")),
        ));
    }

    if days.iter().any(|d| d.date < from || d.date > to) {
        return Err(JournalError::upstream(
            "WeatherAPI",
            format!("returned days outside {from}..{to}"),
        ));
    }
    Ok(())
}
