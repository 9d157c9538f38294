//! In-process fakes of the upstream lookups for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Duration as DateDuration, NaiveDate};

use crate::enrichment::VideoSearch;
use crate::models::{DayRecord, DaySource, LocationMatch, ResolvedLocation};
use crate::weather::WeatherLookup;
use crate::{JournalError, Result};

pub(crate) fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// "today" for every fake-backed test
pub(crate) fn today() -> NaiveDate {
    date("2024-06-10")
}

/// Deterministic day: avg temp = day-of-month * 1.5, humidity 70 + day,
/// wind 10 * day.
pub(crate) fn fake_day(date: NaiveDate, source: DaySource) -> DayRecord {
    let day = f64::from(date.day());
    DayRecord {
        date,
        max_temp_c: day * 1.5 + 4.0,
        min_temp_c: day * 1.5 - 4.0,
        avg_temp_c: day * 1.5,
        avg_humidity: 70.0 + day,
        max_wind_kph: 10.0 * day,
        condition_text: format!("Cloudy day {}", date.day()),
        condition_icon: None,
        source,
    }
}

pub(crate) fn london() -> LocationMatch {
    LocationMatch {
        name: "London".to_string(),
        region: Some("City of London, Greater London".to_string()),
        country: Some("United Kingdom".to_string()),
        latitude: 51.52,
        longitude: -0.11,
    }
}

pub(crate) fn paris() -> LocationMatch {
    LocationMatch {
        name: "Paris".to_string(),
        region: Some("Ile-de-France".to_string()),
        country: Some("France".to_string()),
        latitude: 48.87,
        longitude: 2.33,
    }
}

#[derive(Default)]
struct FakeWeatherState {
    matches: Mutex<HashMap<String, Vec<LocationMatch>>>,
    failing_dates: Mutex<HashSet<NaiveDate>>,
    search_fails: AtomicBool,
    forecast_fails: AtomicBool,
    search_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
    history_calls: AtomicUsize,
    forecast_days: Mutex<Vec<u32>>,
    forecast_offset: AtomicI64,
}

/// Scriptable [`WeatherLookup`] that counts its calls
#[derive(Clone, Default)]
pub(crate) struct FakeWeather {
    state: Arc<FakeWeatherState>,
}

impl FakeWeather {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fake preloaded with London and Paris
    pub(crate) fn with_cities() -> Self {
        let weather = Self::new();
        weather.add_matches("london", vec![london()]);
        weather.add_matches("paris", vec![paris()]);
        weather
    }

    pub(crate) fn add_matches(&self, query: &str, matches: Vec<LocationMatch>) {
        self.state
            .matches
            .lock()
            .unwrap()
            .insert(query.to_lowercase(), matches);
    }

    pub(crate) fn fail_history_on(&self, date: NaiveDate) {
        self.state.failing_dates.lock().unwrap().insert(date);
    }

    pub(crate) fn fail_search(&self) {
        self.state.search_fails.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_forecast(&self) {
        self.state.forecast_fails.store(true, Ordering::SeqCst);
    }

    /// Start forecasts `days` away from `today()`, like a provider whose
    /// local date differs from UTC
    pub(crate) fn shift_forecast(&self, days: i64) {
        self.state.forecast_offset.store(days, Ordering::SeqCst);
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.state.search_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn forecast_calls(&self) -> usize {
        self.state.forecast_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn history_calls(&self) -> usize {
        self.state.history_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.search_calls() + self.forecast_calls() + self.history_calls()
    }

    /// `days` argument of every forecast call so far
    pub(crate) fn forecast_days(&self) -> Vec<u32> {
        self.state.forecast_days.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherLookup for FakeWeather {
    async fn search(&self, query: &str) -> Result<Vec<LocationMatch>> {
        self.state.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.search_fails.load(Ordering::SeqCst) {
            return Err(JournalError::upstream("WeatherAPI", "search.json failed with status 503"));
        }
        Ok(self
            .state
            .matches
            .lock()
            .unwrap()
            .get(&query.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn forecast(&self, _location: &ResolvedLocation, days: u32) -> Result<Vec<DayRecord>> {
        self.state.forecast_calls.fetch_add(1, Ordering::SeqCst);
        self.state.forecast_days.lock().unwrap().push(days);
        if self.state.forecast_fails.load(Ordering::SeqCst) {
            return Err(JournalError::upstream("WeatherAPI", "forecast.json failed with status 500"));
        }
        let start = today() + DateDuration::days(self.state.forecast_offset.load(Ordering::SeqCst));
        Ok(start
            .iter_days()
            .take(days as usize)
            .map(|d| fake_day(d, DaySource::Forecast))
            .collect())
    }

    async fn history(&self, _location: &ResolvedLocation, date: NaiveDate) -> Result<DayRecord> {
        self.state.history_calls.fetch_add(1, Ordering::SeqCst);
        // Later dates finish first so callers must restore order
        tokio::time::sleep(Duration::from_millis(u64::from(32 - date.day()))).await;
        if self.state.failing_dates.lock().unwrap().contains(&date) {
            return Err(JournalError::upstream("WeatherAPI", "history.json failed with status 502"));
        }
        Ok(fake_day(date, DaySource::History))
    }
}

/// Scriptable [`VideoSearch`]
#[derive(Clone, Default)]
pub(crate) struct FakeVideos {
    fails: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl FakeVideos {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        let videos = Self::default();
        videos.fails.store(true, Ordering::SeqCst);
        videos
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSearch for FakeVideos {
    async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fails.load(Ordering::SeqCst) {
            return Err(JournalError::upstream("YouTube", "request timed out"));
        }
        let slug = query.to_lowercase().replace(' ', "-");
        Ok((0..max_results + 2).map(|i| format!("{slug}-{i}")).collect())
    }
}
