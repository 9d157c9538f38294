//! WeatherAPI.com client
//!
//! Implements [`WeatherLookup`] against `search.json`, `forecast.json` and
//! `history.json`. Weather calls are keyed by the resolved coordinates so every
//! day of a search describes the same place.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::WeatherLookup;
use crate::config::WeatherConfig;
use crate::models::{DayRecord, DaySource, LocationMatch, ResolvedLocation};
use crate::{JournalError, Result};

const SERVICE: &str = "WeatherAPI";
/// "No location found matching parameter 'q'"
const LOCATION_NOT_FOUND_CODE: i64 = 1006;
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl WeatherApiClient {
    /// Create a client; fails when no API key is configured
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                JournalError::config(
                    "No WeatherAPI key configured. Set weather.api_key or WEATHER_JOURNAL_WEATHER__API_KEY.",
                )
            })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("weather-journal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JournalError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `endpoint` and decode the body. `q` is echoed in not-found errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        q: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let started = Instant::now();

        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", q)])
            .query(params)
            .send()
            .await
            .map_err(|e| JournalError::upstream(SERVICE, format!("{endpoint} request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            JournalError::upstream(SERVICE, format!("failed to read {endpoint} response: {e}"))
        })?;

        let elapsed = started.elapsed();
        debug!(endpoint, %status, elapsed_ms = elapsed.as_millis() as u64, "WeatherAPI response");
        if elapsed > SLOW_RESPONSE {
            warn!("Slow WeatherAPI response from {}: {:.3}s", endpoint, elapsed.as_secs_f64());
        }

        if !status.is_success() {
            if let Ok(envelope) = serde_json::from_str::<WaErrorEnvelope>(&body) {
                if envelope.error.code == LOCATION_NOT_FOUND_CODE {
                    return Err(JournalError::location_not_found(q));
                }
                return Err(JournalError::upstream(
                    SERVICE,
                    format!(
                        "{endpoint} rejected with status {status}: {}",
                        envelope.error.message
                    ),
                ));
            }
            return Err(JournalError::upstream(
                SERVICE,
                format!("{endpoint} failed with status {status}: {}", truncate_body(&body)),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| JournalError::upstream(SERVICE, format!("invalid {endpoint} payload: {e}")))
    }
}

#[async_trait]
impl WeatherLookup for WeatherApiClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<LocationMatch>> {
        let results: Vec<WaSearchResult> = self.get_json("search.json", query, &[]).await?;
        debug!("Location search for '{}' returned {} matches", query, results.len());
        Ok(results.into_iter().map(LocationMatch::from).collect())
    }

    #[instrument(skip(self, location), fields(location = %location.name))]
    async fn forecast(&self, location: &ResolvedLocation, days: u32) -> Result<Vec<DayRecord>> {
        let response: WaForecastResponse = self
            .get_json(
                "forecast.json",
                &location.coordinate_query(),
                &[("days", days.to_string())],
            )
            .await?;

        Ok(response
            .forecast
            .forecastday
            .into_iter()
            .map(|day| day.into_record(DaySource::Forecast))
            .collect())
    }

    #[instrument(skip(self, location), fields(location = %location.name))]
    async fn history(&self, location: &ResolvedLocation, date: NaiveDate) -> Result<DayRecord> {
        let response: WaForecastResponse = self
            .get_json(
                "history.json",
                &location.coordinate_query(),
                &[("dt", date.format("%Y-%m-%d").to_string())],
            )
            .await?;

        response
            .forecast
            .forecastday
            .into_iter()
            .find(|day| day.date == date)
            .map(|day| day.into_record(DaySource::History))
            .ok_or_else(|| JournalError::upstream(SERVICE, format!("history for {date} returned no data")))
    }
}

#[derive(Debug, Deserialize)]
struct WaSearchResult {
    name: String,
    region: Option<String>,
    country: Option<String>,
    lat: f64,
    lon: f64,
}

impl From<WaSearchResult> for LocationMatch {
    fn from(value: WaSearchResult) -> Self {
        Self {
            name: value.name,
            region: value.region,
            country: value.country,
            latitude: value.lat,
            longitude: value.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    avgtemp_c: f64,
    maxwind_kph: f64,
    avghumidity: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
}

impl WaForecastDay {
    fn into_record(self, source: DaySource) -> DayRecord {
        DayRecord {
            date: self.date,
            max_temp_c: self.day.maxtemp_c,
            min_temp_c: self.day.mintemp_c,
            avg_temp_c: self.day.avgtemp_c,
            avg_humidity: self.day.avghumidity,
            max_wind_kph: self.day.maxwind_kph,
            condition_text: self.day.condition.text,
            condition_icon: self.day.condition.icon.map(absolute_icon_url),
            source,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

#[derive(Debug, Deserialize)]
struct WaErrorDetail {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WaErrorEnvelope {
    error: WaErrorDetail,
}

/// WeatherAPI serves protocol-relative icon paths
fn absolute_icon_url(icon: String) -> String {
    if icon.starts_with("//") {
        format!("https:{icon}")
    } else {
        icon
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = WeatherConfig::default();
        let err = WeatherApiClient::new(&config).unwrap_err();
        assert!(matches!(err, JournalError::Config { .. }));
    }

    #[test]
    fn test_icon_url_made_absolute() {
        assert_eq!(
            absolute_icon_url("//cdn.weatherapi.com/weather/64x64/day/113.png".to_string()),
            "https://cdn.weatherapi.com/weather/64x64/day/113.png"
        );
        assert_eq!(absolute_icon_url("https://x/y.png".to_string()), "https://x/y.png");
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn test_forecast_day_parses_integer_humidity() {
        let day: WaForecastDay = serde_json::from_str(
            r#"{
                "date": "2024-01-02",
                "day": {
                    "maxtemp_c": 9.1, "mintemp_c": 3.4, "avgtemp_c": 6.2,
                    "maxwind_kph": 31.3, "avghumidity": 84,
                    "condition": {"text": "Light rain", "icon": "//cdn/113.png", "code": 1183}
                },
                "astro": {}, "hour": []
            }"#,
        )
        .unwrap();
        let record = day.into_record(DaySource::History);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(record.avg_humidity, 84.0);
        assert_eq!(record.condition_icon.as_deref(), Some("https://cdn/113.png"));
        assert_eq!(record.source, DaySource::History);
    }
}
