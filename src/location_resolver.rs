//! Location Resolution Module
//!
//! Normalizes free-text location input (place names, postal codes, "lat,lon"
//! pairs) and resolves it through the provider's fuzzy search. The provider's
//! first match wins; there is no local re-ranking.

use std::sync::Arc;

use tracing::{debug, info};

use crate::models::ResolvedLocation;
use crate::weather::WeatherLookup;
use crate::{JournalError, Result};

/// Classified location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    Coordinates(f64, f64),
    PostalCode(String),
    Name(String),
}

impl LocationInput {
    /// Classify raw text. Blank input and out-of-range coordinates are
    /// validation errors.
    pub fn parse(raw: &str) -> Result<Self> {
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Err(JournalError::validation("location must not be empty"));
        }

        if let Some((lat, lon)) = text.split_once(',') {
            if let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(JournalError::validation(format!(
                        "coordinates out of range: {lat},{lon}"
                    )));
                }
                return Ok(Self::Coordinates(lat, lon));
            }
        }

        if Self::looks_like_postal_code(&text) {
            return Ok(Self::PostalCode(text.to_uppercase()));
        }

        Ok(Self::Name(text))
    }

    /// Short alphanumeric tokens containing digits ("10115", "SW1A 1AA")
    fn looks_like_postal_code(text: &str) -> bool {
        text.len() <= 10
            && text.chars().any(|c| c.is_ascii_digit())
            && text.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
    }

    /// Text sent to the search endpoint
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            LocationInput::Coordinates(lat, lon) => format!("{lat},{lon}"),
            LocationInput::PostalCode(code) => code.clone(),
            LocationInput::Name(name) => name.clone(),
        }
    }
}

/// Service for resolving location inputs
#[derive(Clone)]
pub struct LocationResolver {
    lookup: Arc<dyn WeatherLookup>,
}

impl LocationResolver {
    pub fn new(lookup: Arc<dyn WeatherLookup>) -> Self {
        Self { lookup }
    }

    /// Resolve raw text into a canonical location, one outbound call
    pub async fn resolve(&self, raw: &str) -> Result<ResolvedLocation> {
        let input = LocationInput::parse(raw)?;
        debug!("Resolving location input: {:?}", input);

        let query = input.to_query();
        let best = self
            .lookup
            .search(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| JournalError::location_not_found(raw.trim()))?;

        let location = ResolvedLocation::from(best);
        info!(
            "Resolved '{}' to {} at ({})",
            query,
            location.display_name(),
            location.format_coordinates()
        );

        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationMatch;
    use crate::testing::FakeWeather;
    use rstest::rstest;

    #[rstest]
    #[case("London", LocationInput::Name("London".to_string()))]
    #[case("  New   York ", LocationInput::Name("New York".to_string()))]
    #[case("10115", LocationInput::PostalCode("10115".to_string()))]
    #[case("sw1a 1aa", LocationInput::PostalCode("SW1A 1AA".to_string()))]
    #[case("46.8182, 8.2275", LocationInput::Coordinates(46.8182, 8.2275))]
    #[case("-33.86,151.21", LocationInput::Coordinates(-33.86, 151.21))]
    fn test_parse_location_input(#[case] raw: &str, #[case] expected: LocationInput) {
        assert_eq!(LocationInput::parse(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("91.0,10.0")]
    #[case("10.0,181.0")]
    fn test_parse_rejects_invalid_input(#[case] raw: &str) {
        assert!(matches!(
            LocationInput::parse(raw),
            Err(JournalError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_takes_first_match() {
        let weather = FakeWeather::new();
        weather.add_matches(
            "paris",
            vec![
                LocationMatch {
                    name: "Paris".to_string(),
                    region: Some("Ile-de-France".to_string()),
                    country: Some("France".to_string()),
                    latitude: 48.87,
                    longitude: 2.33,
                },
                LocationMatch {
                    name: "Paris".to_string(),
                    region: Some("Texas".to_string()),
                    country: Some("United States of America".to_string()),
                    latitude: 33.66,
                    longitude: -95.56,
                },
            ],
        );
        let resolver = LocationResolver::new(Arc::new(weather.clone()));

        let location = resolver.resolve(" Paris ").await.unwrap();
        assert_eq!(location.country.as_deref(), Some("France"));
        assert_eq!(location.latitude, 48.87);
        assert_eq!(weather.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_empty_result_is_not_found() {
        let weather = FakeWeather::new();
        let resolver = LocationResolver::new(Arc::new(weather.clone()));

        let err = resolver.resolve("Qwxzzz123").await.unwrap_err();
        assert!(matches!(err, JournalError::LocationNotFound { ref query } if query == "Qwxzzz123"));
    }

    #[tokio::test]
    async fn test_resolve_upstream_failure_is_distinct() {
        let weather = FakeWeather::new();
        weather.fail_search();
        let resolver = LocationResolver::new(Arc::new(weather));

        let err = resolver.resolve("London").await.unwrap_err();
        assert!(matches!(err, JournalError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_blank_input_makes_no_call() {
        let weather = FakeWeather::new();
        let resolver = LocationResolver::new(Arc::new(weather.clone()));

        assert!(resolver.resolve("  ").await.is_err());
        assert_eq!(weather.search_calls(), 0);
    }
}
