//! Location models for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

/// One candidate returned by the upstream location search, in provider order
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LocationMatch {
    pub name: String,
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Canonical place identity derived from free-text input
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Canonical name chosen by the provider
    pub name: String,
    pub region: Option<String>,
    pub country: Option<String>,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl ResolvedLocation {
    #[must_use]
    pub fn new(name: String, latitude: f64, longitude: f64) -> Self {
        Self {
            name,
            region: None,
            country: None,
            latitude,
            longitude,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Query string pinning upstream weather calls to these coordinates
    #[must_use]
    pub fn coordinate_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// "Name, Region, Country" with empty and repeated parts dropped
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut parts: Vec<&str> = vec![self.name.as_str()];
        for part in [&self.region, &self.country].into_iter().flatten() {
            if !part.is_empty() && !parts.contains(&part.as_str()) {
                parts.push(part);
            }
        }
        parts.join(", ")
    }

    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<LocationMatch> for ResolvedLocation {
    fn from(value: LocationMatch) -> Self {
        Self {
            name: value.name,
            region: value.region,
            country: value.country,
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}
