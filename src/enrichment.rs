//! Optional non-weather data attached to a search: a maps link built from
//! coordinates and a few related video ids. Failures here never abort a
//! search; they are logged and degrade to absent data.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::VideoConfig;
use crate::models::ResolvedLocation;
use crate::{JournalError, Result};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";
const VIDEO_SERVICE: &str = "YouTube";

#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Ids of videos matching `query`, provider ranking
    async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<String>>;
}

/// YouTube Data API v3 search
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    /// `None` when no API key is configured
    pub fn from_config(config: &VideoConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()
            .map_err(|e| JournalError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Some(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct YtSearchResponse {
    #[serde(default)]
    items: Vec<YtSearchItem>,
}

#[derive(Debug, Deserialize)]
struct YtSearchItem {
    id: YtItemId,
}

#[derive(Debug, Deserialize)]
struct YtItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    #[instrument(skip(self))]
    async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query),
                ("key", self.api_key.as_str()),
            ])
            .query(&[("maxResults", max_results)])
            .send()
            .await
            .map_err(|e| JournalError::upstream(VIDEO_SERVICE, format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JournalError::upstream(
                VIDEO_SERVICE,
                format!("search failed with status {status}"),
            ));
        }

        let body: YtSearchResponse = response
            .json()
            .await
            .map_err(|e| JournalError::upstream(VIDEO_SERVICE, format!("invalid search payload: {e}")))?;

        Ok(body
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }
}

/// Enrichment attached to a search record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub maps_url: Option<String>,
    pub video_ids: Vec<String>,
}

/// Maps link for the coordinates; no geocoding call involved
#[must_use]
pub fn maps_url(location: &ResolvedLocation) -> Option<String> {
    location.has_valid_coordinates().then(|| {
        format!(
            "{MAPS_SEARCH_URL}{}",
            urlencoding::encode(&location.coordinate_query())
        )
    })
}

#[derive(Clone)]
pub struct EnrichmentLookup {
    videos: Option<Arc<dyn VideoSearch>>,
    max_videos: u32,
}

impl EnrichmentLookup {
    pub fn new(videos: Option<Arc<dyn VideoSearch>>, max_videos: u32) -> Self {
        Self { videos, max_videos }
    }

    /// Build the enrichment for a location. `text` is the user's own wording,
    /// used for the video query when the provider name is empty.
    #[instrument(skip(self, location), fields(location = %location.name))]
    pub async fn enrich(&self, location: &ResolvedLocation, text: Option<&str>) -> Enrichment {
        let maps_url = maps_url(location);
        if maps_url.is_none() {
            warn!("No maps link for {}: invalid coordinates", location.name);
        }

        Enrichment {
            maps_url,
            video_ids: self.video_ids(location, text).await,
        }
    }

    async fn video_ids(&self, location: &ResolvedLocation, text: Option<&str>) -> Vec<String> {
        let Some(videos) = &self.videos else {
            debug!("Video search not configured, skipping");
            return Vec::new();
        };
        if self.max_videos == 0 {
            return Vec::new();
        }

        let query = if location.name.trim().is_empty() {
            text.unwrap_or_default().trim().to_string()
        } else {
            location.name.clone()
        };
        if query.is_empty() {
            return Vec::new();
        }

        match videos.search_videos(&query, self.max_videos).await {
            Ok(mut ids) => {
                ids.truncate(self.max_videos as usize);
                debug!("Found {} videos for '{}'", ids.len(), query);
                ids
            }
            Err(err) => {
                warn!("Video search for '{}' failed, continuing without videos: {}", query, err);
                Vec::new()
            }
        }
    }
}
