//! Search orchestration: create, read, update, delete and export of search
//! records. Create and location/date updates run the full pipeline
//! (resolve, fetch range, summarize, enrich) and persist only on success.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};

use crate::clock::{Clock, SystemClock};
use crate::config::JournalConfig;
use crate::enrichment::{Enrichment, EnrichmentLookup, VideoSearch};
use crate::export::{self, ExportFormat};
use crate::location_resolver::LocationResolver;
use crate::models::record::normalize_note;
use crate::models::{DayRecord, RangeSummary, ResolvedLocation, SearchRecord, SearchRequest, SearchUpdate};
use crate::range_fetcher::{RangeFetcher, RangePolicy};
use crate::store::SearchRepository;
use crate::summary::summarize;
use crate::weather::WeatherLookup;
use crate::{JournalError, Result};

pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Offset pagination for listing
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub skip: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(JournalError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Everything the pipeline derives from location text and dates
struct DerivedSearch {
    location: ResolvedLocation,
    days: Vec<DayRecord>,
    summary: RangeSummary,
    enrichment: Enrichment,
}

pub struct SearchService {
    resolver: LocationResolver,
    fetcher: RangeFetcher,
    enrichment: EnrichmentLookup,
    store: Arc<dyn SearchRepository>,
    clock: Arc<dyn Clock>,
}

impl SearchService {
    pub fn new(
        config: &JournalConfig,
        weather: Arc<dyn WeatherLookup>,
        videos: Option<Arc<dyn VideoSearch>>,
        store: Arc<dyn SearchRepository>,
    ) -> Self {
        Self {
            resolver: LocationResolver::new(weather.clone()),
            fetcher: RangeFetcher::new(weather, RangePolicy::from(&config.range)),
            enrichment: EnrichmentLookup::new(videos, config.video.max_results),
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the source of "today"
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn derive(&self, text: &str, from: NaiveDate, to: NaiveDate) -> Result<DerivedSearch> {
        let today = self.clock.today();
        // Reject unservable ranges before any upstream call
        self.fetcher.policy().plan(from, to, today)?;

        let location = self.resolver.resolve(text).await?;
        let days = self.fetcher.fetch(&location, from, to, today).await?;
        let summary = summarize(&days)?;
        let enrichment = self.enrichment.enrich(&location, Some(text)).await;

        Ok(DerivedSearch {
            location,
            days,
            summary,
            enrichment,
        })
    }

    #[instrument(skip(self, request), fields(location = %request.location))]
    pub async fn create(&self, request: SearchRequest) -> Result<SearchRecord> {
        request.validate()?;
        let query = request.location.trim().to_string();
        let derived = self
            .derive(&query, request.date_from, request.date_to)
            .await?;

        let now = Utc::now();
        let record = SearchRecord {
            id: self.store.next_id().await?,
            query,
            location: derived.location,
            date_from: request.date_from,
            date_to: request.date_to,
            days: derived.days,
            summary: derived.summary,
            maps_url: derived.enrichment.maps_url,
            video_ids: derived.enrichment.video_ids,
            note: normalize_note(request.note),
            created_at: now,
            updated_at: now,
        };
        self.store.put(&record).await?;

        info!(
            "Created search {} for {} ({}..{})",
            record.id, record.location.name, record.date_from, record.date_to
        );
        Ok(record)
    }

    pub async fn get(&self, id: u64) -> Result<SearchRecord> {
        self.store
            .get(id)
            .await?
            .ok_or(JournalError::RecordNotFound { id })
    }

    /// Newest first
    pub async fn list(&self, page: Page) -> Result<Vec<SearchRecord>> {
        page.validate()?;
        let mut records = self.store.list().await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records
            .into_iter()
            .skip(page.skip)
            .take(page.limit)
            .collect())
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: u64, update: SearchUpdate) -> Result<SearchRecord> {
        update.validate()?;
        let mut record = self.get(id).await?;

        let query = update
            .location
            .as_deref()
            .map(str::trim)
            .unwrap_or(&record.query)
            .to_string();
        let from = update.date_from.unwrap_or(record.date_from);
        let to = update.date_to.unwrap_or(record.date_to);

        if query != record.query || from != record.date_from || to != record.date_to {
            if from > to {
                return Err(JournalError::invalid_range(format!(
                    "start date {from} is after end date {to}"
                )));
            }
            let derived = self.derive(&query, from, to).await?;
            record.query = query;
            record.date_from = from;
            record.date_to = to;
            record.location = derived.location;
            record.days = derived.days;
            record.summary = derived.summary;
            record.maps_url = derived.enrichment.maps_url;
            record.video_ids = derived.enrichment.video_ids;
            info!("Refreshed search {} for {}", id, record.location.name);
        }

        if update.note.is_some() {
            record.note = normalize_note(update.note);
        }
        record.updated_at = Utc::now();
        self.store.put(&record).await?;
        Ok(record)
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(JournalError::RecordNotFound { id });
        }
        info!("Deleted search {}", id);
        Ok(())
    }

    /// All stored records, oldest first
    pub async fn export(&self, format: ExportFormat) -> Result<String> {
        let records = self.store.list().await?;
        export::render(&records, format)
    }
}
