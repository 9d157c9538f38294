//! Export of stored searches as JSON or CSV. Pure transform of stored data.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::SearchRecord;
use crate::{JournalError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    #[must_use]
    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = JournalError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(JournalError::validation(format!(
                "Invalid export format '{value}'. Supported formats: json, csv."
            ))),
        }
    }
}

/// Flat view of a record; day records and video ids are left out
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportRow {
    pub id: u64,
    pub query: String,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub search_date_from: String,
    pub search_date_to: String,
    pub summary_avg_temp_c: f64,
    pub summary_condition_text: String,
    pub summary_avg_humidity: u8,
    pub summary_max_wind_kph: f64,
    pub user_note: Option<String>,
    pub google_maps_url: Option<String>,
    pub created_at: String,
}

const CSV_HEADER: [&str; 14] = [
    "id",
    "query",
    "location_name",
    "latitude",
    "longitude",
    "search_date_from",
    "search_date_to",
    "summary_avg_temp_c",
    "summary_condition_text",
    "summary_avg_humidity",
    "summary_max_wind_kph",
    "user_note",
    "google_maps_url",
    "created_at",
];

impl From<&SearchRecord> for ExportRow {
    fn from(record: &SearchRecord) -> Self {
        Self {
            id: record.id,
            query: record.query.clone(),
            location_name: record.location.display_name(),
            latitude: record.location.latitude,
            longitude: record.location.longitude,
            search_date_from: record.date_from.to_string(),
            search_date_to: record.date_to.to_string(),
            summary_avg_temp_c: record.summary.avg_temp_c,
            summary_condition_text: record.summary.condition_text.clone(),
            summary_avg_humidity: record.summary.avg_humidity,
            summary_max_wind_kph: record.summary.max_wind_kph,
            user_note: record.note.clone(),
            google_maps_url: record.maps_url.clone(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

impl ExportRow {
    fn csv_fields(&self) -> [String; 14] {
        [
            self.id.to_string(),
            self.query.clone(),
            self.location_name.clone(),
            self.latitude.to_string(),
            self.longitude.to_string(),
            self.search_date_from.clone(),
            self.search_date_to.clone(),
            self.summary_avg_temp_c.to_string(),
            self.summary_condition_text.clone(),
            self.summary_avg_humidity.to_string(),
            self.summary_max_wind_kph.to_string(),
            self.user_note.clone().unwrap_or_default(),
            self.google_maps_url.clone().unwrap_or_default(),
            self.created_at.clone(),
        ]
    }
}

/// Render records in the requested format. No records gives `[]` or a
/// header-only CSV.
pub fn render(records: &[SearchRecord], format: ExportFormat) -> Result<String> {
    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(&rows)
            .map_err(|e| JournalError::storage(format!("failed to encode export: {e}"))),
        ExportFormat::Csv => Ok(to_csv(&rows)),
    }
}

fn to_csv(rows: &[ExportRow]) -> String {
    let mut out = csv_line(CSV_HEADER.iter().copied());
    for row in rows {
        let fields = row.csv_fields();
        out.push_str(&csv_line(fields.iter().map(String::as_str)));
    }
    out
}

fn csv_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    let mut line = fields.map(escape_csv).collect::<Vec<_>>().join(",");
    line.push_str("\r\n");
    line
}

/// RFC 4180 quoting
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
