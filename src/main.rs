use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use weather_journal::{JournalConfig, SearchService, VideoSearch, WeatherApiClient, YouTubeClient, store, telemetry, web};

const CONFIG_PATH_VAR: &str = "WEATHER_JOURNAL_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
    let config = JournalConfig::load_from_path(config_path)?;
    telemetry::init(&config.logging)?;

    let weather = WeatherApiClient::new(&config.weather).context("WeatherAPI client setup failed")?;
    let videos = YouTubeClient::from_config(&config.video)?
        .map(|client| Arc::new(client) as Arc<dyn VideoSearch>);
    if videos.is_none() {
        info!("No video API key configured, searches will have no videos");
    }
    let store = store::open(&config.storage)?;

    let service = SearchService::new(&config, Arc::new(weather), videos, store);
    web::run(&config.server, Arc::new(service)).await?;
    Ok(())
}
