use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;
use weather_cities::{CityCatalogFetcher, SqliteCityStore};
use weather_core::{AppError, Config};
use weather_provider::{WeatherBlock, WeatherQueryService};

/// Shared state handed to every route.
///
/// Locks are never held across an `.await`.
#[derive(Clone)]
pub struct AppState {
    config: Arc<RwLock<Config>>,
    /// Where settings changes are written; `None` keeps them in memory only
    config_path: Option<PathBuf>,
    pub store: Arc<Mutex<SqliteCityStore>>,
    client: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        store: SqliteCityStore,
        client: reqwest::Client,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
            store: Arc::new(Mutex::new(store)),
            client,
        }
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Apply `f` to the configuration and persist the result.
    ///
    /// The live configuration only changes once the file is written.
    pub fn update_config<F>(&self, f: F) -> Result<Config, AppError>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.config.write();
        let mut updated = config.clone();
        f(&mut updated);

        if let Some(path) = &self.config_path {
            updated.save_to(path)?;
            tracing::debug!("Saved configuration to {}", path.display());
        }

        *config = updated.clone();
        Ok(updated)
    }

    pub fn fetcher(&self) -> CityCatalogFetcher {
        let url = self.config.read().catalog.url.clone();
        CityCatalogFetcher::new(self.client.clone(), url)
    }

    pub fn weather_service(&self) -> WeatherQueryService {
        let config = self.config.read();
        WeatherQueryService::new(self.client.clone(), &config.weather)
    }

    pub fn weather_block(&self) -> WeatherBlock {
        WeatherBlock::new(&self.config.read())
    }
}
