//! Fetching of the static bulk city catalog.

use thiserror::Error;
use tracing::instrument;

use crate::city::CatalogCity;

/// Catalog fetch errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Catalog request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed catalog: {0}")]
    Parse(String),
}

/// Downloads the city catalog (a JSON array of `{id, name, country}`).
#[derive(Debug, Clone)]
pub struct CityCatalogFetcher {
    client: reqwest::Client,
    url: String,
}

impl CityCatalogFetcher {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Fetch the whole catalog with one GET.
    ///
    /// An empty or `null` body is an empty catalog, not an error.
    #[instrument(skip(self), fields(url = %self.url), level = "info")]
    pub async fn fetch_all(&self) -> Result<Vec<CatalogCity>, CatalogError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "null" {
            tracing::debug!("Catalog body is empty");
            return Ok(Vec::new());
        }

        let cities: Vec<CatalogCity> = serde_json::from_str(trimmed)
            .map_err(|e| CatalogError::Parse(format!("JSON parse error: {}", e)))?;

        tracing::info!("Fetched {} catalog entries", cities.len());
        Ok(cities)
    }

    /// Like `fetch_all`, but a failed fetch is logged and looks like an empty catalog.
    pub async fn fetch_all_or_empty(&self) -> Vec<CatalogCity> {
        match self.fetch_all().await {
            Ok(cities) => cities,
            Err(e) => {
                tracing::warn!("City catalog fetch failed, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Fetch the catalog and keep only the cities of `country`.
    pub async fn fetch_for_country(&self, country: &str) -> Result<Vec<CatalogCity>, CatalogError> {
        let cities = self.fetch_all().await?;
        Ok(filter_by_country(cities, country))
    }
}

/// Keep entries whose country equals `country_code`, preserving order.
pub fn filter_by_country(cities: Vec<CatalogCity>, country_code: &str) -> Vec<CatalogCity> {
    cities
        .into_iter()
        .filter(|c| c.country == country_code)
        .collect()
}
