//! Resumable city import.
//!
//! An `ImportJob` is a plain serde value: the caller keeps it between
//! invocations (in a request body, a session, or a local variable) and feeds
//! it back to `step` until `is_finished` returns true. The job never runs on
//! its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{filter_by_country, CityCatalogFetcher};
use crate::city::City;
use crate::city_store::{CityRepository, CityStoreError};

/// Number of catalog entries handled per step.
pub const CHUNK_SIZE: usize = 10;

/// Title shown by batch runners while the job is in progress.
pub const IMPORT_TITLE: &str = "Updating weather cities database...";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Import job has not been initialized")]
    NotInitialized,

    #[error("City store error: {0}")]
    Store(#[from] CityStoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportState {
    #[default]
    Uninitialized,
    InProgress,
    Complete,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ImportProgress {
    pub processed_count: usize,
    pub total_count: usize,
    /// Rows actually written; lower than `processed_count` on a re-import
    pub inserted_count: usize,
    pub pending_items: Vec<City>,
}

impl ImportProgress {
    /// Counters must agree with the pending list.
    fn check(&self) -> Result<(), String> {
        if self.total_count != self.pending_items.len() {
            return Err(format!(
                "total_count {} does not match {} pending cities",
                self.total_count,
                self.pending_items.len()
            ));
        }
        if self.processed_count > self.total_count {
            return Err(format!(
                "processed_count {} exceeds total_count {}",
                self.processed_count, self.total_count
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportJob {
    pub country: String,
    #[serde(default)]
    pub state: ImportState,
    #[serde(default)]
    pub progress: ImportProgress,
    /// Names of processed cities, in order
    #[serde(default)]
    pub results: Vec<String>,
    /// Name of the last processed city
    #[serde(default)]
    pub message: Option<String>,
}

impl ImportJob {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            state: ImportState::Uninitialized,
            progress: ImportProgress::default(),
            results: Vec::new(),
            message: None,
        }
    }

    pub fn needs_initialization(&self) -> bool {
        self.state == ImportState::Uninitialized
    }

    /// Load the catalog for the job's country.
    ///
    /// A failed fetch moves the job to `Failed`; an empty catalog completes it.
    pub async fn initialize(&mut self, fetcher: &CityCatalogFetcher) {
        match fetcher.fetch_all().await {
            Ok(cities) => {
                let pending: Vec<City> = filter_by_country(cities, &self.country)
                    .into_iter()
                    .map(City::from)
                    .collect();

                tracing::info!(
                    "Importing {} cities for country {}",
                    pending.len(),
                    self.country
                );

                self.progress = ImportProgress {
                    processed_count: 0,
                    total_count: pending.len(),
                    inserted_count: 0,
                    pending_items: pending,
                };
                self.state = if self.progress.total_count == 0 {
                    ImportState::Complete
                } else {
                    ImportState::InProgress
                };
            }
            Err(e) => {
                tracing::warn!("City import for {} failed: {}", self.country, e);
                self.state = ImportState::Failed {
                    reason: e.to_string(),
                };
            }
        }
    }

    /// Process up to `CHUNK_SIZE` pending cities.
    ///
    /// Store errors abort the step and leave the job at the last completed item.
    pub fn process_chunk<R: CityRepository + ?Sized>(&mut self, repo: &R) -> Result<(), ImportError> {
        match self.state {
            ImportState::Uninitialized => return Err(ImportError::NotInitialized),
            ImportState::Complete | ImportState::Failed { .. } => return Ok(()),
            ImportState::InProgress => {}
        }

        if let Err(reason) = self.progress.check() {
            tracing::warn!("Rejecting city import for {}: {}", self.country, reason);
            self.state = ImportState::Failed { reason };
            return Ok(());
        }

        let start = self.progress.processed_count;
        let end = (start + CHUNK_SIZE).min(self.progress.total_count);

        for index in start..end {
            let Some(city) = self.progress.pending_items.get(index).cloned() else {
                break;
            };

            if !repo.exists(city.city_id)? {
                match repo.insert(city.city_id, &city.name, &city.country) {
                    Ok(()) => self.progress.inserted_count += 1,
                    // Inserted by a concurrent import since the existence check
                    Err(CityStoreError::Duplicate(id)) => {
                        tracing::debug!("City {} already stored", id);
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            self.results.push(city.name.clone());
            self.progress.processed_count += 1;
            self.message = Some(city.name);
        }

        if self.progress.processed_count >= self.progress.total_count {
            self.progress.processed_count = self.progress.total_count;
            self.state = ImportState::Complete;
            tracing::info!(
                "City import finished: {} processed, {} inserted",
                self.progress.processed_count,
                self.progress.inserted_count
            );
        } else {
            tracing::debug!(
                "City import at {}/{}",
                self.progress.processed_count,
                self.progress.total_count
            );
        }

        Ok(())
    }

    /// One batch invocation: initialize on first call, then process a chunk.
    pub async fn step<R: CityRepository + ?Sized>(
        &mut self,
        fetcher: &CityCatalogFetcher,
        repo: &R,
    ) -> Result<(), ImportError> {
        if self.needs_initialization() {
            self.initialize(fetcher).await;
        }
        self.process_chunk(repo)
    }

    /// Repeat `step` until the job finishes.
    pub async fn run_to_completion<R: CityRepository + ?Sized>(
        &mut self,
        fetcher: &CityCatalogFetcher,
        repo: &R,
    ) -> Result<(), ImportError> {
        while !self.is_finished() {
            self.step(fetcher, repo).await?;
        }
        Ok(())
    }

    /// Fraction of the catalog processed, `1.0` once complete.
    pub fn progress(&self) -> f64 {
        match self.state {
            ImportState::Complete | ImportState::Failed { .. } => 1.0,
            ImportState::Uninitialized => 0.0,
            ImportState::InProgress if self.progress.total_count == 0 => 1.0,
            ImportState::InProgress => {
                self.progress.processed_count as f64 / self.progress.total_count as f64
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            ImportState::Complete | ImportState::Failed { .. }
        )
    }

    pub fn succeeded(&self) -> bool {
        self.state == ImportState::Complete
    }

    /// Message for the finish callback.
    pub fn finish_message(&self) -> String {
        finish_message(self.succeeded(), self.progress.processed_count)
    }
}

/// `"One city processed."`, `"{n} cities processed."` or `"Finished with an error."`.
pub fn finish_message(success: bool, processed: usize) -> String {
    if !success {
        return "Finished with an error.".to_string();
    }
    match processed {
        1 => "One city processed.".to_string(),
        n => format!("{} cities processed.", n),
    }
}
