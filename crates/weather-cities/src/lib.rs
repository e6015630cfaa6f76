//! City catalog for weather blocks
//!
//! Stores the provider's known cities in a local SQLite table, imports them
//! from the bulk catalog in resumable chunks, and answers autocomplete queries.

pub mod autocomplete;
pub mod catalog;
pub mod city;
pub mod city_store;
mod error_mapping;
pub mod import;

pub use autocomplete::{suggest, Suggestion, SUGGESTION_LIMIT};
pub use catalog::{filter_by_country, CatalogError, CityCatalogFetcher};
pub use city::{CatalogCity, City};
pub use city_store::{CityRepository, CityStoreError, CityStoreResult, SqliteCityStore};
pub use import::{
    finish_message, ImportError, ImportJob, ImportProgress, ImportState, CHUNK_SIZE, IMPORT_TITLE,
};
