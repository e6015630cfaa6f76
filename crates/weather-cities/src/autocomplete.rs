//! City name suggestions for the block form's city field.

use serde::{Deserialize, Serialize};
use weather_core::escape_html;

use crate::city_store::{CityRepository, CityStoreResult};

/// Maximum number of suggestions returned.
pub const SUGGESTION_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub value: String,
    pub label: String,
}

/// Suggestions whose city name contains `query`.
///
/// `value` is the city id, `label` is `name (country)`; both are HTML-escaped.
pub fn suggest<R: CityRepository + ?Sized>(repo: &R, query: &str) -> CityStoreResult<Vec<Suggestion>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let cities = repo.search_by_name(query, SUGGESTION_LIMIT)?;
    tracing::debug!("Autocomplete {:?}: {} matches", query, cities.len());

    Ok(cities
        .iter()
        .map(|city| Suggestion {
            value: escape_html(&city.city_id.to_string()),
            label: escape_html(&city.label()),
        })
        .collect())
}
