//! City records stored in `weather_city` and entries of the remote catalog.

use serde::{Deserialize, Serialize};

/// A city known to the weather provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// External provider id (unique)
    pub city_id: i64,
    pub name: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

impl City {
    pub fn new(city_id: i64, name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city_id,
            name: name.into(),
            country: country.into(),
        }
    }

    /// Autocomplete label, e.g. `Kyiv (UA)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.country)
    }
}

/// One entry of the static city catalog.
///
/// Extra fields such as `coord` or `state` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCity {
    pub id: i64,
    pub name: String,
    pub country: String,
}

impl From<CatalogCity> for City {
    fn from(entry: CatalogCity) -> Self {
        City {
            city_id: entry.id,
            name: entry.name,
            country: entry.country,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_catalog_entry_ignores_extra_fields() {
        let json = r#"{"id":707860,"name":"Hurzuf","country":"UA","coord":{"lon":34.283333,"lat":44.549999}}"#;
        let entry: CatalogCity = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, 707860);

        let city = City::from(entry);
        assert_eq!(city.city_id, 707860);
        assert_eq!(city.label(), "Hurzuf (UA)");
    }
}
