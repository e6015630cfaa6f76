use serde::{Deserialize, Serialize};
use weather_core::TemperatureScale;

/// Current-conditions payload returned by the provider.
///
/// Temperatures are in Kelvin. Only `main.temp` is required; other fields
/// default when the provider leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub name: String,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub sys: SunTimes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub temp_max: Option<f64>,
    /// hPa
    #[serde(default)]
    pub pressure: f64,
    /// Percent
    #[serde(default)]
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Condition {
    #[serde(default)]
    pub description: String,
    /// Icon code such as `04d`
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Wind {
    /// Meters per second
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SunTimes {
    /// Unix timestamps (UTC)
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// Provider data with temperatures converted to the requested scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub name: String,
    pub temperature: i64,
    pub temperature_min: i64,
    pub temperature_max: i64,
    pub scale: TemperatureScale,
    pub pressure: f64,
    pub humidity: f64,
    pub description: String,
    pub icon: String,
    pub wind_speed: f64,
    pub sunrise: i64,
    pub sunset: i64,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("City not found: {0}")]
    CityNotFound(String),
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_full_payload_parses() {
        let json = r#"{
            "coord": {"lon": 30.52, "lat": 50.43},
            "weather": [{"id": 804, "main": "Clouds", "description": "overcast clouds", "icon": "04d"}],
            "main": {"temp": 280.32, "pressure": 1012, "humidity": 81, "temp_min": 279.15, "temp_max": 281.15},
            "wind": {"speed": 4.1, "deg": 80},
            "sys": {"country": "UA", "sunrise": 1485762037, "sunset": 1485794875},
            "id": 703448,
            "name": "Kyiv",
            "cod": 200
        }"#;

        let response: ProviderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.name, "Kyiv");
        assert_eq!(response.main.humidity, 81.0);
        assert_eq!(response.weather[0].icon, "04d");
        assert_eq!(response.sys.sunset, 1485794875);
    }

    #[test]
    fn test_missing_temperature_is_rejected() {
        let json = r#"{"name": "Kyiv", "main": {"pressure": 1012}}"#;
        assert!(serde_json::from_str::<ProviderResponse>(json).is_err());
    }
}
