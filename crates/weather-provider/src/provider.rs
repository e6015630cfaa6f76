use reqwest::Client;
use tracing::instrument;
use weather_core::{TemperatureScale, WeatherConfig};

use crate::types::{ProviderResponse, WeatherError, WeatherSnapshot};

/// Fetches current conditions for a city from the provider API.
#[derive(Debug, Clone)]
pub struct WeatherQueryService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl WeatherQueryService {
    pub fn new(client: Client, settings: &WeatherConfig) -> Self {
        Self {
            client,
            api_url: settings.api_url.clone(),
            api_key: settings.key.clone(),
        }
    }

    /// Request URL for `city_id` with the configured key.
    pub fn request_url(&self, city_id: &str) -> String {
        build_request_url(&self.api_url, city_id, &self.api_key)
    }

    /// One GET against `url`.
    ///
    /// An empty body, `{}` or `null` yields `Ok(None)`.
    #[instrument(skip(self, url), level = "info")]
    pub async fn fetch(&self, url: &str) -> Result<Option<ProviderResponse>, WeatherError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.as_u16() == 401 {
            return Err(WeatherError::InvalidApiKey);
        }
        if status.as_u16() == 404 {
            let text = response.text().await.unwrap_or_default();
            return Err(WeatherError::CityNotFound(text));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let text = response.text().await?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_str(trimmed)
            .map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)))?;

        match &value {
            serde_json::Value::Null => return Ok(None),
            serde_json::Value::Object(map) if map.is_empty() => return Ok(None),
            _ => {}
        }

        let parsed = serde_json::from_value(value)
            .map_err(|e| WeatherError::Parse(format!("Unexpected response shape: {}", e)))?;
        Ok(Some(parsed))
    }

    /// Current conditions for `city_id` converted to `scale`.
    ///
    /// `Ok(None)` when the city is blank, no scale is given, or the provider
    /// returns nothing.
    pub async fn get_weather(
        &self,
        city_id: &str,
        scale: Option<TemperatureScale>,
    ) -> Result<Option<WeatherSnapshot>, WeatherError> {
        let city_id = city_id.trim();
        let Some(scale) = scale else {
            return Ok(None);
        };
        if city_id.is_empty() {
            return Ok(None);
        }

        let url = self.request_url(city_id);
        let Some(response) = self.fetch(&url).await? else {
            tracing::debug!("Provider returned no data for city {}", city_id);
            return Ok(None);
        };

        Ok(Some(convert_response(response, scale)))
    }
}

/// `{api_url}?id={city_id}&appid={api_key}` with both values percent-encoded.
pub fn build_request_url(api_url: &str, city_id: &str, api_key: &str) -> String {
    format!(
        "{}?id={}&appid={}",
        api_url,
        urlencoding::encode(city_id),
        urlencoding::encode(api_key)
    )
}

/// Convert a Kelvin reading, rounding down to a whole degree.
pub fn convert_temperature(kelvin: f64, scale: TemperatureScale) -> i64 {
    let value = match scale {
        TemperatureScale::Fahrenheit => kelvin * 9.0 / 5.0 - 459.67,
        TemperatureScale::Celsius => kelvin - 273.15,
    };
    value.floor() as i64
}

fn convert_response(response: ProviderResponse, scale: TemperatureScale) -> WeatherSnapshot {
    let main = response.main;
    let condition = response.weather.into_iter().next().unwrap_or_default();

    WeatherSnapshot {
        name: response.name,
        temperature: convert_temperature(main.temp, scale),
        temperature_min: convert_temperature(main.temp_min.unwrap_or(main.temp), scale),
        temperature_max: convert_temperature(main.temp_max.unwrap_or(main.temp), scale),
        scale,
        pressure: main.pressure,
        humidity: main.humidity,
        description: condition.description,
        icon: condition.icon,
        wind_speed: response.wind.speed,
        sunrise: response.sys.sunrise,
        sunset: response.sys.sunset,
    }
}
