//! The "Weather" block: per-block settings, display fields and HTML.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use weather_core::{
    escape_html, BlockConfiguration, BlockDefinition, Config, PluginContext, PluginProvider,
    TemperatureScale,
};

use crate::provider::WeatherQueryService;
use crate::types::{WeatherError, WeatherSnapshot};

pub const BLOCK_ID: &str = "weather_block";
pub const BLOCK_THEME: &str = "weather";

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("Unknown temperature scale: {0:?}")]
    InvalidScale(String),

    #[error("City is required")]
    MissingCity,

    #[error("Weather lookup failed: {0}")]
    Weather(#[from] WeatherError),
}

/// Values submitted by the block settings form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockForm {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub scale: String,
}

impl BlockForm {
    /// Validate the submission. Both fields are required; the scale must be `C` or `F`.
    pub fn into_configuration(self) -> Result<BlockConfiguration, BlockError> {
        let scale: TemperatureScale = self
            .scale
            .parse()
            .map_err(|_| BlockError::InvalidScale(self.scale.clone()))?;
        let settings = BlockConfiguration::new(self.city.trim(), scale);
        settings.validate().map_err(|_| BlockError::MissingCity)?;
        Ok(settings)
    }
}

/// Fields handed to the `weather` template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockDisplay {
    pub name: String,
    pub temp: i64,
    /// HTML entity for the degree sign
    pub scale: &'static str,
    pub pressure: f64,
    pub humidity: f64,
    pub description: String,
    /// Absolute icon URL
    pub icon: String,
    pub wind_speed: f64,
    /// `HH:MM:SS`
    pub sunrise: String,
    pub sunset: String,
}

/// HTML entity for the scale's degree sign.
pub fn scale_symbol(scale: TemperatureScale) -> &'static str {
    match scale {
        TemperatureScale::Celsius => "&#8451;",
        TemperatureScale::Fahrenheit => "&#8457;",
    }
}

/// Renders weather snapshots for display.
#[derive(Debug, Clone)]
pub struct WeatherBlock {
    icon_base: String,
    offset: FixedOffset,
}

impl WeatherBlock {
    pub fn new(config: &Config) -> Self {
        let offset = config
            .display
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self {
            icon_base: config.weather.icon_url.trim_end_matches('/').to_string(),
            offset,
        }
    }

    /// `{icon_base}/{icon}.png`
    pub fn icon_url(&self, icon: &str) -> String {
        format!("{}/{}.png", self.icon_base, icon)
    }

    /// Unix timestamp as `HH:MM:SS` in the display offset.
    pub fn format_time(&self, timestamp: i64) -> String {
        DateTime::from_timestamp(timestamp, 0)
            .map(|dt| dt.with_timezone(&self.offset).format("%H:%M:%S").to_string())
            .unwrap_or_default()
    }

    pub fn display(&self, snapshot: &WeatherSnapshot) -> BlockDisplay {
        BlockDisplay {
            name: snapshot.name.clone(),
            temp: snapshot.temperature,
            scale: scale_symbol(snapshot.scale),
            pressure: snapshot.pressure,
            humidity: snapshot.humidity,
            description: snapshot.description.clone(),
            icon: self.icon_url(&snapshot.icon),
            wind_speed: snapshot.wind_speed,
            sunrise: self.format_time(snapshot.sunrise),
            sunset: self.format_time(snapshot.sunset),
        }
    }

    /// Fetch and map the weather for a configured block.
    ///
    /// Lookup failures are logged and produce `None`, so the block renders empty.
    pub async fn build(
        &self,
        service: &WeatherQueryService,
        settings: &BlockConfiguration,
    ) -> Option<BlockDisplay> {
        if settings.city.trim().is_empty() {
            return None;
        }

        match service.get_weather(&settings.city, Some(settings.scale)).await {
            Ok(Some(snapshot)) => Some(self.display(&snapshot)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Weather for city {} unavailable: {}", settings.city, e);
                None
            }
        }
    }

    /// `weather` template. An empty container when there is nothing to show.
    pub fn render_html(&self, display: Option<&BlockDisplay>) -> String {
        let Some(d) = display else {
            return r#"<div class="weather"></div>"#.to_string();
        };

        let mut html = String::from("<div class=\"weather\">\n");
        html.push_str(&format!(
            "  <h3 class=\"weather__city\">{}</h3>\n",
            escape_html(&d.name)
        ));
        html.push_str(&format!(
            "  <div class=\"weather__now\"><img class=\"weather__icon\" src=\"{}\" alt=\"{}\"> <span class=\"weather__temp\">{}{}</span></div>\n",
            escape_html(&d.icon),
            escape_html(&d.description),
            d.temp,
            d.scale
        ));
        html.push_str(&format!(
            "  <div class=\"weather__description\">{}</div>\n",
            escape_html(&d.description)
        ));
        html.push_str("  <ul class=\"weather__details\">\n");
        html.push_str(&format!("    <li>Pressure: {} hPa</li>\n", d.pressure));
        html.push_str(&format!("    <li>Humidity: {}%</li>\n", d.humidity));
        html.push_str(&format!("    <li>Wind: {} m/s</li>\n", d.wind_speed));
        html.push_str(&format!("    <li>Sunrise: {}</li>\n", escape_html(&d.sunrise)));
        html.push_str(&format!("    <li>Sunset: {}</li>\n", escape_html(&d.sunset)));
        html.push_str("  </ul>\n</div>");
        html
    }

    /// Build and render in one go.
    pub async fn render(
        &self,
        service: &WeatherQueryService,
        settings: &BlockConfiguration,
    ) -> String {
        let display = self.build(service, settings).await;
        self.render_html(display.as_ref())
    }
}

/// Registers the weather block type with the application.
#[derive(Debug, Default)]
pub struct WeatherBlockPlugin {
    initialized: bool,
}

impl WeatherBlockPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl PluginProvider for WeatherBlockPlugin {
    fn id(&self) -> &str {
        BLOCK_ID
    }

    fn name(&self) -> &str {
        "Weather"
    }

    fn initialize(&mut self, ctx: &PluginContext) -> anyhow::Result<()> {
        if ctx.config.weather.key.trim().is_empty() {
            tracing::warn!("Weather API key is not set; blocks will render empty");
        }
        tracing::info!("Weather block ready ({} configured)", ctx.config.blocks.len());
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        self.initialized = false;
        Ok(())
    }

    fn blocks(&self) -> Vec<BlockDefinition> {
        vec![BlockDefinition {
            id: BLOCK_ID.to_string(),
            admin_label: "Weather".to_string(),
            theme: BLOCK_THEME.to_string(),
        }]
    }
}
