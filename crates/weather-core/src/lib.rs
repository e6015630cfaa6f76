pub mod app;
pub mod config;
pub mod error;
pub mod html;
pub mod plugin;

pub use app::App;
pub use config::{
    is_known_country, BlockConfiguration, CatalogConfig, Config, DisplayConfig, ServerConfig,
    StorageConfig, TemperatureScale, ValidationResult, WeatherConfig, COUNTRY_OPTIONS,
};
pub use error::{
    AppError, ConfigError, DatabaseError, NetworkError, ProviderError, ReqwestErrorExt,
    RusqliteErrorExt,
};
pub use html::escape_html;
pub use plugin::{BlockDefinition, PluginContext, PluginProvider};

use anyhow::Result;

/// Initialize logging. `RUST_LOG` wins over `default_level`.
pub fn init(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("Weather block core initialized");
    Ok(())
}
