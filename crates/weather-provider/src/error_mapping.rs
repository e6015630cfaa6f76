//! Maps provider and block errors to `weather_core::AppError`.

use weather_core::{AppError, ConfigError, ProviderError, ReqwestErrorExt};

use crate::block::BlockError;
use crate::types::WeatherError;

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Api { status, message } => {
                AppError::Provider(ProviderError::ApiError(format!("{status}: {message}")))
            }
            WeatherError::CityNotFound(s) => AppError::Provider(ProviderError::CityNotFound(s)),
            WeatherError::InvalidApiKey => AppError::Provider(ProviderError::InvalidApiKey),
            WeatherError::Parse(s) => AppError::Provider(ProviderError::MalformedResponse(s)),
        }
    }
}

impl From<BlockError> for AppError {
    fn from(e: BlockError) -> Self {
        match e {
            BlockError::InvalidScale(s) => {
                AppError::Config(ConfigError::Invalid(format!("Unknown temperature scale: {s}")))
            }
            BlockError::MissingCity => AppError::Validation("City is required".into()),
            BlockError::Weather(e) => e.into(),
        }
    }
}
