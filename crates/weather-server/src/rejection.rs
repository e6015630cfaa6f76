//! Turns `AppError`s into HTTP responses.

use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{Rejection, Reply};
use weather_core::{AppError, NetworkError};

/// Rejection carrying an application error.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl warp::reject::Reject for ApiError {}

/// Reject with `err` converted to an `AppError`.
pub fn reject<E: Into<AppError>>(err: E) -> Rejection {
    warp::reject::custom(ApiError(err.into()))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// HTTP status for an application error.
pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Network(NetworkError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        AppError::Network(_) | AppError::Provider(_) => StatusCode::BAD_GATEWAY,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(ApiError(e)) = err.find::<ApiError>() {
        let status = status_for(e);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", e);
        } else {
            tracing::debug!("Request rejected: {}", e);
        }
        (status, e.user_message().to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported content type".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::{ConfigError, ProviderError};

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&AppError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&AppError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AppError::Config(ConfigError::Invalid("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AppError::Provider(ProviderError::InvalidApiKey)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&AppError::Network(NetworkError::Timeout)),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&AppError::Other(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
