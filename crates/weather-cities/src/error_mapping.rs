//! Maps city errors to `weather_core::AppError` for consistent user-facing messages.

use weather_core::{AppError, DatabaseError, NetworkError, ReqwestErrorExt, RusqliteErrorExt};

use crate::catalog::CatalogError;
use crate::city_store::CityStoreError;
use crate::import::ImportError;

impl From<CityStoreError> for AppError {
    fn from(e: CityStoreError) -> Self {
        match e {
            CityStoreError::Duplicate(id) => {
                AppError::Database(DatabaseError::Constraint(format!("city_id {id}")))
            }
            CityStoreError::Database(e) => AppError::Database(e.into_database_error()),
            CityStoreError::Io(e) => AppError::Io(e),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Network(e) => AppError::Network(e.into_network_error()),
            CatalogError::Status { status, body } => AppError::Network(NetworkError::ServerError {
                status,
                message: body,
            }),
            CatalogError::Parse(s) => AppError::Network(NetworkError::InvalidResponse(s)),
        }
    }
}

impl From<ImportError> for AppError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::NotInitialized => {
                AppError::Validation("Import job has not been initialized".into())
            }
            ImportError::Store(e) => e.into(),
        }
    }
}
