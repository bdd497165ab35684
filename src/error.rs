use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The client side of this application is server-rendered HTML, so
        // failures are reported as plain-text bodies rather than JSON.
        let (status, message) = match self {
            AppError::Database(ref err) => {
                if err.contains("connection") {
                    tracing::error!("PostgreSQL connection issue: {}", err);
                } else if err.contains("timeout") {
                    tracing::warn!("PostgreSQL operation timeout: {}", err);
                } else {
                    tracing::error!("PostgreSQL database error: {}", err);
                }

                // Never leak driver detail to the client
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Validation(ref message) => {
                tracing::debug!("Validation error: {}", message);
                (StatusCode::BAD_REQUEST, message.clone())
            }
            AppError::NotFound(ref resource) => {
                tracing::debug!("Resource not found: {}", resource);
                (StatusCode::NOT_FOUND, format!("{} not found", resource))
            }
            AppError::Io(ref err) => {
                tracing::error!("Filesystem error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Internal(ref err) => {
                tracing::error!("Internal server error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

// PostgreSQL error mapping
impl From<tokio_postgres::Error> for AppError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.code() {
            Some(&SqlState::NOT_NULL_VIOLATION) => {
                AppError::Validation("Required field is missing".to_string())
            }
            Some(&SqlState::INVALID_TEXT_REPRESENTATION) => {
                AppError::Validation("Invalid data format provided".to_string())
            }
            Some(&SqlState::NUMERIC_VALUE_OUT_OF_RANGE) => {
                AppError::Validation("Numeric value is out of range".to_string())
            }
            Some(&SqlState::STRING_DATA_LENGTH_MISMATCH) => {
                AppError::Validation("Text data exceeds maximum length".to_string())
            }
            Some(&SqlState::CONNECTION_EXCEPTION)
            | Some(&SqlState::CONNECTION_DOES_NOT_EXIST)
            | Some(&SqlState::CONNECTION_FAILURE) => {
                tracing::error!("PostgreSQL connection error: {}", err);
                AppError::Database("Database connection unavailable".to_string())
            }
            Some(&SqlState::INSUFFICIENT_PRIVILEGE) => {
                tracing::error!("PostgreSQL privilege error: {}", err);
                AppError::Database("Database access denied".to_string())
            }
            _ => {
                tracing::error!("Unhandled PostgreSQL error: {} (code: {:?})", err, err.code());
                AppError::Database("Database operation failed".to_string())
            }
        }
    }
}

// Connection pool error mapping
impl From<deadpool_postgres::PoolError> for AppError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                tracing::warn!("Database connection pool timeout: {}", err);
                AppError::Database("Database connection timeout".to_string())
            }
            deadpool_postgres::PoolError::Closed => {
                tracing::error!("Database connection pool is closed: {}", err);
                AppError::Database("Database service unavailable".to_string())
            }
            deadpool_postgres::PoolError::NoRuntimeSpecified => {
                tracing::error!("Database pool runtime error: {}", err);
                AppError::Internal(anyhow::anyhow!("Database configuration error"))
            }
            deadpool_postgres::PoolError::PostCreateHook(_) => {
                tracing::error!("Database connection setup error: {}", err);
                AppError::Database("Database connection setup failed".to_string())
            }
            _ => {
                tracing::error!("Database connection pool error: {}", err);
                AppError::Database("Database connection unavailable".to_string())
            }
        }
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
