//! Error taxonomy and the response envelope returned at the operation boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised while reading or writing the record store.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// Failures of an analytics operation.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// Zero standard deviation. Outlier detection reports this as a note.
    #[error("No variation in data")]
    NoVariation,

    #[error("Computation error: {0}")]
    Computation(String),

    #[error(transparent)]
    DataSource(SourceError),
}

impl From<SourceError> for AnalyticsError {
    fn from(err: SourceError) -> Self {
        match err {
            // Missing or mistyped columns are a computation failure, not a store outage
            SourceError::InvalidRow(msg) => AnalyticsError::Computation(msg),
            SourceError::Database(
                e @ (rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::InvalidColumnName(_)
                | rusqlite::Error::FromSqlConversionFailure(..)),
            ) => AnalyticsError::Computation(e.to_string()),
            other => AnalyticsError::DataSource(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Success/error payload handed to whatever renders results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl<T> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::error(e.to_string()),
        }
    }
}
