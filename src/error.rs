//! Error handling.

use axum::{
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use strum_macros::Display;
use thiserror::Error;
use tracing::{event, Level};

/// Kinds of named entity that a request may refer to.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Constituency,
    #[strum(serialize = "constituency type")]
    ConstituencyType,
    Party,
    State,
    Year,
    Route,
}

/// Election Explorer error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum ElectionError {
    /// A named entity does not exist in the loaded data
    #[error("{kind} {name} not found")]
    NotFound { kind: EntityKind, name: String },

    /// Malformed request input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Error validating query parameters
    #[error("query parameters are not valid")]
    QueryValidation(#[from] validator::ValidationErrors),

    /// Error reading a data file or directory
    #[error("failed to read election data from {path}")]
    DataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a CSV data file
    #[error("failed to parse election data in {path}")]
    DataParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A CSV row is well formed but its content is unusable
    #[error("invalid election data in {path} at line {line}: {reason}")]
    DataFormat {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// The data directory contains no CSV files
    #[error("no CSV files found in {path}")]
    NoDataFiles { path: PathBuf },
}

impl ElectionError {
    /// Return a [ElectionError::NotFound] for an entity of the given kind.
    pub fn not_found(kind: EntityKind, name: impl ToString) -> Self {
        ElectionError::NotFound {
            kind,
            name: name.to_string(),
        }
    }
}

impl IntoResponse for ElectionError {
    /// Convert from an `ElectionError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<ElectionError> for ErrorResponse {
    /// Convert from an `ElectionError` into an `ErrorResponse`.
    fn from(error: ElectionError) -> Self {
        let response = match &error {
            // Bad request
            ElectionError::InvalidInput(_) | ElectionError::QueryValidation(_) => {
                Self::bad_request(&error)
            }

            // Not found
            ElectionError::NotFound { .. } => Self::not_found(&error),

            // Internal server error. Load errors abort startup, so these are not expected at
            // request time.
            ElectionError::DataRead { .. }
            | ElectionError::DataParse { .. }
            | ElectionError::DataFormat { .. }
            | ElectionError::NoDataFiles { .. } => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            log_error_chain(&error);
        }

        response
    }
}

/// Log an error and each of its causes.
pub fn log_error_chain(error: &ElectionError) {
    event!(Level::ERROR, "{}", error.to_string());
    let mut current = error.source();
    while let Some(source) = current {
        event!(Level::ERROR, "Caused by: {}", source.to_string());
        current = source.source();
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
