use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Bearer credential missing or not equal to the configured token
    #[error("Invalid authentication credentials")]
    Unauthorized,

    /// Malformed range, body or query string
    #[error("{message}")]
    InvalidArgument { message: String },

    /// Transport failure talking to the metrics backend (connect, timeout, non-2xx)
    #[error("Metrics backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// Backend answered but the query did not succeed
    #[error("Metrics backend query failed: {body}")]
    QueryFailed { body: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            Error::BackendUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::QueryFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the detail string sent to the caller.
    ///
    /// Backend failures carry the upstream diagnostic verbatim; internal errors are collapsed so
    /// nothing about the process leaks.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthorized => "Invalid authentication credentials".to_string(),
            Error::InvalidArgument { message } => message.clone(),
            Error::BackendUnavailable { .. } | Error::QueryFailed { .. } => self.to_string(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Internal { .. } | Error::Other(_) | Error::BackendUnavailable { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::QueryFailed { .. } => {
                tracing::warn!("Backend query error: {}", self);
            }
            Error::Unauthorized => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::InvalidArgument { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = Json(json!({ "message": self.user_message() }));
        let mut response = (status, body).into_response();

        if matches!(self, Error::Unauthorized) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidArgument {
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidArgument {
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidArgument {
            message: rejection.body_text(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
