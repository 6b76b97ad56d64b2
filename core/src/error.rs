//! Error types for the NotionShare API client.
//!
//! # Design
//! Every failed call resolves to one `ApiError`. Non-2xx responses carry the
//! message the server put in its `detail` field (or the generic fallback), and
//! `Display` prints that message alone so it can be shown to a user as-is.

use thiserror::Error;

use crate::transport::TransportError;

/// Message used when a failed response carries no usable `detail`.
pub const GENERIC_ERROR_MESSAGE: &str = "Request failed";

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, ...).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// A 2xx response body could not be decoded into the expected type.
    #[error("invalid response body: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}
