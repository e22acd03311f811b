//! Error types
//!
//! Validation failures never reach the network; transport failures reject the
//! Mco call that issued them. Neither is retried here.

use std::fmt;

use thiserror::Error;

use crate::hub::Action;

/// Field that failed client-side validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationField {
    Name,
    Quantity,
}

impl fmt::Display for ValidationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Quantity => write!(f, "quantity"),
        }
    }
}

/// Patch rejected before any request was made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot {action} {} with empty {field}", .kind.to_lowercase())]
pub struct ValidationError {
    pub action: Action,
    pub kind: &'static str,
    pub field: ValidationField,
}

/// Failure of the underlying remote call
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response has no data envelope")]
    Envelope,

    #[error("no such resource: {path}")]
    NotFound { path: String },

    #[error("transport unavailable")]
    Unavailable,
}

/// Error returned by Mco operations
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed {kind} payload: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode {kind} request: {source}")]
    Encode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
