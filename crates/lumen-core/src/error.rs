// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy shared by every Lumen crate.
//!
//! Each [`LumenError`] variant belongs to exactly one [`ErrorKind`], and every
//! kind maps deterministically to an HTTP status, a machine code and a short
//! user-facing message. The gateway renders these; the lifecycle controller
//! shows [`LumenError::user_message`] to the user.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Generic message for failures whose text must not reach the user.
pub const INTERNAL_MESSAGE: &str = "internal server error";

/// Machine-readable error classification.
///
/// The string form is the wire `code` field of every error body.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum ErrorKind {
    #[strum(serialize = "VALIDATION_ERROR")]
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[strum(serialize = "AUTH_ERROR")]
    #[serde(rename = "AUTH_ERROR")]
    Auth,
    #[strum(serialize = "API_ERROR")]
    #[serde(rename = "API_ERROR")]
    Api,
    #[strum(serialize = "NETWORK_ERROR")]
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    #[strum(serialize = "FILE_ERROR")]
    #[serde(rename = "FILE_ERROR")]
    File,
    #[strum(serialize = "INTERNAL_ERROR")]
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl ErrorKind {
    /// Default HTTP status for the kind.
    ///
    /// API errors usually carry their own upstream status; 502 is used when
    /// they don't.
    pub fn default_status(self) -> u16 {
        match self {
            ErrorKind::Validation | ErrorKind::File => 400,
            ErrorKind::Auth => 401,
            ErrorKind::Api => 502,
            ErrorKind::Network => 503,
            ErrorKind::Internal => 500,
        }
    }
}

/// The primary error type used across all Lumen crates.
#[derive(Debug, Error)]
pub enum LumenError {
    /// Malformed request input, rejected before any network call.
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<String>,
    },

    /// Missing or rejected upstream credential.
    #[error("{message}")]
    Auth {
        message: String,
        details: Option<String>,
    },

    /// The upstream provider reported a failure (or returned nothing usable).
    #[error("{message}")]
    Api {
        message: String,
        status: u16,
        details: Option<String>,
    },

    /// Transport failure talking to the upstream provider.
    #[error("{message}")]
    Network {
        message: String,
        details: Option<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Uploaded file is missing, of the wrong type, or too large.
    #[error("{message}")]
    File {
        message: String,
        details: Option<String>,
    },

    /// Upstream call exceeded the configured timeout.
    #[error("request timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Configuration errors (invalid values, unusable settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence backend errors (database, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Manual retry refused because the retry budget is spent.
    #[error("too many retries, try later")]
    RetriesExhausted { max: u32 },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LumenError {
    pub fn validation(message: impl Into<String>, details: Option<String>) -> Self {
        LumenError::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn auth(message: impl Into<String>, details: Option<String>) -> Self {
        LumenError::Auth {
            message: message.into(),
            details,
        }
    }

    pub fn api(message: impl Into<String>, status: u16, details: Option<String>) -> Self {
        LumenError::Api {
            message: message.into(),
            status,
            details,
        }
    }

    pub fn file(message: impl Into<String>, details: Option<String>) -> Self {
        LumenError::File {
            message: message.into(),
            details,
        }
    }

    pub fn network(message: impl Into<String>, details: Option<String>) -> Self {
        LumenError::Network {
            message: message.into(),
            details,
            source: None,
        }
    }

    /// Wraps any persistence failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        LumenError::Storage {
            source: source.into(),
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LumenError::Validation { .. } => ErrorKind::Validation,
            LumenError::Auth { .. } => ErrorKind::Auth,
            LumenError::Api { .. } => ErrorKind::Api,
            LumenError::Network { .. } | LumenError::Timeout { .. } => ErrorKind::Network,
            LumenError::File { .. } => ErrorKind::File,
            LumenError::RetriesExhausted { .. } => ErrorKind::Api,
            LumenError::Config(_) | LumenError::Storage { .. } | LumenError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP status code this error is rendered with.
    pub fn status_code(&self) -> u16 {
        match self {
            LumenError::Api { status, .. } => *status,
            LumenError::RetriesExhausted { .. } => 429,
            other => other.kind().default_status(),
        }
    }

    /// Wire code, e.g. `AUTH_ERROR`.
    pub fn code(&self) -> String {
        self.kind().to_string()
    }

    /// Short human-readable message. Never contains internal error text.
    pub fn user_message(&self) -> String {
        match self {
            LumenError::Validation { message, .. }
            | LumenError::Auth { message, .. }
            | LumenError::Api { message, .. }
            | LumenError::Network { message, .. }
            | LumenError::File { message, .. } => message.clone(),
            LumenError::Timeout { .. } => "the image service did not respond in time".to_string(),
            LumenError::RetriesExhausted { .. } => self.to_string(),
            LumenError::Config(_) | LumenError::Storage { .. } | LumenError::Internal(_) => {
                INTERNAL_MESSAGE.to_string()
            }
        }
    }

    /// Optional technical detail shown next to the message.
    pub fn details(&self) -> Option<String> {
        match self {
            LumenError::Validation { details, .. }
            | LumenError::Auth { details, .. }
            | LumenError::Api { details, .. }
            | LumenError::Network { details, .. }
            | LumenError::File { details, .. } => details.clone(),
            LumenError::Timeout { duration } => {
                Some(format!("no response within {}s", duration.as_secs()))
            }
            LumenError::RetriesExhausted { max } => Some(format!("retry limit is {max}")),
            LumenError::Config(msg) | LumenError::Internal(msg) => Some(msg.clone()),
            LumenError::Storage { source } => Some(source.to_string()),
        }
    }

    /// Rebuilds an error from the parts of a rendered error body.
    ///
    /// Used by HTTP clients of the gateway: an unknown code becomes
    /// [`LumenError::Internal`].
    pub fn from_parts(code: &str, status: u16, message: String, details: Option<String>) -> Self {
        match code.parse::<ErrorKind>() {
            Ok(ErrorKind::Validation) => LumenError::Validation { message, details },
            Ok(ErrorKind::Auth) => LumenError::Auth { message, details },
            Ok(ErrorKind::Api) => LumenError::Api {
                message,
                status,
                details,
            },
            Ok(ErrorKind::Network) => LumenError::Network {
                message,
                details,
                source: None,
            },
            Ok(ErrorKind::File) => LumenError::File { message, details },
            Ok(ErrorKind::Internal) | Err(_) => LumenError::Internal(message),
        }
    }
}
