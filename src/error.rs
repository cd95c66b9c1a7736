//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BcboxError>;

#[derive(Debug, Error)]
pub enum BcboxError {
    /// Network failure, timeout, or non-2xx response from an external collaborator.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    /// Misconfiguration detected before any request is issued.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// A response body did not match the expected record shape.
    #[error("decode error: {reason}")]
    Decode { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BcboxError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Stable snake-case code, suitable for log fields and telemetry.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Configuration { .. } => "configuration",
            Self::Decode { .. } => "decode",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Json(_) => "json",
            Self::Io(_) => "io",
        }
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// HTTP status carried by a transport failure, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BcboxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode {
                reason: err.to_string(),
            };
        }
        Self::Transport {
            status: err.status().map(|status| status.as_u16()),
            message: err.to_string(),
        }
    }
}
