// ── Core error types ──
//
// Errors surfaced by camlay-core. Transport-layer details from
// camlay-api are translated into domain variants here so consumers can
// match on what went wrong (camera, printer host, config) rather than on
// HTTP plumbing.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("Camera rejected overlay update (HTTP {status}): {message}")]
    Camera { status: u16, message: String },

    #[error("Printer host error: {message}")]
    Host {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if retrying on the next tick may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::Camera { status, .. } => *status >= 500,
            Self::Host { status, .. } => status.is_none_or(|s| s >= 500),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<camlay_api::Error> for CoreError {
    fn from(err: camlay_api::Error) -> Self {
        match err {
            camlay_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            camlay_api::Error::InvalidApiKey => CoreError::AuthenticationFailed {
                message: "OctoPrint rejected the API key".into(),
            },
            camlay_api::Error::Transport(ref e) if e.is_connect() => CoreError::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), |u| u.as_str().to_owned()),
                reason: e.to_string(),
            },
            camlay_api::Error::Transport(e) => CoreError::Host {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            camlay_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            camlay_api::Error::Camera { status, body } => CoreError::Camera {
                status,
                message: body,
            },
            camlay_api::Error::OctoPrint { status, message } => CoreError::Host {
                message,
                status: Some(status),
            },
            camlay_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: "push feed".into(),
                reason,
            },
            camlay_api::Error::Deserialization { message, .. } => CoreError::Host {
                message: format!("unexpected response: {message}"),
                status: None,
            },
            camlay_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            camlay_api::Error::Tls(message) => CoreError::Config { message },
        }
    }
}
