use thiserror::Error;

/// Top-level error type for the `camlay-api` crate.
///
/// Covers every failure mode across both API surfaces: the camera's
/// configuration endpoint and the OctoPrint REST + push APIs.
/// `camlay-core` maps these into its own error type.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected, or the digest challenge could not be answered.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Invalid OctoPrint API key (rejected by the server).
    #[error("Invalid API key")]
    InvalidApiKey,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Camera ──────────────────────────────────────────────────────
    /// The camera answered with a non-success status.
    #[error("Camera returned HTTP {status}: {body}")]
    Camera { status: u16, body: String },

    // ── OctoPrint ───────────────────────────────────────────────────
    /// The OctoPrint REST API answered with a non-success status.
    #[error("OctoPrint API error (HTTP {status}): {message}")]
    OctoPrint { status: u16, message: String },

    // ── Push feed ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Map a reqwest failure, surfacing timeouts as [`Error::Timeout`].
    pub(crate) fn from_request(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::Transport(err)
        }
    }

    /// Returns `true` if the credentials were rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::InvalidApiKey)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::WebSocketConnect(_) => true,
            Self::Camera { status, .. } | Self::OctoPrint { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Camera { status, .. } | Self::OctoPrint { status, .. } => Some(*status),
            _ => None,
        }
    }
}
