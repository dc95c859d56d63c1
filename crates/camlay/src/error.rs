//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use camlay_config::{ConfigError, SecretKind};
use camlay_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const REMOTE: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(camlay::connection_failed),
        help(
            "Check that the camera and OctoPrint are reachable from this machine.\n\
             Try: camlay preview --dry-run"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(camlay::timeout),
        help("Raise camera.timeout / printer.timeout or check the device's responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(camlay::auth_failed),
        help(
            "Verify the camera username/password and the OctoPrint API key.\n\
             Run: camlay config set-password camera  (or: printer)"
        )
    )]
    AuthFailed { message: String },

    #[error("No {secret} configured")]
    #[diagnostic(
        code(camlay::no_credentials),
        help(
            "Configure credentials with: camlay config init\n\
             Or store one with: camlay config set-password {target}"
        )
    )]
    NoCredentials { secret: String, target: String },

    // ── Remote ───────────────────────────────────────────────────────

    #[error("Camera answered HTTP {status}: {message}")]
    #[diagnostic(code(camlay::camera))]
    Camera { status: u16, message: String },

    #[error("OctoPrint error: {message}")]
    #[diagnostic(code(camlay::printer))]
    Printer { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(camlay::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(camlay::config),
        help("Check the config file: camlay config path")
    )]
    Config(Box<figment::Error>),

    #[error("Keyring error: {reason}")]
    #[diagnostic(code(camlay::keyring))]
    Keyring { reason: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Camera { .. } | Self::Printer { .. } => exit_code::REMOTE,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Camera { status, message } => CliError::Camera { status, message },
            CoreError::Host { message, .. } | CoreError::Internal(message) => {
                CliError::Printer { message }
            }
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { secret } => CliError::NoCredentials {
                secret: secret.to_string(),
                target: match secret {
                    SecretKind::CameraPassword => "camera".into(),
                    SecretKind::PrinterApiKey => "printer".into(),
                },
            },
            ConfigError::Figment(err) => CliError::Config(err),
            ConfigError::Keyring(err) => CliError::Keyring {
                reason: err.to_string(),
            },
            ConfigError::Serialization(err) => CliError::Validation {
                field: "config".into(),
                reason: err.to_string(),
            },
            ConfigError::Io(err) => CliError::Io(err),
        }
    }
}
