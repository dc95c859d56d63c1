//! Configuration for the camlay bridge.
//!
//! TOML file + `CAMLAY_` environment overrides, credential resolution
//! (env var → keyring → plaintext), and translation into the runtime
//! types of `camlay_core`. The CLI layers its flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use camlay_core::{
    BridgeConfig, CameraConfig, OctoPrintConfig, ProgressSource, RuntimeConfig, TlsVerification,
};

/// Keyring service name all secrets are stored under.
pub const KEYRING_SERVICE: &str = "camlay";

const ENV_PREFIX: &str = "CAMLAY_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {secret} configured")]
    NoCredentials { secret: SecretKind },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraSection,

    #[serde(default)]
    pub printer: PrinterSection,

    #[serde(default)]
    pub overlay: OverlaySection,
}

/// `[camera]`: the overlay sink.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CameraSection {
    /// Camera host, optionally with scheme and port.
    #[serde(default = "default_camera_host")]
    pub host: String,

    #[serde(default = "default_camera_user")]
    pub username: String,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_camera_timeout")]
    pub timeout: u64,

    /// Set to false to build and log URLs without sending them.
    #[serde(default = "default_true")]
    pub send: bool,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            host: default_camera_host(),
            username: default_camera_user(),
            password: None,
            password_env: None,
            timeout: default_camera_timeout(),
            send: true,
        }
    }
}

/// `[printer]`: the OctoPrint host.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PrinterSection {
    /// OctoPrint base URL.
    #[serde(default = "default_printer_url")]
    pub url: String,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// `firmware` (M73 lines) or `host` (percentage callback).
    #[serde(default)]
    pub progress_source: ProgressSource,

    /// Subscribe to the push feed for lifecycle events and protocol lines.
    #[serde(default = "default_true")]
    pub push: bool,

    /// Accept self-signed certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_printer_timeout")]
    pub timeout: u64,
}

impl Default for PrinterSection {
    fn default() -> Self {
        Self {
            url: default_printer_url(),
            api_key: None,
            api_key_env: None,
            progress_source: ProgressSource::default(),
            push: true,
            insecure: false,
            ca_cert: None,
            timeout: default_printer_timeout(),
        }
    }
}

/// `[overlay]`: worker schedule.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OverlaySection {
    /// Seconds between updates.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Seconds after start-up before the first update.
    #[serde(default = "default_startup_grace")]
    pub startup_grace: u64,

    /// Messages per log level before the worker goes quiet.
    #[serde(default = "default_log_threshold")]
    pub log_threshold: u64,
}

impl Default for OverlaySection {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            startup_grace: default_startup_grace(),
            log_threshold: default_log_threshold(),
        }
    }
}

fn default_camera_host() -> String {
    "localhost".into()
}
fn default_camera_user() -> String {
    "admin".into()
}
fn default_camera_timeout() -> u64 {
    camlay_core::config::DEFAULT_CAMERA_TIMEOUT.as_secs()
}
fn default_printer_url() -> String {
    "http://localhost".into()
}
fn default_printer_timeout() -> u64 {
    10
}
fn default_interval() -> u64 {
    camlay_core::config::DEFAULT_UPDATE_INTERVAL.as_secs()
}
fn default_startup_grace() -> u64 {
    camlay_core::config::DEFAULT_STARTUP_GRACE.as_secs()
}
fn default_log_threshold() -> u64 {
    camlay_core::log::DEFAULT_LOG_THRESHOLD
}
fn default_true() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "camlay", "camlay").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("camlay");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from an explicit file + environment. A missing file yields the
/// defaults (plus any environment overrides).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// A secret camlay knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    CameraPassword,
    PrinterApiKey,
}

impl SecretKind {
    /// Account name under [`KEYRING_SERVICE`].
    pub fn keyring_user(self) -> &'static str {
        match self {
            Self::CameraPassword => "camera/password",
            Self::PrinterApiKey => "printer/api-key",
        }
    }
}

impl std::fmt::Display for SecretKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CameraPassword => f.write_str("camera password"),
            Self::PrinterApiKey => f.write_str("OctoPrint API key"),
        }
    }
}

/// Store a secret in the system keyring.
pub fn store_secret(kind: SecretKind, value: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, kind.keyring_user())?;
    entry.set_password(value)?;
    Ok(())
}

fn resolve_secret(
    kind: SecretKind,
    env_name: Option<&str>,
    plaintext: Option<&str>,
) -> Result<SecretString, ConfigError> {
    // 1. Named env var
    if let Some(env_name) = env_name {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, kind.keyring_user()) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(value) = plaintext {
        return Ok(SecretString::from(value.to_owned()));
    }

    Err(ConfigError::NoCredentials { secret: kind })
}

/// Resolve the camera password from the credential chain.
pub fn resolve_camera_password(camera: &CameraSection) -> Result<SecretString, ConfigError> {
    resolve_secret(
        SecretKind::CameraPassword,
        camera.password_env.as_deref(),
        camera.password.as_deref(),
    )
}

/// Resolve the OctoPrint API key from the credential chain.
pub fn resolve_printer_api_key(printer: &PrinterSection) -> Result<SecretString, ConfigError> {
    resolve_secret(
        SecretKind::PrinterApiKey,
        printer.api_key_env.as_deref(),
        printer.api_key.as_deref(),
    )
}

// ── Translation to runtime config ───────────────────────────────────

/// Build the camera sink config, resolving its password.
///
/// With sending disabled no request ever goes out, so a missing password
/// is replaced by an empty one.
pub fn camera_config(cfg: &Config) -> Result<CameraConfig, ConfigError> {
    let camera = &cfg.camera;
    if camera.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "camera.host".into(),
            reason: "must not be empty".into(),
        });
    }
    let password = match resolve_camera_password(camera) {
        Err(ConfigError::NoCredentials { .. }) if !camera.send => SecretString::from(String::new()),
        other => other?,
    };
    Ok(CameraConfig {
        host: camera.host.clone(),
        username: camera.username.clone(),
        password,
        timeout: positive_secs("camera.timeout", camera.timeout)?,
        send_enabled: camera.send,
    })
}

/// Build the OctoPrint host config, resolving its API key.
pub fn printer_config(cfg: &Config) -> Result<OctoPrintConfig, ConfigError> {
    let printer = &cfg.printer;
    let url: url::Url = printer.url.parse().map_err(|_| ConfigError::Validation {
        field: "printer.url".into(),
        reason: format!("invalid URL: {}", printer.url),
    })?;

    let tls = if printer.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = printer.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(OctoPrintConfig {
        url,
        api_key: resolve_printer_api_key(printer)?,
        tls,
        timeout: positive_secs("printer.timeout", printer.timeout)?,
        push_enabled: printer.push,
    })
}

/// Build the worker schedule.
pub fn bridge_config(cfg: &Config) -> Result<BridgeConfig, ConfigError> {
    Ok(BridgeConfig {
        progress_source: cfg.printer.progress_source,
        update_interval: positive_secs("overlay.interval", cfg.overlay.interval)?,
        startup_grace: Duration::from_secs(cfg.overlay.startup_grace),
        log_threshold: cfg.overlay.log_threshold,
    })
}

/// Everything needed to run the bridge.
pub fn runtime_config(cfg: &Config) -> Result<RuntimeConfig, ConfigError> {
    Ok(RuntimeConfig {
        bridge: bridge_config(cfg)?,
        camera: camera_config(cfg)?,
        printer: printer_config(cfg)?,
    })
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
