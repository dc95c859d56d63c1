// ── Runtime bridge configuration ──
//
// These types describe the camera sink, the printer host and the worker's
// schedule. They carry credential data and tuning, but never touch disk.
// The CLI builds them (via camlay-config) and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use camlay_api::{CameraClient, DigestCredentials, TlsMode, TransportConfig};

use crate::error::CoreError;
use crate::log::DEFAULT_LOG_THRESHOLD;
use crate::progress::ProgressSource;

pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_STARTUP_GRACE: Duration = Duration::from_secs(60);
pub const DEFAULT_CAMERA_TIMEOUT: Duration = Duration::from_secs(5);

/// TLS verification strategy for the printer host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs on a LAN print server).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Where and how overlay updates are delivered.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Camera host, optionally with a scheme and port (`192.168.1.108`).
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// Upper bound on a single overlay request.
    pub timeout: Duration,
    /// When false, URLs are built and logged but never sent.
    pub send_enabled: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            username: "admin".into(),
            password: SecretString::from(String::new()),
            timeout: DEFAULT_CAMERA_TIMEOUT,
            send_enabled: true,
        }
    }
}

impl CameraConfig {
    /// Build the Digest-authenticated camera client described by this config.
    pub fn build_client(&self) -> Result<CameraClient, CoreError> {
        let transport = TransportConfig::with_timeout(self.timeout);
        let credentials = DigestCredentials::new(self.username.clone(), self.password.clone());
        Ok(CameraClient::new(
            &self.host,
            credentials,
            &transport,
            self.send_enabled,
        )?)
    }
}

/// Connection details for the OctoPrint host.
#[derive(Debug, Clone)]
pub struct OctoPrintConfig {
    /// Server URL (e.g., `http://octopi.local`).
    pub url: Url,
    pub api_key: SecretString,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// Subscribe to the push feed for lifecycle events and protocol lines.
    pub push_enabled: bool,
}

impl OctoPrintConfig {
    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
        }
    }
}

/// Worker schedule and progress policy.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Which progress signal is authoritative.
    pub progress_source: ProgressSource,
    /// Time between ticks.
    pub update_interval: Duration,
    /// Ticks before this much time has passed only log and wait.
    pub startup_grace: Duration,
    /// Messages per severity level forwarded before the worker log goes quiet.
    pub log_threshold: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            progress_source: ProgressSource::default(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            startup_grace: DEFAULT_STARTUP_GRACE,
            log_threshold: DEFAULT_LOG_THRESHOLD,
        }
    }
}

/// Everything needed to run a bridge against OctoPrint.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bridge: BridgeConfig,
    pub camera: CameraConfig,
    pub printer: OctoPrintConfig,
}
