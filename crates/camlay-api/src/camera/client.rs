// Camera overlay HTTP client
//
// Wraps `reqwest::Client` with the camera's configuration-endpoint URL
// layout and Digest authentication. The overlay text is appended to a
// fixed base URL verbatim; callers hand in an already percent-encoded
// parameter value.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use serde::Serialize;
use tracing::debug;
use url::{Position, Url};

use crate::auth::{DigestCredentials, DigestSession};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Path and query prefix of the custom-title setter. The encoded overlay
/// text is appended directly after the trailing `=`.
pub const OVERLAY_TEXT_PATH: &str =
    "/cgi-bin/configManager.cgi?action=setConfig&VideoWidget[0].CustomTitle[1].Text=";

/// Outcome of a successful overlay delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Delivery {
    /// The camera accepted the request.
    Sent { status: u16, body: String },
    /// Sending is disabled; the URL was built but not requested.
    Skipped { url: String },
}

/// HTTP client for the camera's overlay text endpoint.
pub struct CameraClient {
    http: reqwest::Client,
    base_url: String,
    digest: DigestSession,
    send_enabled: bool,
    timeout_secs: u64,
}

impl CameraClient {
    /// Create a client for the camera at `host`.
    ///
    /// `host` is a bare host (`192.168.1.108`, `cam.local:8080`) or a URL
    /// root that already carries an `http://` / `https://` scheme.
    pub fn new(
        host: &str,
        credentials: DigestCredentials,
        transport: &TransportConfig,
        send_enabled: bool,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, host, credentials, transport.timeout_secs(), send_enabled))
    }

    /// Create a camera client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        host: &str,
        credentials: DigestCredentials,
        timeout_secs: u64,
        send_enabled: bool,
    ) -> Self {
        Self {
            http,
            base_url: base_url_for(host),
            digest: DigestSession::new(credentials),
            send_enabled,
            timeout_secs,
        }
    }

    /// The fixed URL prefix every overlay request starts with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests actually go out on the network.
    pub fn send_enabled(&self) -> bool {
        self.send_enabled
    }

    /// Build the full request URL for an encoded overlay parameter.
    pub fn overlay_url(&self, encoded: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}{encoded}", self.base_url))?)
    }

    /// Push an encoded overlay parameter to the camera.
    pub async fn set_overlay_text(&self, encoded: &str) -> Result<Delivery, Error> {
        let url = self.overlay_url(encoded)?;
        if !self.send_enabled {
            debug!(%url, "sending disabled, skipping request");
            return Ok(Delivery::Skipped { url: url.into() });
        }

        let resp = self.get_with_digest(url).await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("camera rejected credentials for user '{}'", self.digest.username()),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;

        if !status.is_success() {
            return Err(Error::Camera {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        Ok(Delivery::Sent {
            status: status.as_u16(),
            body: body.trim_end().to_owned(),
        })
    }

    /// GET `url`, answering one digest challenge if the camera issues it.
    async fn get_with_digest(&self, url: Url) -> Result<reqwest::Response, Error> {
        let uri = request_uri(&url);
        debug!("GET {}", url);

        let mut request = self.http.get(url.clone());
        if let Some(auth) = self.digest.authorization(&uri)? {
            request = request.header(AUTHORIZATION, auth);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }
        let Some(challenge) = resp.headers().get(WWW_AUTHENTICATE) else {
            return Ok(resp);
        };

        let auth = self.digest.accept_challenge(challenge, &uri)?;
        self.http
            .get(url)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))
    }
}

/// `http://<host>` + [`OVERLAY_TEXT_PATH`].
fn base_url_for(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}{OVERLAY_TEXT_PATH}")
    } else {
        format!("http://{host}{OVERLAY_TEXT_PATH}")
    }
}

/// The request-target (path + query) a digest response is computed over.
fn request_uri(url: &Url) -> String {
    url[Position::BeforePath..Position::AfterQuery].to_owned()
}

fn preview(body: &str) -> String {
    body.trim().chars().take(200).collect()
}
