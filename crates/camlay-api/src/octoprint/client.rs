// OctoPrint REST client
//
// Authenticates with the `X-Api-Key` header (injected as a default header
// at client construction) and exposes the handful of read endpoints the
// overlay samples every tick.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::octoprint::models::{JobResponse, LoginResponse, PrinterResponse};
use crate::transport::TransportConfig;

const API_KEY_HEADER: &str = "X-Api-Key";

/// Raw HTTP client for the OctoPrint REST API.
pub struct OctoPrintClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl OctoPrintClient {
    /// Create a client for the server at `base_url` (e.g. `http://octopi.local`).
    pub fn new(
        base_url: Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|_| Error::InvalidApiKey)?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current job, progress and state string.
    pub async fn job(&self) -> Result<JobResponse, Error> {
        let url = self.api_url("job")?;
        let resp = self.send(self.http.get(url)).await?;
        self.parse(resp).await
    }

    /// Printer temperatures and state.
    ///
    /// Returns `Ok(None)` when the printer is not connected (OctoPrint
    /// answers 409 in that case).
    pub async fn printer(&self) -> Result<Option<PrinterResponse>, Error> {
        let mut url = self.api_url("printer")?;
        url.set_query(Some("exclude=sd"));
        let resp = self.send(self.http.get(url)).await?;
        if resp.status() == StatusCode::CONFLICT {
            debug!("printer not operational, no temperature data");
            return Ok(None);
        }
        self.parse(resp).await.map(Some)
    }

    /// Passive login: exchanges the API key for a user name and session
    /// key without creating a browser session.
    pub async fn passive_login(&self) -> Result<LoginResponse, Error> {
        let url = self.api_url("login")?;
        let resp = self
            .send(self.http.post(url).json(&json!({ "passive": true })))
            .await?;
        self.parse(resp).await
    }

    /// WebSocket URL of the push feed (`/sockjs/websocket`).
    pub fn push_url(&self) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/sockjs/websocket"))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|()| Error::WebSocketConnect(format!(
            "cannot derive a websocket URL from {}",
            self.base_url
        )))?;
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// `{base}/api/{path}`, tolerating base URLs mounted under a prefix.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        builder
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))
    }

    async fn parse<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::InvalidApiKey);
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;

        if !status.is_success() {
            return Err(Error::OctoPrint {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}
