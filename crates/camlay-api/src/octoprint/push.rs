//! OctoPrint push feed with auto-reconnect.
//!
//! Connects to the server's raw SockJS WebSocket endpoint, authenticates
//! with a passive-login session, and streams parsed frames through a
//! [`tokio::sync::broadcast`] channel. Handles reconnection with
//! exponential backoff + jitter automatically.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use camlay_api::octoprint::{OctoPrintClient, PushHandle, PushMessage, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = Arc::new(OctoPrintClient::new(url, &api_key, &transport)?);
//! let handle = PushHandle::connect(client, ReconnectConfig::default(), CancellationToken::new())?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(msg) = rx.recv().await {
//!     if let PushMessage::Event { kind, .. } = msg.as_ref() {
//!         println!("event: {kind}");
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::octoprint::client::OctoPrintClient;

// ── Broadcast channel capacity ───────────────────────────────────────

const PUSH_CHANNEL_CAPACITY: usize = 256;

// ── PushMessage ──────────────────────────────────────────────────────

/// A parsed frame from the push feed.
///
/// Only the frame types the overlay consumes are surfaced; `connected`,
/// `history`, `plugin` and friends are dropped during parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PushMessage {
    /// A named server event, e.g. `PrintStarted`, `PrintDone`.
    Event {
        kind: String,
        payload: serde_json::Value,
    },
    /// Periodic state update with new terminal lines and job progress.
    Current(CurrentFrame),
}

/// Body of a `current` frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentFrame {
    /// Terminal lines since the previous frame (`"Send: ..."`, `"Recv: ..."`).
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub progress: Option<JobProgressFrame>,
}

/// Progress block inside a `current` frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressFrame {
    #[serde(default)]
    pub completion: Option<f64>,
    #[serde(default)]
    pub print_time: Option<f64>,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for push-feed reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 60s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_retries: None,
        }
    }
}

// ── PushHandle ───────────────────────────────────────────────────────

/// Handle to a running push feed.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`connect`](Self::connect)) to tear down the background task.
pub struct PushHandle {
    rx: broadcast::Receiver<Arc<PushMessage>>,
    cancel: CancellationToken,
}

impl PushHandle {
    /// Spawn the connect/read/reconnect loop for `client`'s server.
    ///
    /// Returns immediately once the background task is spawned. Each
    /// connection attempt performs a fresh passive login so an expired
    /// session never wedges the feed.
    pub fn connect(
        client: Arc<OctoPrintClient>,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let url = client.push_url()?;
        let (tx, rx) = broadcast::channel(PUSH_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            push_loop(client, url, tx, reconnect, task_cancel).await;
        });

        Ok(Self { rx, cancel })
    }

    /// Get a new broadcast receiver for the feed.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PushMessage>> {
        self.rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: login → connect → read → on error, backoff → reconnect.
async fn push_loop(
    client: Arc<OctoPrintClient>,
    url: Url,
    tx: broadcast::Sender<Arc<PushMessage>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&client, &url, &tx, &cancel) => {
                match result {
                    Ok(()) => {
                        tracing::info!("push feed disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "push feed error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "push feed reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt = attempt.saturating_add(1);
                    }
                }
            }
        }
    }

    tracing::debug!("push feed loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

async fn connect_and_read(
    client: &OctoPrintClient,
    url: &Url,
    tx: &broadcast::Sender<Arc<PushMessage>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    let login = client.passive_login().await?;
    tracing::info!(url = %url, user = %login.name, "connecting to push feed");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let (mut write, mut read) = ws_stream.split();

    let auth = serde_json::json!({ "auth": format!("{}:{}", login.name, login.session) });
    write
        .send(tungstenite::Message::text(auth.to_string()))
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("push feed connected");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        tracing::trace!("push feed ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "push feed closed");
                        } else {
                            tracing::info!("push feed closed (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                    None => {
                        tracing::info!("push feed stream ended");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

/// Raw frame shape: a single-key object naming the frame type.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    event: Option<RawEvent>,
    #[serde(default)]
    current: Option<CurrentFrame>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Parse a text frame into the messages it carries.
pub fn parse_frame(text: &str) -> Vec<PushMessage> {
    let frame: RawFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse push frame");
            return Vec::new();
        }
    };

    let mut messages = Vec::new();
    if let Some(event) = frame.event {
        messages.push(PushMessage::Event {
            kind: event.kind,
            payload: event.payload,
        });
    }
    if let Some(current) = frame.current {
        messages.push(PushMessage::Current(current));
    }
    messages
}

fn parse_and_broadcast(text: &str, tx: &broadcast::Sender<Arc<PushMessage>>) {
    for message in parse_frame(text) {
        // No subscribers is fine.
        let _ = tx.send(Arc::new(message));
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap, clippy::as_conversions)]
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = attempt.min(30) as i32;
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(60));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d = calculate_backoff(1000, &config);
        assert!(d <= Duration::from_millis(12_500), "got {d:?}");
    }

    #[test]
    fn parses_event_frame() {
        let raw = serde_json::json!({
            "event": { "type": "PrintDone", "payload": { "name": "cube.gcode", "time": 3661.4 } }
        });

        let messages = parse_frame(&raw.to_string());
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            PushMessage::Event { kind, payload } => {
                assert_eq!(kind, "PrintDone");
                assert_eq!(payload["time"], 3661.4);
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn parses_current_frame() {
        let raw = serde_json::json!({
            "current": {
                "state": { "text": "Printing" },
                "logs": ["Send: N12 M73 P45 R12*88", "Recv: ok"],
                "progress": { "completion": 45.7, "printTime": 600 }
            }
        });

        let messages = parse_frame(&raw.to_string());
        let [PushMessage::Current(current)] = messages.as_slice() else {
            panic!("expected a single current frame, got {messages:?}");
        };
        assert_eq!(current.logs.len(), 2);
        assert_eq!(current.progress.as_ref().and_then(|p| p.completion), Some(45.7));
    }

    #[test]
    fn ignores_unrelated_and_malformed_frames() {
        assert!(parse_frame(r#"{"connected": {"version": "1.10.0"}}"#).is_empty());
        assert!(parse_frame("not json at all").is_empty());
    }

    #[test]
    fn broadcast_without_subscribers_does_not_panic() {
        let (tx, rx) = broadcast::channel::<Arc<PushMessage>>(4);
        drop(rx);
        parse_and_broadcast(r#"{"event": {"type": "PrintStarted"}}"#, &tx);
    }
}
