// ── Bridge ──
//
// Full lifecycle of the printer-to-camera bridge: a grace period after
// start-up, then one sample → render → deliver cycle per tick. Failures
// are logged through the rate-limited log and never leave a tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use camlay_api::{CameraClient, Delivery, PushHandle, PushMessage};

use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::event::HostEvent;
use crate::host::PrinterHost;
use crate::log::RateLimitedLog;
use crate::overlay::OverlayLines;
use crate::state::PrintState;

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum WorkerPhase {
    /// Inside the start-up grace period; ticks only log.
    WaitingForGracePeriod,
    /// Every tick samples, renders and delivers.
    Active,
}

/// What a single tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Still inside the grace period.
    Waiting,
    /// The overlay was sent (or skipped because sending is disabled).
    Delivered(Delivery),
    /// Delivery failed; already logged.
    Failed(CoreError),
}

/// The printer-to-camera bridge.
///
/// Cheaply cloneable via `Arc<BridgeInner>`.
pub struct Bridge<H: PrinterHost> {
    inner: Arc<BridgeInner<H>>,
}

impl<H: PrinterHost> Clone for Bridge<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct BridgeInner<H> {
    config: BridgeConfig,
    host: H,
    camera: CameraClient,
    state: Arc<PrintState>,
    log: RateLimitedLog,
    started_at: Instant,
    grace_deadline: Instant,
    active: AtomicBool,
    cancel: CancellationToken,
    push_handle: Mutex<Option<PushHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<H: PrinterHost> Bridge<H> {
    /// Build a bridge. The grace period starts now; call
    /// [`start()`](Self::start) to spawn the tick task.
    pub fn new(config: BridgeConfig, host: H, camera: CameraClient) -> Self {
        let started_at = Instant::now();
        let state = Arc::new(PrintState::new(config.progress_source, Local::now()));
        Self {
            inner: Arc::new(BridgeInner {
                log: RateLimitedLog::new(config.log_threshold),
                grace_deadline: started_at + config.startup_grace,
                started_at,
                config,
                host,
                camera,
                state,
                active: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                push_handle: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── State accessors ──────────────────────────────────────────────

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn state(&self) -> &Arc<PrintState> {
        &self.inner.state
    }

    pub fn log(&self) -> &RateLimitedLog {
        &self.inner.log
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn camera(&self) -> &CameraClient {
        &self.inner.camera
    }

    /// When the bridge was constructed.
    pub fn started_at(&self) -> Instant {
        self.inner.started_at
    }

    pub fn phase(&self) -> WorkerPhase {
        if self.inner.active.load(Ordering::Acquire) {
            WorkerPhase::Active
        } else {
            WorkerPhase::WaitingForGracePeriod
        }
    }

    // ── Event ingestion ──────────────────────────────────────────────

    /// Apply a host event to the shared state.
    pub fn handle_event(&self, event: &HostEvent) {
        let now = Local::now();
        if self.inner.state.apply(event, now) {
            match event {
                HostEvent::PrintStarted => info!("print started"),
                HostEvent::PrintDone { elapsed_secs } => {
                    info!(elapsed_secs = ?elapsed_secs, "print done");
                }
                HostEvent::Progress { .. } | HostEvent::LineSent(_) => {
                    let snap = self.inner.state.progress().snapshot();
                    debug!(
                        percent = snap.percent,
                        remaining_minutes = snap.remaining_minutes,
                        "progress updated"
                    );
                }
            }
        }
    }

    /// Feed push-feed messages into the state until shutdown.
    ///
    /// The handle is kept so [`shutdown()`](Self::shutdown) can close it.
    pub async fn follow_push(&self, handle: PushHandle) {
        let rx = handle.subscribe();
        *self.inner.push_handle.lock().await = Some(handle);

        let bridge = self.clone();
        let cancel = self.inner.cancel.child_token();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(push_task(bridge, rx, cancel)));
        info!("push feed attached");
    }

    // ── Tick cycle ───────────────────────────────────────────────────

    /// Run one tick as of now.
    pub async fn tick(&self) -> TickOutcome {
        self.tick_at(Instant::now()).await
    }

    /// Run one tick as of `now`. Before the grace deadline this only logs;
    /// afterwards the bridge stays active for good.
    pub async fn tick_at(&self, now: Instant) -> TickOutcome {
        if !self.inner.active.load(Ordering::Acquire) {
            if now < self.inner.grace_deadline {
                self.inner.log.info("waiting ...");
                return TickOutcome::Waiting;
            }
            self.inner.active.store(true, Ordering::Release);
            info!("grace period over, overlay updates active");
        }
        self.refresh().await
    }

    /// Sample, render and deliver regardless of the grace period.
    pub async fn refresh(&self) -> TickOutcome {
        if let Err(e) = self.sample().await {
            self.inner
                .log
                .warn(format!("printer state unavailable, keeping previous values: {e}"));
        }
        let lines = self.render();
        self.deliver(&lines).await
    }

    /// Pull a snapshot from the host into the session state.
    pub async fn sample(&self) -> Result<(), CoreError> {
        let sample = self.inner.host.sample().await?;
        self.inner.state.session().sample(&sample);
        Ok(())
    }

    /// Render the overlay from the current state.
    pub fn render(&self) -> OverlayLines {
        self.inner.state.render(Local::now())
    }

    /// Send rendered lines to the camera. Errors are logged and returned
    /// as [`TickOutcome::Failed`].
    pub async fn deliver(&self, lines: &OverlayLines) -> TickOutcome {
        let log = &self.inner.log;
        let camera = &self.inner.camera;

        for (row, line) in lines.as_array().iter().enumerate() {
            debug!(row = row + 1, "{line}");
        }
        let encoded = lines.encode();
        log.info(format!("{}{encoded}", camera.base_url()));

        match camera.set_overlay_text(&encoded).await {
            Ok(delivery) => {
                if let Delivery::Sent { body, .. } = &delivery {
                    log.info(format!("Response: {body}"));
                }
                TickOutcome::Delivered(delivery)
            }
            Err(e) => {
                let err = CoreError::from(e);
                log.error(format!("overlay update failed: {err}"));
                TickOutcome::Failed(err)
            }
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the tick task.
    pub async fn start(&self) {
        let interval = self.inner.config.update_interval;
        if interval.is_zero() {
            warn!("update interval is zero, tick task not started");
            return;
        }

        let bridge = self.clone();
        let cancel = self.inner.cancel.child_token();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(tick_task(bridge, cancel)));
        info!(
            interval_secs = interval.as_secs(),
            grace_secs = self.inner.config.startup_grace.as_secs(),
            source = %self.inner.config.progress_source,
            "bridge started"
        );
    }

    /// Stop background tasks. An in-flight delivery finishes or times out
    /// before this returns.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(handle) = self.inner.push_handle.lock().await.take() {
            handle.shutdown();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        info!("bridge stopped");
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn tick_task<H: PrinterHost>(bridge: Bridge<H>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(bridge.inner.config.update_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let _ = bridge.tick().await;
            }
        }
    }
}

async fn push_task<H: PrinterHost>(
    bridge: Bridge<H>,
    mut rx: broadcast::Receiver<Arc<PushMessage>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = rx.recv() => match result {
                Ok(message) => {
                    for event in HostEvent::from_push(&message) {
                        bridge.handle_event(&event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "push feed: receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
