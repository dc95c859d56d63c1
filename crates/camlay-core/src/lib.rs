//! Print-state sampling and overlay pipeline between `camlay-api` and the CLI.
//!
//! - **[`Bridge`]**: Worker facade. Waits out a start-up grace period, then
//!   on every tick samples the [`PrinterHost`], renders the overlay and
//!   pushes it to the camera. [`Bridge::follow_push()`] wires the OctoPrint
//!   push feed into the shared state.
//!
//! - **[`PrintState`]**: The single owner of overlay state, holding a
//!   [`ProgressTracker`] fed by exactly one [`ProgressSource`], and the
//!   lock-free [`SessionState`] (lifecycle timestamps, job name,
//!   temperatures).
//!
//! - **[`overlay`]**: Pure five-line renderer and the camera's
//!   pipe-joined, percent-encoded parameter format.
//!
//! - **[`RateLimitedLog`]**: Per-severity message budget for the worker's
//!   chatter.

pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod log;
pub mod overlay;
pub mod progress;
pub mod session;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{Bridge, TickOutcome, WorkerPhase};
pub use config::{BridgeConfig, CameraConfig, OctoPrintConfig, RuntimeConfig, TlsVerification};
pub use error::CoreError;
pub use event::HostEvent;
pub use host::{OctoPrintHost, PrinterHost};
pub use log::RateLimitedLog;
pub use overlay::OverlayLines;
pub use progress::{ProgressSignal, ProgressSnapshot, ProgressSource, ProgressTracker};
pub use session::{JobInfo, PrinterSample, SessionSnapshot, SessionState, Temperatures};
pub use state::PrintState;

// Transport types the CLI needs without depending on camlay-api directly.
pub use camlay_api::Delivery;
