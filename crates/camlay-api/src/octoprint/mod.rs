// OctoPrint API surface: REST reads plus the push feed.

pub mod client;
pub mod models;
pub mod push;

pub use client::OctoPrintClient;
pub use models::{
    Job, JobFile, JobProgress, JobResponse, LoginResponse, PrinterResponse, PrinterState,
    TemperatureReading, TemperatureReport,
};
pub use push::{CurrentFrame, JobProgressFrame, PushHandle, PushMessage, ReconnectConfig};
