// ── Printer host abstraction ──
//
// The bridge reads printer state through `PrinterHost`. `OctoPrintHost`
// is the concrete implementation backed by the OctoPrint REST API; tests
// and embedders can supply their own.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use camlay_api::octoprint::{JobResponse, PrinterResponse, ReconnectConfig, TemperatureReading};
use camlay_api::{OctoPrintClient, PushHandle};

use crate::config::OctoPrintConfig;
use crate::error::CoreError;
use crate::session::{JobInfo, PrinterSample, Temperatures};

/// Source of the per-tick printer snapshot.
pub trait PrinterHost: Send + Sync + 'static {
    /// Read status string, job metadata and temperatures.
    fn sample(&self) -> impl Future<Output = Result<PrinterSample, CoreError>> + Send;
}

/// [`PrinterHost`] backed by an OctoPrint server.
pub struct OctoPrintHost {
    client: Arc<OctoPrintClient>,
}

impl OctoPrintHost {
    pub fn new(config: &OctoPrintConfig) -> Result<Self, CoreError> {
        let client = OctoPrintClient::new(config.url.clone(), &config.api_key, &config.transport())?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: OctoPrintClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &OctoPrintClient {
        &self.client
    }

    /// Open the push feed. The returned handle reconnects on its own until
    /// `cancel` fires.
    pub fn connect_push(&self, cancel: CancellationToken) -> Result<PushHandle, CoreError> {
        Ok(PushHandle::connect(
            Arc::clone(&self.client),
            ReconnectConfig::default(),
            cancel,
        )?)
    }
}

impl PrinterHost for OctoPrintHost {
    async fn sample(&self) -> Result<PrinterSample, CoreError> {
        let (job, printer) = tokio::join!(self.client.job(), self.client.printer());
        let job = job?;
        // Temperatures are optional; a failed printer read only drops them.
        let printer = printer.unwrap_or_else(|e| {
            debug!(error = %e, "printer state unavailable");
            None
        });
        Ok(sample_from(job, printer))
    }
}

// ── Response mapping ─────────────────────────────────────────────────

fn sample_from(job: JobResponse, printer: Option<PrinterResponse>) -> PrinterSample {
    let printer_state = printer
        .as_ref()
        .and_then(|p| p.state.as_ref())
        .and_then(|s| s.text.clone());

    PrinterSample {
        status: job.state.or(printer_state).unwrap_or_default(),
        job: job.job.map(|j| JobInfo {
            name: j.file.and_then(|f| f.name),
            estimated_print_time: j.estimated_print_time,
        }),
        temperatures: printer.and_then(temperatures_from),
    }
}

fn temperatures_from(printer: PrinterResponse) -> Option<Temperatures> {
    let report = printer.temperature?;
    let hotend = report.tool0?;
    let bed = report.bed.unwrap_or_default();
    let reading = |r: TemperatureReading| (r.actual.unwrap_or(0.0), r.target.unwrap_or(0.0));
    let (hotend_actual, hotend_target) = reading(hotend);
    let (bed_actual, bed_target) = reading(bed);
    Some(Temperatures {
        hotend_actual,
        hotend_target,
        bed_actual,
        bed_target,
    })
}
