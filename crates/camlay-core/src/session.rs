// ── Print session state ──
//
// Lifecycle timestamps, job metadata and the latest host sample. Every
// field is swapped independently (atomics for scalars, `ArcSwap` for the
// rest), so event handlers and the tick task never wait on each other.
// There is no cross-field atomicity: a reader may see a new job name next
// to an old estimate for one tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Local};
use serde::Serialize;

const BOOT_LABEL_FORMAT: &str = "BOOT: %y-%m-%d %H:%M";

/// Hotend and bed readings in °C.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Temperatures {
    pub hotend_actual: f64,
    pub hotend_target: f64,
    pub bed_actual: f64,
    pub bed_target: f64,
}

/// Job metadata as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobInfo {
    pub name: Option<String>,
    /// Slicer estimate for the whole job, in seconds.
    pub estimated_print_time: Option<f64>,
}

/// One consolidated read of the printer host.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrinterSample {
    /// Host state string, e.g. `Printing` or `Operational`.
    pub status: String,
    pub job: Option<JobInfo>,
    pub temperatures: Option<Temperatures>,
}

/// Plain copy of [`SessionState`] at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub job_name: String,
    pub started_at: Option<DateTime<Local>>,
    pub completed_at: Option<DateTime<Local>>,
    pub duration_secs: u64,
    pub estimated_total_secs: f64,
    pub status_text: String,
    pub temperatures: Temperatures,
}

#[derive(Debug)]
pub struct SessionState {
    job_name: ArcSwap<String>,
    started_at: ArcSwapOption<DateTime<Local>>,
    completed_at: ArcSwapOption<DateTime<Local>>,
    duration_secs: AtomicU64,
    // f64 bit pattern
    estimated_total_secs: AtomicU64,
    status_text: ArcSwap<String>,
    temperatures: ArcSwap<Temperatures>,
}

impl SessionState {
    /// Fresh state; the job name shows when the bridge came up.
    pub fn new(boot_time: DateTime<Local>) -> Self {
        Self {
            job_name: ArcSwap::from_pointee(boot_label(boot_time)),
            started_at: ArcSwapOption::empty(),
            completed_at: ArcSwapOption::empty(),
            duration_secs: AtomicU64::new(0),
            estimated_total_secs: AtomicU64::new(0_f64.to_bits()),
            status_text: ArcSwap::from_pointee(String::new()),
            temperatures: ArcSwap::from_pointee(Temperatures::default()),
        }
    }

    /// A print began: zero duration and estimate, stamp the start time.
    pub fn on_print_started(&self, now: DateTime<Local>) {
        self.duration_secs.store(0, Ordering::Relaxed);
        self.estimated_total_secs
            .store(0_f64.to_bits(), Ordering::Relaxed);
        self.started_at.store(Some(Arc::new(now)));
    }

    /// A print finished. The host's elapsed time is taken as-is.
    pub fn on_print_done(&self, now: DateTime<Local>, elapsed_secs: Option<f64>) {
        self.completed_at.store(Some(Arc::new(now)));
        if let Some(elapsed) = elapsed_secs {
            self.duration_secs
                .store(whole_seconds(elapsed), Ordering::Relaxed);
        }
    }

    /// Merge a host sample. Empty names and zero estimates keep the
    /// previous values; the status string is always replaced.
    pub fn sample(&self, sample: &PrinterSample) {
        if let Some(job) = &sample.job {
            if let Some(name) = job.name.as_deref().filter(|n| !n.is_empty()) {
                self.job_name.store(Arc::new(name.to_owned()));
            }
            if let Some(estimate) = job
                .estimated_print_time
                .filter(|e| e.is_finite() && *e > 0.0)
            {
                self.estimated_total_secs
                    .store(estimate.to_bits(), Ordering::Relaxed);
            }
        }

        self.status_text.store(Arc::new(sample.status.clone()));

        if let Some(temps) = sample.temperatures {
            self.temperatures.store(Arc::new(temps));
        }
    }

    pub fn estimated_total_secs(&self) -> f64 {
        f64::from_bits(self.estimated_total_secs.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            job_name: self.job_name.load_full().as_ref().clone(),
            started_at: self.started_at.load_full().map(|t| *t),
            completed_at: self.completed_at.load_full().map(|t| *t),
            duration_secs: self.duration_secs.load(Ordering::Relaxed),
            estimated_total_secs: self.estimated_total_secs(),
            status_text: self.status_text.load_full().as_ref().clone(),
            temperatures: **self.temperatures.load(),
        }
    }
}

/// `BOOT: YY-MM-DD HH:MM` for the given instant.
pub fn boot_label(at: DateTime<Local>) -> String {
    at.format(BOOT_LABEL_FORMAT).to_string()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn whole_seconds(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    }
}
