// ── Progress tracking ──
//
// Two signals can describe how far along a print is: the firmware's own
// `M73 P<percent> R<minutes>` commands as they stream past on the serial
// line, or the host's percentage callback combined with the slicer's time
// estimate. Exactly one of them is authoritative, fixed at construction.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which progress signal the tracker listens to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum ProgressSource {
    /// `M73` commands sent to the firmware (slicer-embedded progress).
    #[default]
    #[serde(rename = "firmware", alias = "m73")]
    #[strum(to_string = "firmware", serialize = "m73")]
    FirmwareReported,
    /// Host percentage callback plus the job's estimated print time.
    #[serde(rename = "host")]
    #[strum(to_string = "host")]
    HostComputed,
}

/// A progress observation from either source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressSignal<'a> {
    /// A raw communication-protocol line sent to the printer.
    ProtocolLine(&'a str),
    /// The host's whole-number completion percentage.
    HostPercent {
        percent: u8,
        estimated_total_secs: f64,
    },
}

/// Percent and remaining time as last written by the active source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub percent: u8,
    pub remaining_minutes: u32,
}

/// Fields carried by one `M73` line. Absent tokens are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirmwareProgress {
    pub percent: Option<u8>,
    pub remaining_minutes: Option<u32>,
}

/// Lock-free holder of the current progress values.
#[derive(Debug)]
pub struct ProgressTracker {
    source: ProgressSource,
    percent: AtomicU8,
    remaining_minutes: AtomicU32,
}

impl ProgressTracker {
    pub fn new(source: ProgressSource) -> Self {
        Self {
            source,
            percent: AtomicU8::new(0),
            remaining_minutes: AtomicU32::new(0),
        }
    }

    pub fn source(&self) -> ProgressSource {
        self.source
    }

    /// Feed a signal. Signals from the inactive source are ignored.
    ///
    /// Returns `true` if any field was written.
    pub fn ingest(&self, signal: ProgressSignal<'_>) -> bool {
        match (self.source, signal) {
            (ProgressSource::FirmwareReported, ProgressSignal::ProtocolLine(line)) => {
                let Some(update) = parse_m73(line) else {
                    return false;
                };
                if let Some(percent) = update.percent {
                    self.percent.store(percent, Ordering::Relaxed);
                }
                if let Some(minutes) = update.remaining_minutes {
                    self.remaining_minutes.store(minutes, Ordering::Relaxed);
                }
                true
            }
            (
                ProgressSource::HostComputed,
                ProgressSignal::HostPercent {
                    percent,
                    estimated_total_secs,
                },
            ) => {
                let percent = percent.min(100);
                self.percent.store(percent, Ordering::Relaxed);
                self.remaining_minutes.store(
                    host_remaining_minutes(percent, estimated_total_secs),
                    Ordering::Relaxed,
                );
                true
            }
            _ => false,
        }
    }

    /// Zero both fields (a new print started).
    pub fn reset(&self) {
        self.percent.store(0, Ordering::Relaxed);
        self.remaining_minutes.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            percent: self.percent.load(Ordering::Relaxed),
            remaining_minutes: self.remaining_minutes.load(Ordering::Relaxed),
        }
    }
}

// ── M73 parsing ──────────────────────────────────────────────────────

static M73_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bM73\b").expect("valid M73 regex"));
static PERCENT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bP(\d+)").expect("valid percent regex"));
static REMAINING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bR(\d+)").expect("valid remaining regex"));

/// Extract `P` (percent) and `R` (remaining minutes) from an `M73` line.
///
/// Returns `None` when the line is not an `M73` command or carries neither
/// token. Token order does not matter; percent is clamped to 100.
pub fn parse_m73(line: &str) -> Option<FirmwareProgress> {
    // Anything after ';' is a G-code comment.
    let command = line.split(';').next().unwrap_or_default();
    if !M73_COMMAND.is_match(command) {
        return None;
    }

    let capture = |re: &Regex| -> Option<u32> {
        re.captures(command)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    };

    let percent = capture(&PERCENT_TOKEN).map(|p| u8::try_from(p.min(100)).unwrap_or(100));
    let remaining_minutes = capture(&REMAINING_TOKEN);

    if percent.is_none() && remaining_minutes.is_none() {
        return None;
    }
    Some(FirmwareProgress {
        percent,
        remaining_minutes,
    })
}

/// `floor((100 - percent) * estimated_total_secs / 6000)`.
///
/// A missing or negative estimate yields zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
pub fn host_remaining_minutes(percent: u8, estimated_total_secs: f64) -> u32 {
    let left = f64::from(100_u8.saturating_sub(percent));
    let minutes = (left * estimated_total_secs / 6000.0).floor();
    if minutes.is_finite() && minutes > 0.0 {
        minutes as u32
    } else {
        0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_percent_and_remaining() {
        assert_eq!(
            parse_m73("M73 P45 R12"),
            Some(FirmwareProgress {
                percent: Some(45),
                remaining_minutes: Some(12),
            })
        );
    }

    #[test]
    fn token_order_is_irrelevant() {
        let update = parse_m73("N102 M73 R7 P88*51").unwrap();
        assert_eq!(update.percent, Some(88));
        assert_eq!(update.remaining_minutes, Some(7));
    }

    #[test]
    fn non_m73_lines_are_ignored() {
        assert_eq!(parse_m73("G1 X10 Y20 E0.4"), None);
        assert_eq!(parse_m73("M730 P10"), None);
        assert_eq!(parse_m73("M73 Q45 S12"), None);
        assert_eq!(parse_m73("G1 X1 ; M73 P50"), None);
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(parse_m73("M73 P250").unwrap().percent, Some(100));
    }

    #[test]
    fn missing_token_leaves_field_unchanged() {
        let tracker = ProgressTracker::new(ProgressSource::FirmwareReported);
        assert!(tracker.ingest(ProgressSignal::ProtocolLine("M73 P45 R12")));
        assert!(tracker.ingest(ProgressSignal::ProtocolLine("M73 R9")));

        assert_eq!(
            tracker.snapshot(),
            ProgressSnapshot {
                percent: 45,
                remaining_minutes: 9,
            }
        );
    }

    #[test]
    fn host_formula_floors() {
        assert_eq!(host_remaining_minutes(50, 7200.0), 60);
        assert_eq!(host_remaining_minutes(0, 5999.0), 99);
        assert_eq!(host_remaining_minutes(99, 5999.0), 0);
        assert_eq!(host_remaining_minutes(100, 7200.0), 0);
        assert_eq!(host_remaining_minutes(10, -1.0), 0);
    }

    #[test]
    fn inactive_source_is_a_no_op() {
        let firmware = ProgressTracker::new(ProgressSource::FirmwareReported);
        assert!(!firmware.ingest(ProgressSignal::HostPercent {
            percent: 50,
            estimated_total_secs: 7200.0,
        }));
        assert_eq!(firmware.snapshot(), ProgressSnapshot::default());

        let host = ProgressTracker::new(ProgressSource::HostComputed);
        assert!(!host.ingest(ProgressSignal::ProtocolLine("M73 P45 R12")));
        assert!(host.ingest(ProgressSignal::HostPercent {
            percent: 50,
            estimated_total_secs: 7200.0,
        }));
        assert_eq!(
            host.snapshot(),
            ProgressSnapshot {
                percent: 50,
                remaining_minutes: 60,
            }
        );
    }

    #[test]
    fn reset_zeroes_both_fields() {
        let tracker = ProgressTracker::new(ProgressSource::FirmwareReported);
        tracker.ingest(ProgressSignal::ProtocolLine("M73 P45 R12"));
        tracker.reset();
        assert_eq!(tracker.snapshot(), ProgressSnapshot::default());
    }

    #[test]
    fn source_names_round_trip() {
        assert_eq!(ProgressSource::FirmwareReported.to_string(), "firmware");
        assert_eq!(
            "m73".parse::<ProgressSource>().unwrap(),
            ProgressSource::FirmwareReported
        );
        assert_eq!(
            "host".parse::<ProgressSource>().unwrap(),
            ProgressSource::HostComputed
        );
    }
}
