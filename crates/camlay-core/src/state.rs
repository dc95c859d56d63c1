// ── PrintState ──
//
// The single owner of everything the overlay shows. Shared by `Arc`
// between the tick task and whatever delivers host events.

use chrono::{DateTime, Local};

use crate::event::HostEvent;
use crate::overlay::{self, OverlayLines};
use crate::progress::{ProgressSignal, ProgressSnapshot, ProgressSource, ProgressTracker};
use crate::session::{SessionSnapshot, SessionState};

#[derive(Debug)]
pub struct PrintState {
    progress: ProgressTracker,
    session: SessionState,
}

impl PrintState {
    pub fn new(source: ProgressSource, boot_time: DateTime<Local>) -> Self {
        Self {
            progress: ProgressTracker::new(source),
            session: SessionState::new(boot_time),
        }
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Apply a host event. Returns `true` if any state changed.
    pub fn apply(&self, event: &HostEvent, now: DateTime<Local>) -> bool {
        match event {
            HostEvent::PrintStarted => {
                self.progress.reset();
                self.session.on_print_started(now);
                true
            }
            HostEvent::PrintDone { elapsed_secs } => {
                self.session.on_print_done(now, *elapsed_secs);
                true
            }
            HostEvent::Progress { percent } => self.progress.ingest(ProgressSignal::HostPercent {
                percent: *percent,
                estimated_total_secs: self.session.estimated_total_secs(),
            }),
            HostEvent::LineSent(line) => self.progress.ingest(ProgressSignal::ProtocolLine(line)),
        }
    }

    pub fn snapshot(&self) -> (ProgressSnapshot, SessionSnapshot) {
        (self.progress.snapshot(), self.session.snapshot())
    }

    /// Render the overlay from the current state.
    pub fn render(&self, now: DateTime<Local>) -> OverlayLines {
        let (progress, session) = self.snapshot();
        overlay::render(&progress, &session, now)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::session::{JobInfo, PrinterSample};

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 15, h, m, 0).unwrap()
    }

    #[test]
    fn host_progress_uses_sampled_estimate() {
        let state = PrintState::new(ProgressSource::HostComputed, at(8, 0));
        state.session().sample(&PrinterSample {
            status: "Printing".into(),
            job: Some(JobInfo {
                name: Some("benchy.gcode".into()),
                estimated_print_time: Some(7200.0),
            }),
            temperatures: None,
        });

        assert!(state.apply(&HostEvent::Progress { percent: 50 }, at(9, 0)));
        assert!(!state.apply(&HostEvent::LineSent("M73 P10 R5".into()), at(9, 0)));

        assert_eq!(state.progress().snapshot().percent, 50);
        assert_eq!(state.progress().snapshot().remaining_minutes, 60);
    }

    #[test]
    fn print_started_resets_progress() {
        let state = PrintState::new(ProgressSource::FirmwareReported, at(8, 0));
        state.apply(&HostEvent::LineSent("M73 P80 R3".into()), at(8, 30));

        state.apply(&HostEvent::PrintStarted, at(9, 0));

        let (progress, session) = state.snapshot();
        assert_eq!(progress, ProgressSnapshot::default());
        assert_eq!(session.started_at, Some(at(9, 0)));
    }
}
