// ── Overlay formatting ──
//
// Five fixed lines, percent-encoded one by one and joined with a literal
// `|`. The camera splits on the pipe and places each field on its own
// on-screen row, so the layout below is a wire format.

use std::fmt;

use chrono::{DateTime, Local, TimeDelta};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use crate::progress::ProgressSnapshot;
use crate::session::SessionSnapshot;

/// Characters of the job name that fit on the camera's last row.
pub const JOB_NAME_WIDTH: usize = 22;

/// Separator between encoded fields.
pub const FIELD_SEPARATOR: char = '|';

/// Status strings contained in this one show elapsed duration.
const IDLE_STATUS: &str = "Operational";

const MINUTES_PER_DAY: u32 = 24 * 60;

const STARTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FINISH_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Everything but ASCII alphanumerics and `-_.~/` is escaped.
const OVERLAY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// The five rendered overlay rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayLines {
    pub status: String,
    pub temperatures: String,
    pub progress: String,
    pub timing: String,
    pub job: String,
}

impl OverlayLines {
    pub fn as_array(&self) -> [&str; 5] {
        [
            &self.status,
            &self.temperatures,
            &self.progress,
            &self.timing,
            &self.job,
        ]
    }

    /// The camera parameter value: each line escaped, pipe-joined.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.as_array().into_iter().enumerate() {
            if i > 0 {
                out.push(FIELD_SEPARATOR);
            }
            out.extend(utf8_percent_encode(line, OVERLAY_ENCODE_SET));
        }
        out
    }
}

impl fmt::Display for OverlayLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.as_array().into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Render the overlay from state snapshots. Pure: same inputs, same lines.
pub fn render(
    progress: &ProgressSnapshot,
    session: &SessionSnapshot,
    now: DateTime<Local>,
) -> OverlayLines {
    let t = &session.temperatures;
    OverlayLines {
        status: session.status_text.clone(),
        temperatures: format!(
            "{}/{} - {}/{}",
            whole(t.hotend_actual),
            whole(t.hotend_target),
            whole(t.bed_actual),
            whole(t.bed_target)
        ),
        progress: format!(
            "{}% - {}",
            progress.percent,
            format_hours_minutes(progress.remaining_minutes)
        ),
        timing: timing_line(progress, session, now),
        job: session.job_name.chars().take(JOB_NAME_WIDTH).collect(),
    }
}

// Duration when idle, else start time, else projected finish.
fn timing_line(
    progress: &ProgressSnapshot,
    session: &SessionSnapshot,
    now: DateTime<Local>,
) -> String {
    if IDLE_STATUS.contains(session.status_text.as_str()) {
        return format_clock(session.duration_secs);
    }
    if let Some(started) = session.started_at {
        return started.format(STARTED_AT_FORMAT).to_string();
    }
    let finish = now
        .checked_add_signed(TimeDelta::minutes(i64::from(progress.remaining_minutes)))
        .unwrap_or(now);
    finish.format(FINISH_AT_FORMAT).to_string()
}

/// `H:MM:SS`, hours unpadded and unbounded.
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// `H:MM` for a minute count. A day or more is prefixed with
/// `N day, ` / `N days, ` and the hours restart at zero.
pub fn format_hours_minutes(total_minutes: u32) -> String {
    let days = total_minutes / MINUTES_PER_DAY;
    let rest = total_minutes % MINUTES_PER_DAY;
    let clock = format!("{}:{:02}", rest / 60, rest % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

// Truncate toward zero, as an integer display.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn whole(value: f64) -> i64 {
    if value.is_finite() { value.trunc() as i64 } else { 0 }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::session::Temperatures;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn printing_session() -> SessionSnapshot {
        SessionSnapshot {
            job_name: "benchy.gcode".into(),
            started_at: Some(local(2024, 6, 15, 10, 30, 0)),
            status_text: "Printing".into(),
            temperatures: Temperatures {
                hotend_actual: 210.4,
                hotend_target: 215.0,
                bed_actual: 60.9,
                bed_target: 60.0,
            },
            ..SessionSnapshot::default()
        }
    }

    fn progress(percent: u8, remaining_minutes: u32) -> ProgressSnapshot {
        ProgressSnapshot {
            percent,
            remaining_minutes,
        }
    }

    #[test]
    fn renders_printing_overlay() {
        let now = local(2024, 6, 15, 11, 0, 0);
        let lines = render(&progress(45, 72), &printing_session(), now);

        assert_eq!(
            lines.as_array(),
            [
                "Printing",
                "210/215 - 60/60",
                "45% - 1:12",
                "2024-06-15 10:30:00",
                "benchy.gcode",
            ]
        );
        insta::assert_snapshot!(
            lines.encode(),
            @"Printing|210/215%20-%2060/60|45%25%20-%201%3A12|2024-06-15%2010%3A30%3A00|benchy.gcode"
        );
    }

    #[test]
    fn operational_shows_duration_even_with_start_time() {
        let session = SessionSnapshot {
            status_text: "Operational".into(),
            duration_secs: 3661,
            ..printing_session()
        };
        let lines = render(&progress(100, 0), &session, local(2024, 6, 15, 12, 0, 0));
        assert_eq!(lines.timing, "1:01:01");
    }

    #[test]
    fn status_substring_of_operational_counts_as_idle() {
        let session = SessionSnapshot {
            status_text: "Operation".into(),
            duration_secs: 59,
            ..printing_session()
        };
        let lines = render(&progress(0, 0), &session, local(2024, 6, 15, 12, 0, 0));
        assert_eq!(lines.timing, "0:00:59");
    }

    #[test]
    fn without_start_time_projects_finish() {
        let session = SessionSnapshot {
            started_at: None,
            ..printing_session()
        };
        let lines = render(&progress(10, 90), &session, local(2024, 6, 15, 10, 0, 0));
        assert_eq!(lines.timing, "2024-06-15 11:30");
    }

    #[test]
    fn long_job_name_is_truncated() {
        let session = SessionSnapshot {
            job_name: "abcdefghijklmnopqrstuvwxyz0123".into(),
            ..printing_session()
        };
        let lines = render(&progress(0, 0), &session, local(2024, 6, 15, 10, 0, 0));
        assert_eq!(lines.job, "abcdefghijklmnopqrstuv");
        assert_eq!(lines.job.chars().count(), JOB_NAME_WIDTH);
    }

    #[test]
    fn remaining_time_rolls_over_into_days() {
        assert_eq!(format_hours_minutes(0), "0:00");
        assert_eq!(format_hours_minutes(1439), "23:59");
        assert_eq!(format_hours_minutes(1501), "1 day, 1:01");
        assert_eq!(format_hours_minutes(2880), "2 days, 0:00");
    }

    #[test]
    fn long_remaining_time_renders_with_days() {
        let lines = render(
            &progress(5, 1501),
            &SessionSnapshot::default(),
            local(2024, 6, 15, 10, 0, 0),
        );
        assert_eq!(lines.progress, "5% - 1 day, 1:01");
    }

    #[test]
    fn elapsed_duration_hours_do_not_wrap() {
        assert_eq!(format_clock(90_061), "25:01:01");
    }

    #[test]
    fn negative_temperatures_truncate_toward_zero() {
        let session = SessionSnapshot {
            temperatures: Temperatures {
                hotend_actual: -0.7,
                hotend_target: 0.0,
                bed_actual: 21.99,
                bed_target: 0.0,
            },
            ..printing_session()
        };
        let lines = render(&progress(0, 0), &session, local(2024, 6, 15, 10, 0, 0));
        assert_eq!(lines.temperatures, "0/0 - 21/0");
    }

    #[test]
    fn rendering_is_pure() {
        let now = local(2024, 6, 15, 11, 0, 0);
        let first = render(&progress(45, 72), &printing_session(), now);
        let second = render(&progress(45, 72), &printing_session(), now);
        assert_eq!(first, second);
        assert_eq!(first.encode(), second.encode());
    }

    #[test]
    fn separator_inside_a_field_is_escaped() {
        let session = SessionSnapshot {
            job_name: "a|b c".into(),
            status_text: "Printing".into(),
            ..SessionSnapshot::default()
        };
        let lines = render(&progress(0, 0), &session, local(2024, 6, 15, 10, 0, 0));
        assert!(lines.encode().ends_with("|a%7Cb%20c"));
    }
}
