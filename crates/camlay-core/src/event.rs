// ── Host events ──
//
// What the printer host tells the bridge between ticks. Events can come
// from the OctoPrint push feed, from an embedding host, or from tests.

use serde_json::Value;

use camlay_api::PushMessage;

const SENT_LINE_PREFIX: &str = "Send: ";

/// A lifecycle notification or protocol line from the printer host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    PrintStarted,
    /// Print finished; `elapsed_secs` is the host's own measurement.
    PrintDone { elapsed_secs: Option<f64> },
    /// Whole-number completion percentage.
    Progress { percent: u8 },
    /// A command line sent to the firmware.
    LineSent(String),
}

impl HostEvent {
    /// Map a named host event. Names are matched exactly; unknown names
    /// yield `None`.
    pub fn from_named(name: &str, payload: &Value) -> Option<Self> {
        match name {
            "PrintStarted" => Some(Self::PrintStarted),
            "PrintDone" => Some(Self::PrintDone {
                elapsed_secs: payload.get("time").and_then(Value::as_f64),
            }),
            _ => None,
        }
    }

    /// Events carried by one push-feed message, in feed order.
    pub fn from_push(message: &PushMessage) -> Vec<Self> {
        match message {
            PushMessage::Event { kind, payload } => {
                Self::from_named(kind, payload).into_iter().collect()
            }
            PushMessage::Current(frame) => {
                let mut events: Vec<Self> = frame
                    .logs
                    .iter()
                    .filter_map(|line| line.strip_prefix(SENT_LINE_PREFIX))
                    .map(|line| Self::LineSent(line.to_owned()))
                    .collect();
                if let Some(percent) = frame
                    .progress
                    .as_ref()
                    .and_then(|p| p.completion)
                    .and_then(whole_percent)
                {
                    events.push(Self::Progress { percent });
                }
                events
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn whole_percent(completion: f64) -> Option<u8> {
    completion
        .is_finite()
        .then(|| completion.floor().clamp(0.0, 100.0) as u8)
}
