// OctoPrint REST response types.
//
// Only the fields the overlay needs are modelled; everything else the
// server sends is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// `GET /api/job`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobResponse {
    #[serde(default)]
    pub job: Option<Job>,
    #[serde(default)]
    pub progress: Option<JobProgress>,
    /// Human-readable printer state, e.g. `"Printing"`, `"Operational"`.
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default)]
    pub file: Option<JobFile>,
    /// Slicer/analysis estimate for the whole print, in seconds.
    #[serde(default)]
    pub estimated_print_time: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobFile {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    /// Percentage of the file processed, 0..=100.
    #[serde(default)]
    pub completion: Option<f64>,
    #[serde(default)]
    pub print_time: Option<f64>,
    #[serde(default)]
    pub print_time_left: Option<f64>,
}

/// `GET /api/printer`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrinterResponse {
    #[serde(default)]
    pub temperature: Option<TemperatureReport>,
    #[serde(default)]
    pub state: Option<PrinterState>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TemperatureReport {
    #[serde(default)]
    pub tool0: Option<TemperatureReading>,
    #[serde(default)]
    pub bed: Option<TemperatureReading>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct TemperatureReading {
    #[serde(default)]
    pub actual: Option<f64>,
    #[serde(default)]
    pub target: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrinterState {
    #[serde(default)]
    pub text: Option<String>,
}

/// `POST /api/login` with `{"passive": true}`.
///
/// `name` and `session` together authenticate the push socket.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub name: String,
    pub session: String,
}
