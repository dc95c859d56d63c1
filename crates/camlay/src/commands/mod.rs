//! Command handlers, one module per top-level subcommand.

pub mod config_cmd;
pub mod preview;
pub mod run;

use camlay_core::{Bridge, OctoPrintHost, RuntimeConfig};

use crate::error::CliError;

/// Wire the OctoPrint host and camera client into a bridge.
pub(crate) fn build_bridge(runtime: &RuntimeConfig) -> Result<Bridge<OctoPrintHost>, CliError> {
    let host = OctoPrintHost::new(&runtime.printer)?;
    let camera = runtime.camera.build_client()?;
    Ok(Bridge::new(runtime.bridge.clone(), host, camera))
}
