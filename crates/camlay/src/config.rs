//! CLI-specific configuration layer.
//!
//! Loading and credential resolution live in `camlay-config`; this module
//! adds the `GlobalOpts`-aware overrides on top.

use std::path::PathBuf;

use camlay_config::Config;
use camlay_core::RuntimeConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use camlay_config::{save_config_to, store_secret};

/// The config file in effect: `--config` / `CAMLAY_CONFIG`, else the
/// platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(camlay_config::config_path)
}

/// Load the config file and apply flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = camlay_config::load_config_from(&config_path(global))?;
    apply_overrides(&mut cfg, global);
    Ok(cfg)
}

/// Load, override and resolve everything the bridge needs.
pub fn resolve_runtime(global: &GlobalOpts) -> Result<RuntimeConfig, CliError> {
    let cfg = load(global)?;
    Ok(camlay_config::runtime_config(&cfg)?)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref host) = global.camera_host {
        cfg.camera.host.clone_from(host);
    }
    if global.dry_run {
        cfg.camera.send = false;
    }
}
