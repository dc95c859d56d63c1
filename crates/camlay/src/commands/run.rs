//! `camlay run`: the long-running bridge.

use tracing::{info, warn};

use crate::cli::{GlobalOpts, RunArgs};
use crate::commands::build_bridge;
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut runtime = config::resolve_runtime(global)?;
    if let Some(source) = args.progress_source {
        runtime.bridge.progress_source = source;
    }
    if args.no_push {
        runtime.printer.push_enabled = false;
    }

    let bridge = build_bridge(&runtime)?;

    if runtime.printer.push_enabled {
        match bridge
            .host()
            .connect_push(bridge.cancel_token().child_token())
        {
            Ok(handle) => bridge.follow_push(handle).await,
            Err(e) => warn!(error = %e, "push feed unavailable, lifecycle events disabled"),
        }
    }

    bridge.start().await;

    if !global.quiet {
        let color = output::should_color(&global.color);
        eprintln!(
            "{} camlay running: {} → {}{}",
            output::ok_mark(color),
            runtime.printer.url,
            bridge.camera().base_url(),
            if runtime.camera.send_enabled {
                ""
            } else {
                " (dry run)"
            }
        );
        eprintln!(
            "  {}",
            output::label(
                &format!(
                    "updates every {}s after a {}s grace period; Ctrl-C to stop",
                    runtime.bridge.update_interval.as_secs(),
                    runtime.bridge.startup_grace.as_secs()
                ),
                color
            )
        );
    }

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, shutting down");
    bridge.shutdown().await;
    Ok(())
}
