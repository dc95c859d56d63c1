//! `camlay preview`: one sample, rendered locally, optionally sent.

use std::fmt::Write as _;

use serde::Serialize;
use tabled::Tabled;

use camlay_core::{CoreError, Delivery, OverlayLines, TickOutcome};

use crate::cli::{GlobalOpts, PreviewArgs};
use crate::commands::build_bridge;
use crate::config;
use crate::error::CliError;
use crate::output;

const FIELD_NAMES: [&str; 5] = ["status", "temperatures", "progress", "timing", "job"];

#[derive(Debug, Serialize)]
struct PreviewReport {
    lines: OverlayLines,
    encoded: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivery: Option<Delivery>,
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "#")]
    row: usize,
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Text")]
    text: String,
}

pub async fn handle(args: PreviewArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let runtime = config::resolve_runtime(global)?;
    let bridge = build_bridge(&runtime)?;

    bridge.sample().await?;
    let lines = bridge.render();
    let encoded = lines.encode();
    let url = bridge
        .camera()
        .overlay_url(&encoded)
        .map_err(CoreError::from)?
        .to_string();

    let delivery = if args.send {
        match bridge.deliver(&lines).await {
            TickOutcome::Delivered(delivery) => Some(delivery),
            TickOutcome::Failed(e) => return Err(e.into()),
            TickOutcome::Waiting => None,
        }
    } else {
        None
    };

    let report = PreviewReport {
        lines,
        encoded,
        url,
        delivery,
    };
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| format_detail(r, color),
        |r| r.encoded.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn format_detail(report: &PreviewReport, color: bool) -> String {
    let rows: Vec<LineRow> = report
        .lines
        .as_array()
        .into_iter()
        .zip(FIELD_NAMES)
        .enumerate()
        .map(|(i, (text, field))| LineRow {
            row: i + 1,
            field,
            text: text.to_owned(),
        })
        .collect();

    let mut out = output::render_table(&rows);
    let _ = write!(
        out,
        "\n{} {}",
        output::label("Encoded:", color),
        report.encoded
    );
    match &report.delivery {
        Some(Delivery::Sent { status, body }) => {
            let _ = write!(
                out,
                "\n{} sent (HTTP {status}): {body}",
                output::ok_mark(color)
            );
        }
        Some(Delivery::Skipped { url }) => {
            let _ = write!(out, "\n{} {url}", output::label("Not sent (dry run):", color));
        }
        None => {}
    }
    out
}
