//! Clap derive structures for the `camlay` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// camlay -- printer status on your camera's overlay
#[derive(Debug, Parser)]
#[command(
    name = "camlay",
    version,
    about = "Push live 3D-printer status onto a network camera overlay",
    long_about = "Polls an OctoPrint server and writes a five-line status overlay\n\
        (state, temperatures, progress, timing, job name) to a Dahua-style\n\
        camera's custom title over HTTP Digest.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "CAMLAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Camera host (overrides config)
    #[arg(long, global = true)]
    pub camera_host: Option<String>,

    /// Build and log overlay URLs without sending them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CAMLAY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
    /// Plain text (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bridge until interrupted
    Run(RunArgs),

    /// Sample the printer once and show the overlay
    Preview(PreviewArgs),

    /// Manage camlay configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Run / Preview ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Progress source (overrides config)
    #[arg(long, value_parser = parse_progress_source)]
    pub progress_source: Option<camlay_core::ProgressSource>,

    /// Don't subscribe to the OctoPrint push feed
    #[arg(long)]
    pub no_push: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Deliver the rendered overlay to the camera once
    #[arg(long)]
    pub send: bool,
}

fn parse_progress_source(s: &str) -> Result<camlay_core::ProgressSource, String> {
    s.parse()
        .map_err(|_| format!("expected 'firmware' (or 'm73') or 'host', got '{s}'"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Store a secret in the system keyring
    SetPassword {
        /// Which secret to store
        #[arg(value_enum, default_value = "camera")]
        target: SecretTarget,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SecretTarget {
    /// Camera password
    Camera,
    /// OctoPrint API key
    Printer,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
