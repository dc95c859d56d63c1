mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `run` exists to stream overlay updates, so its URL and camera
    // responses are visible without -v.
    let base = u8::from(matches!(cli.command, Command::Run(_)));
    init_tracing(base.saturating_add(cli.global.verbose), cli.global.quiet);

    if let Err(err) = dispatch(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over the flags.
fn init_tracing(level: u8, quiet: bool) {
    let directive = match (quiet, level) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let global = &cli.global;
    match cli.command {
        Command::Run(args) => commands::run::handle(args, global).await,
        Command::Preview(args) => commands::preview::handle(args, global).await,
        Command::Config(args) => commands::config_cmd::handle(args, global),
        Command::Completions(args) => {
            use clap::CommandFactory;

            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "camlay", &mut std::io::stdout());
            Ok(())
        }
    }
}
