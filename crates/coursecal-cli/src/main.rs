//! coursecal CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use coursecal_cli::cli::{Cli, Command, ConfigAction};
use coursecal_cli::commands;
use coursecal_cli::config::ClientConfig;
use coursecal_cli::error::{ClientError, ClientResult};
use coursecal_core::{TracingConfig, init_tracing};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli_quiet()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ClientResult<()> {
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().unwrap_or_default()
    };

    match cli.command {
        Command::Convert(args) => commands::convert::run(&args, &config),
        Command::Show {
            input,
            json,
            import,
        } => commands::show::run(&input, json, &import, &config),
        Command::Merge {
            first,
            second,
            output,
            import,
        } => commands::merge::run(&first, &second, output.as_deref(), &import, &config),
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
