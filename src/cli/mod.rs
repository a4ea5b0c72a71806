use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::backend::PowerShellBackend;
use crate::cli::args::{Cli, Command};
use crate::cli::commands::{exit_for_error, list, run, state, EXIT_ERROR};
use crate::config::load::load_config;
use crate::types::RunMode;

pub mod args;
pub mod commands;

pub fn run() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    let cfg = match load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => exit_for_error(&err),
    };
    let run_mode = RunMode {
        dry_run: cli.dry_run,
        assume_yes: cli.yes,
    };
    let backend = PowerShellBackend::new(cfg.backend.clone());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    let outcome = match cli.command {
        Command::List(args) => list::run_list(&backend, &cfg, args, &mut out).map(|_| 0),
        Command::State(args) => {
            state::run_state(&backend, args, run_mode, &mut input, &mut out).map(|_| 0)
        }
        Command::Run(args) => run::run_jobs(
            &backend,
            args,
            cfg.log_file.as_ref().map(PathBuf::from),
            run_mode,
            &mut input,
            &mut out,
        ),
    };

    match outcome {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(err) => exit_for_error(&err),
    }
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = err.print();
                std::process::exit(0);
            }
            let _ = err.print();
            std::process::exit(EXIT_ERROR);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
