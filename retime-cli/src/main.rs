// retime-cli/src/main.rs
//
// Entry point for the `retime` binary.
//
// Parses arguments, installs logging, builds the engine configuration and
// dispatches to the selected command. Errors are printed once here and
// mapped to the process exit status: 130 after an interrupted run, 1 for
// any failure.

use clap::Parser;
use retime_cli::config::engine_config;
use retime_cli::{Cli, Commands, logging, run_probe, run_retime};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = engine_config(&cli);
    let result = match cli.command {
        Commands::Probe(args) => run_probe(args, &config).map(|()| ExitCode::SUCCESS),
        Commands::Run(args) => run_retime(args, config).map(|outcome| outcome.exit_code()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
