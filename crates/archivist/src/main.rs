//! archivist - replay archiving failures into per-reason issue reports.

use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use archivist::{Config, run_batches};
use archivist_core::{CliArgs, init_tracing};

fn main() -> ExitCode {
    init_tracing();

    let args = CliArgs::parse();
    let paths = args.config_paths();
    if paths.is_empty() {
        eprintln!("Error: no config files or directories specified");
        return ExitCode::FAILURE;
    }

    info!("Loading config from {} source(s)", paths.len());
    let config = match Config::from_paths(&paths) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Running {} batch(es)", config.batches.len());

    let stdout = std::io::stdout();
    match run_batches(&config, &mut stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("archivist failed: {e}");
            ExitCode::FAILURE
        }
    }
}
