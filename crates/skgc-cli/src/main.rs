//! skgc - Minecraft server supervisor
//!
//! # Examples
//!
//! ```bash
//! # Prepare an installation and run it with the console attached
//! skgc --root ./survival init java
//! skgc --root ./survival start
//!
//! # From another terminal
//! skgc --root ./survival coordinate Steve
//! skgc --root ./survival stop
//! ```

use skgc_cli::{Cli, CliError, logger, run};
use skgc_config::Config;

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            if let Some(hint) = e.recovery_hint() {
                eprintln!("Hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<(), CliError> {
    let config = Config::load(cli.root())?;
    config.validate()?;

    logger::initialize(
        config.logging.level,
        config.log_file_path(cli.root()),
        config.logging.colored,
    )?;
    config.log_summary();

    run(cli, config).await
}
