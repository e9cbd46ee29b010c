//! Tagkeep CLI entry point.

use clap::Parser;

use tagkeep_cli::commands::{dispatch, Cli};
use tagkeep_cli::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_config()) {
        eprintln!("Error: failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Err(e) = dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
