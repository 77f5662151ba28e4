//! sitebox CLI - local site management

use std::process::ExitCode;

use clap::Parser;
use sitebox_cli::cli::Cli;
use sitebox_cli::commands::error_code;
use sitebox_cli::output::json::format_error;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "sitebox_cli=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if json && let Ok(obj) = format_error(&format!("{e:#}"), error_code(&e)) {
                println!("{obj}");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
