use std::process::ExitCode;

use clap::Parser;
use phoneclaw_lib::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match phoneclaw_lib::run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "phoneclaw exited with an error");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
