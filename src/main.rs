//! mm-channel-stats CLI - main entry point
//!
//! Collects channel statistics from a Mattermost instance and writes them
//! to a CSV or JSON file.

use std::process::ExitCode;

use clap::CommandFactory;
use tracing::error;

use mm_channel_stats::app::{self, RunError};
use mm_channel_stats::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    let args = Args::parse_normalized();

    match app::execute(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            if let RunError::Config(_) = err {
                eprintln!("Error: {}\n", err);
                eprintln!("{}", Args::command().render_help());
            } else {
                error!(error = %err, "Run failed");
            }
            ExitCode::from(err.exit_code())
        }
    }
}
