//! Storybook runner entry point.

use std::error::Error;

use storybook_runner::config::{LogFormat, RunnerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Read configuration from environment.
    let config = RunnerConfig::from_env()?;

    // Initialize tracing subscriber. Reports may go to stdout, so logs use
    // stderr.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }

    tracing::info!(game = %config.game_path.display(), "Starting Storybook runner");

    let summary =
        storybook_runner::run_game_file(&config.game_path, config.report_target).await?;

    tracing::info!(
        game = %summary.game_id,
        completed = summary.completed,
        answers = summary.answers_given,
        "Storybook runner finished"
    );
    Ok(())
}
