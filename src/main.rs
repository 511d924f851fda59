mod api;
mod app;
mod application;
mod config;
mod domain;
mod ui;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::HttpMediaSource;
use app::Session;
use application::DownloadCoordinator;
use config::AppConfig;
use ui::{ConsoleView, InputSource, ScriptedInput, StdinInput};

async fn run_session<I: InputSource>(config: AppConfig, input: I) -> anyhow::Result<()> {
    let source = HttpMediaSource::new(config.api.clone()).context("Failed to build HTTP client")?;
    let coordinator = DownloadCoordinator::new(Arc::new(source), config.fetch.clone());

    let mut session = Session::new(
        coordinator,
        input,
        ConsoleView::new(std::io::stdout()),
        config.output_root.clone(),
        config.min_bytes,
    );

    let reports = session.run().await?;
    info!("Session finished after {} runs", reports.len());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they stay out of the prompts
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("numbered_media_fetcher=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "Output root {}, skipping items under {} bytes",
        config.output_root.display(),
        config.min_bytes
    );

    // Arguments, when given, replace the interactive prompts: a source
    // followed by a count, repeated.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        run_session(config, StdinInput::new()).await
    } else {
        run_session(config, ScriptedInput::new(args)).await
    }
}
