//! vid2gif
//!
//! A client for the video-to-GIF conversion backend: select a video,
//! analyze it, tune trim/crop/overlay settings, convert, download.

mod backend;
mod cli;
mod constants;
mod editor;
mod error;
mod geometry;
mod pipeline;
mod presets;
mod probe;
mod state;
mod utils;

use clap::Parser;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vid2gif=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    if let Err(err) = cli::run(cli).await {
        eprintln!("error: {}", err.surface_message());
        std::process::exit(1);
    }
}
