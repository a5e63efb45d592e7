//! Camera Feed Query chat client
//!
//! Sends free-text questions to the remote assistant service and keeps an
//! ordered transcript of the exchange.

mod chat;
mod cli;
mod config;
mod conversation;
mod runtime;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Logs go to stderr so the transcript on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camfeed_chat=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = cli::Cli::parse();
    if let Err(e) = cli::run(cli).await {
        tracing::error!(error = %e, "Fatal error");
        eprintln!("camfeed-chat: {e}");
        std::process::exit(1);
    }
}
