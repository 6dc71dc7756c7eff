//! PriceCrawl politeness engine - operator CLI.
//!
//! Thin wrapper for exercising the engine by hand: check a URL against
//! robots.txt, force a cache refresh, or inspect cache freshness.

mod cli;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let default_filter = if cli::is_verbose() {
        "pricecrawl=info"
    } else {
        "pricecrawl=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
