//! CLI commands for the politeness engine.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use url::Url;

use pricecrawl::{PolitenessConfig, RobotsChecker};

#[derive(Parser)]
#[command(name = "pricecrawl")]
#[command(about = "Crawl politeness engine: robots.txt compliance and per-domain throttling")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (defaults apply when omitted)
    #[arg(long, global = true, env = "PRICECRAWL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a URL may be crawled (exit code 0 = allowed, 2 = not)
    Check {
        /// URL to evaluate
        url: String,
    },
    /// Fetch and cache robots.txt for a URL's domain
    Refresh {
        /// Any URL on the target domain
        url: String,
    },
    /// Report whether a fresh robots.txt is cached for a domain
    Cached {
        /// Domain, e.g. example.com
        domain: String,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PolitenessConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PolitenessConfig::default(),
    };
    let checker = RobotsChecker::from_config(&config);

    let ok = match cli.command {
        Commands::Check { url } => {
            let allowed = checker.check(&url).await;
            println!("{}", if allowed { "allowed" } else { "disallowed" });
            allowed
        }
        Commands::Refresh { url } => {
            let parsed = Url::parse(&url).with_context(|| format!("parsing URL {url}"))?;
            let cached = checker.cache_robots_txt(&parsed).await;
            println!("{}", if cached { "cached" } else { "not cached" });
            cached
        }
        Commands::Cached { domain } => {
            let fresh = checker.is_cached(&domain).await;
            println!("{}", if fresh { "fresh" } else { "stale or absent" });
            fresh
        }
    };

    if !ok {
        // Negative answers exit 2 without an error trace.
        std::process::exit(2);
    }
    Ok(())
}
