mod render;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobaggr_client::{SourceSpec, build_sources};
use jobaggr_core::{Aggregator, AggregatorConfig, DispatchMode, SearchContext};

use crate::render::{OutputFormat, render};

#[derive(Parser)]
#[command(name = "jobaggr", version, about = "Search job postings across many sources at once")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Job source as name=target, where target is an http(s) JSON feed URL
    /// or a path to a JSON file. Repeatable; results keep this order.
    #[arg(
        short,
        long = "source",
        env = "JOBAGGR_SOURCES",
        value_delimiter = ',',
        required = true
    )]
    sources: Vec<SourceSpec>,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "JOBAGGR_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every source and print the combined results
    Search {
        /// Job title or keywords (e.g., "Software Engineer")
        #[arg(short, long)]
        query: String,

        /// Location (e.g., "San Francisco, CA")
        #[arg(short, long, default_value = "")]
        location: String,

        #[command(flatten)]
        sources: SourceArgs,

        /// Query sources one at a time instead of concurrently
        #[arg(long, env = "JOBAGGR_SEQUENTIAL", default_value_t = false)]
        sequential: bool,

        /// Give up on the whole search after this many seconds
        #[arg(long, env = "JOBAGGR_DEADLINE_SECS")]
        deadline_secs: Option<u64>,

        /// Fail the search if any single source takes longer than this many seconds
        #[arg(long, env = "JOBAGGR_SOURCE_TIMEOUT_SECS")]
        source_timeout_secs: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List the configured sources in registration order
    Sources {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobaggr=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            query,
            location,
            sources,
            sequential,
            deadline_secs,
            source_timeout_secs,
            format,
        } => {
            let mode = if sequential {
                DispatchMode::Sequential
            } else {
                DispatchMode::Concurrent
            };
            let mut config = AggregatorConfig::default().with_mode(mode);
            if let Some(secs) = source_timeout_secs {
                config = config.with_source_timeout(Duration::from_secs(secs));
            }
            cmd_search(&query, &location, &sources, config, deadline_secs, format).await?;
        }
        Commands::Sources { sources } => {
            cmd_sources(&sources)?;
        }
    }

    Ok(())
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling search");
            token.cancel();
        }
    });
}

async fn cmd_search(
    query: &str,
    location: &str,
    args: &SourceArgs,
    config: AggregatorConfig,
    deadline_secs: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let sources = build_sources(
        &args.sources,
        Duration::from_secs(args.request_timeout_secs),
    )
    .context("Invalid source configuration")?;

    let aggregator = Aggregator::with_config(sources, config);

    let token = CancellationToken::new();
    cancel_on_interrupt(token.clone());

    let mut ctx = SearchContext::from_token(token);
    if let Some(secs) = deadline_secs {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }

    tracing::info!(%query, %location, sources = aggregator.len(), "Searching");

    let jobs = aggregator
        .fetch(&ctx, query, location)
        .await
        .context("Search failed")?;

    render(&jobs, format, std::io::stdout().lock())?;

    Ok(())
}

fn cmd_sources(args: &SourceArgs) -> Result<()> {
    // Building validates every target up front.
    build_sources(
        &args.sources,
        Duration::from_secs(args.request_timeout_secs),
    )
    .context("Invalid source configuration")?;

    for (i, spec) in args.sources.iter().enumerate() {
        println!("  [{}] {} ({})", i, spec, spec.target.kind());
    }

    println!("\nTotal: {} sources", args.sources.len());

    Ok(())
}
