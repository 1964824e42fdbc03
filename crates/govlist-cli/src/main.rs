use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use govlist_cache::DatasetCache;
use govlist_core::{providers::UpstreamSource, CachedListingEngine, Config, ListingParams};
use govlist_server::{start_server, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "govlist")]
#[command(version, about = "Cached, filterable proxy for a government listing API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides config and GOVLIST_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fetch one listing page and print it as JSON
    List {
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        per_page: Option<String>,
        /// Case-insensitive match on name or organization
        #[arg(short, long)]
        search: Option<String>,
        /// Region code, or "all"
        #[arg(short, long)]
        region: Option<String>,
        /// Comma-separated category codes
        #[arg(short, long)]
        category: Option<String>,
        /// Comma-separated ids to restrict to
        #[arg(short, long)]
        favorites: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "govlist=info,govlist_api=info,govlist_core=info,govlist_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    let engine = build_engine(&config)?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let address = format!("{}:{}", config.server.host, port);
            tracing::info!("Serving listings with a {}s cache", config.cache.ttl_secs);
            start_server(&address, AppState::new(engine))
                .await
                .with_context(|| format!("Server on {} failed", address))?;
        }
        Commands::List {
            page,
            per_page,
            search,
            region,
            category,
            favorites,
        } => {
            let params = ListingParams {
                page,
                per_page,
                search_term: search,
                region,
                category,
                favorites,
            };
            let listing = engine.get_listing_for(&params).await?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }

    Ok(())
}

fn build_engine(config: &Config) -> anyhow::Result<CachedListingEngine> {
    let source = UpstreamSource::from_config(&config.upstream)
        .context("Set upstream.url in config.toml or GOVLIST_UPSTREAM_URL")?;
    let cache = Arc::new(DatasetCache::new(Duration::from_secs(config.cache.ttl_secs)));

    Ok(CachedListingEngine::with_cache(Box::new(source), cache))
}
