//! Seller binary

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twintrader::common::{parse_duration, Config};
use twintrader::Seller;

#[derive(Parser)]
#[command(name = "twintrader-seller")]
#[command(about = "twintrader seller with retrying request delivery")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start seller
    Serve {
        /// Seller ID
        #[arg(long)]
        id: Option<u32>,

        /// Address to listen on for leader updates (host:port)
        #[arg(long)]
        address: Option<String>,

        /// Trader believed authoritative at startup
        #[arg(long)]
        trader: Option<String>,

        /// Post ID
        #[arg(long)]
        post: Option<u32>,

        /// Period between new requests (e.g. 10s)
        #[arg(long, value_parser = parse_duration)]
        interval: Option<Duration>,

        /// Wait between attempts of the same request (e.g. 5s)
        #[arg(long, value_parser = parse_duration)]
        backoff: Option<Duration>,

        /// Item to trade
        #[arg(long)]
        item: Option<String>,

        /// Quantity per request
        #[arg(long)]
        quantity: Option<u32>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            id,
            address,
            trader,
            post,
            interval,
            backoff,
            item,
            quantity,
            config,
        } => {
            let file_config = Config::load(config.as_deref())?;

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| file_config.log_level.clone().into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            let seller_id = id.unwrap_or(file_config.node_id);
            let mut seller_config = file_config.seller.unwrap_or_default();

            if let Some(address) = address {
                seller_config.bind_addr = tokio::net::lookup_host(&address)
                    .await?
                    .next()
                    .with_context(|| format!("cannot resolve {}", address))?;
            }
            if let Some(trader) = trader {
                seller_config.trader_addr = trader;
            }
            if let Some(post) = post {
                seller_config.post = post;
            }
            if let Some(interval) = interval {
                seller_config.request_interval_ms = interval.as_millis() as u64;
            }
            if let Some(backoff) = backoff {
                seller_config.retry_backoff_ms = backoff.as_millis() as u64;
            }
            if let Some(item) = item {
                seller_config.item = item;
            }
            if let Some(quantity) = quantity {
                seller_config.quantity = quantity;
            }

            seller_config
                .validate(seller_id)
                .context("Usage: twintrader-seller serve --id <id> --address <address> --trader <trader> --post <post>")?;

            Seller::new(seller_config, seller_id).serve().await?;
        }
    }

    Ok(())
}
