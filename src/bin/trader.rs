//! Trader binary

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twintrader::common::{parse_duration, Config};
use twintrader::Trader;

#[derive(Parser)]
#[command(name = "twintrader-trader")]
#[command(about = "twintrader trader with peer heartbeat and takeover")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start trader server
    Serve {
        /// Trader ID
        #[arg(long)]
        id: Option<u32>,

        /// Address to listen on (host:port), also announced unless --advertise is set
        #[arg(long)]
        address: Option<String>,

        /// Address announced to sellers after a takeover (host:port)
        #[arg(long)]
        advertise: Option<String>,

        /// Peer trader address
        #[arg(long)]
        peer: Option<String>,

        /// Post ID
        #[arg(long)]
        post: Option<u32>,

        /// Sellers to notify on takeover (comma-separated)
        #[arg(long, value_delimiter = ',')]
        sellers: Vec<String>,

        /// Heartbeat period (e.g. 5s, 500ms)
        #[arg(long, value_parser = parse_duration)]
        heartbeat: Option<Duration>,

        /// Consecutive missed heartbeats before takeover
        #[arg(long)]
        miss_threshold: Option<u32>,

        /// Start authoritative regardless of ID
        #[arg(long)]
        authoritative: bool,

        /// Mirror processed requests to the peer
        #[arg(long)]
        forward: bool,

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
            advertise,
            peer,
            post,
            sellers,
            heartbeat,
            miss_threshold,
            authoritative,
            forward,
            config,
        } => {
            // File and environment first, CLI flags win
            let file_config = Config::load(config.as_deref())?;

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| file_config.log_level.clone().into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            let trader_id = id.unwrap_or(file_config.node_id);
            let mut trader_config = file_config.trader.unwrap_or_default();

            if let Some(address) = address {
                trader_config.bind_addr = tokio::net::lookup_host(&address)
                    .await?
                    .next()
                    .with_context(|| format!("cannot resolve {}", address))?;
                trader_config.advertise_addr = Some(address);
            }
            if let Some(advertise) = advertise {
                trader_config.advertise_addr = Some(advertise);
            }
            if let Some(peer) = peer {
                trader_config.peer_addr = peer;
            }
            if let Some(post) = post {
                trader_config.post = post;
            }
            if !sellers.is_empty() {
                trader_config.sellers = sellers;
            }
            if let Some(heartbeat) = heartbeat {
                trader_config.heartbeat_interval_ms = heartbeat.as_millis() as u64;
            }
            if let Some(threshold) = miss_threshold {
                trader_config.heartbeat_miss_threshold = threshold;
            }
            if authoritative {
                trader_config.authoritative = Some(true);
            }
            if forward {
                trader_config.forward_to_peer = true;
            }

            trader_config
                .validate(trader_id)
                .context("Usage: twintrader-trader serve --id <id> --address <address> --peer <peer> --post <post>")?;

            Trader::new(trader_config, trader_id).serve().await?;
        }
    }

    Ok(())
}
