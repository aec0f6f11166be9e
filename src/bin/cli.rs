//! Operator CLI: poke traders and sellers over the same RPC calls they use

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twintrader::common::{RpcClient, RpcConfig, TradeRequest};

#[derive(Parser)]
#[command(name = "twintrader")]
#[command(about = "twintrader operator CLI", version)]
struct Cli {
    /// Per-call timeout in milliseconds
    #[arg(long, global = true, default_value = "10000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit one request to a trader (single attempt)
    Submit {
        /// Trader address
        trader: String,

        #[arg(long, default_value = "1")]
        seller: u32,

        #[arg(long, default_value = "1")]
        post: u32,

        #[arg(long, default_value = "apples")]
        item: String,

        #[arg(long, default_value = "10")]
        quantity: u32,

        #[arg(long)]
        request_id: u64,
    },

    /// Send a heartbeat probe to a trader
    Ping {
        trader: String,

        /// Sender identity
        #[arg(long, default_value = "0")]
        from: u32,
    },

    /// Tell a seller which trader is authoritative
    UpdateLeader { seller: String, leader: String },

    /// Print the status snapshot of a trader or seller
    Status { node: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let client = RpcClient::new(&RpcConfig {
        request_timeout_ms: cli.timeout_ms,
        ..Default::default()
    })?;

    match cli.command {
        Commands::Submit {
            trader,
            seller,
            post,
            item,
            quantity,
            request_id,
        } => {
            let req = TradeRequest {
                seller_id: seller,
                post,
                item,
                quantity,
                request_id,
            };
            let res = client.submit_request(&trader, &req).await?;
            println!("{}", serde_json::to_string_pretty(&res)?);
            if !res.acknowledges(request_id) {
                anyhow::bail!("request {} was not acknowledged", request_id);
            }
        }
        Commands::Ping { trader, from } => {
            let ack = client.heartbeat(&trader, from).await?;
            println!("{}", ack.message);
        }
        Commands::UpdateLeader { seller, leader } => {
            let ack = client.update_leader(&seller, &leader).await?;
            println!("{}", ack.message);
        }
        Commands::Status { node } => {
            let status = client.status(&node).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
