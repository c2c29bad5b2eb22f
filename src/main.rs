use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delayed_eth_sender::application::validation::Validator;
use delayed_eth_sender::domain::models::{unix_seconds, ScheduleTransferRequest};
use delayed_eth_sender::infrastructure::contracts::eth_sender::EthSenderContract;
use delayed_eth_sender::{ActiveConnection, AppConfig, Connection, ScheduleService};

#[derive(Parser)]
#[command(author, version, about = "Schedule ether transfers for a future time")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a delayed transfer with the registry and wait for it to be mined
    Schedule {
        recipient: String,
        /// RFC 3339 timestamp, or YYYY-MM-DDTHH:MM in UTC
        send_at: String,
        /// Amount in ether, e.g. 0.5
        amount_eth: String,
    },
    /// Print the sendEthAtTime calldata without touching the network
    Calldata {
        recipient: String,
        send_at: String,
    },
    /// List registered request hashes
    Requests {
        #[arg(long, default_value_t = 0)]
        page: u64,
        #[arg(long, default_value_t = 20)]
        page_size: u64,
    },
    /// Show the networks this client knows about
    Networks,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "delayed_eth_sender=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    match cli.command {
        Commands::Calldata { recipient, send_at } => {
            let recipient = Validator::validate_ethereum_address(&recipient, "recipient")
                .map_err(|e| anyhow::anyhow!("{}: {}", e.field, e.message))?;
            let send_at = Validator::validate_future_time(&send_at, "send_at", Utc::now())
                .map_err(|e| anyhow::anyhow!("{}: {}", e.field, e.message))?;

            let data = EthSenderContract::encode_send_eth_at_time(unix_seconds(&send_at), recipient)?;
            println!("0x{}", hex::encode(data));
        }
        Commands::Networks => {
            let table = config.network_table()?;
            for network_id in table.supported_network_ids() {
                let network = table.get(network_id)?;
                println!(
                    "{} {} rpc={} explorer={} ethSender={:?} registry={:?}",
                    network.network_id,
                    network.label,
                    network.rpc_url,
                    network.explorer_url,
                    network.contract_addresses.eth_sender,
                    network.contract_addresses.registry
                );
            }
        }
        Commands::Schedule {
            recipient,
            send_at,
            amount_eth,
        } => {
            if config.private_key.is_none() {
                anyhow::bail!("PRIVATE_KEY must be set to schedule a transfer");
            }
            let service = connect(&config).await?;
            let request = ScheduleTransferRequest {
                recipient,
                send_at,
                amount_eth,
            };

            let scheduled = service.schedule_transfer(&request, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&scheduled)?);
        }
        Commands::Requests { page, page_size } => {
            let service = connect(&config).await?;
            let listing = service.list_requests(page, page_size).await?;

            println!("page {} ({} total)", listing.page, listing.total);
            for hash in listing.hashes {
                println!("{:?}", hash);
            }
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<ScheduleService> {
    let network = config.network()?;
    let active = ActiveConnection::new();
    active.replace(
        Connection::connect_http(&network.rpc_url, config.private_key.as_deref(), network.network_id)
            .await
            .with_context(|| format!("Failed to connect to {}", network.label))?,
    );

    let connection = active.require()?;
    if !connection.is_on_expected_network() {
        tracing::warn!(
            "RPC endpoint reports chain {}, expected {}",
            connection.provider().chain_id(),
            network.network_id
        );
    }

    Ok(ScheduleService::with_policy(
        Arc::clone(&connection),
        &network,
        config.fee_buffer()?,
        config.confirmation_policy(&network),
    )?)
}
