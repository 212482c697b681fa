// ============================================================================
// STELLAR-WALLET - Command Line Wallet
// ============================================================================
// Named accounts in a local SQLite store, operations against Horizon.
//
//   stellar-wallet new alice --fund
//   stellar-wallet use alice
//   stellar-wallet pay bob 10
//   stellar-wallet claimable list
// ============================================================================

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stellar_payments::{
    AccountSession, HorizonClient, Network, SqliteStore, StellarConfig, TransactionService,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stellar-wallet")]
#[command(about = "Stellar wallet: payments, assets and claimable balances", long_about = None)]
struct Cli {
    /// Network (public, testnet, futurenet, or a local name); defaults to STELLAR_NETWORK or testnet
    #[arg(short, long)]
    network: Option<Network>,

    /// JSON configuration file, overrides --network and environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the wallet database
    #[arg(long, env = "STELLAR_WALLET_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a key pair and store it under a name
    New {
        name: String,
        /// Fund the new account through Friendbot (testnet)
        #[arg(long)]
        fund: bool,
    },
    /// Select the current account
    Use { name: String },
    /// Show the current account
    Whoami,
    /// List stored account names
    Accounts,
    /// Show balances of an account name or address (default: current)
    Balance { account: Option<String> },
    /// Fund an account through Friendbot (testnet)
    Fund { account: Option<String> },
    /// Pay from the current account
    Pay {
        /// Receiver name or address
        to: String,
        amount: String,
        /// Asset code; "XLM" for the native asset
        #[arg(long, default_value = "XLM")]
        asset: String,
        /// Issuer of a credit asset (default: the receiver)
        #[arg(long)]
        issuer: Option<String>,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Issue an asset from the current account to a distributor
    Issue {
        code: String,
        amount: String,
        /// Stored distributor account name
        #[arg(long)]
        distributor: String,
    },
    /// Claimable balances
    #[command(subcommand)]
    Claimable(ClaimableCommand),
}

#[derive(Subcommand)]
pub enum ClaimableCommand {
    /// Escrow an amount for a destination
    Create {
        /// Destination name or address
        to: String,
        amount: String,
        #[arg(long, default_value = "XLM")]
        asset: String,
    },
    /// Claim a balance with the current account
    Claim { balance_id: String },
    /// List balances an account can claim (default: current)
    List { account: Option<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stellar_wallet=info,stellar_payments=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli)?;
    tracing::debug!("Using {} via {}", config.network, config.horizon_url);

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("No data directory; pass --data-dir"))?
            .join("stellar-wallet"),
    };
    let store = SqliteStore::new(&data_dir.join("wallet.db"))?;
    let session = AccountSession::open(store)?;

    let horizon = HorizonClient::new(config.clone())?;
    let service = TransactionService::new(config, horizon);

    let mut ctx = commands::Context { service, session };
    commands::run(&mut ctx, cli.command).await
}

fn load_config(cli: &Cli) -> anyhow::Result<StellarConfig> {
    let config = match (&cli.config, &cli.network) {
        (Some(path), _) => StellarConfig::from_json_file(path)?,
        (None, Some(network)) => StellarConfig::for_network(network.clone()),
        (None, None) => StellarConfig::from_env()?,
    };
    Ok(config)
}
